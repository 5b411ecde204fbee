// db/store.rs
use super::{
    bookingdb::BookingExt, chatdb::ChatExt, notificationdb::NotificationExt, partydb::PartyExt,
    paymentdb::PaymentExt,
};

/// Everything the services need from persistence. Implemented for any type
/// that provides all the extension traits.
pub trait Store:
    PartyExt + BookingExt + PaymentExt + ChatExt + NotificationExt + std::fmt::Debug + Send + Sync
{
}

impl<T> Store for T where
    T: PartyExt + BookingExt + PaymentExt + ChatExt + NotificationExt + std::fmt::Debug + Send + Sync
{
}
