pub mod bookingmodel;
pub mod chatmodel;
pub mod notificationmodel;
pub mod partymodel;
pub mod paymentmodel;
