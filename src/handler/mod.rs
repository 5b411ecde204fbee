pub mod bookings;
pub mod chat;
pub mod notifications;
pub mod parties;
pub mod payments;
pub mod workers;
