pub mod bookingdb;
pub mod cache;
pub mod chatdb;
#[allow(clippy::module_inception)]
pub mod db;
pub mod memory;
pub mod notificationdb;
pub mod partydb;
pub mod paymentdb;
pub mod store;
