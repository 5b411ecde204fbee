pub mod booking_service;
pub mod chat_service;
pub mod directory_service;
pub mod error;
pub mod gateway;
pub mod locks;
pub mod notification_service;
pub mod party_service;
pub mod payment_service;
