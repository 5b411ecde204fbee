use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::paymentmodel::PaymentMethod;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InitiatePaymentDto {
    pub booking_id: Uuid,

    #[validate(range(min = 0.01, message = "Amount must be greater than zero"))]
    pub amount: f64,

    pub method: PaymentMethod,

    #[validate(length(min = 3, max = 100, message = "UPI id must be between 3 and 100 characters"))]
    pub upi_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InitiateRefundDto {
    #[validate(length(min = 1, max = 500, message = "Reason must be between 1 and 500 characters"))]
    pub reason: String,
}
