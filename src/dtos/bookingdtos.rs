use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{bookingmodel::BookingStatus, partymodel::*};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateBookingDto {
    #[validate(length(min = 1, message = "Worker is required"))]
    pub worker_id: String,

    pub service_type: ServiceType,

    pub scheduled_date: NaiveDate,

    pub scheduled_time: NaiveTime,

    #[validate(length(min = 1, max = 2000, message = "Description must be between 1 and 2000 characters"))]
    pub description: String,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateBookingStatusDto {
    pub status: BookingStatus,

    #[validate(range(min = 0.0, message = "Actual cost cannot be negative"))]
    pub actual_cost: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewBookingDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 1000, message = "Review must be at most 1000 characters"))]
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub role: Option<PartyType>,
}
