use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::partymodel::*;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterPartyDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 5, max = 20, message = "Phone must be between 5 and 20 characters"))]
    pub phone: String,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    pub party_type: PartyType,

    #[serde(default)]
    pub services: Vec<ServiceType>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 5, max = 20, message = "Phone must be between 5 and 20 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Address cannot be empty"))]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityDto {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct WorkerSearchQuery {
    #[serde(default)]
    pub q: String,
    pub service_type: Option<ServiceType>,
}
