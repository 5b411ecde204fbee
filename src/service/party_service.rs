// service/party_service.rs
use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::store::Store,
    models::{
        chatmodel::{is_chat_party_id, THREAD_SEPARATOR},
        partymodel::*,
    },
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NewParty {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub party_type: PartyType,
    pub services: Vec<ServiceType>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PartyService {
    store: Arc<dyn Store>,
}

impl PartyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn register_party(&self, new_party: NewParty) -> Result<Party, ServiceError> {
        // ids are joined into chat thread ids
        if !is_chat_party_id(&new_party.id) {
            return Err(ServiceError::Validation(format!(
                "Party id must be non-empty and contain no '{}'",
                THREAD_SEPARATOR
            )));
        }
        if new_party.name.trim().is_empty() {
            return Err(ServiceError::Validation("Name is required".to_string()));
        }

        let mut services = new_party.services;
        services.sort();
        services.dedup();

        match new_party.party_type {
            PartyType::Customer if !services.is_empty() => {
                return Err(ServiceError::Validation(
                    "Customers cannot list services".to_string(),
                ));
            }
            PartyType::Worker if services.is_empty() => {
                return Err(ServiceError::Validation(
                    "Workers must offer at least one service".to_string(),
                ));
            }
            _ => {}
        }

        if self.store.get_party(&new_party.id).await?.is_some() {
            return Err(ServiceError::InvalidState(format!(
                "Party {} is already registered",
                new_party.id
            )));
        }

        let party = Party {
            id: new_party.id,
            name: new_party.name.trim().to_string(),
            email: new_party.email,
            phone: new_party.phone,
            address: new_party.address,
            party_type: new_party.party_type,
            services,
            rating: 0.0,
            review_count: 0,
            total_jobs: 0,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
        };

        let party = self.store.save_party(&party).await?;
        tracing::info!("Registered {} {}", party.party_type.to_str(), party.id);
        Ok(party)
    }

    pub async fn get_party(&self, party_id: &str) -> Result<Party, ServiceError> {
        self.store
            .get_party(party_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("party", party_id))
    }

    pub async fn update_profile(&self, party_id: &str, update: ProfileUpdate) -> Result<Party, ServiceError> {
        if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ServiceError::Validation("Name cannot be blank".to_string()));
        }

        self.store
            .update_party_profile(party_id, update.name, update.email, update.phone, update.address)
            .await?
            .ok_or_else(|| ServiceError::not_found("party", party_id))
    }
}
