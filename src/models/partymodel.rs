// models/partymodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bookingmodel::CostRange;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "party_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    Customer,
    Worker,
}

impl PartyType {
    pub fn to_str(&self) -> &str {
        match self {
            PartyType::Customer => "customer",
            PartyType::Worker => "worker",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "service_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Plumber,
    Electrician,
    Carpenter,
    Painter,
    Cleaner,
    Mechanic,
    Gardener,
    Mason,
    Laborer,
    Other,
}

impl ServiceType {
    pub const ALL: [ServiceType; 10] = [
        ServiceType::Plumber,
        ServiceType::Electrician,
        ServiceType::Carpenter,
        ServiceType::Painter,
        ServiceType::Cleaner,
        ServiceType::Mechanic,
        ServiceType::Gardener,
        ServiceType::Mason,
        ServiceType::Laborer,
        ServiceType::Other,
    ];

    pub fn to_str(&self) -> &str {
        match self {
            ServiceType::Plumber => "plumber",
            ServiceType::Electrician => "electrician",
            ServiceType::Carpenter => "carpenter",
            ServiceType::Painter => "painter",
            ServiceType::Cleaner => "cleaner",
            ServiceType::Mechanic => "mechanic",
            ServiceType::Gardener => "gardener",
            ServiceType::Mason => "mason",
            ServiceType::Laborer => "laborer",
            ServiceType::Other => "other",
        }
    }

    /// Human readable label, matched by directory text search.
    pub fn label(&self) -> &str {
        match self {
            ServiceType::Plumber => "Plumber",
            ServiceType::Electrician => "Electrician",
            ServiceType::Carpenter => "Carpenter",
            ServiceType::Painter => "Painter",
            ServiceType::Cleaner => "Cleaner",
            ServiceType::Mechanic => "Mechanic",
            ServiceType::Gardener => "Gardener",
            ServiceType::Mason => "Mason",
            ServiceType::Laborer => "Laborer",
            ServiceType::Other => "Other",
        }
    }

    /// Fixed quote range shown to a customer before the worker confirms.
    pub fn estimated_cost(&self) -> CostRange {
        let (min, max) = match self {
            ServiceType::Plumber => (500.0, 1500.0),
            ServiceType::Electrician => (800.0, 2000.0),
            ServiceType::Carpenter => (600.0, 1800.0),
            ServiceType::Painter => (400.0, 1200.0),
            ServiceType::Cleaner => (300.0, 800.0),
            ServiceType::Mechanic => (700.0, 2500.0),
            ServiceType::Gardener => (400.0, 1000.0),
            ServiceType::Mason => (1000.0, 3000.0),
            ServiceType::Laborer => (500.0, 1500.0),
            ServiceType::Other => (500.0, 2000.0),
        };
        CostRange { min, max }
    }
}

/// A customer or worker account. The id is issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Party {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub party_type: PartyType,
    // empty for customers
    #[sqlx(json)]
    pub services: Vec<ServiceType>,
    pub rating: f64,
    pub review_count: i32,
    pub total_jobs: i32,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Party {
    pub fn is_worker(&self) -> bool {
        self.party_type == PartyType::Worker
    }

    pub fn offers(&self, service_type: ServiceType) -> bool {
        self.services.contains(&service_type)
    }

    /// Case-insensitive match against the name or any service label.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&needle)
            || self
                .services
                .iter()
                .any(|service| service.label().to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(name: &str, services: Vec<ServiceType>) -> Party {
        Party {
            id: "w1".to_string(),
            name: name.to_string(),
            email: "w1@example.com".to_string(),
            phone: "5550100".to_string(),
            address: "12 Hill Road".to_string(),
            party_type: PartyType::Worker,
            services,
            rating: 0.0,
            review_count: 0,
            total_jobs: 0,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn every_cost_range_is_ordered() {
        for service in ServiceType::ALL {
            let range = service.estimated_cost();
            assert!(range.min <= range.max, "{} has an inverted range", service.to_str());
        }
    }

    #[test]
    fn plumber_and_cleaner_quotes() {
        assert_eq!(ServiceType::Plumber.estimated_cost(), CostRange { min: 500.0, max: 1500.0 });
        assert_eq!(ServiceType::Cleaner.estimated_cost(), CostRange { min: 300.0, max: 800.0 });
    }

    #[test]
    fn query_matches_name_or_service_label() {
        let party = worker("Ravi Kumar", vec![ServiceType::Electrician]);

        assert!(party.matches_query("ravi"));
        assert!(party.matches_query("ELECTRIC"));
        assert!(party.matches_query("   "));
        assert!(!party.matches_query("plumb"));
    }

    #[test]
    fn service_type_wire_format_is_snake_case() {
        let json = serde_json::to_string(&ServiceType::Electrician).unwrap();
        assert_eq!(json, "\"electrician\"");
    }
}
