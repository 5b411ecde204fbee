// service/directory_service.rs
use std::sync::Arc;

use crate::{
    db::store::Store,
    models::partymodel::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct DirectoryService {
    store: Arc<dyn Store>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Active workers, optionally offering `service_type`, whose name or a
    /// service label contains `query`. Ordered by id.
    pub async fn search(&self, query: &str, service_type: Option<ServiceType>) -> Result<Vec<Party>, ServiceError> {
        let workers = self.store.list_active_workers(service_type).await?;

        let matches: Vec<Party> = workers
            .into_iter()
            .filter(|worker| worker.matches_query(query))
            .collect();

        tracing::debug!(
            "Directory search '{}' ({:?}) returned {} workers",
            query,
            service_type.map(|s| s.to_str().to_string()),
            matches.len()
        );
        Ok(matches)
    }

    pub async fn get_worker(&self, worker_id: &str) -> Result<Party, ServiceError> {
        self.store
            .get_party(worker_id)
            .await?
            .filter(Party::is_worker)
            .ok_or_else(|| ServiceError::not_found("worker", worker_id))
    }

    pub async fn set_availability(&self, worker_id: &str, is_active: bool) -> Result<Party, ServiceError> {
        // only workers are listed, so only workers toggle
        self.get_worker(worker_id).await?;

        let worker = self
            .store
            .set_party_active(worker_id, is_active)
            .await?
            .ok_or_else(|| ServiceError::not_found("worker", worker_id))?;

        tracing::info!("Worker {} availability set to {}", worker_id, is_active);
        Ok(worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::service::party_service::{fixtures, PartyService};

    async fn seeded() -> DirectoryService {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let parties = PartyService::new(store.clone());

        fixtures::worker(&parties, "w3", "Meena Joshi", vec![ServiceType::Cleaner]).await;
        fixtures::worker(&parties, "w1", "Ravi Kumar", vec![ServiceType::Plumber, ServiceType::Electrician]).await;
        fixtures::worker(&parties, "w2", "Sunil Electric", vec![ServiceType::Mason]).await;
        fixtures::customer(&parties, "c1").await;

        DirectoryService::new(store)
    }

    fn ids(parties: &[Party]) -> Vec<&str> {
        parties.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn blank_query_lists_every_active_worker_by_id() {
        let directory = seeded().await;
        let all = directory.search("", None).await.unwrap();
        assert_eq!(ids(&all), vec!["w1", "w2", "w3"]);
    }

    #[tokio::test]
    async fn query_matches_names_and_labels() {
        let directory = seeded().await;

        let electric = directory.search("electric", None).await.unwrap();
        assert_eq!(ids(&electric), vec!["w1", "w2"]);

        let filtered = directory.search("electric", Some(ServiceType::Mason)).await.unwrap();
        assert_eq!(ids(&filtered), vec!["w2"]);
    }

    #[tokio::test]
    async fn inactive_workers_drop_out_of_search() {
        let directory = seeded().await;
        directory.set_availability("w3", false).await.unwrap();

        let cleaners = directory.search("", Some(ServiceType::Cleaner)).await.unwrap();
        assert!(cleaners.is_empty());

        // still reachable directly
        assert!(!directory.get_worker("w3").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn customers_are_not_workers() {
        let directory = seeded().await;
        assert!(matches!(
            directory.get_worker("c1").await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            directory.set_availability("c1", false).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
