// db/partydb.rs
use async_trait::async_trait;
use sqlx::{types::Json, Error};

use super::db::DBClient;
use crate::models::partymodel::*;

#[async_trait]
pub trait PartyExt {
    async fn save_party(&self, party: &Party) -> Result<Party, Error>;

    async fn get_party(&self, party_id: &str) -> Result<Option<Party>, Error>;

    async fn update_party_profile(
        &self,
        party_id: &str,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Option<Party>, Error>;

    async fn set_party_active(&self, party_id: &str, is_active: bool) -> Result<Option<Party>, Error>;

    async fn increment_total_jobs(&self, party_id: &str) -> Result<Option<Party>, Error>;

    /// Folds one more review into the running average.
    async fn record_party_rating(&self, party_id: &str, rating: i32) -> Result<Option<Party>, Error>;

    async fn list_active_workers(&self, service_type: Option<ServiceType>) -> Result<Vec<Party>, Error>;
}

const PARTY_COLUMNS: &str = r#"
    id, name, email, phone, address, party_type, services, rating, review_count,
    total_jobs, is_verified, is_active, created_at
"#;

#[async_trait]
impl PartyExt for DBClient {
    async fn save_party(&self, party: &Party) -> Result<Party, Error> {
        sqlx::query_as::<_, Party>(&format!(
            r#"
            INSERT INTO parties
                (id, name, email, phone, address, party_type, services, rating,
                 review_count, total_jobs, is_verified, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            PARTY_COLUMNS
        ))
        .bind(&party.id)
        .bind(&party.name)
        .bind(&party.email)
        .bind(&party.phone)
        .bind(&party.address)
        .bind(party.party_type)
        .bind(Json(&party.services))
        .bind(party.rating)
        .bind(party.review_count)
        .bind(party.total_jobs)
        .bind(party.is_verified)
        .bind(party.is_active)
        .bind(party.created_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_party(&self, party_id: &str) -> Result<Option<Party>, Error> {
        sqlx::query_as::<_, Party>(&format!("SELECT {} FROM parties WHERE id = $1", PARTY_COLUMNS))
            .bind(party_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_party_profile(
        &self,
        party_id: &str,
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<Option<Party>, Error> {
        sqlx::query_as::<_, Party>(&format!(
            r#"
            UPDATE parties
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address)
            WHERE id = $1
            RETURNING {}
            "#,
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(address)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_party_active(&self, party_id: &str, is_active: bool) -> Result<Option<Party>, Error> {
        sqlx::query_as::<_, Party>(&format!(
            "UPDATE parties SET is_active = $2 WHERE id = $1 RETURNING {}",
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
    }

    async fn increment_total_jobs(&self, party_id: &str) -> Result<Option<Party>, Error> {
        sqlx::query_as::<_, Party>(&format!(
            "UPDATE parties SET total_jobs = total_jobs + 1 WHERE id = $1 RETURNING {}",
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_party_rating(&self, party_id: &str, rating: i32) -> Result<Option<Party>, Error> {
        // single statement so concurrent reviews cannot lose an update
        sqlx::query_as::<_, Party>(&format!(
            r#"
            UPDATE parties
            SET rating = (rating * review_count + $2) / (review_count + 1),
                review_count = review_count + 1
            WHERE id = $1
            RETURNING {}
            "#,
            PARTY_COLUMNS
        ))
        .bind(party_id)
        .bind(rating as f64)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_active_workers(&self, service_type: Option<ServiceType>) -> Result<Vec<Party>, Error> {
        let filter = service_type.map(|s| Json(vec![s]));

        sqlx::query_as::<_, Party>(&format!(
            r#"
            SELECT {}
            FROM parties
            WHERE party_type = 'worker'::party_type
              AND is_active = TRUE
              AND ($1::jsonb IS NULL OR services @> $1::jsonb)
            ORDER BY id ASC
            "#,
            PARTY_COLUMNS
        ))
        .bind(filter)
        .fetch_all(&self.pool)
        .await
    }
}
