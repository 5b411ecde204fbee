// db/notificationdb.rs
use async_trait::async_trait;
use sqlx::Error;

use super::db::DBClient;
use crate::models::notificationmodel::*;

#[async_trait]
pub trait NotificationExt {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, Error>;

    async fn list_notifications(&self, party_id: &str) -> Result<Vec<Notification>, Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn insert_notification(&self, notification: &Notification) -> Result<Notification, Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, party_id, kind, title, body, reference_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, party_id, kind, title, body, reference_id, created_at
            "#,
        )
        .bind(notification.id)
        .bind(&notification.party_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.reference_id)
        .bind(notification.created_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_notifications(&self, party_id: &str) -> Result<Vec<Notification>, Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, party_id, kind, title, body, reference_id, created_at
            FROM notifications
            WHERE party_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(party_id)
        .fetch_all(&self.pool)
        .await
    }
}
