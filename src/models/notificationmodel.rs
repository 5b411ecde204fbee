use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingStatus,
    NewMessage,
    Payment,
    Refund,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub party_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
