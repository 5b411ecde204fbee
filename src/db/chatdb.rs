// db/chatdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::cache::{CacheHelper, THREAD_LIST_TTL};
use super::db::DBClient;
use crate::models::chatmodel::*;

#[async_trait]
pub trait ChatExt {
    /// Appends to the thread log. The store assigns `timestamp` and `seq` and,
    /// in the same write, refreshes both parties' summaries and bumps the
    /// receiver's unread counter.
    async fn append_message(&self, thread_id: &str, message: NewMessage) -> Result<ChatMessage, Error>;

    /// Raw rows of a thread ordered by `(sent_at, seq)`.
    async fn load_message_records(&self, thread_id: &str) -> Result<Vec<MessageRecord>, Error>;

    /// `None` when the message is unknown, `Some(true)` when it flipped.
    async fn mark_message_read(&self, thread_id: &str, message_id: Uuid) -> Result<Option<bool>, Error>;

    /// Returns the number of messages flipped.
    async fn mark_thread_read(&self, thread_id: &str, reader: Option<&str>) -> Result<u64, Error>;

    async fn list_summaries(&self, party_id: &str) -> Result<Vec<ChatSummary>, Error>;
}

const MESSAGE_COLUMNS: &str = "id, thread_id, seq, sender_id, receiver_id, content, message_type, sent_at, is_read";

impl DBClient {
    async fn invalidate_thread_lists(&self, party_ids: &[&str]) {
        if let Some(redis) = &self.redis_client {
            if let Err(e) = CacheHelper::invalidate_thread_lists(redis, party_ids).await {
                tracing::warn!("Failed to invalidate thread list cache: {}", e);
            }
        }
    }
}

#[async_trait]
impl ChatExt for DBClient {
    async fn append_message(&self, thread_id: &str, message: NewMessage) -> Result<ChatMessage, Error> {
        let mut tx = self.pool.begin().await?;

        // appends to one thread queue here, so seq and sent_at rise together
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(thread_id)
            .execute(&mut *tx)
            .await?;

        let (id, seq, sent_at) = sqlx::query_as::<_, (Uuid, i64, DateTime<Utc>)>(
            r#"
            INSERT INTO chat_messages
                (id, thread_id, sender_id, receiver_id, content, message_type, sent_at, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, clock_timestamp(), FALSE)
            RETURNING id, seq, sent_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(thread_id)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .bind(message.message_type.to_str())
        .fetch_one(&mut *tx)
        .await?;

        // one row per participant, each pointing at the other side
        sqlx::query(
            r#"
            INSERT INTO chat_summaries
                (thread_id, party_id, other_party_id, last_message, last_message_time, unread_count)
            VALUES ($1, $2, $3, $4, $5, 0), ($1, $3, $2, $4, $5, 1)
            ON CONFLICT (thread_id, party_id) DO UPDATE
            SET other_party_id = EXCLUDED.other_party_id,
                last_message = EXCLUDED.last_message,
                last_message_time = EXCLUDED.last_message_time,
                unread_count = chat_summaries.unread_count + EXCLUDED.unread_count
            "#,
        )
        .bind(thread_id)
        .bind(&message.sender_id)
        .bind(&message.receiver_id)
        .bind(&message.content)
        .bind(sent_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.invalidate_thread_lists(&[&message.sender_id, &message.receiver_id]).await;

        Ok(ChatMessage {
            id,
            thread_id: thread_id.to_string(),
            seq,
            content: message.content,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            timestamp: sent_at,
            is_read: false,
            message_type: message.message_type,
        })
    }

    async fn load_message_records(&self, thread_id: &str) -> Result<Vec<MessageRecord>, Error> {
        sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {}
            FROM chat_messages
            WHERE thread_id = $1
            ORDER BY sent_at ASC NULLS LAST, seq ASC
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_message_read(&self, thread_id: &str, message_id: Uuid) -> Result<Option<bool>, Error> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE chat_messages
            SET is_read = TRUE
            WHERE id = $1 AND thread_id = $2 AND is_read IS NOT TRUE
            RETURNING receiver_id
            "#,
        )
        .bind(message_id)
        .bind(thread_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(receiver_id) = flipped else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM chat_messages WHERE id = $1 AND thread_id = $2)",
            )
            .bind(message_id)
            .bind(thread_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return Ok(if exists { Some(false) } else { None });
        };

        if let Some(receiver_id) = receiver_id.as_deref() {
            sqlx::query(
                r#"
                UPDATE chat_summaries
                SET unread_count = GREATEST(unread_count - 1, 0)
                WHERE thread_id = $1 AND party_id = $2
                "#,
            )
            .bind(thread_id)
            .bind(receiver_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        if let Some(receiver_id) = receiver_id.as_deref() {
            self.invalidate_thread_lists(&[receiver_id]).await;
        }

        Ok(Some(true))
    }

    async fn mark_thread_read(&self, thread_id: &str, reader: Option<&str>) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE chat_messages
            SET is_read = TRUE
            WHERE thread_id = $1
              AND is_read IS NOT TRUE
              AND ($2::text IS NULL OR receiver_id = $2)
            "#,
        )
        .bind(thread_id)
        .bind(reader)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let touched: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE chat_summaries
            SET unread_count = 0
            WHERE thread_id = $1 AND ($2::text IS NULL OR party_id = $2)
            RETURNING party_id
            "#,
        )
        .bind(thread_id)
        .bind(reader)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let touched: Vec<&str> = touched.iter().map(String::as_str).collect();
        self.invalidate_thread_lists(&touched).await;

        Ok(flipped)
    }

    async fn list_summaries(&self, party_id: &str) -> Result<Vec<ChatSummary>, Error> {
        let cache_key = CacheHelper::thread_list_key(party_id);

        if let Some(redis) = &self.redis_client {
            if let Ok(Some(cached)) = CacheHelper::get::<Vec<ChatSummary>>(redis, &cache_key).await {
                return Ok(cached);
            }
        }

        let summaries = sqlx::query_as::<_, ChatSummary>(
            r#"
            SELECT thread_id, party_id, other_party_id, last_message, last_message_time, unread_count
            FROM chat_summaries
            WHERE party_id = $1
            ORDER BY last_message_time DESC
            "#,
        )
        .bind(party_id)
        .fetch_all(&self.pool)
        .await?;

        if let Some(redis) = &self.redis_client {
            if let Err(e) = CacheHelper::set(redis, &cache_key, &summaries, THREAD_LIST_TTL).await {
                tracing::warn!("Failed to cache thread list for {}: {}", party_id, e);
            }
        }

        Ok(summaries)
    }
}
