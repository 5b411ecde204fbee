// service/chat_service.rs
use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
    db::store::Store,
    models::chatmodel::*,
    service::{error::ServiceError, notification_service::NotificationService},
};

pub const MAX_MESSAGE_CHARS: usize = 5000;
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    notification_service: Arc<NotificationService>,
    sender: broadcast::Sender<ChatMessage>,
}

impl ChatService {
    pub fn new(store: Arc<dyn Store>, notification_service: Arc<NotificationService>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            store,
            notification_service,
            sender,
        }
    }

    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        message_type: MessageType,
    ) -> Result<ChatMessage, ServiceError> {
        if sender_id == receiver_id {
            return Err(ServiceError::Validation("Cannot send a message to yourself".to_string()));
        }
        let thread = self.thread_between(sender_id, receiver_id)?;
        if content.trim().is_empty() {
            return Err(ServiceError::Validation("Message cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ServiceError::Validation(format!(
                "Message exceeds {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let message = self
            .store
            .append_message(
                &thread,
                NewMessage {
                    sender_id: sender_id.to_string(),
                    receiver_id: receiver_id.to_string(),
                    content: content.to_string(),
                    message_type,
                },
            )
            .await?;

        tracing::debug!("Message {} appended to {} at seq {}", message.id, thread, message.seq);

        // no live subscribers is fine
        let _ = self.sender.send(message.clone());

        self.notification_service.notify_new_message(&message).await;

        Ok(message)
    }

    /// Every parseable message between `a` and `b` in `(timestamp, seq)`
    /// order. Records that fail to parse are reported in `skipped`.
    pub async fn load_history(&self, party_a: &str, party_b: &str) -> Result<ChatHistory, ServiceError> {
        let thread = self.thread_between(party_a, party_b)?;
        let records = self.store.load_message_records(&thread).await?;

        let mut messages = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        for record in records {
            match ChatMessage::try_from(record) {
                Ok(message) if message.is_between(party_a, party_b) => messages.push(message),
                Ok(message) => {
                    tracing::warn!("Message {} in {} belongs to another pair", message.id, thread);
                    skipped.push(format!(
                        "message {}: exchanged between {} and {}",
                        message.id, message.sender_id, message.receiver_id
                    ));
                }
                Err(e) => {
                    tracing::warn!("Skipping record in {}: {}", thread, e);
                    skipped.push(e.to_string());
                }
            }
        }

        messages.sort_by(|x, y| x.timestamp.cmp(&y.timestamp).then(x.seq.cmp(&y.seq)));

        Ok(ChatHistory { messages, skipped })
    }

    /// Returns whether this call flipped the flag.
    pub async fn mark_read(&self, thread_id: &str, message_id: Uuid) -> Result<bool, ServiceError> {
        self.store
            .mark_message_read(thread_id, message_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("message", message_id))
    }

    pub async fn mark_all_read(&self, thread_id: &str, reader: Option<&str>) -> Result<u64, ServiceError> {
        let flipped = self.store.mark_thread_read(thread_id, reader).await?;
        if flipped > 0 {
            tracing::debug!("Marked {} messages read in {}", flipped, thread_id);
        }
        Ok(flipped)
    }

    pub async fn list_threads(&self, party_id: &str) -> Result<Vec<ChatSummary>, ServiceError> {
        Ok(self.store.list_summaries(party_id).await?)
    }

    pub async fn unread_count(&self, party_id: &str) -> Result<i64, ServiceError> {
        let summaries = self.store.list_summaries(party_id).await?;
        Ok(summaries.iter().map(|s| s.unread_count as i64).sum())
    }

    /// The thread of two parties whose ids cannot collide with another
    /// pair's. Every per-pair entry point goes through this.
    pub fn thread_between(&self, party_a: &str, party_b: &str) -> Result<String, ServiceError> {
        for party_id in [party_a, party_b] {
            if !is_chat_party_id(party_id) {
                return Err(ServiceError::Validation(format!(
                    "'{}' cannot take part in a chat: ids must be non-empty and contain no '{}'",
                    party_id, THREAD_SEPARATOR
                )));
            }
        }
        Ok(thread_id(party_a, party_b))
    }

    /// Messages appended to `thread_id` from now on.
    pub fn subscribe(&self, thread_id: &str) -> ThreadSubscription {
        ThreadSubscription {
            thread_id: thread_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }
}

pub struct ThreadSubscription {
    thread_id: String,
    receiver: broadcast::Receiver<ChatMessage>,
}

impl ThreadSubscription {
    /// `None` once the chat service is gone.
    pub async fn next(&mut self) -> Option<ChatMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if message.thread_id == self.thread_id => return Some(message),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Subscriber of {} fell behind by {} messages", self.thread_id, missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ChatMessage> + Send {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription.next().await.map(|message| (message, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;
    use futures::StreamExt;

    use crate::db::memory::MemoryStore;
    use crate::db::notificationdb::NotificationExt;

    fn service_with_store() -> (ChatService, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn Store> = memory.clone();
        let notifications = Arc::new(NotificationService::new(store.clone()));
        (ChatService::new(store, notifications), memory)
    }

    async fn send(chat: &ChatService, from: &str, to: &str, content: &str) -> ChatMessage {
        chat.send_message(from, to, content, MessageType::Text).await.unwrap()
    }

    #[tokio::test]
    async fn two_sends_read_back_in_order() {
        let (chat, _) = service_with_store();
        send(&chat, "u1", "u2", "hi").await;
        send(&chat, "u2", "u1", "hello").await;

        let history = chat.load_history("u1", "u2").await.unwrap();
        let contents: Vec<&str> = history.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello"]);
        assert!(history.skipped.is_empty());

        let threads = chat.list_threads("u1").await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].last_message, "hello");
        assert_eq!(threads[0].other_party_id, "u2");
    }

    #[tokio::test]
    async fn alternating_sends_keep_parties_and_order() {
        let (chat, _) = service_with_store();
        for i in 0..10 {
            let (from, to) = if i % 2 == 0 { ("u1", "u2") } else { ("u2", "u1") };
            send(&chat, from, to, &format!("m{}", i)).await;
        }

        let history = chat.load_history("u2", "u1").await.unwrap();
        assert_eq!(history.messages.len(), 10);
        for (i, message) in history.messages.iter().enumerate() {
            assert_eq!(message.content, format!("m{}", i));
            let expected_sender = if i % 2 == 0 { "u1" } else { "u2" };
            assert_eq!(message.sender_id, expected_sender);
            assert_eq!(message.thread_id, "u1_u2");
        }
        assert!(history
            .messages
            .windows(2)
            .all(|w| (w[0].timestamp, w[0].seq) < (w[1].timestamp, w[1].seq)));
    }

    #[tokio::test]
    async fn send_rules() {
        let (chat, _) = service_with_store();

        for (from, to, content) in [("u1", "u1", "hi"), ("u1", "u2", "   ")] {
            assert!(matches!(
                chat.send_message(from, to, content, MessageType::Text).await,
                Err(ServiceError::Validation(_))
            ));
        }

        let long = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(chat.send_message("u1", "u2", &long, MessageType::Text).await.is_err());
        let limit = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(chat.send_message("u1", "u2", &limit, MessageType::Text).await.is_ok());
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_and_reported() {
        let (chat, memory) = service_with_store();
        send(&chat, "u1", "u2", "first").await;

        memory
            .insert_raw_record(MessageRecord {
                id: Uuid::new_v4(),
                thread_id: "u1_u2".to_string(),
                seq: 1000,
                sender_id: None,
                receiver_id: Some("u2".to_string()),
                content: Some("orphan".to_string()),
                message_type: Some("text".to_string()),
                sent_at: Some(Utc::now()),
                is_read: Some(false),
            })
            .await;
        memory
            .insert_raw_record(MessageRecord {
                id: Uuid::new_v4(),
                thread_id: "u1_u2".to_string(),
                seq: 1001,
                sender_id: Some("u1".to_string()),
                receiver_id: Some("u2".to_string()),
                content: Some("sticker".to_string()),
                message_type: Some("sticker".to_string()),
                sent_at: Some(Utc::now()),
                is_read: Some(false),
            })
            .await;
        send(&chat, "u2", "u1", "second").await;

        let history = chat.load_history("u1", "u2").await.unwrap();
        let contents: Vec<&str> = history.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(history.skipped.len(), 2);
        assert!(history.skipped.iter().all(|s| s.starts_with("Invalid message data")));
    }

    #[tokio::test]
    async fn pairs_that_would_share_a_thread_are_refused() {
        let (chat, memory) = service_with_store();

        assert!(matches!(
            chat.send_message("a_b", "c", "private to a_b and c", MessageType::Text).await,
            Err(ServiceError::Validation(_))
        ));

        // a row left behind by an older writer under the colliding id
        memory
            .insert_raw_record(MessageRecord {
                id: Uuid::new_v4(),
                thread_id: "a_b_c".to_string(),
                seq: 7,
                sender_id: Some("a_b".to_string()),
                receiver_id: Some("c".to_string()),
                content: Some("private to a_b and c".to_string()),
                message_type: Some("text".to_string()),
                sent_at: Some(Utc::now()),
                is_read: Some(false),
            })
            .await;

        assert!(matches!(
            chat.load_history("a", "b_c").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(chat.thread_between("a", "b_c").is_err());
        assert_eq!(chat.thread_between("c", "a").unwrap(), "a_c");
    }

    #[tokio::test]
    async fn read_state_and_unread_counters() {
        let (chat, _) = service_with_store();
        let first = send(&chat, "u1", "u2", "one").await;
        send(&chat, "u1", "u2", "two").await;
        send(&chat, "u2", "u1", "back").await;

        assert_eq!(chat.unread_count("u2").await.unwrap(), 2);
        assert_eq!(chat.unread_count("u1").await.unwrap(), 1);

        assert!(chat.mark_read("u1_u2", first.id).await.unwrap());
        assert!(!chat.mark_read("u1_u2", first.id).await.unwrap());
        assert_eq!(chat.unread_count("u2").await.unwrap(), 1);

        assert!(matches!(
            chat.mark_read("u1_u2", Uuid::new_v4()).await,
            Err(ServiceError::NotFound { .. })
        ));

        assert_eq!(chat.mark_all_read("u1_u2", Some("u2")).await.unwrap(), 1);
        assert_eq!(chat.mark_all_read("u1_u2", Some("u2")).await.unwrap(), 0);
        assert_eq!(chat.unread_count("u2").await.unwrap(), 0);
        // u1's incoming message is untouched
        assert_eq!(chat.unread_count("u1").await.unwrap(), 1);

        assert_eq!(chat.mark_all_read("u1_u2", None).await.unwrap(), 1);
        let history = chat.load_history("u1", "u2").await.unwrap();
        assert!(history.messages.iter().all(|m| m.is_read));
    }

    #[tokio::test]
    async fn threads_sorted_by_latest_activity() {
        let (chat, _) = service_with_store();
        send(&chat, "u1", "u2", "old").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        send(&chat, "u3", "u1", "new").await;

        let threads = chat.list_threads("u1").await.unwrap();
        let others: Vec<&str> = threads.iter().map(|t| t.other_party_id.as_str()).collect();
        assert_eq!(others, vec!["u3", "u2"]);
    }

    #[tokio::test]
    async fn subscribers_see_only_their_thread() {
        let (chat, _) = service_with_store();
        let mut subscription = chat.subscribe(&thread_id("u1", "u2"));

        send(&chat, "u1", "u3", "elsewhere").await;
        let sent = send(&chat, "u2", "u1", "live").await;

        let received = tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, sent);
    }

    #[tokio::test]
    async fn subscription_stream_yields_messages() {
        let (chat, _) = service_with_store();
        let stream = chat.subscribe("u1_u2").into_stream();
        tokio::pin!(stream);

        send(&chat, "u1", "u2", "streamed").await;
        let received = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.content, "streamed");
    }

    #[tokio::test]
    async fn receiver_is_notified() {
        let (chat, memory) = service_with_store();
        send(&chat, "u1", "u2", "ping").await;

        let log = memory.list_notifications("u2").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].body, "ping");
        assert!(memory.list_notifications("u1").await.unwrap().is_empty());
    }
}
