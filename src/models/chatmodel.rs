// models/chatmodel.rs
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::error::ServiceError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
    Location,
}

impl MessageType {
    pub fn to_str(&self) -> &str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::Location => "location",
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "file" => Ok(MessageType::File),
            "location" => Ok(MessageType::Location),
            other => Err(format!("unknown message type '{}'", other)),
        }
    }
}

pub const THREAD_SEPARATOR: char = '_';

/// Canonical id of the conversation between two parties. Both sides compute
/// the same value independently.
pub fn thread_id(party_a: &str, party_b: &str) -> String {
    let mut parties = [party_a, party_b];
    parties.sort();
    parties.join("_")
}

/// Ids that keep `thread_id` unambiguous: non-empty, no separator.
pub fn is_chat_party_id(party_id: &str) -> bool {
    !party_id.is_empty() && !party_id.contains(THREAD_SEPARATOR)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub thread_id: String,
    pub seq: i64,
    pub content: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub message_type: MessageType,
}

impl ChatMessage {
    /// True when the message was exchanged between exactly these two parties.
    pub fn is_between(&self, party_a: &str, party_b: &str) -> bool {
        (self.sender_id == party_a && self.receiver_id == party_b)
            || (self.sender_id == party_b && self.receiver_id == party_a)
    }
}

/// A message row as it sits in the log store. Every field except the keys
/// may be missing or malformed, so reads go through `TryFrom`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct MessageRecord {
    pub id: Uuid,
    pub thread_id: String,
    pub seq: i64,
    pub sender_id: Option<String>,
    pub receiver_id: Option<String>,
    pub content: Option<String>,
    pub message_type: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub is_read: Option<bool>,
}

impl TryFrom<MessageRecord> for ChatMessage {
    type Error = ServiceError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| ServiceError::InvalidMessageData(format!("message {}: {}", record.id, reason));

        let sender_id = record.sender_id.clone().ok_or_else(|| invalid("missing sender_id"))?;
        let receiver_id = record.receiver_id.clone().ok_or_else(|| invalid("missing receiver_id"))?;
        let content = record.content.clone().ok_or_else(|| invalid("missing content"))?;
        let timestamp = record.sent_at.ok_or_else(|| invalid("missing timestamp"))?;
        let message_type = record
            .message_type
            .as_deref()
            .ok_or_else(|| invalid("missing message_type"))?
            .parse::<MessageType>()
            .map_err(|e| invalid(&e))?;

        if thread_id(&sender_id, &receiver_id) != record.thread_id {
            return Err(invalid("parties do not belong to the thread"));
        }

        Ok(ChatMessage {
            id: record.id,
            thread_id: record.thread_id,
            seq: record.seq,
            content,
            sender_id,
            receiver_id,
            timestamp,
            is_read: record.is_read.unwrap_or(false),
            message_type,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub message_type: MessageType,
}

/// One row of a party's thread index.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ChatSummary {
    pub thread_id: String,
    pub party_id: String,
    pub other_party_id: String,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i32,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    // records that could not be parsed; not fatal for the read
    pub skipped: Vec<String>,
}
