use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::chatmodel::MessageType;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendMessageDto {
    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub content: String,

    #[serde(default)]
    pub message_type: MessageType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub flipped: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}
