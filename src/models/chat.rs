// src/models/chat.rs
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub const DEFAULT_ROOM_TITLE: &str = "New Chat";
pub const ASSISTANT_UNAVAILABLE: &str = "Unable to reach the assistant right now.";
pub const TEMP_MESSAGE_PREFIX: &str = "temp-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_room_type")]
    pub room_type: String,
    pub created_at: Option<String>,
    pub last_message_at: Option<String>,
    pub last_message_preview: Option<String>,
}

fn default_room_type() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    pub created_at: Option<String>,
    #[serde(default)]
    pub sender_type: String,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
}

impl ChatMessage {
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_MESSAGE_PREFIX)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRoomCreateRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRoomUpdateRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageCreateRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub sender_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageCreateResponse {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_create_response() {
        let response: ChatMessageCreateResponse = serde_json::from_str(
            r#"{
                "userMessage": {"id": "11", "roomId": "3", "role": "user", "content": "hi",
                    "createdAt": "2026-01-01T10:00:00", "senderType": "guest",
                    "senderId": null, "senderName": "Kim"},
                "assistantMessage": {"id": "12", "roomId": "3", "role": "assistant",
                    "content": "hello", "createdAt": "2026-01-01T10:00:01",
                    "senderType": "assistant", "senderId": null, "senderName": null}
            }"#,
        )
        .unwrap();
        assert_eq!(response.user_message.role, ChatRole::User);
        assert_eq!(response.assistant_message.content, "hello");
        assert!(!response.user_message.is_temporary());
    }

    #[test]
    fn test_create_request_omits_missing_user() {
        let body = serde_json::to_value(ChatMessageCreateRequest {
            message: "hi".to_string(),
            user: None,
            sender_type: "guest".to_string(),
            sender_id: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"message": "hi", "sender_type": "guest"}));
    }
}
