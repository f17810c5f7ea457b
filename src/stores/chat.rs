// src/stores/chat.rs - Chat rooms and their message threads
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{now_iso, read_state, write_state, DataSource, RequestSequencer};
use crate::api::chat as api;
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::format::build_preview;
use crate::models::{
    ChatMessage, ChatMessageCreateRequest, ChatRole, ChatRoom, ChatRoomCreateRequest, ChatRoomUpdateRequest,
    ASSISTANT_UNAVAILABLE, DEFAULT_ROOM_TITLE, TEMP_MESSAGE_PREFIX,
};

const ROOM_LIMIT: u32 = 50;
const MESSAGE_LIMIT: u32 = 200;
const GUEST_SENDER: &str = "guest";

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Most recently active first.
    pub rooms: Vec<ChatRoom>,
    pub active_room_id: Option<String>,
    pub messages: HashMap<String, Vec<ChatMessage>>,
    pub is_loading_rooms: bool,
    pub is_loading_messages: bool,
    pub is_sending: bool,
}

pub struct ChatStore {
    client: Arc<ApiClient>,
    source: DataSource,
    default_title: String,
    state: RwLock<ChatState>,
    sequencer: RequestSequencer,
}

/// Clears the sending flag however `send_message` exits.
struct SendingGuard<'a>(&'a RwLock<ChatState>);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        write_state(self.0).is_sending = false;
    }
}

impl ChatStore {
    pub fn new(client: Arc<ApiClient>, source: DataSource) -> Self {
        Self {
            client,
            source,
            default_title: DEFAULT_ROOM_TITLE.to_string(),
            state: RwLock::new(ChatState::default()),
            sequencer: RequestSequencer::new(),
        }
    }

    /// Title used for rooms created without one. Blank keeps the default.
    pub fn with_default_title(mut self, title: &str) -> Self {
        if !title.trim().is_empty() {
            self.default_title = title.trim().to_string();
        }
        self
    }

    pub fn snapshot(&self) -> ChatState {
        read_state(&self.state).clone()
    }

    pub fn rooms(&self) -> Vec<ChatRoom> {
        read_state(&self.state).rooms.clone()
    }

    pub fn active_room_id(&self) -> Option<String> {
        read_state(&self.state).active_room_id.clone()
    }

    /// Messages of the active room.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let state = read_state(&self.state);
        state
            .active_room_id
            .as_ref()
            .and_then(|id| state.messages.get(id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_sending(&self) -> bool {
        read_state(&self.state).is_sending
    }

    fn safe_title(&self, title: Option<&str>) -> String {
        title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_title.clone())
    }

    // ==================== LOADING ====================

    /// Loads the room list and activates the first room when none is active.
    pub async fn load_rooms(&self) -> ApiResult<()> {
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue("rooms");
        write_state(&self.state).is_loading_rooms = true;
        let result = api::fetch_chat_rooms(&self.client, ROOM_LIMIT, None).await;
        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let activated = {
            let mut state = write_state(&self.state);
            state.is_loading_rooms = false;
            match result {
                Ok(response) => {
                    state.rooms = response.items;
                    if state.active_room_id.is_none() {
                        state.active_room_id = state.rooms.first().map(|r| r.id.clone());
                    }
                    state
                        .active_room_id
                        .clone()
                        .filter(|id| !state.messages.contains_key(id))
                }
                Err(e) => {
                    log::warn!("Chat room load failed: {}", e);
                    state.rooms.clear();
                    return Err(e);
                }
            }
        };

        if let Some(room_id) = activated {
            self.load_messages(&room_id).await?;
        }
        Ok(())
    }

    /// Fetches the thread of `room_id`. A failure leaves the thread empty.
    pub async fn load_messages(&self, room_id: &str) -> ApiResult<()> {
        if self.source.is_mock() {
            return Ok(());
        }

        let ticket = self.sequencer.issue(format!("messages:{}", room_id));
        write_state(&self.state).is_loading_messages = true;
        let result = api::fetch_chat_messages(&self.client, room_id, MESSAGE_LIMIT, None).await;
        if !self.sequencer.accept(&ticket) {
            return Ok(());
        }

        let mut state = write_state(&self.state);
        state.is_loading_messages = false;
        match result {
            Ok(response) => {
                state.messages.insert(room_id.to_string(), response.items);
                Ok(())
            }
            Err(e) => {
                log::warn!("Message load for room {} failed: {}", room_id, e);
                state.messages.insert(room_id.to_string(), Vec::new());
                Err(e)
            }
        }
    }

    /// Activates a room, loading its thread the first time.
    pub async fn set_active_room(&self, room_id: Option<&str>) -> ApiResult<()> {
        let needs_load = {
            let mut state = write_state(&self.state);
            state.active_room_id = room_id.map(str::to_string);
            room_id.map_or(false, |id| !state.messages.contains_key(id))
        };
        match room_id {
            Some(id) if needs_load => self.load_messages(id).await,
            _ => Ok(()),
        }
    }

    // ==================== ROOMS ====================

    pub async fn create_room(&self, title: Option<&str>) -> ApiResult<ChatRoom> {
        let title = self.safe_title(title);
        let room = if self.source.is_mock() {
            ChatRoom {
                id: format!("room-{}", uuid::Uuid::new_v4()),
                title,
                room_type: "public".to_string(),
                created_at: Some(now_iso()),
                last_message_at: None,
                last_message_preview: None,
            }
        } else {
            api::create_chat_room(&self.client, &ChatRoomCreateRequest { title }).await?
        };

        let mut state = write_state(&self.state);
        state.rooms.insert(0, room.clone());
        state.active_room_id = Some(room.id.clone());
        state.messages.insert(room.id.clone(), Vec::new());
        Ok(room)
    }

    pub async fn rename_room(&self, room_id: &str, title: &str) -> ApiResult<ChatRoom> {
        let title = self.safe_title(Some(title));
        if self.source.is_mock() {
            let mut state = write_state(&self.state);
            let room = state
                .rooms
                .iter_mut()
                .find(|r| r.id == room_id)
                .ok_or_else(|| crate::error::ApiError::NotFound(format!("Chat room '{}' not found", room_id)))?;
            room.title = title;
            return Ok(room.clone());
        }

        let updated = api::update_chat_room(&self.client, room_id, &ChatRoomUpdateRequest { title }).await?;
        let mut state = write_state(&self.state);
        if let Some(slot) = state.rooms.iter_mut().find(|r| r.id == room_id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    /// Deletes a room. If it was active, the first remaining room takes over.
    pub async fn delete_room(&self, room_id: &str) -> ApiResult<()> {
        if !self.source.is_mock() {
            api::delete_chat_room(&self.client, room_id).await?;
        }

        let mut state = write_state(&self.state);
        state.rooms.retain(|r| r.id != room_id);
        state.messages.remove(room_id);
        if state.active_room_id.as_deref() == Some(room_id) {
            state.active_room_id = state.rooms.first().map(|r| r.id.clone());
        }
        Ok(())
    }

    fn promote_room(state: &mut ChatState, room_id: &str, preview: String, at: Option<String>) {
        if let Some(index) = state.rooms.iter().position(|r| r.id == room_id) {
            let mut room = state.rooms.remove(index);
            room.last_message_preview = Some(preview);
            room.last_message_at = at;
            state.rooms.insert(0, room);
        }
    }

    fn push_message(state: &mut ChatState, room_id: &str, message: ChatMessage) {
        state.messages.entry(room_id.to_string()).or_default().push(message);
    }

    // ==================== MESSAGES ====================

    /// Sends `content` to the active room, creating one first when none is
    /// active. Returns the assistant's reply, or `None` when nothing was sent
    /// (blank content, or a send already in flight).
    pub async fn send_message(&self, content: &str, user: Option<&str>) -> ApiResult<Option<ChatMessage>> {
        let message = content.trim().to_string();
        {
            let mut state = write_state(&self.state);
            if message.is_empty() || state.is_sending {
                return Ok(None);
            }
            state.is_sending = true;
        }
        let _sending = SendingGuard(&self.state);

        let room_id = match self.active_room_id() {
            Some(id) => id,
            None => self.create_room(None).await?.id,
        };

        let now = now_iso();
        let temp_id = format!("{}{}", TEMP_MESSAGE_PREFIX, uuid::Uuid::new_v4());
        let optimistic = ChatMessage {
            id: temp_id.clone(),
            room_id: room_id.clone(),
            role: ChatRole::User,
            content: message.clone(),
            created_at: Some(now.clone()),
            sender_type: GUEST_SENDER.to_string(),
            sender_id: None,
            sender_name: Some(user.filter(|u| !u.is_empty()).unwrap_or("Guest").to_string()),
        };
        {
            let mut state = write_state(&self.state);
            Self::push_message(&mut state, &room_id, optimistic);
            Self::promote_room(&mut state, &room_id, build_preview(&message), Some(now));
        }

        if self.source.is_mock() {
            let reply = assistant_message(&room_id, format!("Mock response: {}", message), "mock");
            let mut state = write_state(&self.state);
            Self::push_message(&mut state, &room_id, reply.clone());
            Self::promote_room(&mut state, &room_id, build_preview(&reply.content), reply.created_at.clone());
            return Ok(Some(reply));
        }

        let payload = ChatMessageCreateRequest {
            message,
            user: user.map(str::to_string),
            sender_type: GUEST_SENDER.to_string(),
            sender_id: None,
        };
        match api::post_chat_message(&self.client, &room_id, &payload).await {
            Ok(response) => {
                let reply = response.assistant_message;
                let mut state = write_state(&self.state);
                let thread = state.messages.entry(room_id.clone()).or_default();
                thread.retain(|m| m.id != temp_id);
                thread.push(response.user_message);
                thread.push(reply.clone());
                Self::promote_room(&mut state, &room_id, build_preview(&reply.content), reply.created_at.clone());
                Ok(Some(reply))
            }
            Err(e) => {
                log::warn!("Chat message to room {} failed: {}", room_id, e);
                let notice = assistant_message(&room_id, ASSISTANT_UNAVAILABLE.to_string(), "err");
                Self::push_message(&mut write_state(&self.state), &room_id, notice);
                Err(e)
            }
        }
    }
}

fn assistant_message(room_id: &str, content: String, id_prefix: &str) -> ChatMessage {
    ChatMessage {
        id: format!("{}-{}", id_prefix, uuid::Uuid::new_v4()),
        room_id: room_id.to_string(),
        role: ChatRole::Assistant,
        content,
        created_at: Some(now_iso()),
        sender_type: "assistant".to_string(),
        sender_id: None,
        sender_name: Some("Assistant".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn store(source: DataSource) -> ChatStore {
        let client = Arc::new(ApiClient::new(&Config::for_base_url("http://127.0.0.1:1")).unwrap());
        ChatStore::new(client, source)
    }

    #[tokio::test]
    async fn test_mock_send_creates_room_and_echoes() {
        let store = store(DataSource::Mock);
        let reply = store.send_message("  hello  ", Some("Kim")).await.unwrap().unwrap();
        assert_eq!(reply.content, "Mock response: hello");

        let rooms = store.rooms();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].title, DEFAULT_ROOM_TITLE);
        assert_eq!(rooms[0].last_message_preview.as_deref(), Some("Mock response: hello"));

        let messages = store.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[0].sender_name.as_deref(), Some("Kim"));
        assert!(!store.is_sending());
    }

    #[tokio::test]
    async fn test_blank_message_is_noop() {
        let store = store(DataSource::Mock);
        assert!(store.send_message("   ", None).await.unwrap().is_none());
        assert!(store.rooms().is_empty());
    }

    #[tokio::test]
    async fn test_send_while_sending_is_noop() {
        let store = store(DataSource::Mock);
        write_state(&store.state).is_sending = true;
        assert!(store.send_message("hi", None).await.unwrap().is_none());
        assert!(store.rooms().is_empty());
    }

    #[tokio::test]
    async fn test_send_promotes_room() {
        let store = store(DataSource::Mock);
        let first = store.create_room(Some("First")).await.unwrap();
        let second = store.create_room(Some("Second")).await.unwrap();
        assert_eq!(store.rooms()[0].id, second.id);

        store.set_active_room(Some(&first.id)).await.unwrap();
        store.send_message("ping", None).await.unwrap();
        assert_eq!(store.rooms()[0].id, first.id);
    }

    #[tokio::test]
    async fn test_rename_and_delete_room() {
        let store = store(DataSource::Mock);
        let a = store.create_room(Some("A")).await.unwrap();
        let b = store.create_room(None).await.unwrap();
        assert_eq!(b.title, DEFAULT_ROOM_TITLE);

        let renamed = store.rename_room(&a.id, "  ").await.unwrap();
        assert_eq!(renamed.title, DEFAULT_ROOM_TITLE);

        store.delete_room(&b.id).await.unwrap();
        assert_eq!(store.active_room_id(), Some(a.id.clone()));
        assert_eq!(store.rooms().len(), 1);
    }

    #[tokio::test]
    async fn test_live_room_load_failure_clears_rooms() {
        let store = store(DataSource::Live);
        assert!(store.load_rooms().await.is_err());
        assert!(store.rooms().is_empty());
        assert!(!store.snapshot().is_loading_rooms);
    }
}
