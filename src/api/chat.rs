// src/api/chat.rs
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    ChatMessage, ChatMessageCreateRequest, ChatMessageCreateResponse, ChatRoom, ChatRoomCreateRequest,
    ChatRoomUpdateRequest, ListResponse, StatusResponse,
};
use crate::query::{encode_path_segment, ApiQuery};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

pub async fn fetch_chat_rooms(
    client: &ApiClient,
    limit: u32,
    cursor: Option<&str>,
) -> ApiResult<ListResponse<ChatRoom>> {
    let query = ApiQuery::new().limit(limit).cursor(cursor).build();
    client.get(&format!("/api/chat/rooms{}", query)).await
}

pub async fn create_chat_room(client: &ApiClient, payload: &ChatRoomCreateRequest) -> ApiResult<ChatRoom> {
    client.post("/api/chat/rooms", payload).await
}

pub async fn update_chat_room(
    client: &ApiClient,
    room_id: &str,
    payload: &ChatRoomUpdateRequest,
) -> ApiResult<ChatRoom> {
    client
        .patch(&format!("/api/chat/rooms/{}", encode_path_segment(room_id)), payload)
        .await
}

pub async fn delete_chat_room(client: &ApiClient, room_id: &str) -> ApiResult<Option<StatusResponse>> {
    client
        .delete(&format!("/api/chat/rooms/{}", encode_path_segment(room_id)))
        .await
}

pub async fn fetch_chat_messages(
    client: &ApiClient,
    room_id: &str,
    limit: u32,
    cursor: Option<&str>,
) -> ApiResult<ListResponse<ChatMessage>> {
    let query = ApiQuery::new().limit(limit).cursor(cursor).build();
    client
        .get(&format!("/api/chat/rooms/{}/messages{}", encode_path_segment(room_id), query))
        .await
}

pub async fn post_chat_message(
    client: &ApiClient,
    room_id: &str,
    payload: &ChatMessageCreateRequest,
) -> ApiResult<ChatMessageCreateResponse> {
    client
        .post(&format!("/api/chat/rooms/{}/messages", encode_path_segment(room_id)), payload)
        .await
}
