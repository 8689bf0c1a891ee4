//! Private chat request and response bodies

use serde::{Deserialize, Serialize};

use crate::shared::models::{ChatSummary, UserId};

/// `POST /chats/start`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartChatRequest {
    pub friend_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartChatResponse {
    pub chat_id: i64,
}

/// `GET /chats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListChatsResponse {
    pub chats: Vec<ChatSummary>,
}

/// Body of both message POST endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Message listing of either room kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse<T> {
    pub messages: Vec<T>,
}
