/**
 * Chat Message Handlers
 *
 * - `GET /chats/{chat_id}/messages` - messages visible to the caller
 * - `POST /chats/{chat_id}/messages` - send through the event coordinator
 * - `DELETE /chats/{chat_id}/messages/{message_id}/me` - hide for the caller's side
 * - `DELETE /chats/{chat_id}/messages/{message_id}/all` - delete for everyone
 *
 * Hiding a message for one side is not broadcast; the other participant
 * keeps seeing it.
 */

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::backend::auth::directory::usernames;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::telemetry::context::RequestMeta;
use crate::shared::messaging::{ListMessagesResponse, SendMessageRequest};
use crate::shared::models::{Message, RoomKey, RoomMessage, Side, UserId, WithSender};

use super::parse_id;

pub async fn get_chat_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<Json<ListMessagesResponse<WithSender<Message>>>, BackendError> {
    let chat_id = parse_id(&chat_id, "chat")?;
    if !state.store.is_participant(chat_id, user.id()).await? {
        return Err(BackendError::forbidden("not a chat member"));
    }

    let messages = state.store.chat_messages_for_user(chat_id, user.id()).await?;

    let sender_ids: Vec<UserId> = messages.iter().map(|m| m.sender_id).collect();
    let names = if sender_ids.is_empty() {
        HashMap::new()
    } else {
        usernames(state.directory.as_ref(), &sender_ids)
            .await
            .map_err(|e| {
                tracing::warn!("[Chat] sender lookup failed: {}", e);
                BackendError::upstream("failed to load senders")
            })?
    };

    let messages = messages
        .into_iter()
        .map(|message| WithSender {
            sender_username: names.get(&message.sender_id).cloned(),
            inner: message,
        })
        .collect();
    Ok(Json(ListMessagesResponse { messages }))
}

pub async fn post_chat_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomMessage>), BackendError> {
    let room = RoomKey::chat(parse_id(&chat_id, "chat")?);
    state.coordinator.admit(room, user.id()).await?;
    let Json(request) = body?;

    let message = state
        .coordinator
        .send_message(room, user.id(), &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

fn parse_ids(chat_id: &str, message_id: &str) -> Result<(i64, i64), BackendError> {
    Ok((parse_id(chat_id, "chat")?, parse_id(message_id, "message")?))
}

pub async fn delete_message_for_me(
    State(state): State<AppState>,
    user: AuthUser,
    Path((chat_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, BackendError> {
    let (chat_id, message_id) = parse_ids(&chat_id, &message_id)?;

    let chat = state
        .store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| BackendError::not_found("chat not found"))?;
    if !chat.has_participant(user.id()) {
        return Err(BackendError::forbidden("not allowed"));
    }

    let message = state
        .store
        .get_message(message_id)
        .await?
        .ok_or_else(|| BackendError::not_found("message not found"))?;
    if message.chat_id != chat_id {
        return Err(BackendError::bad_request("message does not belong to chat"));
    }

    let side = Side::for_actor(user.id(), message.sender_id);
    state.store.soft_delete_for_user(message_id, side).await?;
    tracing::debug!("[Chat] message {} hidden for {:?} by user {}", message_id, side, user.id());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_message_for_all(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path((chat_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, BackendError> {
    let (chat_id, message_id) = parse_ids(&chat_id, &message_id)?;

    state
        .coordinator
        .delete_for_all(RoomKey::chat(chat_id), user.id(), message_id, &meta)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
