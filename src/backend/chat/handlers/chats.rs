/**
 * Chat Handlers
 *
 * - `GET /chats` - chats the caller has not hidden, with friend usernames
 * - `POST /chats/start` - create or reopen the chat with a friend
 * - `DELETE /chats/{chat_id}/me` - hide a chat for the caller
 */

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::backend::auth::directory::usernames;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{ListChatsResponse, StartChatRequest, StartChatResponse};
use crate::shared::models::UserId;

use super::parse_id;

pub async fn list_chats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ListChatsResponse>, BackendError> {
    let mut chats = state.store.list_chats(user.id()).await?;

    let friend_ids: Vec<UserId> = chats.iter().map(|chat| chat.friend_id).collect();
    let names = usernames(state.directory.as_ref(), &friend_ids)
        .await
        .map_err(|e| {
            tracing::warn!("[Chat] user lookup failed: {}", e);
            BackendError::upstream("failed to load user info")
        })?;

    for chat in &mut chats {
        chat.friend_username = names.get(&chat.friend_id).cloned();
    }
    Ok(Json(ListChatsResponse { chats }))
}

pub async fn start_chat(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<StartChatRequest>, JsonRejection>,
) -> Result<Json<StartChatResponse>, BackendError> {
    let Json(request) = body?;
    let user_id = user.id();

    let friends = state
        .directory
        .are_friends(user_id, request.friend_id)
        .await
        .map_err(|e| {
            tracing::warn!("[Chat] friendship lookup failed: {}", e);
            BackendError::upstream("failed to validate friendship")
        })?;
    if !friends {
        return Err(BackendError::forbidden("users are not friends"));
    }
    if user_id == request.friend_id {
        return Err(BackendError::bad_request("cannot chat with yourself"));
    }

    let chat = state.store.create_or_get_chat(user_id, request.friend_id).await?;
    tracing::info!("[Chat] user {} opened chat {} with {}", user_id, chat.id, request.friend_id);
    Ok(Json(StartChatResponse { chat_id: chat.id }))
}

pub async fn delete_chat_for_me(
    State(state): State<AppState>,
    user: AuthUser,
    Path(chat_id): Path<String>,
) -> Result<StatusCode, BackendError> {
    let chat_id = parse_id(&chat_id, "chat")?;
    let chat = state
        .store
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| BackendError::not_found("chat not found"))?;
    if !chat.has_participant(user.id()) {
        return Err(BackendError::forbidden("not allowed"));
    }

    state.store.hide_chat_for_user(chat_id, user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
