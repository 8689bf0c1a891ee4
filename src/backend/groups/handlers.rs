/**
 * Group Handlers
 *
 * - `POST /groups` - create a group, audited on every outcome
 * - `GET /groups` - groups the caller belongs to
 * - `GET /groups/{group_id}/messages` - messages not deleted for all
 * - `POST /groups/{group_id}/messages` - send through the event coordinator
 * - `DELETE /groups/{group_id}/messages/{message_id}/all` - delete for everyone
 */

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::backend::auth::directory::usernames;
use crate::backend::chat::parse_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::telemetry::audit::HttpOutcome;
use crate::backend::telemetry::context::RequestMeta;
use crate::shared::messaging::{
    CreateGroupRequest, CreateGroupResponse, ListGroupsResponse, ListMessagesResponse,
    SendMessageRequest,
};
use crate::shared::models::{GroupMessage, RoomKey, RoomMessage, UserId, WithSender};

fn audit_group_create(
    state: &AppState,
    actor: UserId,
    meta: &RequestMeta,
    status: StatusCode,
    group_id: Option<i64>,
    member_ids: &[UserId],
    error: Option<&BackendError>,
) {
    let http = HttpOutcome {
        method: "POST",
        path: "/groups",
        status: status.as_u16(),
    };
    let error = error.map(BackendError::message);
    state
        .audit
        .group_created(actor, meta, http, group_id, member_ids, error.as_deref());
}

pub async fn create_group(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    body: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateGroupResponse>), BackendError> {
    let actor = user.id();

    let request = match body {
        Ok(Json(request)) if !request.name.trim().is_empty() => request,
        Ok(Json(request)) => {
            let err = BackendError::bad_request("name is required");
            audit_group_create(&state, actor, &meta, err.status_code(), None, &request.member_ids, Some(&err));
            return Err(err);
        }
        Err(rejection) => {
            let err = BackendError::from(rejection);
            audit_group_create(&state, actor, &meta, err.status_code(), None, &[], Some(&err));
            return Err(err);
        }
    };

    if !request.member_ids.is_empty() {
        if let Err(e) = state.directory.bulk_users(&request.member_ids).await {
            tracing::warn!("[Groups] member validation failed: {}", e);
            let err = BackendError::upstream("failed to validate members");
            audit_group_create(&state, actor, &meta, err.status_code(), None, &request.member_ids, Some(&err));
            return Err(err);
        }
    }

    match state.store.create_group(actor, &request.name, &request.member_ids).await {
        Ok(group) => {
            tracing::info!("[Groups] user {} created group {}", actor, group.id);
            audit_group_create(&state, actor, &meta, StatusCode::CREATED, Some(group.id), &request.member_ids, None);
            Ok((StatusCode::CREATED, Json(CreateGroupResponse { group_id: group.id })))
        }
        Err(e) => {
            tracing::error!("[Groups] failed to create group for {}: {}", actor, e);
            let err = BackendError::storage("could not create group");
            audit_group_create(&state, actor, &meta, err.status_code(), None, &request.member_ids, Some(&err));
            Err(err)
        }
    }
}

pub async fn list_groups(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ListGroupsResponse>, BackendError> {
    let groups = state.store.list_groups_for_user(user.id()).await?;
    Ok(Json(ListGroupsResponse { groups }))
}

async fn ensure_member(state: &AppState, group_id: i64, user_id: UserId) -> Result<(), BackendError> {
    if state.store.is_member(group_id, user_id).await? {
        Ok(())
    } else {
        Err(BackendError::forbidden("not a member"))
    }
}

pub async fn get_group_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(group_id): Path<String>,
) -> Result<Json<ListMessagesResponse<WithSender<GroupMessage>>>, BackendError> {
    let group_id = parse_id(&group_id, "group")?;
    ensure_member(&state, group_id, user.id()).await?;

    let messages = state.store.group_messages(group_id).await?;

    let sender_ids: Vec<UserId> = messages.iter().map(|m| m.sender_id).collect();
    let names = if sender_ids.is_empty() {
        HashMap::new()
    } else {
        usernames(state.directory.as_ref(), &sender_ids)
            .await
            .map_err(|e| {
                tracing::warn!("[Groups] sender lookup failed: {}", e);
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

pub async fn post_group_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(group_id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoomMessage>), BackendError> {
    let room = RoomKey::group(parse_id(&group_id, "group")?);
    state.coordinator.admit(room, user.id()).await?;
    let Json(request) = body?;

    let message = state
        .coordinator
        .send_message(room, user.id(), &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn delete_group_message_for_all(
    State(state): State<AppState>,
    user: AuthUser,
    meta: RequestMeta,
    Path((group_id, message_id)): Path<(String, String)>,
) -> Result<StatusCode, BackendError> {
    let group_id = parse_id(&group_id, "group")?;
    let message_id = parse_id(&message_id, "message")?;

    state
        .coordinator
        .delete_for_all(RoomKey::group(group_id), user.id(), message_id, &meta)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
