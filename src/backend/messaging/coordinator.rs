/**
 * Event Coordinator
 *
 * Persist-then-broadcast for the two operations that reach live sockets:
 * sending a message and deleting one for everyone. Nothing is broadcast
 * unless the store write succeeded.
 */

use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::store::Store;
use crate::backend::telemetry::audit::AuditEmitter;
use crate::backend::telemetry::context::RequestMeta;
use crate::shared::event::WireEvent;
use crate::shared::models::{validate_content, Chat, RoomKey, RoomKind, RoomMessage, UserId};

#[derive(Clone)]
pub struct EventCoordinator {
    store: Arc<dyn Store>,
    broadcaster: Broadcaster,
    audit: AuditEmitter,
}

impl EventCoordinator {
    pub fn new(store: Arc<dyn Store>, broadcaster: Broadcaster, audit: AuditEmitter) -> Self {
        Self {
            store,
            broadcaster,
            audit,
        }
    }

    /// Chat must exist and include `user_id`
    async fn chat_for_participant(&self, chat_id: i64, user_id: UserId) -> Result<Chat, BackendError> {
        let chat = self
            .store
            .get_chat(chat_id)
            .await?
            .ok_or_else(|| BackendError::not_found("chat not found"))?;
        if !chat.has_participant(user_id) {
            return Err(BackendError::forbidden("not a chat member"));
        }
        Ok(chat)
    }

    async fn ensure_group_member(&self, group_id: i64, user_id: UserId) -> Result<(), BackendError> {
        if self.store.is_member(group_id, user_id).await? {
            Ok(())
        } else {
            Err(BackendError::forbidden("not a member"))
        }
    }

    /// Room must exist and accept `user_id` as a sender
    pub async fn admit(&self, room: RoomKey, user_id: UserId) -> Result<(), BackendError> {
        match room.kind {
            RoomKind::Chat => self.chat_for_participant(room.resource_id, user_id).await.map(|_| ()),
            RoomKind::Group => self.ensure_group_member(room.resource_id, user_id).await,
        }
    }

    /// Store a new message and push it to the room
    pub async fn send_message(
        &self,
        room: RoomKey,
        sender_id: UserId,
        content: &str,
    ) -> Result<RoomMessage, BackendError> {
        let content = validate_content(content)?;

        let message = match room.kind {
            RoomKind::Chat => {
                let chat = self.chat_for_participant(room.resource_id, sender_id).await?;
                let message = self
                    .store
                    .create_chat_message(chat.id, sender_id, content)
                    .await?;
                for user_id in chat.participants() {
                    if let Err(e) = self.store.unhide_chat_for_user(chat.id, user_id).await {
                        tracing::warn!("[Messaging] failed to unhide {} for user {}: {}", room, user_id, e);
                    }
                }
                RoomMessage::Chat(message)
            }
            RoomKind::Group => {
                self.ensure_group_member(room.resource_id, sender_id).await?;
                let message = self
                    .store
                    .create_group_message(room.resource_id, sender_id, content)
                    .await?;
                RoomMessage::Group(message)
            }
        };

        tracing::debug!("[Messaging] stored message {} in {}", message.id(), room);
        self.broadcaster
            .publish(room, &WireEvent::message(message.clone()))
            .await;
        Ok(message)
    }

    /// Terminal delete by the original sender, then notify the room
    pub async fn delete_for_all(
        &self,
        room: RoomKey,
        actor: UserId,
        message_id: i64,
        meta: &RequestMeta,
    ) -> Result<(), BackendError> {
        match room.kind {
            RoomKind::Chat => {
                self.chat_for_participant(room.resource_id, actor).await?;
                let message = self
                    .store
                    .get_message(message_id)
                    .await?
                    .ok_or_else(|| BackendError::not_found("message not found"))?;
                if message.chat_id != room.resource_id {
                    return Err(BackendError::bad_request("message does not belong to chat"));
                }
                if message.sender_id != actor {
                    return Err(BackendError::forbidden("only sender can delete for all"));
                }
                self.store.delete_for_all(message_id, actor).await?;
            }
            RoomKind::Group => {
                self.ensure_group_member(room.resource_id, actor).await?;
                let message = self
                    .store
                    .get_group_message(message_id)
                    .await?
                    .ok_or_else(|| BackendError::not_found("message not found"))?;
                if message.group_id != room.resource_id {
                    return Err(BackendError::bad_request("message does not belong to group"));
                }
                if message.sender_id != actor {
                    return Err(BackendError::forbidden("only sender can delete for all"));
                }
                self.store.delete_group_message_for_all(message_id, actor).await?;
            }
        }

        tracing::info!("[Messaging] user {} deleted message {} in {} for all", actor, message_id, room);
        self.audit.message_deleted_for_all(actor, meta, room, message_id);
        self.broadcaster
            .publish(room, &WireEvent::delete_for_all(message_id))
            .await;
        Ok(())
    }
}
