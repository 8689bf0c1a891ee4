//! In-process store
//!
//! Same contract as `PgStore`, backed by maps behind one mutex. Used by the
//! test suite and for running the service without a database.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::backend::store::{
    ChatStore, GroupMessageStore, GroupStore, MessageStore, StoreError,
};
use crate::shared::models::{
    canonical_pair, Chat, ChatSummary, Group, GroupMessage, Lifecycle, Message, Side, UserId,
    Visibility,
};

#[derive(Default)]
struct Inner {
    next_id: i64,
    chats: BTreeMap<i64, Chat>,
    chat_pairs: HashMap<(UserId, UserId), i64>,
    hidden_chats: HashSet<(i64, UserId)>,
    messages: BTreeMap<i64, Message>,
    groups: BTreeMap<i64, Group>,
    group_members: HashMap<i64, BTreeSet<UserId>>,
    group_messages: BTreeMap<i64, GroupMessage>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_or_get_chat(&self, a: UserId, b: UserId) -> Result<Chat, StoreError> {
        if a == b {
            return Err(StoreError::Invalid("cannot create chat with self".to_string()));
        }
        let pair = canonical_pair(a, b);
        let mut inner = self.lock();

        let existing = inner.chat_pairs.get(&pair).copied();
        let chat_id = match existing {
            Some(id) => id,
            None => {
                let id = inner.next_id();
                inner.chats.insert(
                    id,
                    Chat { id, user1_id: pair.0, user2_id: pair.1, created_at: Utc::now() },
                );
                inner.chat_pairs.insert(pair, id);
                id
            }
        };
        inner.hidden_chats.remove(&(chat_id, a));
        inner.hidden_chats.remove(&(chat_id, b));

        inner.chats.get(&chat_id).cloned().ok_or(StoreError::NotFound("chat"))
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, StoreError> {
        Ok(self.lock().chats.get(&chat_id).cloned())
    }

    async fn is_participant(&self, chat_id: i64, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .chats
            .get(&chat_id)
            .is_some_and(|chat| chat.has_participant(user_id)))
    }

    async fn list_chats(&self, user_id: UserId) -> Result<Vec<ChatSummary>, StoreError> {
        let inner = self.lock();
        let mut chats: Vec<&Chat> = inner
            .chats
            .values()
            .filter(|chat| chat.has_participant(user_id))
            .filter(|chat| !inner.hidden_chats.contains(&(chat.id, user_id)))
            .collect();
        chats.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(chats
            .into_iter()
            .map(|chat| ChatSummary {
                chat_id: chat.id,
                friend_id: chat.other_participant(user_id),
                friend_username: None,
                created_at: chat.created_at,
            })
            .collect())
    }

    async fn hide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError> {
        self.lock().hidden_chats.insert((chat_id, user_id));
        Ok(())
    }

    async fn unhide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError> {
        self.lock().hidden_chats.remove(&(chat_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_chat_message(
        &self,
        chat_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut inner = self.lock();
        if !inner.chats.contains_key(&chat_id) {
            return Err(StoreError::NotFound("chat"));
        }
        let id = inner.next_id();
        let message = Message {
            id,
            chat_id,
            sender_id,
            content: content.to_string(),
            visibility: Visibility::active(),
            created_at: Utc::now(),
        };
        inner.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn chat_messages_for_user(
        &self,
        chat_id: i64,
        viewer: UserId,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        let mut messages: Vec<Message> = inner
            .messages
            .values()
            .filter(|m| m.chat_id == chat_id && m.visible_to(viewer))
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn get_message(&self, message_id: i64) -> Result<Option<Message>, StoreError> {
        Ok(self.lock().messages.get(&message_id).cloned())
    }

    async fn soft_delete_for_user(&self, message_id: i64, side: Side) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let message = inner
            .messages
            .get_mut(&message_id)
            .ok_or(StoreError::NotFound("message"))?;
        message.visibility.hide_for(side);
        Ok(())
    }

    async fn delete_for_all(&self, message_id: i64, sender_id: UserId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner.messages.get_mut(&message_id) {
            Some(message) if message.sender_id == sender_id => {
                message.visibility.delete_for_all();
                Ok(())
            }
            _ => Err(StoreError::NotFound("message")),
        }
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn create_group(
        &self,
        owner_id: UserId,
        name: &str,
        member_ids: &[UserId],
    ) -> Result<Group, StoreError> {
        let mut members: BTreeSet<UserId> = member_ids.iter().copied().collect();
        members.insert(owner_id);

        let mut inner = self.lock();
        let id = inner.next_id();
        let group = Group { id, name: name.to_string(), owner_id, created_at: Utc::now() };
        inner.groups.insert(id, group.clone());
        inner.group_members.insert(id, members);
        Ok(group)
    }

    async fn list_groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>, StoreError> {
        let inner = self.lock();
        let mut groups: Vec<Group> = inner
            .groups
            .values()
            .filter(|g| {
                inner
                    .group_members
                    .get(&g.id)
                    .is_some_and(|members| members.contains(&user_id))
            })
            .cloned()
            .collect();
        groups.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(groups)
    }

    async fn is_member(&self, group_id: i64, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .lock()
            .group_members
            .get(&group_id)
            .is_some_and(|members| members.contains(&user_id)))
    }
}

#[async_trait]
impl GroupMessageStore for MemoryStore {
    async fn create_group_message(
        &self,
        group_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<GroupMessage, StoreError> {
        let mut inner = self.lock();
        if !inner.groups.contains_key(&group_id) {
            return Err(StoreError::NotFound("group"));
        }
        let id = inner.next_id();
        let message = GroupMessage {
            id,
            group_id,
            sender_id,
            content: content.to_string(),
            lifecycle: Lifecycle::Active,
            created_at: Utc::now(),
        };
        inner.group_messages.insert(id, message.clone());
        Ok(message)
    }

    async fn group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, StoreError> {
        let inner = self.lock();
        let mut messages: Vec<GroupMessage> = inner
            .group_messages
            .values()
            .filter(|m| m.group_id == group_id && m.lifecycle == Lifecycle::Active)
            .cloned()
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn get_group_message(&self, message_id: i64) -> Result<Option<GroupMessage>, StoreError> {
        Ok(self.lock().group_messages.get(&message_id).cloned())
    }

    async fn delete_group_message_for_all(
        &self,
        message_id: i64,
        sender_id: UserId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        match inner.group_messages.get_mut(&message_id) {
            Some(message) if message.sender_id == sender_id => {
                message.lifecycle = Lifecycle::DeletedForAll;
                Ok(())
            }
            _ => Err(StoreError::NotFound("message")),
        }
    }
}
