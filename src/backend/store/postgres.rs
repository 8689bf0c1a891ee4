//! PostgreSQL-backed store
//!
//! Queries use plain `sqlx::query` with `Row::get`, mapped by hand into the
//! shared models.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::backend::store::{
    ChatStore, GroupMessageStore, GroupStore, MessageStore, StoreError,
};
use crate::shared::models::{
    canonical_pair, Chat, ChatSummary, Group, GroupMessage, Lifecycle, Message, Side, UserId,
    VisibilityFlags,
};

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, content, deleted_by_sender, \
     deleted_by_receiver, deleted_for_all, created_at";

const GROUP_MESSAGE_COLUMNS: &str = "id, group_id, sender_id, content, deleted_for_all, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}

fn chat_from_row(row: &PgRow) -> Chat {
    Chat {
        id: row.get("id"),
        user1_id: row.get("user1_id"),
        user2_id: row.get("user2_id"),
        created_at: row.get("created_at"),
    }
}

fn message_from_row(row: &PgRow) -> Message {
    let flags = VisibilityFlags {
        deleted_by_sender: row.get("deleted_by_sender"),
        deleted_by_receiver: row.get("deleted_by_receiver"),
        deleted_for_all: row.get("deleted_for_all"),
    };
    Message {
        id: row.get("id"),
        chat_id: row.get("chat_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        visibility: flags.into(),
        created_at: row.get("created_at"),
    }
}

fn group_from_row(row: &PgRow) -> Group {
    Group {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}

fn group_message_from_row(row: &PgRow) -> GroupMessage {
    GroupMessage {
        id: row.get("id"),
        group_id: row.get("group_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        lifecycle: Lifecycle::from(row.get::<bool, _>("deleted_for_all")),
        created_at: row.get("created_at"),
    }
}

async fn set_chat_hidden(
    pool: &PgPool,
    chat_id: i64,
    user_id: UserId,
    hidden: bool,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO chat_visibility (chat_id, user_id, hidden)
        VALUES ($1, $2, $3)
        ON CONFLICT (chat_id, user_id) DO UPDATE SET hidden = EXCLUDED.hidden
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .bind(hidden)
    .execute(pool)
    .await?;
    Ok(())
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_or_get_chat(&self, a: UserId, b: UserId) -> Result<Chat, StoreError> {
        if a == b {
            return Err(StoreError::Invalid("cannot create chat with self".to_string()));
        }
        let (user1, user2) = canonical_pair(a, b);

        // Concurrent starters race on the unique pair; the loser inserts nothing.
        sqlx::query(
            r#"
            INSERT INTO chats (user1_id, user2_id)
            VALUES ($1, $2)
            ON CONFLICT (user1_id, user2_id) DO NOTHING
            "#,
        )
        .bind(user1)
        .bind(user2)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, user1_id, user2_id, created_at FROM chats WHERE user1_id = $1 AND user2_id = $2",
        )
        .bind(user1)
        .bind(user2)
        .fetch_one(&self.pool)
        .await?;
        let chat = chat_from_row(&row);

        set_chat_hidden(&self.pool, chat.id, a, false).await?;
        set_chat_hidden(&self.pool, chat.id, b, false).await?;

        tracing::debug!("[Store] chat {} ready for users {} and {}", chat.id, user1, user2);
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, StoreError> {
        let row = sqlx::query("SELECT id, user1_id, user2_id, created_at FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(chat_from_row))
    }

    async fn is_participant(&self, chat_id: i64, user_id: UserId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM chats WHERE id = $1 AND (user1_id = $2 OR user2_id = $2))",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_chats(&self, user_id: UserId) -> Result<Vec<ChatSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.user1_id, c.user2_id, c.created_at
            FROM chats c
            LEFT JOIN chat_visibility cv ON cv.chat_id = c.id AND cv.user_id = $1
            WHERE (c.user1_id = $1 OR c.user2_id = $1)
              AND COALESCE(cv.hidden, FALSE) = FALSE
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(chat_from_row)
            .map(|chat| ChatSummary {
                chat_id: chat.id,
                friend_id: chat.other_participant(user_id),
                friend_username: None,
                created_at: chat.created_at,
            })
            .collect())
    }

    async fn hide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError> {
        set_chat_hidden(&self.pool, chat_id, user_id, true).await
    }

    async fn unhide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError> {
        set_chat_hidden(&self.pool, chat_id, user_id, false).await
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn create_chat_message(
        &self,
        chat_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<Message, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO messages (chat_id, sender_id, content) VALUES ($1, $2, $3) RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(message_from_row(&row))
    }

    async fn chat_messages_for_user(
        &self,
        chat_id: i64,
        viewer: UserId,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM messages
            WHERE chat_id = $1
              AND deleted_for_all = FALSE
              AND NOT (sender_id = $2 AND deleted_by_sender)
              AND NOT (sender_id <> $2 AND deleted_by_receiver)
            ORDER BY created_at ASC, id ASC
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(chat_id)
        .bind(viewer)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(message_from_row).collect())
    }

    async fn get_message(&self, message_id: i64) -> Result<Option<Message>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS))
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(message_from_row))
    }

    async fn soft_delete_for_user(&self, message_id: i64, side: Side) -> Result<(), StoreError> {
        let query = match side {
            Side::Sender => "UPDATE messages SET deleted_by_sender = TRUE WHERE id = $1",
            Side::Receiver => "UPDATE messages SET deleted_by_receiver = TRUE WHERE id = $1",
        };
        let result = sqlx::query(query).bind(message_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("message"));
        }
        Ok(())
    }

    async fn delete_for_all(&self, message_id: i64, sender_id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE messages SET deleted_for_all = TRUE WHERE id = $1 AND sender_id = $2",
        )
        .bind(message_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("message"));
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for PgStore {
    async fn create_group(
        &self,
        owner_id: UserId,
        name: &str,
        member_ids: &[UserId],
    ) -> Result<Group, StoreError> {
        let mut members: BTreeSet<UserId> = member_ids.iter().copied().collect();
        members.insert(owner_id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO groups (name, owner_id) VALUES ($1, $2) RETURNING id, name, owner_id, created_at",
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;
        let group = group_from_row(&row);

        for member in &members {
            sqlx::query(
                "INSERT INTO group_members (group_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(group.id)
            .bind(*member)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("[Store] group {} created with {} members", group.id, members.len());
        Ok(group)
    }

    async fn list_groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT g.id, g.name, g.owner_id, g.created_at
            FROM groups g
            JOIN group_members gm ON gm.group_id = g.id
            WHERE gm.user_id = $1
            ORDER BY g.created_at DESC, g.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(group_from_row).collect())
    }

    async fn is_member(&self, group_id: i64, user_id: UserId) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[async_trait]
impl GroupMessageStore for PgStore {
    async fn create_group_message(
        &self,
        group_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<GroupMessage, StoreError> {
        let row = sqlx::query(&format!(
            "INSERT INTO group_messages (group_id, sender_id, content) VALUES ($1, $2, $3) RETURNING {}",
            GROUP_MESSAGE_COLUMNS
        ))
        .bind(group_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;
        Ok(group_message_from_row(&row))
    }

    async fn group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM group_messages
            WHERE group_id = $1 AND deleted_for_all = FALSE
            ORDER BY created_at ASC, id ASC
            "#,
            GROUP_MESSAGE_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(group_message_from_row).collect())
    }

    async fn get_group_message(&self, message_id: i64) -> Result<Option<GroupMessage>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM group_messages WHERE id = $1",
            GROUP_MESSAGE_COLUMNS
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(group_message_from_row))
    }

    async fn delete_group_message_for_all(
        &self,
        message_id: i64,
        sender_id: UserId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE group_messages SET deleted_for_all = TRUE WHERE id = $1 AND sender_id = $2",
        )
        .bind(message_id)
        .bind(sender_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("message"));
        }
        Ok(())
    }
}
