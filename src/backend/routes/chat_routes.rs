/**
 * Chat Routes
 *
 * - `GET /chats` - visible chats with friend usernames
 * - `POST /chats/start` - create or reopen a chat with a friend
 * - `DELETE /chats/{chat_id}/me` - hide a chat for the caller
 * - `GET /chats/{chat_id}/messages` - messages visible to the caller
 * - `POST /chats/{chat_id}/messages` - send a message
 * - `DELETE /chats/{chat_id}/messages/{message_id}/me` - hide a message for the caller
 * - `DELETE /chats/{chat_id}/messages/{message_id}/all` - delete a message for everyone
 */

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::backend::chat::handlers::{
    delete_chat_for_me, delete_message_for_all, delete_message_for_me, get_chat_messages,
    list_chats, post_chat_message, start_chat,
};
use crate::backend::server::state::AppState;

/// Configure chat routes
///
/// All of them require authentication; the caller applies the auth layer.
pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/chats", get(list_chats))
        .route("/chats/start", post(start_chat))
        .route("/chats/{chat_id}/me", delete(delete_chat_for_me))
        .route(
            "/chats/{chat_id}/messages",
            get(get_chat_messages).post(post_chat_message),
        )
        .route(
            "/chats/{chat_id}/messages/{message_id}/me",
            delete(delete_message_for_me),
        )
        .route(
            "/chats/{chat_id}/messages/{message_id}/all",
            delete(delete_message_for_all),
        )
}
