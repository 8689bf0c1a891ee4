/**
 * Group Routes
 *
 * - `POST /groups`, `GET /groups`
 * - `GET /groups/{group_id}/messages`, `POST /groups/{group_id}/messages`
 * - `DELETE /groups/{group_id}/messages/{message_id}/all`
 */

use axum::{
    routing::{delete, get},
    Router,
};

use crate::backend::groups::handlers::{
    create_group, delete_group_message_for_all, get_group_messages, list_groups,
    post_group_message,
};
use crate::backend::server::state::AppState;

/// Configure group routes. All of them require authentication.
pub fn configure_group_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/groups", get(list_groups).post(create_group))
        .route(
            "/groups/{group_id}/messages",
            get(get_group_messages).post(post_group_message),
        )
        .route(
            "/groups/{group_id}/messages/{message_id}/all",
            delete(delete_group_message_for_all),
        )
}
