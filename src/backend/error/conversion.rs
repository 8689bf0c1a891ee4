/**
 * Error Conversion
 *
 * `IntoResponse` for `BackendError` plus the conversions from the
 * collaborator error types (store, directory) and rejected JSON bodies
 * into backend errors.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 400
 * }
 * ```
 */

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::auth::directory::DirectoryError;
use crate::backend::error::types::BackendError;
use crate::backend::store::StoreError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Backend] {} responding {}: {}", status.as_u16(), status, self);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => BackendError::not_found(format!("{} not found", what)),
            StoreError::Invalid(message) => BackendError::bad_request(message),
            StoreError::Database(e) => BackendError::storage(e.to_string()),
        }
    }
}

impl From<DirectoryError> for BackendError {
    fn from(err: DirectoryError) -> Self {
        BackendError::upstream(err.to_string())
    }
}

impl From<JsonRejection> for BackendError {
    fn from(rejection: JsonRejection) -> Self {
        BackendError::bad_request(rejection.body_text())
    }
}
