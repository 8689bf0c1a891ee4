/**
 * Application State Management
 *
 * The `AppState` struct is the central state container handed to the
 * router. Every collaborator sits behind an `Arc` or is cheap to clone.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers and middleware extract just
 * the part they need (`State<SessionManager>`, `State<Arc<dyn AuthAuthority>>`)
 * instead of the whole `AppState`.
 */

use std::sync::Arc;

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::backend::auth::directory::UserDirectory;
use crate::backend::auth::sessions::AuthAuthority;
use crate::backend::messaging::coordinator::EventCoordinator;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::session::SessionManager;
use crate::backend::store::Store;
use crate::backend::telemetry::audit::AuditEmitter;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn AuthAuthority>,
    pub directory: Arc<dyn UserDirectory>,
    pub registry: Arc<ConnectionRegistry>,
    pub coordinator: EventCoordinator,
    pub sessions: SessionManager,
    pub audit: AuditEmitter,
    pub metrics: PrometheusHandle,
}

impl FromRef<AppState> for Arc<dyn AuthAuthority> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for EventCoordinator {
    fn from_ref(state: &AppState) -> Self {
        state.coordinator.clone()
    }
}

impl FromRef<AppState> for PrometheusHandle {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
