/**
 * Server Initialization
 *
 * Wires the collaborators into an `AppState` and builds the router.
 *
 * # Initialization Process
 *
 * 1. Connect to PostgreSQL and run migrations
 * 2. Build the token authority and the user directory client
 * 3. Install the Prometheus recorder and start its upkeep task
 * 4. Create the connection registry, broadcaster and telemetry sink
 * 5. Assemble the session manager and event coordinator
 * 6. Create the router
 *
 * `build_state` takes the collaborators directly so tests can run the
 * whole router on `MemoryStore` and an in-memory sink. The recorder is
 * process-wide, so callers install it once and pass the handle in.
 */

use std::sync::Arc;

use axum::Router;
use metrics_exporter_prometheus::{BuildError, PrometheusHandle};
use thiserror::Error;

use crate::backend::auth::directory::{DirectoryError, HttpUserDirectory, UserDirectory};
use crate::backend::auth::sessions::{AuthAuthority, JwtAuthority};
use crate::backend::messaging::coordinator::EventCoordinator;
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::realtime::session::SessionManager;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ConfigError, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::Store;
use crate::backend::telemetry::audit::AuditEmitter;
use crate::backend::telemetry::metrics;
use crate::backend::telemetry::sink::{EventSink, TracingSink};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("user directory client: {0}")]
    Directory(#[from] DirectoryError),

    #[error("metrics recorder: {0}")]
    Metrics(#[from] BuildError),
}

/// Assemble application state from its collaborators
pub fn build_state(
    config: &ServerConfig,
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthAuthority>,
    directory: Arc<dyn UserDirectory>,
    telemetry: Arc<dyn EventSink>,
    metrics: PrometheusHandle,
) -> AppState {
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone(), telemetry.clone(), config.ws_write_timeout);
    let audit = AuditEmitter::new(
        telemetry.clone(),
        config.service_name.clone(),
        config.environment.clone(),
    );
    let coordinator = EventCoordinator::new(store.clone(), broadcaster, audit.clone());
    let sessions = SessionManager::new(store.clone(), auth.clone(), registry.clone(), telemetry);

    AppState {
        store,
        auth,
        directory,
        registry,
        coordinator,
        sessions,
        audit,
        metrics,
    }
}

/// Create and configure the Axum application
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, StartupError> {
    tracing::info!(
        "Initializing {} ({})",
        config.service_name,
        config.environment
    );

    let store = load_database(config).await?;

    let recorder = metrics::install_recorder()?;
    let upkeep = recorder.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(metrics::UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    let auth = JwtAuthority::new(&config.jwt_secret);
    let directory = HttpUserDirectory::new(config.user_service_url.clone())?;

    let state = build_state(
        config,
        Arc::new(store),
        Arc::new(auth),
        Arc::new(directory),
        Arc::new(TracingSink),
        recorder,
    );

    tracing::info!("Router configured");
    Ok(create_router(state))
}
