//! Application wiring and server lifecycle.

use crate::config::{TallyFlowConfig, SERVICE_NAME};
use crate::handlers::{health_check, metrics_handler, reminders, settings, tally};
use crate::models::AppSettings;
use crate::services::{
    InMemorySettingsStore, ReminderSender, SettingsStore, SimulatedReminderSender, SyncOrchestrator,
};
use crate::tally::TallyClient;
use axum::{
    extract::Request,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, RequestId,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: TallyFlowConfig,
    pub sync: SyncOrchestrator,
    pub settings: Arc<dyn SettingsStore>,
    pub reminders: Arc<dyn ReminderSender>,
}

impl AppState {
    pub fn new(config: TallyFlowConfig) -> Result<Self, AppError> {
        let client = TallyClient::new(config.tally.sync_timeout(), config.tally.probe_timeout())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to build Tally HTTP client");
                AppError::InternalError(anyhow::Error::new(e))
            })?;

        let settings: Arc<dyn SettingsStore> = Arc::new(InMemorySettingsStore::new(
            AppSettings::new(config.tally.initial_settings()),
        ));
        let reminders: Arc<dyn ReminderSender> =
            Arc::new(SimulatedReminderSender::new(config.reminders.enabled));

        Ok(Self {
            sync: SyncOrchestrator::new(client, settings.clone()),
            config,
            settings,
            reminders,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/tally/sync", post(tally::sync))
        .route("/api/tally/test-connection", post(tally::test_connection))
        .route("/api/tally/test", post(tally::test_connection))
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::update_settings),
        )
        .route("/api/reminders/send", post(reminders::send_reminder))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: TallyFlowConfig) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(config)?;

        tracing::info!(
            port = port,
            tally_server = %state.config.tally.server,
            tally_port = %state.config.tally.port,
            "TallyFlow listener bound"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves, letting in-flight requests finish.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        tracing::info!(
            service = SERVICE_NAME,
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
