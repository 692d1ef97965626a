//! TallyFlow service entry point.

use service_core::observability::init_tracing;
use tallyflow_service::config::{TallyFlowConfig, SERVICE_NAME};
use tallyflow_service::services::init_metrics;
use tallyflow_service::startup::Application;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = TallyFlowConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        SERVICE_NAME,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.common.port,
        tally_server = %config.tally.server,
        tally_port = %config.tally.port,
        sync_timeout_secs = config.tally.sync_timeout_secs,
        reminders_enabled = config.reminders.enabled,
        "Starting tallyflow-service"
    );

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed; /metrics will be empty");
    }

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    app.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
