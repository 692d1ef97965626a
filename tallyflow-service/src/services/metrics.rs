//! Prometheus metrics for tallyflow-service.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), BuildError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);

    metrics::describe_counter!("tally_sync_total", "Tally sync attempts by outcome");
    metrics::describe_counter!(
        "tally_invoices_synced_total",
        "Invoices derived from successful Tally syncs"
    );
    Ok(())
}

/// Metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// `outcome` is `success` or the failing error kind.
pub fn record_sync(outcome: &'static str, invoices: usize) {
    metrics::counter!("tally_sync_total", "outcome" => outcome).increment(1);
    if invoices > 0 {
        metrics::counter!("tally_invoices_synced_total").increment(invoices as u64);
    }
}
