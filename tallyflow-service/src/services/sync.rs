//! Fetch, parse and derive in one call, reported in the envelope the dashboard expects.

use super::metrics::record_sync;
use super::settings::SettingsStore;
use crate::models::Invoice;
use crate::tally::{derive, parse_payload, TallyClient, TallyConnection, TallyError, TallyPayload};
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Invoice>>,
}

impl SyncOutcome {
    pub fn synced(invoices: Vec<Invoice>) -> Self {
        Self {
            success: true,
            message: format!("Synced {} invoices successfully.", invoices.len()),
            count: Some(invoices.len()),
            data: Some(invoices),
        }
    }

    pub fn failed(err: &TallyError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            count: None,
            data: None,
        }
    }
}

#[derive(Clone)]
pub struct SyncOrchestrator {
    client: TallyClient,
    settings: Arc<dyn SettingsStore>,
}

impl SyncOrchestrator {
    pub fn new(client: TallyClient, settings: Arc<dyn SettingsStore>) -> Self {
        Self { client, settings }
    }

    /// Full sync against `connection`, aged relative to the local calendar date.
    #[tracing::instrument(skip(self, connection), fields(address = %connection.address()))]
    pub async fn sync(&self, connection: &TallyConnection) -> SyncOutcome {
        let today = Local::now().date_naive();

        match self.fetch_invoices(connection, today).await {
            Ok(invoices) => {
                tracing::info!(count = invoices.len(), "Tally sync completed");
                record_sync("success", invoices.len());
                self.record_last_sync().await;
                SyncOutcome::synced(invoices)
            }
            Err(err) => {
                tracing::error!(kind = err.kind(), detail = err.detail(), "Tally sync failed");
                record_sync(err.kind(), 0);
                SyncOutcome::failed(&err)
            }
        }
    }

    /// Fetch, parse and derive. A `<NORSPS>` reply is an empty result.
    pub async fn fetch_invoices(
        &self,
        connection: &TallyConnection,
        today: NaiveDate,
    ) -> Result<Vec<Invoice>, TallyError> {
        let raw = self.client.fetch_export_xml(connection).await?;

        match parse_payload(&raw)? {
            TallyPayload::NoResponse => {
                tracing::info!("Tally answered with no response marker");
                Ok(Vec::new())
            }
            TallyPayload::Document(document) => Ok(derive(&document, today)),
        }
    }

    pub async fn test_connection(&self, connection: &TallyConnection) -> Result<(), TallyError> {
        self.client.test_connection(connection).await
    }

    async fn record_last_sync(&self) {
        let patch = json!({ "tally": { "lastSync": Utc::now() } });
        if let Err(err) = self.settings.save(&patch).await {
            tracing::warn!(error = %err, "Failed to record last sync time");
        }
    }
}
