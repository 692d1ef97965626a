//! Test helpers for tallyflow-service integration tests.
//!
//! `TestApp` runs the real router on a random port; `FakeTally` stands in for
//! a Tally XML server and records what it was sent.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use chrono::{Days, Local, NaiveDate};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tallyflow_service::config::{ReminderConfig, TallyConfig, TallyFlowConfig};
use tallyflow_service::services::init_metrics;
use tallyflow_service::startup::Application;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestApp::config()).await
    }

    pub fn config() -> TallyFlowConfig {
        TallyFlowConfig {
            common: CoreConfig {
                port: 0,
                log_level: "warn".to_string(),
                otlp_endpoint: None,
            },
            tally: TallyConfig {
                sync_timeout_secs: 5,
                probe_timeout_secs: 2,
                ..TallyConfig::default()
            },
            reminders: ReminderConfig::default(),
        }
    }

    pub async fn spawn_with(config: TallyFlowConfig) -> Self {
        // Another test may have installed the recorder first.
        let _ = init_metrics();

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = test_client();
        for _ in 0..50 {
            if client.get(format!("{}/health", address)).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Local test traffic must not go through an environment proxy.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client")
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct FakeTallyState {
    status: StatusCode,
    reply: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Minimal Tally XML server: answers every export POST with a canned body.
pub struct FakeTally {
    pub port: u16,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeTally {
    pub async fn replying(reply: impl Into<String>) -> Self {
        Self::start(StatusCode::OK, reply.into()).await
    }

    pub async fn failing(status: StatusCode) -> Self {
        Self::start(status, "Internal error".to_string()).await
    }

    async fn start(status: StatusCode, reply: String) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = FakeTallyState {
            status,
            reply,
            captured: captured.clone(),
        };

        let router = Router::new()
            .route("/", get(reachability).post(export))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Tally listener");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        FakeTally { port, captured }
    }

    /// Connection body for the sync and test-connection endpoints.
    pub fn connection(&self) -> serde_json::Value {
        serde_json::json!({ "server": "127.0.0.1", "port": self.port.to_string() })
    }

    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }
}

async fn reachability(State(state): State<FakeTallyState>) -> (StatusCode, &'static str) {
    if state.status.is_success() {
        (StatusCode::OK, "<RESPONSE>TallyPrime Server is Running</RESPONSE>")
    } else {
        (state.status, "")
    }
}

async fn export(
    State(state): State<FakeTallyState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.captured.lock().await.push(CapturedRequest {
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (state.status, state.reply.clone())
}

/// A port nothing is listening on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind unused-port listener");
    listener.local_addr().unwrap().port()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn days_ago(days: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(days)).unwrap()
}

pub fn tally_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn voucher(date: &str, number: &str, period: &str, amount: &str) -> String {
    format!(
        "<VOUCHER REMOTEID=\"{number}\" VCHTYPE=\"Sales\" ACTION=\"Create\">\
           <DATE>{date}</DATE>\
           <VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>\
           <VOUCHERNUMBER>{number}</VOUCHERNUMBER>\
           <BASICBUYERNAME>Acme Traders</BASICBUYERNAME>\
           <BUYEREMAIL>accounts@acme.test</BUYEREMAIL>\
           <BUYERPHONE>+919876543210</BUYERPHONE>\
           <ALLLEDGERENTRIES.LIST>\
             <LEDGERNAME>Acme Traders</LEDGERNAME>\
             <AMOUNT>{amount}</AMOUNT>\
             <BILLALLOCATIONS.LIST>\
               <NAME>{number}</NAME>\
               <BILLCREDITPERIOD>{period}</BILLCREDITPERIOD>\
             </BILLALLOCATIONS.LIST>\
           </ALLLEDGERENTRIES.LIST>\
           <ALLLEDGERENTRIES.LIST>\
             <LEDGERNAME>Sales</LEDGERNAME>\
             <AMOUNT>{amount}</AMOUNT>\
           </ALLLEDGERENTRIES.LIST>\
         </VOUCHER>"
    )
}

pub fn export_envelope(vouchers: &[String]) -> String {
    let messages: String = vouchers
        .iter()
        .map(|v| format!("<TALLYMESSAGE xmlns:UDF=\"TallyUDF\">{}</TALLYMESSAGE>", v))
        .collect();

    format!(
        "<ENVELOPE>\
           <HEADER><TALLYREQUEST>Export Data</TALLYREQUEST></HEADER>\
           <BODY><EXPORTDATA><REQUESTDESC><REPORTNAME>Voucher Register</REPORTNAME></REQUESTDESC></EXPORTDATA>\
           <DATA>{messages}</DATA></BODY>\
         </ENVELOPE>"
    )
}
