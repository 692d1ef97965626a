//! Sync and test-connection endpoints against a fake Tally server.

mod common;

use axum::http::StatusCode;
use common::{days_ago, export_envelope, tally_date, unused_port, voucher, FakeTally, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn sync_returns_aged_invoices_in_source_order() {
    let overdue_date = tally_date(days_ago(20));
    let pending_date = tally_date(days_ago(1));
    let tally = FakeTally::replying(export_envelope(&[
        voucher(&overdue_date, "INV-1", "15 Days", "-1180.00"),
        voucher(&pending_date, "INV-2", "30 Days", "-250.50"),
    ]))
    .await;
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/tally/sync", &tally.connection()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Synced 2 invoices successfully.");
    assert_eq!(body["count"], 2);

    let invoices = body["data"].as_array().unwrap();
    assert_eq!(invoices[0]["invoiceNo"], "INV-1");
    assert_eq!(invoices[0]["invoiceDate"], overdue_date.as_str());
    assert_eq!(invoices[0]["customerName"], "Acme Traders");
    assert_eq!(invoices[0]["customerContact"]["email"], "accounts@acme.test");
    assert_eq!(invoices[0]["amount"], 1180.0);
    assert_eq!(invoices[0]["outstanding"], 1180.0);
    assert_eq!(invoices[0]["status"], "Overdue");
    assert_eq!(invoices[0]["daysOverdue"], 5);
    assert_eq!(
        invoices[0]["sourceKey"],
        format!("{}/INV-1", overdue_date).as_str()
    );

    assert_eq!(invoices[1]["invoiceNo"], "INV-2");
    assert_eq!(invoices[1]["status"], "Pending");
    assert_eq!(invoices[1]["daysOverdue"], 0);
    assert_eq!(invoices[1]["amount"], 250.5);
}

#[tokio::test]
async fn sync_posts_voucher_register_request_as_xml() {
    let tally = FakeTally::replying(export_envelope(&[])).await;
    let app = TestApp::spawn().await;
    let mut connection = tally.connection();
    connection["company"] = json!("Acme & Sons");

    let response = app.post_json("/api/tally/sync", &connection).await;
    assert_eq!(response.status().as_u16(), 200);

    let requests = tally.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("text/xml"));
    assert!(requests[0]
        .body
        .contains("<REPORTNAME>Voucher Register</REPORTNAME>"));
    assert!(requests[0]
        .body
        .contains("<SVCOMPANY>Acme &amp; Sons</SVCOMPANY>"));
}

#[tokio::test]
async fn no_response_marker_is_an_empty_success() {
    let tally = FakeTally::replying("<ENVELOPE><NORSPS>1</NORSPS></ENVELOPE>").await;
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/tally/sync", &tally.connection()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["message"], "Synced 0 invoices successfully.");
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn vouchers_without_number_are_dropped() {
    let date = tally_date(days_ago(3));
    let broken = voucher(&date, "INV-9", "0", "-10").replace(
        "<VOUCHERNUMBER>INV-9</VOUCHERNUMBER>",
        "",
    );
    let tally = FakeTally::replying(export_envelope(&[
        broken,
        voucher(&date, "INV-10", "0", "-10"),
    ]))
    .await;
    let app = TestApp::spawn().await;

    let body: Value = app
        .post_json("/api/tally/sync", &tally.connection())
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["invoiceNo"], "INV-10");
}

#[tokio::test]
async fn refused_connection_names_the_address() {
    let port = unused_port().await;
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/tally/sync", &json!({ "server": "127.0.0.1", "port": port }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        format!(
            "Connection failed. Ensure Tally is running and listening on http://127.0.0.1:{}.",
            port
        )
        .as_str()
    );
    assert_ne!(body["message"], "Failed to communicate with Tally server.");
    assert!(body.get("data").is_none());
    assert!(body.get("count").is_none());
}

#[tokio::test]
async fn tally_http_error_is_a_communication_failure() {
    let tally = FakeTally::failing(StatusCode::INTERNAL_SERVER_ERROR).await;
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/tally/sync", &tally.connection()).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to communicate with Tally server.");
}

#[tokio::test]
async fn unreadable_payload_is_a_parse_failure() {
    let tally = FakeTally::replying("<ENVELOPE><BODY><DATA></BODY>").await;
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/tally/sync", &tally.connection()).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Tally returned a response that could not be read as XML."
    );
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn plain_text_reply_is_a_parse_failure() {
    let tally = FakeTally::replying("Unknown Request, cannot be processed").await;
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/tally/sync", &tally.connection()).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Tally returned a response that could not be read as XML."
    );
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn sync_body_missing_port_gets_failure_envelope() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/tally/sync", &json!({ "server": "127.0.0.1" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn successful_sync_records_last_sync_time() {
    let tally = FakeTally::replying(export_envelope(&[])).await;
    let app = TestApp::spawn().await;

    let before: Value = app.get("/api/settings").await.json().await.unwrap();
    assert!(before["tally"]["lastSync"].is_null());

    app.post_json("/api/tally/sync", &tally.connection()).await;

    let after: Value = app.get("/api/settings").await.json().await.unwrap();
    assert!(after["tally"]["lastSync"].is_string());
}

#[tokio::test]
async fn failed_sync_leaves_last_sync_unset() {
    let port = unused_port().await;
    let app = TestApp::spawn().await;

    app.post_json("/api/tally/sync", &json!({ "server": "127.0.0.1", "port": port }))
        .await;

    let settings: Value = app.get("/api/settings").await.json().await.unwrap();
    assert!(settings["tally"]["lastSync"].is_null());
}

#[tokio::test]
async fn blank_server_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/tally/sync", &json!({ "server": "", "port": "9000" }))
        .await;

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_connection_succeeds_against_running_tally() {
    let tally = FakeTally::replying(export_envelope(&[])).await;
    let app = TestApp::spawn().await;

    for path in ["/api/tally/test-connection", "/api/tally/test"] {
        let response = app.post_json(path, &tally.connection()).await;

        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Connection to Tally server is successful!");
    }

    assert!(tally.requests().await.is_empty());
}

#[tokio::test]
async fn test_connection_reports_unreachable_tally() {
    let port = unused_port().await;
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/tally/test-connection",
            &json!({ "server": "127.0.0.1", "port": port.to_string() }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Could not reach Tally server.");
}
