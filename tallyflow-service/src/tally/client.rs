use super::{TallyConnection, TallyError};
use quick_xml::escape::escape;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;

/// Voucher Register export window requested from Tally.
const EXPORT_FROM_DATE: &str = "20230401";
const EXPORT_TO_DATE: &str = "20250331";

/// HTTP client for the Tally XML server.
#[derive(Clone)]
pub struct TallyClient {
    client: Client,
    sync_timeout: Duration,
    probe_timeout: Duration,
}

impl TallyClient {
    pub fn new(sync_timeout: Duration, probe_timeout: Duration) -> Result<Self, reqwest::Error> {
        // Tally listens on the LAN; never route it through an environment proxy.
        let client = Client::builder().no_proxy().build()?;

        Ok(Self {
            client,
            sync_timeout,
            probe_timeout,
        })
    }

    /// Post the Voucher Register export request and return the raw XML body.
    #[tracing::instrument(skip(self, connection), fields(address = %connection.address()))]
    pub async fn fetch_export_xml(&self, connection: &TallyConnection) -> Result<String, TallyError> {
        let body = export_request_body(connection.company());

        let response = self
            .client
            .post(connection.url())
            .header(CONTENT_TYPE, "text/xml")
            .timeout(self.sync_timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| classify(connection, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TallyError::communication(format!(
                "Tally responded with HTTP {}",
                status
            )));
        }

        let xml = response.text().await.map_err(|e| classify(connection, e))?;
        tracing::debug!(bytes = xml.len(), "Received Tally export");

        Ok(xml)
    }

    /// Lightweight reachability probe: a plain GET that must answer 2xx.
    #[tracing::instrument(skip(self, connection), fields(address = %connection.address()))]
    pub async fn test_connection(&self, connection: &TallyConnection) -> Result<(), TallyError> {
        let response = self
            .client
            .get(connection.url())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| classify(connection, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TallyError::communication(format!(
                "Tally probe answered HTTP {}",
                response.status()
            )))
        }
    }
}

/// Build the export request. `SVCOMPANY` is only sent when a company is named.
pub fn export_request_body(company: Option<&str>) -> String {
    let company_tag = company
        .map(|c| format!("<SVCOMPANY>{}</SVCOMPANY>", escape(c)))
        .unwrap_or_default();

    format!(
        "<ENVELOPE><HEADER><TALLYREQUEST>Export Data</TALLYREQUEST></HEADER>\
         <BODY><EXPORTDATA><REQUESTDESC><REPORTNAME>Voucher Register</REPORTNAME>\
         <STATICVARIABLES><SVEXPORTFORMAT>$$SysName:XML</SVEXPORTFORMAT>\
         <SVFROMDATE>{from}</SVFROMDATE><SVTODATE>{to}</SVTODATE>\
         <VOUCHERTYPENAME>Sales</VOUCHERTYPENAME>{company_tag}\
         </STATICVARIABLES></REQUESTDESC></EXPORTDATA></BODY></ENVELOPE>",
        from = EXPORT_FROM_DATE,
        to = EXPORT_TO_DATE,
        company_tag = company_tag,
    )
}

fn classify(connection: &TallyConnection, err: reqwest::Error) -> TallyError {
    if is_connection_refused(&err) {
        TallyError::Connection {
            address: connection.address(),
        }
    } else if err.is_timeout() {
        TallyError::communication(format!("request timed out: {}", err))
    } else {
        TallyError::communication(err.to_string())
    }
}

/// reqwest wraps the socket error several layers deep; walk the source chain.
fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = current.source();
    }
    false
}
