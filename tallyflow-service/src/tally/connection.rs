use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Remote Tally endpoint, supplied with every sync or probe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TallyConnection {
    #[validate(length(min = 1, message = "Tally server host is required"))]
    pub server: String,
    #[serde(deserialize_with = "string_or_number")]
    #[validate(length(min = 1, message = "Tally port is required"))]
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl TallyConnection {
    pub fn new(server: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: port.into(),
            company: None,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// `http://host:port`, as shown to users in connection errors.
    pub fn address(&self) -> String {
        format!("http://{}:{}", self.server.trim(), self.port.trim())
    }

    /// Root URL the export request is posted to.
    pub fn url(&self) -> String {
        format!("{}/", self.address())
    }

    /// Company name, if one was given and is not blank.
    pub fn company(&self) -> Option<&str> {
        self.company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Ports arrive from the UI as either `"9000"` or `9000`.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}
