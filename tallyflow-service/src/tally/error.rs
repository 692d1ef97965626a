use thiserror::Error;

/// Failures of the fetch and parse stages. Display strings are user-facing;
/// the `detail` fields are only logged.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Connection failed. Ensure Tally is running and listening on {address}.")]
    Connection { address: String },

    #[error("Failed to communicate with Tally server.")]
    Communication { detail: String },

    #[error("Tally returned a response that could not be read as XML.")]
    Parse { detail: String },
}

impl TallyError {
    pub fn communication(detail: impl Into<String>) -> Self {
        TallyError::Communication {
            detail: detail.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        TallyError::Parse {
            detail: detail.into(),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TallyError::Connection { .. } => "connection_refused",
            TallyError::Communication { .. } => "communication",
            TallyError::Parse { .. } => "parse",
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            TallyError::Connection { address } => address,
            TallyError::Communication { detail } | TallyError::Parse { detail } => detail,
        }
    }
}
