use crate::core::fund::FundId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Metrics unavailable for {key}: {reason}")]
    MetricsUnavailable { key: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gateway returned {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("Failed to decode gateway response: {0}")]
    Decode(String),

    #[error("Invalid gateway URL {0}")]
    InvalidUrl(String),

    #[error("Fund {0} is not in the loaded catalog")]
    UnknownFund(FundId),

    #[error("A favorite update for fund {0} is already in flight")]
    MutationInFlight(FundId),
}

impl SyncError {
    /// Whether the presentation layer should send the user back to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, SyncError::Authentication(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}
