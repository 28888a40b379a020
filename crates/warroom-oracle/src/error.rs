use thiserror::Error;

/// Failures talking to the text backend. These never reach callers of
/// [`crate::Oracle`]; every capability turns them into its fallback value.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend returned no text")]
    EmptyResponse,

    #[error("generation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("could not parse generated JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OracleError>;
