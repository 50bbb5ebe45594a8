use thiserror::Error;

/// Transport and decode failures from indexing API implementations.
///
/// User-facing conditions (invalid input, a name that does not resolve)
/// are not errors; they surface as [`crate::resolver::Outcome`] values
/// and [`crate::resolver::Notice`] events instead.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("decode error: {0}")]
    Decode(String),
}
