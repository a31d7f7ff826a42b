use thiserror::Error;

use crate::profile::Stage;

/// Number-string conversion got non-numeric residual text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a numeric string: {0:?}")]
pub struct ParseError(pub String);

/// An operation was called out of order on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("profile is at stage {actual:?}, operation requires {required:?}")]
pub struct StateError {
    pub required: Stage,
    pub actual: Stage,
}

/// Transient fetch failure: transport error or unexpected status.
/// Rate limiting is not an error; see `fetch::FetchOutcome`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
}
