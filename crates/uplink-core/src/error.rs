//! Gateway error taxonomy.
//!
//! Every failure in the request pipeline is represented here. The gateway
//! converts any of these into a 400 response whose body is the error's
//! `Display` text, so the messages are written for the caller.

use thiserror::Error;

/// Errors from fetching satellite source text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("error fetching satellite: {0}")]
    Network(String),

    #[error("error reading satellite size (Content-Length header): {0}")]
    MissingLength(String),

    #[error("satellite too large: max {limit}, got {size}")]
    TooLarge { limit: usize, size: usize },

    #[error("http error {status} fetching satellite: {body}")]
    UpstreamStatus { status: u16, body: String },
}

/// Errors that can occur while handling a gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no X-Satellite-Location header found")]
    MissingLocationHeader,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("error compiling satellite: {0}")]
    Compile(String),

    #[error("error running satellite: {0}")]
    Runtime(String),

    #[error("error decoding satellite result: {0}")]
    Decode(String),

    #[error("error in satellite result: invalid status code: {0}")]
    InvalidStatus(i64),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
