//! Error types for the console client.

use std::io;

/// Failures of a single request/response exchange.
///
/// The console widget never shows these to the user directly: any of them
/// turns into the same generic error line in the transcript.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("server returned status {code}")]
    Status {
        /// The HTTP status code.
        code: u16,
    },

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response body could not be read as text.
    #[error("reading response body: {0}")]
    Body(#[source] io::Error),
}

/// Errors surfaced by the non-console operations (nav, version, config).
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;
