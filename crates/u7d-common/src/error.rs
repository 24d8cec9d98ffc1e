//! Unified error type for the gateway.
//!
//! Every failure of the on-demand pipeline funnels into [`Error`], which knows
//! the HTTP status it is reported with via [`Error::http_status`]. The
//! `Display` text is what ends up in the `{"status": ...}` response body.

/// Error type covering all failure modes of a relay request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The catalog could not resolve the request (non-200, timeout, transport
    /// failure or no program id).
    #[error("{0} not found")]
    NotFound(String),

    /// The worker process could not be started or exited inside the
    /// readiness window.
    #[error("NOT AVAILABLE: {0}")]
    WorkerUnavailable(String),

    /// The datagram relay failed before or while streaming.
    #[error("Stream loop excepted: {0}")]
    RelayFault(String),

    /// The request token matches no known pattern.
    #[error("URL not understood")]
    UnrecognizedRequest,

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Map this error to the HTTP status code it is reported with.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::WorkerUnavailable(_) => 404,
            Error::RelayFault(_) => 500,
            Error::UnrecognizedRequest => 404,
            Error::Config(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Error::NotFound(what.to_string())
    }

    /// Convenience constructor for [`Error::WorkerUnavailable`].
    pub fn worker_unavailable(command: impl Into<String>) -> Self {
        Error::WorkerUnavailable(command.into())
    }

    /// Convenience constructor for [`Error::RelayFault`].
    pub fn relay(cause: impl std::fmt::Debug) -> Self {
        Error::RelayFault(format!("{cause:?}"))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
