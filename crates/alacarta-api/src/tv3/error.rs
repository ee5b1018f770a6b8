//! Error taxonomy for the TV3 web service client.

use thiserror::Error;

/// Errors returned by the TV3 client and the searches built on it.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum AlacartaError {
    /// The HTTP layer failed (non-2xx status, connect or body read failure).
    #[error("connection error: {0}")]
    Connection(String),

    /// The service answered with its plaintext "no results" sentinel.
    #[error("no results found")]
    NoResultsFound,

    /// Any other failure (malformed XML, cache I/O, missing fields).
    #[error("service error: {0}")]
    Service(String),

    /// Program searches only accept the letters `A`-`Z`.
    #[error("invalid letter {0:?} in program search")]
    InvalidLetter(String),

    /// A video's air date is missing or not `DD/MM/YYYY`.
    #[error("invalid air date {value:?}: {reason}")]
    InvalidDate {
        /// Raw field text (empty when the field is absent).
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl AlacartaError {
    /// Wraps any displayable error as a `Service` error.
    pub(crate) fn service(err: impl std::fmt::Display) -> Self {
        Self::Service(err.to_string())
    }
}

/// Result alias for this module.
pub type Result<T> = std::result::Result<T, AlacartaError>;
