//! Error taxonomy shared by requests, backends and result views

use crate::types::ResultKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed request (empty query, unknown kind/scope name, bad pattern)
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// No backend variant registered under this name
    #[error("unknown search backend: {0}")]
    UnknownBackend(String),

    /// The external search mechanism could not run or crashed
    #[error("backend `{backend}` failed: {message}")]
    BackendExecution {
        backend: &'static str,
        message: String,
    },

    /// A backend did not provide a required part of the adapter contract
    #[error("backend `{backend}` does not implement `{method}`")]
    NotImplemented {
        backend: &'static str,
        method: &'static str,
    },

    /// Positional information was already discarded for this result
    #[error("cannot derive {to} results from {from} results")]
    UnsupportedConversion { from: ResultKind, to: ResultKind },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub(crate) fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        SearchError::BackendExecution {
            backend,
            message: message.into(),
        }
    }
}
