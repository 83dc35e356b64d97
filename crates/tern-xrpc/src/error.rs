//! Mapping of HTTP client failures onto the tern error type.

use tern_core::error::{Error, ProtocolError, TransportError};

/// Classifies a `reqwest` failure as a timeout, a connection failure or a
/// generic HTTP error.
pub(crate) fn transport(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}

/// A protocol error carrying only the HTTP status.
pub(crate) fn status(status: reqwest::StatusCode) -> Error {
    Error::Protocol(ProtocolError::new(status.as_u16(), None, None))
}
