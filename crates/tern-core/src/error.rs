//! Error types for tern.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, identity, storage and input
//! validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for tern operations.
///
/// Identity and document errors propagate through the resolver and session
/// manager untouched, so callers can match on the exact failure kind.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (missing session, expired tokens, timeouts).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Protocol errors (XRPC errors, unexpected responses).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Identity resolution errors (handles, DID documents, endpoints).
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Durable storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (invalid DID, handle, NSID, URI format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns the identity error, if this is one.
    pub fn as_identity(&self) -> Option<&IdentityError> {
        match self {
            Error::Identity(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the protocol error, if this is one.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Error::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No stored session exists for the identity.
    #[error("no stored session for {did}")]
    SessionNotFound { did: String },

    /// Session has expired and could not be refreshed.
    #[error("session expired")]
    SessionExpired,

    /// Refresh token is missing, invalid or expired.
    #[error("refresh token invalid")]
    RefreshTokenInvalid,

    /// Invalid credentials provided.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The authorization server could not be discovered or used.
    #[error("authorization server unavailable: {reason}")]
    AuthorizationServer { reason: String },

    /// Interactive authorization did not navigate away before the watchdog elapsed.
    #[error("unreachable: interactive authorization did not redirect")]
    AuthorizationTimeout,
}

/// Protocol-level errors from XRPC responses.
///
/// The `error` field carries the XRPC error name (for example `RecordNotFound`
/// or `InvalidSwap`), which callers use to tell expected failures apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// XRPC error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check whether the XRPC error name matches `kind`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.error.as_deref() == Some(kind)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
            || self.is_kind("AuthenticationRequired")
            || self.is_kind("ExpiredToken")
            || self.is_kind("InvalidToken")
    }
}

/// Identity resolution errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Every handle resolution strategy failed.
    #[error("could not resolve handle '{handle}': {}", failures.join("; "))]
    HandleUnresolved {
        handle: String,
        failures: Vec<String>,
    },

    /// More than one `did=` TXT record was published for the handle.
    #[error("ambiguous _atproto TXT records for '{handle}'")]
    AmbiguousDnsRecord { handle: String },

    /// No `did=` TXT record was published for the handle.
    #[error("no _atproto TXT record for '{handle}'")]
    MissingDnsRecord { handle: String },

    /// The well-known document did not contain a DID.
    #[error("invalid well-known atproto-did content")]
    InvalidWellKnown,

    /// The directory reported that the DID does not exist.
    #[error("identity not found: {did}")]
    NotFound { did: String },

    /// The directory answered with an unexpected status.
    #[error("DID directory unreachable (HTTP {status})")]
    DirectoryUnreachable { status: u16 },

    /// The did:web document could not be fetched.
    #[error("DID document unreachable (HTTP {status})")]
    DocumentUnreachable { status: u16 },

    /// The DID's method-specific identifier is malformed.
    #[error("invalid identifier: {did}")]
    InvalidIdentifier { did: String },

    /// The DID method is not supported.
    #[error("unsupported DID method: {method}")]
    UnsupportedMethod { method: String },

    /// The document could not be parsed.
    #[error("malformed DID document: {reason}")]
    MalformedDocument { reason: String },

    /// The document has no usable personal data server endpoint.
    #[error("no hosting endpoint for identity {did}")]
    NoHostingEndpoint { did: String },
}

/// Durable storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or backend I/O failure.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid DID format.
    #[error("invalid DID '{value}': {reason}")]
    Did { value: String, reason: String },

    /// Invalid handle format.
    #[error("invalid handle '{value}': {reason}")]
    Handle { value: String, reason: String },

    /// Invalid NSID format.
    #[error("invalid NSID '{value}': {reason}")]
    Nsid { value: String, reason: String },

    /// Invalid AT URI format.
    #[error("invalid AT URI '{value}': {reason}")]
    AtUri { value: String, reason: String },

    /// Invalid PDS URL format.
    #[error("invalid PDS URL '{value}': {reason}")]
    PdsUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display_includes_kind() {
        let err = ProtocolError::new(
            400,
            Some("InvalidSwap".to_string()),
            Some("record was modified".to_string()),
        );
        assert_eq!(err.to_string(), "HTTP 400 [InvalidSwap]: record was modified");
        assert!(err.is_kind("InvalidSwap"));
        assert!(!err.is_auth_error());
    }

    #[test]
    fn aggregate_failure_lists_every_strategy() {
        let err = IdentityError::HandleUnresolved {
            handle: "alice.test".to_string(),
            failures: vec!["dns: timeout".to_string(), "http: HTTP 404".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("dns: timeout"));
        assert!(text.contains("http: HTTP 404"));
    }
}
