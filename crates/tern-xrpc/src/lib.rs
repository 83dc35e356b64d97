//! tern-xrpc - HTTP implementations of the tern-core traits.
//!
//! This crate provides the network half of tern: the XRPC client, the DNS
//! and well-known handle resolution strategies, the PLC / `did:web` document
//! fetcher, token-bearing sessions, the record-level [`Agent`] and the
//! [`XrpcOAuthClient`] driven by `tern_core::SessionManager`.
//!
//! # Example
//!
//! ```no_run
//! use tern_xrpc::ResolverConfig;
//!
//! # async fn example() -> Result<(), tern_core::Error> {
//! let resolver = ResolverConfig::default().build()?;
//! let identity = resolver.resolve_identity("alice.bsky.social").await?;
//! println!("{} is hosted at {}", identity.did, identity.pds);
//! # Ok(())
//! # }
//! ```

mod agent;
mod client;
mod config;
mod document;
mod endpoints;
mod error;
mod handle;
mod oauth;
mod session;

pub use agent::{Agent, INVALID_SWAP, RECORD_NOT_FOUND};
pub use client::{DEFAULT_USER_AGENT, XrpcClient, http_client};
pub use config::{DEFAULT_DOH_ENDPOINT, ResolverConfig};
pub use document::{DEFAULT_PLC_DIRECTORY, DidDocumentClient};
pub use handle::{DohResolver, WELL_KNOWN_PATH, WellKnownResolver, parse_txt_answers};
pub use oauth::{OAuthClientConfig, XrpcOAuthClient};
pub use session::XrpcSession;
