//! tern-core - AT Protocol identity and session core.
//!
//! This crate holds the network-free half of tern: validated protocol types,
//! DID documents, the identity resolver and its cache, the observable session
//! store and the session manager that drives sign-in. HTTP-backed
//! implementations of its traits live in `tern-xrpc`, filesystem storage in
//! `tern-file`.
//!
//! # Example
//!
//! ```
//! use tern_core::{Did, IdentityResolver};
//!
//! # async fn example(resolver: &IdentityResolver) -> Result<(), tern_core::Error> {
//! // DIDs pass through without touching the network.
//! let did = resolver.resolve_did("did:plc:z72i7hdynmk6r22z27h6tvur").await?;
//! assert_eq!(did, Did::new("did:plc:z72i7hdynmk6r22z27h6tvur")?);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod credentials;
pub mod did_doc;
pub mod error;
pub mod identity;
pub mod reactive;
pub mod record;
pub mod session;
pub mod storage;
pub mod tokens;
pub mod traits;
pub mod types;

// Re-export primary types at crate root for convenience
pub use account::Account;
pub use credentials::Credentials;
pub use did_doc::{DidDocument, Service};
pub use error::Error;
pub use identity::{IdentityResolver, ResolvedIdentity};
pub use reactive::{Cell, CellSlots, Derived, Readable, SlotFactory, SubscriptionId, Writable};
pub use record::{ListRecordsOutput, Record, RecordValue, WriteOutput};
pub use session::{
    ClientContext, ClientFactory, LoginState, SessionConfig, SessionManager, SessionStore, User,
};
pub use storage::{MemorySessionStorage, MemoryStore};
pub use tokens::{AccessToken, RefreshToken, TokenSet};
pub use traits::{
    AuthorizationRequest, DidDocumentFetcher, HandleResolver, KeyValueStore, Navigator,
    OAuthClient, SessionStorage, StoredSession,
};
pub use types::{AtUri, Did, Handle, Nsid, PdsUrl};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
