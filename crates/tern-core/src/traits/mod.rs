//! Core traits at the seams between the session core and its backends.

mod oauth;
mod resolver;
mod storage;

pub use oauth::{AuthorizationRequest, Navigator, OAuthClient};
pub use resolver::{DidDocumentFetcher, HandleResolver};
pub use storage::{KeyValueStore, SessionStorage, StoredSession};
