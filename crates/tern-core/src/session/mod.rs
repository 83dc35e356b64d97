//! Session state and sign-in orchestration.
//!
//! [`SessionStore`] holds who is signed in as observable cells and persists
//! the account. [`SessionManager`] resolves identities, restores or creates
//! OAuth sessions and writes the result into the store.

mod manager;
mod store;

pub use manager::{ClientContext, ClientFactory, DEFAULT_SCOPE, SessionConfig, SessionManager};
pub use store::{DEFAULT_STORAGE_KEY, LoginState, SessionStore, User};
