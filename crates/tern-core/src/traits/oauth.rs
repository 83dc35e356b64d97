//! OAuth client and browser navigation traits.

use async_trait::async_trait;
use url::Url;

use crate::Result;
use crate::types::{Did, PdsUrl};

/// Parameters of an interactive authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub handle: String,
    pub did: Did,
    pub pds: PdsUrl,
    pub scope: String,
}

/// The OAuth subsystem the session manager drives.
///
/// Implementations own token storage; the session manager never serializes
/// a session itself.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// A live authenticated session.
    type Session: Send;

    /// The transport handle built from a session.
    type Agent: From<Self::Session> + Clone + Send + Sync + 'static;

    /// Loads the stored session for `did`. Unless `allow_stale` is set, an
    /// access token that is expired or about to expire is refreshed first,
    /// and a session whose refresh is rejected fails with
    /// [`AuthError::SessionExpired`](crate::error::AuthError::SessionExpired).
    async fn restore(&self, did: &Did, allow_stale: bool) -> Result<Self::Session>;

    /// Builds the URL the user must visit to authorize this client.
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<Url>;

    /// Lists the DIDs with a stored session.
    async fn stored_sessions(&self) -> Result<Vec<Did>>;

    /// Deletes the stored session for `did`.
    async fn delete_stored_session(&self, did: &Did) -> Result<()>;
}

/// Moves the user agent to another location.
///
/// In a browser this leaves the current page, so a successful navigation is
/// normally the last thing the process observes.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: &Url) -> Result<()>;
}
