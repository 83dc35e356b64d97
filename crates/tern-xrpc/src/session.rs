//! Token-bearing sessions against a PDS.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use tern_core::error::{AuthError, Error};
use tern_core::traits::{SessionStorage, StoredSession};
use tern_core::types::{Did, PdsUrl};
use tern_core::{AccessToken, RefreshToken, Result, TokenSet};

use crate::client::XrpcClient;
use crate::endpoints::{REFRESH_SESSION, SessionResponse};

/// An authenticated session with a PDS.
///
/// Cheap to clone; clones share the same tokens. When built with a session
/// storage, refreshed tokens are written back to it.
///
/// Refreshes are serialized: callers that find the same stale token wait for
/// the first refresh and reuse its result, so a rotating refresh token is
/// only spent once.
#[derive(Clone)]
pub struct XrpcSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    did: Did,
    client: XrpcClient,
    tokens: RwLock<TokenSet>,
    refreshing: Mutex<()>,
    storage: Option<Arc<dyn SessionStorage>>,
}

impl XrpcSession {
    /// Creates a session from stored tokens.
    pub fn new(
        client: XrpcClient,
        did: Did,
        tokens: TokenSet,
        storage: Option<Arc<dyn SessionStorage>>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                did,
                client,
                tokens: RwLock::new(tokens),
                refreshing: Mutex::new(()),
                storage,
            }),
        }
    }

    pub fn did(&self) -> &Did {
        &self.inner.did
    }

    pub fn pds(&self) -> &PdsUrl {
        self.inner.client.pds()
    }

    pub fn client(&self) -> &XrpcClient {
        &self.inner.client
    }

    /// Returns a copy of the current tokens.
    pub async fn tokens(&self) -> TokenSet {
        self.inner.tokens.read().await.clone()
    }

    /// Returns true when the access token is usable right now.
    pub async fn is_usable(&self) -> bool {
        self.inner.tokens.read().await.is_usable(Utc::now())
    }

    /// Returns an access token usable right now, refreshing first if the
    /// current one is expired or about to expire.
    pub async fn access_token(&self) -> Result<String> {
        if !self.is_usable().await {
            let _refreshing = self.inner.refreshing.lock().await;
            // Another caller may have refreshed while we waited.
            if !self.is_usable().await {
                self.exchange().await?;
            }
        }
        Ok(self.inner.tokens.read().await.access_token.as_str().to_string())
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// # Errors
    ///
    /// Fails with [`AuthError::RefreshTokenInvalid`] when there is no refresh
    /// token or the server rejects it.
    pub async fn refresh(&self) -> Result<()> {
        let _refreshing = self.inner.refreshing.lock().await;
        self.exchange().await
    }

    #[instrument(skip(self), fields(did = %self.inner.did))]
    async fn exchange(&self) -> Result<()> {
        info!("refreshing session");

        let refresh_token = self
            .inner
            .tokens
            .read()
            .await
            .refresh_token
            .as_ref()
            .map(|t| t.as_str().to_string())
            .ok_or(AuthError::RefreshTokenInvalid)?;

        let response: SessionResponse = self
            .inner
            .client
            .procedure_empty(REFRESH_SESSION, &refresh_token)
            .await
            .map_err(|err| match err {
                Error::Protocol(err) if err.status == 400 || err.is_auth_error() => {
                    debug!(error = %err, "refresh token rejected");
                    Error::Auth(AuthError::RefreshTokenInvalid)
                }
                other => other,
            })?;

        let tokens = token_set(response);
        *self.inner.tokens.write().await = tokens.clone();
        self.persist(tokens).await;
        Ok(())
    }

    async fn persist(&self, tokens: TokenSet) {
        let Some(storage) = &self.inner.storage else {
            return;
        };
        let stored = StoredSession {
            did: self.inner.did.clone(),
            pds: self.pds().clone(),
            tokens,
        };
        if let Err(err) = storage.put(&stored).await {
            warn!(did = %self.inner.did, error = %err, "failed to persist refreshed session");
        }
    }
}

impl std::fmt::Debug for XrpcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrpcSession")
            .field("did", &self.inner.did)
            .field("pds", self.inner.client.pds())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

/// Builds a token set from a createSession or refreshSession response.
pub(crate) fn token_set(response: SessionResponse) -> TokenSet {
    let expires_at = jwt_expiry(&response.access_jwt);
    TokenSet {
        access_token: AccessToken::new(response.access_jwt),
        refresh_token: Some(RefreshToken::new(response.refresh_jwt)),
        expires_at,
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without verifying it.
pub(crate) fn jwt_expiry(jwt: &str) -> Option<DateTime<Utc>> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}
