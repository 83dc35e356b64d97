//! OAuth client backed by XRPC sessions.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;
use uuid::Uuid;

use tern_core::error::{AuthError, Error};
use tern_core::traits::{AuthorizationRequest, OAuthClient, SessionStorage, StoredSession};
use tern_core::types::Did;
use tern_core::{Credentials, IdentityResolver, Result};

use crate::agent::Agent;
use crate::client::XrpcClient;
use crate::endpoints::{
    AuthorizationServerMetadata, CREATE_SESSION, ProtectedResourceMetadata, SessionResponse,
};
use crate::error::transport;
use crate::session::{XrpcSession, token_set};

const PROTECTED_RESOURCE_PATH: &str = ".well-known/oauth-protected-resource";
const AUTHORIZATION_SERVER_PATH: &str = ".well-known/oauth-authorization-server";

/// Identity of this application towards authorization servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub redirect_uri: String,
}

impl Default for OAuthClientConfig {
    fn default() -> Self {
        Self {
            client_id: "http://localhost".to_string(),
            redirect_uri: "http://127.0.0.1/callback".to_string(),
        }
    }
}

/// Restores, refreshes and creates sessions kept in a [`SessionStorage`], and
/// builds authorization URLs for interactive sign-in.
pub struct XrpcOAuthClient {
    config: OAuthClientConfig,
    http: reqwest::Client,
    storage: Arc<dyn SessionStorage>,
    identity: Arc<IdentityResolver>,
}

impl XrpcOAuthClient {
    pub fn new(
        config: OAuthClientConfig,
        http: reqwest::Client,
        storage: Arc<dyn SessionStorage>,
        identity: Arc<IdentityResolver>,
    ) -> Self {
        Self {
            config,
            http,
            storage,
            identity,
        }
    }

    /// Signs in with a password and stores the resulting session so later
    /// silent restores find it.
    ///
    /// # Errors
    ///
    /// Rejected credentials fail with [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn create_session(&self, credentials: &Credentials) -> Result<XrpcSession> {
        let identity = self
            .identity
            .resolve_identity(credentials.identifier())
            .await?;
        let client = XrpcClient::new(self.http.clone(), identity.pds.clone());

        let response: SessionResponse = client
            .procedure(CREATE_SESSION, credentials, None)
            .await
            .map_err(|err| match err {
                Error::Protocol(err) if err.status == 401 || err.is_auth_error() => {
                    let reason = err.message.clone().unwrap_or_else(|| err.to_string());
                    Error::Auth(AuthError::InvalidCredentials(reason))
                }
                other => other,
            })?;

        let did = Did::new(&response.did)?;
        let stored = StoredSession {
            did: did.clone(),
            pds: identity.pds,
            tokens: token_set(response),
        };
        self.storage.put(&stored).await?;
        info!(%did, "password session created");

        Ok(XrpcSession::new(
            client,
            did,
            stored.tokens,
            Some(Arc::clone(&self.storage)),
        ))
    }

    async fn fetch_metadata<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(AuthError::AuthorizationServer {
                reason: format!("HTTP {} from {}", response.status().as_u16(), url),
            }
            .into());
        }
        response.json().await.map_err(|err| {
            AuthError::AuthorizationServer {
                reason: format!("invalid metadata at {}: {}", url, err),
            }
            .into()
        })
    }
}

fn metadata_url(base: &str, path: &str) -> Result<Url> {
    let base = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&base)
        .and_then(|base| base.join(path))
        .map_err(|err| {
            AuthError::AuthorizationServer {
                reason: format!("invalid issuer URL {}: {}", base, err),
            }
            .into()
        })
}

#[async_trait]
impl OAuthClient for XrpcOAuthClient {
    type Session = XrpcSession;
    type Agent = Agent;

    #[instrument(skip(self))]
    async fn restore(&self, did: &Did, allow_stale: bool) -> Result<XrpcSession> {
        let stored = self
            .storage
            .get(did)
            .await?
            .ok_or_else(|| AuthError::SessionNotFound {
                did: did.to_string(),
            })?;

        let client = XrpcClient::new(self.http.clone(), stored.pds);
        let session = XrpcSession::new(
            client,
            stored.did,
            stored.tokens,
            Some(Arc::clone(&self.storage)),
        );

        if !allow_stale && !session.is_usable().await {
            debug!("stored access token is stale");
            session.refresh().await.map_err(|err| match err {
                Error::Auth(AuthError::RefreshTokenInvalid) => {
                    Error::Auth(AuthError::SessionExpired)
                }
                other => other,
            })?;
        }
        Ok(session)
    }

    #[instrument(skip(self), fields(did = %request.did))]
    async fn authorize(&self, request: &AuthorizationRequest) -> Result<Url> {
        let resource: ProtectedResourceMetadata = self
            .fetch_metadata(metadata_url(request.pds.as_str(), PROTECTED_RESOURCE_PATH)?)
            .await?;
        let issuer = resource.authorization_servers.first().ok_or_else(|| {
            AuthError::AuthorizationServer {
                reason: format!("{} lists no authorization server", request.pds),
            }
        })?;

        let server: AuthorizationServerMetadata = self
            .fetch_metadata(metadata_url(issuer, AUTHORIZATION_SERVER_PATH)?)
            .await?;
        debug!(issuer = %server.issuer, "authorization server discovered");

        let mut url = Url::parse(&server.authorization_endpoint).map_err(|err| {
            AuthError::AuthorizationServer {
                reason: format!("invalid authorization endpoint: {}", err),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &request.scope)
            .append_pair("login_hint", &request.handle)
            .append_pair("state", &Uuid::new_v4().simple().to_string());
        Ok(url)
    }

    async fn stored_sessions(&self) -> Result<Vec<Did>> {
        self.storage.list().await
    }

    async fn delete_stored_session(&self, did: &Did) -> Result<()> {
        self.storage.delete(did).await
    }
}

impl std::fmt::Debug for XrpcOAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrpcOAuthClient")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .finish()
    }
}
