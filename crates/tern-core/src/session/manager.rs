//! Sign-in orchestration over an OAuth client.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::store::{DEFAULT_STORAGE_KEY, SessionStore};
use crate::Result;
use crate::account::Account;
use crate::error::AuthError;
use crate::identity::IdentityResolver;
use crate::reactive::{CellSlots, Readable, SlotFactory, Writable};
use crate::traits::{AuthorizationRequest, Navigator, OAuthClient};
use crate::types::{Did, PdsUrl};

/// Default OAuth scope requested for interactive sign-in.
pub const DEFAULT_SCOPE: &str = "atproto transition:generic";

/// Session manager settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// OAuth scope requested for interactive sign-in.
    pub scope: String,
    /// Pause between building the authorization URL and navigating to it,
    /// letting pending storage writes land.
    pub redirect_delay: Duration,
    /// How long to wait for the navigation to take the process away before
    /// failing with [`AuthError::AuthorizationTimeout`].
    pub authorization_timeout: Duration,
    /// Durable storage key of the persisted account.
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            redirect_delay: Duration::from_millis(200),
            authorization_timeout: Duration::from_secs(100),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// What the client factory receives once a session is live.
#[derive(Debug, Clone)]
pub struct ClientContext<A> {
    pub handle: String,
    pub did: Did,
    pub pds: PdsUrl,
    pub agent: A,
}

/// Builds the application client for a freshly signed-in user.
pub type ClientFactory<A, C> = Arc<dyn Fn(ClientContext<A>) -> C + Send + Sync>;

/// Drives sign-in, silent session restore and sign-out, writing the outcome
/// into a [`SessionStore`].
///
/// Concurrent [`SessionManager::authenticate_if_necessary`] calls are not
/// serialized; the last slot write wins.
pub struct SessionManager<O, C, S = CellSlots>
where
    O: OAuthClient,
    C: Clone + Send + Sync + 'static,
    S: SlotFactory,
{
    store: Arc<SessionStore<O::Agent, C, S>>,
    identity: Arc<IdentityResolver>,
    oauth: Arc<O>,
    navigator: Arc<dyn Navigator>,
    client_factory: ClientFactory<O::Agent, C>,
    config: SessionConfig,
    initial: OnceCell<()>,
}

impl<O, C, S> SessionManager<O, C, S>
where
    O: OAuthClient,
    C: Clone + Send + Sync + 'static,
    S: SlotFactory,
{
    pub fn new(
        store: Arc<SessionStore<O::Agent, C, S>>,
        identity: Arc<IdentityResolver>,
        oauth: Arc<O>,
        navigator: Arc<dyn Navigator>,
        client_factory: ClientFactory<O::Agent, C>,
    ) -> Self {
        Self {
            store,
            identity,
            oauth,
            navigator,
            client_factory,
            config: SessionConfig::default(),
            initial: OnceCell::new(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<SessionStore<O::Agent, C, S>> {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Makes sure `handle` is signed in, returning whether it is.
    ///
    /// Returns `true` straight away when a user is already signed in under
    /// the same handle. Otherwise the identity is resolved and stored as the
    /// current account before any session exists, and a stored session is
    /// restored with fresh tokens. Without one, `refresh_only` returns
    /// `false`; otherwise the user is sent to the authorization server and
    /// this only returns, with [`AuthError::AuthorizationTimeout`], if the
    /// navigation did not end the process in time.
    ///
    /// # Errors
    ///
    /// Identity resolution failures are returned as-is. Session restore
    /// failures are treated as "no session".
    #[instrument(skip(self))]
    pub async fn authenticate_if_necessary(
        &self,
        handle: &str,
        refresh_only: bool,
    ) -> Result<bool> {
        let signed_in = self
            .store
            .user()
            .get()
            .is_some_and(|user| user.account.handle == handle);
        if signed_in {
            debug!("already signed in");
            return Ok(true);
        }

        let identity = self.identity.resolve_identity(handle).await?;
        let account = Account::new(handle, identity.did, identity.pds);
        self.store.account().set(Some(account.clone()));

        let session = match self.oauth.restore(&account.did, false).await {
            Ok(session) => session,
            Err(err) => {
                debug!(did = %account.did, error = %err, "no usable stored session");
                if refresh_only {
                    return Ok(false);
                }
                match self.sign_in(&account).await? {}
            }
        };

        let agent = O::Agent::from(session);
        let client = (self.client_factory)(ClientContext {
            handle: account.handle.clone(),
            did: account.did.clone(),
            pds: account.pds.clone(),
            agent: agent.clone(),
        });
        self.store.agent().set(Some(agent));
        self.store.client().set(Some(client));

        info!(did = %account.did, pds = %account.pds, "signed in");
        Ok(true)
    }

    /// Silently restores the persisted account's session, once per manager.
    ///
    /// Concurrent and later callers wait on the same attempt. Failures are
    /// logged and otherwise ignored.
    pub async fn wait_for_initial_session(&self) {
        self.initial
            .get_or_init(|| self.restore_persisted())
            .await;
    }

    /// Deletes every stored OAuth session and clears the account.
    ///
    /// The agent and client slots are left as they are.
    #[instrument(skip(self))]
    pub async fn revoke_sessions(&self) -> Result<()> {
        let dids = self.oauth.stored_sessions().await?;
        for did in &dids {
            self.oauth.delete_stored_session(did).await?;
        }
        self.store.account().set(None);
        info!(revoked = dids.len(), "signed out");
        Ok(())
    }

    async fn restore_persisted(&self) {
        let Some(account) = self.store.account().get() else {
            debug!("no persisted account");
            return;
        };

        match self.authenticate_if_necessary(&account.handle, true).await {
            Ok(true) => info!(handle = %account.handle, "restored previous session"),
            Ok(false) => info!(handle = %account.handle, "previous session not restorable"),
            Err(err) => {
                warn!(handle = %account.handle, error = %err, "initial session restore failed")
            }
        }
    }

    async fn sign_in(&self, account: &Account) -> Result<Infallible> {
        let request = AuthorizationRequest {
            handle: account.handle.clone(),
            did: account.did.clone(),
            pds: account.pds.clone(),
            scope: self.config.scope.clone(),
        };
        let url = self.oauth.authorize(&request).await?;

        tokio::time::sleep(self.config.redirect_delay).await;
        info!(%url, "redirecting to authorization server");

        let redirect = async {
            self.navigator.navigate(&url).await?;
            std::future::pending::<Result<Infallible>>().await
        };
        match tokio::time::timeout(self.config.authorization_timeout, redirect).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::AuthorizationTimeout.into()),
        }
    }
}
