//! Wiring of the resolver, storage, OAuth client and session manager.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use tern_core::{
    ClientContext, IdentityResolver, ListRecordsOutput, Nsid, Record, SessionConfig,
    SessionManager, SessionStore,
};
use tern_file::{FileKeyValueStore, FileSessionStorage};
use tern_xrpc::{Agent, OAuthClientConfig, ResolverConfig, XrpcOAuthClient, http_client};

use crate::cli::Cli;
use crate::navigator::PrintNavigator;

/// The application client handed to commands once a session is live.
#[derive(Debug, Clone)]
pub struct RepoClient {
    pub handle: String,
    agent: Agent,
}

impl RepoClient {
    fn new(context: ClientContext<Agent>) -> Self {
        Self {
            handle: context.handle,
            agent: context.agent,
        }
    }

    pub async fn list_records(
        &self,
        collection: &Nsid,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> tern_core::Result<ListRecordsOutput> {
        self.agent
            .list_records(self.agent.did(), collection, limit, cursor)
            .await
    }

    pub async fn list_all_records(&self, collection: &Nsid) -> tern_core::Result<Vec<Record>> {
        self.agent.list_all_records(self.agent.did(), collection).await
    }
}

pub type Manager = SessionManager<XrpcOAuthClient, RepoClient>;

pub struct App {
    pub identity: Arc<IdentityResolver>,
    pub oauth: Arc<XrpcOAuthClient>,
    pub manager: Manager,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let data_dir = match &cli.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        debug!(data_dir = %data_dir.display(), "using data directory");

        let resolver = ResolverConfig {
            plc_directory: cli.plc_directory.clone(),
            doh_endpoint: cli.doh_endpoint.clone(),
            ..ResolverConfig::default()
        };
        let identity = Arc::new(
            resolver
                .build()
                .context("Failed to configure identity resolution")?,
        );

        let mut oauth_config = OAuthClientConfig::default();
        if let Some(client_id) = &cli.client_id {
            oauth_config.client_id = client_id.clone();
        }
        if let Some(redirect_uri) = &cli.redirect_uri {
            oauth_config.redirect_uri = redirect_uri.clone();
        }
        let http = http_client(&resolver.user_agent).context("Failed to build HTTP client")?;
        let oauth = Arc::new(XrpcOAuthClient::new(
            oauth_config,
            http,
            Arc::new(FileSessionStorage::new(sessions_dir(&data_dir))),
            Arc::clone(&identity),
        ));

        let config = SessionConfig::default();
        let store = Arc::new(SessionStore::with_key(
            Arc::new(FileKeyValueStore::new(data_dir.join("store.json"))),
            config.storage_key.clone(),
        ));
        let manager = SessionManager::new(
            store,
            Arc::clone(&identity),
            Arc::clone(&oauth),
            Arc::new(PrintNavigator),
            Arc::new(RepoClient::new),
        )
        .with_config(config);

        Ok(Self {
            identity,
            oauth,
            manager,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "tern").context("Could not determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

fn sessions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("sessions")
}
