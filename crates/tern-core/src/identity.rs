//! Handle resolution and the identity cache.
//!
//! [`IdentityResolver`] turns a handle or DID into a [`ResolvedIdentity`]:
//! the DID, its hosting endpoint and its document. Handles are resolved by
//! racing every configured [`HandleResolver`] strategy; the first strategy to
//! succeed wins and the resolution only fails once all of them have failed.
//!
//! Results are memoized per resolver instance, keyed by the exact input
//! string. Entries never expire unless a TTL is configured with
//! [`IdentityResolver::with_ttl`]; [`IdentityResolver::invalidate`] drops a
//! single key when a caller knows an identity moved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::Result;
use crate::did_doc::DidDocument;
use crate::error::IdentityError;
use crate::traits::{DidDocumentFetcher, HandleResolver};
use crate::types::{Did, Handle, PdsUrl};

/// The DID, hosting endpoint and document of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub did: Did,
    pub pds: PdsUrl,
    pub document: DidDocument,
}

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    stored_at: Instant,
}

type CacheMap<T> = Mutex<HashMap<String, Cached<T>>>;

/// Resolves handles and DIDs, memoizing every successful lookup.
pub struct IdentityResolver {
    strategies: Vec<Arc<dyn HandleResolver>>,
    fetcher: Arc<dyn DidDocumentFetcher>,
    ttl: Option<Duration>,
    dids: CacheMap<Did>,
    identities: CacheMap<ResolvedIdentity>,
}

impl IdentityResolver {
    /// Create a resolver racing `strategies` for handles and using `fetcher`
    /// for documents.
    pub fn new(
        strategies: Vec<Arc<dyn HandleResolver>>,
        fetcher: Arc<dyn DidDocumentFetcher>,
    ) -> Self {
        Self {
            strategies,
            fetcher,
            ttl: None,
            dids: Mutex::new(HashMap::new()),
            identities: Mutex::new(HashMap::new()),
        }
    }

    /// Treat cache entries older than `ttl` as misses.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Resolve a handle (or pass through a DID) to a DID.
    ///
    /// Input matching the DID syntax is returned unchanged without any
    /// network call.
    #[instrument(skip(self))]
    pub async fn resolve_did(&self, handle_or_did: &str) -> Result<Did> {
        if Did::is_valid(handle_or_did) {
            return Did::new(handle_or_did);
        }

        if let Some(did) = self.lookup(&self.dids, handle_or_did) {
            debug!(%did, "handle cache hit");
            return Ok(did);
        }

        let handle = Handle::new(handle_or_did)?;
        let did = self.race(&handle).await?;
        self.store(&self.dids, handle_or_did, did.clone());
        Ok(did)
    }

    /// Fetch the DID document for `did`. Documents fetched this way are not
    /// cached.
    pub async fn fetch_document(&self, did: &Did) -> Result<DidDocument> {
        self.fetcher.fetch(did).await
    }

    /// Resolve a handle or DID to its DID, hosting endpoint and document.
    ///
    /// # Errors
    ///
    /// Fails with [`IdentityError::NoHostingEndpoint`] when the document has
    /// no usable personal data server entry, besides any resolution or fetch
    /// failure.
    #[instrument(skip(self))]
    pub async fn resolve_identity(&self, handle_or_did: &str) -> Result<ResolvedIdentity> {
        if let Some(identity) = self.lookup(&self.identities, handle_or_did) {
            debug!(did = %identity.did, "identity cache hit");
            return Ok(identity);
        }

        let did = self.resolve_did(handle_or_did).await?;
        let document = self.fetcher.fetch(&did).await?;
        let pds = match document.pds_endpoint() {
            Some(endpoint) => PdsUrl::new(endpoint)?,
            None => {
                return Err(IdentityError::NoHostingEndpoint {
                    did: did.to_string(),
                }
                .into());
            }
        };

        debug!(%did, %pds, "identity resolved");
        let identity = ResolvedIdentity { did, pds, document };
        self.store(&self.identities, handle_or_did, identity.clone());
        Ok(identity)
    }

    /// Drop every cached result for `key`.
    pub fn invalidate(&self, key: &str) {
        lock(&self.dids).remove(key);
        lock(&self.identities).remove(key);
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        lock(&self.dids).clear();
        lock(&self.identities).clear();
    }

    async fn race(&self, handle: &Handle) -> Result<Did> {
        let mut pending: FuturesUnordered<_> = self
            .strategies
            .iter()
            .map(|strategy| async move { (strategy.name(), strategy.resolve_handle(handle).await) })
            .collect();

        let mut failures = Vec::new();
        while let Some((name, outcome)) = pending.next().await {
            match outcome {
                Ok(did) => {
                    debug!(strategy = name, %did, "handle resolved");
                    return Ok(did);
                }
                Err(err) => {
                    debug!(strategy = name, error = %err, "handle strategy failed");
                    failures.push(format!("{}: {}", name, err));
                }
            }
        }

        Err(IdentityError::HandleUnresolved {
            handle: handle.to_string(),
            failures,
        }
        .into())
    }

    fn lookup<T: Clone>(&self, map: &CacheMap<T>, key: &str) -> Option<T> {
        let entries = lock(map);
        let entry = entries.get(key)?;
        let fresh = self
            .ttl
            .is_none_or(|ttl| entry.stored_at.elapsed() < ttl);
        fresh.then(|| entry.value.clone())
    }

    fn store<T>(&self, map: &CacheMap<T>, key: &str, value: T) {
        lock(map).insert(
            key.to_string(),
            Cached {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}

fn lock<T>(map: &CacheMap<T>) -> std::sync::MutexGuard<'_, HashMap<String, Cached<T>>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("ttl", &self.ttl)
            .finish()
    }
}
