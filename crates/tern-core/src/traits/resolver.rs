//! Identity resolution traits.

use async_trait::async_trait;

use crate::Result;
use crate::did_doc::DidDocument;
use crate::types::{Did, Handle};

/// One strategy for turning a handle into a DID.
///
/// Strategies fail independently; the identity resolver races them and only
/// fails when every strategy has failed.
#[async_trait]
pub trait HandleResolver: Send + Sync {
    /// Short name used in logs and aggregate failures.
    fn name(&self) -> &'static str;

    /// Resolve `handle` to the DID it currently points at.
    async fn resolve_handle(&self, handle: &Handle) -> Result<Did>;
}

/// Fetches DID documents from the directory matching the DID's method.
#[async_trait]
pub trait DidDocumentFetcher: Send + Sync {
    /// Fetch and parse the document for `did`.
    async fn fetch(&self, did: &Did) -> Result<DidDocument>;
}
