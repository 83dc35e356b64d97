//! Resolve command implementation.

use anyhow::{Context, Result};
use serde_json::json;

use crate::app::App;
use crate::cli::ResolveArgs;
use crate::output;

pub async fn run(app: &App, args: &ResolveArgs) -> Result<()> {
    let identity = app
        .identity
        .resolve_identity(&args.identifier)
        .await
        .with_context(|| format!("Failed to resolve {}", args.identifier))?;

    let handles: Vec<&str> = identity.document.handles().collect();
    if args.json {
        return output::json(&json!({
            "did": identity.did,
            "pds": identity.pds.as_str(),
            "handles": handles,
        }));
    }

    output::field("DID", identity.did.as_str());
    output::field("PDS", identity.pds.as_str());
    if !handles.is_empty() {
        output::field("Handles", &handles.join(", "));
    }
    Ok(())
}
