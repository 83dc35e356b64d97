//! DID document command implementation.

use anyhow::{Context, Result};

use tern_core::Did;

use crate::app::App;
use crate::cli::DidDocArgs;
use crate::output;

pub async fn run(app: &App, args: &DidDocArgs) -> Result<()> {
    let did = Did::new(&args.did).context("Invalid DID")?;
    let document = app
        .identity
        .fetch_document(&did)
        .await
        .context("Failed to fetch DID document")?;
    output::json_pretty(&document)
}
