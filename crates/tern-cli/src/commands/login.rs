//! Login command implementation.

use anyhow::{Context, Result, bail};

use tern_core::{Credentials, Readable};

use crate::app::App;
use crate::cli::LoginArgs;
use crate::output;

pub async fn run(app: &App, args: &LoginArgs) -> Result<()> {
    if let Some(password) = &args.password {
        output::note("Creating session...");
        app.oauth
            .create_session(&Credentials::new(&args.handle, password))
            .await
            .context("Failed to login")?;
    }

    let signed_in = app
        .manager
        .authenticate_if_necessary(&args.handle, args.refresh_only)
        .await
        .context("Failed to sign in")?;
    if !signed_in {
        bail!(
            "No stored session for {}. Run 'tern login {} --password <app-password>' first.",
            args.handle,
            args.handle
        );
    }

    let store = app.manager.store();
    output::success("Logged in successfully");
    println!();
    if let Some(did) = store.did().get() {
        output::field("DID", did.as_str());
    }
    if let Some(pds) = store.pds().get() {
        output::field("PDS", pds.as_str());
    }
    Ok(())
}
