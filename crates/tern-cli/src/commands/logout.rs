//! Logout command implementation.

use anyhow::{Context, Result};

use crate::app::App;
use crate::output;

pub async fn run(app: &App) -> Result<()> {
    app.manager
        .revoke_sessions()
        .await
        .context("Failed to revoke sessions")?;
    output::success("Logged out");
    Ok(())
}
