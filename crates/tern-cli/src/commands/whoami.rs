//! Whoami command implementation.

use anyhow::Result;

use tern_core::{LoginState, Readable};

use crate::app::App;
use crate::output;

pub async fn run(app: &App) -> Result<()> {
    app.manager.wait_for_initial_session().await;

    let store = app.manager.store();
    let Some(account) = store.account().get() else {
        output::note("Not signed in.");
        return Ok(());
    };

    output::field("Handle", &account.handle);
    output::field("DID", account.did.as_str());
    output::field("PDS", account.pds.as_str());
    let session = if store.login_state() == LoginState::LoggedIn {
        "live"
    } else {
        "none"
    };
    output::field("Session", session);
    Ok(())
}
