//! List records command implementation.

use anyhow::{Context, Result};

use tern_core::{Nsid, Readable};

use crate::app::App;
use crate::cli::ListRecordsArgs;
use crate::output;

pub async fn run(app: &App, args: &ListRecordsArgs) -> Result<()> {
    let collection = Nsid::new(&args.collection).context("Invalid collection NSID")?;

    app.manager.wait_for_initial_session().await;
    let client = app
        .manager
        .store()
        .client()
        .get()
        .context("No live session. Run 'tern login <handle>' first.")?;
    output::note(&format!("Listing {} for {}", collection, client.handle));

    let (records, cursor) = if args.all {
        let records = client
            .list_all_records(&collection)
            .await
            .context("Failed to list records")?;
        (records, None)
    } else {
        let page = client
            .list_records(&collection, args.limit, args.cursor.as_deref())
            .await
            .context("Failed to list records")?;
        (page.records, page.cursor)
    };

    if records.is_empty() {
        output::note("No records found.");
        return Ok(());
    }

    for record in &records {
        if args.pretty {
            output::json_pretty(record)?;
        } else {
            output::json(record)?;
        }
    }

    if let Some(cursor) = cursor {
        output::note(&format!("Next cursor: {}", cursor));
    }
    Ok(())
}
