//! Subcommand implementations.

mod did_doc;
mod list_records;
mod login;
mod logout;
mod resolve;
mod whoami;

use anyhow::Result;

use crate::app::App;
use crate::cli::{Cli, Commands};

pub async fn run(cli: &Cli) -> Result<()> {
    let app = App::new(cli)?;
    match &cli.command {
        Commands::Resolve(args) => resolve::run(&app, args).await,
        Commands::DidDoc(args) => did_doc::run(&app, args).await,
        Commands::Login(args) => login::run(&app, args).await,
        Commands::Whoami => whoami::run(&app).await,
        Commands::Logout => logout::run(&app).await,
        Commands::ListRecords(args) => list_records::run(&app, args).await,
    }
}
