//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tern_xrpc::{DEFAULT_DOH_ENDPOINT, DEFAULT_PLC_DIRECTORY};

/// AT Protocol identity resolution and session management.
#[derive(Parser, Debug)]
#[command(name = "tern")]
#[command(author, version = env!("TERN_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Directory holding the persisted account and stored sessions
    #[arg(long, env = "TERN_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// PLC directory base URL
    #[arg(long, env = "TERN_PLC_DIRECTORY", default_value = DEFAULT_PLC_DIRECTORY, global = true)]
    pub plc_directory: String,

    /// DNS-over-HTTPS endpoint for handle TXT lookups
    #[arg(long, env = "TERN_DOH_ENDPOINT", default_value = DEFAULT_DOH_ENDPOINT, global = true)]
    pub doh_endpoint: String,

    /// OAuth client id
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// OAuth redirect URI
    #[arg(long, global = true)]
    pub redirect_uri: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a handle or DID to its DID and hosting server
    Resolve(ResolveArgs),

    /// Print the DID document of a DID
    DidDoc(DidDocArgs),

    /// Sign in as a handle
    Login(LoginArgs),

    /// Show the persisted account and whether its session is live
    Whoami,

    /// Delete every stored session and forget the account
    Logout,

    /// List records of the signed-in account
    ListRecords(ListRecordsArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Handle or DID
    pub identifier: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DidDocArgs {
    pub did: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Handle (or DID) to sign in as
    pub handle: String,

    /// Account password or app password; creates a stored session first
    #[arg(long, env = "TERN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Only restore a stored session, never start interactive authorization
    #[arg(long)]
    pub refresh_only: bool,
}

#[derive(Args, Debug)]
pub struct ListRecordsArgs {
    /// Collection NSID
    pub collection: String,

    /// Follow the cursor until every record is listed
    #[arg(long)]
    pub all: bool,

    /// Maximum number of records in a page
    #[arg(long, conflicts_with = "all")]
    pub limit: Option<u32>,

    /// Pagination cursor
    #[arg(long, conflicts_with = "all")]
    pub cursor: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}
