use clap::Parser;
use std::path::PathBuf;

use crate::params::Action;

/// Transfer files to or from a host behind an FTP gateway.
///
/// Any value not passed here is asked for interactively.
#[derive(Parser, Debug, Default)]
#[command(name = "fts")]
#[command(version)]
pub struct Cli {
    /// Gateway to use (name or address from the gateway table)
    #[arg(short, long)]
    pub gateway: Option<String>,

    /// Gateway username; when passed, the gateway password is asked for
    #[arg(short, long)]
    pub username: Option<String>,

    /// Gateway password
    #[arg(short, long)]
    pub passcode: Option<String>,

    /// Server group (label or code from the server-group table)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Managed-service instance id
    #[arg(short, long)]
    pub instance: Option<String>,

    /// Transfer direction
    #[arg(short, long, value_enum)]
    pub action: Option<Action>,

    /// File(s) to transfer
    #[arg(short, long, num_args = 1..)]
    pub file: Vec<String>,

    /// Print debug output on the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file to use instead of ./fts.{toml,json,yaml}
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
