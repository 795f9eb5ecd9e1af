//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use fedsfm::Environment;

use crate::commands::catalog::CatalogArgs;
use crate::commands::fetch::FetchArgs;

/// CLI tool for fetching fedsfm sanctions lists.
#[derive(Parser, Debug)]
#[command(name = "fedsfm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch current catalogs and download the published list files
    Fetch(FetchArgs),

    /// Fetch and print catalog metadata only
    Catalog(CatalogArgs),
}

/// Service circuit to talk to.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EnvArg {
    /// The "test-contur" integration circuit
    Test,
    /// The production circuit
    Prod,
}

impl From<EnvArg> for Environment {
    fn from(arg: EnvArg) -> Self {
        match arg {
            EnvArg::Test => Environment::Test,
            EnvArg::Prod => Environment::Production,
        }
    }
}
