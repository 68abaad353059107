//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Worklog reconciler.
///
/// Reconciles a ledger of time entries against the remote time-tracking
/// service, creating, updating, and deleting remote worklogs so the dates in
/// the ledger end up matching it exactly.
#[derive(Debug, Parser)]
#[command(name = "wls", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the remote service (overrides config/WLS_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Account id of the user whose worklogs are managed
    /// (overrides config/WLS_ACCOUNT_ID).
    #[arg(long, global = true)]
    pub account_id: Option<String>,

    /// API token (overrides config/WLS_API_TOKEN).
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile a ledger file (or stdin) against the remote service.
    Import {
        /// Ledger CSV file; reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Delete every remote worklog on the listed dates.
    Clear {
        /// Dates to clear (ISO-8601, e.g. 2023-10-01).
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
}
