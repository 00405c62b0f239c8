//! CLI module - Command-line interface for the coffee fund
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// Coffee Fund - shared office coffee ledger
/// Tracks purchases and decides who pays for the next round
#[derive(Parser)]
#[command(name = "coffeefund")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web API server
    #[command(alias = "web")]
    Serve,

    /// Create default config file and a starter price list
    #[command(alias = "--init")]
    Init,

    /// List coffee prices
    Prices,

    /// Show each user's derived spend total
    #[command(alias = "ls")]
    Totals,

    /// Show who pays for the next round
    NextPayer,

    /// Settle a round: the least-spent user pays for every favorite
    #[command(alias = "round")]
    Settle,

    /// Record a single coffee bought by a user
    Purchase {
        /// Username of the buyer
        user: String,
        /// Coffee name as listed in the price list
        coffee: String,
    },

    /// Show a user's purchase history
    #[command(alias = "h")]
    History {
        /// Username
        user: String,
    },

    /// Compare stored totals against history
    Reconcile,
}

pub use commands::*;

use crate::state::SharedState;

/// Runs a command that reads or changes the ledger.
pub async fn dispatch(state: &SharedState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Prices => cmd_prices(state).await,
        Commands::Totals => cmd_totals(state).await,
        Commands::NextPayer => cmd_next_payer(state).await,
        Commands::Settle => cmd_settle(state).await,
        Commands::Purchase { user, coffee } => cmd_purchase(state, &user, &coffee).await,
        Commands::History { user } => cmd_history(state, &user).await,
        Commands::Reconcile => cmd_reconcile(state).await,
        Commands::Serve | Commands::Init => {
            anyhow::bail!("'serve' and 'init' do not run against an open ledger")
        }
    }
}
