use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scout_core::OutputFormat;

#[derive(Parser)]
#[command(name = "niche-scout", version)]
#[command(about = "Niche Scout: autonomous digital-product niche survey")]
pub struct Cli {
    /// Run one cycle when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to ~/.config/niche-scout/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one survey cycle (default)
    Run,

    /// Record market feedback for a niche
    Label {
        /// Niche keyword, matched exactly
        keyword: String,

        #[command(flatten)]
        outcome: LabelOutcome,
    },

    /// Add realized revenue to the running total
    Revenue {
        /// Amount in the store's currency
        #[arg(allow_negative_numbers = true)]
        amount: f64,
    },

    /// Show memory statistics
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct LabelOutcome {
    /// Mark the niche as proven
    #[arg(long)]
    pub success: bool,

    /// Mark the niche as failed
    #[arg(long)]
    pub failed: bool,

    /// Remove any label from the niche
    #[arg(long)]
    pub clear: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Print the commented default template instead
        #[arg(long)]
        template: bool,
    },
}
