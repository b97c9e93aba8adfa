use anyhow::Result;
use clap::Parser;

mod cli;
mod config_cmds;
mod memory_cmd;
mod run_cmd;

use cli::{Cli, Commands, ConfigCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (output to stderr, initialize only once)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    let output_format = cli.format.clone();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            run_cmd::handle_run(config_path, output_format).await?;
        }
        Commands::Label { keyword, outcome } => {
            memory_cmd::handle_label(config_path, &keyword, outcome)?;
        }
        Commands::Revenue { amount } => {
            memory_cmd::handle_revenue(config_path, amount)?;
        }
        Commands::Status => {
            memory_cmd::handle_status(config_path, output_format)?;
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show { template } => {
                config_cmds::handle_config_show(config_path, template, output_format)?;
            }
        },
    }

    Ok(())
}
