use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fundmatch::core::fund::{ActiveTab, FundId};
use fundmatch::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display funds with their metrics
    Dashboard {
        /// Tab to display: all, favorites or recommendations
        #[arg(short, long)]
        tab: Option<ActiveTab>,
    },
    /// Add or remove a fund from favorites
    Favorite {
        /// Fund id as shown in the dashboard
        fund_id: FundId,
    },
    /// Download the PDF report
    Report {
        /// Where to write the report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the gateway is reachable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = match cli.command {
        Some(Commands::Setup) => {
            let result = fundmatch::cli::setup::setup();
            if let Err(e) = &result {
                tracing::error!(error = %e, "Setup failed");
            }
            return result;
        }
        Some(Commands::Dashboard { tab }) => fundmatch::AppCommand::Dashboard { tab },
        Some(Commands::Favorite { fund_id }) => fundmatch::AppCommand::Favorite { fund_id },
        Some(Commands::Report { output }) => fundmatch::AppCommand::Report { output },
        Some(Commands::Health) => fundmatch::AppCommand::Health,
        None => {
            Cli::command().print_help()?;
            return Ok(());
        }
    };

    let result = fundmatch::run_command(command, cli.config_path.as_deref()).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
