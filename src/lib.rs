pub mod cli;
pub mod core;
pub mod gateway;

use crate::core::config::AppConfig;
use crate::core::fund::{ActiveTab, FundId};
use crate::core::SyncEngine;
use crate::gateway::HttpGateway;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Dashboard { tab: Option<ActiveTab> },
    Favorite { fund_id: FundId },
    Report { output: Option<PathBuf> },
    Health,
}

pub fn build_engine(config: &AppConfig) -> Result<SyncEngine> {
    let gateway = HttpGateway::new(
        &config.gateway.base_url,
        config.gateway.timeout(),
        config.auth.credential_provider(),
    )
    .context("Failed to create gateway client")?;
    Ok(SyncEngine::new(Arc::new(gateway)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fundmatch starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(gateway = ?config.gateway, default_tab = ?config.default_tab, "Loaded config");

    let engine = build_engine(&config)?;

    match command {
        AppCommand::Dashboard { tab } => {
            let tab = tab.unwrap_or(config.default_tab);
            cli::dashboard::show_dashboard(&engine, tab).await?;
        }
        AppCommand::Favorite { fund_id } => {
            cli::favorite::toggle(&engine, fund_id).await?;
        }
        AppCommand::Report { output } => {
            cli::report::save_report(&engine, output, &config.report_dir()).await?;
        }
        AppCommand::Health => {
            let status = engine
                .health()
                .await
                .with_context(|| format!("Gateway at {} is unreachable", config.gateway.base_url))?;
            println!("Gateway {}: {}", config.gateway.base_url, status);
        }
    }
    Ok(())
}
