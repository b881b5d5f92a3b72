use super::ui;
use crate::core::SyncEngine;
use crate::core::favorites::{FavoriteAction, FavoriteChange};
use crate::core::fund::FundId;
use anyhow::{Context, Result};

pub fn describe_change(change: &FavoriteChange, fund_name: &str) -> String {
    match change.action {
        FavoriteAction::Add => format!("★ {fund_name} added to favorites"),
        FavoriteAction::Remove => format!("☆ {fund_name} removed from favorites"),
    }
}

/// Loads the catalog and flips the favorite mark of `fund_id`.
pub async fn toggle(engine: &SyncEngine, fund_id: FundId) -> Result<FavoriteChange> {
    engine
        .initialize()
        .await
        .context("Failed to load funds, favorites and recommendations")?;

    let result = engine.toggle_favorite(fund_id).await;
    ui::print_notices(&engine.take_notices().await);
    let change = result.with_context(|| format!("Failed to update favorite for fund {fund_id}"))?;

    let name = engine
        .funds()
        .await
        .into_iter()
        .find(|fund| fund.id == fund_id)
        .map(|fund| fund.name)
        .unwrap_or_else(|| fund_id.to_string());
    println!("{}", describe_change(&change, &name));

    Ok(change)
}
