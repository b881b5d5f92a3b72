use super::ui;
use crate::core::SyncEngine;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub fn default_report_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("fundmatch-report-{}.pdf", date.format("%Y%m%d")))
}

/// Downloads the account report and writes it to `output`, or to a dated
/// file under `report_dir` when no output is given.
pub async fn save_report(
    engine: &SyncEngine,
    output: Option<PathBuf>,
    report_dir: &Path,
) -> Result<PathBuf> {
    let pb = ui::new_spinner("Generating report...");
    let result = engine.request_report().await;
    pb.finish_and_clear();

    ui::print_notices(&engine.take_notices().await);
    let payload = result.context("Failed to generate report")?;

    let path = output
        .unwrap_or_else(|| default_report_path(report_dir, chrono::Local::now().date_naive()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(&path, &payload)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    println!("Report saved to {}", path.display());
    tracing::info!(bytes = payload.len(), path = %path.display(), "Report written");
    Ok(path)
}
