use super::ui;
use crate::core::fund::ActiveTab;
use crate::core::view::{DashboardView, FundCard};
use crate::core::{MetricsState, SyncEngine};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl DashboardView {
    pub fn display_as_table(&self) -> String {
        let mut output = format!(
            "Tab: {}\n\n",
            ui::style_text(&self.tab.to_string(), ui::StyleType::Title)
        );

        if self.cards.is_empty() {
            output.push_str(&ui::style_text("No funds found.", ui::StyleType::Subtle));
            return output;
        }

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Fund"),
            ui::header_cell("CNPJ"),
            ui::header_cell("Class"),
            ui::header_cell("Fav"),
            ui::header_cell("Rentability"),
            ui::header_cell("Volatility"),
            ui::header_cell("Sharpe"),
        ]);

        for card in &self.cards {
            let mut row = vec![
                Cell::new(card.fund.id),
                Cell::new(&card.fund.name),
                Cell::new(&card.fund.tax_id),
                Cell::new(card.fund.asset_class.as_deref().unwrap_or("-")),
                ui::favorite_cell(card.favorite, card.mutation_pending),
            ];
            row.extend(metric_cells(card));
            table.add_row(row);
        }

        output.push_str(&table.to_string());

        let with_fallback = self
            .cards
            .iter()
            .any(|card| card.metrics.record().is_none() && card.fund.summary.is_some());
        if with_fallback {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    "* catalog snapshot, live metrics unavailable",
                    ui::StyleType::Subtle
                )
            ));
        }

        output.push_str(&format!(
            "\n\n{} {}",
            ui::style_text("Funds:", ui::StyleType::TotalLabel),
            self.cards.len()
        ));

        output
    }
}

fn metric_cells(card: &FundCard) -> Vec<Cell> {
    match (&card.metrics, card.fund.summary) {
        (MetricsState::Present(record), _) => vec![
            ui::metric_cell(record.rentability),
            ui::metric_cell(record.volatility),
            ui::metric_cell(record.sharpe),
        ],
        (MetricsState::Pending, _) => vec![ui::loading_cell(), ui::loading_cell(), ui::loading_cell()],
        (_, Some(summary)) => vec![
            ui::fallback_metric_cell(summary.rentability),
            ui::fallback_metric_cell(summary.volatility),
            ui::fallback_metric_cell(summary.sharpe),
        ],
        (state, None) => {
            let failed = matches!(state, MetricsState::Failed(_));
            vec![ui::na_cell(failed), ui::na_cell(failed), ui::na_cell(failed)]
        }
    }
}

/// Loads everything, waits for the metrics fill and prints `tab`.
pub async fn show_dashboard(engine: &SyncEngine, tab: ActiveTab) -> Result<DashboardView> {
    let pb = ui::new_spinner("Loading funds...");
    let loaded = engine.initialize().await;
    if loaded.is_ok() {
        pb.set_message("Computing metrics...");
        engine.settle().await;
    }
    pb.finish_and_clear();
    let summary = loaded.context("Failed to load funds, favorites and recommendations")?;
    tracing::debug!(?summary, "Dashboard data ready");

    engine.select_tab(tab).await;
    let view = engine.snapshot().await;
    println!("{}", view.display_as_table());
    ui::print_notices(&engine.take_notices().await);

    Ok(view)
}
