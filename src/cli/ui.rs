use crate::core::Notice;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn metric_cell(value: f64) -> Cell {
    let cell = Cell::new(format!("{value:.4}")).set_alignment(CellAlignment::Right);
    if value < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

/// A figure taken from the catalog snapshot rather than a fetched record.
pub fn fallback_metric_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.4}*"))
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

pub fn loading_cell() -> Cell {
    Cell::new("Loading...")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color).set_alignment(CellAlignment::Right)
}

pub fn favorite_cell(favorite: bool, pending: bool) -> Cell {
    let cell = Cell::new(if favorite { "★" } else { "☆" }).set_alignment(CellAlignment::Center);
    match (favorite, pending) {
        (_, true) => cell.fg(Color::DarkGrey),
        (true, false) => cell.fg(Color::Yellow),
        (false, false) => cell,
    }
}

/// Creates a new `indicatif::ProgressBar` spinner with standard styling.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints queued engine notices to stderr.
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{}", style_text(&notice.message, StyleType::Error));
        if notice.requires_login {
            eprintln!(
                "{}",
                style_text(
                    "Your session is missing or expired; log in again and update the token.",
                    StyleType::Subtle
                )
            );
        }
    }
}
