//! Terminal presentation adapters over the engine's read-only snapshots

pub mod dashboard;
pub mod favorite;
pub mod report;
pub mod setup;
pub mod ui;
