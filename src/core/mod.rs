//! Core business logic: domain types, caches and the synchronization engine

pub mod cache;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod favorites;
pub mod fund;
pub mod gateway;
pub mod log;
pub mod optimistic;
pub mod store;
pub mod view;

// Re-export main types for cleaner imports
pub use cache::{MetricsCache, MetricsState};
pub use engine::{LoadSummary, Notice, NoticeKind, SyncEngine};
pub use error::SyncError;
pub use fund::{ActiveTab, FavoriteMark, Fund, FundId, MetricsRecord};
pub use gateway::FundGateway;
