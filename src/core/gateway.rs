//! Remote gateway abstraction consumed by the synchronization engine

use crate::core::error::SyncError;
use crate::core::fund::{FavoriteMark, Fund, FundId, MetricsRecord};
use async_trait::async_trait;

/// Every side effect the engine performs goes through this trait.
#[async_trait]
pub trait FundGateway: Send + Sync {
    async fn list_funds(&self) -> Result<Vec<Fund>, SyncError>;

    async fn list_favorites(&self) -> Result<Vec<FavoriteMark>, SyncError>;

    async fn list_recommendations(&self) -> Result<Vec<Fund>, SyncError>;

    /// Computes (or fetches a precomputed) metrics record for a fund's tax id.
    async fn fetch_metrics(&self, tax_id: &str) -> Result<MetricsRecord, SyncError>;

    async fn add_favorite(&self, fund_id: FundId) -> Result<(), SyncError>;

    async fn remove_favorite(&self, fund_id: FundId) -> Result<(), SyncError>;

    async fn generate_report(&self) -> Result<Vec<u8>, SyncError>;

    async fn health(&self) -> Result<String, SyncError>;
}
