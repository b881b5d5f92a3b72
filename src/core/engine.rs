//! Synchronization engine: the single owner of the loaded collections, the
//! favorites set and the metrics cache.

use crate::core::cache::{MetricsCache, MetricsState};
use crate::core::error::SyncError;
use crate::core::favorites::{FavoriteAction, FavoriteChange};
use crate::core::fund::{ActiveTab, Fund, FundId, MetricsRecord};
use crate::core::gateway::FundGateway;
use crate::core::optimistic;
use crate::core::store::CollectionStore;
use crate::core::view::{self, DashboardView};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Favorite(FundId),
    Report,
}

/// A user-facing failure message queued for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub requires_login: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub funds: usize,
    pub favorites: usize,
    pub recommendations: usize,
}

#[derive(Clone)]
pub struct SyncEngine {
    gateway: Arc<dyn FundGateway>,
    store: Arc<RwLock<CollectionStore>>,
    metrics: MetricsCache,
    tab: Arc<Mutex<ActiveTab>>,
    notices: Arc<Mutex<Vec<Notice>>>,
    background: Arc<Mutex<JoinSet<()>>>,
}

impl SyncEngine {
    pub fn new(gateway: Arc<dyn FundGateway>) -> Self {
        Self {
            gateway,
            store: Arc::new(RwLock::new(CollectionStore::new())),
            metrics: MetricsCache::new(),
            tab: Arc::new(Mutex::new(ActiveTab::default())),
            notices: Arc::new(Mutex::new(Vec::new())),
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    /// Loads funds, favorites and recommendations as one unit. The three
    /// requests run concurrently; the store only changes if all succeed.
    /// On success the metrics fill for everything visible starts in the
    /// background, see [`SyncEngine::settle`].
    pub async fn initialize(&self) -> Result<LoadSummary, SyncError> {
        info!("Loading funds, favorites and recommendations");

        let (funds, favorites, recommendations) = tokio::try_join!(
            self.gateway.list_funds(),
            self.gateway.list_favorites(),
            self.gateway.list_recommendations(),
        )
        .inspect_err(|e| warn!(error = %e, "Initial load failed, keeping previous collections"))?;

        let summary = LoadSummary {
            funds: funds.len(),
            favorites: favorites.len(),
            recommendations: recommendations.len(),
        };

        let visible = {
            let mut store = self.store.write().await;
            store.replace(funds, favorites, recommendations);
            store.visible_funds()
        };
        info!(?summary, "Collections loaded");

        let engine = self.clone();
        let mut background = self.background.lock().await;
        while background.try_join_next().is_some() {}
        background.spawn(async move {
            engine.sync_metrics_for_visible(&visible).await;
        });

        Ok(summary)
    }

    /// Waits for background metrics fills started by [`SyncEngine::initialize`].
    pub async fn settle(&self) {
        let mut tasks = std::mem::replace(&mut *self.background.lock().await, JoinSet::new());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Metrics fill task did not finish");
            }
        }
    }

    /// Makes sure metrics for `tax_id` are cached or being fetched. Issues at
    /// most one request per key at a time and never refetches a present
    /// record. Failures are logged and left in the cache for a later retry.
    pub async fn ensure_metrics(&self, tax_id: &str) -> Option<MetricsRecord> {
        let Some(ticket) = self.metrics.claim(tax_id).await else {
            return self.metrics.get(tax_id).await;
        };

        debug!("Fetching metrics for {}", tax_id);
        match self.gateway.fetch_metrics(tax_id).await {
            Ok(record) => {
                if self.metrics.complete(tax_id, ticket, record).await {
                    Some(record)
                } else {
                    debug!("Discarding metrics for {} from a cleared session", tax_id);
                    None
                }
            }
            Err(e) => {
                warn!(tax_id, error = %e, "Metrics unavailable");
                self.metrics.fail(tax_id, ticket, e.to_string()).await;
                None
            }
        }
    }

    /// Fans out [`SyncEngine::ensure_metrics`] over every fund in `funds`.
    /// Returns how many of them have metrics available afterwards.
    pub async fn sync_metrics_for_visible(&self, funds: &[Fund]) -> usize {
        let mut seen = HashSet::new();
        let fills = funds
            .iter()
            .map(Fund::metrics_key)
            .filter(|key| seen.insert(*key))
            .map(|key| self.ensure_metrics(key));

        let available = join_all(fills).await.into_iter().flatten().count();
        debug!(available, "Metrics sync finished");
        available
    }

    /// Flips the favorite state of `fund_id` optimistically. The new state is
    /// visible immediately; a failed remote write restores the previous state
    /// and queues a notice. A toggle on a fund whose previous toggle is still
    /// in flight is rejected.
    pub async fn toggle_favorite(&self, fund_id: FundId) -> Result<FavoriteChange, SyncError> {
        let gateway = Arc::clone(&self.gateway);
        let result = optimistic::mutate(self.store.as_ref(), &fund_id, |change| async move {
            match change.action {
                FavoriteAction::Add => gateway.add_favorite(change.fund_id).await,
                FavoriteAction::Remove => gateway.remove_favorite(change.fund_id).await,
            }
        })
        .await;

        match result {
            Ok(change) => {
                info!(%fund_id, action = ?change.action, "Favorite updated");
                Ok(change)
            }
            Err(e) => {
                self.push_notice(
                    NoticeKind::Favorite(fund_id),
                    format!("Could not update favorite for fund {fund_id}: {e}"),
                    &e,
                )
                .await;
                Err(e)
            }
        }
    }

    /// Fetches the account report. Does not touch any engine state.
    pub async fn request_report(&self) -> Result<Vec<u8>, SyncError> {
        match self.gateway.generate_report().await {
            Ok(payload) => {
                info!(bytes = payload.len(), "Report generated");
                Ok(payload)
            }
            Err(e) => {
                self.push_notice(
                    NoticeKind::Report,
                    format!("Could not generate the report: {e}"),
                    &e,
                )
                .await;
                Err(e)
            }
        }
    }

    pub async fn health(&self) -> Result<String, SyncError> {
        self.gateway.health().await
    }

    pub async fn select_tab(&self, tab: ActiveTab) {
        *self.tab.lock().await = tab;
    }

    pub async fn active_tab(&self) -> ActiveTab {
        *self.tab.lock().await
    }

    /// Read-only snapshot of the active tab.
    pub async fn snapshot(&self) -> DashboardView {
        let tab = self.active_tab().await;
        self.view(tab).await
    }

    pub async fn view(&self, tab: ActiveTab) -> DashboardView {
        let store = self.store.read().await;
        let favorites = store.favorites();
        let visible = view::active_list(
            tab,
            store.funds(),
            favorites.ids(),
            store.recommendations(),
        );
        let states = self
            .metrics
            .states(visible.iter().map(|fund| fund.metrics_key()))
            .await;

        DashboardView::build(
            tab,
            store.is_loaded(),
            &visible,
            favorites.ids(),
            |id| favorites.is_in_flight(id),
            &states,
        )
    }

    pub async fn is_favorite(&self, fund_id: FundId) -> bool {
        self.store.read().await.favorites().contains(fund_id)
    }

    pub async fn favorite_ids(&self) -> HashSet<FundId> {
        self.store.read().await.favorites().ids().clone()
    }

    pub async fn funds(&self) -> Vec<Fund> {
        self.store.read().await.funds().to_vec()
    }

    pub async fn recommendations(&self) -> Vec<Fund> {
        self.store.read().await.recommendations().to_vec()
    }

    pub async fn metrics_state(&self, tax_id: &str) -> MetricsState {
        self.metrics.state(tax_id).await
    }

    pub fn metrics(&self) -> &MetricsCache {
        &self.metrics
    }

    /// Drains queued notices in the order they were raised.
    pub async fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().await)
    }

    /// Forgets everything loaded in this session. Results of requests still
    /// in flight are discarded when they arrive.
    pub async fn clear_session(&self) {
        self.background.lock().await.abort_all();
        self.store.write().await.clear();
        self.metrics.clear().await;
        self.notices.lock().await.clear();
        *self.tab.lock().await = ActiveTab::default();
        info!("Session cleared");
    }

    async fn push_notice(&self, kind: NoticeKind, message: String, cause: &SyncError) {
        warn!(?kind, "{}", message);
        self.notices.lock().await.push(Notice {
            kind,
            message,
            requires_login: cause.requires_login(),
        });
    }
}
