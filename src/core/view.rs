//! Derived, read-only views over the loaded collections

use crate::core::cache::MetricsState;
use crate::core::fund::{ActiveTab, Fund, FundId};
use std::collections::{HashMap, HashSet};

/// Selects the funds shown under `tab`. Pure: no I/O and no caching.
pub fn active_list<'a>(
    tab: ActiveTab,
    funds: &'a [Fund],
    favorites: &HashSet<FundId>,
    recommendations: &'a [Fund],
) -> Vec<&'a Fund> {
    match tab {
        ActiveTab::All => funds.iter().collect(),
        ActiveTab::Favorites => funds
            .iter()
            .filter(|fund| favorites.contains(&fund.id))
            .collect(),
        ActiveTab::Recommendations => recommendations.iter().collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundCard {
    pub fund: Fund,
    pub favorite: bool,
    /// A favorite toggle for this fund awaits server confirmation.
    pub mutation_pending: bool,
    pub metrics: MetricsState,
}

/// Snapshot handed to presentation adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub tab: ActiveTab,
    pub loaded: bool,
    pub cards: Vec<FundCard>,
}

impl DashboardView {
    pub fn build(
        tab: ActiveTab,
        loaded: bool,
        visible: &[&Fund],
        favorites: &HashSet<FundId>,
        in_flight: impl Fn(FundId) -> bool,
        metrics: &HashMap<String, MetricsState>,
    ) -> Self {
        let cards = visible
            .iter()
            .map(|fund| FundCard {
                fund: (*fund).clone(),
                favorite: favorites.contains(&fund.id),
                mutation_pending: in_flight(fund.id),
                metrics: metrics
                    .get(fund.metrics_key())
                    .cloned()
                    .unwrap_or(MetricsState::Absent),
            })
            .collect();

        Self { tab, loaded, cards }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
