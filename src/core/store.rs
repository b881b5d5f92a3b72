use crate::core::error::SyncError;
use crate::core::favorites::{FavoriteChange, FavoritesSet};
use crate::core::fund::{FavoriteMark, Fund, FundId};
use crate::core::optimistic::Reversible;
use std::collections::HashSet;

/// The three base collections as last loaded from the gateway.
#[derive(Debug, Default)]
pub struct CollectionStore {
    funds: Vec<Fund>,
    recommendations: Vec<Fund>,
    favorites: FavoritesSet,
    loaded: bool,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a complete load unit. Callers hold the write lock, so readers
    /// see either the old collections or the new ones, never a mix.
    pub fn replace(
        &mut self,
        funds: Vec<Fund>,
        favorites: Vec<FavoriteMark>,
        recommendations: Vec<Fund>,
    ) {
        self.funds = funds;
        self.favorites.reconcile(favorites);
        self.recommendations = recommendations;
        self.loaded = true;
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn recommendations(&self) -> &[Fund] {
        &self.recommendations
    }

    pub fn favorites(&self) -> &FavoritesSet {
        &self.favorites
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn contains_fund(&self, id: FundId) -> bool {
        self.funds.iter().any(|fund| fund.id == id)
    }

    /// Metrics keys for everything that can appear on screen: the catalog
    /// followed by recommendations, first occurrence wins.
    pub fn visible_funds(&self) -> Vec<Fund> {
        let mut seen = HashSet::new();
        self.funds
            .iter()
            .chain(self.recommendations.iter())
            .filter(|fund| seen.insert(fund.tax_id.clone()))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.funds.clear();
        self.recommendations.clear();
        self.favorites.clear();
        self.loaded = false;
    }
}

impl Reversible for CollectionStore {
    type Key = FundId;
    type Change = FavoriteChange;

    fn apply_tentative(&mut self, fund_id: &FundId) -> Result<FavoriteChange, SyncError> {
        if !self.contains_fund(*fund_id) {
            return Err(SyncError::UnknownFund(*fund_id));
        }
        self.favorites.apply_tentative(fund_id)
    }

    fn confirm(&mut self, change: &FavoriteChange) {
        self.favorites.confirm(change);
    }

    fn revert(&mut self, change: &FavoriteChange) {
        self.favorites.revert(change);
    }
}
