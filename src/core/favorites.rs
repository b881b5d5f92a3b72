use crate::core::error::SyncError;
use crate::core::fund::{FavoriteMark, FundId};
use crate::core::optimistic::Reversible;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

/// Identifies one tentative toggle. Tickets are never reused, even across
/// [`FavoritesSet::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteChange {
    pub fund_id: FundId,
    pub action: FavoriteAction,
    pub ticket: ToggleTicket,
}

/// Favorite fund ids plus the toggles currently in flight, at most one per id.
#[derive(Debug, Default)]
pub struct FavoritesSet {
    ids: HashSet<FundId>,
    in_flight: HashMap<FundId, (ToggleTicket, FavoriteAction)>,
    next_ticket: u64,
}

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces membership with the server's view, then reapplies every
    /// toggle still in flight on top of it. A snapshot taken before the
    /// remote write landed would otherwise drop the tentative state, and a
    /// later confirm would leave the set out of step with the server.
    pub fn reconcile<I>(&mut self, marks: I)
    where
        I: IntoIterator<Item = FavoriteMark>,
    {
        self.ids = marks.into_iter().map(|mark| mark.id).collect();
        for (id, (_, action)) in &self.in_flight {
            match action {
                FavoriteAction::Add => self.ids.insert(*id),
                FavoriteAction::Remove => self.ids.remove(id),
            };
        }
    }

    pub fn contains(&self, id: FundId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_in_flight(&self, id: FundId) -> bool {
        self.in_flight.contains_key(&id)
    }

    pub fn ids(&self) -> &HashSet<FundId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.in_flight.clear();
    }

    /// Releases the in-flight slot of `change` if it still owns it.
    fn release(&mut self, change: &FavoriteChange) -> bool {
        match self.in_flight.get(&change.fund_id) {
            Some((ticket, _)) if *ticket == change.ticket => {
                self.in_flight.remove(&change.fund_id);
                true
            }
            _ => false,
        }
    }
}

impl Reversible for FavoritesSet {
    type Key = FundId;
    type Change = FavoriteChange;

    fn apply_tentative(&mut self, fund_id: &FundId) -> Result<FavoriteChange, SyncError> {
        if self.in_flight.contains_key(fund_id) {
            return Err(SyncError::MutationInFlight(*fund_id));
        }
        let action = if self.ids.remove(fund_id) {
            FavoriteAction::Remove
        } else {
            self.ids.insert(*fund_id);
            FavoriteAction::Add
        };
        let ticket = ToggleTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight.insert(*fund_id, (ticket, action));
        Ok(FavoriteChange {
            fund_id: *fund_id,
            action,
            ticket,
        })
    }

    fn confirm(&mut self, change: &FavoriteChange) {
        self.release(change);
    }

    fn revert(&mut self, change: &FavoriteChange) {
        // Stale changes from a cleared session own no slot and touch nothing
        if !self.release(change) {
            return;
        }
        match change.action {
            FavoriteAction::Add => {
                self.ids.remove(&change.fund_id);
            }
            FavoriteAction::Remove => {
                self.ids.insert(change.fund_id);
            }
        }
    }
}
