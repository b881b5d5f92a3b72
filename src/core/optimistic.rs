//! Two-phase optimistic mutations: apply a tentative change locally, run the
//! remote commit, then confirm or revert.

use crate::core::error::SyncError;
use std::future::Future;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub trait Reversible {
    type Key: ?Sized;
    type Change: Clone;

    /// Applies the change locally and returns what is needed to undo it.
    /// Must refuse keys that already have a tentative change outstanding.
    fn apply_tentative(&mut self, key: &Self::Key) -> Result<Self::Change, SyncError>;

    fn confirm(&mut self, change: &Self::Change);

    fn revert(&mut self, change: &Self::Change);
}

/// Runs one optimistic mutation against `state`. The write lock is only held
/// while applying, confirming or reverting, never across `commit`.
pub async fn mutate<S, F, Fut>(
    state: &RwLock<S>,
    key: &S::Key,
    commit: F,
) -> Result<S::Change, SyncError>
where
    S: Reversible,
    F: FnOnce(S::Change) -> Fut,
    Fut: Future<Output = Result<(), SyncError>>,
{
    let change = state.write().await.apply_tentative(key)?;
    debug!("Applied tentative change");

    match commit(change.clone()).await {
        Ok(()) => {
            state.write().await.confirm(&change);
            Ok(change)
        }
        Err(e) => {
            warn!(error = %e, "Remote commit failed, reverting tentative change");
            state.write().await.revert(&change);
            Err(e)
        }
    }
}
