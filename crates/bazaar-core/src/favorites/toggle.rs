//! Optimistic favorite toggling for interactive front ends.
//!
//! The displayed membership changes as soon as a toggle begins. When the
//! store write completes the toggle is confirmed, or reverted if it failed.
//! A completion that a newer toggle of the same id has superseded is
//! ignored, and the set is reloaded from storage once nothing is in flight.

use std::collections::{HashMap, HashSet};

use super::FavoritesService;
use crate::auth::IdentityResolver;
use crate::db::FavoriteRepository;
use crate::error::Result;
use crate::pocketbase::RecordApi;

/// Per-bazaar toggle progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Idle,
    /// Displayed as `target` while the write is in flight
    Pending { target: bool },
    Confirmed { favorited: bool },
    /// The write failed and the previous membership was restored
    Reverted { favorited: bool },
}

/// Handle for one in-flight toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub bazaar_id: String,
    /// Membership the toggle is trying to reach
    pub target: bool,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct FavoriteToggle {
    ids: HashSet<String>,
    states: HashMap<String, ToggleState>,
    in_flight: HashMap<String, u64>,
    next_seq: u64,
    stale: bool,
}

impl FavoriteToggle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the service's current favorites
    pub async fn load<S, A, I>(service: &FavoritesService<S, A, I>) -> Result<Self>
    where
        S: FavoriteRepository,
        A: RecordApi,
        I: IdentityResolver,
    {
        let mut toggle = Self::new();
        toggle.reload(service).await?;
        Ok(toggle)
    }

    /// Replace the displayed set with storage truth
    pub async fn reload<S, A, I>(&mut self, service: &FavoritesService<S, A, I>) -> Result<()>
    where
        S: FavoriteRepository,
        A: RecordApi,
        I: IdentityResolver,
    {
        self.ids = service.get_favorite_ids().await?.into_iter().collect();
        self.stale = false;
        Ok(())
    }

    #[must_use]
    pub fn is_favorite(&self, bazaar_id: &str) -> bool {
        self.ids.contains(bazaar_id)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn state(&self, bazaar_id: &str) -> ToggleState {
        self.states.get(bazaar_id).copied().unwrap_or_default()
    }

    /// Whether a superseded completion left the set needing a reload
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Flip the displayed membership of `bazaar_id` and mark it pending
    pub fn begin(&mut self, bazaar_id: &str) -> PendingToggle {
        let target = !self.ids.contains(bazaar_id);
        self.apply(bazaar_id, target);

        self.next_seq += 1;
        self.in_flight.insert(bazaar_id.to_string(), self.next_seq);
        self.states
            .insert(bazaar_id.to_string(), ToggleState::Pending { target });

        PendingToggle {
            bazaar_id: bazaar_id.to_string(),
            target,
            seq: self.next_seq,
        }
    }

    /// Settle a toggle with the outcome of its store write
    pub fn finish(&mut self, pending: &PendingToggle, succeeded: bool) -> ToggleState {
        let id = pending.bazaar_id.as_str();
        if self.in_flight.get(id) != Some(&pending.seq) {
            tracing::debug!("Ignoring superseded toggle of {}", id);
            self.stale = true;
            return self.state(id);
        }
        self.in_flight.remove(id);

        let state = if succeeded {
            ToggleState::Confirmed {
                favorited: pending.target,
            }
        } else {
            self.apply(id, !pending.target);
            ToggleState::Reverted {
                favorited: !pending.target,
            }
        };
        self.states.insert(id.to_string(), state);
        state
    }

    /// Toggle through the service; returns the new membership.
    ///
    /// On a storage error the displayed membership is restored and the
    /// error returned.
    pub async fn toggle<S, A, I>(
        &mut self,
        service: &FavoritesService<S, A, I>,
        bazaar_id: &str,
    ) -> Result<bool>
    where
        S: FavoriteRepository,
        A: RecordApi,
        I: IdentityResolver,
    {
        let pending = self.begin(bazaar_id);
        let result = if pending.target {
            service.add_to_favorites(bazaar_id).await
        } else {
            service.remove_from_favorites(bazaar_id).await
        };
        self.finish(&pending, result.is_ok());

        if self.stale && self.in_flight.is_empty() {
            self.reload(service).await?;
        }
        result.map(|()| pending.target)
    }

    fn apply(&mut self, bazaar_id: &str, favorited: bool) {
        if favorited {
            self.ids.insert(bazaar_id.to_string());
        } else {
            self.ids.remove(bazaar_id);
        }
    }
}
