//! In-memory entity store.
//!
//! All state lives behind a single `RwLock`, which gives every method the
//! atomicity the `EntityStore` contract requires: a method holds the lock
//! for its whole read-modify-write, so no status change can slip between
//! a match check and a bet insert.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::store::EntityStore;
use crate::types::{Bet, Match, MatchStatus, StoreError, Team};

#[derive(Default)]
struct Inner {
    teams: HashMap<Uuid, Team>,
    matches: HashMap<Uuid, Match>,
    bets: HashMap<Uuid, Bet>,
}

/// Deterministic in-process store. Cheap to construct per test.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        // A poisoned lock means a writer panicked mid-update; the maps are
        // still structurally intact, so recover the guard.
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn add_team(&self, team: Team) -> Result<(), StoreError> {
        self.write().teams.insert(team.id, team);
        Ok(())
    }

    async fn team(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        Ok(self.read().teams.get(&id).cloned())
    }

    async fn add_match(&self, m: Match) -> Result<(), StoreError> {
        let mut inner = self.write();
        for team_id in [m.home_team_id, m.away_team_id] {
            if !inner.teams.contains_key(&team_id) {
                return Err(StoreError::TeamMissing(team_id));
            }
        }
        inner.matches.insert(m.id, m);
        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        Ok(self.read().matches.get(&id).cloned())
    }

    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError> {
        let mut inner = self.write();
        let m = inner
            .matches
            .get_mut(&id)
            .ok_or(StoreError::MatchMissing(id))?;
        m.advance_to(status)?;
        Ok(())
    }

    async fn insert_bet(&self, bet: Bet) -> Result<(), StoreError> {
        let mut inner = self.write();
        let m = inner
            .matches
            .get(&bet.match_id)
            .ok_or(StoreError::MatchMissing(bet.match_id))?;
        if !m.status.accepts_bets() {
            return Err(StoreError::MatchStateChanged {
                match_id: bet.match_id,
                status: m.status,
            });
        }
        inner.bets.insert(bet.id, bet);
        Ok(())
    }

    async fn bet(&self, id: Uuid) -> Result<Option<Bet>, StoreError> {
        Ok(self.read().bets.get(&id).cloned())
    }

    async fn user_has_bet(&self, match_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .read()
            .bets
            .values()
            .any(|b| b.match_id == match_id && b.user_id == user_id))
    }

    async fn bets_for_match(&self, match_id: Uuid) -> Result<Vec<Bet>, StoreError> {
        let mut bets: Vec<Bet> = self
            .read()
            .bets
            .values()
            .filter(|b| b.match_id == match_id)
            .cloned()
            .collect();
        bets.sort_by_key(|b| b.placed_at);
        Ok(bets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
