//! Bet placement engine.
//!
//! Validates a bet request against match state and prior bets, then
//! applies the placement atomically. The engine is stateless across
//! requests; everything durable lives in the entity store.
//!
//! Validation order is fixed, first violation wins:
//! stake > 0 → match exists → match accepts bets → no duplicate
//! (when the one-bet-per-user-per-match policy is on).

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::MatchRegistry;
use crate::store::EntityStore;
use crate::types::{Bet, BetError, Side, StoreError};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Placement policy knobs.
#[derive(Debug, Clone)]
pub struct BetPolicy {
    /// When false (the default), a user may hold at most one bet per
    /// match; a second attempt is rejected with `DuplicateBet`.
    pub allow_duplicate_bets: bool,
}

impl Default for BetPolicy {
    fn default() -> Self {
        Self {
            allow_duplicate_bets: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-match serialization
// ---------------------------------------------------------------------------

/// Registry of per-match async locks. Placement holds the match's lock
/// across validate+insert so two concurrent requests against the same
/// match are strictly serialized; requests on different matches don't
/// contend.
///
/// The map holds an entry only while at least one request is working on
/// that match: `release` removes the entry once the last handle is
/// returned, so client-supplied ids (including ids of matches that don't
/// exist) never accumulate.
#[derive(Default)]
struct MatchLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl MatchLocks {
    fn handle(&self, match_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(match_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Return a handle obtained from `handle`. Every handle must come back
    /// through here; the last one out drops the map entry.
    fn release(&self, match_id: Uuid, lock: Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // the map's clone plus this one: no other request holds the lock
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&match_id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct BetPlacementEngine {
    store: Arc<dyn EntityStore>,
    registry: MatchRegistry,
    policy: BetPolicy,
    locks: MatchLocks,
}

impl BetPlacementEngine {
    pub fn new(store: Arc<dyn EntityStore>, policy: BetPolicy) -> Self {
        let registry = MatchRegistry::new(store.clone());
        Self {
            store,
            registry,
            policy,
            locks: MatchLocks::default(),
        }
    }

    /// Record a bet by `user_id` on one side of a match.
    ///
    /// On success the returned `Bet` carries a server-assigned id and
    /// placement timestamp. On any validation failure nothing is written
    /// and the caller must not retry automatically; only
    /// `BetError::Storage` is transient.
    pub async fn place_bet(
        &self,
        user_id: Uuid,
        match_id: Uuid,
        side: Side,
        amount: Decimal,
    ) -> Result<Bet, BetError> {
        if amount <= Decimal::ZERO {
            debug!(%user_id, %match_id, %amount, "Rejecting non-positive stake");
            return Err(BetError::InvalidAmount(amount));
        }

        // Serialize validate+insert per match. The store's guarded insert
        // re-checks the match snapshot; the lock additionally keeps the
        // duplicate check and the insert from interleaving.
        let lock = self.locks.handle(match_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.place_locked(user_id, match_id, side, amount).await
        };
        self.locks.release(match_id, lock);
        outcome
    }

    async fn place_locked(
        &self,
        user_id: Uuid,
        match_id: Uuid,
        side: Side,
        amount: Decimal,
    ) -> Result<Bet, BetError> {
        let m = self.registry.resolve(match_id).await?;
        if !m.status.accepts_bets() {
            debug!(%match_id, status = %m.status, "Match no longer bettable");
            return Err(BetError::MatchNotBettable {
                match_id,
                status: m.status,
            });
        }

        if !self.policy.allow_duplicate_bets {
            let already = self
                .store
                .user_has_bet(match_id, user_id)
                .await
                .map_err(BetError::Storage)?;
            if already {
                debug!(%user_id, %match_id, "Duplicate bet rejected");
                return Err(BetError::DuplicateBet { match_id, user_id });
            }
        }

        let bet = Bet {
            id: Uuid::new_v4(),
            match_id,
            user_id,
            side,
            amount,
            placed_at: Utc::now(),
        };

        match self.store.insert_bet(bet.clone()).await {
            Ok(()) => {
                info!(bet_id = %bet.id, %user_id, %match_id, %side, %amount, "Bet placed");
                Ok(bet)
            }
            // The match moved out of Scheduled between resolution and
            // commit; surface it exactly like the earlier status check.
            Err(StoreError::MatchStateChanged { match_id, status }) => {
                debug!(%match_id, %status, "Match state changed before commit");
                Err(BetError::MatchNotBettable { match_id, status })
            }
            Err(StoreError::MatchMissing(id)) => Err(BetError::MatchNotFound(id)),
            Err(e) => {
                warn!(error = %e, %match_id, "Store rejected bet insert");
                Err(BetError::Storage(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
