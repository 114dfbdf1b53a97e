//! Entity store.
//!
//! Defines the `EntityStore` trait — the transactional persistence
//! collaborator owning Team, Match, and Bet entities — and provides
//! implementations for:
//! - `MemoryStore` — in-process maps, deterministic, used by tests and demos
//! - `SqliteStore` — durable SQLite persistence via sqlx

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{Bet, Match, MatchStatus, StoreError, Team};

/// Abstraction over the transactional entity store.
///
/// Implementors guarantee that each method is atomic: either the whole
/// operation commits or nothing is written. `insert_bet` additionally
/// re-verifies the referenced match against the same snapshot the insert
/// commits into, so a match status read and a bet insert are never split
/// by an intervening status change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist a new team.
    async fn add_team(&self, team: Team) -> Result<(), StoreError>;

    /// Look up a team by id.
    async fn team(&self, id: Uuid) -> Result<Option<Team>, StoreError>;

    /// Persist a new match. Both referenced teams must already exist.
    async fn add_match(&self, m: Match) -> Result<(), StoreError>;

    /// Look up a match by id.
    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError>;

    /// Advance a match's lifecycle status. Backward transitions are
    /// rejected with `StoreError::Domain`.
    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError>;

    /// Atomically verify the referenced match still accepts bets and
    /// insert the bet. Fails with `MatchStateChanged` if the match moved
    /// out of `Scheduled` in the meantime, with zero writes.
    async fn insert_bet(&self, bet: Bet) -> Result<(), StoreError>;

    /// Look up a bet by id.
    async fn bet(&self, id: Uuid) -> Result<Option<Bet>, StoreError>;

    /// Whether the user already holds a bet on the match.
    async fn user_has_bet(&self, match_id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    /// All bets recorded against a match, oldest first.
    async fn bets_for_match(&self, match_id: Uuid) -> Result<Vec<Bet>, StoreError>;
}
