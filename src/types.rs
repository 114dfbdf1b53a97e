//! Shared domain types for the betting backend.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that store, engine, and API
//! modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team that can appear on either side of a match.
/// Immutable once created as far as this subsystem is concerned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

// ---------------------------------------------------------------------------
// Match lifecycle
// ---------------------------------------------------------------------------

/// Match lifecycle status. Transitions are monotonic:
/// `Scheduled → InProgress → Finished`, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
}

impl MatchStatus {
    /// Whether new bets may be recorded against a match in this status.
    pub fn accepts_bets(&self) -> bool {
        matches!(self, MatchStatus::Scheduled)
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    /// Staying in place is not a transition.
    pub fn can_advance_to(&self, next: MatchStatus) -> bool {
        self.rank() < next.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            MatchStatus::Scheduled => 0,
            MatchStatus::InProgress => 1,
            MatchStatus::Finished => 2,
        }
    }

    /// Stable string form used by the SQLite store.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "in_progress" => Ok(MatchStatus::InProgress),
            "finished" => Ok(MatchStatus::Finished),
            _ => Err(anyhow::anyhow!("Unknown match status: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// A scheduled contest between two distinct teams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub start: DateTime<Utc>,
    pub status: MatchStatus,
}

impl Match {
    /// Build a new match in `Scheduled` status.
    /// Fails if both sides reference the same team.
    pub fn schedule(
        home_team_id: Uuid,
        away_team_id: Uuid,
        start: DateTime<Utc>,
    ) -> Result<Self, DomainViolation> {
        if home_team_id == away_team_id {
            return Err(DomainViolation::IdenticalTeams(home_team_id));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            home_team_id,
            away_team_id,
            start,
            status: MatchStatus::Scheduled,
        })
    }

    /// Move the lifecycle forward. Backward or same-status transitions
    /// are rejected.
    pub fn advance_to(&mut self, next: MatchStatus) -> Result<(), DomainViolation> {
        if !self.status.can_advance_to(next) {
            return Err(DomainViolation::BackwardTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// The team id on a given side of this match.
    pub fn team_on(&self, side: Side) -> Uuid {
        match side {
            Side::Home => self.home_team_id,
            Side::Away => self.away_team_id,
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "match {} ({} vs {}) start={} status={}",
            self.id, self.home_team_id, self.away_team_id, self.start, self.status,
        )
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of a match a bet is wagered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Side::Home),
            "away" => Ok(Side::Away),
            _ => Err(anyhow::anyhow!("Unknown bet side: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet
// ---------------------------------------------------------------------------

/// An immutable record of a user wagering an amount on one side of a match.
/// Created exactly once per accepted request, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub side: Side,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bet {} user={} match={} {} ${}",
            self.id, self.user_id, self.match_id, self.side, self.amount,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Violations of data-model invariants, independent of any request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainViolation {
    #[error("a match requires two distinct teams (got {0} on both sides)")]
    IdenticalTeams(Uuid),

    #[error("match status cannot move from {from} to {to}")]
    BackwardTransition { from: MatchStatus, to: MatchStatus },
}

/// Failures raised by the entity store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("match {0} not found")]
    MatchMissing(Uuid),

    #[error("team {0} not found")]
    TeamMissing(Uuid),

    #[error("match {match_id} stopped accepting writes (status {status})")]
    MatchStateChanged { match_id: Uuid, status: MatchStatus },

    #[error(transparent)]
    Domain(#[from] DomainViolation),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Everything that can go wrong while placing a bet.
///
/// All variants except `Storage` are client-request errors: the request
/// was understood and rejected, nothing was written, and the caller must
/// not retry automatically.
#[derive(Debug, thiserror::Error)]
pub enum BetError {
    #[error("stake must be a positive amount, got {0}")]
    InvalidAmount(Decimal),

    #[error("match {0} not found")]
    MatchNotFound(Uuid),

    #[error("match {match_id} does not accept bets in status {status}")]
    MatchNotBettable { match_id: Uuid, status: MatchStatus },

    #[error("user {user_id} already holds a bet on match {match_id}")]
    DuplicateBet { match_id: Uuid, user_id: Uuid },

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl BetError {
    /// Whether the caller may safely retry the request.
    /// Only infrastructure failures are transient; validation failures
    /// will fail again identically.
    pub fn is_transient(&self) -> bool {
        matches!(self, BetError::Storage(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
