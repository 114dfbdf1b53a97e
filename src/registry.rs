//! Match registry.
//!
//! Read-only resolution of matches for the placement path. Match creation
//! and lifecycle transitions belong to the scheduling collaborator, which
//! talks to the store directly.

use std::sync::Arc;
use uuid::Uuid;

use crate::store::EntityStore;
use crate::types::{BetError, Match};

/// Thin read-only view over the entity store.
#[derive(Clone)]
pub struct MatchRegistry {
    store: Arc<dyn EntityStore>,
}

impl MatchRegistry {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Resolve a match by id. An absent match is a client-facing
    /// not-found outcome, not a fatal error.
    pub async fn resolve(&self, match_id: Uuid) -> Result<Match, BetError> {
        match self.store.get_match(match_id).await {
            Ok(Some(m)) => Ok(m),
            Ok(None) => Err(BetError::MatchNotFound(match_id)),
            Err(e) => Err(BetError::Storage(e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
