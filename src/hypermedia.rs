//! Hypermedia resource builder.
//!
//! Maps a placed bet to its public resource document plus the set of
//! links a client may legally follow next. Link sets are a pure function
//! of domain state — never of transport incidentals — so the hypermedia
//! contract can be asserted by tests without an HTTP stack.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Bet, Side};

/// Well-known link relation names.
pub mod link_names {
    /// Canonical retrieval location of the resource itself.
    pub const SELF: &str = "self";
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A named, state-derived pointer a client may follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub href: String,
}

impl Link {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// Ordered, deduplicated collection of links. Insertion order is kept;
/// a second link under an existing name is ignored, which makes the
/// rendered set deterministic by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSet(Vec<Link>);

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, link: Link) {
        if !self.0.iter().any(|l| l.name == link.name) {
            self.0.push(link);
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Link> {
        self.0.iter().find(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The links available from a bet in its current state.
///
/// Today a bet has exactly one state after placement, so the set is
/// always `{ self }`. Future lifecycle states (e.g. a settled bet)
/// extend this dispatch, not the handlers.
pub fn links_for(bet: &Bet) -> LinkSet {
    let mut links = LinkSet::new();
    links.push(Link::new(link_names::SELF, bet_href(bet.id)));
    links
}

/// Canonical retrieval path for a bet.
pub fn bet_href(bet_id: Uuid) -> String {
    format!("/bets/{bet_id}")
}

// ---------------------------------------------------------------------------
// Resource document
// ---------------------------------------------------------------------------

/// Public representation of a bet, plus its navigable links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResource {
    pub id: Uuid,
    pub match_id: Uuid,
    pub user_id: Uuid,
    pub side: Side,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
    pub links: LinkSet,
}

/// Render a bet into its resource document.
/// Deterministic: identical bet state yields an identical document.
pub fn render(bet: &Bet) -> BetResource {
    BetResource {
        id: bet.id,
        match_id: bet.match_id,
        user_id: bet.user_id,
        side: bet.side,
        amount: bet.amount,
        placed_at: bet.placed_at,
        links: links_for(bet),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
