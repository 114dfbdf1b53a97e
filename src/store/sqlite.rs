//! SQLite-backed entity store.
//!
//! Durable persistence via sqlx. Ids, stakes, and timestamps are stored as
//! TEXT (uuid string, decimal string, RFC 3339) so no value is ever
//! narrowed through a float. Guarded writes run inside a transaction so
//! the match-status read and the bet insert commit against one snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::store::EntityStore;
use crate::types::{Bet, DomainViolation, Match, MatchStatus, Side, StoreError, Team};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id           TEXT PRIMARY KEY,
    home_team_id TEXT NOT NULL REFERENCES teams(id),
    away_team_id TEXT NOT NULL REFERENCES teams(id),
    start        TEXT NOT NULL,
    status       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bets (
    id        TEXT PRIMARY KEY,
    match_id  TEXT NOT NULL REFERENCES matches(id),
    user_id   TEXT NOT NULL,
    side      TEXT NOT NULL,
    amount    TEXT NOT NULL,
    placed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bets_match_user ON bets(match_id, user_id);
"#;

/// Durable store over a SQLite connection pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `url` and bootstrap the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(backend)?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn uuid_col(row: &SqliteRow, col: &str) -> Result<Uuid, StoreError> {
    let raw: String = row.try_get(col).map_err(backend)?;
    Uuid::parse_str(&raw).map_err(backend)
}

fn time_col(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, StoreError> {
    let raw: String = row.try_get(col).map_err(backend)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(backend)
}

fn status_col(row: &SqliteRow, col: &str) -> Result<MatchStatus, StoreError> {
    let raw: String = row.try_get(col).map_err(backend)?;
    raw.parse().map_err(backend)
}

fn match_from_row(row: &SqliteRow) -> Result<Match, StoreError> {
    Ok(Match {
        id: uuid_col(row, "id")?,
        home_team_id: uuid_col(row, "home_team_id")?,
        away_team_id: uuid_col(row, "away_team_id")?,
        start: time_col(row, "start")?,
        status: status_col(row, "status")?,
    })
}

fn bet_from_row(row: &SqliteRow) -> Result<Bet, StoreError> {
    let side: String = row.try_get("side").map_err(backend)?;
    let amount: String = row.try_get("amount").map_err(backend)?;
    Ok(Bet {
        id: uuid_col(row, "id")?,
        match_id: uuid_col(row, "match_id")?,
        user_id: uuid_col(row, "user_id")?,
        side: Side::from_str(&side).map_err(backend)?,
        amount: Decimal::from_str(&amount).map_err(backend)?,
        placed_at: time_col(row, "placed_at")?,
    })
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn add_team(&self, team: Team) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO teams (id, name) VALUES (?1, ?2)")
            .bind(team.id.to_string())
            .bind(&team.name)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn team(&self, id: Uuid) -> Result<Option<Team>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM teams WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|r| {
            Ok(Team {
                id: uuid_col(&r, "id")?,
                name: r.try_get("name").map_err(backend)?,
            })
        })
        .transpose()
    }

    async fn add_match(&self, m: Match) -> Result<(), StoreError> {
        if m.home_team_id == m.away_team_id {
            return Err(DomainViolation::IdenticalTeams(m.home_team_id).into());
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;

        for team_id in [m.home_team_id, m.away_team_id] {
            let exists = sqlx::query("SELECT 1 FROM teams WHERE id = ?1")
                .bind(team_id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            if exists.is_none() {
                return Err(StoreError::TeamMissing(team_id));
            }
        }

        sqlx::query(
            "INSERT INTO matches (id, home_team_id, away_team_id, start, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(m.id.to_string())
        .bind(m.home_team_id.to_string())
        .bind(m.away_team_id.to_string())
        .bind(m.start.to_rfc3339())
        .bind(m.status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn get_match(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        let row = sqlx::query(
            "SELECT id, home_team_id, away_team_id, start, status
             FROM matches WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    async fn set_match_status(&self, id: Uuid, status: MatchStatus) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query("SELECT status FROM matches WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?
            .ok_or(StoreError::MatchMissing(id))?;

        let current = status_col(&row, "status")?;
        if !current.can_advance_to(status) {
            return Err(DomainViolation::BackwardTransition {
                from: current,
                to: status,
            }
            .into());
        }

        sqlx::query("UPDATE matches SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn insert_bet(&self, bet: Bet) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query("SELECT status FROM matches WHERE id = ?1")
            .bind(bet.match_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?
            .ok_or(StoreError::MatchMissing(bet.match_id))?;

        let status = status_col(&row, "status")?;
        if !status.accepts_bets() {
            // dropping the transaction rolls back
            return Err(StoreError::MatchStateChanged {
                match_id: bet.match_id,
                status,
            });
        }

        sqlx::query(
            "INSERT INTO bets (id, match_id, user_id, side, amount, placed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(bet.id.to_string())
        .bind(bet.match_id.to_string())
        .bind(bet.user_id.to_string())
        .bind(bet.side.as_str())
        .bind(bet.amount.to_string())
        .bind(bet.placed_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn bet(&self, id: Uuid) -> Result<Option<Bet>, StoreError> {
        let row = sqlx::query(
            "SELECT id, match_id, user_id, side, amount, placed_at
             FROM bets WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|r| bet_from_row(&r)).transpose()
    }

    async fn user_has_bet(&self, match_id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM bets WHERE match_id = ?1 AND user_id = ?2 LIMIT 1")
            .bind(match_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.is_some())
    }

    async fn bets_for_match(&self, match_id: Uuid) -> Result<Vec<Bet>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, match_id, user_id, side, amount, placed_at
             FROM bets WHERE match_id = ?1 ORDER BY placed_at ASC",
        )
        .bind(match_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(bet_from_row).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn in_memory() -> SqliteStore {
        // single connection keeps the in-memory database alive
        SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
    }

    async fn seeded_match(store: &SqliteStore) -> Match {
        let home = Team::new("Liverpool");
        let away = Team::new("Everton");
        store.add_team(home.clone()).await.unwrap();
        store.add_team(away.clone()).await.unwrap();

        let m = Match::schedule(home.id, away.id, Utc::now()).unwrap();
        store.add_match(m.clone()).await.unwrap();
        m
    }

    #[tokio::test]
    async fn test_match_roundtrip() {
        let store = in_memory().await;
        let m = seeded_match(&store).await;

        let found = store.get_match(m.id).await.unwrap().unwrap();
        assert_eq!(found.id, m.id);
        assert_eq!(found.home_team_id, m.home_team_id);
        assert_eq!(found.away_team_id, m.away_team_id);
        assert_eq!(found.status, MatchStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_add_match_unknown_team_rejected() {
        let store = in_memory().await;
        let m = Match::schedule(Uuid::new_v4(), Uuid::new_v4(), Utc::now()).unwrap();
        let err = store.add_match(m).await.unwrap_err();
        assert!(matches!(err, StoreError::TeamMissing(_)));
    }

    #[tokio::test]
    async fn test_bet_roundtrip_preserves_amount_exactly() {
        let store = in_memory().await;
        let m = seeded_match(&store).await;

        let bet = Bet {
            id: Uuid::new_v4(),
            match_id: m.id,
            user_id: Uuid::new_v4(),
            side: Side::Away,
            amount: dec!(12.345678),
            placed_at: Utc::now(),
        };
        store.insert_bet(bet.clone()).await.unwrap();

        let found = store.bet(bet.id).await.unwrap().unwrap();
        assert_eq!(found.amount, dec!(12.345678));
        assert_eq!(found.side, Side::Away);
        assert!(store.user_has_bet(m.id, bet.user_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_bet_after_finish_rolls_back() {
        let store = in_memory().await;
        let m = seeded_match(&store).await;
        store
            .set_match_status(m.id, MatchStatus::Finished)
            .await
            .unwrap();

        let bet = Bet {
            id: Uuid::new_v4(),
            match_id: m.id,
            user_id: Uuid::new_v4(),
            side: Side::Home,
            amount: dec!(5),
            placed_at: Utc::now(),
        };
        let err = store.insert_bet(bet).await.unwrap_err();
        assert!(matches!(err, StoreError::MatchStateChanged { .. }));
        assert!(store.bets_for_match(m.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backward_transition_rejected() {
        let store = in_memory().await;
        let m = seeded_match(&store).await;
        store
            .set_match_status(m.id, MatchStatus::InProgress)
            .await
            .unwrap();

        let err = store
            .set_match_status(m.id, MatchStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }
}
