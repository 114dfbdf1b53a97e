//! Bet API route handlers.
//!
//! All endpoints speak JSON. Domain errors map onto HTTP statuses here
//! and nowhere else; handlers stay thin and delegate to the engine.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{AuthenticatedUser, SharedState};
use crate::hypermedia::{self, BetResource};
use crate::types::{BetError, Side, StoreError};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeBetInput {
    pub match_id: Uuid,
    pub home_bet: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwayBetInput {
    pub match_id: Uuid,
    pub away_bet: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Transport-level error wrapper. Every domain failure maps to exactly
/// one status class; storage failures are the only retryable outcome.
#[derive(Debug)]
pub enum ApiError {
    Bet(BetError),
    BetNotFound(Uuid),
}

impl From<BetError> for ApiError {
    fn from(e: BetError) -> Self {
        ApiError::Bet(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Bet(BetError::Storage(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Bet(e) => {
                let (status, kind) = match e {
                    BetError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
                    BetError::MatchNotFound(_) => (StatusCode::NOT_FOUND, "match_not_found"),
                    BetError::MatchNotBettable { .. } => {
                        (StatusCode::CONFLICT, "match_not_bettable")
                    }
                    BetError::DuplicateBet { .. } => (StatusCode::CONFLICT, "duplicate_bet"),
                    BetError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_failure"),
                };
                (status, kind, e.to_string())
            }
            ApiError::BetNotFound(id) => (
                StatusCode::NOT_FOUND,
                "bet_not_found",
                format!("bet {id} not found"),
            ),
        };

        (
            status,
            Json(ErrorBody {
                error: kind,
                message,
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /bets/home-team
pub async fn place_home_bet(
    State(state): State<SharedState>,
    user: AuthenticatedUser,
    Json(input): Json<HomeBetInput>,
) -> Result<(StatusCode, Json<BetResource>), ApiError> {
    let bet = state
        .engine
        .place_bet(user.0, input.match_id, Side::Home, input.home_bet)
        .await?;
    Ok((StatusCode::CREATED, Json(hypermedia::render(&bet))))
}

/// POST /bets/away-team
pub async fn place_away_bet(
    State(state): State<SharedState>,
    user: AuthenticatedUser,
    Json(input): Json<AwayBetInput>,
) -> Result<(StatusCode, Json<BetResource>), ApiError> {
    let bet = state
        .engine
        .place_bet(user.0, input.match_id, Side::Away, input.away_bet)
        .await?;
    Ok((StatusCode::CREATED, Json(hypermedia::render(&bet))))
}

/// GET /bets/:bet_id — the canonical location the `self` link points at.
pub async fn get_bet(
    State(state): State<SharedState>,
    Path(bet_id): Path<Uuid>,
) -> Result<Json<BetResource>, ApiError> {
    let bet = state
        .store
        .bet(bet_id)
        .await?
        .ok_or(ApiError::BetNotFound(bet_id))?;
    Ok(Json(hypermedia::render(&bet)))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    use crate::api::AppState;
    use crate::engine::{BetPlacementEngine, BetPolicy};
    use crate::store::{EntityStore, MemoryStore};
    use crate::types::{Match, MatchStatus, Team};

    async fn state_with_match() -> (SharedState, Match) {
        let store = Arc::new(MemoryStore::new());
        let home = Team::new("Bayern");
        let away = Team::new("Dortmund");
        store.add_team(home.clone()).await.unwrap();
        store.add_team(away.clone()).await.unwrap();
        let m = Match::schedule(home.id, away.id, Utc::now()).unwrap();
        store.add_match(m.clone()).await.unwrap();

        let engine = BetPlacementEngine::new(store.clone(), BetPolicy::default());
        (Arc::new(AppState { engine, store }), m)
    }

    #[tokio::test]
    async fn test_place_home_bet_created_with_self_link() {
        let (state, m) = state_with_match().await;
        let user = AuthenticatedUser(Uuid::new_v4());

        let (status, Json(resource)) = place_home_bet(
            State(state),
            user,
            Json(HomeBetInput {
                match_id: m.id,
                home_bet: dec!(10.00),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resource.match_id, m.id);
        assert_eq!(resource.user_id, user.0);
        assert_eq!(resource.side, Side::Home);
        assert_eq!(resource.amount, dec!(10.00));
        assert_eq!(resource.links.names(), vec!["self"]);
    }

    #[tokio::test]
    async fn test_place_away_bet_created() {
        let (state, m) = state_with_match().await;

        let (status, Json(resource)) = place_away_bet(
            State(state),
            AuthenticatedUser(Uuid::new_v4()),
            Json(AwayBetInput {
                match_id: m.id,
                away_bet: dec!(3.50),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resource.side, Side::Away);
        assert_eq!(resource.amount, dec!(3.50));
    }

    #[tokio::test]
    async fn test_get_bet_returns_same_resource() {
        let (state, m) = state_with_match().await;
        let (_, Json(created)) = place_home_bet(
            State(state.clone()),
            AuthenticatedUser(Uuid::new_v4()),
            Json(HomeBetInput {
                match_id: m.id,
                home_bet: dec!(2),
            }),
        )
        .await
        .unwrap();

        let Json(fetched) = get_bet(State(state), Path(created.id)).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.links, created.links);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let (state, m) = state_with_match().await;

        // invalid stake → 400
        let err = place_home_bet(
            State(state.clone()),
            AuthenticatedUser(Uuid::new_v4()),
            Json(HomeBetInput {
                match_id: m.id,
                home_bet: dec!(-5),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        // unknown match → 404
        let err = place_home_bet(
            State(state.clone()),
            AuthenticatedUser(Uuid::new_v4()),
            Json(HomeBetInput {
                match_id: Uuid::new_v4(),
                home_bet: dec!(5),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        // finished match → 409
        state
            .store
            .set_match_status(m.id, MatchStatus::Finished)
            .await
            .unwrap();
        let err = place_away_bet(
            State(state),
            AuthenticatedUser(Uuid::new_v4()),
            Json(AwayBetInput {
                match_id: m.id,
                away_bet: dec!(5),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_duplicate_bet_maps_to_conflict() {
        let (state, m) = state_with_match().await;
        let user = AuthenticatedUser(Uuid::new_v4());

        place_home_bet(
            State(state.clone()),
            user,
            Json(HomeBetInput {
                match_id: m.id,
                home_bet: dec!(1),
            }),
        )
        .await
        .unwrap();

        let err = place_home_bet(
            State(state),
            user,
            Json(HomeBetInput {
                match_id: m.id,
                home_bet: dec!(1),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_error_body_serializes() {
        let body = ErrorBody {
            error: "match_not_found",
            message: "match abc not found".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("match_not_found"));
    }
}
