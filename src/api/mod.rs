//! HTTP API — Axum router and request plumbing.
//!
//! The transport boundary: routes, shared state, CORS, and the
//! authenticated-caller extractor. The acting user's identity is resolved
//! here once and passed down the call chain explicitly; no handler or
//! engine code reads ambient request state.

pub mod routes;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::engine::BetPlacementEngine;
use crate::store::EntityStore;

/// Header carrying the authenticated caller's stable user id, set by the
/// authentication collaborator in front of this service. Opaque beyond
/// being a uuid.
pub const USER_ID_HEADER: &str = "x-user-id";

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared by all route handlers.
pub struct AppState {
    pub engine: BetPlacementEngine,
    pub store: Arc<dyn EntityStore>,
}

pub type SharedState = Arc<AppState>;

// ---------------------------------------------------------------------------
// Authenticated caller
// ---------------------------------------------------------------------------

/// The resolved identity of the caller. Extracted once at the boundary;
/// handlers receive it as an explicit argument.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthRejection::Missing)?;
        let user_id = Uuid::parse_str(raw).map_err(|_| AuthRejection::Malformed)?;
        Ok(AuthenticatedUser(user_id))
    }
}

#[derive(Debug)]
pub enum AuthRejection {
    Missing,
    Malformed,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::Missing => "missing caller identity",
            AuthRejection::Malformed => "malformed caller identity",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(routes::ErrorBody {
                error: "unauthenticated",
                message: message.to_string(),
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(USER_ID_HEADER),
        ]);

    Router::new()
        .route("/bets/home-team", post(routes::place_home_bet))
        .route("/bets/away-team", post(routes::place_away_bet))
        .route("/bets/:bet_id", get(routes::get_bet))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
