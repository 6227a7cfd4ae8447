pub mod catalog;
pub mod search;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use crate::auth::extract_token;
use crate::state::{AppState, HealthResponse};
use crate::utils::json_error_response;

pub fn api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/search", get(search::search))
        .route("/catalog", get(catalog::status))
        .route("/catalog/rebuild", post(catalog::rebuild))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

async fn require_auth(
    State(state): State<AppState>,
    req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(req.headers()).unwrap_or_default();
    if state.authorizer.is_authorized(&token) {
        next.run(req).await
    } else {
        json_error_response(StatusCode::UNAUTHORIZED, "unauthorized")
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
