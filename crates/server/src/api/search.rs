use axum::{
    extract::{Query, State},
    Json,
};
use time::OffsetDateTime;

use crate::search::search_catalog;
use crate::state::{AppState, ItemResponse, SearchParams, SearchResponse};

/// Never fails: without a published catalog the result is simply empty.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let fallback = state.config.read().random_fallback;
    let catalog = state.library().and_then(|library| library.snapshot());
    let catalog = match catalog {
        Some(catalog) => catalog,
        None => {
            return Json(SearchResponse {
                query: params.q,
                items: Vec::new(),
                total: 0,
            })
        }
    };

    let today = OffsetDateTime::now_utc().date();
    let outcome = search_catalog(&catalog, &params.q, fallback, today, &mut rand::rng());
    let items: Vec<ItemResponse> = outcome.items.into_iter().map(ItemResponse::from).collect();
    Json(SearchResponse {
        query: outcome.query,
        total: items.len(),
        items,
    })
}
