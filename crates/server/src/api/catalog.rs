use axum::{extract::State, http::StatusCode, Json};

use crate::scan::spawn_rebuild;
use crate::state::{AppState, CatalogStatusResponse, JsonResult, RebuildResponse};
use crate::utils::json_error;

pub async fn status(State(state): State<AppState>) -> Json<CatalogStatusResponse> {
    let (library, status) = {
        let guard = state.library_state.read();
        (guard.library.clone(), guard.status.clone())
    };
    let stats = library.as_ref().and_then(|library| library.stats());
    Json(CatalogStatusResponse {
        status: status.label(),
        message: status.message(),
        items: stats.as_ref().map(|stats| stats.items),
        synced_at: stats.as_ref().map(|stats| stats.synced_at),
        rebuilding: library.as_ref().map(|l| l.is_rebuilding()).unwrap_or(false),
        scanned: library.as_ref().map(|l| l.scanned()).unwrap_or(0),
    })
}

pub async fn rebuild(State(state): State<AppState>) -> JsonResult<RebuildResponse> {
    let library = match state.library() {
        Some(library) => library,
        None => {
            let message = state
                .library_state
                .read()
                .status
                .message()
                .unwrap_or_else(|| "music directory must be set".to_string());
            return Err(json_error(StatusCode::SERVICE_UNAVAILABLE, message));
        }
    };
    let started = spawn_rebuild(state, library, "on-demand");
    Ok(Json(RebuildResponse { started }))
}
