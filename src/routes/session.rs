use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, SessionCreatedResponse, SessionInfoResponse};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/{id}", get(session_info))
        .route("/api/session/{id}", delete(end_session))
        .with_state(state)
}

async fn create_session(
    State(state): State<AppState>,
) -> Json<SessionCreatedResponse> {
    let session_id = state.sessions.create().await;
    info!(%session_id, "Session created");
    Json(SessionCreatedResponse { session_id })
}

/// Gates the UI: chart and chat sections only show once a table is loaded.
async fn session_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionInfoResponse>> {
    let info = state
        .sessions
        .read_session(id, |s| SessionInfoResponse {
            session_id: id,
            has_table: s.has_table(),
            turns: s.turn_count(),
            columns: s.table().map(|t| t.column_names()).unwrap_or_default(),
        })
        .await?;
    Ok(Json(info))
}

/// Ends the browsing session: table and transcript are discarded together.
async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("session {}", id)));
    }
    info!(%id, "Session ended");
    Ok(Json(serde_json::json!({ "status": "ended" })))
}
