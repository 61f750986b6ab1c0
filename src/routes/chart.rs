use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::chart::render::{render_png, RenderOptions};
use crate::chart::{select_chart, ChartRequest, ChartResult};
use crate::models::{AppState, ChartApiRequest};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chart", post(chart_spec))
        .route("/api/chart/png", post(chart_png))
        .with_state(state)
}

async fn resolve(state: &AppState, request: &ChartApiRequest) -> AppResult<ChartResult> {
    let table = state
        .sessions
        .table_snapshot(request.session_id)
        .await?
        .ok_or_else(|| AppError::InvalidInput("no table loaded for this session".to_string()))?;

    let chart_request = ChartRequest {
        kind: request.kind,
        x_column: request.x_column.clone(),
        y_columns: request.y_columns.clone(),
    };
    select_chart(&chart_request, &table)
}

/// Recomputed in full on every option change; there is no incremental state.
async fn chart_spec(
    State(state): State<AppState>,
    Json(request): Json<ChartApiRequest>,
) -> AppResult<Json<ChartResult>> {
    info!(kind = %request.kind, x = %request.x_column, "Chart request");
    let result = resolve(&state, &request).await?;
    Ok(Json(result))
}

async fn chart_png(
    State(state): State<AppState>,
    Json(request): Json<ChartApiRequest>,
) -> AppResult<Response> {
    match resolve(&state, &request).await? {
        ChartResult::Chart(spec) => {
            let png = render_png(&spec, &RenderOptions::default())?;
            Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
        }
        // Validation warnings are guidance, not failures; hand them back as
        // the same JSON `/api/chart` produces so the client can adjust.
        warning @ ChartResult::Warning { .. } => Ok(Json(warning).into_response()),
    }
}
