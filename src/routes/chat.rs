use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::llm::{QueryEngine, QueryOptions};
use crate::models::{AppState, AskRequest, AskResponse, HistoryQuery, HistoryResponse};
use crate::session::ChatTurn;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/history", get(history))
        .with_state(state)
}

/// One model call per press of "Ask". An empty prompt or an empty model
/// answer is a warning and leaves the transcript untouched; only a real
/// answer becomes a turn.
async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> AppResult<Json<AskResponse>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Ok(Json(AskResponse::Warning {
            warning: "Please enter a question.".to_string(),
        }));
    }

    let table = state
        .sessions
        .table_snapshot(request.session_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidInput("Upload a file to start chatting with AI.".to_string())
        })?;

    info!(session_id = %request.session_id, prompt, "Ask received");

    // The model call happens outside the session lock.
    let engine = QueryEngine::new(
        table,
        QueryOptions::from(&state.config.query),
        state.adapter.clone(),
        state.query_cache.clone(),
    );
    let answer = engine.ask(prompt).await?;

    if answer.trim().is_empty() {
        return Ok(Json(AskResponse::Warning {
            warning: "No valid response received from the AI.".to_string(),
        }));
    }

    state
        .sessions
        .with_session(request.session_id, |s| s.append_chat_turn(prompt, &answer))
        .await??;

    Ok(Json(AskResponse::Answered {
        turn: ChatTurn { question: prompt.to_string(), response: answer },
    }))
}

/// Full transcript, newest turn first.
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let turns = state
        .sessions
        .read_session(query.session_id, |s| s.history_newest_first())
        .await?;
    Ok(Json(HistoryResponse { turns }))
}
