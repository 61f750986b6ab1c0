// Shared state and API request/response types

use std::sync::Arc;

use crate::chart::ChartKind;
use crate::config::Config;
use crate::llm::{QueryAdapter, QueryCache};
use crate::session::{ChatTurn, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
    pub adapter: Arc<dyn QueryAdapter>,
    pub query_cache: QueryCache,
}

// API Request/Response types

#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    pub session_id: uuid::Uuid,
    pub filename: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ChartApiRequest {
    pub session_id: uuid::Uuid,
    pub kind: ChartKind,
    pub x_column: String,
    #[serde(default)]
    pub y_columns: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct AskRequest {
    pub session_id: uuid::Uuid,
    pub prompt: String,
}

/// Outcome of an ask: either a fresh transcript turn or a recoverable
/// warning (empty prompt, empty model answer). Hard failures travel as
/// `AppError` instead.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskResponse {
    Answered { turn: ChatTurn },
    Warning { warning: String },
}

#[derive(Debug, serde::Deserialize)]
pub struct HistoryQuery {
    pub session_id: uuid::Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryResponse {
    /// Newest turn first.
    pub turns: Vec<ChatTurn>,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: uuid::Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct SessionInfoResponse {
    pub session_id: uuid::Uuid,
    pub has_table: bool,
    pub turns: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
