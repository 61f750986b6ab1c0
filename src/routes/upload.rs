use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, UploadResponse};
use crate::table::Table;
use crate::types::{AppError, AppResult};

/// Extensions accepted before the loader ever sees the bytes.
const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "xlsx"];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(upload_file))
        .with_state(state)
}

/// Multipart upload with a `file` part and an optional `session_id` text
/// part. Without a session id a fresh session is created; with one, the
/// session's table is replaced wholesale. A failed parse never touches the
/// session, so the previous table (if any) stays intact.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut session_id: Option<Uuid> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("session_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| AppError::InvalidInput(format!("bad session id '{}'", text)))?;
                session_id = Some(id);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|f| f.to_string())
                    .ok_or_else(|| AppError::InvalidInput("file part has no filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                file = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, bytes) = file
        .ok_or_else(|| AppError::InvalidInput("missing 'file' part".to_string()))?;

    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => {
            return Err(AppError::UploadFormat(format!(
                "'{}' has no file extension",
                filename
            )))
        }
    };
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::UploadFormat(format!(".{}", extension)));
    }

    info!(%filename, size = bytes.len(), "File upload received");
    let table = Table::parse(&bytes, &extension)?;
    let rows = table.row_count();
    let columns = table.column_names();

    let session_id = match session_id {
        Some(id) => {
            if !state.sessions.exists(id).await {
                return Err(AppError::NotFound(format!("session {}", id)));
            }
            id
        }
        None => state.sessions.create().await,
    };
    state
        .sessions
        .with_session(session_id, |s| s.load_table(table))
        .await?;

    info!(%session_id, rows, "File uploaded successfully");
    Ok(Json(UploadResponse { session_id, filename, rows, columns }))
}
