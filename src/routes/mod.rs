//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/upload` - CSV/XLSX upload
//! - `/api/chart` - Chart selection and PNG rendering
//! - `/api/ask`, `/api/history` - Chat with the data
//! - `/api/session` - Session lifecycle
//! - `/api/health` - Health check
//! - `/` - The single-page UI

pub mod chart;
pub mod chat;
pub mod health;
pub mod session;
pub mod ui;
pub mod upload;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::AppState;

/// Create the main application router. API routes take precedence over the
/// UI page at `/`.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins: Vec<HeaderValue> = state
        .config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_router = Router::new()
        .merge(upload::router(state.clone()))
        .merge(chart::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(session::router(state))
        .merge(health::router());

    Router::new()
        .merge(api_router)
        .merge(ui::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
