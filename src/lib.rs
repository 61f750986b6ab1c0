// Tabular Chat - upload a CSV/XLSX, chart its columns, and chat with the data
// through a locally hosted LLM

pub mod config;
pub mod types;
pub mod table;
pub mod chart;
pub mod session;
pub mod llm;
pub mod models;
pub mod routes;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
