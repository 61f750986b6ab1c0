use async_trait::async_trait;

use crate::types::AppResult;

/// Boundary to the language model. One call per triggering event; retry
/// policy lives above this seam, in the query engine.
#[async_trait]
pub trait QueryAdapter: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> AppResult<String>;
}
