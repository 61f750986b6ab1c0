//! Query engine: wraps the current table plus options around the adapter so
//! a free-text question arrives at the model with enough context to answer.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::llm::provider::QueryAdapter;
use crate::table::{Table, Value};
use crate::types::{AppError, AppResult};

const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub enable_cache: bool,
    pub verbose: bool,
    pub use_error_correction: bool,
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            enable_cache: config.enable_cache,
            verbose: config.verbose,
            use_error_correction: config.use_error_correction,
        }
    }
}

/// Answer cache shared across asks, keyed by (table fingerprint, prompt) so
/// an answer computed against one table is never served for another. Only
/// consulted when `enable_cache` is set.
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<RwLock<HashMap<(u64, String), String>>>,
}

impl QueryCache {
    pub async fn get(&self, table_id: u64, prompt: &str) -> Option<String> {
        let guard = self.inner.read().await;
        guard.get(&(table_id, prompt.to_string())).cloned()
    }

    pub async fn insert(&self, table_id: u64, prompt: &str, answer: &str) {
        let mut guard = self.inner.write().await;
        guard.insert((table_id, prompt.to_string()), answer.to_string());
    }
}

pub struct QueryEngine {
    table: Table,
    table_id: u64,
    options: QueryOptions,
    adapter: Arc<dyn QueryAdapter>,
    cache: QueryCache,
}

impl QueryEngine {
    pub fn new(
        table: Table,
        options: QueryOptions,
        adapter: Arc<dyn QueryAdapter>,
        cache: QueryCache,
    ) -> Self {
        let table_id = table.fingerprint();
        Self { table, table_id, options, adapter, cache }
    }

    /// One adapter call per ask, plus a single corrective retry when
    /// `use_error_correction` is on. An empty model answer is returned as-is;
    /// deciding that it warrants a warning is the controller's job.
    pub async fn ask(&self, prompt: &str) -> AppResult<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("prompt must not be empty".to_string()));
        }

        if self.options.enable_cache {
            if let Some(cached) = self.cache.get(self.table_id, prompt).await {
                if self.options.verbose {
                    debug!(prompt, "Answering from cache");
                }
                return Ok(cached);
            }
        }

        let system = self.system_prompt();
        if self.options.verbose {
            debug!(prompt, rows = self.table.row_count(), "Asking model about table");
        }

        let answer = match self.adapter.complete(&system, prompt).await {
            Ok(answer) => answer,
            Err(first) if self.options.use_error_correction => {
                warn!("Model call failed, retrying once: {}", first);
                self.adapter.complete(&system, prompt).await?
            }
            Err(err) => return Err(err),
        };

        if self.options.verbose {
            debug!(answer_len = answer.len(), "Model answered");
        }
        if self.options.enable_cache && !answer.is_empty() {
            self.cache.insert(self.table_id, prompt, &answer).await;
        }

        Ok(answer)
    }

    fn system_prompt(&self) -> String {
        let mut schema = String::new();
        for name in self.table.column_names() {
            let kind = match self.table.column(&name) {
                Some(column) if is_numeric(&column.values) => "numeric",
                _ => "text",
            };
            schema.push_str(&format!("- {} ({})\n", name, kind));
        }

        let mut sample = self.table.column_names().join(", ");
        for row in self.table.sample_rows(SAMPLE_ROWS) {
            sample.push('\n');
            sample.push_str(&row.join(", "));
        }

        format!(
            "You are a data analyst. Answer the user's question using only the \
             table below.\n\nColumns:\n{}\nRow count: {}\n\nFirst rows:\n{}\n\n\
             Answer concisely. If the table cannot answer the question, say so.",
            schema,
            self.table.row_count(),
            sample
        )
    }
}

fn is_numeric(values: &[Value]) -> bool {
    let mut seen = false;
    for value in values {
        match value {
            Value::Number(_) => seen = true,
            Value::Text(s) if s.is_empty() => {}
            Value::Text(_) => return false,
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAdapter {
        answers: Vec<AppResult<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn new(answers: Vec<AppResult<String>>) -> Self {
            Self { answers, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryAdapter for ScriptedAdapter {
        async fn complete(&self, _system: &str, _prompt: &str) -> AppResult<String> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.get(idx) {
                Some(Ok(answer)) => Ok(answer.clone()),
                Some(Err(AppError::Query(message))) => Err(AppError::Query(message.clone())),
                _ => Err(AppError::Query("no scripted answer".to_string())),
            }
        }
    }

    fn sales_table() -> Table {
        Table::parse(b"Date,Sales\n2024-01-01,100\n2024-01-02,250\n2024-01-03,80\n", "csv")
            .unwrap()
    }

    fn options(enable_cache: bool, use_error_correction: bool) -> QueryOptions {
        QueryOptions { enable_cache, verbose: false, use_error_correction }
    }

    fn engine(adapter: Arc<ScriptedAdapter>, opts: QueryOptions) -> QueryEngine {
        QueryEngine::new(sales_table(), opts, adapter, QueryCache::default())
    }

    #[tokio::test]
    async fn test_ask_returns_answer() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![Ok("1234".to_string())]));
        let engine = engine(adapter.clone(), options(false, false));
        let answer = engine.ask("What is the total sales?").await.unwrap();
        assert_eq!(answer, "1234");
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_prompt_never_reaches_adapter() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![Ok("unused".to_string())]));
        let engine = engine(adapter.clone(), options(false, false));
        assert!(engine.ask("   ").await.is_err());
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_adapter() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![Ok("350".to_string())]));
        let engine = engine(adapter.clone(), options(true, false));
        assert_eq!(engine.ask("sum of sales").await.unwrap(), "350");
        assert_eq!(engine.ask("sum of sales").await.unwrap(), "350");
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_scoped_to_table_content() {
        let cache = QueryCache::default();
        let table_a = Table::parse(b"Date,Sales\n2024-01-01,100\n", "csv").unwrap();
        let table_b = Table::parse(b"Date,Sales\n2024-01-01,999\n", "csv").unwrap();

        let adapter_a = Arc::new(ScriptedAdapter::new(vec![Ok("100".to_string())]));
        let engine_a = QueryEngine::new(
            table_a,
            options(true, false),
            adapter_a.clone(),
            cache.clone(),
        );
        assert_eq!(engine_a.ask("What is the total sales?").await.unwrap(), "100");

        // Same prompt against different data must reach the adapter, not the
        // cached answer for the other table.
        let adapter_b = Arc::new(ScriptedAdapter::new(vec![Ok("999".to_string())]));
        let engine_b = QueryEngine::new(
            table_b,
            options(true, false),
            adapter_b.clone(),
            cache.clone(),
        );
        assert_eq!(engine_b.ask("What is the total sales?").await.unwrap(), "999");
        assert_eq!(adapter_b.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_survives_engine_rebuild_for_same_table() {
        let cache = QueryCache::default();
        let adapter = Arc::new(ScriptedAdapter::new(vec![Ok("350".to_string())]));

        let first = QueryEngine::new(
            sales_table(),
            options(true, false),
            adapter.clone(),
            cache.clone(),
        );
        assert_eq!(first.ask("sum of sales").await.unwrap(), "350");

        // A new engine over identical data hits the shared cache.
        let second = QueryEngine::new(
            sales_table(),
            options(true, false),
            adapter.clone(),
            cache.clone(),
        );
        assert_eq!(second.ask("sum of sales").await.unwrap(), "350");
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_error_correction_retries_once() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![
            Err(AppError::Query("transient".to_string())),
            Ok("recovered".to_string()),
        ]));
        let engine = engine(adapter.clone(), options(false, true));
        assert_eq!(engine.ask("avg sales").await.unwrap(), "recovered");
        assert_eq!(adapter.calls(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_without_error_correction() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![
            Err(AppError::Query("down".to_string())),
            Ok("unreachable".to_string()),
        ]));
        let engine = engine(adapter.clone(), options(false, false));
        assert!(engine.ask("avg sales").await.is_err());
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_failure_propagates() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![
            Err(AppError::Query("down".to_string())),
            Err(AppError::Query("still down".to_string())),
        ]));
        let engine = engine(adapter.clone(), options(false, true));
        let err = engine.ask("avg sales").await.unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
        assert_eq!(adapter.calls(), 2);
    }

    #[test]
    fn test_system_prompt_describes_table() {
        let adapter = Arc::new(ScriptedAdapter::new(vec![]));
        let engine = engine(adapter, options(false, false));
        let prompt = engine.system_prompt();
        assert!(prompt.contains("- Date (text)"));
        assert!(prompt.contains("- Sales (numeric)"));
        assert!(prompt.contains("Row count: 3"));
        assert!(prompt.contains("2024-01-01, 100"));
    }
}
