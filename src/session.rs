//! Per-session mutable state: the currently loaded table and the ordered
//! chat transcript. One [`SessionState`] per browsing session, isolated from
//! every other session through the registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::table::Table;
use crate::types::{AppError, AppResult};

/// One question/answer exchange. Immutable once appended.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub response: String,
}

#[derive(Debug, Default)]
pub struct SessionState {
    table: Option<Table>,
    chat_history: Vec<ChatTurn>,
}

impl SessionState {
    /// Wholesale table replacement. Deliberately leaves the transcript alone,
    /// so Q&A survives re-uploads.
    pub fn load_table(&mut self, table: Table) {
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Append-only; there is no edit or delete. Callers reject empty prompts
    /// before asking the model, this guards the invariant at the state layer.
    pub fn append_chat_turn(&mut self, question: &str, response: &str) -> AppResult<()> {
        if question.trim().is_empty() {
            return Err(AppError::InvalidInput("question must not be empty".to_string()));
        }
        self.chat_history.push(ChatTurn {
            question: question.to_string(),
            response: response.to_string(),
        });
        Ok(())
    }

    /// Fresh snapshot, newest turn first. Later appends are not reflected in
    /// a snapshot already taken.
    pub fn history_newest_first(&self) -> Vec<ChatTurn> {
        self.chat_history.iter().rev().cloned().collect()
    }

    pub fn turn_count(&self) -> usize {
        self.chat_history.len()
    }
}

/// Registry of all live sessions, keyed by session id. Sessions are created
/// on first touch and dropped wholesale on `remove`; nothing persists.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionState>>>,
}

impl SessionRegistry {
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut guard = self.inner.write().await;
        guard.insert(id, SessionState::default());
        id
    }

    pub async fn exists(&self, id: Uuid) -> bool {
        let guard = self.inner.read().await;
        guard.contains_key(&id)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut guard = self.inner.write().await;
        guard.remove(&id).is_some()
    }

    /// Run a closure against one session's state under the write lock. The
    /// lock is never held across an await, so a slow model call for one
    /// session cannot stall another.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState) -> T,
    ) -> AppResult<T> {
        let mut guard = self.inner.write().await;
        let state = guard
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        Ok(f(state))
    }

    /// Read-only access under the shared lock; transcript reads don't
    /// serialize against uploads or asks in other sessions.
    pub async fn read_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&SessionState) -> T,
    ) -> AppResult<T> {
        let guard = self.inner.read().await;
        let state = guard
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        Ok(f(state))
    }

    /// Clone of the session's current table, if any.
    pub async fn table_snapshot(&self, id: Uuid) -> AppResult<Option<Table>> {
        let guard = self.inner.read().await;
        let state = guard
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        Ok(state.table().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_table() -> Table {
        Table::parse(b"Date,Sales\n2024-01-01,100\n2024-01-02,250\n", "csv").unwrap()
    }

    #[test]
    fn test_append_is_monotonic_and_reversed() {
        let mut state = SessionState::default();
        for i in 0..5 {
            state
                .append_chat_turn(&format!("q{}", i), &format!("a{}", i))
                .unwrap();
        }
        let history = state.history_newest_first();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].question, "q4");
        assert_eq!(history[4].question, "q0");
    }

    #[test]
    fn test_empty_question_rejected() {
        let mut state = SessionState::default();
        assert!(state.append_chat_turn("", "answer").is_err());
        assert!(state.append_chat_turn("   ", "answer").is_err());
        assert_eq!(state.turn_count(), 0);
    }

    #[test]
    fn test_snapshot_is_not_a_live_cursor() {
        let mut state = SessionState::default();
        state.append_chat_turn("first", "1").unwrap();
        let snapshot = state.history_newest_first();
        state.append_chat_turn("second", "2").unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(state.history_newest_first().len(), 2);
    }

    #[test]
    fn test_reload_preserves_history() {
        let mut state = SessionState::default();
        state.load_table(sales_table());
        state.append_chat_turn("total?", "350").unwrap();
        state.load_table(sales_table());
        assert_eq!(state.turn_count(), 1);
        assert!(state.has_table());
    }

    #[test]
    fn test_has_table_transitions() {
        let mut state = SessionState::default();
        assert!(!state.has_table());
        state.load_table(sales_table());
        assert!(state.has_table());
    }

    #[tokio::test]
    async fn test_registry_isolates_sessions() {
        let registry = SessionRegistry::default();
        let a = registry.create().await;
        let b = registry.create().await;

        registry
            .with_session(a, |s| s.append_chat_turn("only in a", "yes").unwrap())
            .await
            .unwrap();

        let a_turns = registry.with_session(a, |s| s.turn_count()).await.unwrap();
        let b_turns = registry.with_session(b, |s| s.turn_count()).await.unwrap();
        assert_eq!(a_turns, 1);
        assert_eq!(b_turns, 0);
    }

    #[tokio::test]
    async fn test_read_session_sees_current_state() {
        let registry = SessionRegistry::default();
        let id = registry.create().await;
        registry
            .with_session(id, |s| {
                s.load_table(sales_table());
                s.append_chat_turn("total?", "350").unwrap();
            })
            .await
            .unwrap();

        let (has_table, turns) = registry
            .read_session(id, |s| (s.has_table(), s.history_newest_first()))
            .await
            .unwrap();
        assert!(has_table);
        assert_eq!(turns.len(), 1);

        let missing = registry.read_session(Uuid::new_v4(), |_| ()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_registry_remove_discards_state() {
        let registry = SessionRegistry::default();
        let id = registry.create().await;
        assert!(registry.exists(id).await);
        assert!(registry.remove(id).await);
        assert!(!registry.exists(id).await);
        assert!(registry.with_session(id, |_| ()).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let registry = SessionRegistry::default();
        let result = registry.table_snapshot(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
