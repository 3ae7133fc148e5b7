//! View-state mirror of the history store.
//!
//! Every operation catches its own failure, logs it, and records a message
//! in [`HistorySession::error`]; callers never see an `Err`.

use crate::error::Result;
use crate::history::{
    build_record, HistoryStatistics, HistoryStore, SearchHistoryRecord, SearchSessionSummary,
    DEFAULT_HISTORY_LIMIT,
};
use crate::message::Message;
use chrono::Utc;
use serde_json::Value;

pub struct HistorySession {
    store: HistoryStore,
    history: Vec<SearchSessionSummary>,
    statistics: Option<HistoryStatistics>,
    is_loading: bool,
    error: Option<String>,
    limit: i64,
}

impl HistorySession {
    /// Wrap a store and load the first page and statistics right away.
    pub fn open(store: HistoryStore, limit: i64) -> Self {
        let mut session = Self {
            store,
            history: Vec::new(),
            statistics: None,
            is_loading: false,
            error: None,
            limit: if limit > 0 { limit } else { DEFAULT_HISTORY_LIMIT },
        };
        session.refresh();
        session
    }

    pub fn history(&self) -> &[SearchSessionSummary] {
        &self.history
    }

    pub fn statistics(&self) -> Option<HistoryStatistics> {
        self.statistics
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn record_failure(&mut self, action: &str, err: impl std::fmt::Display) {
        tracing::error!(error = %err, "Failed to {}", action);
        self.error = Some(format!("Failed to {}: {}", action, err));
    }

    /// Persist a finished conversation. Returns the saved id, if any.
    pub fn save_search(
        &mut self,
        messages: &[Message],
        effort_level: &str,
        model_used: &str,
        sources: Vec<Value>,
    ) -> Option<String> {
        self.error = None;
        let Some(record) = build_record(messages, effort_level, model_used, sources, Utc::now())
        else {
            tracing::debug!(
                messages = messages.len(),
                "conversation not in a savable state, skipping"
            );
            return None;
        };

        match self.store.save(&record) {
            Ok(()) => {
                self.refresh();
                Some(record.id)
            }
            Err(err) => {
                self.record_failure("save search", err);
                None
            }
        }
    }

    pub fn load_history(&mut self, limit: i64) {
        self.error = None;
        self.fetch_history(limit);
    }

    /// Reload list and statistics, keeping whichever failure came first.
    fn refresh(&mut self) {
        self.fetch_history(self.limit);
        let first_error = self.error.take();
        self.fetch_statistics();
        if first_error.is_some() {
            self.error = first_error;
        }
    }

    fn fetch_history(&mut self, limit: i64) {
        self.is_loading = true;
        match self.store.list(limit) {
            Ok(history) => self.history = history,
            Err(err) => self.record_failure("load history", err),
        }
        self.is_loading = false;
    }

    fn fetch_statistics(&mut self) {
        if let Some(stats) = self.catch("load statistics", HistoryStore::statistics) {
            self.statistics = Some(stats);
        }
    }

    /// Search without touching the mirrored list.
    pub fn search_history(&mut self, term: &str) -> Vec<SearchSessionSummary> {
        self.error = None;
        self.catch("search history", |store| store.search(term))
            .unwrap_or_default()
    }

    pub fn get_search_detail(&mut self, id: &str) -> Option<SearchHistoryRecord> {
        self.error = None;
        self.catch("get search detail", |store| store.get(id))
            .flatten()
    }

    pub fn delete_search(&mut self, id: &str) {
        self.error = None;
        if self.catch("delete search", |store| store.delete(id)).is_some() {
            self.history.retain(|item| item.id != id);
        }
    }

    pub fn clear_all_history(&mut self) {
        self.error = None;
        if self.catch("clear history", HistoryStore::clear).is_some() {
            self.history.clear();
            self.statistics = None;
        }
    }

    pub fn load_statistics(&mut self) {
        self.error = None;
        self.fetch_statistics();
    }

    fn catch<T>(&mut self, action: &str, op: impl FnOnce(&HistoryStore) -> Result<T>) -> Option<T> {
        match op(&self.store) {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_failure(action, err);
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &HistoryStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(answer: &str, id: &str) -> Vec<Message> {
        vec![Message::human("example.com を調べて", "1"), Message::ai(answer, id)]
    }

    #[test]
    fn test_open_loads_existing_history() {
        let store = HistoryStore::open_in_memory().unwrap();
        let record = build_record(&conversation("a", "pre"), "low", "m", vec![], Utc::now()).unwrap();
        store.save(&record).unwrap();

        let session = HistorySession::open(store, 50);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.statistics().unwrap().total_searches, 1);
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }

    #[test]
    fn test_save_refreshes_list_and_stats() {
        let mut session = HistorySession::open(HistoryStore::open_in_memory().unwrap(), 50);
        let id = session.save_search(
            &conversation("### example.com\n技術分析結果", "ai-1"),
            "medium",
            "gemini-2.0-flash",
            Vec::new(),
        );
        assert_eq!(id.as_deref(), Some("ai-1"));
        assert_eq!(session.history()[0].domains, vec!["example.com"]);
        let stats = session.statistics().unwrap();
        assert_eq!(stats.total_searches, 1);
        assert_eq!(stats.domain_analyses, 1);
        assert_eq!(stats.recent_searches, 1);
    }

    #[test]
    fn test_save_skips_incomplete_conversation() {
        let mut session = HistorySession::open(HistoryStore::open_in_memory().unwrap(), 50);
        let id = session.save_search(&[Message::human("q", "1")], "low", "m", Vec::new());
        assert!(id.is_none());
        assert!(session.history().is_empty());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_delete_and_clear_update_local_state() {
        let mut session = HistorySession::open(HistoryStore::open_in_memory().unwrap(), 50);
        session.save_search(&conversation("a", "one"), "low", "m", Vec::new());
        session.save_search(&conversation("b", "two"), "low", "m", Vec::new());
        assert_eq!(session.history().len(), 2);

        session.delete_search("one");
        assert_eq!(session.history().len(), 1);
        assert!(session.get_search_detail("one").is_none());
        assert!(session.get_search_detail("two").is_some());

        session.clear_all_history();
        assert!(session.history().is_empty());
        assert!(session.statistics().is_none());
        assert!(session.store().list(50).unwrap().is_empty());
    }

    #[test]
    fn test_failures_become_error_messages() {
        let mut session = HistorySession::open(HistoryStore::open_in_memory().unwrap(), 50);
        session
            .store()
            .conn_for_tests()
            .execute("DROP TABLE search_history", [])
            .unwrap();

        let results = session.search_history("example");
        assert!(results.is_empty());
        let message = session.error().unwrap().to_string();
        assert!(message.starts_with("Failed to search history"));

        session.load_history(10);
        assert!(session.error().unwrap().starts_with("Failed to load history"));

        session.dismiss_error();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_list_failure_survives_statistics_refresh() {
        let store = HistoryStore::open_in_memory().unwrap();
        // Statistics only read these columns; listing needs the full row
        store
            .conn_for_tests()
            .execute_batch(
                "DROP TABLE search_history;
                 CREATE TABLE search_history (
                     id TEXT PRIMARY KEY,
                     domain_analysis BOOLEAN,
                     timestamp TEXT
                 );",
            )
            .unwrap();

        let session = HistorySession::open(store, 50);
        assert!(session.history().is_empty());
        assert_eq!(session.statistics(), Some(HistoryStatistics::default()));
        assert!(session
            .error()
            .unwrap()
            .starts_with("Failed to load history"));
    }
}
