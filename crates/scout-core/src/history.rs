//! Local search-history store.
//!
//! Finished conversations are kept in an embedded SQLite database. Records
//! are immutable once written: there is save, read and delete, no update.

use crate::domain::{extract_domains_from_response, is_domain_analysis};
use crate::error::Result;
use crate::message::Message;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
const SEARCH_LIMIT: i64 = 50;
const RECENT_WINDOW_DAYS: i64 = 7;
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryRecord {
    pub id: String,
    pub query: String,
    pub timestamp: String,
    pub response: String,
    pub domain_analysis: bool,
    pub domains: Vec<String>,
    pub analysis_results: Vec<Value>,
    pub effort_level: String,
    pub model_used: String,
    #[serde(default)]
    pub sources: Vec<Value>,
}

/// List projection of a record, without the full response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSessionSummary {
    pub id: String,
    pub query: String,
    pub timestamp: String,
    pub response_preview: String,
    pub domain_analysis: bool,
    pub domains: Vec<String>,
    pub effort_level: String,
    pub model_used: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryStatistics {
    pub total_searches: u64,
    pub domain_analyses: u64,
    pub recent_searches: u64,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build the record for a finished conversation.
///
/// Returns `None` unless there are at least two messages, one of them from
/// the user, and the last one is the agent's answer.
pub fn build_record(
    messages: &[Message],
    effort_level: &str,
    model_used: &str,
    sources: Vec<Value>,
    now: DateTime<Utc>,
) -> Option<SearchHistoryRecord> {
    if messages.len() < 2 {
        return None;
    }
    let user = messages.iter().find(|m| m.is_human())?;
    let answer = messages.last().filter(|m| m.is_ai())?;

    let response = answer.content.clone();
    let domains = extract_domains_from_response(&response);
    let domain_analysis = is_domain_analysis(&response);

    Some(SearchHistoryRecord {
        id: answer
            .id
            .clone()
            .unwrap_or_else(|| format!("search_{}", now.timestamp_millis())),
        query: user.content.clone(),
        timestamp: format_timestamp(now),
        response,
        domain_analysis,
        domains,
        analysis_results: Vec::new(),
        effort_level: effort_level.to_string(),
        model_used: model_used.to_string(),
        sources,
    })
}

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened history store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS search_history (
                id TEXT PRIMARY KEY,
                query TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                response TEXT NOT NULL,
                domain_analysis INTEGER NOT NULL DEFAULT 0,
                domains TEXT NOT NULL DEFAULT '[]',
                analysis_results TEXT NOT NULL DEFAULT '[]',
                effort_level TEXT NOT NULL,
                model_used TEXT NOT NULL,
                sources TEXT NOT NULL DEFAULT '[]'
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_search_history_timestamp ON search_history(timestamp)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Insert a record, replacing any row with the same id.
    pub fn save(&self, record: &SearchHistoryRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO search_history
                (id, query, timestamp, response, domain_analysis, domains,
                 analysis_results, effort_level, model_used, sources)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.query,
                record.timestamp,
                record.response,
                record.domain_analysis,
                serde_json::to_string(&record.domains)?,
                serde_json::to_string(&record.analysis_results)?,
                record.effort_level,
                record.model_used,
                serde_json::to_string(&record.sources)?,
            ],
        )?;
        tracing::info!(id = %record.id, domains = record.domains.len(), "saved search");
        Ok(())
    }

    /// Newest first. A non-positive limit falls back to the default.
    pub fn list(&self, limit: i64) -> Result<Vec<SearchSessionSummary>> {
        let limit = if limit > 0 { limit } else { DEFAULT_HISTORY_LIMIT };
        let mut stmt = self.conn.prepare(
            "SELECT id, query, timestamp, response, domain_analysis, domains, effort_level, model_used
             FROM search_history
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], summary_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Case-insensitive substring match over query and response text.
    pub fn search(&self, term: &str) -> Result<Vec<SearchSessionSummary>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list(SEARCH_LIMIT);
        }
        let pattern = format!("%{}%", escape_like(term));
        let mut stmt = self.conn.prepare(
            "SELECT id, query, timestamp, response, domain_analysis, domains, effort_level, model_used
             FROM search_history
             WHERE query LIKE ?1 ESCAPE '\\' OR response LIKE ?1 ESCAPE '\\'
             ORDER BY timestamp DESC, rowid DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, SEARCH_LIMIT], summary_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get(&self, id: &str) -> Result<Option<SearchHistoryRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, query, timestamp, response, domain_analysis, domains,
                        analysis_results, effort_level, model_used, sources
                 FROM search_history WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Returns whether a row was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM search_history WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    pub fn clear(&self) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM search_history", [])?;
        tracing::info!(removed, "cleared search history");
        Ok(())
    }

    pub fn statistics(&self) -> Result<HistoryStatistics> {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> Result<HistoryStatistics> {
        let cutoff = format_timestamp(now - Duration::days(RECENT_WINDOW_DAYS));
        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN domain_analysis THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN timestamp >= ?1 THEN 1 ELSE 0 END), 0)
             FROM search_history",
            params![cutoff],
            |row| {
                Ok(HistoryStatistics {
                    total_searches: row.get::<_, i64>(0)? as u64,
                    domain_analyses: row.get::<_, i64>(1)? as u64,
                    recent_searches: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;
        Ok(stats)
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn json_column<T: serde::de::DeserializeOwned + Default>(row: &Row, index: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
        tracing::warn!(column = index, error = %err, "corrupt JSON column, using default");
        T::default()
    }))
}

fn summary_from_row(row: &Row) -> rusqlite::Result<SearchSessionSummary> {
    let response: String = row.get(3)?;
    Ok(SearchSessionSummary {
        id: row.get(0)?,
        query: row.get(1)?,
        timestamp: row.get(2)?,
        response_preview: response.chars().take(PREVIEW_CHARS).collect(),
        domain_analysis: row.get(4)?,
        domains: json_column(row, 5)?,
        effort_level: row.get(6)?,
        model_used: row.get(7)?,
    })
}

fn record_from_row(row: &Row) -> rusqlite::Result<SearchHistoryRecord> {
    Ok(SearchHistoryRecord {
        id: row.get(0)?,
        query: row.get(1)?,
        timestamp: row.get(2)?,
        response: row.get(3)?,
        domain_analysis: row.get(4)?,
        domains: json_column(row, 5)?,
        analysis_results: json_column(row, 6)?,
        effort_level: row.get(7)?,
        model_used: row.get(8)?,
        sources: json_column(row, 9)?,
    })
}
