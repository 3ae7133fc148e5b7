//! Maps agent node updates onto human-readable progress entries.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub title: String,
    pub data: String,
}

impl ProcessedEvent {
    fn new(title: &str, data: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            data: data.into(),
        }
    }
}

const FINALIZE_NODES: &[&str] = &["finalize_domain_answer", "finalize_answer"];

/// Translate one `updates` payload. Only the first recognised node counts.
pub fn process_update(update: &Value) -> Option<ProcessedEvent> {
    if let Some(node) = node_payload(update, "extract_domains") {
        let count = array_len(node, "domains_to_analyze")
            .filter(|n| *n > 0)
            .or_else(|| array_len(node, "domains"))
            .unwrap_or(0);
        return Some(ProcessedEvent::new(
            "Extracting Domains",
            format!("Found {} domains to analyze", count),
        ));
    }
    if node_payload(update, "domain_analysis").is_some() {
        return Some(ProcessedEvent::new(
            "Domain Analysis",
            "Performing comprehensive domain analysis including security, performance, and availability checks",
        ));
    }
    if node_payload(update, "finalize_domain_answer").is_some() {
        return Some(ProcessedEvent::new(
            "Finalizing Domain Report",
            "Compiling domain analysis results and recommendations",
        ));
    }
    if let Some(node) = node_payload(update, "generate_query") {
        let data = string_list(node, "query_list")
            .map(|queries| queries.join(", "))
            .unwrap_or_else(|| "Preparing search queries...".to_string());
        return Some(ProcessedEvent::new("Generating Search Queries", data));
    }
    if let Some(node) = node_payload(update, "web_research") {
        let sources = node
            .get("sources_gathered")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let labels = sources
            .iter()
            .filter_map(|s| s.get("label").and_then(Value::as_str))
            .filter(|label| !label.is_empty())
            .unique()
            .take(3)
            .join(", ");
        let labels = if labels.is_empty() { "N/A" } else { &labels };
        return Some(ProcessedEvent::new(
            "Web Research",
            format!("Gathered {} sources. Related to: {}.", sources.len(), labels),
        ));
    }
    if let Some(node) = node_payload(update, "reflection") {
        let sufficient = node
            .get("is_sufficient")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let data = if sufficient {
            "Search successful, generating final answer.".to_string()
        } else {
            let topics = string_list(node, "follow_up_queries")
                .map(|queries| queries.join(", "))
                .unwrap_or_else(|| "additional topics".to_string());
            format!("Need more information, searching for {}", topics)
        };
        return Some(ProcessedEvent::new("Reflection", data));
    }
    if node_payload(update, "finalize_answer").is_some() {
        return Some(ProcessedEvent::new(
            "Finalizing Answer",
            "Composing and presenting the final answer.",
        ));
    }
    None
}

/// True when the update marks the end of the agent's work.
pub fn is_finalize_update(update: &Value) -> bool {
    FINALIZE_NODES.iter().any(|name| node_payload(update, name).is_some())
}

/// Payload of a node update; `null` and `false` count as no update.
fn node_payload<'a>(update: &'a Value, name: &str) -> Option<&'a Value> {
    update
        .get(name)
        .filter(|payload| !matches!(payload, Value::Null | Value::Bool(false)))
}

fn array_len(node: &Value, key: &str) -> Option<usize> {
    node.get(key).and_then(Value::as_array).map(Vec::len)
}

fn string_list(node: &Value, key: &str) -> Option<Vec<String>> {
    let items = node.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Live activity log for the run in progress.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<ProcessedEvent>,
    finalized: bool,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an update; returns true when it produced a visible entry.
    pub fn apply(&mut self, update: &Value) -> bool {
        if is_finalize_update(update) {
            self.finalized = true;
        }
        match process_update(update) {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    pub fn events(&self) -> &[ProcessedEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_finalized(&self) -> bool {
        self.finalized
    }

    pub fn clear_finalized(&mut self) {
        self.finalized = false;
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.finalized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_domains_counts() {
        let event = process_update(&json!({
            "extract_domains": {"domains_to_analyze": ["a.com", "b.jp"]}
        }))
        .unwrap();
        assert_eq!(event.title, "Extracting Domains");
        assert_eq!(event.data, "Found 2 domains to analyze");

        let fallback = process_update(&json!({"extract_domains": {"domains": ["a.com"]}})).unwrap();
        assert_eq!(fallback.data, "Found 1 domains to analyze");

        let empty = process_update(&json!({"extract_domains": {}})).unwrap();
        assert_eq!(empty.data, "Found 0 domains to analyze");

        // An empty primary list falls through to `domains`
        let skipped = process_update(&json!({
            "extract_domains": {"domains_to_analyze": [], "domains": ["a.com"]}
        }))
        .unwrap();
        assert_eq!(skipped.data, "Found 1 domains to analyze");
    }

    #[test]
    fn test_null_payloads_are_not_updates() {
        assert!(process_update(&json!({"domain_analysis": null})).is_none());
        assert!(process_update(&json!({"extract_domains": null})).is_none());
        assert!(!is_finalize_update(&json!({"finalize_answer": null})));
        assert!(!is_finalize_update(&json!({"finalize_domain_answer": false})));

        let mut timeline = Timeline::new();
        assert!(!timeline.apply(&json!({"finalize_answer": null})));
        assert!(!timeline.has_finalized());
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_generate_query() {
        let event =
            process_update(&json!({"generate_query": {"query_list": ["whois a.com", "dns a.com"]}}))
                .unwrap();
        assert_eq!(event.data, "whois a.com, dns a.com");

        let pending = process_update(&json!({"generate_query": {"query_list": "oops"}})).unwrap();
        assert_eq!(pending.data, "Preparing search queries...");
    }

    #[test]
    fn test_web_research_labels() {
        let event = process_update(&json!({
            "web_research": {"sources_gathered": [
                {"label": "whois"}, {"label": "whois"}, {"label": ""},
                {"label": "dns"}, {"label": "ssl"}, {"label": "seo"}, {}
            ]}
        }))
        .unwrap();
        assert_eq!(event.data, "Gathered 7 sources. Related to: whois, dns, ssl.");

        let none = process_update(&json!({"web_research": {}})).unwrap();
        assert_eq!(none.data, "Gathered 0 sources. Related to: N/A.");
    }

    #[test]
    fn test_reflection() {
        let done = process_update(&json!({"reflection": {"is_sufficient": true}})).unwrap();
        assert_eq!(done.data, "Search successful, generating final answer.");

        let more = process_update(&json!({
            "reflection": {"is_sufficient": false, "follow_up_queries": ["ssl grade"]}
        }))
        .unwrap();
        assert_eq!(more.data, "Need more information, searching for ssl grade");

        let unknown = process_update(&json!({"reflection": {"is_sufficient": false}})).unwrap();
        assert_eq!(
            unknown.data,
            "Need more information, searching for additional topics"
        );
    }

    #[test]
    fn test_unknown_node_is_ignored() {
        assert!(process_update(&json!({"__interrupt__": {}})).is_none());
        assert!(!is_finalize_update(&json!({"web_research": {}})));
    }

    #[test]
    fn test_timeline_tracks_finalize() {
        let mut timeline = Timeline::new();
        assert!(timeline.apply(&json!({"domain_analysis": {}})));
        assert!(!timeline.has_finalized());
        assert!(timeline.apply(&json!({"finalize_domain_answer": {}})));
        assert!(timeline.has_finalized());
        assert_eq!(timeline.events().len(), 2);
        assert_eq!(timeline.events()[1].title, "Finalizing Domain Report");

        timeline.clear();
        assert!(timeline.is_empty());
        assert!(!timeline.has_finalized());
    }
}
