use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
    Tool,
    System,
    #[serde(other)]
    Other,
}

/// A conversation message in the shape the agent server exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(deserialize_with = "content_as_text")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Message {
    pub fn human(content: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Human,
            content: content.into(),
            id: Some(id.into()),
        }
    }

    pub fn ai(content: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Ai,
            content: content.into(),
            id: Some(id.into()),
        }
    }

    pub fn is_ai(&self) -> bool {
        self.kind == MessageKind::Ai
    }

    pub fn is_human(&self) -> bool {
        self.kind == MessageKind::Human
    }
}

// Content may arrive as a plain string or as a list of content blocks.
// Anything that is not a string is kept as its JSON text.
fn content_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Extract the message list from a `values` snapshot of the run state.
pub fn messages_from_state(state: &Value) -> Option<Vec<Message>> {
    let raw = state.get("messages")?.as_array()?;
    Some(
        raw.iter()
            .filter_map(|m| serde_json::from_value::<Message>(m.clone()).ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_roundtrip_shape() {
        let msg = Message::human("example.com を分析して", "1700000000000");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "human");
        assert_eq!(value["content"], "example.com を分析して");
        assert_eq!(value["id"], "1700000000000");
    }

    #[test]
    fn test_non_string_content_is_stringified() {
        let msg: Message = serde_json::from_value(json!({
            "type": "ai",
            "content": [{"type": "text", "text": "hi"}],
            "id": "run-1"
        }))
        .unwrap();
        assert!(msg.is_ai());
        assert_eq!(msg.content, r#"[{"text":"hi","type":"text"}]"#);
    }

    #[test]
    fn test_unknown_kind_and_missing_id() {
        let msg: Message =
            serde_json::from_value(json!({"type": "function", "content": "x"})).unwrap();
        assert_eq!(msg.kind, MessageKind::Other);
        assert_eq!(msg.id, None);
    }

    #[test]
    fn test_messages_from_state() {
        let state = json!({
            "messages": [
                {"type": "human", "content": "q", "id": "1"},
                {"type": "ai", "content": "a", "id": "2"},
                "garbage"
            ]
        });
        let messages = messages_from_state(&state).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_ai());
        assert!(messages_from_state(&json!({"other": 1})).is_none());
    }
}
