//! Streaming client for the remote domain-analysis agent.
//!
//! Talks to a LangGraph-style HTTP API: a thread is created once per
//! conversation and every submission streams a run on that thread as
//! server-sent events.

use crate::effort::EffortLevel;
use crate::error::{Result, ScoutError};
use crate::message::Message;
use crate::sse::{SseDecoder, SseFrame};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub const DEFAULT_ASSISTANT_ID: &str = "agent";
pub const DEV_API_URL: &str = "http://localhost:2024";
pub const DEPLOYED_API_URL: &str = "http://localhost:8123";

/// Endpoint chosen by build profile.
pub fn default_api_url() -> &'static str {
    if cfg!(debug_assertions) {
        DEV_API_URL
    } else {
        DEPLOYED_API_URL
    }
}

/// Run input; `messages` is the key the agent reads the conversation from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInput {
    pub messages: Vec<Message>,
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
    pub reasoning_model: String,
}

impl RunInput {
    pub fn new(messages: Vec<Message>, effort: EffortLevel, model: &str) -> Self {
        let budget = effort.budget();
        Self {
            messages,
            initial_search_query_count: budget.initial_search_query_count,
            max_research_loops: budget.max_research_loops,
            reasoning_model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    assistant_id: &'a str,
    input: &'a RunInput,
    stream_mode: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    thread_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Metadata { run_id: String },
    /// Per-node state delta, keyed by node name.
    Update(Value),
    /// Full state snapshot after a step.
    Values(Value),
    Error(String),
    End,
}

impl StreamEvent {
    fn from_frame(frame: SseFrame) -> Option<Self> {
        let event = frame.event.as_deref().unwrap_or("message");
        match event {
            "end" => Some(Self::End),
            "error" => {
                let message = serde_json::from_str::<Value>(&frame.data)
                    .ok()
                    .and_then(|v| {
                        v.get("message")
                            .or_else(|| v.get("error"))
                            .and_then(|m| m.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or(frame.data);
                Some(Self::Error(message))
            }
            "metadata" => {
                let value: Value = serde_json::from_str(&frame.data).ok()?;
                let run_id = value.get("run_id")?.as_str()?.to_string();
                Some(Self::Metadata { run_id })
            }
            "updates" => serde_json::from_str(&frame.data).ok().map(Self::Update),
            "values" => serde_json::from_str(&frame.data).ok().map(Self::Values),
            other => {
                tracing::debug!(event = other, "ignoring stream event");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    client: Client,
    api_url: String,
    assistant_id: String,
}

impl AgentClient {
    pub fn new(api_url: &str, assistant_id: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            assistant_id: assistant_id.to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub async fn create_thread(&self) -> Result<String> {
        let url = format!("{}/threads", self.api_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let response = check_status(response).await?;
        let thread: ThreadResponse = response.json().await?;
        tracing::debug!(thread_id = %thread.thread_id, "created thread");
        Ok(thread.thread_id)
    }

    /// Stream one run, forwarding decoded events until the body ends.
    ///
    /// An `End` event is always sent last, even when the server closes the
    /// connection without one.
    pub async fn stream_run(
        &self,
        thread_id: &str,
        input: &RunInput,
        events: UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        let url = format!("{}/threads/{}/runs/stream", self.api_url, thread_id);
        let request = RunRequest {
            assistant_id: &self.assistant_id,
            input,
            stream_mode: ["values", "updates"],
        };

        tracing::info!(
            thread_id,
            messages = input.messages.len(),
            queries = input.initial_search_query_count,
            loops = input.max_research_loops,
            model = %input.reasoning_model,
            "starting run"
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        let mut ended = false;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ScoutError::Stream(e.to_string()))?;
            for frame in decoder.push(&chunk) {
                if let Some(event) = StreamEvent::from_frame(frame) {
                    ended |= event == StreamEvent::End;
                    if events.send(event).is_err() {
                        tracing::debug!("stream receiver dropped, stopping run");
                        return Ok(());
                    }
                }
            }
        }

        if let Some(event) = decoder.finish().and_then(StreamEvent::from_frame) {
            ended |= event == StreamEvent::End;
            let _ = events.send(event);
        }
        if !ended {
            let _ = events.send(StreamEvent::End);
        }
        Ok(())
    }

    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let url = format!(
            "{}/threads/{}/runs/{}/cancel",
            self.api_url, thread_id, run_id
        );
        let response = self.client.post(&url).send().await?;
        check_status(response).await?;
        tracing::info!(thread_id, run_id, "cancelled run");
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ScoutError::Api { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Serve a single canned HTTP response and hand back the raw request.
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_run_input_from_effort() {
        let input = RunInput::new(
            vec![Message::human("example.com", "1")],
            EffortLevel::High,
            "gemini-2.0-flash",
        );
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["initial_search_query_count"], 5);
        assert_eq!(value["max_research_loops"], 10);
        assert_eq!(value["reasoning_model"], "gemini-2.0-flash");
        assert_eq!(value["messages"][0]["type"], "human");
    }

    #[test]
    fn test_error_frame_prefers_message_field() {
        let frame = SseFrame {
            event: Some("error".into()),
            data: r#"{"error":"ValueError","message":"bad input"}"#.into(),
            id: None,
        };
        assert_eq!(
            StreamEvent::from_frame(frame),
            Some(StreamEvent::Error("bad input".into()))
        );
    }

    #[tokio::test]
    async fn test_create_thread() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK",
            "application/json",
            json!({"thread_id": "thread-42"}).to_string(),
        )
        .await;
        let client = AgentClient::new(&url, DEFAULT_ASSISTANT_ID).unwrap();
        assert_eq!(client.create_thread().await.unwrap(), "thread-42");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /threads "));
    }

    #[tokio::test]
    async fn test_stream_run_forwards_events() {
        let body = [
            "event: metadata\ndata: {\"run_id\":\"run-7\"}\n\n",
            "event: updates\ndata: {\"generate_query\":{\"query_list\":[\"a\",\"b\"]}}\n\n",
            "event: values\ndata: {\"messages\":[{\"type\":\"ai\",\"content\":\"done\",\"id\":\"m1\"}]}\n\n",
            "event: end\ndata: null\n\n",
        ]
        .concat();
        let (url, server) = serve_once("HTTP/1.1 200 OK", "text/event-stream", body).await;

        let client = AgentClient::new(&url, DEFAULT_ASSISTANT_ID).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input = RunInput::new(vec![Message::human("q", "1")], EffortLevel::Low, "m");
        client.stream_run("t1", &input, tx).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            StreamEvent::Metadata {
                run_id: "run-7".into()
            }
        );
        assert!(matches!(&events[1], StreamEvent::Update(v) if v.get("generate_query").is_some()));
        assert!(matches!(&events[2], StreamEvent::Values(_)));
        assert_eq!(events[3], StreamEvent::End);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /threads/t1/runs/stream "));
        assert!(request.contains("\"assistant_id\":\"agent\""));
        assert!(request.contains("\"max_research_loops\":1"));
    }

    #[tokio::test]
    async fn test_stream_run_synthesizes_end() {
        let body = "event: updates\ndata: {\"reflection\":{\"is_sufficient\":true}}\n\n".to_string();
        let (url, _server) = serve_once("HTTP/1.1 200 OK", "text/event-stream", body).await;
        let client = AgentClient::new(&url, DEFAULT_ASSISTANT_ID).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let input = RunInput::new(Vec::new(), EffortLevel::Medium, "m");
        client.stream_run("t", &input, tx).await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), StreamEvent::Update(_)));
        assert_eq!(rx.try_recv().unwrap(), StreamEvent::End);
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let (url, _server) = serve_once(
            "HTTP/1.1 404 Not Found",
            "application/json",
            "{\"detail\":\"Thread not found\"}".to_string(),
        )
        .await;
        let client = AgentClient::new(&url, DEFAULT_ASSISTANT_ID).unwrap();
        let err = client.cancel_run("t", "r").await.unwrap_err();
        match err {
            ScoutError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Thread not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
