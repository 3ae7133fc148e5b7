//! Background execution of a single agent run.
//!
//! The UI loop owns the receiving end; this task only produces messages.

use scout_core::agent::{AgentClient, RunInput, StreamEvent};
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum RunMessage {
    /// A new conversation thread was created on the server
    Thread(String),
    Stream(StreamEvent),
    /// The run could not start or broke off
    Failed(String),
}

pub async fn run_agent(
    client: AgentClient,
    thread_id: Option<String>,
    input: RunInput,
    ui_sender: UnboundedSender<RunMessage>,
) {
    let thread_id = match thread_id {
        Some(id) => id,
        None => match client.create_thread().await {
            Ok(id) => {
                let _ = ui_sender.send(RunMessage::Thread(id.clone()));
                id
            }
            Err(err) => {
                tracing::error!(error = %err, api_url = client.api_url(), "failed to create thread");
                let _ = ui_sender.send(RunMessage::Failed(err.to_string()));
                return;
            }
        },
    };

    // Forward stream events to the UI channel
    let (stream_sender, mut stream_receiver) = mpsc::unbounded_channel();
    let forward_sender = ui_sender.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(event) = stream_receiver.recv().await {
            if forward_sender.send(RunMessage::Stream(event)).is_err() {
                break;
            }
        }
    });

    let result = client.stream_run(&thread_id, &input, stream_sender).await;
    let _ = forwarder.await;

    if let Err(err) = result {
        tracing::error!(error = %err, thread_id, "agent run failed");
        let _ = ui_sender.send(RunMessage::Failed(err.to_string()));
    }
}

/// Fire-and-forget stop signal for the run in progress.
pub async fn cancel_agent(client: AgentClient, thread_id: String, run_id: String) {
    if let Err(err) = client.cancel_run(&thread_id, &run_id).await {
        tracing::warn!(error = %err, thread_id, run_id, "failed to cancel run");
    }
}
