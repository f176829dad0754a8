use crate::models::types::{AppError, Message, OpenAIResponse, StreamResponse, ToolDefinition};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Delta(String),
    StartToolCall { index: u32, id: String, name: String },
    AppendToolCallArgs { index: u32, text: String },
}

pub type ChunkReceiver = mpsc::UnboundedReceiver<Result<StreamChunk, AppError>>;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Starts a streamed completion. Chunks arrive in order on the receiver,
    /// which closes when the completion is finished.
    async fn stream_chat(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<ChunkReceiver, AppError>;

    /// Single non-streamed completion without tools.
    async fn complete(&self, messages: Vec<Message>) -> Result<String, AppError>;
}

pub struct OpenAIService {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAIService {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn tools_json(tools: &[ToolDefinition]) -> JsonValue {
        JsonValue::Array(
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect(),
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAIService {
    async fn stream_chat(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<ChunkReceiver, AppError> {
        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });
        if !tools.is_empty() {
            payload["tools"] = Self::tools_json(tools);
        }
        log::debug!("Streaming completion from {} with {} messages", self.url(), messages.len());

        let request = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&payload);
        let source = EventSource::new(request).map_err(|e| AppError::LlmError(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            if let Err(e) = pump_events(source, &tx).await {
                let _ = tx.send(Err(e));
            }
        });

        Ok(rx)
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String, AppError> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
        });
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LlmError(format!("{}: {}", status, text)));
        }

        let response: OpenAIResponse = response.json().await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

async fn pump_events(
    mut source: EventSource,
    tx: &mpsc::UnboundedSender<Result<StreamChunk, AppError>>,
) -> Result<(), AppError> {
    while let Some(event) = source.next().await {
        let message = match event {
            Ok(Event::Open) => continue,
            Ok(Event::Message(message)) => message,
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                source.close();
                let text = response.text().await.unwrap_or_default();
                return Err(AppError::LlmError(format!("Invalid status code {}: {}", status, text)));
            }
            Err(e) => {
                source.close();
                return Err(AppError::LlmError(e.to_string()));
            }
        };

        if message.data.trim() == "[DONE]" {
            break;
        }
        log::trace!("Received event: {}", message.data);

        let response: StreamResponse = serde_json::from_str(&message.data)?;
        let mut finished = false;
        for choice in response.choices {
            for chunk in decode_choice_delta(choice.delta) {
                if tx.send(Ok(chunk)).is_err() {
                    source.close();
                    return Ok(());
                }
            }
            if let Some(reason) = choice.finish_reason {
                log::debug!("Completion finished with reason {}", reason);
                finished = true;
            }
        }
        if finished {
            break;
        }
    }

    // Keeps the event source from reconnecting
    source.close();
    Ok(())
}

fn decode_choice_delta(delta: crate::models::types::StreamDelta) -> Vec<StreamChunk> {
    let mut chunks = vec![];
    if let Some(content) = delta.content {
        if !content.is_empty() {
            chunks.push(StreamChunk::Delta(content));
        }
    }
    for tool_call in delta.tool_calls.unwrap_or_default() {
        let (name, arguments) = match tool_call.function {
            Some(function) => (function.name, function.arguments),
            None => (None, None),
        };
        if let Some(id) = tool_call.id.filter(|id| !id.is_empty()) {
            chunks.push(StreamChunk::StartToolCall {
                index: tool_call.index,
                id,
                name: name.unwrap_or_default(),
            });
        }
        if let Some(text) = arguments.filter(|a| !a.is_empty()) {
            chunks.push(StreamChunk::AppendToolCallArgs {
                index: tool_call.index,
                text,
            });
        }
    }
    chunks
}
