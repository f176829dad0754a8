//! In-process doubles for the network and user seams.

use crate::api::bank_client::BankBackend;
use crate::api::openai_service::{ChunkReceiver, LlmProvider, StreamChunk};
use crate::assistant::approval_gate::Approver;
use crate::models::types::{AppError, ApprovalRequest, HttpOperation, Message, ToolDefinition};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Records every request and answers each with the same payload.
pub struct RecordingBackend {
    response: JsonValue,
    calls: Arc<Mutex<Vec<(HttpOperation, JsonValue)>>>,
}

impl RecordingBackend {
    pub fn new(response: JsonValue) -> Self {
        Self {
            response,
            calls: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn calls(&self) -> Vec<(HttpOperation, JsonValue)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn shared_calls(&self) -> Arc<Mutex<Vec<(HttpOperation, JsonValue)>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl BankBackend for RecordingBackend {
    async fn send(&self, operation: HttpOperation, args: JsonValue) -> Result<JsonValue, AppError> {
        self.calls.lock().unwrap().push((operation, args));
        Ok(self.response.clone())
    }
}

/// Answers approval requests from a fixed list of decisions.
pub struct ScriptedApprover {
    decisions: Mutex<VecDeque<bool>>,
    asked: Arc<Mutex<Vec<ApprovalRequest>>>,
}

impl ScriptedApprover {
    pub fn new(decisions: Vec<bool>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into()),
            asked: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn asked(&self) -> Arc<Mutex<Vec<ApprovalRequest>>> {
        self.asked.clone()
    }
}

#[async_trait]
impl Approver for ScriptedApprover {
    async fn decide(&self, request: &ApprovalRequest) -> Result<bool, AppError> {
        self.asked.lock().unwrap().push(request.clone());
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::ApprovalError("no scripted decision left".to_string()))
    }
}

/// Replays one scripted list of chunks per completion round.
pub struct ScriptedLlm {
    rounds: Mutex<VecDeque<Vec<StreamChunk>>>,
    title: Option<String>,
    fail_stream: bool,
    requests: Arc<Mutex<Vec<(Vec<Message>, usize)>>>,
}

impl ScriptedLlm {
    pub fn new(rounds: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            title: Some("Scripted Title".to_string()),
            fail_stream: false,
            requests: Arc::new(Mutex::new(vec![])),
        }
    }

    pub fn failing() -> Self {
        let mut llm = Self::new(vec![]);
        llm.fail_stream = true;
        llm.title = None;
        llm
    }

    pub fn with_title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    /// Messages and tool count of every streamed request, in order.
    pub fn requests(&self) -> Arc<Mutex<Vec<(Vec<Message>, usize)>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn stream_chat(
        &self,
        messages: Vec<Message>,
        tools: &[ToolDefinition],
    ) -> Result<ChunkReceiver, AppError> {
        self.requests.lock().unwrap().push((messages, tools.len()));
        if self.fail_stream {
            return Err(AppError::LlmError("connection refused".to_string()));
        }

        let chunks = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in chunks {
            tx.send(Ok(chunk)).unwrap();
        }
        Ok(rx)
    }

    async fn complete(&self, _messages: Vec<Message>) -> Result<String, AppError> {
        self.title
            .clone()
            .ok_or_else(|| AppError::LlmError("title unavailable".to_string()))
    }
}

pub fn tool_call_chunks(index: u32, id: &str, name: &str, arguments: &str) -> Vec<StreamChunk> {
    vec![
        StreamChunk::StartToolCall {
            index,
            id: id.to_string(),
            name: name.to_string(),
        },
        StreamChunk::AppendToolCallArgs {
            index,
            text: arguments.to_string(),
        },
    ]
}
