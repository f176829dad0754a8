pub mod approval_gate;
pub mod command_handler;
pub mod conversation_manager;
pub mod events;
pub mod interaction_log;

use crate::{
    api::{
        bank_client::BankBackend,
        openai_service::{LlmProvider, StreamChunk},
    },
    models::types::{
        AppError, ConversationTurn, Message, ToolCall, ToolCallRequest, ToolCallResult, ToolOutcome,
    },
    registry::tool_registry::ToolRegistry,
};
use approval_gate::{ApprovalGate, GateOutcome};
use conversation_manager::{clean_title, fallback_title, ConversationManager};
use events::{AssistantEvent, EventRelay};
use interaction_log::{InteractionLog, InteractionRecord};

use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;

pub const SYSTEM_PROMPT: &str = "You are a helpful loan assistant. \
You have access to various tools to help customers. \
When the user asks a question requesting information or knowledge, \
use the appropriate search tool to find relevant information and provide accurate answers. \
Loan approvals and rejections are ultimately decided by the human user: \
if the user explicitly approves a loan request you must treat it as approved and may not overturn it, \
and if the user rejects a request you must treat it as rejected with no reversals.";

const TITLE_PROMPT: &str = "You are a helpful assistant naming banking chat conversations. \
Return a concise title (max 6 words) in Title Case with no quotes or punctuation beyond spaces.";

const REJECTED_MESSAGE: &str = "User rejected the tool call";

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

// Tool call being assembled from streamed fragments
#[derive(Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

pub struct Assistant {
    conversation_manager: ConversationManager,
    llm: Box<dyn LlmProvider>,
    registry: ToolRegistry,
    backend: Box<dyn BankBackend>,
    gate: ApprovalGate,
    relay: EventRelay,
    interaction_log: InteractionLog,
    max_tool_rounds: usize,
}

impl Assistant {
    pub fn new(
        conversation_manager: ConversationManager,
        llm: Box<dyn LlmProvider>,
        registry: ToolRegistry,
        backend: Box<dyn BankBackend>,
        gate: ApprovalGate,
        relay: EventRelay,
    ) -> Self {
        let interaction_log = InteractionLog::new(conversation_manager.dir());
        Assistant {
            conversation_manager,
            llm,
            registry,
            backend,
            gate,
            relay,
            interaction_log,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Self {
        self.max_tool_rounds = max_tool_rounds.max(1);
        self
    }

    pub fn conversation_manager(&mut self) -> &mut ConversationManager {
        &mut self.conversation_manager
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Runs one user turn to completion. Every outcome, including failures,
    /// ends with a `turn_complete` event.
    pub async fn handle_user_input(&mut self, input: &str) -> Result<String, AppError> {
        let first_exchange = self.conversation_manager.turns().is_empty();
        self.conversation_manager.add_user_prompt(input.to_string());

        let mut results = vec![];
        let outcome = self.run_rounds(&mut results).await;

        match &outcome {
            Ok(reply) => {
                if first_exchange && self.conversation_manager.title().is_none() {
                    self.generate_title(input).await;
                }
                self.log_interaction(input, reply, results);
            }
            Err(e) => {
                log::error!("Turn failed: {}", e);
                self.relay.emit(AssistantEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        self.relay.emit(AssistantEvent::TurnComplete);
        outcome
    }

    async fn run_rounds(&mut self, results: &mut Vec<ToolCallResult>) -> Result<String, AppError> {
        let mut reply = String::new();

        for round in 1..=self.max_tool_rounds {
            let (text, tool_calls) = self.stream_completion().await?;
            if !text.is_empty() {
                reply = text.clone();
            }
            self.conversation_manager
                .add_turn(ConversationTurn::assistant(text, tool_calls.clone()));

            if tool_calls.is_empty() {
                return Ok(reply);
            }

            log::info!("Round {}: {} tool call(s) requested", round, tool_calls.len());
            for tool_call in &tool_calls {
                self.handle_tool_call(tool_call, results).await;
            }
        }

        log::warn!("Stopped after {} tool rounds", self.max_tool_rounds);
        self.relay.emit(AssistantEvent::Error {
            message: format!(
                "Stopped after {} rounds of tool calls without a final answer",
                self.max_tool_rounds
            ),
        });
        Ok(reply)
    }

    /// Streams one completion, relaying text deltas and assembling tool calls.
    async fn stream_completion(&mut self) -> Result<(String, Vec<ToolCall>), AppError> {
        let messages: Vec<Message> = self.conversation_manager.messages(SYSTEM_PROMPT);
        let mut rx = self
            .llm
            .stream_chat(messages, &self.registry.definitions())
            .await?;

        let mut text = String::new();
        let mut pending: BTreeMap<u32, PendingToolCall> = BTreeMap::new();

        while let Some(chunk) = rx.recv().await {
            match chunk? {
                StreamChunk::Delta(delta) => {
                    text.push_str(&delta);
                    self.relay.emit(AssistantEvent::AssistantDelta { text: delta });
                }
                StreamChunk::StartToolCall { index, id, name } => {
                    // some providers repeat the id on later fragments without the name
                    let call = pending.entry(index).or_default();
                    if !id.is_empty() {
                        call.id = id;
                    }
                    if !name.is_empty() {
                        call.name = name;
                    }
                }
                StreamChunk::AppendToolCallArgs { index, text: fragment } => {
                    pending.entry(index).or_default().arguments.push_str(&fragment);
                }
            }
        }

        let tool_calls = pending
            .into_values()
            .filter(|call| !call.id.is_empty())
            .map(|call| ToolCall::new(call.id, call.name, call.arguments))
            .collect();
        Ok((text, tool_calls))
    }

    async fn handle_tool_call(&mut self, tool_call: &ToolCall, results: &mut Vec<ToolCallResult>) {
        let mut request = match parse_tool_call(tool_call) {
            Ok(request) => request,
            Err((request, e)) => return self.refuse_tool_call(&request, e, results),
        };

        let definition = match self.registry.validate(&request) {
            Ok(definition) => definition.clone(),
            Err(e) => return self.refuse_tool_call(&request, e, results),
        };

        match self.gate.review(&definition, &request, &self.relay).await {
            GateOutcome::Bypassed => {}
            GateOutcome::Approved(_) => self.registry.prepare_approved(&mut request),
            GateOutcome::Rejected(approval) => {
                log::warn!("User rejected tool call {} ({})", request.call_id, request.name);
                let result = ToolCallResult {
                    call_id: request.call_id.clone(),
                    name: request.name.clone(),
                    outcome: ToolOutcome::Failure(REJECTED_MESSAGE.to_string()),
                };
                let content = json!({
                    "error": REJECTED_MESSAGE,
                    "status": "rejected",
                    "approval_id": approval.id,
                });
                self.conversation_manager.add_turn(ConversationTurn::tool(
                    request.call_id.clone(),
                    request.name.clone(),
                    content.to_string(),
                ));
                results.push(result);
                return;
            }
        }

        self.relay.emit(AssistantEvent::ToolCallStart {
            call_id: request.call_id.clone(),
            name: request.name.clone(),
            arguments: request.arguments.clone(),
        });
        let result = self
            .registry
            .execute_tool(self.backend.as_ref(), &request)
            .await;
        self.relay.emit(AssistantEvent::tool_result(&result));

        self.conversation_manager.add_turn(ConversationTurn::tool(
            result.call_id.clone(),
            result.name.clone(),
            result.to_content(),
        ));
        results.push(result);
    }

    // Unknown tools and malformed arguments are answered without any network call
    fn refuse_tool_call(
        &mut self,
        request: &ToolCallRequest,
        error: AppError,
        results: &mut Vec<ToolCallResult>,
    ) {
        log::warn!("Refused tool call {}: {}", request.call_id, error);
        self.relay.emit(AssistantEvent::Error {
            message: error.to_string(),
        });
        let result = ToolCallResult::failure(request, &error);
        self.conversation_manager.add_turn(ConversationTurn::tool(
            request.call_id.clone(),
            request.name.clone(),
            result.to_content(),
        ));
        results.push(result);
    }

    async fn generate_title(&mut self, seed: &str) {
        let messages = vec![
            Message::new("system".to_string(), TITLE_PROMPT.to_string()),
            Message::new("user".to_string(), format!("Conversation context:\n{}", seed)),
        ];
        let title = match self.llm.complete(messages).await {
            Ok(raw) => clean_title(&raw).unwrap_or_else(|| fallback_title(seed)),
            Err(e) => {
                log::warn!("Conversation title generation failed: {}", e);
                fallback_title(seed)
            }
        };
        log::info!("Conversation {} titled `{}`", self.conversation_manager.session_id(), title);
        self.conversation_manager.set_title(title);
    }

    fn log_interaction(&self, input: &str, reply: &str, tool_calls: Vec<ToolCallResult>) {
        let record = InteractionRecord {
            timestamp: chrono::Utc::now(),
            session_id: self.conversation_manager.session_id().to_string(),
            user_input: input.to_string(),
            assistant_message: reply.to_string(),
            tool_calls,
        };
        if let Err(e) = self.interaction_log.append(&record) {
            log::warn!("Failed to append interaction log: {}", e);
        }
    }
}

fn parse_tool_call(
    tool_call: &ToolCall,
) -> Result<ToolCallRequest, (ToolCallRequest, AppError)> {
    let raw = tool_call.function.arguments.trim();
    let parsed = if raw.is_empty() {
        Ok(JsonValue::Object(Default::default()))
    } else {
        serde_json::from_str::<JsonValue>(raw)
    };

    match parsed {
        Ok(arguments) => Ok(ToolCallRequest {
            call_id: tool_call.id.clone(),
            name: tool_call.function.name.clone(),
            arguments,
        }),
        Err(e) => Err((
            ToolCallRequest {
                call_id: tool_call.id.clone(),
                name: tool_call.function.name.clone(),
                arguments: JsonValue::String(raw.to_string()),
            },
            AppError::InvalidArguments {
                tool: tool_call.function.name.clone(),
                reason: format!("arguments are not valid JSON: {}", e),
            },
        )),
    }
}
