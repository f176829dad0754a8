use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    ReqwestError(reqwest::Error),
    SerdeJsonError(serde_json::Error),
    IoError(std::io::Error),
    CommandError(String),
    UnknownTool(String),
    InvalidArguments { tool: String, reason: String },
    ApiError { status: u16, body: String },
    LlmError(String),
    ApprovalError(String),
    RegistryError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ReqwestError(e) => write!(f, "HTTP error: {}", e),
            AppError::SerdeJsonError(e) => write!(f, "JSON error: {}", e),
            AppError::IoError(e) => write!(f, "IO error: {}", e),
            AppError::CommandError(msg) => write!(f, "Command error: {}", msg),
            AppError::UnknownTool(name) => write!(f, "Tool `{}` not found", name),
            AppError::InvalidArguments { tool, reason } => {
                write!(f, "Invalid arguments for `{}`: {}", tool, reason)
            }
            AppError::ApiError { status, body } => {
                write!(f, "Banking API returned {}: {}", status, body)
            }
            AppError::LlmError(msg) => write!(f, "LLM error: {}", msg),
            AppError::ApprovalError(msg) => write!(f, "Approval error: {}", msg),
            AppError::RegistryError(msg) => write!(f, "Tool registry error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ReqwestError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeJsonError(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: String, name: String, arguments: String) -> Self {
        Self {
            id,
            r#type: "function".to_string(),
            function: FunctionCall { name, arguments },
        }
    }
}

/// Chat message in the wire format of the completions API.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn new(role: String, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One entry of the conversation history. Turns are only ever appended.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            tool_calls: vec![],
            tool_call_id: None,
            name: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: String) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: String, tool_calls: Vec<ToolCall>) -> Self {
        let mut turn = Self::with_role(Role::Assistant, content);
        turn.tool_calls = tool_calls;
        turn
    }

    pub fn tool(call_id: String, name: String, content: String) -> Self {
        let mut turn = Self::with_role(Role::Tool, content);
        turn.tool_call_id = Some(call_id);
        turn.name = Some(name);
        turn
    }

    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::new("user".to_string(), self.content.clone()),
            Role::Assistant => Message {
                role: "assistant".to_string(),
                content: if self.content.is_empty() && !self.tool_calls.is_empty() {
                    None
                } else {
                    Some(self.content.clone())
                },
                tool_calls: if self.tool_calls.is_empty() {
                    None
                } else {
                    Some(self.tool_calls.clone())
                },
                tool_call_id: None,
                name: None,
            },
            Role::Tool => Message {
                role: "tool".to_string(),
                content: Some(self.content.clone()),
                tool_calls: None,
                tool_call_id: self.tool_call_id.clone(),
                name: self.name.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// State-changing operation
    Tool,
    /// Read-only data source
    Resource,
}

impl HttpMethod {
    pub fn kind(&self) -> ToolKind {
        match self {
            HttpMethod::Get => ToolKind::Resource,
            HttpMethod::Post => ToolKind::Tool,
        }
    }
}

/// The banking endpoint backing a tool, e.g. `GET /customers/{customer_id}`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct HttpOperation {
    pub method: HttpMethod,
    pub path: &'static str,
}

impl HttpOperation {
    pub const fn get(path: &'static str) -> Self {
        Self { method: HttpMethod::Get, path }
    }

    pub const fn post(path: &'static str) -> Self {
        Self { method: HttpMethod::Post, path }
    }

    /// Names of the `{param}` segments of the path template.
    pub fn path_params(&self) -> Vec<&'static str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
            .collect()
    }
}

impl fmt::Display for HttpOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.method {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        };
        write!(f, "{} {}", method, self.path)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub kind: ToolKind,
    pub parameters: JsonValue,
    pub sensitive: bool,
    pub operation: HttpOperation,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub arguments: JsonValue,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success(JsonValue),
    Failure(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolCallResult {
    pub call_id: String,
    pub name: String,
    pub outcome: ToolOutcome,
}

impl ToolCallResult {
    pub fn success(request: &ToolCallRequest, payload: JsonValue) -> Self {
        Self {
            call_id: request.call_id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Success(payload),
        }
    }

    pub fn failure(request: &ToolCallRequest, error: &AppError) -> Self {
        Self {
            call_id: request.call_id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Failure(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    pub fn payload(&self) -> JsonValue {
        match &self.outcome {
            ToolOutcome::Success(value) => value.clone(),
            ToolOutcome::Failure(error) => serde_json::json!({ "error": error }),
        }
    }

    /// Text handed back to the LLM as the tool message content.
    pub fn to_content(&self) -> String {
        match self.payload() {
            JsonValue::String(s) => s,
            other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

/// A sensitive tool call waiting for the user's decision.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApprovalRequest {
    pub id: uuid::Uuid,
    pub call: ToolCallRequest,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: ApprovalStatus,
}

impl ApprovalRequest {
    pub fn new(call: ToolCallRequest, description: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            call,
            description,
            created_at: Utc::now(),
            status: ApprovalStatus::Pending,
        }
    }

    pub fn resolve(&mut self, approved: bool) -> Result<(), AppError> {
        if self.status != ApprovalStatus::Pending {
            return Err(AppError::ApprovalError(format!(
                "approval request {} already resolved as {:?}",
                self.id, self.status
            )));
        }
        self.status = if approved {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Rejected
        };
        Ok(())
    }
}

// Streaming completion chunks

#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StreamDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct StreamToolCall {
    pub index: u32,
    pub id: Option<String>,
    pub function: Option<StreamFunction>,
}

#[derive(Debug, Deserialize)]
pub struct StreamFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Choice {
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OpenAIResponse {
    pub choices: Vec<Choice>,
}
