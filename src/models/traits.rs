use crate::api::bank_client::BankBackend;
use crate::models::types::{AppError, HttpOperation, ToolKind};

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A banking endpoint exposed to the LLM as a callable tool or readable resource.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn operation(&self) -> HttpOperation;
    fn input_schema(&self) -> RootSchema;

    /// Checks the arguments against the tool's typed input.
    fn validate(&self, args: &JsonValue) -> Result<(), AppError>;

    fn kind(&self) -> ToolKind {
        self.operation().method.kind()
    }

    // JSON schema object advertised to the LLM
    fn parameters(&self) -> JsonValue {
        let mut schema = serde_json::to_value(self.input_schema()).unwrap_or_default();
        if let Some(map) = schema.as_object_mut() {
            map.remove("$schema");
            map.remove("title");
        }
        schema
    }

    /// Called once the user approved a sensitive call, before it is sent.
    fn prepare_approved(&self, _args: &mut JsonValue) {}

    async fn execute(
        &self,
        backend: &dyn BankBackend,
        args: JsonValue,
    ) -> Result<JsonValue, AppError> {
        backend.send(self.operation(), args).await
    }
}

/// Deserializes `args` into `T`, mapping failures to `InvalidArguments`.
pub fn parse_input<T: DeserializeOwned>(tool: &str, args: &JsonValue) -> Result<T, AppError> {
    serde_json::from_value(args.clone()).map_err(|e| AppError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Schema for `T` with nested types inlined instead of referenced through
/// `definitions`, which function-calling APIs handle poorly.
pub fn inline_schema_for<T: JsonSchema>() -> RootSchema {
    SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>()
}
