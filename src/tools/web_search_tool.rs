use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct WebSearchInput {
    /// Search query in natural language
    query: String,
}

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Searches the web for up-to-date information, such as interest rates or banking regulations."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/search/web")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(WebSearchInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        let input = parse_input::<WebSearchInput>(self.name(), args)?;
        if input.query.trim().is_empty() {
            return Err(AppError::InvalidArguments {
                tool: self.name().to_string(),
                reason: "query must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query_is_rejected() {
        assert!(WebSearchTool.validate(&json!({"query": "ECB rates"})).is_ok());
        assert!(WebSearchTool.validate(&json!({"query": "  "})).is_err());
    }
}
