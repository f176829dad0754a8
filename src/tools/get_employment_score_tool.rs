use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetEmploymentScoreInput {
    customer_id: String,
}

pub struct GetEmploymentScoreTool;

#[async_trait]
impl Tool for GetEmploymentScoreTool {
    fn name(&self) -> &'static str {
        "get_employment_score"
    }

    fn description(&self) -> &'static str {
        "Returns the customer's employment stability score (0.0 to 1.0) and stability level based on job type, years of employment, and business history."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/customers/{customer_id}/employment_score")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(GetEmploymentScoreInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        parse_input::<GetEmploymentScoreInput>(self.name(), args).map(|_| ())
    }
}
