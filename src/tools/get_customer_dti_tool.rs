use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetCustomerDtiInput {
    customer_id: String,
}

pub struct GetCustomerDtiTool;

#[async_trait]
impl Tool for GetCustomerDtiTool {
    fn name(&self) -> &'static str {
        "get_customer_dti"
    }

    fn description(&self) -> &'static str {
        "Calculates the customer's Debt-to-Income ratio using monthly income and existing loan obligations. Returns the ratio and a risk level (good, borderline, high_risk)."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/customers/{customer_id}/dti")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(GetCustomerDtiInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        parse_input::<GetCustomerDtiInput>(self.name(), args).map(|_| ())
    }
}
