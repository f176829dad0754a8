use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetCustomerInput {
    /// Customer identifier, e.g. `C001`
    customer_id: String,
}

pub struct GetCustomerTool;

#[async_trait]
impl Tool for GetCustomerTool {
    fn name(&self) -> &'static str {
        "get_customer"
    }

    fn description(&self) -> &'static str {
        "Retrieves full customer details including personal info, income, credit score, and employment data."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/customers/{customer_id}")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(GetCustomerInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        parse_input::<GetCustomerInput>(self.name(), args).map(|_| ())
    }
}
