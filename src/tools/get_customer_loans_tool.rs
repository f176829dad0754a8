use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetCustomerLoansInput {
    customer_id: String,
}

pub struct GetCustomerLoansTool;

#[async_trait]
impl Tool for GetCustomerLoansTool {
    fn name(&self) -> &'static str {
        "get_customer_loans"
    }

    fn description(&self) -> &'static str {
        "Returns all existing loans for a specific customer, including loan status and remaining balance."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/loans/{customer_id}")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(GetCustomerLoansInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        parse_input::<GetCustomerLoansInput>(self.name(), args).map(|_| ())
    }
}
