use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct GetAccountsInput {
    customer_id: String,
}

pub struct GetAccountsTool;

#[async_trait]
impl Tool for GetAccountsTool {
    fn name(&self) -> &'static str {
        "get_accounts"
    }

    fn description(&self) -> &'static str {
        "Returns a list of all bank accounts (id, type, balance, currency) associated with the given customer ID."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/customers/{customer_id}/accounts")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(GetAccountsInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        parse_input::<GetAccountsInput>(self.name(), args).map(|_| ())
    }
}
