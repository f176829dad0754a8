use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
struct ListCustomersBasicInput {}

pub struct ListCustomersBasicTool;

#[async_trait]
impl Tool for ListCustomersBasicTool {
    fn name(&self) -> &'static str {
        "list_customers_basic"
    }

    fn description(&self) -> &'static str {
        "Returns a lightweight list of all customers containing only customer_id and name. Use it to find a customer's id from their name."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::get("/customers/basic")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(ListCustomersBasicInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        if args.is_null() {
            return Ok(());
        }
        parse_input::<ListCustomersBasicInput>(self.name(), args).map(|_| ())
    }
}
