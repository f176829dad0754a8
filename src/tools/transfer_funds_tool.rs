use crate::models::traits::{parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct TransferFundsInput {
    customer_id: String,
    /// Account the money is taken from
    from_account_id: String,
    /// Account the money is credited to
    to_account_id: String,
    amount: f64,
}

pub struct TransferFundsTool;

#[async_trait]
impl Tool for TransferFundsTool {
    fn name(&self) -> &'static str {
        "transfer_funds"
    }

    fn description(&self) -> &'static str {
        "Transfers money between two accounts of the same customer. Look up the account ids with get_accounts first."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::post("/accounts/transfer")
    }

    fn input_schema(&self) -> RootSchema {
        schema_for!(TransferFundsInput)
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        let input = parse_input::<TransferFundsInput>(self.name(), args)?;
        let reason = if !(input.amount.is_finite() && input.amount > 0.0) {
            format!("amount must be positive, got {}", input.amount)
        } else if input.from_account_id == input.to_account_id {
            "source and destination accounts must differ".to_string()
        } else {
            return Ok(());
        };
        Err(AppError::InvalidArguments {
            tool: self.name().to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transfer_validation() {
        let tool = TransferFundsTool;
        let ok = json!({
            "customer_id": "C001",
            "from_account_id": "A1",
            "to_account_id": "A2",
            "amount": 500
        });
        assert!(tool.validate(&ok).is_ok());

        let same_account = json!({
            "customer_id": "C001",
            "from_account_id": "A1",
            "to_account_id": "A1",
            "amount": 500
        });
        assert!(tool.validate(&same_account).is_err());

        let zero = json!({
            "customer_id": "C001",
            "from_account_id": "A1",
            "to_account_id": "A2",
            "amount": 0
        });
        assert!(tool.validate(&zero).is_err());
    }
}
