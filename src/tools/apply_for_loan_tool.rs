use crate::models::traits::{inline_schema_for, parse_input, Tool};
use crate::models::types::{AppError, HttpOperation};

use async_trait::async_trait;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
enum LoanPurpose {
    Cars,
    House,
    Personal,
    Business,
    Other,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
struct ApplyForLoanInput {
    customer_id: String,
    /// Requested loan amount
    amount: f64,
    purpose: LoanPurpose,
    // Only ever set once the advisor approved the call
    #[serde(default)]
    #[schemars(skip)]
    force_approve: bool,
}

pub struct ApplyForLoanTool;

#[async_trait]
impl Tool for ApplyForLoanTool {
    fn name(&self) -> &'static str {
        "apply_for_loan"
    }

    fn description(&self) -> &'static str {
        "Creates a new loan request for the customer and performs a basic eligibility check using income and credit score."
    }

    fn operation(&self) -> HttpOperation {
        HttpOperation::post("/loans/apply")
    }

    fn input_schema(&self) -> RootSchema {
        inline_schema_for::<ApplyForLoanInput>()
    }

    fn validate(&self, args: &JsonValue) -> Result<(), AppError> {
        let input = parse_input::<ApplyForLoanInput>(self.name(), args)?;
        if !(input.amount.is_finite() && input.amount > 0.0) {
            return Err(AppError::InvalidArguments {
                tool: self.name().to_string(),
                reason: format!("amount must be positive, got {}", input.amount),
            });
        }
        Ok(())
    }

    /// The advisor approved the application, so the backend must not
    /// override the decision with its automatic eligibility check.
    fn prepare_approved(&self, args: &mut JsonValue) {
        if let Some(map) = args.as_object_mut() {
            map.insert("force_approve".to_string(), JsonValue::Bool(true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_force_approve_is_hidden_from_schema() {
        let parameters = ApplyForLoanTool.parameters();
        assert!(parameters["properties"].get("force_approve").is_none());
        assert!(parameters["properties"]["purpose"].get("enum").is_some());
        assert!(parameters.get("definitions").is_none());
    }

    #[test]
    fn test_validation() {
        let tool = ApplyForLoanTool;
        assert!(tool
            .validate(&json!({"customer_id": "C001", "amount": 5000, "purpose": "cars"}))
            .is_ok());
        assert!(tool
            .validate(&json!({"customer_id": "C001", "amount": 5000, "purpose": "yacht"}))
            .is_err());
        assert!(tool
            .validate(&json!({"customer_id": "C001", "amount": -1, "purpose": "house"}))
            .is_err());
    }

    #[test]
    fn test_prepare_approved_sets_override() {
        let mut args = json!({"customer_id": "C001", "amount": 5000, "purpose": "cars"});
        ApplyForLoanTool.prepare_approved(&mut args);
        assert_eq!(args["force_approve"], true);
        assert!(ApplyForLoanTool.validate(&args).is_ok());
    }
}
