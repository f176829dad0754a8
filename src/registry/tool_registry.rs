use crate::api::bank_client::BankBackend;
use crate::models::traits::Tool;
use crate::models::types::{AppError, ToolCallRequest, ToolCallResult, ToolDefinition, ToolKind};

use proc_macro_crate::auto_register_tools;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

auto_register_tools!();

/// Decides which tools are sensitive. A tool requires approval when its name
/// contains one of the patterns, ignoring case.
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    patterns: Vec<String>,
}

impl ApprovalPolicy {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn requires_approval(&self, tool_name: &str) -> bool {
        let name = tool_name.to_lowercase();
        self.patterns.iter().any(|pattern| name.contains(pattern.as_str()))
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(["apply_for_loan", "transfer_funds"])
    }
}

struct RegisteredTool {
    tool: Box<dyn Tool>,
    definition: ToolDefinition,
}

pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
    policy: ApprovalPolicy,
}

impl ToolRegistry {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            policy,
        }
    }

    /// Builds the registry with every banking tool and validates the table.
    pub fn load(policy: ApprovalPolicy) -> Result<Self, AppError> {
        let mut registry = ToolRegistry::new(policy);
        register_tools(&mut registry);
        registry.check()?;
        log::info!("Loaded {} banking tools", registry.order.len());
        Ok(registry)
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let definition = ToolDefinition {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            kind: tool.kind(),
            parameters: tool.parameters(),
            sensitive: self.policy.requires_approval(tool.name()),
            operation: tool.operation(),
        };
        if self.tools.contains_key(&definition.name) {
            // caught by check(); keep the first declaration
            self.order.push(definition.name.clone());
            return;
        }
        self.order.push(definition.name.clone());
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                tool: Box::new(tool),
                definition,
            },
        );
    }

    /// Validates the declarations: unique well-formed names, object schemas,
    /// and every path parameter present as a required property.
    pub fn check(&self) -> Result<(), AppError> {
        let mut seen = std::collections::HashSet::new();
        for name in &self.order {
            if !seen.insert(name) {
                return Err(AppError::RegistryError(format!("duplicate tool name `{}`", name)));
            }
            if name.is_empty()
                || name.len() > 64
                || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(AppError::RegistryError(format!("invalid tool name `{}`", name)));
            }
        }

        for registered in self.tools.values() {
            let definition = &registered.definition;
            let schema = &definition.parameters;
            if schema.get("type").and_then(JsonValue::as_str) != Some("object") {
                return Err(AppError::RegistryError(format!(
                    "`{}` parameters must be an object schema",
                    definition.name
                )));
            }
            let required: Vec<&str> = schema
                .get("required")
                .and_then(JsonValue::as_array)
                .map(|r| r.iter().filter_map(JsonValue::as_str).collect())
                .unwrap_or_default();
            for param in definition.operation.path_params() {
                if !required.contains(&param) {
                    return Err(AppError::RegistryError(format!(
                        "`{}` path parameter `{}` is not a required property",
                        definition.name, param
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|registered| registered.definition.clone())
            .collect()
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name).map(|registered| &registered.definition)
    }

    pub fn list_tools(&self) -> String {
        let mut listing = String::new();
        for definition in self.definitions() {
            let kind = match definition.kind {
                ToolKind::Tool => "tool",
                ToolKind::Resource => "resource",
            };
            let flag = if definition.sensitive { " [approval]" } else { "" };
            listing.push_str(&format!(
                "{:<22} {:<8} {}{}\n    {}\n",
                definition.name, kind, definition.operation, flag, definition.description
            ));
        }
        listing
    }

    /// Resolves and validates a request without touching the network.
    pub fn validate(&self, request: &ToolCallRequest) -> Result<&ToolDefinition, AppError> {
        let registered = self
            .tools
            .get(&request.name)
            .ok_or_else(|| AppError::UnknownTool(request.name.clone()))?;
        registered.tool.validate(&request.arguments)?;
        Ok(&registered.definition)
    }

    /// Lets the tool adjust the arguments of an approved sensitive call.
    pub fn prepare_approved(&self, request: &mut ToolCallRequest) {
        if let Some(registered) = self.tools.get(&request.name) {
            registered.tool.prepare_approved(&mut request.arguments);
        }
    }

    pub async fn execute_tool(
        &self,
        backend: &dyn BankBackend,
        request: &ToolCallRequest,
    ) -> ToolCallResult {
        if let Err(e) = self.validate(request) {
            log::warn!("Rejected tool call {}: {}", request.call_id, e);
            return ToolCallResult::failure(request, &e);
        }
        let registered = &self.tools[&request.name];

        match registered.tool.execute(backend, request.arguments.clone()).await {
            Ok(payload) => {
                log::info!("Successfully executed tool call {} ({})", request.call_id, request.name);
                ToolCallResult::success(request, payload)
            }
            Err(e) => {
                log::warn!("Error executing tool call {} ({}): {}", request.call_id, request.name, e);
                ToolCallResult::failure(request, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;
    use serde_json::json;

    fn request(name: &str, arguments: JsonValue) -> ToolCallRequest {
        ToolCallRequest {
            call_id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_load_registers_all_banking_tools() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        for expected in [
            "list_customers_basic",
            "get_customer",
            "get_accounts",
            "get_customer_dti",
            "get_employment_score",
            "get_customer_loans",
            "web_search",
            "apply_for_loan",
            "transfer_funds",
        ] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_kinds_follow_http_method() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        for definition in registry.definitions() {
            match definition.operation.method {
                crate::models::types::HttpMethod::Get => assert_eq!(definition.kind, ToolKind::Resource),
                crate::models::types::HttpMethod::Post => assert_eq!(definition.kind, ToolKind::Tool),
            }
        }
    }

    #[test]
    fn test_sensitivity_comes_from_policy() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        assert!(registry.definition("apply_for_loan").unwrap().sensitive);
        assert!(registry.definition("transfer_funds").unwrap().sensitive);
        assert!(!registry.definition("get_accounts").unwrap().sensitive);

        let strict = ToolRegistry::load(ApprovalPolicy::new(["GET_"])).unwrap();
        assert!(strict.definition("get_accounts").unwrap().sensitive);
        assert!(!strict.definition("transfer_funds").unwrap().sensitive);
    }

    #[test]
    fn test_policy_matches_substring_ignoring_case() {
        let policy = ApprovalPolicy::new(["Apply_For_Loan", " "]);
        assert!(policy.requires_approval("apply_for_loan_loans_apply_post"));
        assert!(!policy.requires_approval("get_customer"));
    }

    #[test]
    fn test_check_rejects_duplicates() {
        let mut registry = ToolRegistry::new(ApprovalPolicy::default());
        registry.register(crate::tools::get_customer_tool::GetCustomerTool);
        registry.register(crate::tools::get_customer_tool::GetCustomerTool);
        assert!(matches!(registry.check(), Err(AppError::RegistryError(_))));
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_backend() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        let backend = RecordingBackend::new(json!({}));

        let result = registry
            .execute_tool(&backend, &request("drop_all_tables", json!({})))
            .await;
        assert!(!result.is_success());
        assert!(result.to_content().contains("not found"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_backend() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        let backend = RecordingBackend::new(json!({}));

        let result = registry
            .execute_tool(&backend, &request("get_accounts", json!({"customer": "C001"})))
            .await;
        assert!(!result.is_success());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_forwards_operation_and_arguments() {
        let registry = ToolRegistry::load(ApprovalPolicy::default()).unwrap();
        let backend = RecordingBackend::new(json!([{"account_id": "A1", "balance": 10.0}]));

        let result = registry
            .execute_tool(&backend, &request("get_accounts", json!({"customer_id": "C001"})))
            .await;
        assert!(result.is_success());

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0.path, "/customers/{customer_id}/accounts");
        assert_eq!(calls[0].1, json!({"customer_id": "C001"}));
    }
}
