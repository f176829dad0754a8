use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::assistant::DEFAULT_MAX_TOOL_ROUNDS;
use crate::registry::tool_registry::ApprovalPolicy;

/// Loan assistant chat over the banking API.
#[derive(Parser, Debug, Clone)]
#[clap(name = "teller", version)]
pub struct Settings {
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    #[clap(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[clap(long, env = "OPENAI_MODEL", default_value = "gpt-4.1")]
    pub openai_model: String,

    /// Base URL of the banking REST API
    #[clap(long, env = "BANK_API_URL", default_value = "http://localhost:8000")]
    pub bank_api_url: String,

    /// Comma separated name patterns of tools that need approval
    #[clap(
        long,
        env = "APPROVAL_TOOLS",
        default_value = "apply_for_loan,transfer_funds"
    )]
    pub approval_tools: String,

    #[clap(long, env = "APPROVAL_TIMEOUT_SECS", default_value = "300")]
    pub approval_timeout_secs: u64,

    #[clap(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    #[clap(long, env = "CONVERSATIONS_DIR", default_value = "conversations")]
    pub conversations_dir: PathBuf,

    #[clap(long, env = "MAX_TOOL_ROUNDS", default_value_t = DEFAULT_MAX_TOOL_ROUNDS)]
    pub max_tool_rounds: usize,

    #[clap(long, env = "LOG_FILE", default_value = "teller.log")]
    pub log_file: PathBuf,

    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: log::LevelFilter,

    /// Resume a saved conversation
    #[clap(long)]
    pub load: Option<String>,
}

impl Settings {
    pub fn approval_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::new(self.approval_tools.split(','))
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
