use crate::models::types::{AppError, ToolCallResult};

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user_input: String,
    pub assistant_message: String,
    pub tool_calls: Vec<ToolCallResult>,
}

/// Append-only JSONL log with one record per completed turn.
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            path: dir.into().join("interactions.jsonl"),
        }
    }

    pub fn append(&self, record: &InteractionRecord) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }
}
