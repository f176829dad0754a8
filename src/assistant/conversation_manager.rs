use crate::models::types::{AppError, ConversationTurn, Message};

use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConversationRecord {
    pub session_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}

impl ConversationRecord {
    fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            title: None,
            created_at: Utc::now(),
            turns: vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub turn_count: usize,
}

/// Owns the ordered history of the current session and mirrors it to
/// `<dir>/<session_id>.json` after every appended turn.
pub struct ConversationManager {
    record: ConversationRecord,
    dir: PathBuf,
}

impl ConversationManager {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            record: ConversationRecord::new(),
            dir: dir.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn title(&self) -> Option<&str> {
        self.record.title.as_deref()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.record.turns
    }

    pub fn add_user_prompt(&mut self, prompt: String) {
        self.add_turn(ConversationTurn::user(prompt));
    }

    pub fn add_turn(&mut self, turn: ConversationTurn) {
        log::info!("[+] {:?} turn in session {}", turn.role, self.record.session_id);
        self.record.turns.push(turn);
        self.save();
    }

    pub fn set_title(&mut self, title: String) {
        self.record.title = Some(title);
        self.save();
    }

    /// Wire messages for the completion request, system prompt first.
    pub fn messages(&self, system_prompt: &str) -> Vec<Message> {
        let mut messages = vec![Message::new("system".to_string(), system_prompt.to_string())];
        messages.extend(self.record.turns.iter().map(ConversationTurn::to_message));
        messages
    }

    pub fn start_new(&mut self) {
        self.record = ConversationRecord::new();
        log::info!("Started conversation {}", self.record.session_id);
    }

    pub fn load_conversation(&mut self, session_id: &str) -> Result<(), AppError> {
        let content = fs::read_to_string(record_path(&self.dir, session_id))?;
        let record: ConversationRecord = serde_json::from_str(&content)?;
        log::info!(
            "Loaded conversation {} with {} turns",
            record.session_id,
            record.turns.len()
        );
        self.record = record;
        Ok(())
    }

    /// Saved conversations, newest first.
    pub fn list_conversations(&self) -> Result<Vec<ConversationSummary>, AppError> {
        let mut summaries = vec![];
        if !self.dir.exists() {
            return Ok(summaries);
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
                continue;
            }
            let record: ConversationRecord = match fs::read_to_string(&path)
                .map_err(AppError::from)
                .and_then(|content| serde_json::from_str(&content).map_err(AppError::from))
            {
                Ok(record) => record,
                Err(e) => {
                    log::warn!("Skipping unreadable conversation {}: {}", path.display(), e);
                    continue;
                }
            };
            summaries.push(ConversationSummary {
                title: record
                    .title
                    .clone()
                    .unwrap_or_else(|| "New Conversation".to_string()),
                session_id: record.session_id,
                created_at: record.created_at,
                turn_count: record.turns.len(),
            });
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // History stays in memory even when the disk write fails
    fn save(&self) {
        if let Err(e) = self.write_record() {
            log::warn!("Failed to write conversation {}: {}", self.record.session_id, e);
        }
    }

    fn write_record(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(&self.record)?;
        fs::write(record_path(&self.dir, &self.record.session_id), content)?;
        Ok(())
    }
}

fn record_path(dir: &Path, session_id: &str) -> PathBuf {
    dir.join(format!("{}.json", session_id))
}

/// Title used until (or instead of) one generated by the LLM.
pub fn fallback_title(seed: &str) -> String {
    let base = seed.trim();
    if base.is_empty() {
        return "New Conversation".to_string();
    }
    if base.chars().count() > 30 {
        format!("{}...", base.chars().take(30).collect::<String>())
    } else {
        base.to_string()
    }
}

/// Normalizes an LLM-suggested title; `None` when nothing usable is left.
pub fn clean_title(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(|c| c == '"' || c == '\'').trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() > 60 {
        let cut: String = cleaned.chars().take(57).collect();
        return Some(format!("{}...", cut.trim_end()));
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{Role, ToolCall};

    #[test]
    fn test_turns_are_appended_in_order_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConversationManager::new(dir.path());
        manager.add_user_prompt("What is Alice's balance?".to_string());
        manager.add_turn(ConversationTurn::assistant(
            String::new(),
            vec![ToolCall::new("call_1".into(), "get_accounts".into(), "{}".into())],
        ));
        manager.add_turn(ConversationTurn::tool("call_1".into(), "get_accounts".into(), "[]".into()));

        let roles: Vec<Role> = manager.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool]);

        let path = dir.path().join(format!("{}.json", manager.session_id()));
        let saved: ConversationRecord =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved.turns.len(), 3);
        assert_eq!(saved.turns[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_messages_start_with_system_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConversationManager::new(dir.path());
        manager.add_user_prompt("hello".to_string());

        let messages = manager.messages("You are a helpful loan assistant.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_load_and_list_conversations() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = ConversationManager::new(dir.path());
        first.add_user_prompt("first".to_string());
        first.set_title("Alice Balance".to_string());
        let first_id = first.session_id().to_string();

        let mut second = ConversationManager::new(dir.path());
        second.add_user_prompt("second".to_string());

        let summaries = second.list_conversations().unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].created_at >= summaries[1].created_at);

        second.load_conversation(&first_id).unwrap();
        assert_eq!(second.session_id(), first_id);
        assert_eq!(second.title(), Some("Alice Balance"));
        assert_eq!(second.turns()[0].content, "first");
    }

    #[test]
    fn test_load_missing_conversation_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ConversationManager::new(dir.path());
        assert!(manager.load_conversation("does-not-exist").is_err());
    }

    #[test]
    fn test_fallback_title() {
        assert_eq!(fallback_title("   "), "New Conversation");
        assert_eq!(fallback_title("Alice balance"), "Alice balance");
        assert_eq!(
            fallback_title("Transfer $500 from Alice's checking to savings"),
            "Transfer $500 from Alice's che..."
        );
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  \"Loan   Review\n\" "), Some("Loan Review".to_string()));
        assert_eq!(clean_title("''"), None);
        let long = "word ".repeat(20);
        let cleaned = clean_title(&long).unwrap();
        assert!(cleaned.ends_with("..."));
        assert!(cleaned.chars().count() <= 60);
    }
}
