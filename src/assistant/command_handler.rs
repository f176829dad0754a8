use crate::models::types::AppError;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Exit,
    ListTools,
    ListConversations,
    LoadConversation(String),
    NewConversation,
    Prompt(String),
    Empty,
}

pub fn parse_command(input: &str) -> Result<Command, AppError> {
    let input = input.trim();
    let lowered = input.to_lowercase();

    if input.is_empty() {
        Ok(Command::Empty)
    } else if lowered == "exit" || lowered == "quit" {
        Ok(Command::Exit)
    } else if lowered == "list tools" {
        Ok(Command::ListTools)
    } else if lowered == "list conversations" {
        Ok(Command::ListConversations)
    } else if lowered == "new" {
        Ok(Command::NewConversation)
    } else if lowered == "load" || lowered.starts_with("load ") {
        let parts: Vec<&str> = input.splitn(2, ' ').collect();
        match parts.get(1).map(|id| id.trim()) {
            Some(id) if !id.is_empty() => Ok(Command::LoadConversation(id.to_string())),
            _ => Err(AppError::CommandError(
                "Usage: load <conversation id>".to_string(),
            )),
        }
    } else {
        Ok(Command::Prompt(input.to_string()))
    }
}
