mod api;
mod assistant;
mod config;
mod models;
mod registry;
#[cfg(test)]
mod testing;
mod tools;
mod ui;
mod utils;

use api::{bank_client::HttpBankBackend, openai_service::OpenAIService};
use assistant::{
    approval_gate::{ApprovalGate, ConsoleApprover},
    command_handler::{parse_command, Command},
    conversation_manager::ConversationManager,
    events::EventRelay,
    Assistant,
};
use clap::Parser;
use config::Settings;
use crossterm::style::Color;
use dotenv::dotenv;
use models::types::AppError;
use registry::tool_registry::ToolRegistry;
use simplelog::{Config, WriteLogger};
use std::fs::OpenOptions;
use ui::ConsoleRenderer;
use utils::common::{print_colorful, LineSource};

fn init_logging(settings: &Settings) -> Result<(), AppError> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)?;
    WriteLogger::init(settings.log_level, Config::default(), log_file)
        .map_err(|e| AppError::CommandError(format!("Failed to initialize logger: {}", e)))
}

fn print_conversations(manager: &ConversationManager) -> Result<(), AppError> {
    let conversations = manager.list_conversations()?;
    if conversations.is_empty() {
        return print_colorful("No saved conversations\n", Color::DarkGreen);
    }
    let mut listing = String::new();
    for summary in conversations {
        listing.push_str(&format!(
            "{}  {}  {} ({} turns)\n",
            summary.session_id,
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.title,
            summary.turn_count
        ));
    }
    print_colorful(&listing, Color::DarkGreen)
}

fn load_conversation(manager: &mut ConversationManager, session_id: &str) -> Result<(), AppError> {
    match manager.load_conversation(session_id) {
        Ok(()) => print_colorful(
            &format!(
                "Loaded `{}` ({} turns)\n",
                manager.title().unwrap_or("New Conversation"),
                manager.turns().len()
            ),
            Color::DarkGreen,
        ),
        Err(e) => {
            log::warn!("Failed to load conversation {}: {}", session_id, e);
            print_colorful(&format!("Could not load `{}`: {}\n", session_id, e), Color::Red)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let settings = Settings::parse();
    init_logging(&settings)?;

    let registry = ToolRegistry::load(settings.approval_policy())?;
    let backend = HttpBankBackend::new(&settings.bank_api_url, settings.request_timeout())?;
    let llm = OpenAIService::new(
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
        settings.openai_base_url.clone(),
        settings.request_timeout(),
    )?;
    let lines = LineSource::stdin();
    let gate = ApprovalGate::new(
        Box::new(ConsoleApprover::new(lines.clone())),
        settings.approval_timeout(),
    );
    let (relay, mut events) = EventRelay::channel();

    let mut conversation_manager = ConversationManager::new(&settings.conversations_dir);
    if let Some(session_id) = &settings.load {
        load_conversation(&mut conversation_manager, session_id)?;
    }

    let mut assistant = Assistant::new(
        conversation_manager,
        Box::new(llm),
        registry,
        Box::new(backend),
        gate,
        relay,
    )
    .with_max_tool_rounds(settings.max_tool_rounds);
    let mut renderer = ConsoleRenderer::new();

    log::info!(
        "Session {} started against {}",
        assistant.conversation_manager().session_id(),
        settings.bank_api_url
    );

    loop {
        print_colorful("User: ", Color::Yellow)?;
        let line = match lines.next_line().await {
            Some(line) => line,
            None => break,
        };

        match parse_command(&line) {
            Ok(Command::Exit) => break,
            Ok(Command::Empty) => {}
            Ok(Command::ListTools) => {
                print_colorful(&assistant.registry().list_tools(), Color::DarkGreen)?
            }
            Ok(Command::ListConversations) => print_conversations(assistant.conversation_manager())?,
            Ok(Command::LoadConversation(session_id)) => {
                load_conversation(assistant.conversation_manager(), &session_id)?
            }
            Ok(Command::NewConversation) => {
                assistant.conversation_manager().start_new();
                print_colorful("Started a new conversation\n", Color::DarkGreen)?;
            }
            Ok(Command::Prompt(prompt)) => {
                let (outcome, rendered) = tokio::join!(
                    assistant.handle_user_input(&prompt),
                    renderer.render_turn(&mut events)
                );
                rendered?;
                if let Err(e) = outcome {
                    log::warn!("Turn ended with error: {}", e);
                }
            }
            Err(e) => {
                log::warn!("Failed to parse user command: {}", e);
                print_colorful(&format!("{}\n", e), Color::Red)?;
            }
        }
    }

    log::info!("Session ended");
    Ok(())
}
