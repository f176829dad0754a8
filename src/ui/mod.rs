use crate::assistant::events::{AssistantEvent, EventReceiver};
use crate::models::types::AppError;
use crate::utils::common::{print_colorful, truncate_chars};

use crossterm::style::Color;
use serde_json::Value as JsonValue;

const MAX_PAYLOAD_CHARS: usize = 600;

/// Prints relay events for the terminal session.
#[derive(Default)]
pub struct ConsoleRenderer {
    in_reply: bool,
}

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes events until the current turn completes or the relay closes.
    pub async fn render_turn(&mut self, events: &mut EventReceiver) -> Result<(), AppError> {
        while let Some(event) = events.recv().await {
            let done = event == AssistantEvent::TurnComplete;
            self.render(&event)?;
            if done {
                break;
            }
        }
        Ok(())
    }

    fn render(&mut self, event: &AssistantEvent) -> Result<(), AppError> {
        if let AssistantEvent::AssistantDelta { text } = event {
            if !self.in_reply {
                print_colorful("Assistant: ", Color::Cyan)?;
                self.in_reply = true;
            }
            return print_colorful(text, Color::Cyan);
        }

        if self.in_reply {
            println!();
            self.in_reply = false;
        }
        match format_event(event) {
            Some((line, color)) => print_colorful(&line, color),
            None => Ok(()),
        }
    }
}

/// Line and color for every event except streamed text.
pub fn format_event(event: &AssistantEvent) -> Option<(String, Color)> {
    match event {
        AssistantEvent::ToolCallStart { name, arguments, .. } => Some((
            format!("[tool] {}({})\n", name, compact(arguments)),
            Color::Magenta,
        )),
        AssistantEvent::ToolCallResult {
            name,
            success,
            payload,
            ..
        } => {
            let color = if *success { Color::Magenta } else { Color::Red };
            Some((format!("[tool] {} => {}\n", name, compact(payload)), color))
        }
        AssistantEvent::ApprovalRequired { request } => Some((
            format!(
                "[approval] `{}` needs your approval\n    {}\n    arguments: {}\n",
                request.call.name,
                request.description,
                compact(&request.call.arguments)
            ),
            Color::Blue,
        )),
        AssistantEvent::ApprovalResolved { approved, .. } => {
            let verdict = if *approved { "approved" } else { "rejected" };
            Some((format!("[approval] {}\n", verdict), Color::Blue))
        }
        AssistantEvent::Error { message } => Some((format!("[error] {}\n", message), Color::Red)),
        AssistantEvent::AssistantDelta { .. } | AssistantEvent::TurnComplete => None,
    }
}

fn compact(value: &JsonValue) -> String {
    truncate_chars(&value.to_string(), MAX_PAYLOAD_CHARS)
}
