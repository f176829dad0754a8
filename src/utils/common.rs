use crate::models::types::AppError;

use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

// Utility function to print to console with the specified color
pub fn print_colorful(message: &str, color: Color) -> Result<(), AppError> {
    let mut stdout = io::stdout();

    stdout.execute(SetForegroundColor(color))?;
    print!("{}", message);
    stdout.execute(ResetColor)?;

    stdout.flush().map_err(AppError::from)
}

// Blocking read of one line from stdin without the trailing newline, `None` at EOF
fn read_line() -> Result<Option<String>, AppError> {
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

/// Lines typed by the user. One reader thread owns stdin; a caller that
/// stops waiting, such as an expired approval, leaves the next line queued.
#[derive(Clone)]
pub struct LineSource {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl LineSource {
    pub fn channel() -> (mpsc::UnboundedSender<String>, LineSource) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, LineSource { rx: Arc::new(Mutex::new(rx)) })
    }

    pub fn stdin() -> LineSource {
        let (tx, source) = Self::channel();
        // runtime shutdown must not wait on a pending read
        std::thread::spawn(move || loop {
            match read_line() {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        });
        source
    }

    /// Next line, `None` once input is closed. Cancel safe.
    pub async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

// Shortens `text` to at most `max` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
