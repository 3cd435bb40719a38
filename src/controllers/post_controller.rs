use std::env;
use std::fs;
use std::io;
use std::process::Command;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::error::AgoratuiError;
use crate::models::client::ApiClient;
use crate::models::post::Post;

pub async fn publish(client: &ApiClient, content: String) -> Result<Post, AgoratuiError> {
    client.create_post(&content, None).await
}

/// Draft text in `$EDITOR`, optionally seeded with existing content (edit
/// flows). Empty drafts are rejected rather than sent.
pub fn create_post_via_editor(initial: Option<&str>) -> Result<String, AgoratuiError> {
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let mut temp_path = env::temp_dir();
    temp_path.push("agoratui-draft");

    match initial {
        Some(text) => fs::write(&temp_path, text)?,
        None => {
            let _ = fs::remove_file(&temp_path);
        }
    }

    let status = Command::new(editor).arg(&temp_path).status()?;

    if !status.success() {
        return Err(AgoratuiError::Io(
            "editor exited with non-zero status".to_string(),
        ));
    }

    let content = fs::read_to_string(&temp_path).unwrap_or_default();
    let _ = fs::remove_file(&temp_path);

    let content = content.trim_end().to_string();
    if content.is_empty() {
        return Err(AgoratuiError::Io("empty draft, nothing to send".to_string()));
    }
    Ok(content)
}

/// Editor session from inside the TUI: drop raw mode and the alternate
/// screen for the duration, then come back. The caller clears the terminal
/// afterwards so the next draw starts from a clean buffer.
pub fn edit_in_terminal(initial: Option<&str>) -> Result<String, AgoratuiError> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    let result = create_post_via_editor(initial);

    execute!(io::stdout(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    result
}
