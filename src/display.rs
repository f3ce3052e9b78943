//! Colored CLI display utilities for knowledge output.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::knowledge::{KnowledgeStatus, RelevantContext};

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// First non-blank line of a document, for previews.
#[must_use]
pub fn preview(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    truncate(line, DEFAULT_MAX_LEN)
}

/// Print the loaded knowledge keys and selector state.
pub fn print_status(status: &KnowledgeStatus) {
    println!(
        "{} {}",
        "[KNOWLEDGE]".blue().bold(),
        status.directory.display().to_string().cyan()
    );
    if status.knowledge_keys.is_empty() {
        println!("  {}", "no documents loaded".dimmed());
    }
    for key in &status.knowledge_keys {
        let marker = if *key == status.default_key {
            " (default)"
        } else {
            ""
        };
        println!("  {}{}", key.green(), marker.dimmed());
    }
    let selection = if status.intelligent_selection && status.remote_selector_configured {
        "intelligent".green().to_string()
    } else {
        "keyword".yellow().to_string()
    };
    println!("{} {}", "[SELECTION]".blue().bold(), selection);
    let _ = io::stdout().flush();
}

/// Print which documents were chosen for a prompt.
pub fn print_sources(context: &[RelevantContext]) {
    if context.is_empty() {
        eprintln!("{} {}", "[SOURCES]".magenta().bold(), "none".dimmed());
        return;
    }
    for entry in context {
        eprintln!(
            "{} {} {}",
            "[SOURCES]".magenta().bold(),
            entry.source.green(),
            preview(&entry.content).dimmed()
        );
    }
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message.red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_tiny_limit() {
        assert_eq!(truncate("hello", 2), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("café au lait", 7), "café...");
    }

    #[test]
    fn test_preview_skips_blank_lines() {
        assert_eq!(preview("\n\n  # Work\nDetails"), "# Work");
        assert_eq!(preview(""), "");
    }
}
