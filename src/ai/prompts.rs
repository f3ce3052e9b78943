//! Prompts for the remote summary and selection calls.

use std::collections::BTreeMap;

/// Marker the selector answers with when no document is relevant.
pub const NONE_MARKER: &str = "NONE";

/// System prompt for per-document summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = r"You summarize personal knowledge documents about a user.

Write a 2-3 sentence summary of the document focused on the themes it covers
(for example: biography, work, hobbies, health, relationships, goals).
Do not quote the document. Respond with the summary only.";

/// System prompt for choosing relevant documents.
pub const SELECTION_SYSTEM_PROMPT: &str = r"You decide which personal knowledge documents are relevant to a user's message.

You are given a list of document keys with a short summary of each, followed by
the user's message. Reply with a comma-separated list of the relevant keys,
exactly as written, and nothing else. If no document is relevant, reply with NONE.";

/// Format the user turn of a summary request.
#[must_use]
pub fn format_summary_request(key: &str, excerpt: &str) -> String {
    format!(
        r"Document: {key}

{excerpt}

Summarize this document."
    )
}

/// Format the selection prompt listing each key with its summary.
#[must_use]
pub fn format_selection_prompt(summaries: &BTreeMap<String, String>, message: &str) -> String {
    let listing = summaries
        .iter()
        .map(|(key, summary)| format!("- {key}: {summary}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r"Available documents:
{listing}

User message:
{message}

Which documents are relevant? Answer with comma-separated keys or {NONE_MARKER}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selection_prompt_lists_every_key() {
        let mut summaries = BTreeMap::new();
        summaries.insert("work".to_string(), "Career history.".to_string());
        summaries.insert("personal".to_string(), "Basic biography.".to_string());

        let prompt = format_selection_prompt(&summaries, "Tell me about my job");

        assert!(prompt.contains("- personal: Basic biography."));
        assert!(prompt.contains("- work: Career history."));
        assert!(prompt.contains("Tell me about my job"));
        assert!(prompt.contains(NONE_MARKER));
        // BTreeMap keeps listing order stable.
        assert!(prompt.find("- personal").unwrap() < prompt.find("- work").unwrap());
    }

    #[test]
    fn test_format_summary_request() {
        let request = format_summary_request("interests", "Plays chess on weekends.");
        assert!(request.starts_with("Document: interests"));
        assert!(request.contains("Plays chess on weekends."));
    }

    #[test]
    fn test_selection_prompt_mentions_none_marker() {
        assert!(SELECTION_SYSTEM_PROMPT.contains(NONE_MARKER));
    }
}
