//! System prompt composition from selected knowledge.

use serde::{Deserialize, Serialize};

use super::store::DocumentMap;

/// Header opening the personal-context block.
pub const CONTEXT_HEADER: &str = "## Relevant personal context of the user you are talking to";

/// Sentence closing the personal-context block.
pub const CLOSING_INSTRUCTION: &str = "Use the personal context above only where it is relevant to the user's message; do not recite it or bring it up unprompted.";

/// A selected document, ready for composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantContext {
    /// Knowledge key the content came from.
    pub source: String,
    pub content: String,
}

/// Subheading text for a key: underscores become spaces, upper-cased.
#[must_use]
pub fn section_title(source: &str) -> String {
    source.replace('_', " ").to_uppercase()
}

/// Look up `keys` in `documents`, keeping order and dropping unknown keys.
#[must_use]
pub fn resolve_context(keys: &[String], documents: &DocumentMap) -> Vec<RelevantContext> {
    keys.iter()
        .filter_map(|key| documents.get(key))
        .map(|doc| RelevantContext {
            source: doc.key.clone(),
            content: doc.content.clone(),
        })
        .collect()
}

/// Append `context` to `base_prompt`.
///
/// With no context the base prompt is returned exactly as given.
#[must_use]
pub fn compose(base_prompt: &str, context: &[RelevantContext]) -> String {
    if context.is_empty() {
        return base_prompt.to_string();
    }

    let mut prompt = format!("{base_prompt}\n\n{CONTEXT_HEADER}\n\n");
    for entry in context {
        prompt.push_str("### From ");
        prompt.push_str(&section_title(&entry.source));
        prompt.push('\n');
        prompt.push_str(&entry.content);
        prompt.push_str("\n\n");
    }
    prompt.push_str(CLOSING_INSTRUCTION);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeDocument;

    const BASE: &str = "You are a helpful assistant.";

    fn ctx(source: &str, content: &str) -> RelevantContext {
        RelevantContext {
            source: source.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_empty_context_returns_base_prompt_exactly() {
        assert_eq!(compose(BASE, &[]), BASE);
        assert_eq!(compose("  padded \n", &[]), "  padded \n");
        assert_eq!(compose("", &[]), "");
    }

    #[test]
    fn test_single_context() {
        let prompt = compose(
            BASE,
            &[ctx("personal", "User is a software engineer living in London.")],
        );

        assert!(prompt.starts_with(BASE));
        assert!(prompt.contains(CONTEXT_HEADER));
        assert!(prompt.contains("### From PERSONAL\nUser is a software engineer living in London.\n\n"));
        assert!(prompt.ends_with(CLOSING_INSTRUCTION));
    }

    #[test]
    fn test_multiple_contexts_keep_order() {
        let prompt = compose(
            BASE,
            &[
                ctx("personal", "Lives in London, age 35."),
                ctx("work", "Software engineer at Meta."),
                ctx("interests", "Enjoys basketball and philosophy."),
            ],
        );

        let personal = prompt.find("### From PERSONAL\nLives in London, age 35.").unwrap();
        let work = prompt.find("### From WORK\nSoftware engineer at Meta.").unwrap();
        let interests = prompt
            .find("### From INTERESTS\nEnjoys basketball and philosophy.")
            .unwrap();
        assert!(personal < work && work < interests);
        assert_eq!(prompt.matches("### From ").count(), 3);
    }

    #[test]
    fn test_underscores_become_spaces() {
        let prompt = compose(BASE, &[ctx("work_history", "Previous job details.")]);
        assert!(prompt.contains("### From WORK HISTORY"));
        assert_eq!(section_title("long_term_goals"), "LONG TERM GOALS");
    }

    #[test]
    fn test_resolve_context_drops_missing_keys() {
        let mut documents = DocumentMap::new();
        documents.insert(
            "work".to_string(),
            KnowledgeDocument {
                key: "work".to_string(),
                content: "Work content".to_string(),
            },
        );

        let keys = vec!["ghost".to_string(), "work".to_string()];
        let resolved = resolve_context(&keys, &documents);
        assert_eq!(resolved, vec![ctx("work", "Work content")]);
    }
}
