//! AI client module for knowledge summaries and relevance selection.

mod client;
mod prompts;

pub use client::*;
pub use prompts::{
    format_selection_prompt, format_summary_request, NONE_MARKER, SELECTION_SYSTEM_PROMPT,
    SUMMARY_SYSTEM_PROMPT,
};
