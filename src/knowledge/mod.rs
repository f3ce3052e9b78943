//! Personal knowledge selection and system prompt assembly.
//!
//! Knowledge lives in a directory of markdown documents. For each message the
//! manager picks relevant documents, either through a remote model (cached) or
//! through static keyword tables, and appends them to the base system prompt.

mod cache;
mod composer;
mod keywords;
mod manager;
mod selector;
mod store;
mod summaries;

pub use cache::*;
pub use composer::*;
pub use keywords::*;
pub use manager::*;
pub use selector::*;
pub use store::*;
pub use summaries::*;
