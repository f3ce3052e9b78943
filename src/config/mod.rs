//! Configuration module.

mod loader;
mod models;
mod types;

pub use loader::*;
pub use models::*;
pub use types::*;
