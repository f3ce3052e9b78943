//! Personal Knowledge - context selection and system prompt assembly.

pub mod ai;
pub mod config;
pub mod display;
pub mod knowledge;
pub mod server;
