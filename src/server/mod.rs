//! HTTP status server for the knowledge manager.

mod api;
mod error;
mod handlers;
mod server;

pub use api::{
    CommandResponse, HealthResponse, MappingRequest, PromptRequest, PromptResponse, ToggleRequest,
};
pub use error::ServerError;
pub use handlers::AppState;
pub use server::StatusServer;
