//! HTTP handlers for the status endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::api::{
    CommandResponse, HealthResponse, MappingRequest, PromptRequest, PromptResponse, ToggleRequest,
};
use crate::config::ModelCatalog;
use crate::knowledge::{compose, KnowledgeManager, KnowledgeStatus};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide knowledge manager.
    pub knowledge: Arc<KnowledgeManager>,
    /// Chat model catalogue.
    pub models: Arc<ModelCatalog>,
    /// Base system prompt used when a request supplies none.
    pub base_prompt: Arc<str>,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(knowledge: Arc<KnowledgeManager>, models: ModelCatalog, base_prompt: &str) -> Self {
        Self {
            knowledge,
            models: Arc::new(models),
            base_prompt: Arc::from(base_prompt),
        }
    }
}

/// GET /health - Liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// GET /api/models - Chat model catalogue.
pub async fn get_models(State(state): State<AppState>) -> Json<ModelCatalog> {
    Json(state.models.as_ref().clone())
}

/// GET /api/knowledge/status - Knowledge manager introspection.
pub async fn get_knowledge_status(State(state): State<AppState>) -> Json<KnowledgeStatus> {
    Json(state.knowledge.status())
}

/// POST /api/knowledge/reload - Re-read the knowledge directory.
pub async fn post_reload(State(state): State<AppState>) -> (StatusCode, Json<CommandResponse>) {
    let knowledge = Arc::clone(&state.knowledge);
    match tokio::task::spawn_blocking(move || knowledge.reload()).await {
        Ok(count) => (
            StatusCode::OK,
            Json(CommandResponse::success(format!(
                "Knowledge reloaded ({count} documents)"
            ))),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Knowledge reload task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CommandResponse::error("Reload failed", e.to_string())),
            )
        }
    }
}

/// POST /api/knowledge/clear-cache - Drop cached selections and summaries.
pub async fn post_clear_cache(State(state): State<AppState>) -> Json<CommandResponse> {
    state.knowledge.clear_cache();
    Json(CommandResponse::success("Selection cache cleared"))
}

/// PUT /api/knowledge/intelligent - Toggle model-backed selection.
pub async fn put_intelligent(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> Json<CommandResponse> {
    state.knowledge.set_intelligent_selection(request.enabled);
    let word = if request.enabled { "enabled" } else { "disabled" };
    Json(CommandResponse::success(format!(
        "Intelligent selection {word}"
    )))
}

/// POST /api/knowledge/mappings - Replace or insert a keyword mapping.
pub async fn post_mapping(
    State(state): State<AppState>,
    Json(request): Json<MappingRequest>,
) -> (StatusCode, Json<CommandResponse>) {
    let key = request.key.trim();
    if key.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse::error("Mapping rejected", "key is empty")),
        );
    }

    state.knowledge.add_context_mapping(key, &request.keywords);
    (
        StatusCode::OK,
        Json(CommandResponse::success(format!("Mapping for {key} saved"))),
    )
}

/// POST /api/prompt - Compose the system prompt for a message.
pub async fn post_prompt(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> Json<PromptResponse> {
    let context = if request.intelligent {
        state
            .knowledge
            .find_relevant_context_intelligent(&request.message)
            .await
    } else {
        state.knowledge.find_relevant_context(&request.message)
    };

    let base = request
        .base_prompt
        .as_deref()
        .unwrap_or(&state.base_prompt);

    Json(PromptResponse {
        prompt: compose(base, &context),
        sources: context.into_iter().map(|c| c.source).collect(),
    })
}
