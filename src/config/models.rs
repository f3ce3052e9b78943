//! Chat model catalogue.

use serde::{Deserialize, Serialize};

use super::{ConfigError, ProviderKind};

/// Model id used when none is requested.
pub const DEFAULT_MODEL_ID: &str = "gpt-4.1";

/// A chat model the assistant can route to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSpec {
    /// Catalogue id shown to the user.
    pub id: String,
    /// Provider serving the model.
    pub provider: ProviderKind,
    /// Provider-side model name.
    pub name: String,
}

impl ModelSpec {
    fn new(id: &str, provider: ProviderKind, name: &str) -> Self {
        Self {
            id: id.to_string(),
            provider,
            name: name.to_string(),
        }
    }
}

/// Ordered list of known chat models with a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub default_model: String,
    pub models: Vec<ModelSpec>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        use ProviderKind::{Claude, Gemini, OpenAi};

        let models = vec![
            ModelSpec::new("gpt-4.1", OpenAi, "gpt-4.1"),
            ModelSpec::new("gpt-4.1-mini", OpenAi, "gpt-4.1-mini"),
            ModelSpec::new("gpt-4.1-nano", OpenAi, "gpt-4.1-nano"),
            ModelSpec::new("gpt-4o", OpenAi, "gpt-4o"),
            ModelSpec::new("gpt-3.5-turbo", OpenAi, "gpt-3.5-turbo"),
            ModelSpec::new("claude-3.5-sonnet", Claude, "claude-3-5-sonnet-20241022"),
            ModelSpec::new("claude-3-sonnet", Claude, "claude-3-sonnet-20240229"),
            ModelSpec::new("claude-3-haiku", Claude, "claude-3-haiku-20240307"),
            ModelSpec::new("gemini-2.0-flash", Gemini, "gemini-2.0-flash-exp"),
            ModelSpec::new("gemini-1.5-pro", Gemini, "gemini-1.5-pro"),
            ModelSpec::new("gemini-1.5-flash", Gemini, "gemini-1.5-flash"),
        ];

        Self {
            default_model: DEFAULT_MODEL_ID.to_string(),
            models,
        }
    }
}

impl ModelCatalog {
    /// Build the built-in catalogue, overriding the default model id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownModel` if `default_model` is not catalogued.
    pub fn with_default(default_model: Option<&str>) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        if let Some(id) = default_model {
            catalog.resolve(id)?;
            catalog.default_model = id.to_string();
        }
        Ok(catalog)
    }

    /// Look up a model by id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownModel` for ids not in the catalogue.
    pub fn resolve(&self, id: &str) -> Result<&ModelSpec, ConfigError> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ConfigError::UnknownModel(id.to_string()))
    }
}
