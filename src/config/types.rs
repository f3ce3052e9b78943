//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::knowledge::{ContextMapping, DEFAULT_CONTEXT_KEY};

/// Base prompt used when no system prompt file is available.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful personal assistant.";

/// AI provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(alias = "google")]
    Gemini,
    #[serde(alias = "anthropic")]
    Claude,
    #[default]
    OpenAi,
}

/// Configuration for the remote selection client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Provider to use (openai, claude or gemini).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model used for summaries and selection.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable name for the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-call timeout in seconds; expiry falls back to keyword matching.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries on 5xx responses. Zero means a failed call fails immediately.
    #[serde(default)]
    pub max_retries: u32,
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

/// Knowledge base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Directory holding one markdown document per knowledge key.
    pub directory: PathBuf,
    /// File holding the base system prompt.
    pub system_prompt_path: PathBuf,
    /// Key used when no keyword matches.
    pub default_key: String,
    /// Whether the model-backed selector is consulted.
    pub intelligent_selection: bool,
    /// Keyword mappings applied over the built-in table.
    pub mappings: Vec<ContextMapping>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/knowledge"),
            system_prompt_path: PathBuf::from("data/system-prompt.md"),
            default_key: DEFAULT_CONTEXT_KEY.to_string(),
            intelligent_selection: true,
            mappings: Vec::new(),
        }
    }
}

impl KnowledgeConfig {
    /// Read the base system prompt, falling back to [`DEFAULT_SYSTEM_PROMPT`].
    #[must_use]
    pub fn base_prompt(&self) -> String {
        match std::fs::read_to_string(&self.system_prompt_path) {
            Ok(prompt) if !prompt.trim().is_empty() => prompt,
            Ok(_) => DEFAULT_SYSTEM_PROMPT.to_string(),
            Err(e) => {
                tracing::debug!(
                    path = %self.system_prompt_path.display(),
                    error = %e,
                    "No system prompt file, using default"
                );
                DEFAULT_SYSTEM_PROMPT.to_string()
            }
        }
    }
}

/// Status server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            cors_permissive: true,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub knowledge: KnowledgeConfig,
    pub server: ServerConfig,
    /// Default chat model id from the catalogue.
    pub default_model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-4.1-mini");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_ai_config_deserialize_claude_alias() {
        let toml = r#"
            provider = "anthropic"
            model = "claude-3-haiku-20240307"
            base_url = "https://api.anthropic.com"
            api_key_env = "ANTHROPIC_API_KEY"
        "#;
        let config: AiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, ProviderKind::Claude);
        assert_eq!(config.model, "claude-3-haiku-20240307");
        assert_eq!(config.timeout_secs, 20);
    }

    #[test]
    fn test_ai_config_deserialize_gemini() {
        let toml = r#"
            provider = "gemini"
            model = "gemini-1.5-flash"
            timeout_secs = 5
        "#;
        let config: AiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_knowledge_config_defaults() {
        let config = KnowledgeConfig::default();
        assert_eq!(config.directory, PathBuf::from("data/knowledge"));
        assert_eq!(config.default_key, "personal");
        assert!(config.intelligent_selection);
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn test_base_prompt_falls_back_to_default() {
        let config = KnowledgeConfig {
            system_prompt_path: PathBuf::from("/nonexistent/system-prompt.md"),
            ..KnowledgeConfig::default()
        };
        assert_eq!(config.base_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_base_prompt_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system-prompt.md");
        std::fs::write(&path, "You are Tin.").unwrap();

        let config = KnowledgeConfig {
            system_prompt_path: path,
            ..KnowledgeConfig::default()
        };
        assert_eq!(config.base_prompt(), "You are Tin.");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3001);
        assert!(config.cors_permissive);
    }
}
