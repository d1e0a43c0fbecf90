//! Process configuration read from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use savor_model::{DEFAULT_MAX_SESSIONS, DEFAULT_MAX_TURNS};
use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_DOCUMENT_ROOT: &str = "./resources";
pub const DEFAULT_CHUNK_TOKENS: usize = 800;

/// Metadata keys that user preferences may constrain in personalized RAG chat.
pub const DEFAULT_FILTERABLE_FIELDS: [&str; 3] = ["location", "cuisine", "priceRange"];

/// Which backend serves chat completions and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelProvider {
    /// OpenAI or an OpenAI-compatible server.
    #[default]
    OpenAI,
    /// Scripted model and local hash embeddings; needs no network.
    Mock,
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "mock" => Ok(Self::Mock),
            other => Err(format!("unknown model provider '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider: ModelProvider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub document_root: PathBuf,
    pub memory_max_turns: usize,
    pub memory_max_sessions: usize,
    pub chunk_tokens: usize,
    pub filterable_fields: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            provider: ModelProvider::default(),
            openai_api_key: None,
            openai_base_url: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            document_root: PathBuf::from(DEFAULT_DOCUMENT_ROOT),
            memory_max_turns: DEFAULT_MAX_TURNS,
            memory_max_sessions: DEFAULT_MAX_SESSIONS,
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            filterable_fields: DEFAULT_FILTERABLE_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ServerConfig {
    /// Read `SAVOR_*` and `OPENAI_*` variables, keeping defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Values that fail to parse are logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            host: get("SAVOR_HOST").unwrap_or(defaults.host),
            port: parse_or(get("SAVOR_PORT"), "SAVOR_PORT", defaults.port),
            provider: parse_or(
                get("SAVOR_MODEL_PROVIDER"),
                "SAVOR_MODEL_PROVIDER",
                defaults.provider,
            ),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            chat_model: get("SAVOR_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: get("SAVOR_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            document_root: get("SAVOR_DOCUMENT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.document_root),
            memory_max_turns: parse_or(
                get("SAVOR_MEMORY_MAX_TURNS"),
                "SAVOR_MEMORY_MAX_TURNS",
                defaults.memory_max_turns,
            ),
            memory_max_sessions: parse_or(
                get("SAVOR_MEMORY_MAX_SESSIONS"),
                "SAVOR_MEMORY_MAX_SESSIONS",
                defaults.memory_max_sessions,
            ),
            chunk_tokens: parse_or(
                get("SAVOR_CHUNK_TOKENS"),
                "SAVOR_CHUNK_TOKENS",
                defaults.chunk_tokens,
            ),
            filterable_fields: get("SAVOR_FILTER_FIELDS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.filterable_fields),
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(key, value = %raw, error = %e, fallback = ?default, "ignoring invalid setting");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = config(&[]);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.provider, ModelProvider::OpenAI);
        assert_eq!(config.memory_max_turns, 20);
        assert_eq!(config.memory_max_sessions, 1024);
        assert_eq!(config.chunk_tokens, 800);
        assert_eq!(config.filterable_fields, ["location", "cuisine", "priceRange"]);
    }

    #[test]
    fn variables_override_defaults() {
        let config = config(&[
            ("SAVOR_PORT", "9000"),
            ("SAVOR_MODEL_PROVIDER", "Mock"),
            ("SAVOR_DOCUMENT_ROOT", "/srv/guides"),
            ("SAVOR_FILTER_FIELDS", "location, district"),
            ("SAVOR_MEMORY_MAX_SESSIONS", "16"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.provider, ModelProvider::Mock);
        assert_eq!(config.document_root, PathBuf::from("/srv/guides"));
        assert_eq!(config.filterable_fields, ["location", "district"]);
        assert_eq!(config.memory_max_sessions, 16);
        assert_eq!(config.openai_base_url.as_deref(), Some("http://localhost:11434/v1"));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = config(&[("SAVOR_PORT", "eighty"), ("SAVOR_MEMORY_MAX_TURNS", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.memory_max_turns, DEFAULT_MAX_TURNS);
    }

    #[test]
    fn blank_values_count_as_unset() {
        assert_eq!(config(&[("OPENAI_API_KEY", "  ")]).openai_api_key, None);
    }
}
