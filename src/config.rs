use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "llama3.2";
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
const DEFAULT_DOCUMENT_LANGUAGE: &str = "pl";
const DEFAULT_SUMMARY_LOG_PATH: &str = "summaries.csv";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the newsdigest binaries.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the Ollama runtime serving summarization, translation, and embeddings.
    pub ollama_url: String,
    /// Model used when a request does not name one.
    pub summarization_model: String,
    /// Model used for the translate-summarize-translate variant.
    pub translation_model: String,
    /// ISO language code of incoming articles.
    pub document_language: String,
    /// Embedding provider used by the ranked reduction stage.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of vectors produced by the hashing provider.
    pub embedding_dimension: usize,
    /// Upper bound on chunk length in characters.
    pub max_chunk_chars: usize,
    /// Character budget applied when callers omit `max_length`.
    pub default_max_length: usize,
    /// Character budget applied when callers omit `min_length`.
    pub default_min_length: usize,
    /// Behavior when a single chunk cannot be summarized.
    pub chunk_failure_policy: ChunkFailurePolicy,
    /// Optional CSV file receiving one row per produced summary.
    pub summary_log_path: Option<String>,
    /// Timeout applied to model HTTP calls.
    pub request_timeout_secs: u64,
    /// Timeout applied to article fetches.
    pub fetch_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends for the ranked reduction stage.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime (`/api/embed`).
    Ollama,
    /// Deterministic byte-hash vectors computed in-process.
    Hashing,
}

/// What the pipeline does when summarizing an individual chunk fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkFailurePolicy {
    /// Log the failure, drop the chunk, and keep going.
    #[default]
    Skip,
    /// Abort the whole run on the first failed chunk.
    FailFast,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summarization_model = load_env_or("SUMMARIZATION_MODEL", DEFAULT_SUMMARIZATION_MODEL);
        let translation_model =
            load_env_optional("TRANSLATION_MODEL").unwrap_or_else(|| summarization_model.clone());
        let summary_log_path = match env::var("SUMMARY_LOG_PATH") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value),
            Err(_) => Some(DEFAULT_SUMMARY_LOG_PATH.to_string()),
        };

        let config = Self {
            ollama_url: load_env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL),
            summarization_model,
            translation_model,
            document_language: load_env_or("DOCUMENT_LANGUAGE", DEFAULT_DOCUMENT_LANGUAGE)
                .to_lowercase(),
            embedding_provider: parse_env_or(
                "EMBEDDING_PROVIDER",
                EmbeddingProvider::Hashing,
            )?,
            embedding_model: load_env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            embedding_dimension: parse_env_or("EMBEDDING_DIMENSION", 256)?,
            max_chunk_chars: parse_env_or("MAX_CHUNK_CHARS", 1000)?,
            default_max_length: parse_env_or("DEFAULT_MAX_LENGTH", 500)?,
            default_min_length: parse_env_or("DEFAULT_MIN_LENGTH", 200)?,
            chunk_failure_policy: parse_env_or("CHUNK_FAILURE_POLICY", ChunkFailurePolicy::Skip)?,
            summary_log_path,
            request_timeout_secs: parse_env_or("REQUEST_TIMEOUT_SECS", 120)?,
            fetch_timeout_secs: parse_env_or("FETCH_TIMEOUT_SECS", 10)?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };

        if config.max_chunk_chars == 0 {
            return Err(ConfigError::InvalidValue("MAX_CHUNK_CHARS".into()));
        }
        if config.default_max_length == 0 || config.default_min_length == 0 {
            return Err(ConfigError::InvalidValue("DEFAULT_MAX_LENGTH".into()));
        }
        if config.embedding_provider == EmbeddingProvider::Hashing
            && config.embedding_dimension == 0
        {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }

        Ok(config)
    }
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" | "hash" => Ok(Self::Hashing),
            _ => Err(()),
        }
    }
}

impl FromStr for ChunkFailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "skip" | "skip_and_continue" => Ok(Self::Skip),
            "fail_fast" | "strict" => Ok(Self::FailFast),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        ollama_url = %config.ollama_url,
        model = %config.summarization_model,
        embedding_provider = ?config.embedding_provider,
        max_chunk_chars = config.max_chunk_chars,
        policy = ?config.chunk_failure_policy,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    let _ = CONFIG.set(config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_policy_accepts_aliases() {
        assert_eq!("skip".parse(), Ok(ChunkFailurePolicy::Skip));
        assert_eq!("fail-fast".parse(), Ok(ChunkFailurePolicy::FailFast));
        assert_eq!("STRICT".parse(), Ok(ChunkFailurePolicy::FailFast));
        assert!("sometimes".parse::<ChunkFailurePolicy>().is_err());
    }

    #[test]
    fn embedding_provider_parses_case_insensitively() {
        assert_eq!("Ollama".parse(), Ok(EmbeddingProvider::Ollama));
        assert_eq!("hashing".parse(), Ok(EmbeddingProvider::Hashing));
        assert!("openai".parse::<EmbeddingProvider>().is_err());
    }
}
