//! Layered configuration: process environment, project `.env`, then the
//! user config file. The first provider that defines a key wins; providers
//! are never merged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use annai_core::chunker::ChunkConfig;
use annai_core::embed::EmbedConfig;
use annai_llm::ChatConfig;

/// Environment keys consumed by Annai.
pub const KEY_API_KEY: &str = "GROQ_API_KEY";
pub const KEY_MODEL: &str = "ANNAI_MODEL";
pub const KEY_EMBED_MODEL_DIR: &str = "ANNAI_EMBED_MODEL_DIR";
pub const KEY_EMBED_MODEL_ID: &str = "ANNAI_EMBED_MODEL_ID";
pub const KEY_INDEX: &str = "ANNAI_INDEX";
pub const KEY_TOP_K: &str = "ANNAI_TOP_K";
pub const KEY_CHUNK_SIZE: &str = "ANNAI_CHUNK_SIZE";
pub const KEY_CHUNK_OVERLAP: &str = "ANNAI_CHUNK_OVERLAP";
pub const KEY_TIMEOUT_SECS: &str = "ANNAI_TIMEOUT_SECS";
pub const KEY_MAX_ATTEMPTS: &str = "ANNAI_MAX_ATTEMPTS";

/// Default generation model, matching the hosted Groq deployment.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation-service credential. Its absence is only an error once a
    /// generation client is actually constructed.
    pub api_key: Option<String>,
    /// Generation model identifier.
    pub model: String,
    /// Embedding checkpoint location and identity.
    pub embed: EmbedConfig,
    /// Vector index file.
    pub index_path: PathBuf,
    /// Retrieval breadth. Independent of the three-entry output contract.
    pub top_k: usize,
    /// Chunking parameters used at build time.
    pub chunk: ChunkConfig,
    /// Hard deadline for one generation request.
    pub timeout: Duration,
    /// Attempt budget for transient generation failures.
    pub max_attempts: usize,
}

impl Config {
    /// Loads configuration through the standard provider chain.
    pub fn load() -> Self {
        Self::from_providers(&Providers::standard())
    }

    /// Generation client settings derived from this config. The client
    /// itself rejects a missing credential.
    pub fn chat_config(&self) -> ChatConfig {
        let mut chat = ChatConfig::new(
            self.api_key.clone().unwrap_or_default(),
            self.model.clone(),
        );
        chat.timeout = self.timeout;
        chat.max_attempts = self.max_attempts;
        chat
    }

    fn from_providers(providers: &Providers) -> Self {
        let embed_defaults = EmbedConfig::default();
        let chunk_defaults = ChunkConfig::default();

        Self {
            api_key: providers.get(KEY_API_KEY).map(str::to_string),
            model: providers
                .get(KEY_MODEL)
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embed: EmbedConfig {
                model_dir: providers
                    .get(KEY_EMBED_MODEL_DIR)
                    .map(PathBuf::from)
                    .unwrap_or(embed_defaults.model_dir),
                model_id: providers
                    .get(KEY_EMBED_MODEL_ID)
                    .map(str::to_string)
                    .unwrap_or(embed_defaults.model_id),
            },
            index_path: providers
                .get(KEY_INDEX)
                .map(PathBuf::from)
                .unwrap_or_else(default_index_path),
            top_k: parse_or(providers, KEY_TOP_K, 3).max(1),
            chunk: ChunkConfig {
                max_chars: parse_or(providers, KEY_CHUNK_SIZE, chunk_defaults.max_chars),
                overlap_chars: parse_or(
                    providers,
                    KEY_CHUNK_OVERLAP,
                    chunk_defaults.overlap_chars,
                ),
            },
            timeout: Duration::from_secs(parse_or(providers, KEY_TIMEOUT_SECS, 30)),
            max_attempts: parse_or(providers, KEY_MAX_ATTEMPTS, 3).max(1),
        }
    }
}

/// Default index location under the platform data directory.
fn default_index_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("annai")
        .join("index.db")
}

/// Ordered key→value sources. First layer defining a key wins.
pub(crate) struct Providers {
    layers: Vec<HashMap<String, String>>,
}

impl Providers {
    /// Process environment, then `./.env`, then
    /// `<config_dir>/annai/annai.env`.
    fn standard() -> Self {
        let mut layers = vec![std::env::vars().collect()];
        if let Some(map) = read_env_file(Path::new(".env")) {
            layers.push(map);
        }
        if let Some(dir) = dirs::config_dir() {
            if let Some(map) = read_env_file(&dir.join("annai").join("annai.env")) {
                layers.push(map);
            }
        }
        Self { layers }
    }

    #[cfg(test)]
    fn from_layers(layers: Vec<HashMap<String, String>>) -> Self {
        Self { layers }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(key).map(String::as_str))
    }
}

fn parse_or<T: FromStr>(providers: &Providers, key: &str, default: T) -> T {
    match providers.get(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, raw, "ignoring unparseable config value");
                default
            }
        },
        None => default,
    }
}

fn read_env_file(path: &Path) -> Option<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path).ok()?;
    Some(parse_env_file(&contents))
}

/// `KEY=VALUE` lines; `#` starts a comment; values may be single- or
/// double-quoted.
fn parse_env_file(contents: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_env_file_handles_comments_and_quotes() {
        let map = parse_env_file(
            "# comment\n\
             GROQ_API_KEY=abc123\n\
             ANNAI_MODEL=\"llama-3.1-8b-instant\"\n\
             QUOTED='single'\n\
             \n\
             not a pair\n",
        );
        assert_eq!(map.get("GROQ_API_KEY").map(String::as_str), Some("abc123"));
        assert_eq!(
            map.get("ANNAI_MODEL").map(String::as_str),
            Some("llama-3.1-8b-instant")
        );
        assert_eq!(map.get("QUOTED").map(String::as_str), Some("single"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn first_provider_defining_a_key_wins() {
        let providers = Providers::from_layers(vec![
            layer(&[(KEY_MODEL, "from-env")]),
            layer(&[(KEY_MODEL, "from-file"), (KEY_TOP_K, "5")]),
        ]);
        assert_eq!(providers.get(KEY_MODEL), Some("from-env"));
        // A key missing from the first layer falls through to the next.
        assert_eq!(providers.get(KEY_TOP_K), Some("5"));
    }

    #[test]
    fn defaults_apply_when_no_provider_defines_a_key() {
        let config = Config::from_providers(&Providers::from_layers(vec![]));
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chunk.max_chars, 500);
        assert_eq!(config.chunk.overlap_chars, 50);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let providers = Providers::from_layers(vec![layer(&[
            (KEY_TOP_K, "many"),
            (KEY_TIMEOUT_SECS, "soon"),
        ])]);
        let config = Config::from_providers(&providers);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn zero_top_k_is_clamped_to_one() {
        let providers = Providers::from_layers(vec![layer(&[(KEY_TOP_K, "0")])]);
        let config = Config::from_providers(&providers);
        assert_eq!(config.top_k, 1);
    }

    #[test]
    fn chat_config_carries_timeout_and_attempts() {
        let providers = Providers::from_layers(vec![layer(&[
            (KEY_API_KEY, "secret"),
            (KEY_TIMEOUT_SECS, "7"),
            (KEY_MAX_ATTEMPTS, "2"),
        ])]);
        let config = Config::from_providers(&providers);
        let chat = config.chat_config();
        assert_eq!(chat.api_key, "secret");
        assert_eq!(chat.timeout, Duration::from_secs(7));
        assert_eq!(chat.max_attempts, 2);
    }
}
