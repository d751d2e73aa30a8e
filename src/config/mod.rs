//! Configuration management for curator
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Qdrant collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// OpenAI-compatible API configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Web crawling configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Chat / retrieval configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Summary generation configuration
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// OpenAI-compatible API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the API (e.g. https://api.openai.com/v1)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimension (must match the embedding model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,

    /// Overlap characters between chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap_chars: usize,

    /// Minimum chunk size (don't create tiny chunks)
    #[serde(default = "default_chunk_min_chars")]
    pub min_chars: usize,
}

/// Web crawling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum pages to fetch per crawl (hard cap 20)
    #[serde(default = "default_crawl_max_pages")]
    pub max_pages: u32,

    /// Requests per second per host
    #[serde(default = "default_crawl_rate_limit")]
    pub rate_limit_per_host: f64,

    /// User agent string
    #[serde(default = "default_crawl_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,

    /// Whether to respect robots.txt
    #[serde(default = "default_respect_robots")]
    pub respect_robots_txt: bool,

    /// Maximum characters of text kept per page
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

/// Chat and retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_chat_top_k")]
    pub top_k: usize,

    /// Sampling temperature for answers
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,

    /// Number of past question/answer turns kept in memory
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

/// Summary generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Generate an LLM summary at ingest time
    #[serde(default = "default_summary_enabled")]
    pub enabled: bool,

    /// Sampling temperature for summaries
    #[serde(default = "default_summary_temperature")]
    pub temperature: f32,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for curator data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection_name: default_collection_name(),
            openai: OpenAiConfig::default(),
            embedding: EmbeddingConfig::default(),
            chunk: ChunkConfig::default(),
            crawl: CrawlConfig::default(),
            chat: ChatConfig::default(),
            summary: SummaryConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: default_chunk_max_chars(),
            overlap_chars: default_chunk_overlap(),
            min_chars: default_chunk_min_chars(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_crawl_max_pages(),
            rate_limit_per_host: default_crawl_rate_limit(),
            user_agent: default_crawl_user_agent(),
            timeout_secs: default_crawl_timeout(),
            respect_robots_txt: default_respect_robots(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            top_k: default_chat_top_k(),
            temperature: default_chat_temperature(),
            max_history_turns: default_max_history_turns(),
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_summary_enabled(),
            temperature: default_summary_temperature(),
        }
    }
}

impl Config {
    /// Get the default base directory for curator (~/.curator)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".curator")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("metadata.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific base directory, falling back to
    /// defaults when no config file exists yet
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.openai.api_key_env).map_err(|_| {
            Error::Config(format!(
                "API key not set: export {} or add it to .env",
                self.openai.api_key_env
            ))
        })
    }

    /// Check if curator is initialized (config and DB exist)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists() && self.paths.db_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.max_chars < self.chunk.min_chars {
            return Err(Error::Config(
                "chunk.max_chars must be >= chunk.min_chars".to_string(),
            ));
        }

        if self.chunk.overlap_chars >= self.chunk.max_chars {
            return Err(Error::Config(
                "chunk.overlap_chars must be < chunk.max_chars".to_string(),
            ));
        }

        if self.crawl.max_pages == 0 || self.crawl.max_pages > CRAWL_MAX_PAGES_LIMIT {
            return Err(Error::Config(format!(
                "crawl.max_pages must be between 1 and {}",
                CRAWL_MAX_PAGES_LIMIT
            )));
        }

        if self.crawl.rate_limit_per_host <= 0.0 {
            return Err(Error::Config(
                "crawl.rate_limit_per_host must be positive".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(Error::Config(
                "chat.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.summary.temperature) {
            return Err(Error::Config(
                "summary.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.chat.top_k == 0 {
            return Err(Error::Config("chat.top_k must be at least 1".to_string()));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Get the database URL for sqlx
pub fn database_url(config: &Config) -> String {
    format!("sqlite://{}?mode=rwc", config.paths.db_file.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.collection_name, "curator_content");
        assert_eq!(config.chunk.max_chars, 1000);
        assert_eq!(config.chunk.overlap_chars, 200);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.crawl.max_pages, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.collection_name = "test_collection".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.collection_name, "test_collection");
    }

    #[test]
    fn test_load_from_rejects_invalid_config_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            r#"
[crawl]
max_pages = 100

[chunk]
max_chars = 1000
overlap_chars = 5000
"#,
        )
        .unwrap();

        let err = Config::load_from(Some(tmp.path().to_path_buf()))
            .expect_err("out-of-range values in the config file must be rejected");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Invalid: overlap >= max
        config.chunk.overlap_chars = config.chunk.max_chars;
        assert!(config.validate().is_err());

        // Fix it
        config.chunk.overlap_chars = 100;
        assert!(config.validate().is_ok());

        // Invalid: min > max
        config.chunk.min_chars = config.chunk.max_chars + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_cap_enforced() {
        let mut config = Config::default();
        config.crawl.max_pages = CRAWL_MAX_PAGES_LIMIT;
        assert!(config.validate().is_ok());

        config.crawl.max_pages = CRAWL_MAX_PAGES_LIMIT + 1;
        assert!(config.validate().is_err());

        config.crawl.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_temperature_ranges() {
        let mut config = Config::default();
        config.chat.temperature = 2.0;
        assert!(config.validate().is_ok());

        config.chat.temperature = 2.1;
        assert!(config.validate().is_err());

        config.chat.temperature = 0.7;
        config.summary.temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let mut config = Config::default();
        config.openai.api_key_env = "CURATOR_TEST_KEY_THAT_IS_NOT_SET".to_string();
        assert!(matches!(config.api_key(), Err(Error::Config(_))));
    }
}
