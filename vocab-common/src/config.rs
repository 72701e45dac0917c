//! Configuration loading and root folder resolution
//!
//! Configuration comes from a TOML file. Every section is optional; missing
//! files or sections fall back to compiled defaults so a fresh install starts
//! without any setup.
//!
//! Config file priority order:
//! 1. Command-line argument (highest priority)
//! 2. `VOCAB_CONFIG` environment variable
//! 3. `<user config dir>/vocab/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! Root folder priority order:
//! 1. Command-line argument
//! 2. `VOCAB_ROOT_FOLDER` environment variable
//! 3. `root_folder` key of the TOML config
//! 4. OS-dependent compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VOCAB_CONFIG";

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "VOCAB_ROOT_FOLDER";

/// Environment variable carrying the translation service API key
pub const TRANSLATION_KEY_ENV_VAR: &str = "VOCAB_TRANSLATION_API_KEY";

/// Environment variable carrying the image service API key
pub const IMAGE_KEY_ENV_VAR: &str = "VOCAB_IMAGE_API_KEY";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "vocab.db";

/// Translation cache file name inside the root folder
pub const TRANSLATION_CACHE_FILE_NAME: &str = "translation_cache.json";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Data directory (database, translation cache)
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetryConfig,
    pub translation: TranslationServiceConfig,
    pub images: ImageServiceConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5740".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Bulk ingestion tuning
///
/// Delays exist to respect the request-rate limits of the translation and
/// image providers. The image provider is single-flight, hence the long
/// default pause in the add pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum word count accepted by bulk add (after normalization)
    pub min_words: usize,
    /// Maximum word count accepted by bulk add (after normalization)
    pub max_words: usize,
    /// Translation requests dispatched concurrently per batch
    pub translation_batch_size: usize,
    /// Pause between translation batches
    pub translation_batch_delay_ms: u64,
    /// Pause between image requests in the add pipeline
    pub add_image_delay_ms: u64,
    /// Pause between image requests in the backfill pipeline
    pub backfill_image_delay_ms: u64,
    /// Language of the submitted words
    pub source_language: String,
    /// Language translations are produced in
    pub target_language: String,
    /// Name of the tag marking bulk-created cards for review
    pub review_tag_name: String,
    /// Description used when the review tag has to be created
    pub review_tag_description: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_words: 2,
            max_words: 100,
            translation_batch_size: 5,
            translation_batch_delay_ms: 100,
            add_image_delay_ms: 2000,
            backfill_image_delay_ms: 200,
            source_language: "es".to_string(),
            target_language: "en".to_string(),
            review_tag_name: "Needs Review".to_string(),
            review_tag_description: "Cards created by bulk import, pending review".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn translation_batch_delay(&self) -> Duration {
        Duration::from_millis(self.translation_batch_delay_ms)
    }

    pub fn add_image_delay(&self) -> Duration {
        Duration::from_millis(self.add_image_delay_ms)
    }

    pub fn backfill_image_delay(&self) -> Duration {
        Duration::from_millis(self.backfill_image_delay_ms)
    }

    /// Check internal consistency of the tuning values
    pub fn validate(&self) -> Result<()> {
        if self.min_words == 0 || self.min_words > self.max_words {
            return Err(Error::Config(format!(
                "pipeline word bounds invalid: min {} max {}",
                self.min_words, self.max_words
            )));
        }
        if self.translation_batch_size == 0 {
            return Err(Error::Config(
                "pipeline.translation_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry settings for persistence calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Translation provider settings (LibreTranslate-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslationServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

/// Image generation provider settings (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub size: String,
    pub timeout_secs: u64,
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            timeout_secs: 60,
        }
    }
}

impl TomlConfig {
    /// Fill API keys from environment variables when the file leaves them unset
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(TRANSLATION_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.translation.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var(IMAGE_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                self.images.api_key = Some(key);
            }
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.pipeline.validate()?;
    Ok(config)
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Locate and load the configuration
///
/// An explicitly named file (CLI or environment) must exist and parse.
/// The per-user default location is optional: when absent, compiled
/// defaults are used with a warning.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    let mut config = match explicit {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            load_toml_config(&path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration");
                load_toml_config(&path)?
            }
            _ => {
                warn!("No configuration file found, using compiled defaults");
                TomlConfig::default()
            }
        },
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Per-user config file location
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vocab").join("config.toml"))
}

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: LoggingConfig::default().level,
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    // ~/.local/share/vocab, ~/Library/Application Support/vocab, %LOCALAPPDATA%\vocab
    dirs::data_local_dir()
        .map(|d| d.join("vocab"))
        .unwrap_or_else(|| PathBuf::from("./vocab_data"))
}

/// Resolves the data root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.toml_value {
            return path.clone();
        }
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Prepares the root folder and derives file locations inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            info!(path = %self.root_folder.display(), "Creating root folder");
            std::fs::create_dir_all(&self.root_folder)?;
        }
        if !self.root_folder.is_dir() {
            return Err(Error::Config(format!(
                "Root folder is not a directory: {}",
                self.root_folder.display()
            )));
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn translation_cache_path(&self) -> PathBuf {
        self.root_folder.join(TRANSLATION_CACHE_FILE_NAME)
    }
}
