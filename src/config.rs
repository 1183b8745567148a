use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default currency for new records.
fn default_currency() -> String {
    "EUR".to_string()
}

fn default_extractor_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_extractor_max_tokens() -> u32 {
    300
}

fn default_extractor_temperature() -> f32 {
    0.1
}

/// Remote mirror configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Enable mirroring to a remote document store.
    pub enabled: bool,

    /// Base URL of the remote document store.
    pub base_url: Option<String>,

    /// Bearer token sent with every remote request.
    pub api_token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            api_token: None,
        }
    }
}

/// Natural-language extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// OpenAI API key. Falls back to the `OPENAI_API_KEY` environment
    /// variable when unset.
    pub api_key: Option<String>,

    /// Chat model used for extraction.
    #[serde(default = "default_extractor_model")]
    pub model: String,

    /// Completion size cap for extraction replies.
    #[serde(default = "default_extractor_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature. Kept low so replies stay parseable.
    #[serde(default = "default_extractor_temperature")]
    pub temperature: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_extractor_model(),
            max_tokens: default_extractor_max_tokens(),
            temperature: default_extractor_temperature(),
        }
    }
}

impl ExtractorConfig {
    /// The configured API key, or the `OPENAI_API_KEY` environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Currency assigned to new records (e.g., "EUR").
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Remote mirror settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Extraction settings.
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_currency: default_currency(),
            remote: RemoteConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to `config_dir`.
    /// If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved data directory path.
    pub data_dir: PathBuf,

    /// Currency assigned to new records.
    pub default_currency: String,

    /// Remote mirror settings.
    pub remote: RemoteConfig,

    /// Extraction settings.
    pub extractor: ExtractorConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./finanzas.toml` if it exists in current directory
/// 2. `~/.local/share/finanzas/finanzas.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("finanzas.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("finanzas").join("finanzas.toml");
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        let data_dir = config.resolve_data_dir(config_dir);

        Ok(Self {
            data_dir,
            default_currency: config.default_currency,
            remote: config.remote,
            extractor: config.extractor,
        })
    }

    /// Load config, creating a default if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let config_path = if config_path.is_relative() {
                std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(config_path)
            } else {
                config_path.to_path_buf()
            };

            let config_dir = config_path
                .parent()
                .context("Config path has no parent directory")?;

            Ok(Self {
                data_dir: config_dir.to_path_buf(),
                default_currency: default_currency(),
                remote: RemoteConfig::default(),
                extractor: ExtractorConfig::default(),
            })
        }
    }
}
