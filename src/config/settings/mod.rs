
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::database::index::DistanceMetric;
use crate::embeddings::DEFAULT_EMBEDDING_DIMENSION;

/// Environment variable overriding the application directory
pub const HOME_ENV_VAR: &str = "ARTISAN_MATCH_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    Local,
}

impl std::fmt::Display for ProviderKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::Local => write!(f, "local"),
        }
    }
}

/// What to do when the primary provider fails its startup checks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    #[default]
    Local,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub fallback: FallbackPolicy,
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
    pub embedding_dimension: u32,
    pub max_input_tokens: usize,
    pub request_timeout_secs: u64,
    pub retry_attempts: u32,
    pub inter_batch_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Ollama,
            fallback: FallbackPolicy::Local,
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "nomic-embed-text:latest".to_string(),
            batch_size: 16,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            max_input_tokens: 2048,
            request_timeout_secs: 30,
            retry_attempts: 1,
            inter_batch_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub embedding_max_entries: usize,
    pub search_max_entries: usize,
    pub search_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embedding_max_entries: 10_000,
            search_max_entries: 1_000,
            search_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    pub profile_weight: f32,
    pub skills_weight: f32,
    pub portfolio_weight: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            profile_weight: 0.4,
            skills_weight: 0.4,
            portfolio_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub default_threshold: f32,
    pub hybrid: bool,
    pub verified_boost: f32,
    pub rating_boost: f32,
    pub rating_boost_threshold: f32,
    pub query_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 100,
            default_threshold: 0.0,
            hybrid: false,
            verified_boost: 1.1,
            rating_boost: 1.05,
            rating_boost_threshold: 4.5,
            query_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    LanceDb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub backend: IndexBackend,
    pub name: String,
    pub metric: DistanceMetric,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::LanceDb,
            name: "artisans".to_string(),
            metric: DistanceMetric::Cosine,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid embedding dimension: {0} (must be between 8 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid max input tokens: {0} (must be between 16 and 32768)")]
    InvalidMaxInputTokens(usize),
    #[error("Invalid request timeout: {0}s (must be between 1 and 600)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid inter-batch delay: {0}ms (must be at most 10000)")]
    InvalidBatchDelay(u64),
    #[error("Invalid cache size for {0}: {1} (must be between 1 and 1000000)")]
    InvalidCacheSize(&'static str, usize),
    #[error("Invalid search cache TTL: {0}s (must be between 1 and 86400)")]
    InvalidCacheTtl(u64),
    #[error("Invalid fusion weight for {0}: {1} (must be finite and non-negative)")]
    InvalidFusionWeight(&'static str, f32),
    #[error("Fusion weights must not all be zero")]
    ZeroFusionWeights,
    #[error("Invalid top-k: default {0}, max {1} (need 1 <= default <= max <= 1000)")]
    InvalidTopK(usize, usize),
    #[error("Invalid similarity threshold: {0} (must be between 0 and 1)")]
    InvalidThreshold(f32),
    #[error("Invalid boost factor for {0}: {1} (must be between 1 and 2)")]
    InvalidBoost(&'static str, f32),
    #[error("Invalid rating boost threshold: {0} (must be between 0 and 5)")]
    InvalidRatingThreshold(f32),
    #[error("Invalid index name: {0:?} (letters, digits, '-' and '_' only)")]
    InvalidIndexName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Defaults rooted at the given application directory
    #[inline]
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Application directory: `$ARTISAN_MATCH_HOME`, else `~/.artisan-match`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::home_dir()
            .map(|home| home.join(".artisan-match"))
            .or_else(|| dirs::data_dir().map(|data| data.join("artisan-match")))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load from the default application directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let dir = Self::config_dir().context("Failed to locate configuration directory")?;
        Self::load(dir)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self::with_base_dir(config_dir));
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.provider.validate()?;
        self.cache.validate()?;
        self.fusion.validate()?;
        self.search.validate()?;
        self.index.validate()?;
        Ok(())
    }

    #[inline]
    pub fn provider_url(&self) -> Result<Url, ConfigError> {
        self.provider.provider_url()
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Path of the SQLite database holding profiles and the embedding ledger
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("artisans.db")
    }

    /// Path of the LanceDB vector directory
    #[inline]
    pub fn vector_database_path(&self) -> PathBuf {
        self.get_base_dir().join("vectors")
    }
}

impl ProviderConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        self.provider_url()?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(8..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        if !(16..=32768).contains(&self.max_input_tokens) {
            return Err(ConfigError::InvalidMaxInputTokens(self.max_input_tokens));
        }

        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.request_timeout_secs));
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        if self.inter_batch_delay_ms > 10_000 {
            return Err(ConfigError::InvalidBatchDelay(self.inter_batch_delay_ms));
        }

        Ok(())
    }

    #[inline]
    pub fn provider_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    #[inline]
    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    #[inline]
    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = ProviderConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.provider_url()?;
        self.host = host;
        Ok(())
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    #[inline]
    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    #[inline]
    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }

    #[inline]
    pub fn set_embedding_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(8..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.embedding_dimension = dimension;
        Ok(())
    }
}

impl CacheConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1_000_000).contains(&self.embedding_max_entries) {
            return Err(ConfigError::InvalidCacheSize(
                "embeddings",
                self.embedding_max_entries,
            ));
        }
        if !(1..=1_000_000).contains(&self.search_max_entries) {
            return Err(ConfigError::InvalidCacheSize(
                "search results",
                self.search_max_entries,
            ));
        }
        if !(1..=86_400).contains(&self.search_ttl_secs) {
            return Err(ConfigError::InvalidCacheTtl(self.search_ttl_secs));
        }
        Ok(())
    }
}

impl FusionConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("profile", self.profile_weight),
            ("skills", self.skills_weight),
            ("portfolio", self.portfolio_weight),
        ];

        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidFusionWeight(name, weight));
            }
        }

        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(ConfigError::ZeroFusionWeights);
        }

        Ok(())
    }
}

impl SearchConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_top_k == 0 || self.default_top_k > self.max_top_k || self.max_top_k > 1000
        {
            return Err(ConfigError::InvalidTopK(self.default_top_k, self.max_top_k));
        }

        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(ConfigError::InvalidThreshold(self.default_threshold));
        }

        if !(1.0..=2.0).contains(&self.verified_boost) {
            return Err(ConfigError::InvalidBoost("verified", self.verified_boost));
        }

        if !(1.0..=2.0).contains(&self.rating_boost) {
            return Err(ConfigError::InvalidBoost("rating", self.rating_boost));
        }

        if !(0.0..=5.0).contains(&self.rating_boost_threshold) {
            return Err(ConfigError::InvalidRatingThreshold(
                self.rating_boost_threshold,
            ));
        }

        if !(1..=600).contains(&self.query_timeout_secs) {
            return Err(ConfigError::InvalidTimeout(self.query_timeout_secs));
        }

        Ok(())
    }
}

impl IndexConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidIndexName(self.name.clone()))
        }
    }
}
