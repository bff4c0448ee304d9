// Configuration management module
// TOML configuration for the embedding provider, caches, fusion and search

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CacheConfig, Config, ConfigError, FallbackPolicy, FusionConfig, IndexBackend, IndexConfig,
    ProviderConfig, ProviderKind, SearchConfig,
};
