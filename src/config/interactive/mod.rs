#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, FallbackPolicy, ProviderConfig, ProviderKind};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Artisan Match Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Provider").bold().yellow());
    eprintln!("Configure the service that turns profile and query text into vectors.");
    eprintln!();

    configure_provider(&mut config.provider)?;

    if config.provider.kind == ProviderKind::Ollama {
        eprintln!();
        eprintln!("{}", style("Testing configuration...").yellow());

        if test_provider_connection(&config.provider)? {
            eprintln!("{}", style("✓ Ollama connection successful!").green());
        } else {
            eprintln!(
                "{}",
                style("⚠ Warning: Could not connect to Ollama").yellow()
            );
            match config.provider.fallback {
                FallbackPolicy::Local => {
                    eprintln!("The local hashing embedder will be used until Ollama is reachable.");
                }
                FallbackPolicy::None => {
                    eprintln!("Make sure Ollama is running before indexing or searching.");
                }
            }
        }
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Provider Settings:").bold().yellow());
    eprintln!("  Kind: {}", style(config.provider.kind).cyan());
    eprintln!("  Fallback: {}", style(format!("{:?}", config.provider.fallback)).cyan());
    eprintln!("  Model: {}", style(&config.provider.model).cyan());
    eprintln!(
        "  Dimension: {}",
        style(config.provider.embedding_dimension).cyan()
    );
    eprintln!("  Batch Size: {}", style(config.provider.batch_size).cyan());
    match config.provider_url() {
        Ok(url) => eprintln!("  URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Fusion Weights:").bold().yellow());
    eprintln!(
        "  profile {} / skills {} / portfolio {}",
        style(config.fusion.profile_weight).cyan(),
        style(config.fusion.skills_weight).cyan(),
        style(config.fusion.portfolio_weight).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Search:").bold().yellow());
    eprintln!(
        "  top-k {} (max {}), hybrid {}",
        style(config.search.default_top_k).cyan(),
        style(config.search.max_top_k).cyan(),
        style(config.search.hybrid).cyan()
    );
    eprintln!(
        "  Index: {} ({:?}, {})",
        style(&config.index.name).cyan(),
        config.index.backend,
        config.index.metric
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    match Config::load_default() {
        Ok(config) => {
            if config.config_file_path().exists() {
                eprintln!("{}", style("Found existing configuration.").green());
            } else {
                eprintln!(
                    "{}",
                    style("No existing configuration found. Using defaults.").yellow()
                );
            }
            Ok(config)
        }
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("Existing configuration unusable ({e}). Using defaults.")).yellow()
            );
            let dir = Config::config_dir().context("Failed to locate configuration directory")?;
            Ok(Config::with_base_dir(dir))
        }
    }
}

fn configure_provider(provider: &mut ProviderConfig) -> Result<()> {
    let kinds = &["ollama", "local"];
    let default_kind = match provider.kind {
        ProviderKind::Ollama => 0,
        ProviderKind::Local => 1,
    };

    let kind_index = Select::new()
        .with_prompt("Embedding provider")
        .default(default_kind)
        .items(kinds)
        .interact()?;

    provider.kind = if kind_index == 0 {
        ProviderKind::Ollama
    } else {
        ProviderKind::Local
    };

    if provider.kind == ProviderKind::Ollama {
        configure_ollama(provider)?;

        let fallback = Confirm::new()
            .with_prompt("Fall back to the local embedder when Ollama is unavailable?")
            .default(provider.fallback == FallbackPolicy::Local)
            .interact()?;
        provider.fallback = if fallback {
            FallbackPolicy::Local
        } else {
            FallbackPolicy::None
        };
    }

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(provider.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (8..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 8 and 4096")
            }
        })
        .interact_text()?;
    provider.set_embedding_dimension(dimension)?;

    Ok(())
}

fn configure_ollama(provider: &mut ProviderConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == provider.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(provider.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ProviderConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..ProviderConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(provider.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(provider.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(provider.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    provider.set_protocol(protocol)?;
    provider.set_host(host)?;
    provider.set_port(port)?;
    provider.set_model(model)?;
    provider.set_batch_size(batch_size)?;

    Ok(())
}

fn test_provider_connection(provider: &ProviderConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        provider.protocol, provider.host, provider.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
