use super::{Config, FallbackProviderConfig, PrimaryProviderConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    load_config_with(path.as_ref(), env_lookup)
}

/// Build a configuration purely from the process environment
pub fn config_from_env() -> Result<Config> {
    config_from_vars(env_lookup)
}

/// Load `path`, resolving `${VAR}` references through `lookup`
fn load_config_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let config = substitute_vars(config, &lookup);

    // Validate configuration
    validate_config(&config)?;

    Ok(config)
}

fn config_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config = Config::default();

    let api_keys = split_keys(&lookup("GROQ_API_KEYS").unwrap_or_default());
    if !api_keys.is_empty() {
        config.primary = Some(PrimaryProviderConfig {
            api_keys,
            ..Default::default()
        });
    }

    if let Some(token) = lookup("HF_TOKEN").filter(|t| !t.is_empty()) {
        config.fallback = Some(FallbackProviderConfig {
            token: Some(token),
            ..Default::default()
        });
    }

    if let Some(host) = lookup("CHATRELAY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("CHATRELAY_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("Invalid CHATRELAY_PORT: {}", port))?;
    }

    validate_config(&config)?;

    Ok(config)
}

fn substitute_vars(mut config: Config, lookup: &impl Fn(&str) -> Option<String>) -> Config {
    if let Some(primary) = config.primary.as_mut() {
        primary.api_keys = primary
            .api_keys
            .iter()
            .flat_map(|key| split_keys(&expand(key, lookup).unwrap_or_default()))
            .collect();
    }

    if let Some(fallback) = config.fallback.as_mut() {
        fallback.token = fallback
            .token
            .as_deref()
            .and_then(|token| expand(token, lookup))
            .filter(|t| !t.is_empty());
    }

    config
}

/// Resolve a `${VAR}` reference; plain values pass through unchanged
fn expand(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        lookup(var_name)
    } else {
        Some(value.to_string())
    }
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_config(config: &Config) -> Result<()> {
    let has_primary = config
        .primary
        .as_ref()
        .is_some_and(|p| !p.api_keys.is_empty());
    let has_fallback = config.fallback.as_ref().is_some_and(|f| f.token.is_some());

    if !has_primary && !has_fallback {
        anyhow::bail!("At least one provider must be configured (primary api_keys or fallback token)");
    }

    if let Some(primary) = &config.primary {
        if primary.model.is_empty() {
            anyhow::bail!("Primary provider model must be specified");
        }
    }

    if let Some(fallback) = &config.fallback {
        if fallback.model.is_empty() {
            anyhow::bail!("Fallback provider model must be specified");
        }
    }

    if config.router.request_timeout_secs == 0 {
        anyhow::bail!("router.request_timeout_secs must be greater than zero");
    }

    Ok(())
}
