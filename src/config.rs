use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Credentials and API location. File values come from
/// `~/.kaiten/config.toml`; `KAITEN_API_TOKEN` and `KAITEN_API_BASE_URL`
/// override them, and a `--token` flag overrides everything.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    pub api_token: Option<String>,
    pub base_url: Option<String>,
}

fn config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kaiten")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    let path = config_path();
    let config = if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?
    } else {
        AppConfig::default()
    };
    Ok(apply_env(
        config,
        env_var("KAITEN_API_TOKEN"),
        env_var("KAITEN_API_BASE_URL"),
    ))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn apply_env(mut config: AppConfig, token: Option<String>, base_url: Option<String>) -> AppConfig {
    if token.is_some() {
        config.api_token = token;
    }
    if base_url.is_some() {
        config.base_url = base_url;
    }
    config
}
