mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config.
///
/// Environment overrides are applied on top of whatever was loaded, then the
/// result is validated.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    let mut config = match custom_path {
        Some(path) => load_config(path)?,
        None => find_default_config()?.unwrap_or_default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config)?;

    Ok(config)
}

fn find_default_config() -> Result<Option<Config>> {
    let default_paths = [
        "./u7d.toml",
        "~/.config/u7d/config.toml",
        "/etc/u7d/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path).map(Some);
        }
    }

    Ok(None)
}

/// Apply `U7D_*` environment overrides.
///
/// `lookup` resolves a variable name to its value so callers (and tests) can
/// supply their own environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("U7D_HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("U7D_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("Invalid U7D_PORT: {port:?}"))?;
    }
    if let Some(host) = lookup("U7D_EPG_HOST") {
        config.catalog.host = host;
    }
    if let Some(port) = lookup("U7D_EPG_PORT") {
        config.catalog.port = port
            .parse()
            .with_context(|| format!("Invalid U7D_EPG_PORT: {port:?}"))?;
    }
    if let Some(program) = lookup("U7D_WORKER") {
        config.worker.program = PathBuf::from(program);
    }
    if let Some(host) = lookup("U7D_RELAY_HOST") {
        config.relay.host = host;
    }
    if let Some(url) = lookup("U7D_UDPXY") {
        config.relay.multicast_base_url = url;
    }
    if let Some(home) = lookup("U7D_HOME") {
        config.files.home_dir = PathBuf::from(home);
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.host.trim().is_empty() {
        anyhow::bail!("Server host cannot be empty");
    }

    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.catalog.port == 0 {
        anyhow::bail!("Catalog port cannot be 0");
    }

    if config.worker.program.as_os_str().is_empty() {
        anyhow::bail!("Worker program cannot be empty");
    }

    config
        .relay
        .host
        .parse::<IpAddr>()
        .with_context(|| format!("Relay host is not an IP address: {:?}", config.relay.host))?;

    if !config.files.home_dir.exists() {
        tracing::warn!("Catalog file directory does not exist: {:?}", config.files.home_dir);
    }

    Ok(())
}
