// Configuration loader
// Loads settings from --config, $BACKTRANSLATE_CONFIG or ~/.backtranslate/config.toml

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::*;
use super::settings::Config;

/// Load configuration.
///
/// An explicit path (argument or environment variable) must exist. The
/// default location is optional: when it is missing, built-in defaults are
/// used, since a local Ollama needs no credentials.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let env_path = std::env::var(CONFIG_ENV_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
        Some(path) => load_config_from_path(&path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_config_from_path(&path)?,
            _ => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_ollama_host(&mut config, std::env::var(OLLAMA_HOST_ENV_VAR).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Parse a config file. Does not apply environment overrides or validate.
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// `~/.backtranslate/config.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Apply an `OLLAMA_HOST`-style override.
///
/// Ollama accepts a bare `host:port`; a scheme is added when missing.
pub fn apply_ollama_host(config: &mut Config, host: Option<String>) {
    let Some(host) = host.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()) else {
        return;
    };
    config.backend.base_url = if host.contains("://") {
        host
    } else {
        format!("http://{host}")
    };
}

/// Write a default config file to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(path: &Path, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        bail!(
            "Config already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
    }

    let body = toml::to_string_pretty(&Config::default()).context("Failed to render config")?;
    let text = format!("{DEFAULT_CONFIG_HEADER}\n{body}");
    fs::write(path, text).with_context(|| format!("Failed to write config: {}", path.display()))?;

    Ok(path.to_path_buf())
}

const DEFAULT_CONFIG_HEADER: &str = "\
# backtranslate configuration
#
# [backend]   Ollama endpoint and timeouts (OLLAMA_HOST overrides base_url)
# [sampling]  temperature / top_p / max_tokens for every role
# [models]    model id for the forward, backward and judge roles
# [run]       languages, expertise, base guidance, iteration budget
#             convergence_epsilon = 0.0 stops early only on an exact 1.0
# [reasoning] markers wrapping inline deliberation to strip from answers
";
