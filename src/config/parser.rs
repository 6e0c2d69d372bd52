use crate::config::types::{Config, FlatConfig};
use crate::config::validation::validate;
use crate::storage::sha256_hex;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Files with a `.json` extension are parsed as JSON; anything else is
/// parsed as TOML.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    parse_config(&content, is_json)
}

/// Parses and validates configuration text
///
/// JSON input may be either the sectioned form (a `crawler` object) or the
/// flat form with `seed_urls` / `output_dir` / `metadata_path` at the top level.
pub fn parse_config(content: &str, is_json: bool) -> Result<Config, ConfigError> {
    let config: Config = if is_json {
        parse_json_config(content)?
    } else {
        toml::from_str(content)?
    };

    validate(&config)?;

    Ok(config)
}

fn parse_json_config(content: &str) -> Result<Config, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(content)?;

    if value.get("crawler").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        let flat: FlatConfig = serde_json::from_value(value)?;
        Ok(flat.into_config())
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be correlated with the config that drove them.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(sha256_hex(&content))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
