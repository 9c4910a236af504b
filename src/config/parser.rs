use crate::config::types::{Config, FileConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing sections and keys keep their defaults. The merged result is
/// validated before it is returned.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use page_ripple::config::load_config;
///
/// let config = load_config(Path::new("ripple.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses TOML text into a validated [`Config`]
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let file: FileConfig = toml::from_str(content)?;
    let config = file.into_config();

    validate(&config)?;

    Ok(config)
}
