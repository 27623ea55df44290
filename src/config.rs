//! Configuration loaded from `.dxsearch/config.toml`
//!
//! Both sections are optional; anything missing falls back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{IndexConfig, QueryConfig};

/// Contents written to a fresh cache directory
pub const DEFAULT_CONFIG_TOML: &str = r#"[index]
extra_name_chars = "_.-:~$"  # Accepted in names besides ASCII letters and digits
max_name_len = 256
parallel_threads = 0  # 0 = auto

[query]
default_limit = 50  # 0 = unlimited
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

/// Load config.toml from the cache directory
///
/// Falls back to defaults if the file doesn't exist.
pub fn load_config(cache_dir: &Path) -> Result<Config> {
    let config_path = cache_dir.join("config.toml");

    if !config_path.exists() {
        log::debug!("No config.toml found, using defaults");
        return Ok(Config::default());
    }

    let config_str = std::fs::read_to_string(&config_path)
        .context("Failed to read config.toml")?;

    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    toml::from_str(config_str).context("Failed to parse config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config = parse_config(DEFAULT_CONFIG_TOML).unwrap();
        let defaults = Config::default();

        assert_eq!(config.index.extra_name_chars, defaults.index.extra_name_chars);
        assert_eq!(config.index.max_name_len, defaults.index.max_name_len);
        assert_eq!(config.query.default_limit, defaults.query.default_limit);
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config("[query]\ndefault_limit = 5\n").unwrap();
        assert_eq!(config.query.default_limit, 5);
        assert_eq!(config.index.max_name_len, 256);

        let config = parse_config("[index]\nmax_name_len = 12\n").unwrap();
        assert_eq!(config.index.max_name_len, 12);
        assert_eq!(config.index.extra_name_chars, "_.-:~$");
    }

    #[test]
    fn test_missing_file_and_bad_file() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_config(temp.path()).unwrap().query.default_limit, 50);

        std::fs::write(temp.path().join("config.toml"), "[index\n").unwrap();
        assert!(load_config(temp.path()).is_err());
    }
}
