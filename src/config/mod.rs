//! Configuration for training and leakage extraction.
//!
//! Every configuration is a plain serde struct with sensible defaults, a
//! `validate()` method, a fluent builder that collects validation errors, file
//! loading (`.json` or `.toml`) and `VFL_LEAKAGE_*` environment overrides.

pub mod boosting;
pub mod core;
pub mod extraction;
pub mod forest;

pub use self::boosting::{BoostingConfig, BoostingConfigBuilder};
pub use self::core::TreeConfig;
pub use self::extraction::{ExtractionConfig, ExtractionConfigBuilder};
pub use self::forest::{ForestConfig, ForestConfigBuilder};

use crate::core::error::{LeakageError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Serialized configuration format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigFormat {
    /// TOML configuration format
    Toml,
    /// JSON configuration format
    Json,
}

impl ConfigFormat {
    /// Detect the format of `path` from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(LeakageError::config(
                "Unsupported config file format. Use .json or .toml",
            )),
        }
    }
}

/// Read any configuration type from a `.json` or `.toml` file.
pub fn load_from_file<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| LeakageError::config(format!("Failed to read config file: {}", e)))?;

    match format {
        ConfigFormat::Json => serde_json::from_str(&content)
            .map_err(|e| LeakageError::config(format!("Failed to parse JSON config: {}", e))),
        ConfigFormat::Toml => toml::from_str(&content)
            .map_err(|e| LeakageError::config(format!("Failed to parse TOML config: {}", e))),
    }
}

/// Write any configuration type to a `.json` or `.toml` file.
pub fn save_to_file<T, P>(config: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = match ConfigFormat::from_path(path)? {
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| LeakageError::config(format!("Failed to serialize to JSON: {}", e)))?,
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| LeakageError::config(format!("Failed to serialize to TOML: {}", e)))?,
    };

    std::fs::write(path, content)
        .map_err(|e| LeakageError::config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}

/// Process environment as an override source.
pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse `key` from `lookup` into `field` when present.
pub(crate) fn override_from<F, T>(lookup: &F, key: &str, field: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *field = raw
            .trim()
            .parse()
            .map_err(|_| LeakageError::config(format!("Invalid {}: {:?}", key, raw)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("b.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("b.yaml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_override_from() {
        let lookup = |key: &str| (key == "X").then(|| " 7 ".to_string());
        let mut value = 1usize;
        override_from(&lookup, "Y", &mut value).unwrap();
        assert_eq!(value, 1);
        override_from(&lookup, "X", &mut value).unwrap();
        assert_eq!(value, 7);

        let mut flag = false;
        assert!(override_from(&lookup, "X", &mut flag).is_err());
    }
}
