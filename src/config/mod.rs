//! Configuration management for `lunch_and_learn`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`LAL_*`)
//! 3. YAML file (`--config <path>`, else `./lal.yaml` if present)
//! 4. Defaults

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{LalError, Result};
use crate::model::Priority;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lal.yaml";
/// Database used when none is given.
pub const DEFAULT_DB_FILENAME: &str = "issues.db";
/// Backups kept per database.
pub const DEFAULT_BACKUP_KEEP: usize = 10;

const ENV_PREFIX: &str = "LAL_";

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub db_path: PathBuf,
    pub default_priority: Priority,
    pub backup_keep: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            db_path: PathBuf::from(DEFAULT_DB_FILENAME),
            default_priority: Priority::Medium,
            backup_keep: DEFAULT_BACKUP_KEEP,
        }
    }
}

/// One source of raw key/value settings. Keys are normalized to
/// lower-case with `-` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Build a layer from YAML text. Nested keys are joined with `.`.
    ///
    /// # Errors
    ///
    /// Returns a YAML error if the text cannot be parsed.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut flat = HashMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Build a layer from `LAL_*` variables; others are ignored.
    #[must_use]
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }

    fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.values.get(*key))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Resolve this layer over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value cannot be parsed.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = Config::default();

        if let Some(url) = self.get(&["url", "base-url"]) {
            config.base_url = url.to_string();
        }
        if let Some(db) = self.get(&["db", "database"]) {
            config.db_path = PathBuf::from(db);
        }
        if let Some(secs) = self.get(&["timeout-secs", "timeout"]) {
            let secs: u64 = secs
                .parse()
                .map_err(|_| LalError::Config(format!("invalid timeout-secs '{secs}'")))?;
            if secs == 0 {
                return Err(LalError::Config("timeout-secs must be positive".to_string()));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(priority) = self.get(&["default-priority"]) {
            config.default_priority = priority.parse().map_err(|_| {
                LalError::Config(format!(
                    "invalid default-priority '{priority}' (expected LOW, MEDIUM or HIGH)"
                ))
            })?;
        }
        if let Some(keep) = self.get(&["backup-keep", "backup.keep"]) {
            config.backup_keep = keep
                .parse()
                .map_err(|_| LalError::Config(format!("invalid backup-keep '{keep}'")))?;
        }

        Ok(config)
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub url: Option<String>,
    pub db: Option<PathBuf>,
    pub default_priority: Option<Priority>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(url) = &self.url {
            layer.insert("url", url.clone());
        }
        if let Some(path) = &self.db {
            layer.insert("db", path.to_string_lossy().to_string());
        }
        if let Some(priority) = self.default_priority {
            layer.insert("default-priority", priority.to_string());
        }

        layer
    }
}

/// Load the YAML layer: an explicit path must exist, the default is optional.
///
/// # Errors
///
/// Returns `Config` if an explicit file is missing, or a parse error.
pub fn load_file_config(explicit: Option<&Path>) -> Result<ConfigLayer> {
    match explicit {
        Some(path) if !path.is_file() => Err(LalError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => ConfigLayer::from_yaml(path),
        None => ConfigLayer::from_yaml(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or a
/// value is invalid.
pub fn load_config(cli: &CliOverrides) -> Result<Config> {
    let file = load_file_config(cli.config.as_deref())?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let config = ConfigLayer::merge_layers(&[file, env_layer, cli_layer]).resolve()?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
