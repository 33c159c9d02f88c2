use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "HOSTBIND_CONFIG";

/// Class-name prefixes stripped when guessing a wrapper name for an API type
pub const DEFAULT_API_PREFIXES: &[&str] = &["MFn", "MIt", "MPx", "M"];

/// Words that cannot be used as generated flag or parameter names
pub const DEFAULT_RESERVED_WORDS: &[&str] = &[
    "and", "as", "assert", "break", "class", "continue", "def", "del", "elif", "else", "except",
    "exec", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "not", "or",
    "pass", "print", "raise", "return", "try", "while", "with", "yield",
];

/// Errors raised while reading or writing the configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    NoHomeDir,
    UnknownKey(String),
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
            ConfigError::NoHomeDir => write!(f, "Could not determine home directory"),
            ConfigError::UnknownKey(key) => write!(f, "Unknown config key '{}'", key),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for config key '{}'", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_root: Option<String>,
    /// Enable live probing of flags without documented modes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_words: Option<Vec<String>>,
    /// Entity types whose creating command does not share their name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_commands: BTreeMap<String, String>,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        // Honor explicit override for tests / isolated runs
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".config")
            .join("hostbind")
            .join("hostbind.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join("hostbind")
            .join("hostbind.toml");

        Ok(default)
    }

    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "cache-path" => self.cache_path.clone(),
            "docs-root" => self.docs_root.clone(),
            "probe" => self.probe.map(|p| p.to_string()),
            "overrides-path" => self.overrides_path.clone(),
            "api-prefixes" => self.api_prefixes.as_ref().map(|p| p.join(",")),
            "reserved-words" => self.reserved_words.as_ref().map(|w| w.join(",")),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "cache-path" => self.cache_path = Some(value),
            "docs-root" => self.docs_root = Some(value),
            "probe" => {
                let enabled = match value.trim().to_lowercase().as_str() {
                    "true" | "on" | "yes" | "1" => true,
                    "false" | "off" | "no" | "0" => false,
                    _ => return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value,
                    }),
                };
                self.probe = Some(enabled);
            }
            "overrides-path" => self.overrides_path = Some(value),
            "api-prefixes" => self.api_prefixes = Some(split_list(&value)),
            "reserved-words" => self.reserved_words = Some(split_list(&value)),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.cache_path.is_none()
            && self.docs_root.is_none()
            && self.probe.is_none()
            && self.overrides_path.is_none()
            && self.api_prefixes.is_none()
            && self.reserved_words.is_none()
            && self.node_commands.is_empty()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        [
            "cache-path",
            "docs-root",
            "probe",
            "overrides-path",
            "api-prefixes",
            "reserved-words",
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|value| (key, value)))
        .collect()
    }

    pub fn get_cache_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.cache_path {
            return Ok(PathBuf::from(path));
        }

        #[cfg(not(target_os = "windows"))]
        {
            Ok(dirs::home_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join(".cache")
                .join("hostbind"))
        }
        #[cfg(target_os = "windows")]
        {
            Ok(dirs::cache_dir()
                .ok_or(ConfigError::NoHomeDir)?
                .join("hostbind"))
        }
    }

    pub fn ensure_cache_path(&self) -> Result<PathBuf, ConfigError> {
        let cache_path = self.get_cache_path()?;
        fs::create_dir_all(&cache_path)?;
        Ok(cache_path)
    }

    /// Versioned metadata blob location for one host-application version
    pub fn metadata_cache_file(&self, version: &str) -> Result<PathBuf, ConfigError> {
        Ok(self
            .get_cache_path()?
            .join(format!("metadata-{}.json", sanitize_version(version))))
    }

    pub fn probing_enabled(&self) -> bool {
        self.probe.unwrap_or(false)
    }

    pub fn api_prefixes(&self) -> Vec<String> {
        self.api_prefixes.clone().unwrap_or_else(|| {
            DEFAULT_API_PREFIXES
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        })
    }

    pub fn reserved_words(&self) -> Vec<String> {
        self.reserved_words.clone().unwrap_or_else(|| {
            DEFAULT_RESERVED_WORDS
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        })
    }

    /// Exception-table lookup for the command that creates an entity type
    pub fn node_command_for(&self, entity_type: &str) -> Option<&str> {
        self.node_commands.get(entity_type).map(String::as_str)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn sanitize_version(version: &str) -> String {
    version
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
