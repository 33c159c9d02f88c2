//! Override table
//!
//! Per (wrapper class, method or flag name) adjustments to what the class
//! factory generates, read from a TOML file of `[[override]]` records:
//!
//! ```toml
//! [[override]]
//! class = "Transform"
//! name = "setTranslation"
//! use-name = "MEL"
//!
//! [[override]]
//! class = "Transform"
//! name = "rotatePivot"
//! enabled = false
//! ```

use crate::errors::FactoryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Which surface provides the name when the API and a flag collide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UseName {
    Api,
    Mel,
    Explicit(String),
}

impl From<String> for UseName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "API" => UseName::Api,
            "MEL" => UseName::Mel,
            _ => UseName::Explicit(value),
        }
    }
}

impl From<UseName> for String {
    fn from(value: UseName) -> Self {
        match value {
            UseName::Api => "API".to_string(),
            UseName::Mel => "MEL".to_string(),
            UseName::Explicit(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Override {
    pub class: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_name: Option<UseName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overload_index: Option<usize>,
}

fn default_enabled() -> bool {
    true
}

impl Override {
    pub fn new(class: &str, name: &str) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
            enabled: true,
            use_name: None,
            overload_index: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_use_name(mut self, use_name: UseName) -> Self {
        self.use_name = Some(use_name);
        self
    }

    pub fn with_overload(mut self, index: usize) -> Self {
        self.overload_index = Some(index);
        self
    }

    /// Renamed target, when an explicit name was given
    pub fn explicit_name(&self) -> Option<&str> {
        match &self.use_name {
            Some(UseName::Explicit(name)) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OverrideFile {
    #[serde(default, rename = "override")]
    overrides: Vec<Override>,
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: BTreeMap<String, BTreeMap<String, Override>>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let file: OverrideFile = toml::from_str(text)?;
        let mut table = Self::new();
        for record in file.overrides {
            table.insert(record);
        }
        Ok(table)
    }

    /// Read the table at `path`; a missing file is an empty table
    pub fn load(path: &Path) -> Result<Self, FactoryError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let invalid = |reason: String| FactoryError::Overrides {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        Self::from_toml_str(&text).map_err(|e| invalid(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        let file = OverrideFile {
            overrides: self
                .entries
                .values()
                .flat_map(BTreeMap::values)
                .cloned()
                .collect(),
        };
        toml::to_string_pretty(&file)
    }

    /// Later records for the same (class, name) replace earlier ones
    pub fn insert(&mut self, record: Override) {
        self.entries
            .entry(record.class.clone())
            .or_default()
            .insert(record.name.clone(), record);
    }

    pub fn get(&self, class: &str, name: &str) -> Option<&Override> {
        self.entries.get(class)?.get(name)
    }

    pub fn is_enabled(&self, class: &str, name: &str) -> bool {
        self.get(class, name).map_or(true, |o| o.enabled)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
