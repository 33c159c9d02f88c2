//! Metadata store operations - lookup, mutation and versioned persistence
//!
//! One store exists per host-application version. It is serialized as a
//! single JSON blob; a load that yields nothing (missing file, unreadable
//! blob, other version) is not an error, callers rebuild instead.

use crate::errors::MetaError;
use crate::hierarchy::EntityHierarchy;
use crate::types::{ApiClassInfo, CommandInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataStore {
    pub version: Arc<str>,
    pub generated_at: Arc<str>,
    #[serde(default)]
    pub commands: BTreeMap<Arc<str>, CommandInfo>,
    #[serde(default)]
    pub api_classes: BTreeMap<Arc<str>, ApiClassInfo>,
    #[serde(default)]
    pub hierarchy: EntityHierarchy,
    /// Entity types that only exist for UI purposes
    #[serde(default)]
    pub ui_types: Vec<Arc<str>>,
    /// Commands that create an entity of the same name
    #[serde(default)]
    pub node_commands: Vec<Arc<str>>,
    #[serde(default)]
    pub categories: BTreeMap<Arc<str>, Vec<Arc<str>>>,
    /// entity type -> API class operating on it
    #[serde(default)]
    pub entity_api_classes: BTreeMap<Arc<str>, Arc<str>>,
}

impl MetadataStore {
    pub fn new(version: &str) -> Self {
        Self {
            version: Arc::from(version),
            generated_at: Arc::from(chrono::Utc::now().to_rfc3339()),
            commands: BTreeMap::new(),
            api_classes: BTreeMap::new(),
            hierarchy: EntityHierarchy::new(),
            ui_types: Vec::new(),
            node_commands: Vec::new(),
            categories: BTreeMap::new(),
            entity_api_classes: BTreeMap::new(),
        }
    }

    pub fn get_command_info(&self, name: &str) -> Result<&CommandInfo, MetaError> {
        self.commands
            .get(name)
            .ok_or_else(|| MetaError::command(name))
    }

    pub fn get_command_info_mut(&mut self, name: &str) -> Result<&mut CommandInfo, MetaError> {
        self.commands
            .get_mut(name)
            .ok_or_else(|| MetaError::command(name))
    }

    pub fn get_api_class_info(&self, name: &str) -> Result<&ApiClassInfo, MetaError> {
        self.api_classes
            .get(name)
            .ok_or_else(|| MetaError::api_class(name))
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn insert_command(&mut self, mut info: CommandInfo) {
        info.compute_hash();
        if let Some(category) = info.category.clone() {
            let members = self.categories.entry(category).or_default();
            if !members.contains(&info.name) {
                members.push(info.name.clone());
            }
        }
        self.commands.insert(info.name.clone(), info);
    }

    /// Remove a command from every table that mentions it
    pub fn remove_command(&mut self, name: &str) -> Option<CommandInfo> {
        let removed = self.commands.remove(name)?;
        self.node_commands.retain(|c| c.as_ref() != name);
        for members in self.categories.values_mut() {
            members.retain(|c| c.as_ref() != name);
        }
        self.categories.retain(|_, members| !members.is_empty());
        Some(removed)
    }

    pub fn insert_api_class(&mut self, info: ApiClassInfo) {
        self.api_classes.insert(info.name.clone(), info);
    }

    pub fn remove_entity_type(&mut self, entity_type: &str) -> bool {
        self.entity_api_classes.remove(entity_type);
        self.ui_types.retain(|t| t.as_ref() != entity_type);
        self.hierarchy.remove(entity_type)
    }

    /// API class bound to an entity type, if the host reported one
    pub fn api_class_for(&self, entity_type: &str) -> Option<&str> {
        self.entity_api_classes.get(entity_type).map(AsRef::as_ref)
    }

    pub fn commands_in_category(&self, category: &str) -> &[Arc<str>] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Recompute node-creating commands; a command creates the entity type it is named after
    pub fn refresh_node_commands(&mut self) {
        self.node_commands = self
            .commands
            .keys()
            .filter(|name| self.hierarchy.contains(name))
            .cloned()
            .collect();
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.api_classes.clear();
        self.hierarchy = EntityHierarchy::new();
        self.ui_types.clear();
        self.node_commands.clear();
        self.categories.clear();
        self.entity_api_classes.clear();
    }

    /// Rebuild runtime-only state after deserialization
    pub fn rebuild_indexes(&mut self) {
        for cmd in self.commands.values_mut() {
            cmd.rebuild_short_index();
            cmd.compute_hash();
        }
    }

    /// Load the cached store for `version` from `path`
    ///
    /// Returns `None` when the blob is missing, unreadable or for another version.
    pub fn load_from_path(path: &Path, version: &str) -> Option<Self> {
        match Self::try_load(path, version) {
            Ok(store) => store,
            Err(e) => {
                warn!("Ignoring metadata cache {}: {}", path.display(), e);
                None
            }
        }
    }

    fn try_load(path: &Path, version: &str) -> Result<Option<Self>, MetaError> {
        if !path.exists() {
            debug!("No metadata cache at {}", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let mut store: MetadataStore = serde_json::from_str(&content)?;
        if store.version.as_ref() != version {
            return Err(MetaError::VersionMismatch {
                expected: version.to_string(),
                found: store.version.to_string(),
            });
        }
        store.rebuild_indexes();
        info!(
            "Loaded metadata cache for {} ({} commands, {} API classes)",
            version,
            store.commands.len(),
            store.api_classes.len()
        );
        Ok(Some(store))
    }

    /// Save with atomic write
    pub fn save_to_path(&self, path: &Path) -> Result<(), MetaError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string(self)?;

        let temp_path = path.with_extension("json.tmp");
        {
            let file = std::fs::File::create(&temp_path)?;
            let mut writer = std::io::BufWriter::with_capacity(64 * 1024, file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
        }

        std::fs::rename(&temp_path, path)?;
        debug!("Metadata cache written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArgType, FlagInfo, Primitive};
    use tempfile::TempDir;

    fn sample_store() -> MetadataStore {
        let mut store = MetadataStore::new("2026");
        let mut cmd = CommandInfo::new("sphere");
        cmd.category = Some(Arc::from("Modeling"));
        cmd.add_flag(FlagInfo::new("radius", "r", ArgType::Single(Primitive::Length)));
        store.insert_command(cmd);
        store.insert_command(CommandInfo::new("ls"));
        store.hierarchy.insert_chain(&["node", "sphere"]);
        store.refresh_node_commands();
        store
    }

    #[test]
    fn test_lookup_not_found() {
        let store = sample_store();
        assert!(store.get_command_info("sphere").is_ok());
        assert!(matches!(
            store.get_command_info("nothing"),
            Err(MetaError::NotFound { kind: "command", .. })
        ));
        assert!(store.get_api_class_info("MFnMesh").is_err());
    }

    #[test]
    fn test_node_commands_and_categories() {
        let mut store = sample_store();
        assert_eq!(store.node_commands, vec![Arc::<str>::from("sphere")]);
        assert_eq!(store.commands_in_category("Modeling").len(), 1);

        assert!(store.remove_command("sphere").is_some());
        assert!(store.node_commands.is_empty());
        assert!(store.commands_in_category("Modeling").is_empty());
    }

    #[test]
    fn test_save_and_load_versioned() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("metadata-2026.json");
        let store = sample_store();
        assert!(store.save_to_path(&path).is_ok());

        let loaded = MetadataStore::load_from_path(&path, "2026");
        assert!(loaded.is_some_and(|s| s
            .get_command_info("sphere")
            .is_ok_and(|c| c.flag("r").is_some() && c.content_hash != 0)));

        assert!(MetadataStore::load_from_path(&path, "2027").is_none());
    }

    #[test]
    fn test_load_missing_or_corrupt_returns_none() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("metadata-2026.json");
        assert!(MetadataStore::load_from_path(&path, "2026").is_none());

        assert!(std::fs::write(&path, "{not json").is_ok());
        assert!(MetadataStore::load_from_path(&path, "2026").is_none());
    }
}
