//! Store rebuild: authoritative baseline plus optional documentation
//!
//! 1. Enumerate every command and API class the host exposes
//! 2. Parse each command's synopsis (ground truth for arity/type)
//! 3. Enrich from documentation pages when the docs tree is present
//! 4. Pair getters/setters, record the entity hierarchy and node commands
//!
//! A failure on any single symbol degrades to fewer entries, never an abort.

use crate::command_doc::{enrich, read_command_doc};
use crate::hierarchy_doc::read_hierarchy;
use crate::synopsis::parse_synopsis;
use hostbind_config::{Config, DocsLayout};
use hostbind_meta::{infer_inverses, CommandInfo, MetadataSource, MetadataStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Names of all commands that have a documentation page
pub fn documented_commands(layout: &DocsLayout) -> BTreeSet<String> {
    let dir = layout.root().join(hostbind_config::doc_paths::COMMANDS_DIR);
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.path();
            (path.extension()? == "html")
                .then(|| path.file_stem()?.to_str().map(str::to_string))
                .flatten()
        })
        .collect()
}

pub struct StoreBuilder<'a> {
    source: &'a dyn MetadataSource,
    docs: Option<DocsLayout>,
    reserved_words: Vec<String>,
}

impl<'a> StoreBuilder<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self {
            source,
            docs: None,
            reserved_words: hostbind_config::config::DEFAULT_RESERVED_WORDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Builder configured from the user configuration (docs root, reserved words)
    pub fn from_config(source: &'a dyn MetadataSource, config: &Config) -> Self {
        let mut builder = Self::new(source).with_reserved_words(config.reserved_words());
        if let Ok(layout) = DocsLayout::from_config(config) {
            builder = builder.with_docs(layout);
        }
        builder
    }

    pub fn with_docs(mut self, layout: DocsLayout) -> Self {
        self.docs = Some(layout);
        self
    }

    pub fn with_reserved_words(mut self, words: Vec<String>) -> Self {
        self.reserved_words = words;
        self
    }

    /// Fast path: the host's synopsis only, no documentation
    pub fn baseline_command(&self, name: &str) -> Option<CommandInfo> {
        let synopsis = self.source.command_synopsis(name)?;
        Some(parse_synopsis(name, &synopsis, &self.reserved_words))
    }

    /// Baseline plus documentation enrichment when a page exists
    pub fn full_command(&self, name: &str, documented: &BTreeSet<String>) -> Option<CommandInfo> {
        let mut info = self.baseline_command(name)?;
        if let Some(layout) = &self.docs {
            if documented.contains(name) {
                match read_command_doc(&layout.command_doc_page(name)) {
                    Ok(doc) => {
                        enrich(&mut info, &doc);
                    }
                    Err(e) => debug!("Skipping documentation for {}: {}", name, e),
                }
            }
        }
        Some(info)
    }

    /// Build a fresh store for the host's current version
    pub fn rebuild(&self) -> MetadataStore {
        let mut store = MetadataStore::new(&self.source.host_version());
        self.rebuild_into(&mut store);
        store
    }

    /// Clear `store` and repopulate every table
    pub fn rebuild_into(&self, store: &mut MetadataStore) {
        store.clear();
        store.version = Arc::from(self.source.host_version());

        let documented = match &self.docs {
            Some(layout) if layout.is_available() => documented_commands(layout),
            Some(layout) => {
                info!(
                    "Documentation not found at {}, using baseline metadata",
                    layout.root().display()
                );
                BTreeSet::new()
            }
            None => BTreeSet::new(),
        };

        for name in self.source.command_names() {
            match self.full_command(&name, &documented) {
                Some(info) => store.insert_command(info),
                None => debug!("Host returned no synopsis for {}", name),
            }
        }

        for name in self.source.api_class_names() {
            let Some(mut class) = self.source.api_class_info(&name) else {
                debug!("Host returned no API metadata for {}", name);
                continue;
            };
            infer_inverses(&mut class);
            store.insert_api_class(class);
        }

        for entity_type in self.source.entity_types() {
            let chain = self.source.inherited_types(&entity_type);
            if chain.is_empty() {
                store.hierarchy.insert(&entity_type, None);
            } else {
                store.hierarchy.insert_chain(&chain);
            }
            if let Some(api_class) = self.source.entity_api_class(&entity_type) {
                store
                    .entity_api_classes
                    .insert(Arc::from(entity_type.as_str()), Arc::from(api_class));
            }
        }
        if store.hierarchy.is_empty() {
            if let Some(layout) = self.docs.as_ref().filter(|l| l.is_available()) {
                match read_hierarchy(&layout.hierarchy_page()) {
                    Ok(hierarchy) => store.hierarchy = hierarchy,
                    Err(e) => debug!("No hierarchy page: {}", e),
                }
            }
        }

        store.ui_types = self
            .source
            .ui_types()
            .iter()
            .map(|t| Arc::from(t.as_str()))
            .collect();
        store.refresh_node_commands();

        info!(
            "Rebuilt metadata for {}: {} commands ({} documented), {} API classes, {} entity types",
            store.version,
            store.commands.len(),
            documented.len(),
            store.api_classes.len(),
            store.hierarchy.len()
        );
    }
}
