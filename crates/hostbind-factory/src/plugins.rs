//! Plugin lifecycle hooks
//!
//! A plugin load adds baseline metadata for the plugin's commands (no
//! documentation pass), exposes a function per command and builds a class
//! for every new level of each new entity type's chain, root first. The
//! [`PluginRecord`] kept per plugin is what an unload takes back out.

use crate::registry::COMMANDS_NAMESPACE;
use crate::session::Session;
use crate::synthesizer::command_function;
use hostbind_bridge::Host;
use hostbind_docs::StoreBuilder;
use hostbind_meta::{infer_inverses, merge_commands, CommandInfo};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one plugin load added
#[derive(Debug, Clone, Default)]
pub struct PluginRecord {
    /// Commands the store did not know before the load
    pub commands: Vec<String>,
    /// Prior metadata of host commands the plugin redefined
    pub replaced: Vec<CommandInfo>,
    pub classes: Vec<String>,
    /// Entity types the store did not know before the load
    pub entity_types: Vec<String>,
    /// API classes whose metadata came in with the plugin
    pub api_classes: Vec<String>,
}

impl<H: Host> Session<H> {
    pub fn plugin_loaded(&mut self, plugin: &str) -> PluginRecord {
        let mut record = PluginRecord::default();

        let names = self.host.plugin_commands(plugin);
        let commands: Vec<CommandInfo> = {
            let builder =
                StoreBuilder::new(&self.host).with_reserved_words(self.config.reserved_words());
            names
                .iter()
                .filter_map(|name| builder.baseline_command(name))
                .collect()
        };
        let previous: Vec<CommandInfo> = names
            .iter()
            .filter_map(|name| self.store.get_command_info(name).ok().cloned())
            .collect();
        let merged = merge_commands(&mut self.store, commands);
        debug!(
            "Plugin {}: {} commands inserted, {} updated, {} unchanged",
            plugin,
            merged.inserted.len(),
            merged.updated.len(),
            merged.unchanged
        );
        for name in names {
            let Ok(info) = self.store.get_command_info(&name) else {
                debug!("Plugin {}: no synopsis for {}", plugin, name);
                continue;
            };
            self.types
                .add_function(COMMANDS_NAMESPACE, command_function(info));
            match previous.iter().find(|p| &*p.name == name.as_str()) {
                None => record.commands.push(name),
                Some(prior) if merged.updated.iter().any(|u| &**u == name.as_str()) => {
                    record.replaced.push(prior.clone());
                }
                Some(_) => {}
            }
        }

        for entity_type in self.host.plugin_entity_types(plugin) {
            let mut chain = self.host.inherited_types(&entity_type);
            if chain.is_empty() {
                chain.push(entity_type.clone());
            }
            let unseen: Vec<String> = chain
                .iter()
                .filter(|level| !self.store.hierarchy.contains(level))
                .cloned()
                .collect();
            self.store.hierarchy.insert_chain(&chain);
            record.entity_types.extend(unseen);

            for level in &chain {
                if self.types.lookup_by_entity(level).is_some() {
                    continue;
                }
                self.add_entity_api_class(level, &mut record);
                let decl = self.declaration_for(level);
                match self.build_class(decl) {
                    Ok(class) => record.classes.push(class.name.to_string()),
                    Err(e) => warn!("Plugin {}: could not build class for {}: {}", plugin, level, e),
                }
            }
        }

        self.store.refresh_node_commands();
        info!(
            "Plugin {} loaded: {} commands, {} classes",
            plugin,
            record.commands.len(),
            record.classes.len()
        );
        self.plugins.insert(plugin.to_string(), record.clone());
        record
    }

    fn add_entity_api_class(&mut self, entity_type: &str, record: &mut PluginRecord) {
        let Some(api_class) = self.host.entity_api_class(entity_type) else {
            return;
        };
        if !self.store.api_classes.contains_key(api_class.as_str()) {
            if let Some(mut info) = self.host.api_class_info(&api_class) {
                infer_inverses(&mut info);
                self.store.insert_api_class(info);
                record.api_classes.push(api_class.clone());
            }
        }
        self.store
            .entity_api_classes
            .insert(Arc::from(entity_type), Arc::from(api_class.as_str()));
    }

    /// Remove what the plugin's load added. `None` for an untracked plugin.
    pub fn plugin_unloaded(&mut self, plugin: &str) -> Option<PluginRecord> {
        let record = self.plugins.remove(plugin)?;
        for command in &record.commands {
            self.store.remove_command(command);
            self.types.remove_function(COMMANDS_NAMESPACE, command);
        }
        for prior in &record.replaced {
            self.types
                .add_function(COMMANDS_NAMESPACE, command_function(prior));
            self.store.insert_command(prior.clone());
        }
        for class in &record.classes {
            self.types.remove(class);
        }
        for entity_type in &record.entity_types {
            self.store.remove_entity_type(entity_type);
        }
        for api_class in &record.api_classes {
            self.store.api_classes.remove(api_class.as_str());
        }
        self.store.refresh_node_commands();
        info!(
            "Plugin {} unloaded: {} commands, {} classes removed",
            plugin,
            record.commands.len(),
            record.classes.len()
        );
        Some(record)
    }
}
