//! Session driver
//!
//! A [`Session`] owns the host together with everything the wrapper layer
//! keeps for it: configuration, metadata store, conversion registry, type
//! hierarchy, undo coordinator and override table. Host callbacks arrive as
//! queued [`HostEvent`]s that [`Session::process_events`] drains; every call
//! through the session drains them first.

use crate::class_factory::{self, ClassDecl, FactoryContext, WrapperClass};
use crate::errors::FactoryError;
use crate::overrides::OverrideTable;
use crate::plugins::PluginRecord;
use crate::probe::{probe_store, ProbeReport};
use crate::registry::{TypeHierarchy, CLASSES_NAMESPACE, COMMANDS_NAMESPACE};
use crate::synthesizer::command_function;
use hostbind_bridge::{
    CallContext, Callable, ConversionRegistry, Host, HostEvent, UndoCoordinator, Value,
    TRACKING_ATTRIBUTE, TRACKING_NODE,
};
use hostbind_config::Config;
use hostbind_docs::StoreBuilder;
use hostbind_meta::MetadataStore;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// What [`Session::initialize`] did
#[derive(Debug, Default)]
pub struct InitReport {
    pub from_cache: bool,
    pub commands: usize,
    pub classes: usize,
    /// (class, reason) for declarations that could not be built
    pub failed: Vec<(String, String)>,
    pub probe: Option<ProbeReport>,
}

pub struct Session<H: Host> {
    pub(crate) host: H,
    pub(crate) config: Config,
    pub(crate) store: MetadataStore,
    pub(crate) conversions: ConversionRegistry,
    pub(crate) types: TypeHierarchy,
    pub(crate) undo: UndoCoordinator,
    pub(crate) overrides: OverrideTable,
    pub(crate) declarations: Vec<ClassDecl>,
    pub(crate) plugins: BTreeMap<String, PluginRecord>,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, config: Config) -> Self {
        let store = MetadataStore::new(&host.host_version());
        let conversions = ConversionRegistry::new(&config.api_prefixes());
        Self {
            host,
            config,
            store,
            conversions,
            types: TypeHierarchy::new(),
            undo: UndoCoordinator::new(),
            overrides: OverrideTable::new(),
            declarations: Vec::new(),
            plugins: BTreeMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: OverrideTable) -> Self {
        self.overrides = overrides;
        self
    }

    /// Read the override table named by `overrides-path`, if configured
    pub fn load_overrides(mut self) -> Result<Self, FactoryError> {
        if let Some(path) = &self.config.overrides_path {
            self.overrides = OverrideTable::load(Path::new(path))?;
            debug!("Loaded {} overrides from {}", self.overrides.len(), path);
        }
        Ok(self)
    }

    /// Hand-written declaration; replaces the automatic one for its entity type
    pub fn declare(&mut self, decl: ClassDecl) {
        self.declarations.push(decl);
    }

    /// Load or rebuild metadata, register conversions and build every class
    pub fn initialize(&mut self) -> InitReport {
        let mut report = InitReport::default();
        let version = self.host.host_version();
        let cache = match self.config.metadata_cache_file(&version) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Metadata cache disabled: {}", e);
                None
            }
        };

        match cache
            .as_deref()
            .and_then(|path| MetadataStore::load_from_path(path, &version))
        {
            Some(store) => {
                self.store = store;
                report.from_cache = true;
            }
            None => {
                info!("Building metadata for host version {}", version);
                self.store = StoreBuilder::from_config(&self.host, &self.config).rebuild();
                if self.config.probing_enabled() {
                    report.probe = Some(probe_store(
                        &mut self.host,
                        &mut self.store,
                        &self.config.node_commands,
                    ));
                }
                if let Some(path) = &cache {
                    if let Err(e) = self.store.save_to_path(path) {
                        warn!("Could not save metadata cache {}: {}", path.display(), e);
                    }
                }
            }
        }

        let exposed: BTreeSet<String> = self.host.api_class_names().into_iter().collect();
        self.conversions = ConversionRegistry::with_defaults(
            &self.config.api_prefixes(),
            &|name: &str| exposed.contains(name),
        );

        for info in self.store.commands.values() {
            self.types
                .add_function(COMMANDS_NAMESPACE, command_function(info));
        }
        report.commands = self.store.commands.len();

        self.build_classes(&mut report);
        info!(
            "Session ready: {} commands, {} classes, {} failed",
            report.commands,
            report.classes,
            report.failed.len()
        );
        report
    }

    /// Declaration for an entity type: the user's if one targets it
    pub(crate) fn declaration_for(&self, entity_type: &str) -> ClassDecl {
        self.declarations
            .iter()
            .find(|decl| decl.entity_type.as_deref() == Some(entity_type))
            .cloned()
            .unwrap_or_else(|| ClassDecl::automatic(entity_type))
    }

    /// Entity-bound classes ancestor-first, then declarations with no entity type
    fn build_classes(&mut self, report: &mut InitReport) {
        let mut pending: Vec<ClassDecl> = self
            .store
            .hierarchy
            .ancestor_first()
            .iter()
            .filter(|entity| self.types.lookup_by_entity(entity).is_none())
            .map(|entity| self.declaration_for(entity))
            .collect();
        pending.extend(
            self.declarations
                .iter()
                .filter(|decl| decl.entity_type.is_none())
                .cloned(),
        );

        for decl in pending {
            if self.types.lookup_by_name(&decl.name).is_some() {
                continue;
            }
            let name = decl.name.to_string();
            match self.build_class(decl) {
                Ok(_) => report.classes += 1,
                Err(e) => {
                    warn!("Could not build class {}: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }
    }

    /// Build one class and register it
    pub fn build_class(&mut self, decl: ClassDecl) -> Result<Rc<WrapperClass>, FactoryError> {
        let cx = FactoryContext {
            store: &self.store,
            conversions: &self.conversions,
            overrides: &self.overrides,
            types: &self.types,
            node_commands: &self.config.node_commands,
        };
        let class = class_factory::build_class(cx, decl)?;
        self.types.register(class, CLASSES_NAMESPACE)
    }

    /// Drain queued host events. Returns how many were handled; failures
    /// are logged and do not stop the queue.
    pub fn process_events(&mut self) -> usize {
        let events = self.host.drain_events();
        let count = events.len();
        for event in events {
            match event {
                HostEvent::AttributeChanged {
                    node,
                    attribute,
                    value,
                } if node == TRACKING_NODE && attribute == TRACKING_ATTRIBUTE => {
                    if let Err(e) = self
                        .undo
                        .handle_change(&mut self.host, &self.conversions, value)
                    {
                        warn!("Undo replay failed: {}", e);
                    }
                }
                HostEvent::AttributeChanged { node, attribute, .. } => {
                    debug!("Ignoring change of {}.{}", node, attribute);
                }
                HostEvent::PluginLoaded(name) => {
                    self.plugin_loaded(&name);
                }
                HostEvent::PluginUnloaded(name) => {
                    if self.plugin_unloaded(&name).is_none() {
                        debug!("Plugin {} was not tracked", name);
                    }
                }
                HostEvent::SceneReset => self.undo.flush(),
            }
        }
        count
    }

    fn resolve_method(&self, class: &str, method: &str) -> Result<Rc<Callable>, FactoryError> {
        if self.types.lookup_by_name(class).is_none() {
            return Err(FactoryError::UnknownClass(class.to_string()));
        }
        self.types
            .find_method(class, method)
            .ok_or_else(|| FactoryError::UnknownMethod {
                class: class.to_string(),
                method: method.to_string(),
            })
    }

    /// Call a method resolved through the class and its ancestors
    pub fn invoke(
        &mut self,
        class: &str,
        method: &str,
        this: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, FactoryError> {
        self.process_events();
        let callable = self.resolve_method(class, method)?;
        let mut cx = CallContext::new(&mut self.host, &self.conversions, &mut self.undo);
        Ok(callable.invoke(&mut cx, this, args)?)
    }

    pub fn invoke_kw(
        &mut self,
        class: &str,
        method: &str,
        this: Option<&Value>,
        args: &[Value],
        kwargs: &[(&str, Value)],
    ) -> Result<Value, FactoryError> {
        self.process_events();
        let callable = self.resolve_method(class, method)?;
        let mut cx = CallContext::new(&mut self.host, &self.conversions, &mut self.undo);
        Ok(callable.call_kw(&mut cx, this, args, kwargs)?)
    }

    /// Run a command function with keyword flags
    pub fn call_command(
        &mut self,
        name: &str,
        args: &[Value],
        kwargs: &[(&str, Value)],
    ) -> Result<Value, FactoryError> {
        self.process_events();
        let callable = self
            .types
            .function(COMMANDS_NAMESPACE, name)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownFunction(name.to_string()))?;
        let mut cx = CallContext::new(&mut self.host, &self.conversions, &mut self.undo);
        Ok(callable.call_kw(&mut cx, None, args, kwargs)?)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    pub fn conversions(&self) -> &ConversionRegistry {
        &self.conversions
    }

    pub fn undo(&self) -> &UndoCoordinator {
        &self.undo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginRecord> {
        self.plugins.get(name)
    }
}
