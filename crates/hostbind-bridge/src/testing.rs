//! In-memory host for tests
//!
//! Commands answer create/query/edit against per-node attribute maps, API
//! methods are closures over the target node's attributes, and integer
//! attribute writes land on a native undo queue that `undo()`/`redo()` walk.
//! Only changes made through that queue are reported as events.

use crate::errors::HostError;
use crate::host::{ApiCall, Host, HostEvent};
use crate::units::UnitSettings;
use crate::Value;
use hostbind_meta::{ApiClassInfo, MetadataSource, Mode, ObjectRef};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

pub type Attributes = BTreeMap<String, Value>;
pub type MethodImpl = Rc<dyn Fn(&mut Attributes, &mut [Value]) -> Result<Value, HostError>>;
pub type CommandImpl = Rc<dyn Fn(&[Value], &[(Arc<str>, Value)]) -> Result<Value, HostError>>;

#[derive(Debug, Clone)]
pub struct MockFlag {
    pub long: String,
    pub short: String,
    /// Synopsis type tokens, e.g. `"Length Length Length"`
    pub tokens: String,
    /// Modes the flag actually supports
    pub modes: Vec<Mode>,
    pub default: Value,
    /// Query answers come back wrapped in a one-element list
    pub query_as_list: bool,
}

impl MockFlag {
    pub fn new(long: &str, short: &str, tokens: &str) -> Self {
        Self {
            long: long.to_string(),
            short: short.to_string(),
            tokens: tokens.to_string(),
            modes: vec![Mode::Create, Mode::Query, Mode::Edit],
            default: Value::Null,
            query_as_list: false,
        }
    }

    pub fn with_modes(mut self, modes: &[Mode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = value;
        self
    }

    pub fn query_as_list(mut self) -> Self {
        self.query_as_list = true;
        self
    }

    fn matches(&self, name: &str) -> bool {
        self.long == name || (!self.short.is_empty() && self.short == name)
    }
}

#[derive(Clone, Default)]
pub struct MockCommand {
    pub flags: Vec<MockFlag>,
    /// Entity type created in create mode
    pub creates: Option<String>,
    /// Create-mode behavior of commands that do not create entities
    pub handler: Option<CommandImpl>,
}

impl MockCommand {
    pub fn creating(entity_type: &str) -> Self {
        Self {
            creates: Some(entity_type.to_string()),
            ..Default::default()
        }
    }

    pub fn handled<F>(handler: F) -> Self
    where
        F: Fn(&[Value], &[(Arc<str>, Value)]) -> Result<Value, HostError> + 'static,
    {
        Self {
            handler: Some(Rc::new(handler)),
            ..Default::default()
        }
    }

    pub fn with_flag(mut self, flag: MockFlag) -> Self {
        self.flags.push(flag);
        self
    }

    fn flag(&self, name: &str) -> Option<&MockFlag> {
        self.flags.iter().find(|f| f.matches(name))
    }

    fn synopsis(&self, name: &str) -> String {
        let mut text = format!("Synopsis: {} [flags] [String...]\nFlags:\n   -e -edit\n   -q -query\n", name);
        for flag in &self.flags {
            let short = if flag.short.is_empty() { &flag.long } else { &flag.short };
            text.push_str(&format!(" -{} -{} {}\n", short, flag.long, flag.tokens));
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct MockNode {
    pub entity_type: String,
    pub attrs: Attributes,
}

/// What a plugin adds to the host when loaded
#[derive(Clone, Default)]
pub struct MockPlugin {
    pub commands: Vec<(String, MockCommand)>,
    /// (entity type, parent)
    pub entity_types: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone)]
struct AttrChange {
    node: String,
    attribute: String,
    old: i64,
    new: i64,
}

pub struct MockHost {
    pub version: String,
    pub units: UnitSettings,
    /// Every command and method dispatch, in order
    pub calls: Vec<String>,
    commands: BTreeMap<String, MockCommand>,
    api_classes: BTreeMap<String, ApiClassInfo>,
    extra_api_types: BTreeSet<String>,
    methods: BTreeMap<(String, String), MethodImpl>,
    entity_parents: BTreeMap<String, Option<String>>,
    entity_api: BTreeMap<String, String>,
    nodes: BTreeMap<String, MockNode>,
    objects: BTreeMap<u64, String>,
    statics: Attributes,
    next_id: u64,
    selection: Vec<Value>,
    undo_enabled: bool,
    native_undo: Vec<AttrChange>,
    native_redo: Vec<AttrChange>,
    plugins: BTreeMap<String, MockPlugin>,
    loaded: BTreeSet<String>,
    events: VecDeque<HostEvent>,
}

impl MockHost {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            units: UnitSettings::default(),
            calls: Vec::new(),
            commands: BTreeMap::new(),
            api_classes: BTreeMap::new(),
            extra_api_types: BTreeSet::new(),
            methods: BTreeMap::new(),
            entity_parents: BTreeMap::new(),
            entity_api: BTreeMap::new(),
            nodes: BTreeMap::new(),
            objects: BTreeMap::new(),
            statics: Attributes::new(),
            next_id: 0,
            selection: Vec::new(),
            undo_enabled: true,
            native_undo: Vec::new(),
            native_redo: Vec::new(),
            plugins: BTreeMap::new(),
            loaded: BTreeSet::new(),
            events: VecDeque::new(),
        }
    }

    pub fn add_command(&mut self, name: &str, command: MockCommand) {
        self.commands.insert(name.to_string(), command);
    }

    pub fn add_entity_type(&mut self, entity_type: &str, parent: Option<&str>) {
        self.entity_parents
            .insert(entity_type.to_string(), parent.map(str::to_string));
    }

    pub fn set_entity_api_class(&mut self, entity_type: &str, api_class: &str) {
        self.entity_api
            .insert(entity_type.to_string(), api_class.to_string());
    }

    pub fn add_api_class(&mut self, class: ApiClassInfo) {
        self.api_classes.insert(class.name.to_string(), class);
    }

    /// API type the host exposes without method metadata (array types)
    pub fn add_api_type(&mut self, name: &str) {
        self.extra_api_types.insert(name.to_string());
    }

    pub fn add_method<F>(&mut self, class: &str, method: &str, f: F)
    where
        F: Fn(&mut Attributes, &mut [Value]) -> Result<Value, HostError> + 'static,
    {
        self.methods
            .insert((class.to_string(), method.to_string()), Rc::new(f));
    }

    pub fn add_plugin(&mut self, name: &str, plugin: MockPlugin) {
        self.plugins.insert(name.to_string(), plugin);
    }

    /// Create a node the way a user would
    pub fn create_node(&mut self, entity_type: &str) -> String {
        self.next_id += 1;
        let name = format!("{}{}", entity_type, self.next_id);
        self.nodes.insert(
            name.clone(),
            MockNode {
                entity_type: entity_type.to_string(),
                attrs: Attributes::new(),
            },
        );
        name
    }

    pub fn node(&self, name: &str) -> Option<&MockNode> {
        self.nodes.get(name)
    }

    pub fn node_attr(&self, node: &str, attribute: &str) -> Option<&Value> {
        self.nodes.get(node)?.attrs.get(attribute)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn native_undo_depth(&self) -> usize {
        self.native_undo.len()
    }

    /// Undo the last recorded attribute write, reporting it as an event
    pub fn undo(&mut self) -> bool {
        let Some(change) = self.native_undo.pop() else {
            return false;
        };
        self.apply_change(&change.node, &change.attribute, change.old);
        self.native_redo.push(change);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(change) = self.native_redo.pop() else {
            return false;
        };
        self.apply_change(&change.node, &change.attribute, change.new);
        self.native_undo.push(change);
        true
    }

    fn apply_change(&mut self, node: &str, attribute: &str, value: i64) {
        if let Some(entry) = self.nodes.get_mut(node) {
            entry.attrs.insert(attribute.to_string(), Value::Int(value));
            self.events.push_back(HostEvent::AttributeChanged {
                node: node.to_string(),
                attribute: attribute.to_string(),
                value,
            });
        }
    }

    /// Empty the scene, as a new-file action would
    pub fn new_scene(&mut self) {
        self.nodes.clear();
        self.objects.clear();
        self.selection.clear();
        self.native_undo.clear();
        self.native_redo.clear();
        self.events.push_back(HostEvent::SceneReset);
    }

    pub fn load_plugin(&mut self, name: &str) -> bool {
        let Some(plugin) = self.plugins.get(name).cloned() else {
            return false;
        };
        for (command, info) in plugin.commands {
            self.commands.insert(command, info);
        }
        for (entity_type, parent) in plugin.entity_types {
            self.entity_parents.insert(entity_type, parent);
        }
        self.loaded.insert(name.to_string());
        self.events
            .push_back(HostEvent::PluginLoaded(name.to_string()));
        true
    }

    pub fn unload_plugin(&mut self, name: &str) -> bool {
        if !self.loaded.remove(name) {
            return false;
        }
        if let Some(plugin) = self.plugins.get(name) {
            for (command, _) in &plugin.commands {
                self.commands.remove(command);
            }
            for (entity_type, _) in &plugin.entity_types {
                self.entity_parents.remove(entity_type);
            }
        }
        self.events
            .push_back(HostEvent::PluginUnloaded(name.to_string()));
        true
    }

    fn node_name(&self, value: &Value) -> Result<String, HostError> {
        let name = match value {
            Value::Str(name) => name.to_string(),
            Value::Object(obj) => self
                .objects
                .get(&obj.id)
                .cloned()
                .ok_or_else(|| HostError::NoSuchEntity(value.to_string()))?,
            other => return Err(HostError::NoSuchEntity(other.to_string())),
        };
        if self.nodes.contains_key(&name) {
            Ok(name)
        } else {
            Err(HostError::NoSuchEntity(name))
        }
    }

    fn node_mut(&mut self, name: &str) -> Result<&mut MockNode, HostError> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| HostError::NoSuchEntity(name.to_string()))
    }

    fn mode_of(flags: &[(Arc<str>, Value)]) -> Mode {
        let set = |mode: &str| {
            flags
                .iter()
                .any(|(name, value)| name.as_ref() == mode && value.as_bool() == Some(true))
        };
        if set("query") {
            Mode::Query
        } else if set("edit") {
            Mode::Edit
        } else {
            Mode::Create
        }
    }

    fn resolve_flag<'c>(
        command: &'c MockCommand,
        name: &str,
        flag: &str,
        mode: Mode,
    ) -> Result<&'c MockFlag, HostError> {
        let found = command.flag(flag).ok_or_else(|| HostError::InvalidFlag {
            command: name.to_string(),
            flag: flag.to_string(),
        })?;
        if !found.modes.contains(&mode) {
            return Err(HostError::Runtime(format!(
                "Flag '{}' cannot be used in {} mode",
                found.long, mode
            )));
        }
        Ok(found)
    }
}

impl MetadataSource for MockHost {
    fn host_version(&self) -> String {
        self.version.clone()
    }

    fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    fn command_synopsis(&self, name: &str) -> Option<String> {
        self.commands.get(name).map(|c| c.synopsis(name))
    }

    fn api_class_names(&self) -> Vec<String> {
        self.api_classes
            .keys()
            .chain(self.extra_api_types.iter())
            .cloned()
            .collect()
    }

    fn api_class_info(&self, name: &str) -> Option<ApiClassInfo> {
        self.api_classes.get(name).cloned()
    }

    fn entity_types(&self) -> Vec<String> {
        self.entity_parents.keys().cloned().collect()
    }

    fn inherited_types(&self, entity_type: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(entity_type.to_string());
        while let Some(name) = current {
            if chain.contains(&name) || !self.entity_parents.contains_key(&name) {
                break;
            }
            current = self.entity_parents.get(&name).cloned().flatten();
            chain.push(name);
        }
        chain.reverse();
        chain
    }

    fn entity_api_class(&self, entity_type: &str) -> Option<String> {
        self.entity_api.get(entity_type).cloned()
    }
}

impl Host for MockHost {
    fn call_command(
        &mut self,
        name: &str,
        args: &[Value],
        flags: &[(Arc<str>, Value)],
    ) -> Result<Value, HostError> {
        let rendered: Vec<String> = args
            .iter()
            .map(ToString::to_string)
            .chain(flags.iter().map(|(f, v)| format!("{}={}", f, v)))
            .collect();
        self.calls.push(format!("{}({})", name, rendered.join(", ")));

        let command = self
            .commands
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownCommand(name.to_string()))?;
        let mode = Self::mode_of(flags);
        let data: Vec<&(Arc<str>, Value)> = flags
            .iter()
            .filter(|(f, _)| f.as_ref() != "query" && f.as_ref() != "edit")
            .collect();

        match mode {
            Mode::Query => {
                let target = args
                    .first()
                    .ok_or_else(|| HostError::Runtime(format!("{}: no object to query", name)))?;
                let node = self.node_name(target)?;
                let Some((flag_name, _)) = data.first() else {
                    return Err(HostError::Runtime(format!("{}: nothing to query", name)));
                };
                let flag = Self::resolve_flag(&command, name, flag_name, mode)?;
                let value = self
                    .node_attr(&node, &flag.long)
                    .cloned()
                    .unwrap_or_else(|| flag.default.clone());
                Ok(if flag.query_as_list {
                    Value::List(vec![value])
                } else {
                    value
                })
            }
            Mode::Edit => {
                let target = args
                    .first()
                    .ok_or_else(|| HostError::Runtime(format!("{}: no object to edit", name)))?;
                let node = self.node_name(target)?;
                for (flag_name, value) in data {
                    let flag = Self::resolve_flag(&command, name, flag_name, mode)?;
                    let long = flag.long.clone();
                    self.node_mut(&node)?.attrs.insert(long, value.clone());
                }
                Ok(Value::Null)
            }
            Mode::Create => {
                if let Some(handler) = &command.handler {
                    return (**handler)(args, flags);
                }
                let mut values = Vec::new();
                for (flag_name, value) in data {
                    let flag = Self::resolve_flag(&command, name, flag_name, mode)?;
                    values.push((flag.long.clone(), value.clone()));
                }
                let Some(entity_type) = &command.creates else {
                    return Ok(Value::Null);
                };
                let node = self.create_node(entity_type);
                self.node_mut(&node)?.attrs.extend(values);
                Ok(Value::str(&node))
            }
        }
    }

    fn call_method(&mut self, call: ApiCall<'_>) -> Result<Value, HostError> {
        let rendered: Vec<String> = call.args.iter().map(ToString::to_string).collect();
        self.calls
            .push(format!("{}.{}({})", call.class, call.method, rendered.join(", ")));

        let method = self
            .methods
            .get(&(call.class.to_string(), call.method.to_string()))
            .cloned()
            .ok_or_else(|| {
                HostError::Unsupported(format!("{}.{}", call.class, call.method))
            })?;
        match call.target {
            Some(target) => {
                let node = self.node_name(target)?;
                let attrs = &mut self.node_mut(&node)?.attrs;
                (*method)(attrs, call.args)
            }
            None => (*method)(&mut self.statics, call.args),
        }
    }

    fn api_delegate(&mut self, this: &Value, api_class: &str) -> Result<Value, HostError> {
        let node = self.node_name(this)?;
        self.next_id += 1;
        self.objects.insert(self.next_id, node);
        Ok(Value::Object(ObjectRef::new(api_class, self.next_id)))
    }

    fn unit_settings(&self) -> UnitSettings {
        self.units
    }

    fn create_entity_quiet(&mut self, entity_type: &str) -> Result<Value, HostError> {
        if !self.entity_parents.contains_key(entity_type)
            && !self
                .commands
                .values()
                .any(|c| c.creates.as_deref() == Some(entity_type))
        {
            return Err(HostError::Runtime(format!(
                "Unknown entity type: {}",
                entity_type
            )));
        }
        Ok(Value::str(&self.create_node(entity_type)))
    }

    fn delete_entities(&mut self, entities: &[Value]) -> Result<(), HostError> {
        for entity in entities {
            let node = self.node_name(entity)?;
            self.nodes.remove(&node);
            self.selection.retain(|s| s.as_str() != Some(node.as_str()));
        }
        Ok(())
    }

    fn list_entities(&self) -> Vec<Value> {
        self.nodes.keys().map(|name| Value::str(name)).collect()
    }

    fn selection(&self) -> Vec<Value> {
        self.selection.clone()
    }

    fn set_selection(&mut self, selection: &[Value]) -> Result<(), HostError> {
        for item in selection {
            self.node_name(item)?;
        }
        self.selection = selection.to_vec();
        Ok(())
    }

    fn undo_enabled(&self) -> bool {
        self.undo_enabled
    }

    fn set_undo_enabled(&mut self, enabled: bool) {
        self.undo_enabled = enabled;
    }

    fn node_exists(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    fn create_tracking_node(&mut self, name: &str, attribute: &str) -> Result<(), HostError> {
        let mut attrs = Attributes::new();
        attrs.insert(attribute.to_string(), Value::Int(0));
        self.nodes.insert(
            name.to_string(),
            MockNode {
                entity_type: "script".to_string(),
                attrs,
            },
        );
        Ok(())
    }

    fn get_int_attr(&self, node: &str, attribute: &str) -> Result<i64, HostError> {
        let entry = self
            .nodes
            .get(node)
            .ok_or_else(|| HostError::NoSuchEntity(node.to_string()))?;
        entry
            .attrs
            .get(attribute)
            .and_then(Value::as_i64)
            .ok_or_else(|| HostError::Runtime(format!("No integer attribute {}.{}", node, attribute)))
    }

    fn set_int_attr(&mut self, node: &str, attribute: &str, value: i64) -> Result<(), HostError> {
        let old = self.get_int_attr(node, attribute).unwrap_or(0);
        self.node_mut(node)?
            .attrs
            .insert(attribute.to_string(), Value::Int(value));
        if self.undo_enabled {
            self.native_undo.push(AttrChange {
                node: node.to_string(),
                attribute: attribute.to_string(),
                old,
                new: value,
            });
            self.native_redo.clear();
        }
        Ok(())
    }

    fn plugin_commands(&self, plugin: &str) -> Vec<String> {
        match (self.loaded.contains(plugin), self.plugins.get(plugin)) {
            (true, Some(p)) => p.commands.iter().map(|(name, _)| name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    fn plugin_entity_types(&self, plugin: &str) -> Vec<String> {
        match (self.loaded.contains(plugin), self.plugins.get(plugin)) {
            (true, Some(p)) => p.entity_types.iter().map(|(name, _)| name.clone()).collect(),
            _ => Vec::new(),
        }
    }

    fn drain_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, value: Value) -> (Arc<str>, Value) {
        (Arc::from(name), value)
    }

    fn host() -> MockHost {
        let mut host = MockHost::new("2026");
        host.add_entity_type("node", None);
        host.add_entity_type("transform", Some("node"));
        host.add_entity_type("joint", Some("transform"));
        host.add_command(
            "joint",
            MockCommand::creating("joint")
                .with_flag(MockFlag::new("radius", "rad", "Float").with_default(Value::Float(0.5)))
                .with_flag(MockFlag::new("name", "n", "String").with_modes(&[Mode::Create])),
        );
        host
    }

    #[test]
    fn test_command_modes() {
        let mut host = host();
        let flags = [flag("rad", Value::Float(2.0))];
        let created = host.call_command("joint", &[], &flags);
        assert!(matches!(created, Ok(Value::Str(_))));
        let Ok(node) = created else {
            return;
        };

        let query = [flag("radius", Value::Bool(true)), flag("query", Value::Bool(true))];
        assert_eq!(host.call_command("joint", &[node.clone()], &query), Ok(Value::Float(2.0)));

        let name_query = [flag("name", Value::Bool(true)), flag("query", Value::Bool(true))];
        assert!(matches!(
            host.call_command("joint", &[node.clone()], &name_query),
            Err(HostError::Runtime(_))
        ));

        let bogus = [flag("bogus", Value::Bool(true)), flag("edit", Value::Bool(true))];
        assert!(matches!(
            host.call_command("joint", &[node], &bogus),
            Err(HostError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn test_synopsis_and_hierarchy() {
        let host = host();
        assert!(host
            .command_synopsis("joint")
            .is_some_and(|s| s.contains(" -rad -radius Float")));
        assert_eq!(host.inherited_types("joint"), vec!["node", "transform", "joint"]);
        assert!(host.inherited_types("missing").is_empty());
    }

    #[test]
    fn test_native_undo_reports_events() {
        let mut host = host();
        let node = host.create_node("transform");
        assert!(host.set_int_attr(&node, "count", 1).is_ok());
        assert!(host.set_int_attr(&node, "count", 2).is_ok());
        assert!(host.drain_events().is_empty());

        assert!(host.undo());
        assert_eq!(host.get_int_attr(&node, "count"), Ok(1));
        assert_eq!(
            host.drain_events(),
            vec![HostEvent::AttributeChanged {
                node: node.clone(),
                attribute: "count".to_string(),
                value: 1
            }]
        );
        assert!(host.redo());
        assert_eq!(host.get_int_attr(&node, "count"), Ok(2));
        assert!(!host.redo());
    }

    #[test]
    fn test_plugin_load_unload() {
        let mut host = host();
        host.add_plugin(
            "footPrint",
            MockPlugin {
                commands: vec![("footPrint".to_string(), MockCommand::creating("footPrint"))],
                entity_types: vec![("footPrint".to_string(), Some("transform".to_string()))],
            },
        );
        assert!(host.plugin_commands("footPrint").is_empty());
        assert!(host.load_plugin("footPrint"));
        assert_eq!(host.plugin_commands("footPrint"), vec!["footPrint"]);
        assert_eq!(host.inherited_types("footPrint"), vec!["node", "transform", "footPrint"]);

        assert!(host.unload_plugin("footPrint"));
        assert!(host.command_synopsis("footPrint").is_none());
        assert_eq!(
            host.drain_events(),
            vec![
                HostEvent::PluginLoaded("footPrint".to_string()),
                HostEvent::PluginUnloaded("footPrint".to_string())
            ]
        );
    }
}
