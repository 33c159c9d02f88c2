//! Class Factory
//!
//! A [`ClassDecl`] is pure data naming what a wrapper class binds to: an
//! entity type, an API class (inherited directly or reached through a
//! per-call delegate), a command, and any hand-written methods. The
//! [`ClassBuilder`] walks a declaration through the build phases
//!
//! `Declared -> BaseResolved -> ApiMethodsAttached -> CommandMethodsAttached`
//!
//! and hands back a [`WrapperClass`] with a closed method table. Registration
//! in the [`TypeHierarchy`] moves it to `Registered`.

use crate::analyzer::Analyzer;
use crate::errors::FactoryError;
use crate::overrides::{OverrideTable, UseName};
use crate::registry::TypeHierarchy;
use crate::synthesizer::{self, MethodSpec};
use hostbind_bridge::{Callable, ConversionRegistry, UndoBinding};
use hostbind_meta::naming::{capitalize, prefixed};
use hostbind_meta::{ApiClassInfo, ApiEnum, CommandInfo, FlagInfo, MetadataStore, Mode};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// DECLARATION
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Arc<str>,
    /// Explicit parent class; otherwise taken from the entity hierarchy
    pub parent: Option<Arc<str>>,
    pub entity_type: Option<Arc<str>>,
    pub api_class: Option<Arc<str>>,
    /// Reach the API class through a delegate fetched per call instead of
    /// inheriting it
    pub proxy: bool,
    pub command: Option<Arc<str>>,
    pub natives: Vec<Callable>,
    pub doc: String,
    /// Generated for an entity type no user declaration covers
    pub automatic: bool,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            parent: None,
            entity_type: None,
            api_class: None,
            proxy: true,
            command: None,
            natives: Vec::new(),
            doc: String::new(),
            automatic: false,
        }
    }

    /// Declaration for an entity type: `transform` -> `Transform`
    pub fn automatic(entity_type: &str) -> Self {
        let mut decl = Self::new(&capitalize(entity_type)).for_entity_type(entity_type);
        decl.automatic = true;
        decl
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(Arc::from(parent));
        self
    }

    pub fn for_entity_type(mut self, entity_type: &str) -> Self {
        self.entity_type = Some(Arc::from(entity_type));
        self
    }

    /// Inherit the API class directly
    pub fn wrapping(mut self, api_class: &str) -> Self {
        self.api_class = Some(Arc::from(api_class));
        self.proxy = false;
        self
    }

    /// Delegate to an instance of the API class obtained per call
    pub fn proxying(mut self, api_class: &str) -> Self {
        self.api_class = Some(Arc::from(api_class));
        self.proxy = true;
        self
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.command = Some(Arc::from(command));
        self
    }

    pub fn with_native(mut self, callable: Callable) -> Self {
        self.natives.push(callable);
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = doc.to_string();
        self
    }
}

// =============================================================================
// WRAPPER CLASS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassState {
    Declared,
    BaseResolved,
    ApiMethodsAttached,
    CommandMethodsAttached,
    Registered,
}

impl fmt::Display for ClassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ClassState::Declared => "declared",
            ClassState::BaseResolved => "base-resolved",
            ClassState::ApiMethodsAttached => "api-methods-attached",
            ClassState::CommandMethodsAttached => "command-methods-attached",
            ClassState::Registered => "registered",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct WrapperClass {
    pub name: Arc<str>,
    pub parent: Option<Arc<str>>,
    pub entity_type: Option<Arc<str>>,
    pub api_class: Option<Arc<str>>,
    /// API class inherited directly; only set for non-proxy classes
    pub api_base: Option<Arc<str>>,
    pub proxy: bool,
    pub command: Option<Arc<str>>,
    pub methods: BTreeMap<Arc<str>, Rc<Callable>>,
    /// Class-level enum attributes
    pub enums: BTreeMap<Arc<str>, ApiEnum>,
    pub doc: String,
    pub automatic: bool,
    pub state: ClassState,
}

impl WrapperClass {
    /// Fresh class for a declaration: hand-written methods only
    pub fn declared(decl: &ClassDecl) -> Self {
        let methods = decl
            .natives
            .iter()
            .map(|native| (native.name.clone(), Rc::new(native.clone())))
            .collect();
        Self {
            name: decl.name.clone(),
            parent: decl.parent.clone(),
            entity_type: decl.entity_type.clone(),
            api_class: None,
            api_base: None,
            proxy: decl.proxy,
            command: None,
            methods,
            enums: BTreeMap::new(),
            doc: decl.doc.clone(),
            automatic: decl.automatic,
            state: ClassState::Declared,
        }
    }

    pub fn method(&self, name: &str) -> Option<&Rc<Callable>> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(AsRef::as_ref)
    }

    /// Symbolic names of a class-level enum, in declaration order
    pub fn enum_values(&self, name: &str) -> Option<&[Arc<str>]> {
        self.enums.get(name).map(|e| e.display.as_slice())
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Shared state every class build reads
#[derive(Clone, Copy)]
pub struct FactoryContext<'a> {
    pub store: &'a MetadataStore,
    pub conversions: &'a ConversionRegistry,
    pub overrides: &'a OverrideTable,
    pub types: &'a TypeHierarchy,
    /// entity type -> command, for types whose command is not named after them
    pub node_commands: &'a BTreeMap<String, String>,
}

pub struct ClassBuilder<'a> {
    cx: FactoryContext<'a>,
    decl: ClassDecl,
    class: WrapperClass,
}

impl<'a> ClassBuilder<'a> {
    pub fn new(cx: FactoryContext<'a>, decl: ClassDecl) -> Self {
        let class = WrapperClass::declared(&decl);
        Self { cx, decl, class }
    }

    pub fn state(&self) -> ClassState {
        self.class.state
    }

    fn analyzer(&self) -> Analyzer<'a> {
        Analyzer::new(self.cx.store, self.cx.conversions)
    }

    /// Resolve the parent class and the API class
    pub fn resolve_base(mut self) -> Result<Self, FactoryError> {
        let parent = self.resolve_parent()?;
        let api_class = self.resolve_api_class()?;
        if self.decl.proxy && api_class.is_some() && !self.has_entity(parent.as_deref()) {
            return Err(FactoryError::MissingDelegate(self.decl.name.to_string()));
        }

        self.class.api_base = if self.decl.proxy {
            None
        } else {
            api_class.clone()
        };
        self.class.parent = parent;
        self.class.api_class = api_class;
        self.class.state = ClassState::BaseResolved;
        Ok(self)
    }

    fn resolve_parent(&self) -> Result<Option<Arc<str>>, FactoryError> {
        let types = self.cx.types;
        if let Some(parent) = &self.decl.parent {
            return match types.lookup_by_name(parent) {
                Some(_) => Ok(Some(parent.clone())),
                None => Err(self.unregistered(parent)),
            };
        }
        let Some(parent_entity) = self
            .decl
            .entity_type
            .as_deref()
            .and_then(|entity| self.cx.store.hierarchy.parent_of(entity))
        else {
            return Ok(None);
        };
        types
            .lookup_by_entity(parent_entity)
            .map(|class| Some(class.name.clone()))
            .ok_or_else(|| self.unregistered(&capitalize(parent_entity)))
    }

    fn unregistered(&self, parent: &str) -> FactoryError {
        FactoryError::ParentNotRegistered {
            class: self.decl.name.to_string(),
            parent: parent.to_string(),
        }
    }

    fn resolve_api_class(&self) -> Result<Option<Arc<str>>, FactoryError> {
        let store = self.cx.store;
        if let Some(api_class) = &self.decl.api_class {
            store.get_api_class_info(api_class)?;
            return Ok(Some(api_class.clone()));
        }
        let Some(api_class) = self
            .decl
            .entity_type
            .as_deref()
            .and_then(|entity| store.api_class_for(entity))
        else {
            return Ok(None);
        };
        if store.api_classes.contains_key(api_class) {
            Ok(Some(Arc::from(api_class)))
        } else {
            debug!("{}: no metadata for API class {}", self.decl.name, api_class);
            Ok(None)
        }
    }

    /// A proxy delegate is fetched from an entity instance, so the class or
    /// one of its ancestors must be bound to an entity type
    fn has_entity(&self, parent: Option<&str>) -> bool {
        self.decl.entity_type.is_some()
            || parent.is_some_and(|parent| {
                self.cx
                    .types
                    .chain(parent)
                    .iter()
                    .any(|class| class.entity_type.is_some())
            })
    }

    /// Defined on this class or inherited from a wrapper ancestor
    fn is_defined(&self, name: &str) -> bool {
        self.class.methods.contains_key(name)
            || self
                .class
                .parent
                .as_deref()
                .is_some_and(|parent| self.cx.types.find_method(parent, name).is_some())
    }

    pub fn attach_api_methods(mut self) -> Self {
        let store = self.cx.store;
        let info = self
            .class
            .api_class
            .as_deref()
            .and_then(|name| store.get_api_class_info(name).ok());
        if let Some(info) = info {
            for method in info.methods.keys() {
                self.attach_api_method(info, method);
            }
            self.class
                .enums
                .extend(info.enums.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self.class.state = ClassState::ApiMethodsAttached;
        self
    }

    fn attach_api_method(&mut self, info: &ApiClassInfo, method: &Arc<str>) {
        let overrides = self.cx.overrides;
        let record = overrides.get(&self.class.name, method);
        if record.is_some_and(|o| !o.enabled) {
            debug!("{}.{} disabled by override", self.class.name, method);
            return;
        }
        let display: Arc<str> = match record.and_then(|o| o.use_name.as_ref()) {
            Some(UseName::Mel) => {
                debug!("{}.{} left to the command surface", self.class.name, method);
                return;
            }
            Some(UseName::Explicit(name)) => Arc::from(name.as_str()),
            Some(UseName::Api) | None => method.clone(),
        };
        if self.is_defined(&display) {
            let defined = &display;
            debug!("{}.{} already defined", self.class.name, defined);
            return;
        }

        let overload = match record.and_then(|o| o.overload_index) {
            Some(idx) => Some(idx).filter(|&idx| self.check_overload(info, method, idx)),
            None => (0..info.overloads(method).len()).find(|&idx| self.check_overload(info, method, idx)),
        };
        let Some(overload) = overload else {
            return;
        };

        let spec = MethodSpec {
            class: info,
            method,
            overload,
            display: &display,
            self_type: Some(&info.name),
            proxy: self.class.proxy,
        };
        let undo = self.undo_for(spec);
        if let Some(callable) = synthesizer::api_method(self.cx.store, spec, undo) {
            self.class.methods.insert(display, Rc::new(callable));
        }
    }

    fn check_overload(&self, info: &ApiClassInfo, method: &str, idx: usize) -> bool {
        let Some(overload) = info.overloads(method).get(idx) else {
            debug!("{}.{} has no overload {}", info.name, method, idx);
            return false;
        };
        match self.analyzer().can_wrap_method(overload, Some(&info.name)) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Skipping {}.{}[{}]: {}", info.name, method, idx, reason);
                false
            }
        }
    }

    /// Undo wiring for a setter whose getter inverse can be wrapped and
    /// reads only inputs the setter also takes
    fn undo_for(&self, spec: MethodSpec<'_>) -> Option<UndoBinding> {
        let setter = spec.info()?;
        let inverse = setter.inverse.as_ref().filter(|inverse| !inverse.is_getter)?;
        let analyzer = self.analyzer();
        let (overload, getter_info) = spec
            .class
            .overloads(&inverse.method)
            .iter()
            .enumerate()
            .find(|(_, getter)| {
                analyzer.can_wrap_method(getter, spec.self_type).is_ok()
                    && synthesizer::shared_inputs(setter, getter).is_some()
            })?;
        let getter_spec = MethodSpec {
            method: &inverse.method,
            overload,
            display: &inverse.method,
            ..spec
        };
        let getter = synthesizer::api_method(self.cx.store, getter_spec, None)?;
        synthesizer::undo_binding(setter, Rc::new(getter), getter_info)
    }

    pub fn attach_command_methods(mut self) -> Self {
        let store = self.cx.store;
        if let Some(command) = self.resolve_command() {
            match store.get_command_info(&command) {
                Ok(info) => {
                    for flag in info.flags.values() {
                        self.attach_flag(info, flag);
                    }
                    self.class.command = Some(command);
                }
                Err(err) => debug!("{}: {}", self.class.name, err),
            }
        }
        self.class.state = ClassState::CommandMethodsAttached;
        self
    }

    /// Declared command, then the exception table, then a command named
    /// after the entity type
    fn resolve_command(&self) -> Option<Arc<str>> {
        if let Some(command) = &self.decl.command {
            return Some(command.clone());
        }
        let entity = self.decl.entity_type.as_deref()?;
        if let Some(command) = self.cx.node_commands.get(entity) {
            return Some(Arc::from(command.as_str()));
        }
        self.cx.store.has_command(entity).then(|| Arc::from(entity))
    }

    fn attach_flag(&mut self, info: &CommandInfo, flag: &FlagInfo) {
        if let Err(reason) = self.analyzer().can_wrap_flag(flag) {
            debug!("Skipping {} -{}: {}", info.name, flag.long_name, reason);
            return;
        }
        let overrides = self.cx.overrides;
        let record = overrides.get(&self.class.name, &flag.long_name);
        if record.is_some_and(|o| !o.enabled) {
            debug!("{} -{} disabled by override", self.class.name, flag.long_name);
            return;
        }
        let base = match record.and_then(|o| o.use_name.as_ref()) {
            Some(UseName::Api) => {
                debug!("{} -{} left to the API surface", self.class.name, flag.long_name);
                return;
            }
            Some(UseName::Explicit(name)) => name.clone(),
            Some(UseName::Mel) | None => flag.long_name.to_string(),
        };

        let mut generated = Vec::new();
        if flag.has_mode(Mode::Query) {
            generated.push(synthesizer::flag_query(&info.name, flag, &prefixed("get", &base)));
            if flag.has_mode(Mode::Edit) {
                generated.push(synthesizer::flag_edit(&info.name, flag, &prefixed("set", &base)));
            }
        } else if flag.has_mode(Mode::Edit) {
            generated.push(synthesizer::flag_edit(&info.name, flag, &base));
        } else if flag.has_mode(Mode::Create) {
            generated.push(synthesizer::flag_create(&info.name, flag, &base));
        }

        if let Some(taken) = generated.iter().find(|c| self.is_defined(&c.name)) {
            debug!(
                "Skipping {} -{}: {} already defined",
                info.name, flag.long_name, taken.name
            );
            return;
        }
        for callable in generated {
            self.class.methods.insert(callable.name.clone(), Rc::new(callable));
        }
    }

    pub fn finish(self) -> WrapperClass {
        self.class
    }
}

/// Run every build phase for one declaration
pub fn build_class(cx: FactoryContext<'_>, decl: ClassDecl) -> Result<WrapperClass, FactoryError> {
    let class = ClassBuilder::new(cx, decl)
        .resolve_base()?
        .attach_api_methods()
        .attach_command_methods()
        .finish();
    debug!(
        "Built {} ({} methods, {} enums)",
        class.name,
        class.methods.len(),
        class.enums.len()
    );
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Override;
    use crate::registry::CLASSES_NAMESPACE;
    use hostbind_bridge::{CallableKind, Value};
    use hostbind_meta::{ArgInfo, ArgType, Inverse, MethodInfo, Primitive, TypeRef};

    fn transform_api() -> ApiClassInfo {
        let mut class = ApiClassInfo::new("MFnTransform");
        class.add_enum("Space", &["kInvalid", "kTransform", "kWorld"]);
        let space = || ArgInfo::input("space", TypeRef::enumeration("MFnTransform", "Space"));
        class.add_overload(
            "setTranslation",
            MethodInfo {
                args: vec![ArgInfo::input("vector", TypeRef::named("MVector")), space()],
                inverse: Some(Inverse {
                    method: Arc::from("translation"),
                    is_getter: false,
                }),
                ..Default::default()
            },
        );
        class.add_overload(
            "translation",
            MethodInfo {
                args: vec![space()],
                return_type: Some(TypeRef::named("MVector")),
                inverse: Some(Inverse {
                    method: Arc::from("setTranslation"),
                    is_getter: true,
                }),
                ..Default::default()
            },
        );
        class.add_overload(
            "exotic",
            MethodInfo {
                args: vec![ArgInfo::input("x", TypeRef::named("MSomethingExotic"))],
                ..Default::default()
            },
        );
        class.add_overload(
            "rotateBy",
            MethodInfo {
                deprecated: true,
                ..Default::default()
            },
        );
        class.add_overload(
            "rotateBy",
            MethodInfo {
                args: vec![ArgInfo::input("angle", TypeRef::named("double"))],
                ..Default::default()
            },
        );
        class.add_overload(
            "name",
            MethodInfo {
                return_type: Some(TypeRef::named("MString")),
                ..Default::default()
            },
        );
        class
    }

    fn transform_command() -> CommandInfo {
        let mut info = CommandInfo::new("transform");
        let mut visible = FlagInfo::new("visible", "v", ArgType::Toggle);
        visible.add_mode(Mode::Query);
        visible.add_mode(Mode::Edit);
        let mut freeze = FlagInfo::new("freeze", "f", ArgType::Toggle);
        freeze.add_mode(Mode::Edit);
        let mut shear = FlagInfo::new("shear", "sh", ArgType::Single(Primitive::Float));
        shear.add_mode(Mode::Create);
        let unknown = FlagInfo::new("mystery", "m", ArgType::Single(Primitive::Float));
        let mut translation = FlagInfo::new("translation", "t", ArgType::Single(Primitive::Float));
        translation.add_mode(Mode::Edit);
        for flag in [visible, freeze, shear, unknown, translation] {
            info.add_flag(flag);
        }
        info
    }

    struct Fixture {
        store: MetadataStore,
        conversions: ConversionRegistry,
        overrides: OverrideTable,
        types: TypeHierarchy,
        node_commands: BTreeMap<String, String>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut store = MetadataStore::new("2026");
            store.hierarchy.insert_chain(&["dependNode", "dagNode", "transform"]);
            store.insert_api_class(transform_api());
            store
                .entity_api_classes
                .insert(Arc::from("transform"), Arc::from("MFnTransform"));
            store.insert_command(transform_command());

            let mut types = TypeHierarchy::new();
            let root = ClassDecl::new("DependNode")
                .for_entity_type("dependNode")
                .with_native(Callable::native("name", vec![], "", |_, _, _| {
                    Ok(Value::str("node"))
                }));
            let dag = ClassDecl::new("DagNode")
                .for_entity_type("dagNode")
                .with_parent("DependNode");
            for decl in [root, dag] {
                let mut class = WrapperClass::declared(&decl);
                class.state = ClassState::CommandMethodsAttached;
                assert!(types.register(class, CLASSES_NAMESPACE).is_ok());
            }

            Self {
                store,
                conversions: ConversionRegistry::with_defaults(&["MFn", "M"], &|_: &str| false),
                overrides: OverrideTable::new(),
                types,
                node_commands: BTreeMap::new(),
            }
        }

        fn cx(&self) -> FactoryContext<'_> {
            FactoryContext {
                store: &self.store,
                conversions: &self.conversions,
                overrides: &self.overrides,
                types: &self.types,
                node_commands: &self.node_commands,
            }
        }
    }

    #[test]
    fn test_phases_advance_state() -> Result<(), FactoryError> {
        let fixture = Fixture::new();
        let builder = ClassBuilder::new(fixture.cx(), ClassDecl::automatic("transform"));
        assert_eq!(builder.state(), ClassState::Declared);
        let builder = builder.resolve_base()?;
        assert_eq!(builder.state(), ClassState::BaseResolved);
        let builder = builder.attach_api_methods();
        assert_eq!(builder.state(), ClassState::ApiMethodsAttached);
        let class = builder.attach_command_methods().finish();
        assert_eq!(class.state, ClassState::CommandMethodsAttached);
        assert_eq!(class.state.to_string(), "command-methods-attached");
        Ok(())
    }

    #[test]
    fn test_api_methods_attached() -> Result<(), FactoryError> {
        let fixture = Fixture::new();
        let class = build_class(fixture.cx(), ClassDecl::automatic("transform"))?;
        assert_eq!(class.name.as_ref(), "Transform");
        assert_eq!(class.parent.as_deref(), Some("DagNode"));
        assert_eq!(class.api_class.as_deref(), Some("MFnTransform"));
        assert!(class.api_base.is_none());

        // Unregistered types are skipped, deprecated overloads passed over
        assert!(class.method("exotic").is_none());
        assert!(matches!(
            class.method("rotateBy").map(|m| &m.kind),
            Some(CallableKind::ApiMethod(binding)) if binding.overload == 1
        ));
        // Inherited from DependNode
        assert!(class.method("name").is_none());

        assert!(matches!(
            class.method("setTranslation").map(|m| &m.kind),
            Some(CallableKind::ApiMethod(binding))
                if binding.undo.as_ref().is_some_and(|u| u.getter.name.as_ref() == "translation")
        ));
        assert!(matches!(
            class.method("translation").map(|m| &m.kind),
            Some(CallableKind::ApiMethod(binding)) if binding.undo.is_none()
        ));
        assert_eq!(
            class.enum_values("Space").map(<[Arc<str>]>::len),
            Some(3)
        );
        Ok(())
    }

    #[test]
    fn test_command_methods_attached() -> Result<(), FactoryError> {
        let fixture = Fixture::new();
        let class = build_class(fixture.cx(), ClassDecl::automatic("transform"))?;
        assert_eq!(class.command.as_deref(), Some("transform"));
        assert!(matches!(
            class.method("getVisible").map(|m| &m.kind),
            Some(CallableKind::FlagQuery(_))
        ));
        assert!(matches!(
            class.method("setVisible").map(|m| &m.kind),
            Some(CallableKind::FlagEdit(_))
        ));
        assert!(matches!(
            class.method("freeze").map(|m| &m.kind),
            Some(CallableKind::FlagEdit(_))
        ));
        assert!(matches!(
            class.method("shear").map(|m| &m.kind),
            Some(CallableKind::FlagCreate(_))
        ));
        // No known modes
        assert!(class.method("mystery").is_none());
        assert!(class.method("getMystery").is_none());
        // The API method of the same name wins
        assert!(matches!(
            class.method("translation").map(|m| &m.kind),
            Some(CallableKind::ApiMethod(_))
        ));
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<(), FactoryError> {
        let mut fixture = Fixture::new();
        fixture
            .overrides
            .insert(Override::new("Transform", "rotateBy").disabled());
        fixture.overrides.insert(
            Override::new("Transform", "setTranslation")
                .with_use_name(UseName::Explicit("moveTo".to_string())),
        );
        fixture
            .overrides
            .insert(Override::new("Transform", "translation").with_use_name(UseName::Mel));
        fixture
            .overrides
            .insert(Override::new("Transform", "visible").with_use_name(UseName::Explicit("shown".to_string())));
        fixture
            .overrides
            .insert(Override::new("Transform", "freeze").with_use_name(UseName::Api));

        let class = build_class(fixture.cx(), ClassDecl::automatic("transform"))?;
        assert!(class.method("rotateBy").is_none());
        assert!(class.method("setTranslation").is_none());
        assert!(class.method("moveTo").is_some());
        assert!(matches!(
            class.method("translation").map(|m| &m.kind),
            Some(CallableKind::FlagEdit(_))
        ));
        assert!(class.method("getShown").is_some());
        assert!(class.method("getVisible").is_none());
        assert!(class.method("freeze").is_none());
        Ok(())
    }

    #[test]
    fn test_selected_overload() -> Result<(), FactoryError> {
        let mut fixture = Fixture::new();
        fixture
            .overrides
            .insert(Override::new("Transform", "rotateBy").with_overload(0));
        let class = build_class(fixture.cx(), ClassDecl::automatic("transform"))?;
        // Overload 0 is deprecated, so nothing is wrapped
        assert!(class.method("rotateBy").is_none());
        Ok(())
    }

    #[test]
    fn test_non_proxy_inherits_api_class() -> Result<(), FactoryError> {
        let fixture = Fixture::new();
        let decl = ClassDecl::new("FnTransform").wrapping("MFnTransform");
        let class = build_class(fixture.cx(), decl)?;
        assert_eq!(class.api_base.as_deref(), Some("MFnTransform"));
        assert!(class.parent.is_none());
        assert!(matches!(
            class.method("name").map(|m| &m.kind),
            Some(CallableKind::ApiMethod(binding)) if !binding.proxy
        ));
        Ok(())
    }

    #[test]
    fn test_base_resolution_errors() {
        let fixture = Fixture::new();
        let orphan = ClassDecl::new("Joint").with_parent("Missing");
        assert!(matches!(
            build_class(fixture.cx(), orphan),
            Err(FactoryError::ParentNotRegistered { .. })
        ));

        let no_delegate = ClassDecl::new("Floating").proxying("MFnTransform");
        assert!(matches!(
            build_class(fixture.cx(), no_delegate),
            Err(FactoryError::MissingDelegate(_))
        ));

        let inherited = ClassDecl::new("Floating")
            .with_parent("DagNode")
            .proxying("MFnTransform");
        assert!(build_class(fixture.cx(), inherited).is_ok());

        let unknown_api = ClassDecl::new("Mesh").wrapping("MFnMesh");
        assert!(matches!(
            build_class(fixture.cx(), unknown_api),
            Err(FactoryError::Meta(_))
        ));
    }

    #[test]
    fn test_exception_table_names_the_command() -> Result<(), FactoryError> {
        let mut fixture = Fixture::new();
        fixture.store.hierarchy.insert("xform", Some("dagNode"));
        fixture
            .node_commands
            .insert("xform".to_string(), "transform".to_string());
        let class = build_class(fixture.cx(), ClassDecl::automatic("xform"))?;
        assert_eq!(class.command.as_deref(), Some("transform"));
        assert!(class.method("getVisible").is_some());
        Ok(())
    }
}
