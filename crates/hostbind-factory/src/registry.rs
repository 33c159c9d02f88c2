//! Type Hierarchy Registry
//!
//! Owns every registered [`WrapperClass`] together with the namespaces that
//! expose classes and command functions. Parents must be registered before
//! their children; removal takes a class out of its namespace as well.

use crate::class_factory::{ClassState, WrapperClass};
use crate::errors::FactoryError;
use ahash::AHashMap;
use hostbind_bridge::Callable;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Namespace wrapper classes are exposed in unless the caller names another
pub const CLASSES_NAMESPACE: &str = "nodes";

/// Namespace plain command functions are exposed in
pub const COMMANDS_NAMESPACE: &str = "commands";

#[derive(Debug, Default)]
pub struct Namespace {
    classes: BTreeSet<Arc<str>>,
    functions: BTreeMap<Arc<str>, Rc<Callable>>,
}

impl Namespace {
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(AsRef::as_ref)
    }

    pub fn contains_class(&self, name: &str) -> bool {
        self.classes.contains(name)
    }

    pub fn function(&self, name: &str) -> Option<&Rc<Callable>> {
        self.functions.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(AsRef::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TypeHierarchy {
    classes: AHashMap<Arc<str>, Rc<WrapperClass>>,
    /// entity type -> class name
    by_entity: AHashMap<Arc<str>, Arc<str>>,
    /// API class -> first class registered for it
    by_api: AHashMap<Arc<str>, Arc<str>>,
    /// class name -> namespace exposing it
    homes: AHashMap<Arc<str>, Arc<str>>,
    namespaces: BTreeMap<Arc<str>, Namespace>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Register a finished class and expose it in `namespace`
    pub fn register(
        &mut self,
        mut class: WrapperClass,
        namespace: &str,
    ) -> Result<Rc<WrapperClass>, FactoryError> {
        if self.classes.contains_key(&class.name) {
            return Err(FactoryError::DuplicateClass(class.name.to_string()));
        }
        if let Some(parent) = &class.parent {
            if !self.classes.contains_key(parent) {
                return Err(FactoryError::ParentNotRegistered {
                    class: class.name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }

        class.state = ClassState::Registered;
        let name = class.name.clone();
        if let Some(entity_type) = &class.entity_type {
            self.by_entity
                .entry(entity_type.clone())
                .or_insert_with(|| name.clone());
        }
        if let Some(api_class) = &class.api_class {
            self.by_api
                .entry(api_class.clone())
                .or_insert_with(|| name.clone());
        }
        let namespace: Arc<str> = Arc::from(namespace);
        self.namespaces
            .entry(namespace.clone())
            .or_default()
            .classes
            .insert(name.clone());
        self.homes.insert(name.clone(), namespace);

        debug!(
            "Registered class {} (parent {})",
            name,
            class.parent.as_deref().unwrap_or("-")
        );
        let class = Rc::new(class);
        self.classes.insert(name, class.clone());
        Ok(class)
    }

    /// Remove a class from the registry and from the namespace exposing it.
    /// Registered children keep a dangling parent name.
    pub fn remove(&mut self, name: &str) -> Option<Rc<WrapperClass>> {
        let class = self.classes.remove(name)?;
        self.by_entity.retain(|_, class_name| class_name.as_ref() != name);
        self.by_api.retain(|_, class_name| class_name.as_ref() != name);
        if let Some(home) = self.homes.remove(name) {
            if let Some(namespace) = self.namespaces.get_mut(&home) {
                namespace.classes.remove(name);
            }
        }
        debug!("Removed class {}", name);
        Some(class)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&Rc<WrapperClass>> {
        self.classes.get(name)
    }

    pub fn lookup_by_entity(&self, entity_type: &str) -> Option<&Rc<WrapperClass>> {
        self.by_entity
            .get(entity_type)
            .and_then(|name| self.classes.get(name))
    }

    pub fn lookup_by_api_class(&self, api_class: &str) -> Option<&Rc<WrapperClass>> {
        self.by_api
            .get(api_class)
            .and_then(|name| self.classes.get(name))
    }

    /// Entity type a class is bound to
    pub fn underlying_type(&self, name: &str) -> Option<&str> {
        self.classes.get(name)?.entity_type.as_deref()
    }

    pub fn parent_of(&self, name: &str) -> Option<&Rc<WrapperClass>> {
        let parent = self.classes.get(name)?.parent.as_ref()?;
        self.classes.get(parent)
    }

    /// `name` followed by its ancestors, nearest first
    pub fn chain(&self, name: &str) -> Vec<Rc<WrapperClass>> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(name);
        while let Some(class) = current {
            // Bounded so a dangling or cyclic parent link cannot loop
            if chain.len() > self.classes.len() {
                break;
            }
            chain.push(class.clone());
            current = class.parent.as_ref().and_then(|p| self.classes.get(p));
        }
        chain
    }

    /// Resolve a method through the class and its ancestors
    pub fn find_method(&self, class: &str, method: &str) -> Option<Rc<Callable>> {
        self.chain(class)
            .iter()
            .find_map(|c| c.method(method).cloned())
    }

    pub fn class_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn children_of(&self, name: &str) -> Vec<Arc<str>> {
        let mut children: Vec<Arc<str>> = self
            .classes
            .values()
            .filter(|c| c.parent.as_deref() == Some(name))
            .map(|c| c.name.clone())
            .collect();
        children.sort();
        children
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    pub fn add_function(&mut self, namespace: &str, callable: Callable) -> Rc<Callable> {
        let callable = Rc::new(callable);
        self.namespaces
            .entry(Arc::from(namespace))
            .or_default()
            .functions
            .insert(callable.name.clone(), callable.clone());
        callable
    }

    pub fn remove_function(&mut self, namespace: &str, name: &str) -> Option<Rc<Callable>> {
        self.namespaces.get_mut(namespace)?.functions.remove(name)
    }

    pub fn function(&self, namespace: &str, name: &str) -> Option<&Rc<Callable>> {
        self.namespaces.get(namespace)?.function(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_factory::ClassDecl;
    use hostbind_bridge::Value;

    fn class(name: &str, parent: Option<&str>, entity_type: &str) -> WrapperClass {
        let mut decl = ClassDecl::new(name).for_entity_type(entity_type);
        if let Some(parent) = parent {
            decl = decl.with_parent(parent);
        }
        WrapperClass::declared(&decl)
    }

    fn hierarchy() -> TypeHierarchy {
        let mut types = TypeHierarchy::new();
        let mut root = class("DependNode", None, "dependNode");
        root.methods.insert(
            Arc::from("name"),
            Rc::new(Callable::native("name", vec![], "", |_, _, _| Ok(Value::str("n")))),
        );
        assert!(types.register(root, CLASSES_NAMESPACE).is_ok());
        assert!(types
            .register(class("DagNode", Some("DependNode"), "dagNode"), CLASSES_NAMESPACE)
            .is_ok());
        assert!(types
            .register(class("Transform", Some("DagNode"), "transform"), CLASSES_NAMESPACE)
            .is_ok());
        types
    }

    #[test]
    fn test_register_requires_parent() {
        let mut types = hierarchy();
        let orphan = class("Joint", Some("Missing"), "joint");
        assert!(matches!(
            types.register(orphan, CLASSES_NAMESPACE),
            Err(FactoryError::ParentNotRegistered { ref parent, .. }) if parent == "Missing"
        ));
        let duplicate = class("Transform", Some("DagNode"), "transform");
        assert!(matches!(
            types.register(duplicate, CLASSES_NAMESPACE),
            Err(FactoryError::DuplicateClass(_))
        ));
        assert_eq!(types.len(), 3);
    }

    #[test]
    fn test_lookups_and_chain() {
        let types = hierarchy();
        assert_eq!(types.underlying_type("Transform"), Some("transform"));
        assert_eq!(
            types.lookup_by_entity("dagNode").map(|c| c.name.clone()),
            Some(Arc::from("DagNode"))
        );
        assert_eq!(
            types.parent_of("Transform").map(|c| c.name.clone()),
            Some(Arc::from("DagNode"))
        );
        assert!(types.parent_of("DependNode").is_none());
        assert!(types
            .lookup_by_name("Transform")
            .is_some_and(|c| c.state == ClassState::Registered));

        let chain: Vec<Arc<str>> = types.chain("Transform").iter().map(|c| c.name.clone()).collect();
        assert_eq!(chain.len(), 3);
        assert!(types.find_method("Transform", "name").is_some());
        assert!(types.find_method("Transform", "missing").is_none());
        assert_eq!(types.children_of("DependNode"), vec![Arc::from("DagNode")]);
    }

    #[test]
    fn test_remove_clears_namespace() {
        let mut types = hierarchy();
        assert!(types
            .namespace(CLASSES_NAMESPACE)
            .is_some_and(|ns| ns.contains_class("Transform")));

        assert!(types.remove("Transform").is_some());
        assert!(types.lookup_by_name("Transform").is_none());
        assert!(types.lookup_by_entity("transform").is_none());
        assert!(types
            .namespace(CLASSES_NAMESPACE)
            .is_some_and(|ns| !ns.contains_class("Transform")));
        assert!(types.remove("Transform").is_none());
    }

    #[test]
    fn test_functions() {
        let mut types = TypeHierarchy::new();
        let f = Callable::native("polyCube", vec![], "", |_, _, _| Ok(Value::Null));
        types.add_function(COMMANDS_NAMESPACE, f);
        assert!(types.function(COMMANDS_NAMESPACE, "polyCube").is_some());
        assert!(types.remove_function(COMMANDS_NAMESPACE, "polyCube").is_some());
        assert!(types
            .namespace(COMMANDS_NAMESPACE)
            .is_some_and(Namespace::is_empty));
    }
}
