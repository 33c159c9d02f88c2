use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Single-inheritance tree of host entity types, stored as child -> parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityHierarchy {
    #[serde(default)]
    parents: BTreeMap<Arc<str>, Option<Arc<str>>>,
}

impl EntityHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.parents.contains_key(entity_type)
    }

    /// Record an entity type and its parent; the parent is added as a root if unseen
    pub fn insert(&mut self, entity_type: &str, parent: Option<&str>) {
        if let Some(parent) = parent {
            if !self.parents.contains_key(parent) {
                self.parents.insert(Arc::from(parent), None);
            }
        }
        self.parents
            .insert(Arc::from(entity_type), parent.map(Arc::from));
    }

    /// Record a whole inheritance chain, root first
    pub fn insert_chain<S: AsRef<str>>(&mut self, chain: &[S]) {
        let mut parent: Option<&str> = None;
        for entity_type in chain {
            let entity_type = entity_type.as_ref();
            let known_parent = self.parent_of(entity_type);
            if !self.contains(entity_type) || (known_parent.is_none() && parent.is_some()) {
                self.insert(entity_type, parent);
            }
            parent = Some(entity_type);
        }
    }

    pub fn remove(&mut self, entity_type: &str) -> bool {
        self.parents.remove(entity_type).is_some()
    }

    pub fn parent_of(&self, entity_type: &str) -> Option<&str> {
        self.parents.get(entity_type)?.as_deref()
    }

    /// Inheritance chain from the root down to `entity_type` inclusive
    pub fn chain(&self, entity_type: &str) -> Vec<Arc<str>> {
        let mut chain = Vec::new();
        let Some((key, _)) = self.parents.get_key_value(entity_type) else {
            return chain;
        };
        let mut current = Some(key.clone());
        // Bounded by the number of known types so a corrupted cache cannot loop
        while let Some(name) = current {
            if chain.len() > self.parents.len() {
                break;
            }
            current = self.parents.get(&name).cloned().flatten();
            chain.push(name);
        }
        chain.reverse();
        chain
    }

    pub fn depth(&self, entity_type: &str) -> usize {
        self.chain(entity_type).len().saturating_sub(1)
    }

    pub fn max_depth(&self) -> usize {
        self.parents
            .keys()
            .map(|t| self.depth(t))
            .max()
            .unwrap_or(0)
    }

    pub fn children_of(&self, entity_type: &str) -> Vec<Arc<str>> {
        self.parents
            .iter()
            .filter(|(_, parent)| parent.as_deref() == Some(entity_type))
            .map(|(child, _)| child.clone())
            .collect()
    }

    /// All types ordered so every parent precedes its children
    pub fn ancestor_first(&self) -> Vec<Arc<str>> {
        let mut types: Vec<(usize, Arc<str>)> = self
            .parents
            .keys()
            .map(|t| (self.depth(t), t.clone()))
            .collect();
        types.sort();
        types.into_iter().map(|(_, t)| t).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, Option<&Arc<str>>)> {
        self.parents.iter().map(|(k, v)| (k, v.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntityHierarchy {
        let mut h = EntityHierarchy::new();
        h.insert_chain(&["node", "entity", "dagNode", "transform", "joint"]);
        h.insert_chain(&["node", "entity", "dagNode", "shape", "mesh"]);
        h
    }

    #[test]
    fn test_chain_root_first() {
        let h = sample();
        let chain: Vec<String> = h.chain("mesh").iter().map(|s| s.to_string()).collect();
        assert_eq!(chain, vec!["node", "entity", "dagNode", "shape", "mesh"]);
        assert_eq!(h.parent_of("joint"), Some("transform"));
        assert_eq!(h.parent_of("node"), None);
        assert_eq!(h.max_depth(), 4);
    }

    #[test]
    fn test_ancestor_first_order() {
        let h = sample();
        let order = h.ancestor_first();
        let pos = |name: &str| order.iter().position(|t| t.as_ref() == name);
        assert!(pos("node") < pos("dagNode"));
        assert!(pos("transform") < pos("joint"));
        assert!(pos("shape") < pos("mesh"));
    }

    #[test]
    fn test_cycle_is_bounded() {
        let mut h = EntityHierarchy::new();
        h.insert("a", Some("b"));
        h.insert("b", Some("a"));
        assert!(h.chain("a").len() <= 3);
    }

    #[test]
    fn test_children_and_remove() {
        let mut h = sample();
        let children = h.children_of("dagNode");
        assert_eq!(children.len(), 2);
        assert!(h.remove("mesh"));
        assert!(!h.contains("mesh"));
    }
}
