//! Metadata model for the two host surfaces
//!
//! This module provides:
//! - `CommandInfo`/`FlagInfo` for the flat command interface
//! - `ApiClassInfo`/`MethodInfo` for the object-oriented API
//! - Arc<str> names and SmallVec for the small per-flag collections
//! - Pre-computed content hashes for fast delta comparison

use crate::value::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// =============================================================================
// PRIMITIVES & MODES
// =============================================================================

/// Primitive argument type of a command flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Bool,
    Int,
    Float,
    Length,
    Angle,
    Time,
    Str,
    Script,
    Node,
    Other(Arc<str>),
}

impl Primitive {
    /// Map one type token of the authoritative synopsis to a primitive
    pub fn from_token(token: &str) -> Self {
        match token {
            "string" => Primitive::Str,
            "length" => Primitive::Length,
            "float" => Primitive::Float,
            "angle" => Primitive::Angle,
            "time" => Primitive::Time,
            "int" | "unsignedint" | "int64" => Primitive::Int,
            "on|off" => Primitive::Bool,
            "script" => Primitive::Script,
            "name" => Primitive::Node,
            other => Primitive::Other(Arc::from(other)),
        }
    }

    /// Name under which the conversion registry knows this primitive
    pub fn conversion_name(&self) -> &str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float | Primitive::Length | Primitive::Angle | Primitive::Time => "float",
            Primitive::Str | Primitive::Script => "str",
            Primitive::Node => "node",
            Primitive::Other(name) => name,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Primitive::Int | Primitive::Float | Primitive::Length | Primitive::Angle | Primitive::Time
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool => write!(f, "bool"),
            Primitive::Int => write!(f, "int"),
            Primitive::Float => write!(f, "float"),
            Primitive::Length => write!(f, "length"),
            Primitive::Angle => write!(f, "angle"),
            Primitive::Time => write!(f, "time"),
            Primitive::Str => write!(f, "string"),
            Primitive::Script => write!(f, "script"),
            Primitive::Node => write!(f, "name"),
            Primitive::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Argument shape of a flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    /// No argument: the flag is a boolean toggle
    Toggle,
    Single(Primitive),
    Multi(SmallVec<[Primitive; 4]>),
}

impl ArgType {
    pub fn from_tokens(tokens: &[Primitive]) -> Self {
        match tokens {
            [] => ArgType::Toggle,
            [single] => ArgType::Single(single.clone()),
            many => ArgType::Multi(many.iter().cloned().collect()),
        }
    }

    pub fn arg_count(&self) -> usize {
        match self {
            ArgType::Toggle => 0,
            ArgType::Single(_) => 1,
            ArgType::Multi(items) => items.len(),
        }
    }

    pub fn primitives(&self) -> SmallVec<[Primitive; 4]> {
        match self {
            ArgType::Toggle => SmallVec::new(),
            ArgType::Single(p) => smallvec::smallvec![p.clone()],
            ArgType::Multi(items) => items.clone(),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Toggle => write!(f, "bool (toggle)"),
            ArgType::Single(p) => write!(f, "{}", p),
            ArgType::Multi(items) => {
                let names: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Create,
    Query,
    Edit,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Create => write!(f, "create"),
            Mode::Query => write!(f, "query"),
            Mode::Edit => write!(f, "edit"),
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagInfo {
    pub long_name: Arc<str>,
    pub short_name: Arc<str>,
    pub arg_type: ArgType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub docstring: String,
    #[serde(default)]
    pub modes: SmallVec<[Mode; 3]>,
    #[serde(default)]
    pub multi_use: bool,
    #[serde(default)]
    pub result_needs_unpacking: bool,
    #[serde(default)]
    pub result_needs_casting: bool,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub secondary_flags: SmallVec<[Arc<str>; 2]>,
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub modifies: SmallVec<[Arc<str>; 2]>,
    /// Set when probing found the host rejects the flag outright
    #[serde(default)]
    pub invalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
}

impl FlagInfo {
    pub fn new(long_name: &str, short_name: &str, arg_type: ArgType) -> Self {
        Self {
            long_name: Arc::from(long_name),
            short_name: Arc::from(short_name),
            arg_type,
            docstring: String::new(),
            modes: SmallVec::new(),
            multi_use: false,
            result_needs_unpacking: false,
            result_needs_casting: false,
            secondary_flags: SmallVec::new(),
            modifies: SmallVec::new(),
            invalid: false,
            doc_type: None,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.arg_type.arg_count()
    }

    pub fn has_mode(&self, mode: Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn add_mode(&mut self, mode: Mode) {
        if !self.has_mode(mode) {
            self.modes.push(mode);
            self.modes.sort();
        }
    }

    pub fn has_documented_modes(&self) -> bool {
        !self.modes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: Arc<str>,
    #[serde(default)]
    pub flags: BTreeMap<Arc<str>, FlagInfo>,
    /// short name -> long name
    #[serde(default)]
    pub short_flags: BTreeMap<Arc<str>, Arc<str>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub example: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Arc<str>>,
    /// original reserved-word name -> name it was renamed to
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub removed_flags: BTreeMap<Arc<str>, Arc<str>>,

    /// Runtime only - content hash for delta merges
    #[serde(skip)]
    pub content_hash: u64,
}

impl CommandInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            flags: BTreeMap::new(),
            short_flags: BTreeMap::new(),
            description: String::new(),
            example: String::new(),
            category: None,
            removed_flags: BTreeMap::new(),
            content_hash: 0,
        }
    }

    pub fn add_flag(&mut self, flag: FlagInfo) {
        if !flag.short_name.is_empty() {
            self.short_flags
                .insert(flag.short_name.clone(), flag.long_name.clone());
        }
        self.flags.insert(flag.long_name.clone(), flag);
    }

    /// Resolve a flag by long or short name
    pub fn flag(&self, name: &str) -> Option<&FlagInfo> {
        self.flags.get(name).or_else(|| {
            self.short_flags
                .get(name)
                .and_then(|long| self.flags.get(long))
        })
    }

    pub fn flag_mut(&mut self, name: &str) -> Option<&mut FlagInfo> {
        let long = if self.flags.contains_key(name) {
            Arc::from(name)
        } else {
            self.short_flags.get(name)?.clone()
        };
        self.flags.get_mut(&long)
    }

    /// Long name for a long or short flag name
    pub fn long_name_of(&self, name: &str) -> Option<Arc<str>> {
        self.flag(name).map(|f| f.long_name.clone())
    }

    /// Rebuild the short-name index after deserialization
    pub fn rebuild_short_index(&mut self) {
        self.short_flags.clear();
        for flag in self.flags.values() {
            if !flag.short_name.is_empty() {
                self.short_flags
                    .insert(flag.short_name.clone(), flag.long_name.clone());
            }
        }
    }

    /// Pre-compute hash for fast equality check
    pub fn compute_hash(&mut self) {
        let mut hasher = ahash::AHasher::default();
        self.name.hash(&mut hasher);
        self.description.hash(&mut hasher);
        self.category.hash(&mut hasher);
        for flag in self.flags.values() {
            flag.long_name.hash(&mut hasher);
            flag.short_name.hash(&mut hasher);
            flag.arg_type.hash(&mut hasher);
            flag.modes.hash(&mut hasher);
            flag.docstring.hash(&mut hasher);
            flag.invalid.hash(&mut hasher);
        }
        self.content_hash = hasher.finish();
    }
}

// =============================================================================
// API CLASSES
// =============================================================================

/// Argument or return type of an API method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Named(Arc<str>),
    Enum { class: Arc<str>, name: Arc<str> },
}

impl TypeRef {
    pub fn named(name: &str) -> Self {
        TypeRef::Named(Arc::from(name))
    }

    pub fn enumeration(class: &str, name: &str) -> Self {
        TypeRef::Enum {
            class: Arc::from(class),
            name: Arc::from(name),
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Enum { .. } => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeRef::Enum { .. })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name),
            TypeRef::Enum { class, name } => write!(f, "{}.{}", class, name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Linear,
    Angular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgInfo {
    pub name: Arc<str>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitType>,
}

impl ArgInfo {
    pub fn input(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            direction: Direction::In,
            unit: None,
        }
    }

    pub fn output(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            direction: Direction::Out,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: UnitType) -> Self {
        self.unit = Some(unit);
        self
    }
}

/// Paired getter/setter method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inverse {
    pub method: Arc<str>,
    /// Whether the method carrying this pairing is itself the getter
    pub is_getter: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    #[serde(default)]
    pub args: Vec<ArgInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_unit: Option<UnitType>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<Arc<str>, Value>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub doc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<Inverse>,
}

impl MethodInfo {
    pub fn in_args(&self) -> Vec<usize> {
        self.indices(Direction::In)
    }

    pub fn out_args(&self) -> Vec<usize> {
        self.indices(Direction::Out)
    }

    fn indices(&self, direction: Direction) -> Vec<usize> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, arg)| arg.direction == direction)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn in_arg_names(&self) -> Vec<Arc<str>> {
        self.args
            .iter()
            .filter(|arg| arg.direction == Direction::In)
            .map(|arg| arg.name.clone())
            .collect()
    }

    pub fn arg(&self, name: &str) -> Option<&ArgInfo> {
        self.args.iter().find(|arg| arg.name.as_ref() == name)
    }

    /// Setter half of a getter/setter pair
    pub fn is_setter(&self) -> bool {
        self.inverse.as_ref().is_some_and(|inv| !inv.is_getter)
    }

    /// Every type this overload mentions: arguments first, then the return type
    pub fn referenced_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.args
            .iter()
            .map(|arg| &arg.ty)
            .chain(self.return_type.iter())
    }
}

/// Enumeration declared on an API class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnum {
    pub values: Vec<Arc<str>>,
    /// Friendlier names, parallel to `values`
    #[serde(default)]
    pub display: Vec<Arc<str>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub docs: BTreeMap<Arc<str>, String>,
}

impl ApiEnum {
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let values: Vec<Arc<str>> = values.iter().map(|v| Arc::from(v.as_ref())).collect();
        let display = values.iter().map(|v| display_name(v)).collect();
        Self {
            values,
            display,
            docs: BTreeMap::new(),
        }
    }

    /// Index of a value given by internal name, display name, or position
    pub fn resolve(&self, value: &Value) -> Option<usize> {
        match value {
            Value::Str(name) => self
                .values
                .iter()
                .position(|v| v.as_ref() == name.as_ref())
                .or_else(|| {
                    self.display
                        .iter()
                        .position(|v| v.as_ref() == name.as_ref())
                }),
            Value::Int(idx) => usize::try_from(*idx).ok().filter(|idx| *idx < self.values.len()),
            _ => None,
        }
    }

    /// Display name for an internal value name
    pub fn display_of(&self, internal: &str) -> Option<Arc<str>> {
        let idx = self.values.iter().position(|v| v.as_ref() == internal)?;
        self.display
            .get(idx)
            .cloned()
            .or_else(|| Some(display_name(internal)))
    }
}

/// `kWorld` -> `world`, `kPostTransform` -> `postTransform`
fn display_name(internal: &str) -> Arc<str> {
    let mut chars = internal.chars();
    let stripped = match (chars.next(), chars.clone().next()) {
        (Some('k'), Some(c)) if c.is_ascii_uppercase() => &internal[1..],
        _ => internal,
    };
    let mut out = String::with_capacity(stripped.len());
    let mut rest = stripped.chars();
    if let Some(first) = rest.next() {
        out.extend(first.to_lowercase());
        out.extend(rest);
    }
    Arc::from(out)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiClassInfo {
    pub name: Arc<str>,
    #[serde(default)]
    pub methods: BTreeMap<Arc<str>, Vec<MethodInfo>>,
    #[serde(default)]
    pub enums: BTreeMap<Arc<str>, ApiEnum>,
}

impl ApiClassInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            methods: BTreeMap::new(),
            enums: BTreeMap::new(),
        }
    }

    /// Append one overload of a method
    pub fn add_overload(&mut self, method: &str, info: MethodInfo) {
        self.methods
            .entry(Arc::from(method))
            .or_default()
            .push(info);
    }

    pub fn overloads(&self, method: &str) -> &[MethodInfo] {
        self.methods
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn add_enum<S: AsRef<str>>(&mut self, name: &str, values: &[S]) {
        self.enums
            .insert(Arc::from(name), ApiEnum::from_values(values));
    }

    pub fn enumeration(&self, name: &str) -> Option<&ApiEnum> {
        self.enums.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_lookup_by_short_name() {
        let mut cmd = CommandInfo::new("sphere");
        cmd.add_flag(FlagInfo::new("radius", "r", ArgType::Single(Primitive::Length)));
        assert!(cmd.flag("r").is_some_and(|f| f.long_name.as_ref() == "radius"));
        assert!(cmd.flag("radius").is_some());
        assert!(cmd.flag("nope").is_none());
        assert!(cmd.flag_mut("r").is_some());
    }

    #[test]
    fn test_short_index_rebuilt_after_deserialize() {
        let mut cmd = CommandInfo::new("sphere");
        cmd.add_flag(FlagInfo::new("radius", "r", ArgType::Single(Primitive::Length)));
        let json = serde_json::to_string(&cmd).unwrap_or_default();
        let Ok(mut loaded) = serde_json::from_str::<CommandInfo>(&json) else {
            return;
        };
        loaded.short_flags.clear();
        loaded.rebuild_short_index();
        assert_eq!(loaded.long_name_of("r").as_deref(), Some("radius"));
    }

    #[test]
    fn test_content_hash_changes_with_modes() {
        let mut a = CommandInfo::new("foo");
        a.add_flag(FlagInfo::new("bar", "b", ArgType::Single(Primitive::Float)));
        let mut b = a.clone();
        a.compute_hash();
        b.compute_hash();
        assert_eq!(a.content_hash, b.content_hash);

        if let Some(flag) = b.flag_mut("bar") {
            flag.add_mode(Mode::Query);
        }
        b.compute_hash();
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_arg_type_from_tokens() {
        assert_eq!(ArgType::from_tokens(&[]), ArgType::Toggle);
        assert_eq!(ArgType::from_tokens(&[Primitive::Int]).arg_count(), 1);
        let multi = ArgType::from_tokens(&[Primitive::Float, Primitive::Float, Primitive::Float]);
        assert_eq!(multi.arg_count(), 3);
        assert_eq!(multi.to_string(), "[float, float, float]");
    }

    #[test]
    fn test_enum_display_names_and_resolve() {
        let space = ApiEnum::from_values(&["kInvalid", "kTransform", "kWorld"]);
        assert_eq!(space.display[2].as_ref(), "world");
        assert_eq!(space.resolve(&Value::str("world")), Some(2));
        assert_eq!(space.resolve(&Value::str("kTransform")), Some(1));
        assert_eq!(space.resolve(&Value::Int(0)), Some(0));
        assert_eq!(space.resolve(&Value::Int(3)), None);
        assert_eq!(space.resolve(&Value::str("object")), None);
    }

    #[test]
    fn test_method_arg_indices() {
        let method = MethodInfo {
            args: vec![
                ArgInfo::input("space", TypeRef::enumeration("MFnTransform", "Space")),
                ArgInfo::output("result", TypeRef::named("MVector")),
            ],
            ..Default::default()
        };
        assert_eq!(method.in_args(), vec![0]);
        assert_eq!(method.out_args(), vec![1]);
        assert_eq!(method.referenced_types().count(), 2);
    }

    #[test]
    fn test_type_ref_json_shape() {
        let json = serde_json::to_string(&vec![
            TypeRef::named("MVector"),
            TypeRef::enumeration("MSpace", "Space"),
        ])
        .unwrap_or_default();
        assert_eq!(json, r#"["MVector",{"class":"MSpace","name":"Space"}]"#);
    }
}
