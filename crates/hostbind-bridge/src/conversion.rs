//! Type Conversion Registry
//!
//! Maps API type names to a wrapper shape and the casts that move values
//! between the caller's representation and the host's. Every registered type
//! also supports by-reference use: `ref_init` allocates a zero placeholder of
//! the wrapper's shape and `ref_cast` extracts the value the host wrote into it.

use crate::errors::CastError;
use crate::Value;
use ahash::AHashMap;
use hostbind_meta::naming::strip_api_prefix;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Primitive names that get automatic 2/3/4-element variants
const PRIMITIVES: &[(&str, WrapperType)] = &[
    ("bool", WrapperType::Bool),
    ("int", WrapperType::Int),
    ("short", WrapperType::Int),
    ("long", WrapperType::Int),
    ("uint", WrapperType::Int),
    ("float", WrapperType::Float),
    ("double", WrapperType::Float),
];

/// Host array classes holding primitives, keyed by their item type
const PRIMITIVE_ARRAYS: &[(&str, &str)] = &[
    ("MIntArray", "int"),
    ("MUintArray", "uint"),
    ("MFloatArray", "float"),
    ("MDoubleArray", "double"),
];

/// Shape of a value on the wrapper side
#[derive(Debug, Clone, PartialEq)]
pub enum WrapperType {
    Bool,
    Int,
    Float,
    Str,
    /// Fixed-length float tuple
    Vector(usize),
    /// Fixed-length tuple of another shape
    Tuple(Box<WrapperType>, usize),
    Matrix(usize, usize),
    Node,
    /// Opaque host object of the named API type
    Object(Arc<str>),
    List(Box<WrapperType>),
}

impl WrapperType {
    /// Construct this shape from a value
    pub fn coerce(&self, value: &Value) -> Result<Value, CastError> {
        match self {
            WrapperType::Bool => value
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| CastError::mismatch("bool", value)),
            WrapperType::Int => value
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| CastError::mismatch("int", value)),
            WrapperType::Float => value
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| CastError::mismatch("float", value)),
            WrapperType::Str => match value {
                Value::Str(_) => Ok(value.clone()),
                other => Err(CastError::mismatch("str", other)),
            },
            WrapperType::Vector(len) => fixed(&WrapperType::Float, *len, value),
            WrapperType::Tuple(item, len) => fixed(item, *len, value),
            WrapperType::Matrix(rows, cols) => matrix(*rows, *cols, value),
            WrapperType::Node => match value {
                Value::Str(_) | Value::Object(_) => Ok(value.clone()),
                other => Err(CastError::mismatch("node", other)),
            },
            WrapperType::Object(name) => match value {
                Value::Object(_) | Value::Str(_) | Value::Null => Ok(value.clone()),
                other => Err(CastError::mismatch(name.as_ref(), other)),
            },
            WrapperType::List(item) => value
                .as_list()
                .ok_or_else(|| CastError::mismatch("list", value))?
                .iter()
                .map(|v| item.coerce(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    /// Element count of fixed-size tuple shapes
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            WrapperType::Vector(len) | WrapperType::Tuple(_, len) => Some(*len),
            _ => None,
        }
    }

    /// Placeholder for a by-reference argument of this shape
    pub fn zero(&self) -> Value {
        match self {
            WrapperType::Bool => Value::Bool(false),
            WrapperType::Int => Value::Int(0),
            WrapperType::Float => Value::Float(0.0),
            WrapperType::Str => Value::str(""),
            WrapperType::Vector(len) => Value::floats(&vec![0.0; *len]),
            WrapperType::Tuple(item, len) => Value::List(vec![item.zero(); *len]),
            WrapperType::Matrix(rows, cols) => {
                Value::List(vec![Value::floats(&vec![0.0; *cols]); *rows])
            }
            WrapperType::Node | WrapperType::Object(_) => Value::Null,
            WrapperType::List(_) => Value::List(Vec::new()),
        }
    }
}

fn fixed(item: &WrapperType, len: usize, value: &Value) -> Result<Value, CastError> {
    let items = value
        .as_list()
        .ok_or_else(|| CastError::mismatch(format!("{}-tuple", len), value))?;
    if items.len() != len {
        return Err(CastError::Length {
            expected: len,
            found: items.len(),
        });
    }
    items
        .iter()
        .map(|v| item.coerce(v))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Accepts nested rows or a flat list of `rows * cols` numbers
fn matrix(rows: usize, cols: usize, value: &Value) -> Result<Value, CastError> {
    let items = value
        .as_list()
        .ok_or_else(|| CastError::mismatch("matrix", value))?;
    if items.len() == rows * cols && items.iter().all(Value::is_numeric) {
        return items
            .chunks(cols)
            .map(|row| fixed(&WrapperType::Float, cols, &Value::List(row.to_vec())))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List);
    }
    if items.len() != rows {
        return Err(CastError::Length {
            expected: rows,
            found: items.len(),
        });
    }
    items
        .iter()
        .map(|row| fixed(&WrapperType::Float, cols, row))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

impl fmt::Display for WrapperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrapperType::Bool => write!(f, "bool"),
            WrapperType::Int => write!(f, "int"),
            WrapperType::Float => write!(f, "float"),
            WrapperType::Str => write!(f, "str"),
            WrapperType::Vector(len) => write!(f, "vector{}", len),
            WrapperType::Tuple(item, len) => write!(f, "{}{}", item, len),
            WrapperType::Matrix(rows, cols) => write!(f, "matrix{}x{}", rows, cols),
            WrapperType::Node => write!(f, "node"),
            WrapperType::Object(name) => write!(f, "{}", name),
            WrapperType::List(item) => write!(f, "list[{}]", item),
        }
    }
}

pub type CastFn = fn(&Value) -> Result<Value, CastError>;

/// How a registered type converts values in one direction
#[derive(Debug, Clone)]
pub enum Cast {
    /// Construct the wrapper shape from the value
    Construct,
    Custom(CastFn),
    /// Convert a list one element at a time through the named item type
    Elementwise(Arc<str>),
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub type_name: Arc<str>,
    pub wrapper: WrapperType,
    /// Name of the wrapper-side type reported to callers
    pub wrapper_name: Arc<str>,
    pub in_cast: Cast,
    pub out_cast: Cast,
    /// Whether the type may appear as an output or by-reference argument
    pub by_ref: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConversionRegistry {
    entries: AHashMap<Arc<str>, Conversion>,
    prefixes: Vec<String>,
}

impl ConversionRegistry {
    /// Empty registry; `prefixes` drive the wrapper-name fallback
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Self {
        Self {
            entries: AHashMap::new(),
            prefixes: prefixes.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }

    /// Registry with the stock host types; array counterparts are registered
    /// only when `host_has` reports the host exposes them
    pub fn with_defaults<S: AsRef<str>>(prefixes: &[S], host_has: &dyn Fn(&str) -> bool) -> Self {
        let mut registry = Self::new(prefixes);
        for (name, wrapper) in PRIMITIVES {
            registry.register(name, wrapper.clone(), None, None, None);
        }

        let api_types = [
            ("MString", WrapperType::Str, "str"),
            ("MVector", WrapperType::Vector(3), "Vector"),
            ("MFloatVector", WrapperType::Vector(3), "FloatVector"),
            ("MPoint", WrapperType::Vector(4), "Point"),
            ("MFloatPoint", WrapperType::Vector(4), "FloatPoint"),
            ("MColor", WrapperType::Vector(4), "Color"),
            ("MQuaternion", WrapperType::Vector(4), "Quaternion"),
            ("MEulerRotation", WrapperType::Vector(3), "EulerRotation"),
            ("MMatrix", WrapperType::Matrix(4, 4), "Matrix"),
            ("MFloatMatrix", WrapperType::Matrix(4, 4), "FloatMatrix"),
            ("MObject", WrapperType::Object(Arc::from("MObject")), "DependNode"),
            ("MDagPath", WrapperType::Node, "DagNode"),
            ("MPlug", WrapperType::Object(Arc::from("MPlug")), "Attribute"),
            ("MTime", WrapperType::Float, "Time"),
            ("MDistance", WrapperType::Float, "Distance"),
            ("MAngle", WrapperType::Float, "Angle"),
        ];
        for (name, wrapper, wrapper_name) in api_types {
            registry.register_api_type(name, wrapper, wrapper_name, host_has);
        }

        for (array, item) in PRIMITIVE_ARRAYS {
            let Some((_, shape)) = PRIMITIVES.iter().find(|(name, _)| name == item) else {
                continue;
            };
            if host_has(array) {
                let wrapper = WrapperType::List(Box::new(shape.clone()));
                registry.register(array, wrapper, None, None, Some(*item));
            }
        }

        debug!("Registered {} default conversions", registry.len());
        registry
    }

    /// Register a type; missing casts default to constructing the wrapper
    /// shape. With `array_item`, casts instead go element by element through
    /// the item type. Re-registering a name replaces the entry.
    pub fn register(
        &mut self,
        type_name: &str,
        wrapper: WrapperType,
        in_cast: Option<Cast>,
        out_cast: Option<Cast>,
        array_item: Option<&str>,
    ) {
        let (default_in, default_out) = match array_item {
            Some(item) => (
                Cast::Elementwise(Arc::from(item)),
                Cast::Elementwise(Arc::from(item)),
            ),
            None => (Cast::Construct, Cast::Construct),
        };
        let wrapper_name = self.derived_name(type_name);
        self.insert(Conversion {
            type_name: Arc::from(type_name),
            wrapper: wrapper.clone(),
            wrapper_name: Arc::from(wrapper_name),
            in_cast: in_cast.unwrap_or(default_in),
            out_cast: out_cast.unwrap_or(default_out),
            by_ref: true,
        });

        if let Some((_, item)) = PRIMITIVES.iter().find(|(name, _)| *name == type_name) {
            // Variants reuse a custom base cast element by element
            let variant_cast = |cast: &Cast| match cast {
                Cast::Construct => Cast::Construct,
                _ => Cast::Elementwise(Arc::from(type_name)),
            };
            let (variant_in, variant_out) = match self.entries.get(type_name) {
                Some(base) => (variant_cast(&base.in_cast), variant_cast(&base.out_cast)),
                None => (Cast::Construct, Cast::Construct),
            };
            for len in 2..=4 {
                let shape = match item {
                    WrapperType::Float => WrapperType::Vector(len),
                    other => WrapperType::Tuple(Box::new(other.clone()), len),
                };
                let name = format!("{}{}", type_name, len);
                self.insert(Conversion {
                    type_name: Arc::from(name.as_str()),
                    wrapper: shape,
                    wrapper_name: Arc::from(name.as_str()),
                    in_cast: variant_in.clone(),
                    out_cast: variant_out.clone(),
                    by_ref: true,
                });
            }
        }
    }

    /// Register an API value type under its wrapper name, plus its
    /// `<name>Array` counterpart when the host exposes one
    pub fn register_api_type(
        &mut self,
        type_name: &str,
        wrapper: WrapperType,
        wrapper_name: &str,
        host_has: &dyn Fn(&str) -> bool,
    ) {
        self.register(type_name, wrapper.clone(), None, None, None);
        if let Some(entry) = self.entries.get_mut(type_name) {
            entry.wrapper_name = Arc::from(wrapper_name);
        }

        let array = format!("{}Array", type_name);
        if host_has(&array) {
            self.register(&array, WrapperType::List(Box::new(wrapper)), None, None, Some(type_name));
        }
    }

    pub fn insert(&mut self, conversion: Conversion) {
        self.entries.insert(conversion.type_name.clone(), conversion);
    }

    pub fn get(&self, type_name: &str) -> Option<&Conversion> {
        self.entries.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Usable as an output or by-reference argument
    pub fn has_ref(&self, type_name: &str) -> bool {
        self.get(type_name).is_some_and(|c| c.by_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn conversion(&self, type_name: &str) -> Result<&Conversion, CastError> {
        self.get(type_name)
            .ok_or_else(|| CastError::Unregistered(type_name.to_string()))
    }

    fn apply(
        &self,
        conversion: &Conversion,
        cast: &Cast,
        value: &Value,
        inbound: bool,
    ) -> Result<Value, CastError> {
        match cast {
            Cast::Construct => conversion.wrapper.coerce(value),
            Cast::Custom(f) => f(value),
            Cast::Elementwise(item) => {
                let items = value
                    .as_list()
                    .ok_or_else(|| CastError::mismatch("list", value))?;
                if let Some(len) = conversion.wrapper.fixed_len() {
                    if items.len() != len {
                        return Err(CastError::Length {
                            expected: len,
                            found: items.len(),
                        });
                    }
                }
                items
                    .iter()
                    .map(|v| {
                        if inbound {
                            self.in_cast(item, v)
                        } else {
                            self.out_cast(item, v)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
        }
    }

    /// Caller value to the form the host expects
    pub fn in_cast(&self, type_name: &str, value: &Value) -> Result<Value, CastError> {
        let conversion = self.conversion(type_name)?;
        self.apply(conversion, &conversion.in_cast, value, true)
    }

    /// Host value to the caller's form
    pub fn out_cast(&self, type_name: &str, value: &Value) -> Result<Value, CastError> {
        let conversion = self.conversion(type_name)?;
        self.apply(conversion, &conversion.out_cast, value, false)
    }

    /// Placeholder for an output argument
    pub fn ref_init(&self, type_name: &str) -> Result<Value, CastError> {
        let conversion = self.conversion(type_name)?;
        if !conversion.by_ref {
            return Err(CastError::Unregistered(type_name.to_string()));
        }
        Ok(conversion.wrapper.zero())
    }

    /// Extract the value the host wrote into a placeholder
    pub fn ref_cast(&self, type_name: &str, value: &Value) -> Result<Value, CastError> {
        self.out_cast(type_name, value)
    }

    /// Wrapper-side name for an API type; unregistered names fall back to
    /// stripping a known API prefix, which may not name a real wrapper
    pub fn wrapper_type_name(&self, api_type: &str) -> Option<String> {
        if let Some(conversion) = self.get(api_type) {
            return Some(conversion.wrapper_name.to_string());
        }
        strip_api_prefix(api_type, &self.prefixes).map(str::to_string)
    }

    fn derived_name(&self, type_name: &str) -> String {
        strip_api_prefix(type_name, &self.prefixes)
            .unwrap_or(type_name)
            .to_string()
    }
}
