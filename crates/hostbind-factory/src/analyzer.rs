//! Wrappability Analyzer
//!
//! Decides, per command flag or API method overload, whether every type the
//! symbol touches has a registered conversion and whether every enum it names
//! exists. Rejection is routine: callers log the reason at debug level and
//! skip the one symbol.

use hostbind_bridge::ConversionRegistry;
use hostbind_meta::{Direction, FlagInfo, MetadataStore, MethodInfo, TypeRef};
use std::fmt;

/// Why a flag or overload was not wrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unwrappable {
    Deprecated,
    OutputArg { arg: String, ty: String },
    InputArg { arg: String, ty: String },
    ReturnType(String),
    MissingEnum { class: String, name: String },
    /// The host rejected the flag during probing
    InvalidFlag,
    NoModes,
}

impl fmt::Display for Unwrappable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unwrappable::Deprecated => write!(f, "overload is deprecated"),
            Unwrappable::OutputArg { arg, ty } => {
                write!(f, "output '{}' has no by-reference conversion for {}", arg, ty)
            }
            Unwrappable::InputArg { arg, ty } => {
                write!(f, "input '{}' has no conversion for {} and no default", arg, ty)
            }
            Unwrappable::ReturnType(ty) => write!(f, "return type {} has no conversion", ty),
            Unwrappable::MissingEnum { class, name } => {
                write!(f, "enum {}.{} does not exist", class, name)
            }
            Unwrappable::InvalidFlag => write!(f, "flag was rejected by the host"),
            Unwrappable::NoModes => write!(f, "flag has no known modes"),
        }
    }
}

pub struct Analyzer<'a> {
    store: &'a MetadataStore,
    conversions: &'a ConversionRegistry,
}

impl<'a> Analyzer<'a> {
    pub fn new(store: &'a MetadataStore, conversions: &'a ConversionRegistry) -> Self {
        Self { store, conversions }
    }

    /// `self_type` is the enclosing class's own API type, which passes
    /// through unconverted in any position
    pub fn can_wrap_method(
        &self,
        info: &MethodInfo,
        self_type: Option<&str>,
    ) -> Result<(), Unwrappable> {
        if info.deprecated {
            return Err(Unwrappable::Deprecated);
        }
        for ty in info.referenced_types() {
            if let TypeRef::Enum { class, name } = ty {
                self.check_enum(class, name)?;
            }
        }

        for arg in &info.args {
            let Some(ty) = arg.ty.as_named() else {
                continue;
            };
            if self_type == Some(ty) {
                continue;
            }
            match arg.direction {
                Direction::Out if !self.conversions.has_ref(ty) => {
                    return Err(Unwrappable::OutputArg {
                        arg: arg.name.to_string(),
                        ty: ty.to_string(),
                    });
                }
                Direction::In
                    if !self.conversions.contains(ty) && !info.defaults.contains_key(&arg.name) =>
                {
                    return Err(Unwrappable::InputArg {
                        arg: arg.name.to_string(),
                        ty: ty.to_string(),
                    });
                }
                _ => {}
            }
        }

        if let Some(ty) = info.return_type.as_ref().and_then(TypeRef::as_named) {
            if self_type != Some(ty) && !self.conversions.contains(ty) {
                return Err(Unwrappable::ReturnType(ty.to_string()));
            }
        }
        Ok(())
    }

    fn check_enum(&self, class: &str, name: &str) -> Result<(), Unwrappable> {
        self.store
            .get_api_class_info(class)
            .ok()
            .and_then(|info| info.enumeration(name))
            .map(|_| ())
            .ok_or_else(|| Unwrappable::MissingEnum {
                class: class.to_string(),
                name: name.to_string(),
            })
    }

    pub fn can_wrap_flag(&self, flag: &FlagInfo) -> Result<(), Unwrappable> {
        if flag.invalid {
            Err(Unwrappable::InvalidFlag)
        } else if flag.modes.is_empty() {
            Err(Unwrappable::NoModes)
        } else {
            Ok(())
        }
    }
}
