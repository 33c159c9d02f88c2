//! Hostbind metadata store
//!
//! Describes the two scripting surfaces of the host: every command with its
//! flags, and every API class with its method overloads and enums. The store
//! is built once per host version (from the host itself and, optionally, its
//! documentation) and cached as a versioned JSON blob so later sessions skip
//! the rebuild.

pub mod errors;
pub mod hierarchy;
pub mod inverse;
pub mod naming;
pub mod source;
pub mod store;
pub mod sync;
pub mod types;
pub mod value;

pub use errors::MetaError;
pub use hierarchy::EntityHierarchy;
pub use inverse::infer_inverses;
pub use source::MetadataSource;
pub use store::MetadataStore;
pub use sync::{merge_commands, SyncResult};
pub use types::{
    ApiClassInfo, ApiEnum, ArgInfo, ArgType, CommandInfo, Direction, FlagInfo, Inverse, MethodInfo,
    Mode, Primitive, TypeRef, UnitType,
};
pub use value::{ObjectRef, Value};
