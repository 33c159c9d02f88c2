//! Wrapper class factory for hostbind
//!
//! Turns the metadata store into wrapper classes and command functions:
//!
//! - [`Analyzer`]: decides which flags and API overloads can be wrapped
//! - [`probe`]: discovers flag modes and result shapes against the live host
//! - [`synthesizer`]: builds one [`hostbind_bridge::Callable`] per flag or overload
//! - [`ClassBuilder`]: the per-class build phases, driven by a [`ClassDecl`]
//! - [`TypeHierarchy`]: registered classes, their parents and namespaces
//! - [`Session`]: owns all of the above for one host and drains its events

pub mod analyzer;
pub mod class_factory;
pub mod errors;
pub mod overrides;
pub mod plugins;
pub mod probe;
pub mod registry;
pub mod session;
pub mod synthesizer;

pub use analyzer::{Analyzer, Unwrappable};
pub use class_factory::{
    build_class, ClassBuilder, ClassDecl, ClassState, FactoryContext, WrapperClass,
};
pub use errors::FactoryError;
pub use overrides::{Override, OverrideTable, UseName};
pub use plugins::PluginRecord;
pub use probe::{probe_command, probe_store, ProbeFailure, ProbeReport, ProbeScope};
pub use registry::{Namespace, TypeHierarchy, CLASSES_NAMESPACE, COMMANDS_NAMESPACE};
pub use session::{InitReport, Session};
