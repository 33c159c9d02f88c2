//! Runtime bridge between wrapper classes and the live host
//!
//! - [`Host`]: the operations the wrapper layer needs from the host
//! - [`ConversionRegistry`]: value casts per API type, including by-reference use
//! - [`Callable`]: synthesized functions and methods, invoked through a [`CallContext`]
//! - [`UndoCoordinator`]: makes API setters undoable through the host's own queue

pub mod callable;
pub mod conversion;
pub mod errors;
pub mod host;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod undo;
pub mod units;

pub use callable::{
    CallContext, Callable, CallableKind, CommandBinding, FlagBinding, MethodBinding, NativeFn,
    Param, UndoBinding,
};
pub use conversion::{Cast, CastFn, Conversion, ConversionRegistry, WrapperType};
pub use errors::{CallError, CastError, HostError};
pub use host::{ApiCall, Host, HostEvent};
pub use hostbind_meta::{ObjectRef, Value};
pub use undo::{UndoCoordinator, UndoItem, TRACKING_ATTRIBUTE, TRACKING_NODE};
pub use units::{AngularUnit, LinearUnit, UnitSettings};
