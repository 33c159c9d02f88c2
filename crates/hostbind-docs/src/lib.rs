//! Metadata sources for the hostbind store
//!
//! The host's own flag synopsis gives the authoritative baseline; the
//! documentation tree, when installed, adds docstrings, declared modes and
//! the entity-type hierarchy.

pub mod builder;
pub mod command_doc;
pub mod errors;
pub mod hierarchy_doc;
pub mod synopsis;

pub use builder::{documented_commands, StoreBuilder};
pub use command_doc::{enrich, parse_command_doc, read_command_doc, CommandDoc, FlagDoc};
pub use errors::DocsError;
pub use hierarchy_doc::{parse_hierarchy, read_hierarchy};
pub use synopsis::parse_synopsis;
