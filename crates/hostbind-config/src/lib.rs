//! Configuration for the hostbind tools
//!
//! Holds the persisted user configuration (`hostbind.toml`) and the path
//! conventions used to locate metadata caches and host documentation pages.

pub mod config;
pub mod doc_paths;

pub use config::{Config, ConfigError};
pub use doc_paths::{DocsLayout, DocsPathError};
