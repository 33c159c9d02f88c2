//! hostbind command line - expose modules for testing
//!
//! Offline tooling over metadata caches, host documentation pages and the
//! user configuration. Nothing here talks to a live host.

pub mod commands;
pub mod common;

pub use common::GlobalOpts;
