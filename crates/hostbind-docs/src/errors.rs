use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading documentation pages
#[derive(Error, Debug)]
pub enum DocsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Documentation page not found: {0}")]
    MissingPage(PathBuf),

    #[error("Malformed documentation for '{page}': {reason}")]
    Malformed { page: String, reason: String },
}
