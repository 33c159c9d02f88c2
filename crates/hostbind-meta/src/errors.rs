use std::io;
use thiserror::Error;

/// Errors raised by metadata lookups and cache persistence
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("{kind} '{name}' is not known to the metadata store")]
    NotFound { kind: &'static str, name: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to (de)serialize metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metadata cache is for host version '{found}', expected '{expected}'")]
    VersionMismatch { expected: String, found: String },
}

impl MetaError {
    pub fn command(name: &str) -> Self {
        MetaError::NotFound {
            kind: "command",
            name: name.to_string(),
        }
    }

    pub fn api_class(name: &str) -> Self {
        MetaError::NotFound {
            kind: "API class",
            name: name.to_string(),
        }
    }

    pub fn flag(command: &str, flag: &str) -> Self {
        MetaError::NotFound {
            kind: "flag",
            name: format!("{}.{}", command, flag),
        }
    }

    pub fn method(class: &str, method: &str) -> Self {
        MetaError::NotFound {
            kind: "method",
            name: format!("{}.{}", class, method),
        }
    }
}
