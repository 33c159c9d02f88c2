use hostbind_bridge::CallError;
use hostbind_config::ConfigError;
use hostbind_meta::MetaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Cannot register '{class}': parent class '{parent}' is not registered")]
    ParentNotRegistered { class: String, parent: String },

    #[error("Class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("Class '{0}' is not registered")]
    UnknownClass(String),

    #[error("'{class}' has no method '{method}'")]
    UnknownMethod { class: String, method: String },

    #[error("No command function named '{0}'")]
    UnknownFunction(String),

    #[error("Proxy class '{0}' does not name an API class to delegate to")]
    MissingDelegate(String),

    #[error("Invalid override table {path}: {reason}")]
    Overrides { path: String, reason: String },

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    Call(#[from] CallError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
