use hostbind_meta::MetaError;
use thiserror::Error;

/// Failures raised by the host itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("Host runtime error: {0}")]
    Runtime(String),

    #[error("Invalid flag '{flag}' for command '{command}'")]
    InvalidFlag { command: String, flag: String },

    #[error("No such entity: {0}")]
    NoSuchEntity(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Value coercion failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastError {
    #[error("Cannot convert {found} to {expected}")]
    Mismatch { expected: String, found: &'static str },

    #[error("Expected {expected} elements, got {found}")]
    Length { expected: usize, found: usize },

    #[error("No conversion registered for type '{0}'")]
    Unregistered(String),
}

impl CastError {
    pub fn mismatch(expected: impl Into<String>, found: &crate::Value) -> Self {
        CastError::Mismatch {
            expected: expected.into(),
            found: found.kind(),
        }
    }
}

/// Failures raised by a synthesized callable
#[derive(Error, Debug)]
pub enum CallError {
    #[error("{callable}() takes {expected} positional arguments but {given} were given")]
    Arity {
        callable: String,
        expected: usize,
        given: usize,
    },

    #[error("Invalid value {value} for enum {class}.{name}")]
    InvalidEnum {
        class: String,
        name: String,
        value: String,
    },

    #[error("{command}() got an unknown flag '{flag}'")]
    UnknownFlag { command: String, flag: String },

    #[error("{callable}() missing required argument '{param}'")]
    MissingArgument { callable: String, param: String },

    #[error("{callable}() got an unexpected keyword argument '{param}'")]
    UnexpectedKeyword { callable: String, param: String },

    #[error("{callable}() got multiple values for argument '{param}'")]
    MultipleValues { callable: String, param: String },

    #[error("{callable}() needs a wrapped instance")]
    MissingInstance { callable: String },

    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    NotFound(#[from] MetaError),
}

impl CallError {
    pub fn arity(callable: &str, expected: usize, given: usize) -> Self {
        CallError::Arity {
            callable: callable.to_string(),
            expected,
            given,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn test_messages() {
        let err = CallError::arity("setRadius", 1, 2);
        assert_eq!(
            err.to_string(),
            "setRadius() takes 1 positional arguments but 2 were given"
        );

        let err: CallError = CastError::mismatch("float", &Value::str("x")).into();
        assert_eq!(err.to_string(), "Cast error: Cannot convert string to float");

        let err: CallError = HostError::NoSuchEntity("pSphere1".to_string()).into();
        assert!(matches!(err, CallError::Host(_)));
    }
}
