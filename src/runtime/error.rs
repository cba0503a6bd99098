//! Errors surfaced to scripts by the property protocol and the evaluator

use thiserror::Error;

use super::host::{BeanError, NodeError};

#[derive(Error, Debug, Clone)]
pub enum ScriptError {
    #[error("Property {property} is read-only")]
    ReadOnly { property: String },

    #[error("Cannot put {found} at index {index}: expected {expected}")]
    IndexedPutType { index: usize, expected: &'static str, found: &'static str },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0} is not a function")]
    NotAFunction(String),

    #[error("No prototype named {0}")]
    NoSuchPrototype(String),

    #[error("Setting the prototype of {0} would create a cycle")]
    PrototypeCycle(String),

    #[error("{0} is not defined")]
    ReferenceError(String),

    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("RangeError: {0}")]
    RangeError(String),

    #[error("Cannot access property {property} of {class}: {source}")]
    Bean {
        class: String,
        property: String,
        #[source]
        source: BeanError,
    },

    #[error(transparent)]
    Node(#[from] NodeError),

    /// String form of a value thrown by script code
    #[error("Uncaught {0}")]
    Thrown(String),
}

pub type ScriptResult<T> = Result<T, ScriptError>;
