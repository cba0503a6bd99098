//! Errors raised while resolving or loading class declarations

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Class not found: {0}")]
    ClassNotFound(String),
    #[error("{0} is not an interface")]
    NotAnInterface(String),
    #[error("Lexical error at {line}:{column}: unexpected {found:?}")]
    Lex { line: usize, column: usize, found: String },
    #[error("Parse error at {line}:{column}: expected {expected}, found {found}")]
    Parse { line: usize, column: usize, expected: String, found: String },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to scan classpath: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;
