use thiserror::Error;

use crate::adaptor::SynthesisError;
use crate::codegen::{ClassGenerationError, InspectError};
use crate::reflect::RegistryError;
use crate::runtime::ScriptError;
use crate::verify::VerifyError;

/// Result type for fesi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the library surfaces, grouped by layer
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ClassGeneration(#[from] ClassGenerationError),

    #[error("Malformed class file: {0}")]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + 'static>() {}

    #[test]
    fn test_error_crosses_threads() {
        assert_send_sync::<Error>();
        let err: Error = ScriptError::Thrown("boom".to_string()).into();
        assert_eq!(err.to_string(), "Script error: Uncaught boom");
        let wrapped = anyhow::Error::from(err).context("running handler");
        assert!(wrapped.to_string().contains("running handler"));
    }
}
