use std::path::PathBuf;

use thiserror::Error;

use crate::codegen::error::{BytecodeError, ClassGenerationError, ConstPoolError, DescriptorError};
use crate::reflect::RegistryError;
use crate::verify::VerifyError;

/// Reasons adaptor synthesis aborts; the partial class is discarded
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Cannot resolve listener: {0}")]
    Registry(#[from] RegistryError),

    #[error("Class file generation failed: {0}")]
    ClassGeneration(#[from] ClassGenerationError),

    #[error("Generated class failed verification: {0}")]
    Verify(#[from] VerifyError),

    #[error("Listener {listener} has {count} unsupported methods, first: {first}")]
    Warnings { listener: String, count: usize, first: SynthesisWarning },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConstPoolError> for SynthesisError {
    fn from(e: ConstPoolError) -> Self {
        SynthesisError::ClassGeneration(e.into())
    }
}

impl From<BytecodeError> for SynthesisError {
    fn from(e: BytecodeError) -> Self {
        SynthesisError::ClassGeneration(e.into())
    }
}

impl From<DescriptorError> for SynthesisError {
    fn from(e: DescriptorError) -> Self {
        SynthesisError::ClassGeneration(e.into())
    }
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// A listener method that got no stub; the adaptor is still produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisWarning {
    /// Only `void` methods can forward to `fire`
    #[error("skipped {method}: return type {return_type} is not void")]
    UnsupportedReturnType { method: String, return_type: String },
}

impl SynthesisWarning {
    /// Name and descriptor of the skipped method
    pub fn method(&self) -> &str {
        match self {
            SynthesisWarning::UnsupportedReturnType { method, .. } => method,
        }
    }
}
