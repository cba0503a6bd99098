//! Class registry standing in for the host reflection facility

pub mod error;
mod jdk;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use loader::LoadReport;
pub use registry::{ClassInfo, ClassRegistry, MethodInfo, OBJECT_CLASS};
