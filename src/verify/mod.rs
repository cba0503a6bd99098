//! Structural verification of class files before they are written
//!
//! Each sub-verifier checks one table of the class file and reports its own
//! error type; `verify` runs them in class file order.

mod verifier;
pub mod attributes;
pub mod class_access_flags;
pub mod constant_pool;
pub mod fields;
pub mod interfaces;
pub mod method_access_flags;
pub mod methods;

pub use verifier::{verify, VerifyError, VerifyResult};
