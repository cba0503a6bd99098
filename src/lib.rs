//! FESI: an embeddable ECMAScript object runtime with JVM adaptor synthesis
//!
//! ## Architecture
//!
//! - **codegen**: constant pool, class file model, bytecode builder and a class file reader
//! - **verify**: structural checks run on a class file before it is written
//! - **reflect**: class registry loaded from declarations, standing in for host reflection
//! - **adaptor**: listener adaptor synthesis and the script side of `fire`
//! - **runtime**: script objects, the property protocol, host wrappers and the evaluator
//! - **bin**: command-line front end
//!
//! ## Adaptor flow
//!
//! ```text
//! listener name → ClassRegistry → EventAdaptorSynthesizer → ClassFile → verify → bytes
//!                                                                  ↓
//!                           EventBinding::fire ← adaptor base class calls fire(args, method)
//! ```

pub mod adaptor;
pub mod codegen;
pub mod config;
pub mod error;
pub mod reflect;
pub mod runtime;
pub mod verify;

pub use config::Config;
pub use error::{Error, Result};

use std::path::{Path, PathBuf};

use log::info;

use adaptor::{EventAdaptorSynthesizer, SynthesizedAdaptor};
use reflect::ClassRegistry;

/// Registry seeded with the bundled JDK declarations plus everything on `config.classpath`
pub fn load_registry(config: &Config) -> Result<ClassRegistry> {
    let mut registry = ClassRegistry::with_jdk();
    if !config.classpath.is_empty() {
        let report = registry.load_classpath(&config.classpath)?;
        info!(
            "loaded {} classes from {} roots ({} files skipped)",
            report.classes.len(),
            config.classpath.len(),
            report.skipped.len()
        );
    }
    Ok(registry)
}

/// Synthesize the adaptor for `listener` in memory
pub fn synthesize_adaptor(listener: &str, config: &Config) -> Result<SynthesizedAdaptor> {
    let registry = load_registry(config)?;
    let adaptor = EventAdaptorSynthesizer::new(&registry, config).synthesize(listener)?;
    Ok(adaptor)
}

/// Synthesize the adaptor for `listener` and write it below `output_dir`
pub fn synthesize_adaptor_to_dir(listener: &str, output_dir: &Path, config: &Config) -> Result<(SynthesizedAdaptor, PathBuf)> {
    let adaptor = synthesize_adaptor(listener, config)?;
    let path = adaptor.write_to(output_dir)?;
    Ok((adaptor, path))
}
