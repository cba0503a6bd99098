//! Synthesis and loading configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::warn;

use crate::codegen::defs::{DEFAULT_MAJOR_VERSION, DEFAULT_MINOR_VERSION};

pub const DEFAULT_ADAPTOR_PACKAGE: &str = "FESI.ClassFile";
pub const DEFAULT_ADAPTOR_BASE_CLASS: &str = "FESI.ClassFile.EventAdaptor";
pub const DEFAULT_EVENT_BASE_CLASS: &str = "java.util.EventObject";

/// Order of the stubs and of the reflected `methods` array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodOrder {
    /// By name, then descriptor; identical on every run
    #[default]
    Sorted,
    /// As the registry reports them
    Declaration,
}

impl FromStr for MethodOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sorted" => Ok(MethodOrder::Sorted),
            "declaration" => Ok(MethodOrder::Declaration),
            other => Err(format!("unknown method order '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Package the adaptor classes are generated into
    pub adaptor_package: String,
    /// Superclass of every adaptor; declares both `fire` overloads
    pub adaptor_base_class: String,
    /// Parameter type that selects the simple stub
    pub event_base_class: String,
    pub major_version: u16,
    pub minor_version: u16,
    pub method_order: MethodOrder,
    pub emit_source_file: bool,
    /// LineNumberTable and LocalVariableTable on the stubs
    pub emit_debug_tables: bool,
    pub verify_before_write: bool,
    /// Treat skipped listener methods as a synthesis failure
    pub fail_on_warning: bool,
    /// Roots scanned for listener declarations
    pub classpath: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adaptor_package: DEFAULT_ADAPTOR_PACKAGE.to_string(),
            adaptor_base_class: DEFAULT_ADAPTOR_BASE_CLASS.to_string(),
            event_base_class: DEFAULT_EVENT_BASE_CLASS.to_string(),
            major_version: DEFAULT_MAJOR_VERSION,
            minor_version: DEFAULT_MINOR_VERSION,
            method_order: MethodOrder::default(),
            emit_source_file: false,
            emit_debug_tables: false,
            verify_before_write: true,
            fail_on_warning: false,
            classpath: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `FESI_CLASSPATH`, `FESI_ADAPTOR_PACKAGE` and `FESI_METHOD_ORDER`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| env::var(key).ok())
    }

    /// Overlay values from `lookup`; unparseable values are logged and ignored
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(paths) = lookup("FESI_CLASSPATH") {
            self.classpath.extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(package) = lookup("FESI_ADAPTOR_PACKAGE") {
            if !package.trim().is_empty() {
                self.adaptor_package = package.trim().to_string();
            }
        }
        if let Some(order) = lookup("FESI_METHOD_ORDER") {
            match order.parse() {
                Ok(order) => self.method_order = order,
                Err(e) => warn!("ignoring FESI_METHOD_ORDER: {}", e),
            }
        }
        self
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn with_method_order(mut self, method_order: MethodOrder) -> Self {
        self.method_order = method_order;
        self
    }
}
