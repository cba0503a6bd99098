//! Classpath scanning: registers every `*.java` declaration found under the roots

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::error::{RegistryError, RegistryResult};
use super::registry::ClassRegistry;

/// Files larger than this are skipped
pub const MAX_SOURCE_SIZE: u64 = 256 * 1024;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Registered class names, in load order
    pub classes: Vec<String>,
    /// Files that were skipped, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl ClassRegistry {
    /// Scan classpath roots and register the declarations found there
    ///
    /// Files that fail to parse are recorded in the report and skipped;
    /// unreadable directories and files abort the scan.
    pub fn load_classpath<P: AsRef<Path>>(&mut self, roots: &[P]) -> RegistryResult<LoadReport> {
        let mut report = LoadReport::default();
        for root in roots {
            let root = root.as_ref();
            let mut files = Vec::new();
            for entry in WalkDir::new(root).follow_links(true) {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().map(|e| e == "java").unwrap_or(false) {
                    files.push((path.to_path_buf(), entry.metadata()?.len()));
                }
            }
            // Directory order is platform dependent
            files.sort();
            for (path, size) in files {
                if size > MAX_SOURCE_SIZE {
                    warn!("skipping {}: {} bytes", path.display(), size);
                    report.skipped.push((path, format!("larger than {} bytes", MAX_SOURCE_SIZE)));
                    continue;
                }
                let source = fs::read_to_string(&path)
                    .map_err(|source| RegistryError::Io { path: path.clone(), source })?;
                match self.load_source(&source) {
                    Ok(names) => {
                        debug!("[classpath] indexed {}", path.display());
                        report.classes.extend(names);
                    }
                    Err(e) => {
                        warn!("skipping {}: {}", path.display(), e);
                        report.skipped.push((path, e.to_string()));
                    }
                }
            }
        }
        info!("classpath scan registered {} classes, skipped {} files", report.classes.len(), report.skipped.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_registers_and_skips() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("app").join("events");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(
            pkg.join("TickListener.java"),
            "package app.events;\nimport java.util.EventListener;\npublic interface TickListener extends EventListener {\n  void tick(long when, boolean late);\n}\n",
        )
        .unwrap();
        fs::write(pkg.join("Broken.java"), "package app.events;\npublic interface Broken {\n  void f(int);\n}\n").unwrap();
        fs::write(pkg.join("notes.txt"), "not java").unwrap();

        let mut registry = ClassRegistry::with_jdk();
        let report = registry.load_classpath(&[dir.path()]).unwrap();
        assert_eq!(report.classes, vec!["app.events.TickListener".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].0.ends_with("Broken.java"));
        assert!(registry.lookup_interface("app.events.TickListener").is_ok());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut registry = ClassRegistry::new();
        let result = registry.load_classpath(&[dir.path().join("absent")]);
        assert!(matches!(result, Err(RegistryError::Walk(_))));
    }
}
