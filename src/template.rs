//! Named CSS template store.
//!
//! Templates are plain `.css` files in a directory, keyed by file stem.
//! The store is read-only and safe for unsynchronized concurrent reads; a
//! missing template is not an error, it degrades to an empty style
//! contribution.

use std::fs;
use std::path::PathBuf;

use log::warn;

/// A directory of named style-sheet files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the CSS text of a named template.
    ///
    /// Returns `None` (and logs) when the template does not exist or cannot
    /// be read. Names containing path separators are rejected so lookups
    /// cannot escape the store directory.
    pub fn load(&self, name: &str) -> Option<String> {
        if name.contains('/') || name.contains('\\') {
            warn!("Rejecting template name with path separator: {:?}", name);
            return None;
        }

        let path = self.dir.join(format!("{}.css", name));
        match fs::read_to_string(&path) {
            Ok(css) => Some(css),
            Err(e) => {
                warn!("Template {:?} not available ({}); proceeding unstyled", name, e);
                None
            }
        }
    }

    /// List available template names: entries with a `.css` extension,
    /// extension stripped, sorted for determinism.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("css"))
                .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}
