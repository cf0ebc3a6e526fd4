//! Shared test fixtures and utilities for integration tests.
//!
//! The sample fragment under `tests/fixtures/` is modeled on real generator
//! output (a `functions` shard from a C++ documentation tree), including
//! HTML-entity-escaped labels, escaped keys, and `(Global Namespace)`
//! disambiguation markers.
//!
//! [`SearchDir`] builds throwaway on-disk `search/` directories for the
//! directory-loading tests.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The sample `functions_15.js` fragment.
pub const FUNCTIONS_FRAGMENT: &str = include_str!("../fixtures/functions_15.js");

/// Routes load/merge tracing through the test writer. Safe to call from
/// every test; initialization happens once.
pub fn init_tracing() {
    searchdata::tracing::init();
}

/// A temporary `search/` directory populated with fragment files.
///
/// Automatically cleaned up when dropped.
#[allow(dead_code)] // Used across different integration test crates
pub struct SearchDir {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl SearchDir {
    /// Creates a new empty search directory.
    pub fn new() -> Self {
        init_tracing();
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Writes a fragment file with the given content.
    ///
    /// # Panics
    /// Panics if the write fails.
    pub fn add(&self, file_name: &str, content: &str) -> &Self {
        std::fs::write(self.root.join(file_name), content)
            .unwrap_or_else(|e| panic!("Failed to write '{}': {}", file_name, e));
        self
    }
}

/// Builds a one-entry fragment body for directory tests.
#[allow(dead_code)] // Used across different integration test crates
pub fn fragment(key: &str, url: &str, label: &str) -> String {
    format!("var searchData=\n[\n  ['{key}',['{key}',['{url}',1,'{label}']]]\n];\n")
}
