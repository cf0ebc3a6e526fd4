//! Error handling types and utilities.

use thiserror::Error;

/// A specialized Result type for searchdata operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in the file and directory loaders.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a search index fragment violates the data format.
///
/// Loading is all-or-nothing: a fragment that produces any of these errors
/// yields no table at all, never a partially populated one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIndex {
    /// The source text does not conform to the fragment grammar.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// An entry carries no targets. Every key must resolve to at least one
    /// destination.
    #[error("entry '{key}' has an empty target list")]
    EmptyTargets { key: String },

    /// A key occurred more than once and the caller requires uniqueness.
    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },
}

impl MalformedIndex {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
