//! Reader trait and errors.

use crate::ast::SourceModule;

/// Error that can occur when reading source text into a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{path}:{line}:{column}: syntax error near `{snippet}`")]
    Syntax {
        path: String,
        line: u32,
        column: u32,
        snippet: String,
    },

    #[error("expected {expected}, got {got}")]
    UnexpectedNode { expected: String, got: String },
}

/// A reader parses one source file into a [`SourceModule`].
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "typescript").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["ts"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse `source`, recording `path` as the module's logical path.
    fn read(&self, path: &str, source: &str) -> Result<SourceModule, ReadError>;
}
