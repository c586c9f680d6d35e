//! Internal compiler errors raised by the IR builder.

use thiserror::Error;

/// An invariant of the builder was violated. Unlike diagnostics, an `Ice`
/// aborts the compilation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Ice {
    #[error("source type `{name}` in {module} has no catalog entry")]
    MissingCatalogEntry { name: String, module: String },

    #[error("declaration `{name}` in {module} is not bound")]
    UnboundDeclaration { name: String, module: String },

    #[error("module {index} is missing from the binding tables")]
    MissingModule { index: usize },
}
