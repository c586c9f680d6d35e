//! Errors that stop a compilation.
//!
//! Problems in the user's program are diagnostics, not errors: they are
//! returned in [`CompileOutput`](crate::CompileOutput).

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;
use tsharp_syntax::{Diagnostic, ReadError};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source root {0} is not a directory")]
    MissingSourceRoot(PathBuf),

    #[error("no reader for {0}")]
    UnsupportedSource(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: ReadError,
    },

    /// A `System.*` or standard library type the catalog should hold is
    /// missing, so the metadata roots are incomplete.
    #[error("incomplete base library: {0}")]
    MissingStdlibType(Box<Diagnostic>),

    #[error("internal compiler error: {0}")]
    Internal(#[from] InternalError),
}

/// A broken compiler invariant, by phase.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error(transparent)]
    Binder(#[from] tsharp_ir::Ice),

    #[error(transparent)]
    Emitter(#[from] tsharp_emit::Ice),
}

impl From<tsharp_ir::Ice> for CompileError {
    fn from(ice: tsharp_ir::Ice) -> Self {
        CompileError::Internal(ice.into())
    }
}

impl From<tsharp_emit::Ice> for CompileError {
    fn from(ice: tsharp_emit::Ice) -> Self {
        CompileError::Internal(ice.into())
    }
}
