//! Syntax layer of the tsharp compiler.
//!
//! `tsharp-syntax` turns TypeScript source text into a plain syntax tree
//! ([`SourceModule`]) and defines the pieces every later phase shares:
//! source spans and the coded [`Diagnostic`] bag.
//!
//! # Example
//!
//! ```ignore
//! use tsharp_syntax::read_typescript;
//!
//! let module = read_typescript("main.ts", "const x: int = 1;")?;
//! assert_eq!(module.body.len(), 1);
//! ```
//!
//! Nothing in this crate resolves names or types. Annotations are kept
//! exactly as written and handed to the binder.

pub mod ast;
pub mod diagnostic;
pub mod registry;
pub mod span;
pub mod traits;

pub mod input;

// Re-exports: tree
pub use ast::SourceModule;

// Re-exports: diagnostics and spans
pub use diagnostic::{Diagnostic, Diagnostics, Severity, codes};
pub use span::{SourceSpan, Span};

// Re-exports: traits and registry
pub use registry::reader_for_extension;
pub use traits::{ReadError, Reader};

// Re-exports: built-in readers
#[cfg(feature = "read-typescript")]
pub use input::read_typescript;
#[cfg(feature = "read-typescript")]
pub use input::typescript::TypeScriptReader;
