//! Input readers - parse source text into the syntax tree.

#[cfg(feature = "read-typescript")]
pub mod typescript;

#[cfg(feature = "read-typescript")]
pub use typescript::{TYPESCRIPT_READER, TypeScriptReader, read_typescript};
