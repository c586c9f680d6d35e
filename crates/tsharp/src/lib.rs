//! TypeScript to C# compiler.
//!
//! ```no_run
//! use tsharp::{CompilerOptions, compile};
//!
//! let sources = vec![("main.ts".to_string(), "console.log(\"hi\");".to_string())];
//! let output = compile(&sources, &CompilerOptions::default()).unwrap();
//! for diagnostic in &output.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! print!("{}", output.files["main.cs"]);
//! ```
//!
//! The phases live in their own crates and are re-exported here:
//! [`syntax`], [`binding`], [`catalog`], [`ir`] and [`emit`].

pub mod compilation;
pub mod config;
pub mod error;
pub mod logging;

pub use compilation::{CompileOutput, Compilation, compile, compile_dir, read_source_root};
pub use config::{CONFIG_FILE, CompilerOptions, ConfigError};
pub use error::{CompileError, InternalError};
pub use tsharp_syntax::{Diagnostic, Severity, codes};

pub use tsharp_binding as binding;
pub use tsharp_catalog as catalog;
pub use tsharp_emit as emit;
pub use tsharp_ir as ir;
pub use tsharp_syntax as syntax;
