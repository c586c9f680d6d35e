//! Typed intermediate representation for the tsharp compiler.
//!
//! [`build_program`] binds every expression of every module to an
//! [`IrType`](tsharp_catalog::IrType) drawn from the catalog. The result is
//! a fully typed tree: the emitter renders it without asking any further
//! typing questions.

pub mod builder;
pub mod error;
pub mod ir;

pub use builder::{IrBuilder, build_program};
pub use error::Ice;
pub use ir::*;
