//! Name binding for the tsharp compiler.
//!
//! The binding layer answers exactly one kind of question: *which
//! declaration does this name refer to?* It allocates every declaration,
//! call signature, member and captured annotation in arena tables addressed
//! by `u32` handles, resolves imports between modules, and offers
//! arity-based overload filtering. It never computes types; that is the job
//! of the catalog and the IR builder.

pub mod handles;
pub mod overload;
pub mod scope;
pub mod table;

pub use handles::{DeclId, MemberId, ModuleId, SignatureId, TypeSyntaxId};
pub use overload::{Arity, OverloadSelection, select_by_arity};
pub use scope::ScopeStack;
pub use table::{
    Bindings, DeclKind, Declaration, Member, MemberKind, ModuleScope, Signature,
    resolve_module_specifier,
};
