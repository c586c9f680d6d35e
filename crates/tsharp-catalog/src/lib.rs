//! Unified type catalog for the tsharp compiler.
//!
//! The catalog merges two sources of nominal types into one identity space:
//! platform metadata manifests (the embedded base library plus any
//! configured metadata roots) and classes, interfaces, enums and object
//! aliases declared in source. Every spelling of a type (`number`, `double`,
//! `Double`, `System.Double`) resolves to the same [`TypeId`].
//!
//! Annotation syntax is turned into [`IrType`] by [`TypeConverter`].

pub mod alias;
pub mod builtin;
pub mod convert;
pub mod entry;
pub mod manifest;
mod members;
pub mod naming;
mod skeleton;
pub mod type_id;
pub mod type_ref;
pub mod types;
pub mod universe;

pub use alias::AliasTable;
pub use convert::{SELF_TYPE_PARAM, TypeConverter, is_valid_dictionary_key};
pub use entry::{
    EnumRepr, MemberEntry, MemberKind, MemberModifiers, NominalEntry, NominalKind, Origin,
    Overridability, ParamEntry, PassingMode, SignatureEntry, TypeParamEntry, Visibility,
};
pub use manifest::{Manifest, ManifestError};
pub use naming::{module_container_name, module_namespace};
pub use type_id::TypeId;
pub use types::{
    FunctionParam, FunctionShape, IrType, LiteralValue, ObjectShape, PrimitiveKind, PropertyShape,
};
pub use universe::{CatalogOptions, MemberLookup, Universe, instantiate_signature};
