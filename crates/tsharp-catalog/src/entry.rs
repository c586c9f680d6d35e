//! Catalog entries for nominal types and their members.

use crate::type_id::TypeId;
use crate::types::IrType;
use serde::{Deserialize, Serialize};
use tsharp_binding::{Arity, DeclId, ModuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NominalKind {
    Class,
    Interface,
    Struct,
    Enum,
}

/// Where a nominal type was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Source { module: ModuleId, decl: DeclId },
    Platform { assembly: String },
}

impl Origin {
    pub fn is_source(&self) -> bool {
        matches!(self, Origin::Source { .. })
    }

    pub fn assembly(&self) -> Option<&str> {
        match self {
            Origin::Platform { assembly } => Some(assembly),
            Origin::Source { .. } => None,
        }
    }
}

/// Member accessibility.
///
/// `rank` orders the lattice used for override checks:
/// private < protected, internal < protected internal < public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    Private,
    Protected,
    Internal,
    ProtectedInternal,
    Public,
}

impl Visibility {
    pub fn rank(self) -> u8 {
        match self {
            Visibility::Private => 0,
            Visibility::Protected | Visibility::Internal => 1,
            Visibility::ProtectedInternal => 2,
            Visibility::Public => 3,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::ProtectedInternal => "protected internal",
            Visibility::Public => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Overridability {
    /// Non-virtual, cannot be overridden.
    #[default]
    None,
    Virtual,
    Abstract,
    /// Overrides an inherited member and is itself overridable.
    Override,
    Sealed,
}

impl Overridability {
    pub fn can_be_overridden(self) -> bool {
        matches!(
            self,
            Overridability::Virtual | Overridability::Abstract | Overridability::Override
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PassingMode {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl PassingMode {
    /// Argument prefix in C# (`ref`, `out`, `in`).
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            PassingMode::Value => None,
            PassingMode::Ref => Some("ref"),
            PassingMode::Out => Some("out"),
            PassingMode::In => Some("in"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeParamEntry {
    pub name: String,
    pub constraint: Option<IrType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamEntry {
    pub name: String,
    pub ty: IrType,
    pub mode: PassingMode,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignatureEntry {
    pub type_params: Vec<TypeParamEntry>,
    pub params: Vec<ParamEntry>,
    pub ret: IrType,
}

impl Arity for SignatureEntry {
    fn min_args(&self) -> usize {
        self.params.iter().filter(|p| !p.optional && !p.rest).count()
    }

    fn max_args(&self) -> Option<usize> {
        if self.params.iter().any(|p| p.rest) {
            None
        } else {
            Some(self.params.len())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Property,
    Field,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberModifiers {
    pub is_static: bool,
    pub visibility: Visibility,
    pub overridability: Overridability,
    pub readonly: bool,
    pub optional: bool,
    pub is_extension: bool,
}

impl Default for MemberModifiers {
    fn default() -> Self {
        Self {
            is_static: false,
            visibility: Visibility::Public,
            overridability: Overridability::None,
            readonly: false,
            optional: false,
            is_extension: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberEntry {
    pub name: String,
    pub kind: MemberKind,
    /// Methods and constructors; empty for properties and fields.
    pub signatures: Vec<SignatureEntry>,
    /// Property and field type; `None` for methods.
    pub ty: Option<IrType>,
    pub modifiers: MemberModifiers,
}

/// How an enum's members are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnumRepr {
    Numeric,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NominalEntry {
    pub id: TypeId,
    pub kind: NominalKind,
    pub type_params: Vec<TypeParamEntry>,
    pub base: Option<IrType>,
    pub interfaces: Vec<IrType>,
    pub members: Vec<MemberEntry>,
    pub origin: Origin,
    pub is_value_type: bool,
    pub is_abstract: bool,
    pub is_sealed: bool,
    pub is_static: bool,
    pub enum_repr: Option<EnumRepr>,
}

impl NominalEntry {
    /// A skeleton: identity and kind, no heritage or members yet.
    pub fn skeleton(id: TypeId, kind: NominalKind, origin: Origin) -> Self {
        Self {
            id,
            kind,
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            origin,
            is_value_type: kind == NominalKind::Struct || kind == NominalKind::Enum,
            is_abstract: false,
            is_sealed: false,
            is_static: false,
            enum_repr: None,
        }
    }

    /// Members declared directly on this type with `name`.
    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MemberEntry> {
        self.members.iter().filter(move |m| m.name == name)
    }

    pub fn member(&self, name: &str) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MemberEntry> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Constructor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_lattice() {
        assert!(Visibility::Private.rank() < Visibility::Protected.rank());
        assert_eq!(Visibility::Protected.rank(), Visibility::Internal.rank());
        assert!(Visibility::ProtectedInternal.rank() < Visibility::Public.rank());
    }

    #[test]
    fn test_signature_arity() {
        let param = |optional, rest| ParamEntry {
            name: "p".into(),
            ty: IrType::Any,
            mode: PassingMode::Value,
            optional,
            rest,
        };
        let sig = SignatureEntry {
            type_params: Vec::new(),
            params: vec![param(false, false), param(true, false)],
            ret: IrType::void(),
        };
        assert!(sig.accepts(1));
        assert!(sig.accepts(2));
        assert!(!sig.accepts(3));
    }
}
