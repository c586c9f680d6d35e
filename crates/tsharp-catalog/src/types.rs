//! The closed set of IR types.

use crate::type_id::TypeId;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PrimitiveKind {
    /// TypeScript `number`, a double.
    Number,
    Int,
    Long,
    Short,
    Byte,
    SByte,
    UInt,
    ULong,
    UShort,
    Float,
    Decimal,
    String,
    Char,
    Boolean,
    Void,
    Null,
    Undefined,
    Never,
    BigInt,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 19] = [
        PrimitiveKind::Number,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Short,
        PrimitiveKind::Byte,
        PrimitiveKind::SByte,
        PrimitiveKind::UInt,
        PrimitiveKind::ULong,
        PrimitiveKind::UShort,
        PrimitiveKind::Float,
        PrimitiveKind::Decimal,
        PrimitiveKind::String,
        PrimitiveKind::Char,
        PrimitiveKind::Boolean,
        PrimitiveKind::Void,
        PrimitiveKind::Null,
        PrimitiveKind::Undefined,
        PrimitiveKind::Never,
        PrimitiveKind::BigInt,
    ];

    /// Spelling in TypeScript source.
    pub fn surface_name(self) -> &'static str {
        match self {
            PrimitiveKind::Number => "number",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::SByte => "sbyte",
            PrimitiveKind::UInt => "uint",
            PrimitiveKind::ULong => "ulong",
            PrimitiveKind::UShort => "ushort",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::String => "string",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Void => "void",
            PrimitiveKind::Null => "null",
            PrimitiveKind::Undefined => "undefined",
            PrimitiveKind::Never => "never",
            PrimitiveKind::BigInt => "bigint",
        }
    }

    /// Platform type backing this primitive, if any.
    pub fn platform_name(self) -> Option<&'static str> {
        Some(match self {
            PrimitiveKind::Number => "System.Double",
            PrimitiveKind::Int => "System.Int32",
            PrimitiveKind::Long => "System.Int64",
            PrimitiveKind::Short => "System.Int16",
            PrimitiveKind::Byte => "System.Byte",
            PrimitiveKind::SByte => "System.SByte",
            PrimitiveKind::UInt => "System.UInt32",
            PrimitiveKind::ULong => "System.UInt64",
            PrimitiveKind::UShort => "System.UInt16",
            PrimitiveKind::Float => "System.Single",
            PrimitiveKind::Decimal => "System.Decimal",
            PrimitiveKind::String => "System.String",
            PrimitiveKind::Char => "System.Char",
            PrimitiveKind::Boolean => "System.Boolean",
            PrimitiveKind::Void => "System.Void",
            PrimitiveKind::BigInt => "System.Numerics.BigInteger",
            PrimitiveKind::Null | PrimitiveKind::Undefined | PrimitiveKind::Never => return None,
        })
    }

    /// Extra spellings that name this primitive (C# keywords and aliases).
    pub fn keyword_aliases(self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::Number => &["number", "double"],
            PrimitiveKind::Boolean => &["boolean", "bool"],
            _ => &[],
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Number
                | PrimitiveKind::Int
                | PrimitiveKind::Long
                | PrimitiveKind::Short
                | PrimitiveKind::Byte
                | PrimitiveKind::SByte
                | PrimitiveKind::UInt
                | PrimitiveKind::ULong
                | PrimitiveKind::UShort
                | PrimitiveKind::Float
                | PrimitiveKind::Decimal
                | PrimitiveKind::BigInt
        )
    }

    pub fn is_integral(self) -> bool {
        self.is_numeric()
            && !matches!(
                self,
                PrimitiveKind::Number | PrimitiveKind::Float | PrimitiveKind::Decimal
            )
    }

    pub fn is_nullish(self) -> bool {
        matches!(self, PrimitiveKind::Null | PrimitiveKind::Undefined)
    }

    /// Whether the platform converts `self` to `to` implicitly.
    pub fn widens_to(self, to: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == to {
            return true;
        }
        match self {
            SByte => matches!(to, Short | Int | Long | Float | Number | Decimal),
            Byte => matches!(to, Short | UShort | Int | UInt | Long | ULong | Float | Number | Decimal),
            Short => matches!(to, Int | Long | Float | Number | Decimal),
            UShort => matches!(to, Int | UInt | Long | ULong | Float | Number | Decimal),
            Int => matches!(to, Long | Float | Number | Decimal),
            UInt => matches!(to, Long | ULong | Float | Number | Decimal),
            Long | ULong => matches!(to, Float | Number | Decimal),
            Char => matches!(to, UShort | Int | UInt | Long | ULong | Float | Number | Decimal),
            Float => matches!(to, Number),
            _ => false,
        }
    }

    /// Rank used to pick the wider of two numeric kinds.
    fn numeric_rank(self) -> u8 {
        match self {
            PrimitiveKind::SByte | PrimitiveKind::Byte => 1,
            PrimitiveKind::Short | PrimitiveKind::UShort => 2,
            PrimitiveKind::Int | PrimitiveKind::UInt => 3,
            PrimitiveKind::Long | PrimitiveKind::ULong => 4,
            PrimitiveKind::BigInt => 5,
            PrimitiveKind::Float => 6,
            PrimitiveKind::Decimal => 7,
            PrimitiveKind::Number => 8,
            _ => 0,
        }
    }

    /// Result kind of arithmetic between two numeric kinds.
    pub fn arithmetic_result(self, other: PrimitiveKind) -> PrimitiveKind {
        // Sub-int operands promote to int on the platform.
        let promote = |k: PrimitiveKind| {
            if k.numeric_rank() < 3 { PrimitiveKind::Int } else { k }
        };
        let (a, b) = (promote(self), promote(other));
        if a == b {
            a
        } else if a.numeric_rank() >= b.numeric_rank() {
            a
        } else {
            b
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    String(String),
    /// Raw numeric text.
    Number(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyShape {
    pub name: String,
    pub ty: IrType,
    pub optional: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectShape {
    pub properties: Vec<PropertyShape>,
}

impl ObjectShape {
    pub fn property(&self, name: &str) -> Option<&PropertyShape> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParam {
    pub name: String,
    pub ty: IrType,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionShape {
    pub params: Vec<FunctionParam>,
    pub ret: IrType,
    pub is_async: bool,
}

/// Every type the IR can carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IrType {
    Primitive(PrimitiveKind),
    Reference { id: TypeId, args: Vec<IrType> },
    Array(Box<IrType>),
    /// `rest` holds the element type of a trailing `...T[]`.
    Tuple {
        elements: Vec<IrType>,
        rest: Option<Box<IrType>>,
    },
    Union(Vec<IrType>),
    Dictionary { key: Box<IrType>, value: Box<IrType> },
    Object(ObjectShape),
    Function(Box<FunctionShape>),
    TypeParameter(Arc<str>),
    Literal(LiteralValue),
    Any,
    Unknown,
}

impl IrType {
    pub fn number() -> Self {
        IrType::Primitive(PrimitiveKind::Number)
    }

    pub fn string() -> Self {
        IrType::Primitive(PrimitiveKind::String)
    }

    pub fn boolean() -> Self {
        IrType::Primitive(PrimitiveKind::Boolean)
    }

    pub fn void() -> Self {
        IrType::Primitive(PrimitiveKind::Void)
    }

    pub fn null() -> Self {
        IrType::Primitive(PrimitiveKind::Null)
    }

    pub fn reference(id: TypeId) -> Self {
        IrType::Reference {
            id,
            args: Vec::new(),
        }
    }

    pub fn type_param(name: &str) -> Self {
        IrType::TypeParameter(Arc::from(name))
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            IrType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_primitive(&self, kind: PrimitiveKind) -> bool {
        self.as_primitive() == Some(kind)
    }

    pub fn is_numeric(&self) -> bool {
        match self {
            IrType::Primitive(kind) => kind.is_numeric(),
            IrType::Literal(LiteralValue::Number(_)) => true,
            _ => false,
        }
    }

    pub fn is_stringish(&self) -> bool {
        matches!(
            self,
            IrType::Primitive(PrimitiveKind::String) | IrType::Literal(LiteralValue::String(_))
        )
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, IrType::Primitive(kind) if kind.is_nullish())
    }

    pub fn is_void(&self) -> bool {
        self.is_primitive(PrimitiveKind::Void)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, IrType::Unknown)
    }

    /// Whether `null` is a member of this type.
    pub fn is_nullable(&self) -> bool {
        match self {
            IrType::Union(members) => members.iter().any(IrType::is_nullish),
            other => other.is_nullish(),
        }
    }

    /// The type with `null` and `undefined` removed.
    pub fn non_null(&self) -> IrType {
        match self {
            IrType::Union(members) => {
                let kept: Vec<IrType> = members.iter().filter(|m| !m.is_nullish()).cloned().collect();
                IrType::union(kept)
            }
            other => other.clone(),
        }
    }

    /// `T | null`.
    pub fn nullable(self) -> IrType {
        if self.is_nullable() {
            return self;
        }
        IrType::union(vec![self, IrType::null()])
    }

    /// Widen a literal type to its primitive.
    pub fn widen_literal(&self) -> IrType {
        match self {
            IrType::Literal(LiteralValue::String(_)) => IrType::string(),
            IrType::Literal(LiteralValue::Number(_)) => IrType::number(),
            IrType::Literal(LiteralValue::Boolean(_)) => IrType::boolean(),
            other => other.clone(),
        }
    }

    /// Build a flattened, deduplicated union. `never` members drop out and a
    /// single remaining member is returned as is.
    pub fn union(members: Vec<IrType>) -> IrType {
        let mut flat: Vec<IrType> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut stack: Vec<IrType> = members.into_iter().rev().collect();
        while let Some(member) = stack.pop() {
            match member {
                IrType::Union(inner) => stack.extend(inner.into_iter().rev()),
                IrType::Primitive(PrimitiveKind::Never) => {}
                other => {
                    let key = other.canonical();
                    if !seen.contains(&key) {
                        seen.push(key);
                        flat.push(other);
                    }
                }
            }
        }
        match flat.len() {
            0 => IrType::Primitive(PrimitiveKind::Never),
            1 => flat.pop().unwrap_or(IrType::Unknown),
            _ => IrType::Union(flat),
        }
    }

    /// Join of two branch types (conditional, `||`).
    pub fn join(a: &IrType, b: &IrType) -> IrType {
        if a.canonical() == b.canonical() {
            return a.clone();
        }
        match (a.widen_literal(), b.widen_literal()) {
            (IrType::Primitive(x), IrType::Primitive(y)) if x.is_numeric() && y.is_numeric() => {
                IrType::Primitive(x.arithmetic_result(y))
            }
            (x, y) if x.canonical() == y.canonical() => x,
            (x, y) => IrType::union(vec![x, y]),
        }
    }

    /// Replace type parameters by name.
    pub fn substitute(&self, map: &HashMap<Arc<str>, IrType>) -> IrType {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            IrType::TypeParameter(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            IrType::Reference { id, args } => IrType::Reference {
                id: id.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            IrType::Array(elem) => IrType::Array(Box::new(elem.substitute(map))),
            IrType::Tuple { elements, rest } => IrType::Tuple {
                elements: elements.iter().map(|e| e.substitute(map)).collect(),
                rest: rest.as_ref().map(|r| Box::new(r.substitute(map))),
            },
            IrType::Union(members) => IrType::union(members.iter().map(|m| m.substitute(map)).collect()),
            IrType::Dictionary { key, value } => IrType::Dictionary {
                key: Box::new(key.substitute(map)),
                value: Box::new(value.substitute(map)),
            },
            IrType::Object(shape) => IrType::Object(ObjectShape {
                properties: shape
                    .properties
                    .iter()
                    .map(|p| PropertyShape {
                        ty: p.ty.substitute(map),
                        ..p.clone()
                    })
                    .collect(),
            }),
            IrType::Function(shape) => IrType::Function(Box::new(FunctionShape {
                params: shape
                    .params
                    .iter()
                    .map(|p| FunctionParam {
                        ty: p.ty.substitute(map),
                        ..p.clone()
                    })
                    .collect(),
                ret: shape.ret.substitute(map),
                is_async: shape.is_async,
            })),
            other => other.clone(),
        }
    }

    /// Whether any type parameter occurs in this type.
    pub fn has_type_parameters(&self) -> bool {
        match self {
            IrType::TypeParameter(_) => true,
            IrType::Reference { args, .. } => args.iter().any(IrType::has_type_parameters),
            IrType::Array(elem) => elem.has_type_parameters(),
            IrType::Tuple { elements, rest } => {
                elements.iter().any(IrType::has_type_parameters)
                    || rest.as_ref().is_some_and(|r| r.has_type_parameters())
            }
            IrType::Union(members) => members.iter().any(IrType::has_type_parameters),
            IrType::Dictionary { key, value } => key.has_type_parameters() || value.has_type_parameters(),
            IrType::Object(shape) => shape.properties.iter().any(|p| p.ty.has_type_parameters()),
            IrType::Function(shape) => {
                shape.ret.has_type_parameters() || shape.params.iter().any(|p| p.ty.has_type_parameters())
            }
            _ => false,
        }
    }

    /// Canonical string used for identity comparisons (overload matching,
    /// union deduplication, shape hashing). Primitives use their platform
    /// names so that `number` and `System.Double` compare equal.
    pub fn canonical(&self) -> String {
        match self {
            IrType::Primitive(kind) => kind
                .platform_name()
                .unwrap_or(kind.surface_name())
                .to_string(),
            IrType::Reference { id, args } => {
                if args.is_empty() {
                    id.platform_name.to_string()
                } else {
                    let args: Vec<String> = args.iter().map(IrType::canonical).collect();
                    format!("{}<{}>", id.platform_name, args.join(","))
                }
            }
            IrType::Array(elem) => format!("{}[]", elem.canonical()),
            IrType::Tuple { elements, rest } => {
                let mut parts: Vec<String> = elements.iter().map(IrType::canonical).collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}[]", rest.canonical()));
                }
                format!("[{}]", parts.join(","))
            }
            IrType::Union(members) => {
                let mut parts: Vec<String> = members.iter().map(IrType::canonical).collect();
                parts.sort();
                parts.join("|")
            }
            IrType::Dictionary { key, value } => {
                format!("{{[{}]:{}}}", key.canonical(), value.canonical())
            }
            IrType::Object(shape) => {
                let parts: Vec<String> = shape
                    .properties
                    .iter()
                    .map(|p| {
                        format!(
                            "{}{}{}:{}",
                            if p.readonly { "readonly " } else { "" },
                            p.name,
                            if p.optional { "?" } else { "" },
                            p.ty.canonical()
                        )
                    })
                    .collect();
                format!("{{{}}}", parts.join(";"))
            }
            IrType::Function(shape) => {
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .map(|p| format!("{}{}", if p.rest { "..." } else { "" }, p.ty.canonical()))
                    .collect();
                format!("({})=>{}", params.join(","), shape.ret.canonical())
            }
            IrType::TypeParameter(name) => format!("'{}", name),
            IrType::Literal(LiteralValue::String(s)) => format!("{:?}", s),
            IrType::Literal(LiteralValue::Number(n)) => n.clone(),
            IrType::Literal(LiteralValue::Boolean(b)) => b.to_string(),
            IrType::Any => "any".to_string(),
            IrType::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Primitive(kind) => f.write_str(kind.surface_name()),
            IrType::Reference { id, args } => {
                f.write_str(&id.surface_name)?;
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            IrType::Array(elem) => write!(f, "{}[]", elem),
            IrType::Tuple { elements, rest } => {
                let mut parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}[]", rest));
                }
                write!(f, "[{}]", parts.join(", "))
            }
            IrType::Union(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                f.write_str(&parts.join(" | "))
            }
            IrType::Dictionary { key, value } => write!(f, "{{ [key: {}]: {} }}", key, value),
            IrType::Object(shape) => {
                let parts: Vec<String> = shape
                    .properties
                    .iter()
                    .map(|p| format!("{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.ty))
                    .collect();
                write!(f, "{{ {} }}", parts.join("; "))
            }
            IrType::Function(shape) => {
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", p.name, p.ty))
                    .collect();
                write!(f, "({}) => {}", params.join(", "), shape.ret)
            }
            IrType::TypeParameter(name) => f.write_str(name),
            IrType::Literal(LiteralValue::String(s)) => write!(f, "{:?}", s),
            IrType::Literal(LiteralValue::Number(n)) => f.write_str(n),
            IrType::Literal(LiteralValue::Boolean(b)) => write!(f, "{}", b),
            IrType::Any => f.write_str("any"),
            IrType::Unknown => f.write_str("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flattens_and_dedups() {
        let u = IrType::union(vec![
            IrType::string(),
            IrType::Union(vec![IrType::number(), IrType::string()]),
            IrType::Primitive(PrimitiveKind::Never),
        ]);
        assert_eq!(u, IrType::Union(vec![IrType::string(), IrType::number()]));
        assert_eq!(IrType::union(vec![IrType::string()]), IrType::string());
    }

    #[test]
    fn test_nullable_is_idempotent() {
        let t = IrType::string().nullable().nullable();
        assert_eq!(t, IrType::Union(vec![IrType::string(), IrType::null()]));
        assert_eq!(t.non_null(), IrType::string());
    }

    #[test]
    fn test_canonical_uses_platform_names() {
        assert_eq!(IrType::number().canonical(), "System.Double");
        assert_eq!(
            IrType::Array(Box::new(IrType::Primitive(PrimitiveKind::Int))).canonical(),
            "System.Int32[]"
        );
    }

    #[test]
    fn test_numeric_widening() {
        assert!(PrimitiveKind::Int.widens_to(PrimitiveKind::Long));
        assert!(PrimitiveKind::Int.widens_to(PrimitiveKind::Number));
        assert!(!PrimitiveKind::Number.widens_to(PrimitiveKind::Int));
        assert!(!PrimitiveKind::Long.widens_to(PrimitiveKind::Int));
        assert_eq!(
            PrimitiveKind::Int.arithmetic_result(PrimitiveKind::Number),
            PrimitiveKind::Number
        );
        assert_eq!(
            PrimitiveKind::Byte.arithmetic_result(PrimitiveKind::Byte),
            PrimitiveKind::Int
        );
    }

    #[test]
    fn test_join_of_literals_widens() {
        let a = IrType::Literal(LiteralValue::String("a".into()));
        let b = IrType::Literal(LiteralValue::String("b".into()));
        assert_eq!(IrType::join(&a, &b), IrType::string());
    }

    #[test]
    fn test_substitute() {
        let mut map = HashMap::new();
        map.insert(Arc::from("T"), IrType::string());
        let t = IrType::Array(Box::new(IrType::type_param("T")));
        assert_eq!(t.substitute(&map), IrType::Array(Box::new(IrType::string())));
        assert!(t.has_type_parameters());
    }
}
