//! IR types to C# types, with structural erasure.

use crate::context::EmitterContext;
use crate::cs::{CsExpr, CsMember, CsProperty, CsType};
use crate::emitter::ModuleEmitter;
use crate::error::Ice;
use crate::naming::escape_identifier;
use tsharp_catalog::convert::{DICTIONARY, TASK, TASK_OF};
use tsharp_catalog::{
    EnumRepr, FunctionShape, IrType, LiteralValue, NominalKind, ObjectShape, PrimitiveKind, SELF_TYPE_PARAM,
    is_valid_dictionary_key,
};

/// Namespace of the runtime types in the catalog; emitted under the
/// configured runtime namespace.
const CATALOG_RUNTIME: &str = "Tsharp.Runtime";

pub fn primitive_type(kind: PrimitiveKind) -> CsType {
    match kind {
        PrimitiveKind::Number => CsType::Keyword("double"),
        PrimitiveKind::Int => CsType::Keyword("int"),
        PrimitiveKind::Long => CsType::Keyword("long"),
        PrimitiveKind::Short => CsType::Keyword("short"),
        PrimitiveKind::Byte => CsType::Keyword("byte"),
        PrimitiveKind::SByte => CsType::Keyword("sbyte"),
        PrimitiveKind::UInt => CsType::Keyword("uint"),
        PrimitiveKind::ULong => CsType::Keyword("ulong"),
        PrimitiveKind::UShort => CsType::Keyword("ushort"),
        PrimitiveKind::Float => CsType::Keyword("float"),
        PrimitiveKind::Decimal => CsType::Keyword("decimal"),
        PrimitiveKind::String => CsType::Keyword("string"),
        PrimitiveKind::Char => CsType::Keyword("char"),
        PrimitiveKind::Boolean => CsType::Keyword("bool"),
        PrimitiveKind::Void => CsType::void(),
        PrimitiveKind::Null | PrimitiveKind::Undefined | PrimitiveKind::Never => CsType::object().nullable(),
        PrimitiveKind::BigInt => CsType::named("global::System.Numerics.BigInteger"),
    }
}

fn is_nullish(ty: &IrType) -> bool {
    ty.is_nullish() || ty.is_void()
}

/// The primitive every member of a literal union widens to, if they agree.
fn literal_collapse(members: &[&IrType]) -> Option<PrimitiveKind> {
    let mut kind = None;
    let mut saw_literal = false;
    for member in members {
        saw_literal |= matches!(member, IrType::Literal(_));
        let widened = match member {
            IrType::Literal(LiteralValue::String(_)) => PrimitiveKind::String,
            IrType::Literal(LiteralValue::Number(_)) => PrimitiveKind::Number,
            IrType::Literal(LiteralValue::Boolean(_)) => PrimitiveKind::Boolean,
            IrType::Primitive(p) => *p,
            _ => return None,
        };
        match kind {
            None => kind = Some(widened),
            Some(k) if k == widened => {}
            Some(_) => return None,
        }
    }
    kind.filter(|_| saw_literal)
}

impl ModuleEmitter<'_> {
    pub fn cs_type(&mut self, ty: &IrType, ctx: &EmitterContext) -> Result<CsType, Ice> {
        Ok(match ty {
            IrType::Primitive(kind) => primitive_type(*kind),
            IrType::Reference { id, args } => {
                if let Some(kind) = self.universe.primitive_of(id) {
                    return Ok(primitive_type(kind));
                }
                if id.platform_name.as_ref() == tsharp_catalog::universe::OBJECT_TYPE {
                    return Ok(CsType::object());
                }
                if let Some(entry) = self.universe.entry(id)
                    && entry.kind == NominalKind::Enum
                    && entry.enum_repr == Some(EnumRepr::String)
                {
                    return Ok(CsType::Keyword("string"));
                }
                let namespace = match id.namespace() {
                    CATALOG_RUNTIME => self.options.runtime_namespace.as_str(),
                    other => other,
                };
                let name = self.qualify(namespace, id.simple_name());
                let args = args
                    .iter()
                    .map(|a| self.type_arg(a, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                CsType::generic(name, args)
            }
            IrType::Array(elem) => CsType::Array(Box::new(self.type_arg(elem, ctx)?)),
            IrType::Tuple { elements, rest } => self.tuple_type(elements, rest.as_deref(), ctx)?,
            IrType::Union(members) => self.union_type(members, ctx)?,
            IrType::Dictionary { key, value } => {
                if !is_valid_dictionary_key(key) {
                    return Err(Ice::InvalidDictionaryKey { key: key.to_string() });
                }
                let key = self.cs_type(key, ctx)?;
                let value = self.type_arg(value, ctx)?;
                CsType::generic(dictionary_name(), vec![key, value])
            }
            IrType::Object(shape) => self.shape_type(shape, ctx)?,
            IrType::Function(shape) => self.delegate_type(shape, ctx)?,
            IrType::TypeParameter(name) => {
                if name.as_ref() == SELF_TYPE_PARAM
                    && !ctx.has_type_param(name)
                    && let Some(self_type) = &ctx.self_type
                {
                    return Ok(self_type.clone());
                }
                CsType::named(escape_identifier(name))
            }
            IrType::Literal(_) => return self.cs_type(&ty.widen_literal(), ctx),
            IrType::Any => CsType::Keyword("dynamic"),
            IrType::Unknown => CsType::object(),
        })
    }

    /// A type in type-argument or element position, where `void` is not
    /// allowed.
    pub fn type_arg(&mut self, ty: &IrType, ctx: &EmitterContext) -> Result<CsType, Ice> {
        let lowered = self.cs_type(ty, ctx)?;
        Ok(if lowered.is_void() { CsType::object().nullable() } else { lowered })
    }

    /// Fixed elements become a value tuple; a trailing rest becomes one
    /// more array-typed element.
    fn tuple_type(&mut self, elements: &[IrType], rest: Option<&IrType>, ctx: &EmitterContext) -> Result<CsType, Ice> {
        let mut items = elements
            .iter()
            .map(|e| self.type_arg(e, ctx))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(rest) = rest {
            let rest = CsType::Array(Box::new(self.type_arg(rest, ctx)?));
            if items.is_empty() {
                return Ok(rest);
            }
            items.push(rest);
        }
        Ok(match items.len() {
            0 => CsType::named("global::System.ValueTuple"),
            1 => CsType::generic("global::System.ValueTuple", items),
            _ => CsType::Tuple(items),
        })
    }

    fn union_type(&mut self, members: &[IrType], ctx: &EmitterContext) -> Result<CsType, Ice> {
        let nullable = members.iter().any(is_nullish);
        let kept: Vec<&IrType> = members.iter().filter(|m| !is_nullish(m)).collect();
        let wrap = |ty: CsType| if nullable { ty.nullable() } else { ty };

        if kept.is_empty() {
            return Ok(CsType::object().nullable());
        }
        if let Some(kind) = literal_collapse(&kept) {
            return Ok(wrap(primitive_type(kind)));
        }
        let mut lowered: Vec<CsType> = Vec::with_capacity(kept.len());
        for member in kept {
            let ty = self.type_arg(&member.widen_literal(), ctx)?;
            let ty = ty.non_nullable().clone();
            if !lowered.contains(&ty) {
                lowered.push(ty);
            }
        }
        Ok(match lowered.len() {
            1 => wrap(lowered.remove(0)),
            n if n <= self.options.max_union_arity => {
                let name = format!("global::{}.Union", self.options.runtime_namespace);
                wrap(CsType::generic(name, lowered))
            }
            _ => wrap(CsType::object()),
        })
    }

    /// The sealed class standing in for `shape`, registering it on first
    /// use.
    fn shape_type(&mut self, shape: &ObjectShape, ctx: &EmitterContext) -> Result<CsType, Ice> {
        if shape.properties.is_empty() {
            return Ok(CsType::object());
        }
        let namespace = self.module.namespace.clone();
        if let Some(name) = self.shapes.lookup(shape) {
            return Ok(CsType::named(self.qualify(&namespace, name)));
        }
        let mut members = Vec::with_capacity(shape.properties.len());
        for prop in &shape.properties {
            let ty = self.type_arg(&prop.ty, ctx)?;
            let ty = if prop.optional { ty.nullable() } else { ty };
            members.push(CsMember::Property(data_property(ty, &prop.name, prop.readonly)));
        }
        let name = self.shapes.insert(shape, members);
        Ok(CsType::named(self.qualify(&namespace, &name)))
    }

    /// `Func<...>` or `Action<...>`.
    fn delegate_type(&mut self, shape: &FunctionShape, ctx: &EmitterContext) -> Result<CsType, Ice> {
        let mut args = Vec::with_capacity(shape.params.len() + 1);
        for param in &shape.params {
            let ty = self.type_arg(&param.ty, ctx)?;
            args.push(if param.optional { ty.nullable() } else { ty });
        }
        let ret = if shape.is_async && !is_task(&shape.ret) {
            if shape.ret.is_void() {
                CsType::named(format!("global::{}", TASK))
            } else {
                let inner = self.type_arg(&shape.ret, ctx)?;
                CsType::generic(format!("global::{}", TASK), vec![inner])
            }
        } else {
            self.cs_type(&shape.ret, ctx)?
        };
        if ret.is_void() {
            if args.is_empty() {
                return Ok(CsType::named("global::System.Action"));
            }
            return Ok(CsType::generic("global::System.Action", args));
        }
        args.push(ret);
        Ok(CsType::generic("global::System.Func", args))
    }

    /// Whether values of `ty` are .NET value types.
    pub fn is_value_type(&self, ty: &IrType) -> bool {
        match ty {
            IrType::Primitive(kind) => !matches!(
                kind,
                PrimitiveKind::String
                    | PrimitiveKind::Null
                    | PrimitiveKind::Undefined
                    | PrimitiveKind::Never
                    | PrimitiveKind::Void
            ),
            IrType::Literal(LiteralValue::Number(_) | LiteralValue::Boolean(_)) => true,
            IrType::Tuple { elements, rest } => !(elements.is_empty() && rest.is_some()),
            IrType::Reference { id, .. } => {
                self.universe.primitive_of(id).is_some_and(|k| k != PrimitiveKind::String)
                    || self
                        .universe
                        .entry(id)
                        .is_some_and(|e| e.is_value_type && e.enum_repr != Some(EnumRepr::String))
            }
            _ => false,
        }
    }
}

fn dictionary_name() -> String {
    let (name, _) = DICTIONARY.split_once('`').unwrap_or((DICTIONARY, ""));
    format!("global::{}", name)
}

fn is_task(ty: &IrType) -> bool {
    matches!(ty, IrType::Reference { id, .. } if id.platform_name.as_ref() == TASK || id.platform_name.as_ref() == TASK_OF)
}

/// `public T Name { get; set; }`, initialized with `default!` when `T`
/// does not admit null.
pub(crate) fn data_property(ty: CsType, name: &str, readonly: bool) -> CsProperty {
    let init = needs_default(&ty).then(|| CsExpr::NullForgiving(Box::new(CsExpr::Default(None))));
    let mut prop = CsProperty::auto(vec!["public"], ty, escape_identifier(name));
    prop.init_only = readonly;
    prop.init = init;
    prop
}

/// Non-nullable reference types need an initializer to satisfy nullable
/// analysis.
pub(crate) fn needs_default(ty: &CsType) -> bool {
    match ty {
        CsType::Keyword(k) => matches!(*k, "string" | "object"),
        CsType::Nullable(_) | CsType::Tuple(_) => false,
        CsType::Named { .. } | CsType::Array(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EmitOptions;
    use crate::emitter::ProgramIndex;
    use tsharp_catalog::{CatalogOptions, PropertyShape, Universe};
    use tsharp_ir::IrModule;
    use tsharp_syntax::Diagnostics;

    fn lower(ty: &IrType) -> Result<String, Ice> {
        let mut diags = Diagnostics::new();
        let universe = Universe::platform(&CatalogOptions::default(), &mut diags);
        let options = EmitOptions::default();
        let module = IrModule {
            path: "main.ts".to_string(),
            namespace: "App".to_string(),
            container: "main".to_string(),
            declarations: Vec::new(),
            top_level: Vec::new(),
            is_entry: true,
            top_level_async: false,
        };
        let program = ProgramIndex::build(std::slice::from_ref(&module));
        let mut emitter = ModuleEmitter::new(&universe, &options, &program, &module);
        emitter
            .cs_type(ty, &EmitterContext::new())
            .map(|t| t.to_string())
    }

    fn lit(s: &str) -> IrType {
        IrType::Literal(LiteralValue::String(s.to_string()))
    }

    #[test]
    fn test_single_nullable_wrapping() {
        let ty = IrType::Union(vec![IrType::string(), IrType::null(), IrType::Primitive(PrimitiveKind::Undefined)]);
        assert_eq!(lower(&ty).unwrap(), "string?");
        let nested = IrType::Union(vec![
            IrType::Union(vec![IrType::number(), IrType::null()]),
            IrType::Primitive(PrimitiveKind::Undefined),
        ]);
        assert_eq!(lower(&nested).unwrap(), "double?");
    }

    #[test]
    fn test_literal_union_collapses() {
        let ty = IrType::Union(vec![lit("a"), lit("b"), lit("c")]);
        assert_eq!(lower(&ty).unwrap(), "string");
        let with_null = IrType::Union(vec![lit("a"), lit("b"), IrType::null()]);
        assert_eq!(lower(&with_null).unwrap(), "string?");
        let mixed = IrType::Union(vec![lit("a"), IrType::Literal(LiteralValue::Number("1".into()))]);
        assert_eq!(lower(&mixed).unwrap(), "global::Tsharp.Runtime.Union<string, double>");
    }

    #[test]
    fn test_wide_unions_erase_to_object() {
        let members: Vec<IrType> = [
            PrimitiveKind::Number,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Short,
            PrimitiveKind::Byte,
            PrimitiveKind::String,
            PrimitiveKind::Char,
            PrimitiveKind::Boolean,
            PrimitiveKind::Decimal,
        ]
        .into_iter()
        .map(IrType::Primitive)
        .collect();
        assert_eq!(lower(&IrType::Union(members.clone())).unwrap(), "object");
        assert_eq!(
            lower(&IrType::Union(members[..8].to_vec())).unwrap(),
            "global::Tsharp.Runtime.Union<double, int, long, short, byte, string, char, bool>"
        );
    }

    #[test]
    fn test_dictionary_lowering() {
        let ty = IrType::Dictionary {
            key: Box::new(IrType::string()),
            value: Box::new(IrType::number()),
        };
        assert_eq!(
            lower(&ty).unwrap(),
            "global::System.Collections.Generic.Dictionary<string, double>"
        );
        let bad = IrType::Dictionary {
            key: Box::new(IrType::boolean()),
            value: Box::new(IrType::number()),
        };
        assert_eq!(lower(&bad), Err(Ice::InvalidDictionaryKey { key: "boolean".to_string() }));
    }

    #[test]
    fn test_tuple_with_rest() {
        let ty = IrType::Tuple {
            elements: vec![IrType::string(), IrType::number()],
            rest: Some(Box::new(IrType::boolean())),
        };
        assert_eq!(lower(&ty).unwrap(), "(string, double, bool[])");
        let pure = IrType::Tuple {
            elements: Vec::new(),
            rest: Some(Box::new(IrType::boolean())),
        };
        assert_eq!(lower(&pure).unwrap(), "bool[]");
    }

    #[test]
    fn test_object_shape_becomes_named_class() {
        let shape = ObjectShape {
            properties: vec![PropertyShape {
                name: "id".to_string(),
                ty: IrType::number(),
                optional: false,
                readonly: false,
            }],
        };
        let name = lower(&IrType::Object(shape)).unwrap();
        assert!(name.starts_with("global::App.Shape_"), "{}", name);
    }

    #[test]
    fn test_function_types() {
        let shape = FunctionShape {
            params: vec![tsharp_catalog::FunctionParam {
                name: "x".to_string(),
                ty: IrType::number(),
                optional: false,
                rest: false,
            }],
            ret: IrType::void(),
            is_async: false,
        };
        assert_eq!(lower(&IrType::Function(Box::new(shape))).unwrap(), "global::System.Action<double>");
    }
}
