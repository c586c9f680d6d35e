//! Type annotation syntax to [`IrType`].
//!
//! Names resolve in a fixed order: type parameters in scope, bindings
//! (source declarations, aliases and platform imports), TypeScript library
//! names with a fixed platform mapping, and finally the alias table.

use crate::entry::{ParamEntry, PassingMode, SignatureEntry, TypeParamEntry};
use crate::types::{
    FunctionParam, FunctionShape, IrType, LiteralValue, ObjectShape, PrimitiveKind, PropertyShape,
};
use crate::universe::Universe;
use std::collections::HashMap;
use std::sync::Arc;
use tsharp_binding::{Bindings, DeclId, DeclKind, ModuleId, Signature};
use tsharp_syntax::ast::{
    LiteralType, Param, TypeKeyword, TypeKind, TypeMember, TypeMemberKind, TypeNode, TypeParam,
};
use tsharp_syntax::{Diagnostic, Diagnostics, Span, codes};

pub const TASK: &str = "System.Threading.Tasks.Task";
pub const TASK_OF: &str = "System.Threading.Tasks.Task`1";
pub const DICTIONARY: &str = "System.Collections.Generic.Dictionary`2";
pub const HASH_SET: &str = "System.Collections.Generic.HashSet`1";
pub const ENUMERABLE: &str = "System.Collections.Generic.IEnumerable`1";
pub const EXCEPTION: &str = "System.Exception";
pub const GENERATOR: &str = "Tsharp.Runtime.Generator`3";
pub const ASYNC_GENERATOR: &str = "Tsharp.Runtime.AsyncGenerator`3";

/// Name of the receiver type parameter that stands for `this` types.
pub const SELF_TYPE_PARAM: &str = "TSelf";

pub struct TypeConverter<'a> {
    universe: &'a Universe,
    bindings: &'a Bindings,
    module: ModuleId,
    type_params: Vec<String>,
    expanding: Vec<DeclId>,
}

impl<'a> TypeConverter<'a> {
    pub fn new(universe: &'a Universe, bindings: &'a Bindings, module: ModuleId) -> Self {
        Self {
            universe,
            bindings,
            module,
            type_params: Vec::new(),
            expanding: Vec::new(),
        }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Bring type parameter names into scope. Returns how many were pushed,
    /// for [`TypeConverter::pop_type_params`].
    pub fn push_type_params<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.type_params.len();
        self.type_params.extend(names.into_iter().map(Into::into));
        self.type_params.len() - before
    }

    pub fn pop_type_params(&mut self, count: usize) {
        let keep = self.type_params.len().saturating_sub(count);
        self.type_params.truncate(keep);
    }

    pub fn has_type_param(&self, name: &str) -> bool {
        self.type_params.iter().any(|p| p == name)
    }

    fn file(&self) -> &str {
        &self.bindings.module(self.module).path
    }

    fn error(&self, diags: &mut Diagnostics, code: &'static str, span: Span, message: String) {
        diags.push(Diagnostic::error(code, message).at(self.file(), span));
    }

    /// Convert an optional annotation, using `default` when absent.
    pub fn convert_or(&mut self, node: Option<&TypeNode>, default: IrType, diags: &mut Diagnostics) -> IrType {
        match node {
            Some(node) => self.convert(node, diags),
            None => default,
        }
    }

    pub fn convert(&mut self, node: &TypeNode, diags: &mut Diagnostics) -> IrType {
        match &node.kind {
            TypeKind::Keyword(keyword) => self.keyword(*keyword, node.span, diags),
            TypeKind::Reference { name, args } => self.reference(name, args, node.span, diags),
            TypeKind::Array(elem) => IrType::Array(Box::new(self.convert(elem, diags))),
            TypeKind::Tuple(elements) => {
                let mut fixed = Vec::new();
                let mut rest = None;
                for element in elements {
                    let ty = self.convert(&element.ty, diags);
                    if element.rest {
                        let elem = match ty {
                            IrType::Array(elem) => *elem,
                            other => other,
                        };
                        rest = Some(Box::new(elem));
                    } else if element.optional {
                        fixed.push(ty.nullable());
                    } else {
                        fixed.push(ty);
                    }
                }
                IrType::Tuple {
                    elements: fixed,
                    rest,
                }
            }
            TypeKind::Union(members) => {
                let members = members.iter().map(|m| self.convert(m, diags)).collect();
                IrType::union(members)
            }
            TypeKind::Intersection(members) => self.intersection(members, node.span, diags),
            TypeKind::Literal(literal) => IrType::Literal(match literal {
                LiteralType::String(s) => LiteralValue::String(s.clone()),
                LiteralType::Number(n) => LiteralValue::Number(n.clone()),
                LiteralType::Boolean(b) => LiteralValue::Boolean(*b),
            }),
            TypeKind::Object(members) => self.object(members, node.span, diags),
            TypeKind::Function {
                type_params,
                params,
                ret,
            } => {
                let pushed = self.push_type_params(type_params.iter().map(|p| p.name.clone()));
                let params = params
                    .iter()
                    .map(|p| self.function_param(p, diags))
                    .collect();
                let ret = self.convert(ret, diags);
                self.pop_type_params(pushed);
                IrType::Function(Box::new(FunctionShape {
                    params,
                    ret,
                    is_async: false,
                }))
            }
            TypeKind::This => IrType::type_param(SELF_TYPE_PARAM),
            TypeKind::Unsupported(text) => {
                self.error(
                    diags,
                    codes::UNRESOLVED_TYPE,
                    node.span,
                    format!("unsupported type syntax `{}`", text),
                );
                IrType::Unknown
            }
        }
    }

    fn keyword(&mut self, keyword: TypeKeyword, span: Span, diags: &mut Diagnostics) -> IrType {
        match keyword {
            TypeKeyword::Any => IrType::Any,
            TypeKeyword::Unknown => IrType::Unknown,
            TypeKeyword::Number => IrType::number(),
            TypeKeyword::String => IrType::string(),
            TypeKeyword::Boolean => IrType::boolean(),
            TypeKeyword::Void => IrType::void(),
            TypeKeyword::Null => IrType::null(),
            TypeKeyword::Undefined => IrType::Primitive(PrimitiveKind::Undefined),
            TypeKeyword::Never => IrType::Primitive(PrimitiveKind::Never),
            TypeKeyword::BigInt => IrType::Primitive(PrimitiveKind::BigInt),
            TypeKeyword::Object => self.universe.object_type(),
            TypeKeyword::Symbol => {
                self.error(
                    diags,
                    codes::UNRESOLVED_TYPE,
                    span,
                    "type `symbol` has no platform equivalent".to_string(),
                );
                IrType::Unknown
            }
        }
    }

    fn reference(&mut self, name: &str, args: &[TypeNode], span: Span, diags: &mut Diagnostics) -> IrType {
        if args.is_empty() && self.has_type_param(name) {
            return IrType::type_param(name);
        }

        if let Some(ty) = self.bound_reference(name, args, span, diags) {
            return ty;
        }

        let converted: Vec<IrType> = args.iter().map(|a| self.convert(a, diags)).collect();
        if let Some(ty) = self.library_reference(name, &converted, span, diags) {
            return ty;
        }

        let resolved = if converted.is_empty() {
            self.universe.resolve_alias(name)
        } else {
            self.universe.resolve_with_arity(name, converted.len())
        };
        if let Some(id) = resolved {
            return self.universe.type_for(&id, converted);
        }
        if !converted.is_empty() && self.universe.resolve_alias(name).is_some() {
            self.error(
                diags,
                codes::TYPE_ARGUMENT_COUNT,
                span,
                format!("type `{}` does not take {} type arguments", name, converted.len()),
            );
            return IrType::Unknown;
        }

        if self.universe.is_stdlib_type_name(name) {
            self.error(
                diags,
                codes::MISSING_STDLIB_TYPE,
                span,
                format!("base library type `{}` is not in the catalog", name),
            );
        } else {
            self.error(
                diags,
                codes::UNRESOLVED_TYPE,
                span,
                format!("cannot find type `{}`", name),
            );
        }
        IrType::Unknown
    }

    /// Names that resolve through the module's bindings.
    fn bound_reference(
        &mut self,
        name: &str,
        args: &[TypeNode],
        span: Span,
        diags: &mut Diagnostics,
    ) -> Option<IrType> {
        if let Some(decl) = self.bindings.lookup_qualified_type(self.module, name) {
            return Some(self.declared_reference(decl, name, args, span, diags));
        }
        // `g.List<T>` through `import * as g from "@dotnet/..."`.
        let (head, rest) = name.split_once('.')?;
        let bindings = self.bindings;
        let head = bindings.lookup_value(self.module, head)?;
        let DeclKind::PlatformNamespace { namespace } = &bindings.decl(head).kind else {
            return None;
        };
        let qualified = format!("{}.{}", namespace, rest);
        Some(self.platform_reference(&qualified, args, span, diags))
    }

    fn declared_reference(
        &mut self,
        decl_id: DeclId,
        name: &str,
        args: &[TypeNode],
        span: Span,
        diags: &mut Diagnostics,
    ) -> IrType {
        let bindings = self.bindings;
        let decl = bindings.decl(decl_id);
        match &decl.kind {
            DeclKind::PlatformType { qualified } => {
                self.platform_reference(qualified, args, span, diags)
            }
            DeclKind::Error => IrType::Unknown,
            DeclKind::TypeAlias if self.universe.source_type(decl_id).is_none() => {
                self.expand_alias(decl_id, args, span, diags)
            }
            _ => {
                let Some(id) = self.universe.source_type(decl_id).cloned() else {
                    self.error(
                        diags,
                        codes::UNRESOLVED_TYPE,
                        span,
                        format!("`{}` is not a type", name),
                    );
                    return IrType::Unknown;
                };
                let expected = self
                    .universe
                    .entry(&id)
                    .map(|e| e.type_params.len())
                    .unwrap_or(0);
                if expected != args.len() {
                    self.error(
                        diags,
                        codes::TYPE_ARGUMENT_COUNT,
                        span,
                        format!(
                            "type `{}` expects {} type arguments, got {}",
                            name,
                            expected,
                            args.len()
                        ),
                    );
                    return IrType::Unknown;
                }
                let args = args.iter().map(|a| self.convert(a, diags)).collect();
                IrType::Reference { id, args }
            }
        }
    }

    fn platform_reference(
        &mut self,
        qualified: &str,
        args: &[TypeNode],
        span: Span,
        diags: &mut Diagnostics,
    ) -> IrType {
        let converted: Vec<IrType> = args.iter().map(|a| self.convert(a, diags)).collect();
        let resolved = if converted.is_empty() {
            self.universe.resolve_alias(qualified)
        } else {
            self.universe.resolve_with_arity(qualified, converted.len())
        };
        match resolved {
            Some(id) => self.universe.type_for(&id, converted),
            None => {
                let code = if self.universe.is_stdlib_type_name(qualified) {
                    codes::MISSING_STDLIB_TYPE
                } else {
                    codes::UNRESOLVED_TYPE
                };
                self.error(
                    diags,
                    code,
                    span,
                    format!("platform type `{}` is not in the catalog", qualified),
                );
                IrType::Unknown
            }
        }
    }

    /// Transparent alias: convert its body with the arguments substituted.
    fn expand_alias(
        &mut self,
        decl_id: DeclId,
        args: &[TypeNode],
        span: Span,
        diags: &mut Diagnostics,
    ) -> IrType {
        let bindings = self.bindings;
        let decl = bindings.decl(decl_id);
        if self.expanding.contains(&decl_id) {
            self.error(
                diags,
                codes::CIRCULAR_ALIAS,
                span,
                format!("type alias `{}` refers to itself", decl.name),
            );
            return IrType::Unknown;
        }
        let Some(body) = decl.type_syntax.map(|id| bindings.type_syntax(id)) else {
            return IrType::Unknown;
        };
        if decl.type_params.len() != args.len() {
            self.error(
                diags,
                codes::TYPE_ARGUMENT_COUNT,
                span,
                format!(
                    "type alias `{}` expects {} type arguments, got {}",
                    decl.name,
                    decl.type_params.len(),
                    args.len()
                ),
            );
            return IrType::Unknown;
        }

        let args: Vec<IrType> = args.iter().map(|a| self.convert(a, diags)).collect();
        let params = decl.type_params.clone();
        let home = decl.module.unwrap_or(self.module);

        // The body is converted in the alias's own module, with only its own
        // type parameters in scope.
        let saved_module = std::mem::replace(&mut self.module, home);
        let saved_params = std::mem::replace(&mut self.type_params, params.clone());
        self.expanding.push(decl_id);
        let expanded = self.convert(body, diags);
        self.expanding.pop();
        self.type_params = saved_params;
        self.module = saved_module;

        let map: HashMap<Arc<str>, IrType> = params
            .iter()
            .map(|p| Arc::from(p.as_str()))
            .zip(args)
            .collect();
        expanded.substitute(&map)
    }

    /// TypeScript library generics with a fixed platform mapping.
    fn library_reference(
        &mut self,
        name: &str,
        args: &[IrType],
        span: Span,
        diags: &mut Diagnostics,
    ) -> Option<IrType> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(IrType::Unknown);
        let ty = match (name, args.len()) {
            ("Array" | "ReadonlyArray", 1) => IrType::Array(Box::new(arg(0))),
            ("Record", 2) => self.dictionary(arg(0), arg(1), span, diags),
            ("Promise", 1) if arg(0).is_void() => self.universe.platform_reference(TASK, Vec::new()),
            ("Promise", 1) => self.universe.platform_reference(TASK_OF, vec![arg(0)]),
            ("Map" | "ReadonlyMap", 2) => {
                self.universe.platform_reference(DICTIONARY, vec![arg(0), arg(1)])
            }
            ("Set" | "ReadonlySet", 1) => self.universe.platform_reference(HASH_SET, vec![arg(0)]),
            ("Iterable", 1) => self.universe.platform_reference(ENUMERABLE, vec![arg(0)]),
            ("Generator" | "Iterator" | "IterableIterator", 0..=3) => {
                self.generator_type(GENERATOR, args)
            }
            ("AsyncGenerator" | "AsyncIterator" | "AsyncIterableIterator", 0..=3) => {
                self.generator_type(ASYNC_GENERATOR, args)
            }
            ("Error", 0) => self.universe.platform_reference(EXCEPTION, Vec::new()),
            ("Partial" | "Readonly" | "Required" | "NonNullable", 1) => {
                tracing::debug!(%name, "mapped type approximated by its argument");
                let inner = arg(0);
                if name == "NonNullable" { inner.non_null() } else { inner }
            }
            _ => return None,
        };
        Some(ty)
    }

    fn generator_type(&self, platform: &str, args: &[IrType]) -> IrType {
        let yield_ty = args.first().cloned().unwrap_or(IrType::Unknown);
        let return_ty = args.get(1).cloned().unwrap_or(IrType::void());
        let next_ty = args.get(2).cloned().unwrap_or(IrType::Unknown);
        self.universe
            .platform_reference(platform, vec![yield_ty, return_ty, next_ty])
    }

    /// A dictionary type after key validation; invalid keys give `Unknown`.
    pub fn dictionary(&mut self, key: IrType, value: IrType, span: Span, diags: &mut Diagnostics) -> IrType {
        if is_valid_dictionary_key(&key) {
            return IrType::Dictionary {
                key: Box::new(key),
                value: Box::new(value),
            };
        }
        self.error(
            diags,
            codes::UNSUPPORTED_KEY_TYPE,
            span,
            format!("`{}` cannot be used as a dictionary key; use string, number or object", key),
        );
        IrType::Unknown
    }

    fn intersection(&mut self, members: &[TypeNode], span: Span, diags: &mut Diagnostics) -> IrType {
        diags.push(
            Diagnostic::warning(
                codes::INTERSECTION_ERASED,
                "intersection type erased to its first member",
            )
            .at(self.file(), span),
        );
        let converted: Vec<IrType> = members.iter().map(|m| self.convert(m, diags)).collect();
        if converted.iter().all(|t| matches!(t, IrType::Object(_))) && !converted.is_empty() {
            let mut properties: Vec<PropertyShape> = Vec::new();
            for ty in converted {
                if let IrType::Object(shape) = ty {
                    for prop in shape.properties {
                        if !properties.iter().any(|p| p.name == prop.name) {
                            properties.push(prop);
                        }
                    }
                }
            }
            return IrType::Object(ObjectShape { properties });
        }
        converted.into_iter().next().unwrap_or(IrType::Unknown)
    }

    fn object(&mut self, members: &[TypeMember], span: Span, diags: &mut Diagnostics) -> IrType {
        // `{ [key: string]: V }` alone is a dictionary.
        if let [TypeMember {
            kind: TypeMemberKind::Index { key, value, .. },
            ..
        }] = members
        {
            let key = self.convert(key, diags);
            let value = self.convert(value, diags);
            return self.dictionary(key, value, span, diags);
        }
        // `{ (x: T): R }` alone is a function type.
        if let [TypeMember {
            kind: TypeMemberKind::Call { params, return_type },
            ..
        }] = members
        {
            let params = params.iter().map(|p| self.function_param(p, diags)).collect();
            let ret = self.convert_or(return_type.as_ref(), IrType::void(), diags);
            return IrType::Function(Box::new(FunctionShape {
                params,
                ret,
                is_async: false,
            }));
        }

        let mut properties = Vec::new();
        for member in members {
            match &member.kind {
                TypeMemberKind::Property {
                    name,
                    ty,
                    optional,
                    readonly,
                } => {
                    let mut ty = self.convert_or(ty.as_ref(), IrType::Any, diags);
                    if *optional {
                        ty = ty.nullable();
                    }
                    properties.push(PropertyShape {
                        name: name.clone(),
                        ty,
                        optional: *optional,
                        readonly: *readonly,
                    });
                }
                TypeMemberKind::Method {
                    name,
                    type_params,
                    params,
                    return_type,
                    optional,
                } => {
                    let pushed = self.push_type_params(type_params.iter().map(|p| p.name.clone()));
                    let params = params.iter().map(|p| self.function_param(p, diags)).collect();
                    let ret = self.convert_or(return_type.as_ref(), IrType::void(), diags);
                    self.pop_type_params(pushed);
                    properties.push(PropertyShape {
                        name: name.clone(),
                        ty: IrType::Function(Box::new(FunctionShape {
                            params,
                            ret,
                            is_async: false,
                        })),
                        optional: *optional,
                        readonly: true,
                    });
                }
                TypeMemberKind::Index { .. } | TypeMemberKind::Call { .. } => {
                    self.error(
                        diags,
                        codes::UNRESOLVED_TYPE,
                        member.span,
                        "index and call signatures are only supported alone".to_string(),
                    );
                }
                TypeMemberKind::Unsupported(text) => {
                    self.error(
                        diags,
                        codes::UNRESOLVED_TYPE,
                        member.span,
                        format!("unsupported type member `{}`", text),
                    );
                }
            }
        }
        IrType::Object(ObjectShape { properties })
    }

    fn function_param(&mut self, param: &Param, diags: &mut Diagnostics) -> FunctionParam {
        let ty = self.param_type(param, diags);
        FunctionParam {
            name: param.name().unwrap_or("arg").to_string(),
            ty,
            optional: param.optional || param.default.is_some(),
            rest: param.rest,
        }
    }

    /// Declared parameter type; optional parameters are nullable.
    pub fn param_type(&mut self, param: &Param, diags: &mut Diagnostics) -> IrType {
        let ty = self.convert_or(param.ty.as_ref(), IrType::Any, diags);
        if param.optional && param.default.is_none() {
            ty.nullable()
        } else {
            ty
        }
    }

    pub fn type_param_entries(&mut self, params: &[TypeParam], diags: &mut Diagnostics) -> Vec<TypeParamEntry> {
        params
            .iter()
            .map(|p| TypeParamEntry {
                name: p.name.clone(),
                constraint: p.constraint.as_ref().map(|c| self.convert(c, diags)),
            })
            .collect()
    }

    pub fn param_entries(&mut self, params: &[Param], diags: &mut Diagnostics) -> Vec<ParamEntry> {
        params
            .iter()
            .map(|p| ParamEntry {
                name: p.name().unwrap_or("arg").to_string(),
                ty: self.param_type(p, diags),
                mode: PassingMode::Value,
                optional: p.optional || p.default.is_some(),
                rest: p.rest,
            })
            .collect()
    }

    /// Catalog form of a bound call signature. A missing return annotation
    /// gives `default_ret`.
    pub fn signature_entry(
        &mut self,
        signature: &Signature,
        default_ret: IrType,
        diags: &mut Diagnostics,
    ) -> SignatureEntry {
        let pushed = self.push_type_params(signature.type_params.iter().map(|p| p.name.clone()));
        let type_params = self.type_param_entries(&signature.type_params, diags);
        let params = self.param_entries(&signature.params, diags);
        let ret = self.convert_or(signature.return_type.as_ref(), default_ret, diags);
        self.pop_type_params(pushed);
        SignatureEntry {
            type_params,
            params,
            ret,
        }
    }
}

/// Keys the platform dictionary lowering accepts: strings, numbers and
/// `object`.
pub fn is_valid_dictionary_key(key: &IrType) -> bool {
    match key {
        IrType::Primitive(kind) => *kind == PrimitiveKind::String || kind.is_numeric(),
        IrType::Reference { id, .. } => id.platform_name.as_ref() == crate::universe::OBJECT_TYPE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::universe::CatalogOptions;
    use tsharp_syntax::ast::{SourceModule, TupleElement};

    fn fixture(source: &str) -> (Universe, Bindings, Diagnostics) {
        let module = tsharp_syntax::read_typescript("main.ts", source).unwrap();
        let modules = vec![module];
        let bindings = Bindings::build(&modules, "@dotnet/");
        let mut diags = Diagnostics::new();
        let universe = Universe::build(&modules, &bindings, &CatalogOptions::default(), &mut diags);
        (universe, bindings, diags)
    }

    fn reference(name: &str, args: Vec<TypeNode>) -> TypeNode {
        TypeNode::reference(name, args)
    }

    fn keyword(k: TypeKeyword) -> TypeNode {
        TypeNode::keyword(k)
    }

    #[test]
    fn test_library_generics() {
        let (universe, bindings, _) = fixture("");
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();

        let arr = conv.convert(&reference("Array", vec![keyword(TypeKeyword::String)]), &mut diags);
        assert_eq!(arr, IrType::Array(Box::new(IrType::string())));

        let promise = conv.convert(&reference("Promise", vec![keyword(TypeKeyword::Void)]), &mut diags);
        assert_eq!(promise.canonical(), TASK);

        let record = conv.convert(
            &reference("Record", vec![keyword(TypeKeyword::String), keyword(TypeKeyword::Number)]),
            &mut diags,
        );
        assert_eq!(
            record,
            IrType::Dictionary {
                key: Box::new(IrType::string()),
                value: Box::new(IrType::number()),
            }
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_invalid_dictionary_key() {
        let (universe, bindings, _) = fixture("");
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();
        let ty = conv.convert(
            &reference("Record", vec![keyword(TypeKeyword::Boolean), keyword(TypeKeyword::Number)]),
            &mut diags,
        );
        assert_eq!(ty, IrType::Unknown);
        assert!(diags.contains_code(codes::UNSUPPORTED_KEY_TYPE));
    }

    #[test]
    fn test_unresolved_names() {
        let (universe, bindings, _) = fixture("");
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();
        assert_eq!(conv.convert(&reference("Widget", vec![]), &mut diags), IrType::Unknown);
        assert!(diags.contains_code(codes::UNRESOLVED_TYPE));
        assert_eq!(conv.convert(&reference("System.Frobnicator", vec![]), &mut diags), IrType::Unknown);
        assert!(diags.contains_code(codes::MISSING_STDLIB_TYPE));
    }

    #[test]
    fn test_aliases_expand_and_detect_cycles() {
        let (universe, bindings, diags) = fixture(
            "type Pair<T> = [T, T];\ntype Loop = Loop[];\nlet p: Pair<string>;\n",
        );
        assert!(diags.is_empty());
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();
        let pair = conv.convert(&reference("Pair", vec![keyword(TypeKeyword::String)]), &mut diags);
        assert_eq!(
            pair,
            IrType::Tuple {
                elements: vec![IrType::string(), IrType::string()],
                rest: None,
            }
        );
        conv.convert(&reference("Loop", vec![]), &mut diags);
        assert!(diags.contains_code(codes::CIRCULAR_ALIAS));
    }

    #[test]
    fn test_tuple_with_rest() {
        let (universe, bindings, _) = fixture("");
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();
        let tuple = TypeNode::new(
            TypeKind::Tuple(vec![
                TupleElement {
                    name: None,
                    ty: keyword(TypeKeyword::String),
                    optional: false,
                    rest: false,
                },
                TupleElement {
                    name: None,
                    ty: TypeNode::new(TypeKind::Array(Box::new(keyword(TypeKeyword::Number))), Span::default()),
                    optional: false,
                    rest: true,
                },
            ]),
            Span::default(),
        );
        assert_eq!(
            conv.convert(&tuple, &mut diags),
            IrType::Tuple {
                elements: vec![IrType::string()],
                rest: Some(Box::new(IrType::number())),
            }
        );
    }

    #[test]
    fn test_source_and_platform_references() {
        let (universe, bindings, diags) = fixture(
            "import { List } from \"@dotnet/System.Collections.Generic\";\nclass Box<T> { value: T; }\n",
        );
        assert!(diags.is_empty(), "{:?}", diags);
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let mut diags = Diagnostics::new();
        let boxed = conv.convert(&reference("Box", vec![keyword(TypeKeyword::Number)]), &mut diags);
        assert_eq!(boxed.canonical(), "App.Box`1<System.Double>");
        let list = conv.convert(&reference("List", vec![keyword(TypeKeyword::Number)]), &mut diags);
        assert_eq!(list.canonical(), "System.Collections.Generic.List`1<System.Double>");
        conv.convert(&reference("Box", vec![]), &mut diags);
        assert!(diags.contains_code(codes::TYPE_ARGUMENT_COUNT));
    }

    #[test]
    fn test_index_signature_is_dictionary() {
        let module = SourceModule::new("main.ts", Vec::new());
        let modules = vec![module];
        let bindings = Bindings::build(&modules, "@dotnet/");
        let mut diags = Diagnostics::new();
        let universe = Universe::build(&modules, &bindings, &CatalogOptions::default(), &mut diags);
        let mut conv = TypeConverter::new(&universe, &bindings, ModuleId::new(0));
        let node = TypeNode::new(
            TypeKind::Object(vec![TypeMember {
                kind: TypeMemberKind::Index {
                    key_name: "k".into(),
                    key: keyword(TypeKeyword::String),
                    value: keyword(TypeKeyword::Boolean),
                    readonly: false,
                },
                span: Span::default(),
            }]),
            Span::default(),
        );
        assert_eq!(
            conv.convert(&node, &mut diags),
            IrType::Dictionary {
                key: Box::new(IrType::string()),
                value: Box::new(IrType::boolean()),
            }
        );
    }
}
