//! Calls: dispatch by callee shape, overload resolution and `new`.

use super::expr::{MATH, STRING, cast, dotted_name, pascal_case, signature_type};
use super::{BodyBuilder, infer};
use crate::ir::*;
use std::collections::HashMap;
use std::sync::Arc;
use tsharp_binding::{DeclId, DeclKind, OverloadSelection, select_by_arity};
use tsharp_catalog::convert::{DICTIONARY, EXCEPTION, HASH_SET, SELF_TYPE_PARAM};
use tsharp_catalog::{IrType, MemberKind, PassingMode, PrimitiveKind, SignatureEntry, TypeParamEntry};
use tsharp_syntax::ast::{Expr, ExprKind, TypeKind, TypeNode, UnaryOp};
use tsharp_syntax::{Span, codes};

const CONSOLE: &str = "System.Console";
const ENUMERABLE_CLASS: &str = "System.Linq.Enumerable";
const ARRAY_CLASS: &str = "System.Array";
const DOUBLE: &str = "System.Double";
const LINQ: &str = "System.Linq";

/// String methods whose platform name differs by more than case.
const STRING_METHODS: &[(&str, &str)] = &[
    ("toUpperCase", "ToUpper"),
    ("toLowerCase", "ToLower"),
    ("trim", "Trim"),
    ("includes", "Contains"),
    ("startsWith", "StartsWith"),
    ("endsWith", "EndsWith"),
    ("indexOf", "IndexOf"),
    ("substring", "Substring"),
    ("replace", "Replace"),
    ("split", "Split"),
    ("toString", "ToString"),
];

/// Array methods lowered to LINQ extension calls.
const LINQ_METHODS: &[(&str, &str)] = &[
    ("map", "Select"),
    ("filter", "Where"),
    ("some", "Any"),
    ("every", "All"),
    ("includes", "Contains"),
    ("find", "FirstOrDefault"),
];

/// An argument either still in source form or already lowered.
pub(crate) enum CallArg<'e> {
    Source(&'e Expr),
    Built(IrExpression),
}

impl CallArg<'_> {
    fn is_lambda(&self) -> bool {
        matches!(self, CallArg::Source(Expr { kind: ExprKind::Function(_), .. }))
    }

    /// Source text of a plain numeric literal argument (`3`, `-1.5`).
    fn numeric_literal(&self) -> Option<&str> {
        let CallArg::Source(expr) = self else {
            return None;
        };
        match &expr.kind {
            ExprKind::Number(raw) => Some(raw.as_str()),
            ExprKind::Unary {
                op: UnaryOp::Neg | UnaryOp::Plus,
                operand,
            } => match &operand.kind {
                ExprKind::Number(raw) => Some(raw.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    fn is_spread(&self) -> bool {
        match self {
            CallArg::Source(e) => matches!(e.kind, ExprKind::Spread(_)),
            CallArg::Built(e) => matches!(e.kind, IrExpressionKind::Spread(_)),
        }
    }
}

/// The outcome of overload resolution.
pub(crate) struct ResolvedCall {
    pub args: Vec<IrArgument>,
    pub ret: IrType,
    pub type_args: Vec<IrType>,
}

/// A candidate signature as seen by the call site.
struct Candidate<'s> {
    sig: &'s SignatureEntry,
    /// Parameters after the receiver of an extension call.
    params: &'s [tsharp_catalog::ParamEntry],
}

impl tsharp_binding::Arity for Candidate<'_> {
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

impl Candidate<'_> {
    /// Parameter type an argument at `index` is checked against.
    fn param_type(&self, index: usize, spread: bool) -> Option<(IrType, PassingMode)> {
        let rest = self.params.iter().position(|p| p.rest);
        match rest {
            Some(r) if index >= r => {
                let ty = &self.params[r].ty;
                let ty = if spread { ty.clone() } else { infer::element_type(ty) };
                Some((ty, PassingMode::Value))
            }
            _ => self.params.get(index).map(|p| (p.ty.clone(), p.mode)),
        }
    }
}

impl<'a> BodyBuilder<'a> {
    pub(crate) fn call(
        &mut self,
        callee: &Expr,
        type_args: &[TypeNode],
        args: &[Expr],
        optional: bool,
        span: Span,
    ) -> IrExpression {
        let source_args = || args.iter().map(CallArg::Source).collect::<Vec<_>>();
        match &callee.kind {
            ExprKind::Member {
                object,
                property,
                optional: member_optional,
            } => {
                if let ExprKind::Ident(head) = &object.kind
                    && let Some((_, kind)) = self.module_binding(head)
                {
                    match kind {
                        DeclKind::Global if head == "console" => {
                            return self.console_call(property, args, span);
                        }
                        DeclKind::Global if head == "Math" => {
                            let owner = self.universe.platform_reference(MATH, Vec::new());
                            return self.static_call(owner, property, type_args, source_args(), span);
                        }
                        DeclKind::Global => {
                            self.error(
                                codes::UNSUPPORTED_EXPRESSION,
                                span,
                                format!("`{}.{}` is not supported", head, property),
                            );
                            return IrExpression::unsupported(property.clone(), span);
                        }
                        DeclKind::Namespace(target) => {
                            if let Some(decl) = self.bindings.lookup_export_value(*target, property)
                                && matches!(self.decl_kind(decl), DeclKind::Function)
                            {
                                return self.function_call(decl, type_args, args, span);
                            }
                        }
                        _ => {}
                    }
                }
                if matches!(object.kind, ExprKind::Super) {
                    return self.super_call(property, type_args, args, span);
                }
                let target = self.expr(object, None);
                if let IrExpressionKind::TypeRef(owner) = &target.kind {
                    let owner = owner.clone();
                    return self.static_call(owner, property, type_args, source_args(), span);
                }
                self.method_call(target, property, type_args, args, optional || *member_optional, span)
            }
            ExprKind::Ident(name) if self.locals.lookup(name).is_none() => {
                match self.module_binding(name) {
                    Some((decl, DeclKind::Function)) => self.function_call(decl, type_args, args, span),
                    Some((_, DeclKind::Global)) => self.global_function_call(name, args, span),
                    _ => {
                        let value = self.expr(callee, None);
                        self.invoke(value, args, optional, span)
                    }
                }
            }
            ExprKind::Super => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    "`super(...)` must be the first statement of a constructor".to_string(),
                );
                IrExpression::unsupported("super", span)
            }
            _ => {
                let value = self.expr(callee, None);
                self.invoke(value, args, optional, span)
            }
        }
    }

    // ========================================================================
    // Callee shapes
    // ========================================================================

    fn function_call(&mut self, decl: DeclId, type_args: &[TypeNode], args: &[Expr], span: Span) -> IrExpression {
        let name = self.bindings.decl(decl).name.clone();
        let sigs = self.function_signatures(decl);
        let callee_ty = sigs.first().map(signature_type).unwrap_or(IrType::Unknown);
        let callee = IrExpression::new(self.module_member(decl, &name), callee_ty, span);
        let call_args = args.iter().map(CallArg::Source).collect();
        match self.resolve_call(&name, &sigs, HashMap::new(), type_args, None, call_args, span) {
            Some(resolved) => call_expr(callee, resolved, false, span),
            None => IrExpression::unsupported(name, span),
        }
    }

    pub(crate) fn static_call(
        &mut self,
        owner: IrType,
        name: &str,
        type_args: &[TypeNode],
        args: Vec<CallArg<'_>>,
        span: Span,
    ) -> IrExpression {
        let Some(found) = self.lookup(&owner, name) else {
            return self.unknown_member(&owner, name, span);
        };
        let member_name = found.member.name.clone();
        if found.member.kind != MemberKind::Method {
            let value = self.static_member(owner, name, span);
            return self.invoke_args(value, args, false, span);
        }
        let sigs = found.instantiated_signatures();
        let callee = IrExpression::new(
            IrExpressionKind::StaticMember {
                owner,
                name: member_name.clone(),
            },
            sigs.first().map(signature_type).unwrap_or(IrType::Unknown),
            span,
        );
        match self.resolve_call(&member_name, &sigs, HashMap::new(), type_args, None, args, span) {
            Some(resolved) => call_expr(callee, resolved, false, span),
            None => IrExpression::unsupported(member_name, span),
        }
    }

    fn super_call(&mut self, name: &str, type_args: &[TypeNode], args: &[Expr], span: Span) -> IrExpression {
        let Some(class) = self.class.clone() else {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                "`super` is only available inside a class".to_string(),
            );
            return IrExpression::unsupported("super", span);
        };
        let universe = self.universe;
        let found = universe
            .lookup_inherited_member(&class.id, name)
            .or_else(|| universe.lookup_inherited_member(&class.id, &pascal_case(name)));
        let base_ty = class.base.clone().unwrap_or_else(|| universe.object_type());
        let Some(found) = found.filter(|f| f.member.kind == MemberKind::Method) else {
            return self.unknown_member(&base_ty, name, span);
        };
        let sigs = found.instantiated_signatures();
        let member_name = found.member.name.clone();
        let target = IrExpression::new(IrExpressionKind::Super, base_ty, span);
        let callee = member_callee(target, &member_name, false, None, &sigs, span);
        let call_args = args.iter().map(CallArg::Source).collect();
        match self.resolve_call(&member_name, &sigs, HashMap::new(), type_args, None, call_args, span) {
            Some(resolved) => call_expr(callee, resolved, false, span),
            None => IrExpression::unsupported(member_name, span),
        }
    }

    fn method_call(
        &mut self,
        target: IrExpression,
        name: &str,
        type_args: &[TypeNode],
        args: &[Expr],
        optional: bool,
        span: Span,
    ) -> IrExpression {
        let base = target.ty.non_null();
        match &base {
            IrType::Any | IrType::Unknown | IrType::TypeParameter(_) => {
                return self.dynamic_call(target, name, args, optional, span);
            }
            IrType::Array(elem) => {
                let elem = (**elem).clone();
                return self.array_method(target, elem, name, args, span);
            }
            IrType::Object(shape) => {
                if shape.property(name).is_some() {
                    let value = self.member_of(target, name, optional, span);
                    return self.invoke(value, args, false, span);
                }
                return self.unknown_member(&base, name, span);
            }
            _ => {}
        }
        let name = if base.is_stringish() {
            STRING_METHODS
                .iter()
                .find(|(ts, _)| *ts == name)
                .map(|(_, cs)| *cs)
                .unwrap_or(name)
        } else {
            name
        };
        let Some(found) = self.lookup(&base, name) else {
            return self.unknown_member(&base, name, span);
        };
        if found.member.kind != MemberKind::Method {
            let value = self.member_of(target, name, optional, span);
            return self.invoke(value, args, false, span);
        }
        let sigs = found.instantiated_signatures();
        let member_name = found.member.name.clone();
        let mut bound = HashMap::new();
        bound.insert(Arc::from(SELF_TYPE_PARAM), base.widen_literal());
        let callee = member_callee(target, &member_name, optional, None, &sigs, span);
        let call_args = args.iter().map(CallArg::Source).collect();
        match self.resolve_call(&member_name, &sigs, bound, type_args, None, call_args, span) {
            Some(resolved) => call_expr(callee, resolved, optional, span),
            None => IrExpression::unsupported(member_name, span),
        }
    }

    fn dynamic_call(&mut self, target: IrExpression, name: &str, args: &[Expr], optional: bool, span: Span) -> IrExpression {
        let args = args
            .iter()
            .map(|a| IrArgument::value(self.expr(a, None)))
            .collect();
        let callee = IrExpression::new(
            IrExpressionKind::Member {
                object: Box::new(target),
                name: name.to_string(),
                optional,
                extension: None,
            },
            IrType::Any,
            span,
        );
        IrExpression::new(
            IrExpressionKind::Call {
                callee: Box::new(callee),
                type_args: Vec::new(),
                args,
                optional: false,
            },
            IrType::Any,
            span,
        )
    }

    /// Array methods, lowered to LINQ and `System.Array` helpers.
    fn array_method(&mut self, target: IrExpression, elem: IrType, name: &str, args: &[Expr], span: Span) -> IrExpression {
        if let Some((_, linq)) = LINQ_METHODS.iter().find(|(ts, _)| *ts == name) {
            let call = self.extension_call(target, ENUMERABLE_CLASS, linq, args, span);
            if !matches!(name, "map" | "filter") {
                return call;
            }
            let result_elem = infer::element_type(&call.ty);
            let callee = IrExpression::new(
                IrExpressionKind::Member {
                    object: Box::new(call),
                    name: "ToArray".to_string(),
                    optional: false,
                    extension: Some(LINQ.to_string()),
                },
                IrType::Unknown,
                span,
            );
            return IrExpression::new(
                IrExpressionKind::Call {
                    callee: Box::new(callee),
                    type_args: Vec::new(),
                    args: Vec::new(),
                    optional: false,
                },
                IrType::Array(Box::new(result_elem)),
                span,
            );
        }
        match name {
            "indexOf" | "forEach" => {
                let owner = self.universe.platform_reference(ARRAY_CLASS, Vec::new());
                let method = if name == "indexOf" { "IndexOf" } else { "ForEach" };
                let mut call_args = vec![CallArg::Built(target)];
                call_args.extend(args.iter().map(CallArg::Source));
                self.static_call(owner, method, &[], call_args, span)
            }
            "join" => {
                let separator = match args.first() {
                    Some(sep) => self.expr(sep, Some(&IrType::string())),
                    None => IrExpression::new(
                        IrExpressionKind::Literal(IrLiteral::String(",".to_string())),
                        IrType::string(),
                        span,
                    ),
                };
                let owner = self.universe.platform_reference(STRING, Vec::new());
                let callee = IrExpression::new(
                    IrExpressionKind::StaticMember {
                        owner,
                        name: "Join".to_string(),
                    },
                    IrType::Unknown,
                    span,
                );
                IrExpression::new(
                    IrExpressionKind::Call {
                        callee: Box::new(callee),
                        type_args: Vec::new(),
                        args: vec![IrArgument::value(separator), IrArgument::value(target)],
                        optional: false,
                    },
                    IrType::string(),
                    span,
                )
            }
            "push" => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    "`push` is only supported as a statement".to_string(),
                );
                IrExpression::unsupported("push", span)
            }
            _ => {
                let _ = elem;
                let array = IrType::Array(Box::new(IrType::Unknown));
                self.unknown_member(&array, name, span)
            }
        }
    }

    /// `target.Method(args)` where `Method` is an extension on `class`.
    fn extension_call(&mut self, target: IrExpression, class: &str, method: &str, args: &[Expr], span: Span) -> IrExpression {
        let owner = self.universe.platform_reference(class, Vec::new());
        let Some(found) = self.lookup(&owner, method) else {
            return self.unknown_member(&owner, method, span);
        };
        let sigs = found.instantiated_signatures();
        let receiver = target.ty.clone();
        let namespace = class.rsplit_once('.').map(|(ns, _)| ns.to_string());
        let callee = member_callee(target, method, false, namespace, &sigs, span);
        let call_args = args.iter().map(CallArg::Source).collect();
        match self.resolve_call(method, &sigs, HashMap::new(), &[], Some(&receiver), call_args, span) {
            Some(resolved) => call_expr(callee, resolved, false, span),
            None => IrExpression::unsupported(method, span),
        }
    }

    /// `console.log(...)` and friends.
    fn console_call(&mut self, method: &str, args: &[Expr], span: Span) -> IrExpression {
        let console = self.universe.platform_reference(CONSOLE, Vec::new());
        let owner = match method {
            "log" | "info" | "debug" => None,
            "error" | "warn" => Some(self.static_member(console.clone(), "Error", span)),
            other => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("`console.{}` is not supported", other),
                );
                return IrExpression::unsupported(other, span);
            }
        };
        let value = match args {
            [] => None,
            [single] => Some(self.expr(single, None)),
            many => {
                let mut parts = Vec::with_capacity(many.len() * 2);
                for (i, arg) in many.iter().enumerate() {
                    if i > 0 {
                        parts.push(IrTemplatePart::Text(" ".to_string()));
                    }
                    parts.push(IrTemplatePart::Expr(self.expr(arg, None)));
                }
                Some(IrExpression::new(IrExpressionKind::Template(parts), IrType::string(), span))
            }
        };
        let call_args: Vec<CallArg> = value.into_iter().map(CallArg::Built).collect();
        match owner {
            None => self.static_call(console, "WriteLine", &[], call_args, span),
            Some(writer) => {
                let receiver = writer.ty.clone();
                let Some(found) = self.lookup(&receiver, "WriteLine") else {
                    return self.unknown_member(&receiver, "WriteLine", span);
                };
                let sigs = found.instantiated_signatures();
                let callee = member_callee(writer, "WriteLine", false, None, &sigs, span);
                match self.resolve_call("WriteLine", &sigs, HashMap::new(), &[], None, call_args, span) {
                    Some(resolved) => call_expr(callee, resolved, false, span),
                    None => IrExpression::unsupported("WriteLine", span),
                }
            }
        }
    }

    /// `String(x)`, `Number(x)`, `Boolean(x)`.
    fn global_function_call(&mut self, name: &str, args: &[Expr], span: Span) -> IrExpression {
        let Some(first) = args.first() else {
            self.error(
                codes::NO_MATCHING_OVERLOAD,
                span,
                format!("`{}` expects an argument", name),
            );
            return IrExpression::unsupported(name, span);
        };
        match name {
            "String" => {
                let value = self.expr(first, None);
                let callee = IrExpression::new(
                    IrExpressionKind::Member {
                        object: Box::new(value),
                        name: "ToString".to_string(),
                        optional: false,
                        extension: None,
                    },
                    IrType::Unknown,
                    span,
                );
                IrExpression::new(
                    IrExpressionKind::Call {
                        callee: Box::new(callee),
                        type_args: Vec::new(),
                        args: Vec::new(),
                        optional: false,
                    },
                    IrType::string(),
                    span,
                )
            }
            "Number" => {
                let value = self.expr(first, None);
                if value.ty.is_stringish() {
                    let owner = self.universe.platform_reference(DOUBLE, Vec::new());
                    self.static_call(owner, "Parse", &[], vec![CallArg::Built(value)], span)
                } else {
                    cast(value, IrType::number())
                }
            }
            "Boolean" => {
                let value = self.expr(first, None);
                self.truthy(value)
            }
            other => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("global `{}` cannot be called", other),
                );
                IrExpression::unsupported(other, span)
            }
        }
    }

    fn invoke(&mut self, value: IrExpression, args: &[Expr], optional: bool, span: Span) -> IrExpression {
        let call_args = args.iter().map(CallArg::Source).collect();
        self.invoke_args(value, call_args, optional, span)
    }

    /// Call a function-typed value.
    fn invoke_args(&mut self, value: IrExpression, args: Vec<CallArg<'_>>, optional: bool, span: Span) -> IrExpression {
        match value.ty.non_null() {
            IrType::Function(shape) => {
                let sig = SignatureEntry {
                    type_params: Vec::new(),
                    params: shape
                        .params
                        .iter()
                        .map(|p| tsharp_catalog::ParamEntry {
                            name: p.name.clone(),
                            ty: p.ty.clone(),
                            mode: PassingMode::Value,
                            optional: p.optional,
                            rest: p.rest,
                        })
                        .collect(),
                    ret: shape.ret.clone(),
                };
                match self.resolve_call("function", std::slice::from_ref(&sig), HashMap::new(), &[], None, args, span) {
                    Some(resolved) => call_expr(value, resolved, optional, span),
                    None => IrExpression::unsupported("call", span),
                }
            }
            IrType::Any | IrType::Unknown => {
                let args = args
                    .into_iter()
                    .map(|a| IrArgument::value(self.build_arg(a, None)))
                    .collect();
                IrExpression::new(
                    IrExpressionKind::Call {
                        callee: Box::new(value),
                        type_args: Vec::new(),
                        args,
                        optional,
                    },
                    IrType::Any,
                    span,
                )
            }
            other => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("value of type `{}` is not callable", other),
                );
                IrExpression::unsupported("call", span)
            }
        }
    }

    fn build_arg(&mut self, arg: CallArg<'_>, expected: Option<&IrType>) -> IrExpression {
        match arg {
            CallArg::Source(e) => self.expr(e, expected),
            CallArg::Built(e) => e,
        }
    }

    // ========================================================================
    // Overload resolution
    // ========================================================================

    /// Pick a signature for the arguments and lower them against it.
    ///
    /// Candidates are filtered by arity, then ranked by how well the
    /// argument types fit: exact matches before implicit widening before
    /// top-type parameters, declaration order breaking ties. Type arguments
    /// are inferred from non-lambda arguments first; lambdas are then typed
    /// against the partially instantiated parameter and may bind the rest.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn resolve_call(
        &mut self,
        name: &str,
        sigs: &[SignatureEntry],
        bound: HashMap<Arc<str>, IrType>,
        type_args: &[TypeNode],
        receiver: Option<&IrType>,
        args: Vec<CallArg<'_>>,
        span: Span,
    ) -> Option<ResolvedCall> {
        let candidates: Vec<Candidate> = sigs
            .iter()
            .map(|sig| Candidate {
                sig,
                params: if receiver.is_some() && !sig.params.is_empty() {
                    &sig.params[1..]
                } else {
                    &sig.params
                },
            })
            .collect();
        let explicit: Vec<IrType> = type_args.iter().map(|t| self.convert(t)).collect();

        let indices = match select_by_arity(&candidates, args.len()) {
            OverloadSelection::Unique(i) => vec![i],
            OverloadSelection::Ambiguous(all) => all,
            OverloadSelection::NoMatch => {
                self.error(
                    codes::NO_MATCHING_OVERLOAD,
                    span,
                    format!("no overload of `{}` takes {} argument(s)", name, args.len()),
                );
                return None;
            }
        };

        // Argument types as seen before any expected type is applied.
        let shapes: Vec<Option<IrType>> = args
            .iter()
            .map(|arg| match arg {
                _ if arg.is_lambda() => None,
                CallArg::Source(e) => Some(self.scratch(|b| b.expr(e, None).ty)),
                CallArg::Built(e) => Some(e.ty.clone()),
            })
            .collect();

        let mut best: Option<(usize, (u8, u32), HashMap<Arc<str>, IrType>)> = None;
        for index in indices {
            let candidate = &candidates[index];
            let map = initial_map(candidate, &bound, &explicit, receiver, &shapes, &args);
            let Some(score) = score(candidate, &map, &shapes, &args) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, s, _)| score < *s) {
                best = Some((index, score, map));
            }
        }
        let Some((index, _, mut map)) = best else {
            let kinds: Vec<String> = shapes
                .iter()
                .map(|s| s.as_ref().map_or_else(|| "function".to_string(), |t| t.to_string()))
                .collect();
            self.error(
                codes::NO_MATCHING_OVERLOAD,
                span,
                format!("no overload of `{}` accepts ({})", name, kinds.join(", ")),
            );
            return None;
        };
        let candidate = &candidates[index];
        let type_param_names: Vec<String> = candidate.sig.type_params.iter().map(|p| p.name.clone()).collect();

        // Lower arguments: lambdas last so that they see what the others bound.
        let spreads: Vec<bool> = args.iter().map(CallArg::is_spread).collect();
        let mut lowered: Vec<Option<IrArgument>> = (0..args.len()).map(|_| None).collect();
        let mut lambdas = Vec::new();
        for (i, arg) in args.into_iter().enumerate() {
            if arg.is_lambda() {
                lambdas.push((i, arg));
                continue;
            }
            lowered[i] = Some(self.lower_arg(candidate, i, spreads[i], arg, &map));
        }
        for (i, arg) in lambdas {
            let param = candidate.param_type(i, false).map(|(t, _)| t.substitute(&map));
            let value = self.build_arg(arg, param.as_ref());
            if let Some(param) = candidate.param_type(i, false).map(|(t, _)| t) {
                infer::unify(&param, &value.ty, &type_param_names, &mut map);
            }
            lowered[i] = Some(IrArgument::value(value));
        }

        let erase: HashMap<Arc<str>, IrType> = type_param_names
            .iter()
            .filter(|n| !map.contains_key(n.as_str()))
            .map(|n| (Arc::from(n.as_str()), IrType::Unknown))
            .collect();
        let ret = candidate.sig.ret.substitute(&map).substitute(&erase);
        let type_args = if needs_type_args(candidate.sig, &explicit) {
            candidate
                .sig
                .type_params
                .iter()
                .map(|p| map.get(p.name.as_str()).cloned().unwrap_or(IrType::Unknown))
                .collect()
        } else {
            Vec::new()
        };
        Some(ResolvedCall {
            args: lowered.into_iter().flatten().collect(),
            ret,
            type_args,
        })
    }

    fn lower_arg(
        &mut self,
        candidate: &Candidate<'_>,
        index: usize,
        spread: bool,
        arg: CallArg<'_>,
        map: &HashMap<Arc<str>, IrType>,
    ) -> IrArgument {
        let (param, mode) = candidate
            .param_type(index, spread)
            .map(|(t, m)| (Some(t.substitute(map)), m))
            .unwrap_or((None, PassingMode::Value));
        let expected = param.filter(|t| !t.has_type_parameters());
        let value = self.build_arg(arg, expected.as_ref());
        if matches!(mode, PassingMode::Ref | PassingMode::Out) && !value.is_local() {
            self.error(
                codes::BYREF_NOT_LOCAL,
                value.span,
                format!("`{}` argument must be a local variable", mode.keyword().unwrap_or("ref")),
            );
        }
        IrArgument { value, mode }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    pub(crate) fn new_expr(
        &mut self,
        callee: &Expr,
        type_args: &[TypeNode],
        args: &[Expr],
        expected: Option<&IrType>,
        span: Span,
    ) -> IrExpression {
        let Some(name) = dotted_name(callee) else {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                "`new` needs a type name".to_string(),
            );
            return IrExpression::unsupported("new", span);
        };
        let ty = if type_args.is_empty() {
            self.constructed_type(&name, args, expected, span)
        } else {
            let node = TypeNode::new(
                TypeKind::Reference {
                    name: name.clone(),
                    args: type_args.to_vec(),
                },
                callee.span,
            );
            Some(self.convert(&node))
        };
        let Some(ty) = ty.filter(|t| !t.is_unknown()) else {
            return IrExpression::unsupported(name, span);
        };

        if let IrType::Array(_) = &ty {
            let int = IrType::Primitive(PrimitiveKind::Int);
            let args = args
                .iter()
                .map(|a| {
                    let value = self.expr(a, Some(&int));
                    IrArgument::value(self.to_int(value))
                })
                .collect();
            return IrExpression::new(IrExpressionKind::New { ty: ty.clone(), args }, ty, span);
        }

        let universe = self.universe;
        let Some((entry, type_args)) = universe.entry_of_type(&ty) else {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                format!("type `{}` cannot be constructed", ty),
            );
            return IrExpression::unsupported(name, span);
        };
        if entry.is_abstract {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                format!("cannot create an instance of abstract type `{}`", ty),
            );
        }
        let substitution: HashMap<Arc<str>, IrType> = entry
            .type_params
            .iter()
            .zip(type_args)
            .map(|(p, a)| (Arc::from(p.name.as_str()), a))
            .collect();
        let sigs: Vec<SignatureEntry> = entry
            .constructors()
            .flat_map(|c| c.signatures.iter())
            .map(|s| tsharp_catalog::instantiate_signature(s, &substitution))
            .collect();
        let args_out = if sigs.is_empty() {
            if !args.is_empty() {
                self.error(
                    codes::NO_MATCHING_OVERLOAD,
                    span,
                    format!("`{}` has no constructor taking arguments", ty),
                );
            }
            Vec::new()
        } else {
            let call_args = args.iter().map(CallArg::Source).collect();
            match self.resolve_call(&name, &sigs, HashMap::new(), &[], None, call_args, span) {
                Some(resolved) => resolved.args,
                None => return IrExpression::unsupported(name, span),
            }
        };
        IrExpression::new(
            IrExpressionKind::New {
                ty: ty.clone(),
                args: args_out,
            },
            ty,
            span,
        )
    }

    /// Type constructed by `new Name(args)` without explicit type arguments.
    fn constructed_type(&mut self, name: &str, args: &[Expr], expected: Option<&IrType>, span: Span) -> Option<IrType> {
        let universe = self.universe;
        let id = match name {
            "Map" => universe.resolve_alias(DICTIONARY),
            "Set" => universe.resolve_alias(HASH_SET),
            "Error" => universe.resolve_alias(EXCEPTION),
            "Array" => {
                let elem = match expected.map(IrType::non_null) {
                    Some(IrType::Array(elem)) => *elem,
                    _ => IrType::Any,
                };
                return Some(IrType::Array(Box::new(elem)));
            }
            _ => {
                let bindings = self.bindings;
                let decl = bindings.lookup_qualified_type(self.module, name);
                match decl.map(|d| (d, self.decl_kind(d))) {
                    Some((d, DeclKind::Class)) => universe.source_type(d).cloned(),
                    Some((_, DeclKind::PlatformType { qualified })) => universe.resolve_alias(qualified),
                    Some((_, DeclKind::Interface | DeclKind::TypeAlias | DeclKind::Enum)) => {
                        self.error(
                            codes::UNSUPPORTED_EXPRESSION,
                            span,
                            format!("`{}` is not a class", name),
                        );
                        return None;
                    }
                    _ => universe.resolve_alias(name),
                }
            }
        };
        let Some(id) = id else {
            self.error(codes::UNRESOLVED_TYPE, span, format!("cannot find type `{}`", name));
            return None;
        };
        let Some(entry) = universe.entry(&id) else {
            return Some(universe.type_for(&id, Vec::new()));
        };
        if entry.type_params.is_empty() {
            return Some(universe.type_for(&id, Vec::new()));
        }
        // Type arguments come from the expected type when it names the same
        // type, otherwise from the constructor arguments.
        if let Some(IrType::Reference { id: expected_id, args: expected_args }) = expected.map(IrType::non_null)
            && expected_id == id
        {
            return Some(IrType::Reference {
                id,
                args: expected_args,
            });
        }
        let open: Vec<IrType> = entry.type_params.iter().map(|p| IrType::type_param(&p.name)).collect();
        let generic_sigs: Vec<SignatureEntry> = entry
            .constructors()
            .flat_map(|c| c.signatures.iter())
            .map(|s| SignatureEntry {
                type_params: entry
                    .type_params
                    .iter()
                    .map(|p| TypeParamEntry {
                        name: p.name.clone(),
                        constraint: p.constraint.clone(),
                    })
                    .chain(s.type_params.iter().cloned())
                    .collect(),
                ..s.clone()
            })
            .collect();
        let names: Vec<String> = entry.type_params.iter().map(|p| p.name.clone()).collect();
        let mut map = HashMap::new();
        if let Some(sig) = generic_sigs.iter().find(|s| s.params.len() >= args.len()) {
            for (param, arg) in sig.params.iter().zip(args) {
                let ty = self.scratch(|b| b.expr(arg, None).ty);
                infer::unify(&param.ty, &ty, &names, &mut map);
            }
        }
        let args = open
            .iter()
            .map(|p| p.substitute(&map))
            .map(|t| if t.has_type_parameters() { IrType::Unknown } else { t })
            .collect();
        Some(IrType::Reference { id, args })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Type parameter bindings before lambdas are considered.
fn initial_map(
    candidate: &Candidate<'_>,
    bound: &HashMap<Arc<str>, IrType>,
    explicit: &[IrType],
    receiver: Option<&IrType>,
    shapes: &[Option<IrType>],
    args: &[CallArg<'_>],
) -> HashMap<Arc<str>, IrType> {
    let sig = candidate.sig;
    let names: Vec<String> = sig.type_params.iter().map(|p| p.name.clone()).collect();
    let mut map: HashMap<Arc<str>, IrType> = bound
        .iter()
        .filter(|(k, _)| names.iter().any(|n| n.as_str() == k.as_ref()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (param, arg) in sig.type_params.iter().zip(explicit) {
        map.insert(Arc::from(param.name.as_str()), arg.clone());
    }
    if let (Some(receiver), Some(first)) = (receiver, sig.params.first()) {
        infer::unify(&first.ty, receiver, &names, &mut map);
    }
    for (i, shape) in shapes.iter().enumerate() {
        let Some(shape) = shape else { continue };
        if let Some((param, _)) = candidate.param_type(i, args[i].is_spread()) {
            infer::unify(&param, shape, &names, &mut map);
        }
    }
    map
}

/// Rank of a candidate: worst argument tier, then the tier sum.
fn score(
    candidate: &Candidate<'_>,
    map: &HashMap<Arc<str>, IrType>,
    shapes: &[Option<IrType>],
    args: &[CallArg<'_>],
) -> Option<(u8, u32)> {
    let mut worst = 0u8;
    let mut total = 0u32;
    for (i, shape) in shapes.iter().enumerate() {
        let (param, _) = candidate.param_type(i, args[i].is_spread())?;
        let param = param.substitute(map);
        let tier = match shape {
            Some(arg) => match args[i].numeric_literal().and_then(|raw| infer::literal_fit(&param, raw)) {
                Some(tier) => tier,
                None => infer::fit_tier(&param, arg)?,
            },
            None => match param.non_null() {
                IrType::Function(_) => 0,
                IrType::Any | IrType::Unknown | IrType::TypeParameter(_) => 2,
                _ => return None,
            },
        };
        worst = worst.max(tier);
        total += u32::from(tier);
    }
    Some((worst, total))
}

/// Whether type arguments must be written out at the call site.
fn needs_type_args(sig: &SignatureEntry, explicit: &[IrType]) -> bool {
    if sig.type_params.is_empty() {
        return false;
    }
    if !explicit.is_empty() {
        return true;
    }
    sig.type_params.iter().any(|p| {
        p.name == SELF_TYPE_PARAM
            || !sig
                .params
                .iter()
                .any(|param| mentions(&param.ty, &p.name))
    })
}

fn mentions(ty: &IrType, name: &str) -> bool {
    let mut map = HashMap::new();
    map.insert(Arc::from(name), IrType::Unknown);
    ty.substitute(&map) != *ty
}

fn member_callee(
    target: IrExpression,
    name: &str,
    optional: bool,
    extension: Option<String>,
    sigs: &[SignatureEntry],
    span: Span,
) -> IrExpression {
    IrExpression::new(
        IrExpressionKind::Member {
            object: Box::new(target),
            name: name.to_string(),
            optional,
            extension,
        },
        sigs.first().map(signature_type).unwrap_or(IrType::Unknown),
        span,
    )
}

fn call_expr(callee: IrExpression, resolved: ResolvedCall, optional: bool, span: Span) -> IrExpression {
    let ty = if optional && !resolved.ret.is_void() {
        resolved.ret.nullable()
    } else {
        resolved.ret
    };
    IrExpression::new(
        IrExpressionKind::Call {
            callee: Box::new(callee),
            type_args: resolved.type_args,
            args: resolved.args,
            optional,
        },
        ty,
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, variable};
    use super::*;

    fn call_of(source: &str, name: &str) -> (IrExpression, tsharp_syntax::Diagnostics) {
        let (ir, diags) = build(&[("main.ts", source)]);
        (variable(&ir[0], name).init.clone().unwrap(), diags)
    }

    fn first_param_type(call: &IrExpression) -> IrType {
        let IrExpressionKind::Call { args, .. } = &call.kind else {
            panic!("expected call, got {:?}", call.kind);
        };
        args[0].value.ty.clone()
    }

    #[test]
    fn test_math_max_picks_overload_by_argument_shape() {
        let (call, diags) = call_of("const a: int = 1;\nconst b: int = 2;\nconst m = Math.max(a, b);", "m");
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(call.ty, IrType::Primitive(PrimitiveKind::Int));

        let (call, _) = call_of("const m = Math.max(1.5, 2);", "m");
        assert_eq!(call.ty, IrType::number());
    }

    #[test]
    fn test_generic_inference_from_lambda_result() {
        let (call, diags) = call_of("const xs = [1, 2, 3];\nconst ys = xs.map(x => \"n\" + x);", "ys");
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(call.ty, IrType::Array(Box::new(IrType::string())));
    }

    #[test]
    fn test_filter_keeps_element_type() {
        let (call, diags) = call_of("const xs = [1, 2, 3];\nconst ys = xs.filter(x => x > 1);", "ys");
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(call.ty, IrType::Array(Box::new(IrType::number())));
    }

    #[test]
    fn test_string_methods_are_mapped() {
        let (call, diags) = call_of("const s = \"abc\".toUpperCase();", "s");
        assert!(diags.is_empty(), "{:?}", diags);
        let IrExpressionKind::Call { callee, .. } = &call.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, IrExpressionKind::Member { name, .. } if name == "ToUpper"));
        assert_eq!(call.ty, IrType::string());
    }

    #[test]
    fn test_arity_mismatch_reports_no_overload() {
        let (_, diags) = call_of("function f(a: int): int { return a; }\nconst v = f(1, 2);", "v");
        assert!(diags.contains_code(codes::NO_MATCHING_OVERLOAD));
    }

    #[test]
    fn test_new_generic_takes_type_from_annotation() {
        let (new, diags) = call_of("const m: Map<string, int> = new Map();", "m");
        assert!(diags.is_empty(), "{:?}", diags);
        let IrType::Reference { args, .. } = &new.ty else {
            panic!("expected reference, got {:?}", new.ty);
        };
        assert_eq!(args[1], IrType::Primitive(PrimitiveKind::Int));
    }

    #[test]
    fn test_source_function_argument_gets_parameter_type() {
        let (call, diags) = call_of("function f(x: long): long { return x; }\nconst v = f(3);", "v");
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(first_param_type(&call), IrType::Primitive(PrimitiveKind::Long));
    }

    #[test]
    fn test_literal_arguments_fit_fixed_width_parameters() {
        let (call, diags) = call_of("function f(x: int): int { return x; }\nconst v = f(-3);", "v");
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(call.ty, IrType::Primitive(PrimitiveKind::Int));

        let (_, diags) = call_of("class P {\n  constructor(public x: long) {}\n}\nconst p = new P(1);", "p");
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_fractional_literal_does_not_fit_integral_parameter() {
        let (_, diags) = call_of("function f(x: int): int { return x; }\nconst v = f(1.5);", "v");
        assert!(diags.contains_code(codes::NO_MATCHING_OVERLOAD));
    }

    #[test]
    fn test_generator_next_accepts_literal_input() {
        let (call, diags) = call_of(
            "function* g(): Generator<int, void, int> {\n  const a: int = yield 1;\n}\nconst it = g();\nconst r = it.next(5);",
            "r",
        );
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(
            first_param_type(&call).non_null(),
            IrType::Primitive(PrimitiveKind::Int)
        );
    }
}
