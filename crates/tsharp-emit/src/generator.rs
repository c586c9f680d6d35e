//! Generator functions.
//!
//! A generator `f` becomes four members next to each other:
//!
//! - `f_exchange`, the object passed between caller and body. The body
//!   writes `Output` before suspending and reads `Input` after resuming.
//! - `f_iterator`, a C# iterator over the exchange holding the lowered
//!   body. Each `yield` is `exchange.Output = v; yield return exchange;`.
//! - `f_Generator`, which implements the runtime `Generator` interface by
//!   driving the iterator from `next(value)`.
//! - `f` itself, which wires the three together.
//!
//! `yield*` into another source generator drives that generator's iterator
//! directly, forwarding values in both directions.

use crate::context::{EmitterContext, GeneratorScope};
use crate::cs::*;
use crate::emitter::{Lowered, ModuleEmitter};
use crate::error::Ice;
use crate::expr::not_supported;
use crate::naming::{LocalNames, escape_identifier};
use crate::stmt::{default_bang, generator_value};
use crate::types::data_property;
use tsharp_ir::{IrExpression, IrExpressionKind, IrFunction, YieldReceive};

const ENUMERABLE: &str = "global::System.Collections.Generic.IEnumerable";
const ASYNC_ENUMERABLE: &str = "global::System.Collections.Generic.IAsyncEnumerable";
const ENUMERATOR: &str = "global::System.Collections.Generic.IEnumerator";
const ASYNC_ENUMERATOR: &str = "global::System.Collections.Generic.IAsyncEnumerator";
const TASK_OF: &str = "global::System.Threading.Tasks.Task";

fn derived_name(function: &str, suffix: &str) -> String {
    format!("{}_{}", escape_identifier(function).trim_start_matches('@'), suffix)
}

pub(crate) fn exchange_class(function: &str) -> String {
    derived_name(function, "exchange")
}

pub(crate) fn iterator_method(function: &str) -> String {
    derived_name(function, "iterator")
}

pub(crate) fn wrapper_class(function: &str) -> String {
    derived_name(function, "Generator")
}

/// Body of `next(value)`: `Idle → Running → Suspended → Running → … →
/// Completed`.
fn state_machine(result: &str, is_async: bool) -> String {
    let (move_next, dispose) = if is_async {
        ("await _iterator.MoveNextAsync()", "await _iterator.DisposeAsync();")
    } else {
        ("_iterator.MoveNext()", "_iterator.Dispose();")
    };
    [
        "if (_state == Running)".to_string(),
        "{".to_string(),
        "    throw new global::System.InvalidOperationException(\"Generator is already running\");".to_string(),
        "}".to_string(),
        "if (_state == Completed)".to_string(),
        "{".to_string(),
        format!("    return new {}(default!, true);", result),
        "}".to_string(),
        "if (_state == Suspended)".to_string(),
        "{".to_string(),
        "    _exchange.Input = value;".to_string(),
        "}".to_string(),
        "_state = Running;".to_string(),
        "bool moved;".to_string(),
        "try".to_string(),
        "{".to_string(),
        format!("    moved = {};", move_next),
        "}".to_string(),
        "catch".to_string(),
        "{".to_string(),
        "    _state = Completed;".to_string(),
        "    throw;".to_string(),
        "}".to_string(),
        "if (moved)".to_string(),
        "{".to_string(),
        "    _state = Suspended;".to_string(),
        format!("    return new {}(_exchange.Output, false);", result),
        "}".to_string(),
        "_state = Completed;".to_string(),
        dispose.to_string(),
        format!("return new {}(default!, true);", result),
    ]
    .join("\n")
}

fn field(modifiers: Vec<&'static str>, ty: CsType, name: &str, init: Option<CsExpr>) -> CsMember {
    CsMember::Field(CsField {
        modifiers,
        ty,
        name: name.to_string(),
        init,
    })
}

impl ModuleEmitter<'_> {
    /// Members for generator `function`. `ctx` is the member context with
    /// the function's type parameters in scope; `modifiers` apply to the
    /// public entry point.
    pub(crate) fn generator_members(
        &mut self,
        function: &IrFunction,
        modifiers: Vec<&'static str>,
        ctx: &EmitterContext,
    ) -> Result<(Vec<CsMember>, EmitterContext), Ice> {
        let Some(info) = &function.generator else {
            return Err(Ice::YieldOutsideGenerator {
                function: function.name.clone(),
            });
        };
        let is_async = info.is_async;
        let type_params = self.type_params(&function.type_params, ctx)?;
        let type_args: Vec<CsType> = function
            .type_params
            .iter()
            .map(|p| CsType::named(escape_identifier(&p.name)))
            .collect();

        let yield_ty = self.type_arg(&info.yield_ty, ctx)?;
        let return_ty = self.type_arg(&info.return_ty, ctx)?;
        let next_ty = self.type_arg(&info.next_ty, ctx)?;
        let input_ty = next_ty.clone().nullable();
        // `TNext?` in the interface means `TNext` itself for value types.
        let value_ty = if self.is_value_type(&info.next_ty) {
            next_ty.clone()
        } else {
            input_ty.clone()
        };
        let exchange_ty = CsType::generic(exchange_class(&function.name), type_args.clone());
        let sequence = if is_async { ASYNC_ENUMERABLE } else { ENUMERABLE };
        let sequence_ty = CsType::generic(sequence, vec![exchange_ty.clone()]);

        // Entry point signature; also the only member of bodiless methods.
        let entry_ctx = ctx.clone().with_function(&function.name);
        let ret = self.cs_type(&function.ret, &entry_ctx)?;
        let (params, prologue, body_ctx) = self.params(&function.params, entry_ctx.clone())?;
        let entry_name = escape_identifier(&function.name);
        let Some(body) = &function.body else {
            let method = CsMethod {
                modifiers,
                ret,
                name: entry_name,
                type_params,
                params,
                body: None,
            };
            return Ok((vec![CsMember::Method(method)], body_ctx));
        };

        // Iterator.
        let (body_ctx, exchange) = body_ctx.with_async(is_async).temp("exchange");
        let scope = GeneratorScope {
            exchange: exchange.clone(),
            input: input_ty.clone(),
            is_async,
        };
        let (lowered, body_ctx) = self.stmts(body, body_ctx.with_generator(scope))?;
        let mut iterator_body = prologue;
        iterator_body.extend(lowered);
        if !iterator_body.last().is_some_and(CsStmt::is_jump) {
            iterator_body.push(CsStmt::YieldBreak);
        }
        let mut iterator_params = vec![CsParam::new(exchange_ty.clone(), exchange)];
        iterator_params.extend(params.iter().map(|p| CsParam {
            modifier: None,
            default: None,
            ..p.clone()
        }));
        let mut iterator_modifiers = vec!["internal"];
        if ctx.is_static {
            iterator_modifiers.push("static");
        }
        if is_async {
            iterator_modifiers.push("async");
        }
        let iterator = CsMethod {
            modifiers: iterator_modifiers,
            ret: sequence_ty.clone(),
            name: iterator_method(&function.name),
            type_params: type_params.clone(),
            params: iterator_params,
            body: Some(iterator_body),
        };

        // Exchange.
        let exchange_decl = CsClass {
            type_params: type_params.clone(),
            members: vec![
                CsMember::Property(data_property(yield_ty.clone(), "Output", false)),
                CsMember::Property(data_property(input_ty.clone(), "Input", false)),
            ],
            ..CsClass::new(vec!["public", "sealed"], exchange_class(&function.name))
        };

        // Wrapper.
        let runtime = self.options.runtime_namespace.clone();
        let result_ty = CsType::generic(self.qualify(&runtime, "IteratorResult"), vec![yield_ty.clone()]);
        let interface = if is_async { "AsyncGenerator" } else { "Generator" };
        let interface_ty = CsType::generic(self.qualify(&runtime, interface), vec![yield_ty, return_ty, next_ty]);
        let enumerator = if is_async { ASYNC_ENUMERATOR } else { ENUMERATOR };
        let enumerator_ty = CsType::generic(enumerator, vec![exchange_ty.clone()]);
        let get_enumerator = if is_async { "GetAsyncEnumerator" } else { "GetEnumerator" };
        let int = CsType::Keyword("int");
        let mut wrapper_members: Vec<CsMember> = ["Idle", "Running", "Suspended", "Completed"]
            .iter()
            .enumerate()
            .map(|(i, state)| field(vec!["private", "const"], int.clone(), state, Some(CsExpr::Literal(i.to_string()))))
            .collect();
        wrapper_members.push(field(vec!["private", "readonly"], exchange_ty.clone(), "_exchange", None));
        wrapper_members.push(field(vec!["private", "readonly"], enumerator_ty, "_iterator", None));
        wrapper_members.push(field(vec!["private"], int, "_state", Some(CsExpr::ident("Idle"))));
        wrapper_members.push(CsMember::Constructor(CsConstructor {
            modifiers: vec!["public"],
            name: wrapper_class(&function.name),
            params: vec![
                CsParam::new(exchange_ty.clone(), "exchange"),
                CsParam::new(sequence_ty, "iterator"),
            ],
            base_args: None,
            body: vec![
                CsStmt::Expr(CsExpr::assign(CsExpr::ident("_exchange"), CsExpr::ident("exchange"))),
                CsStmt::Expr(CsExpr::assign(
                    CsExpr::ident("_iterator"),
                    CsExpr::call(CsExpr::member(CsExpr::ident("iterator"), get_enumerator), Vec::new()),
                )),
            ],
        }));
        let next_ret = if is_async {
            CsType::generic(TASK_OF, vec![result_ty.clone()])
        } else {
            result_ty.clone()
        };
        let mut value_param = CsParam::new(value_ty, "value");
        value_param.default = Some(CsExpr::Default(None));
        wrapper_members.push(CsMember::Method(CsMethod {
            modifiers: if is_async { vec!["public", "async"] } else { vec!["public"] },
            ret: next_ret,
            name: "next".to_string(),
            type_params: Vec::new(),
            params: vec![value_param],
            body: Some(vec![CsStmt::Verbatim(state_machine(&result_ty.to_string(), is_async))]),
        }));
        let wrapper = CsClass {
            type_params: type_params.clone(),
            bases: vec![interface_ty],
            members: wrapper_members,
            ..CsClass::new(vec!["public", "sealed"], wrapper_class(&function.name))
        };

        // Entry point.
        let mut names = LocalNames::new();
        for param in &params {
            names.reserve(&param.name);
        }
        let local = names.allocate("exchange");
        let mut args = vec![CsExpr::ident(&local)];
        args.extend(params.iter().map(|p| CsExpr::ident(&p.name)));
        let start = CsExpr::Call {
            callee: Box::new(CsExpr::ident(iterator_method(&function.name))),
            type_args: type_args.clone(),
            args: args.into_iter().map(CsArg::new).collect(),
        };
        let wrapper_ty = CsType::generic(wrapper_class(&function.name), type_args);
        let entry = CsMethod {
            modifiers,
            ret,
            name: entry_name,
            type_params,
            params,
            body: Some(vec![
                CsStmt::local(CsType::Keyword("var"), local.clone(), Some(CsExpr::new_object(exchange_ty, Vec::new()))),
                CsStmt::Return(Some(CsExpr::new_object(wrapper_ty, vec![CsExpr::ident(&local), start]))),
            ]),
        };

        tracing::trace!(function = %function.name, is_async, "generator lowered");
        let members = vec![
            CsMember::Type(CsTypeDecl::Class(exchange_decl)),
            CsMember::Method(iterator),
            CsMember::Type(CsTypeDecl::Class(wrapper)),
            CsMember::Method(entry),
        ];
        Ok((members, body_ctx))
    }

    pub(crate) fn yield_stmt(
        &mut self,
        output: Option<&IrExpression>,
        receive: Option<&YieldReceive>,
        is_delegate: bool,
        ctx: EmitterContext,
    ) -> Lowered<Vec<CsStmt>> {
        let Some(scope) = ctx.generator.clone() else {
            return Err(Ice::YieldOutsideGenerator {
                function: ctx.function.clone(),
            });
        };
        let exchange = CsExpr::ident(&scope.exchange);
        let (mut out, ctx) = match (is_delegate, output) {
            (true, Some(source)) => self.yield_delegate(source, &scope, ctx)?,
            _ => {
                let (value, ctx) = match output {
                    Some(e) => self.expr(e, ctx)?,
                    None => (default_bang(), ctx),
                };
                let out = vec![
                    CsStmt::Expr(CsExpr::assign(CsExpr::member(exchange.clone(), "Output"), value)),
                    CsStmt::YieldReturn(exchange.clone()),
                ];
                (out, ctx)
            }
        };
        let Some(receive) = receive else {
            return Ok((out, ctx));
        };
        // `yield*` evaluates to the inner return value, which is not kept.
        let input = CsExpr::member(exchange, "Input");
        let (received, ctx) = match receive {
            YieldReceive::Declare { pattern, .. } => {
                let value = if is_delegate {
                    default_bang()
                } else {
                    self.received(input, pattern.ty(), &scope, &ctx)?
                };
                self.destructure(pattern, value, ctx)?
            }
            YieldReceive::Assign { target } => {
                let value = if is_delegate {
                    default_bang()
                } else {
                    self.received(input, &target.ty, &scope, &ctx)?
                };
                let (target, ctx) = self.expr(target, ctx)?;
                (vec![CsStmt::Expr(CsExpr::assign(target, value))], ctx)
            }
        };
        out.extend(received);
        Ok((out, ctx))
    }

    /// `exchange.Input` read as `ty`.
    fn received(
        &mut self,
        input: CsExpr,
        ty: &tsharp_catalog::IrType,
        scope: &GeneratorScope,
        ctx: &EmitterContext,
    ) -> Result<CsExpr, Ice> {
        if ty.is_unknown() {
            return Ok(input);
        }
        let target = self.cs_type(ty, ctx)?;
        if target == scope.input || target.is_nullable() || target == CsType::Keyword("dynamic") {
            return Ok(input);
        }
        Ok(CsExpr::cast(target, CsExpr::NullForgiving(Box::new(input))))
    }

    fn yield_delegate(&mut self, source: &IrExpression, scope: &GeneratorScope, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        if let Some(lowered) = self.delegate_to_iterator(source, scope, ctx.clone())? {
            return Ok(lowered);
        }
        let exchange = CsExpr::ident(&scope.exchange);
        let forward = |value: CsExpr| {
            vec![
                CsStmt::Expr(CsExpr::assign(CsExpr::member(exchange.clone(), "Output"), value)),
                CsStmt::YieldReturn(exchange.clone()),
            ]
        };

        if let Some(source_async) = generator_value(&source.ty) {
            if source_async && !scope.is_async {
                let message = "yield* of an async generator in a sync generator";
                return Ok((vec![CsStmt::Throw(Some(not_supported(message)))], ctx));
            }
            let (value, ctx) = self.expr(source, ctx)?;
            let (ctx, it) = ctx.temp("it");
            let (ctx, step) = ctx.temp("step");
            let next = |arg: Option<CsExpr>| {
                let call = CsExpr::call(CsExpr::member(CsExpr::ident(&it), "next"), arg.into_iter().collect());
                if source_async { CsExpr::Await(Box::new(call)) } else { call }
            };
            let resume = CsExpr::binary(
                CsExpr::member(exchange.clone(), "Input"),
                "??",
                CsExpr::Default(None),
            );
            let done = CsExpr::Unary {
                op: "!",
                operand: Box::new(CsExpr::member(CsExpr::ident(&step), "done")),
                postfix: false,
            };
            let out = vec![
                CsStmt::local(CsType::Keyword("var"), it.clone(), Some(value)),
                CsStmt::For {
                    init: vec![CsStmt::local(CsType::Keyword("var"), step.clone(), Some(next(None)))],
                    test: Some(done),
                    update: vec![CsExpr::assign(CsExpr::ident(&step), next(Some(resume)))],
                    body: forward(CsExpr::member(CsExpr::ident(&step), "value")),
                },
            ];
            return Ok((out, ctx));
        }

        let (iterable, ctx) = self.expr(source, ctx)?;
        let (ctx, item) = ctx.temp("item");
        let stmt = CsStmt::ForEach {
            ty: CsType::Keyword("var"),
            name: item.clone(),
            iterable,
            body: forward(CsExpr::ident(&item)),
            is_await: false,
        };
        Ok((vec![stmt], ctx))
    }

    /// `yield* g(...)` where `g` is a source generator of the same kind:
    /// run `g`'s iterator in place on its own exchange.
    fn delegate_to_iterator(
        &mut self,
        source: &IrExpression,
        scope: &GeneratorScope,
        ctx: EmitterContext,
    ) -> Result<Option<(Vec<CsStmt>, EmitterContext)>, Ice> {
        let IrExpressionKind::Call {
            callee,
            type_args,
            args,
            optional: false,
        } = &source.kind
        else {
            return Ok(None);
        };
        let (owner, name, target) = match &callee.kind {
            IrExpressionKind::ModuleMember {
                namespace,
                container,
                name,
            } => {
                let Some(target) = self.program.generator_function(namespace, container, name) else {
                    return Ok(None);
                };
                let owner = match self.module_member(namespace, container, name, &ctx) {
                    CsExpr::Member { object, .. } => Some(*object),
                    _ => None,
                };
                (owner, name, target)
            }
            IrExpressionKind::Member {
                object,
                name,
                optional: false,
                extension: None,
            } if matches!(object.kind, IrExpressionKind::This) => {
                let Some(class) = &self.class_id else {
                    return Ok(None);
                };
                let Some(target) = self.program.generator_method(class, name) else {
                    return Ok(None);
                };
                (None, name, target)
            }
            _ => return Ok(None),
        };
        if target.is_async != scope.is_async || target.type_params != type_args.len() {
            return Ok(None);
        }

        let mut cs_type_args = Vec::with_capacity(type_args.len());
        for arg in type_args {
            cs_type_args.push(self.type_arg(arg, &ctx)?);
        }
        let (args, ctx) = self.args(args, ctx)?;
        let (ctx, inner) = ctx.temp("inner");
        let (ctx, step) = ctx.temp("step");

        let exchange_name = match &owner {
            Some(CsExpr::Type(ty)) => format!("{}.{}", ty, exchange_class(name)),
            _ => exchange_class(name),
        };
        let exchange_ty = CsType::generic(exchange_name, cs_type_args.clone());
        let iterator_callee = match owner {
            Some(owner) => CsExpr::member(owner, iterator_method(name)),
            None => CsExpr::ident(iterator_method(name)),
        };
        let mut call_args = vec![CsArg::new(CsExpr::ident(&inner))];
        call_args.extend(args);
        let iterable = CsExpr::Call {
            callee: Box::new(iterator_callee),
            type_args: cs_type_args,
            args: call_args,
        };

        let exchange = CsExpr::ident(&scope.exchange);
        let inner_expr = CsExpr::ident(&inner);
        let body = vec![
            CsStmt::Expr(CsExpr::assign(
                CsExpr::member(exchange.clone(), "Output"),
                CsExpr::member(inner_expr.clone(), "Output"),
            )),
            CsStmt::YieldReturn(exchange.clone()),
            CsStmt::Expr(CsExpr::assign(
                CsExpr::member(inner_expr, "Input"),
                CsExpr::member(exchange, "Input"),
            )),
        ];
        let out = vec![
            CsStmt::local(CsType::Keyword("var"), inner.clone(), Some(CsExpr::new_object(exchange_ty, Vec::new()))),
            CsStmt::ForEach {
                ty: CsType::Keyword("var"),
                name: step,
                iterable,
                body,
                is_await: scope.is_async,
            },
        ];
        Ok(Some((out, ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        assert_eq!(exchange_class("count"), "count_exchange");
        assert_eq!(iterator_method("class"), "class_iterator");
        assert_eq!(wrapper_class("$walk"), "_walk_Generator");
    }

    #[test]
    fn test_state_machine_guards_reentry_and_completion() {
        let body = state_machine("R", false);
        let running = body.find("_state == Running").unwrap_or(usize::MAX);
        let completed = body.find("_state == Completed").unwrap_or(usize::MAX);
        let suspended = body.find("_state == Suspended").unwrap_or(usize::MAX);
        assert!(running < completed && completed < suspended);
        assert!(body.contains("_iterator.MoveNext()"));
        assert!(state_machine("R", true).contains("await _iterator.MoveNextAsync()"));
    }
}
