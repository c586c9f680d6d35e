//! Statement lowering, destructuring and parameter lists.

use crate::context::EmitterContext;
use crate::cs::*;
use crate::emitter::{Lowered, ModuleEmitter};
use crate::error::Ice;
use crate::expr::{not_supported, tuple_item};
use crate::naming::escape_identifier;
use tsharp_catalog::convert::{ASYNC_GENERATOR, DICTIONARY, GENERATOR};
use tsharp_catalog::{IrType, PrimitiveKind};
use tsharp_ir::{
    IrCatch, IrExpression, IrExpressionKind, IrFunction, IrLiteral, IrParam, IrPattern, IrStatement, IrSwitchCase,
};

/// `default!`, the initializer of a declared-but-unassigned local.
pub(crate) fn default_bang() -> CsExpr {
    CsExpr::NullForgiving(Box::new(CsExpr::Default(None)))
}

fn var() -> CsType {
    CsType::Keyword("var")
}

/// Runtime generator values (as opposed to iterables) are driven through
/// `next()`.
pub(crate) fn generator_value(ty: &IrType) -> Option<bool> {
    match ty.non_null() {
        IrType::Reference { id, .. } if id.platform_name.as_ref() == GENERATOR => Some(false),
        IrType::Reference { id, .. } if id.platform_name.as_ref() == ASYNC_GENERATOR => Some(true),
        _ => None,
    }
}

fn is_dictionary(ty: &IrType) -> bool {
    match ty {
        IrType::Dictionary { .. } => true,
        IrType::Reference { id, .. } => id.platform_name.as_ref() == DICTIONARY,
        _ => false,
    }
}

fn is_plain_literal(e: &IrExpression) -> bool {
    match &e.kind {
        IrExpressionKind::Literal(IrLiteral::Number {
            kind: PrimitiveKind::BigInt,
            ..
        }) => false,
        IrExpressionKind::Literal(_) => true,
        IrExpressionKind::Unary { operand, .. } => is_plain_literal(operand),
        _ => false,
    }
}

/// Statement form of a lowered expression.
pub(crate) fn expression_statement(e: CsExpr) -> CsStmt {
    match e {
        CsExpr::Throw(inner) => CsStmt::Throw(Some(*inner)),
        e if e.is_statement_expression() => CsStmt::Expr(e),
        e => CsStmt::Expr(CsExpr::assign(CsExpr::ident("_"), e)),
    }
}

impl ModuleEmitter<'_> {
    pub fn stmts(&mut self, stmts: &[IrStatement], ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut ctx = ctx;
        for stmt in stmts {
            let (lowered, next) = self.stmt(stmt, ctx)?;
            out.extend(lowered);
            ctx = next;
        }
        Ok((out, ctx))
    }

    /// A nested block with its own scope.
    pub fn block(&mut self, stmts: &[IrStatement], ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let inner = ctx.clone().push_scope();
        let (out, inner) = self.stmts(stmts, inner)?;
        Ok((out, ctx.absorb(&inner)))
    }

    pub fn stmt(&mut self, stmt: &IrStatement, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        match stmt {
            IrStatement::VarDecl { pattern, init, .. } => self.var_decl(pattern, init.as_ref(), ctx),
            IrStatement::Expr(e) => {
                let (e, ctx) = self.expr(e, ctx)?;
                Ok((vec![expression_statement(e)], ctx))
            }
            IrStatement::Return(value) => self.return_stmt(value.as_ref(), ctx),
            IrStatement::If { test, then, otherwise } => {
                let (test, ctx) = self.expr(test, ctx)?;
                let (then, ctx) = self.block(then, ctx)?;
                let (otherwise, ctx) = match otherwise {
                    Some(stmts) => {
                        let (lowered, ctx) = self.block(stmts, ctx)?;
                        (Some(lowered), ctx)
                    }
                    None => (None, ctx),
                };
                Ok((vec![CsStmt::If { test, then, otherwise }], ctx))
            }
            IrStatement::While { test, body } => {
                let (test, ctx) = self.expr(test, ctx)?;
                let (body, ctx) = self.block(body, ctx)?;
                Ok((vec![CsStmt::While { test, body }], ctx))
            }
            IrStatement::DoWhile { body, test } => {
                let (body, ctx) = self.block(body, ctx)?;
                let (test, ctx) = self.expr(test, ctx)?;
                Ok((vec![CsStmt::DoWhile { body, test }], ctx))
            }
            IrStatement::For {
                init,
                test,
                update,
                body,
            } => self.for_stmt(init, test.as_ref(), update.as_ref(), body, ctx),
            IrStatement::ForOf {
                pattern,
                iterable,
                body,
                is_await,
            } => self.for_of(pattern, iterable, body, *is_await, ctx),
            IrStatement::ForIn { name, object, body } => self.for_in(name, object, body, ctx),
            IrStatement::Block(stmts) => {
                let (lowered, ctx) = self.block(stmts, ctx)?;
                Ok((vec![CsStmt::Block(lowered)], ctx))
            }
            // Labels were reported by the builder; C# has no labelled break.
            IrStatement::Break(_) => Ok((vec![CsStmt::Break], ctx)),
            IrStatement::Continue(_) => Ok((vec![CsStmt::Continue], ctx)),
            IrStatement::Throw(e) => {
                let wrap = e.ty.is_stringish() || matches!(e.ty, IrType::Primitive(_) | IrType::Literal(_));
                let is_string = e.ty.is_stringish();
                let (lowered, ctx) = self.expr(e, ctx)?;
                let thrown = match (wrap, is_string) {
                    (true, true) => CsExpr::new_object(CsType::named("global::System.Exception"), vec![lowered]),
                    (true, false) => CsExpr::new_object(
                        CsType::named("global::System.Exception"),
                        vec![CsExpr::call(CsExpr::member(lowered, "ToString"), Vec::new())],
                    ),
                    _ => lowered,
                };
                Ok((vec![CsStmt::Throw(Some(thrown))], ctx))
            }
            IrStatement::Try { block, catch, finally } => self.try_stmt(block, catch.as_ref(), finally.as_deref(), ctx),
            IrStatement::Switch { discriminant, cases } => self.switch(discriminant, cases, ctx),
            IrStatement::Yield {
                output,
                receive,
                is_delegate,
            } => self.yield_stmt(output.as_ref(), receive.as_ref(), *is_delegate, ctx),
            IrStatement::LocalFunction(function) => self.local_function(function, ctx),
            IrStatement::Unsupported(description) => Ok((vec![CsStmt::Throw(Some(not_supported(description)))], ctx)),
        }
    }

    fn return_stmt(&mut self, value: Option<&IrExpression>, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let Some(value) = value else {
            let stmt = if ctx.generator.is_some() {
                CsStmt::YieldBreak
            } else {
                CsStmt::Return(None)
            };
            return Ok((vec![stmt], ctx));
        };
        let (lowered, ctx) = self.expr(value, ctx)?;
        if ctx.generator.is_none() {
            return Ok((vec![CsStmt::Return(Some(lowered))], ctx));
        }
        // A generator's return value is not observable through `next()`.
        let mut out = Vec::new();
        if lowered.is_statement_expression() {
            out.push(CsStmt::Expr(lowered));
        }
        out.push(CsStmt::YieldBreak);
        Ok((out, ctx))
    }

    fn var_decl(&mut self, pattern: &IrPattern, init: Option<&IrExpression>, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let (init, ctx) = match init {
            Some(e) => {
                let (lowered, ctx) = self.expr(e, ctx)?;
                (Some(lowered), ctx)
            }
            None => (None, ctx),
        };
        match pattern {
            IrPattern::Ident { name, ty, default } => {
                let (value, ctx) = match (init, default) {
                    (Some(value), Some(default)) => {
                        let (default, ctx) = self.expr(default, ctx)?;
                        (Some(CsExpr::binary(value, "??", default)), ctx)
                    }
                    (value, _) => (value, ctx),
                };
                let cs_ty = if ty.is_unknown() && value.is_some() {
                    var()
                } else {
                    self.cs_type(ty, &ctx)?
                };
                let (ctx, local) = ctx.declare(name);
                let value = value.unwrap_or_else(default_bang);
                Ok((vec![CsStmt::local(cs_ty, local, Some(value))], ctx))
            }
            _ => {
                let (ctx, temp) = ctx.temp("destructured");
                let value = init.unwrap_or_else(default_bang);
                let mut out = vec![CsStmt::local(var(), temp.clone(), Some(value))];
                let (bindings, ctx) = self.destructure(pattern, CsExpr::Ident(temp), ctx)?;
                out.extend(bindings);
                Ok((out, ctx))
            }
        }
    }

    /// Declare the names of `pattern`, reading each part out of `source`.
    pub(crate) fn destructure(&mut self, pattern: &IrPattern, source: CsExpr, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        match pattern {
            IrPattern::Ident { name, ty, default } => {
                let (value, ctx) = match default {
                    Some(default) => {
                        let (default, ctx) = self.expr(default, ctx)?;
                        (CsExpr::binary(source, "??", default), ctx)
                    }
                    None => (source, ctx),
                };
                let cs_ty = if ty.is_unknown() { var() } else { self.cs_type(ty, &ctx)? };
                let (ctx, local) = ctx.declare(name);
                Ok((vec![CsStmt::local(cs_ty, local, Some(value))], ctx))
            }
            IrPattern::Array { ty, elements, rest } => {
                let base = ty.non_null();
                let (fixed, has_rest) = match &base {
                    IrType::Tuple { elements, rest } => (Some(elements.len()), rest.is_some()),
                    _ => (None, false),
                };
                let mut out = Vec::new();
                let mut ctx = ctx;
                for (i, element) in elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    let access = match fixed {
                        Some(n) if i < n => tuple_item(source.clone(), i),
                        Some(n) if has_rest => index(tail_of(source.clone(), n), CsExpr::Literal((i - n).to_string())),
                        _ => index(source.clone(), CsExpr::Literal(i.to_string())),
                    };
                    let (lowered, next) = self.destructure(element, access, ctx)?;
                    out.extend(lowered);
                    ctx = next;
                }
                if let Some(rest) = rest {
                    let n = elements.len();
                    let access = match fixed {
                        Some(f) if has_rest && n == f => tail_of(source, f),
                        Some(f) if has_rest => index(tail_of(source, f), CsExpr::Verbatim(format!("{}..", n - f))),
                        _ => index(source, CsExpr::Verbatim(format!("{}..", n))),
                    };
                    let (lowered, next) = self.destructure(rest, access, ctx)?;
                    out.extend(lowered);
                    ctx = next;
                }
                Ok((out, ctx))
            }
            IrPattern::Object { ty, props } => {
                let keyed = is_dictionary(&ty.non_null());
                let mut out = Vec::new();
                let mut ctx = ctx;
                for (key, prop) in props {
                    let access = if keyed {
                        index(source.clone(), CsExpr::string(key))
                    } else {
                        CsExpr::member(source.clone(), escape_identifier(key))
                    };
                    let (lowered, next) = self.destructure(prop, access, ctx)?;
                    out.extend(lowered);
                    ctx = next;
                }
                Ok((out, ctx))
            }
        }
    }

    fn for_stmt(
        &mut self,
        init: &[IrStatement],
        test: Option<&IrExpression>,
        update: Option<&IrExpression>,
        body: &[IrStatement],
        ctx: EmitterContext,
    ) -> Lowered<Vec<CsStmt>> {
        let inner = ctx.clone().push_scope();
        let (init, inner) = self.stmts(init, inner)?;
        let (test, inner) = match test {
            Some(e) => {
                let (lowered, inner) = self.expr(e, inner)?;
                (Some(lowered), inner)
            }
            None => (None, inner),
        };
        let (update, inner) = match update {
            Some(e) => {
                let (lowered, inner) = self.expr(e, inner)?;
                (vec![lowered], inner)
            }
            None => (Vec::new(), inner),
        };
        let (body, inner) = self.block(body, inner)?;
        let ctx = ctx.absorb(&inner);

        let inline = matches!(init.as_slice(), [CsStmt::Local { .. }])
            || init.iter().all(|s| matches!(s, CsStmt::Expr(_)));
        if inline {
            return Ok((vec![CsStmt::For { init, test, update, body }], ctx));
        }
        let mut block = init;
        block.push(CsStmt::For {
            init: Vec::new(),
            test,
            update,
            body,
        });
        Ok((vec![CsStmt::Block(block)], ctx))
    }

    fn for_of(
        &mut self,
        pattern: &IrPattern,
        iterable: &IrExpression,
        body: &[IrStatement],
        is_await: bool,
        ctx: EmitterContext,
    ) -> Lowered<Vec<CsStmt>> {
        let (source, ctx) = self.expr(iterable, ctx)?;
        let inner = ctx.clone().push_scope();

        if let Some(is_async) = generator_value(&iterable.ty) {
            let (inner, it) = inner.temp("it");
            let (inner, step) = inner.temp("step");
            let (binding, inner) = self.destructure(pattern, CsExpr::member(CsExpr::ident(&step), "value"), inner)?;
            let (lowered, inner) = self.block(body, inner)?;
            let next = || {
                let call = CsExpr::call(CsExpr::member(CsExpr::ident(&it), "next"), Vec::new());
                if is_async { CsExpr::Await(Box::new(call)) } else { call }
            };
            let done = CsExpr::Unary {
                op: "!",
                operand: Box::new(CsExpr::member(CsExpr::ident(&step), "done")),
                postfix: false,
            };
            let mut loop_body = binding;
            loop_body.extend(lowered);
            let out = vec![
                CsStmt::local(var(), it.clone(), Some(source)),
                CsStmt::For {
                    init: vec![CsStmt::local(var(), step.clone(), Some(next()))],
                    test: Some(done),
                    update: vec![CsExpr::assign(CsExpr::ident(&step), next())],
                    body: loop_body,
                },
            ];
            return Ok((out, ctx.absorb(&inner)));
        }

        // Strings iterate as chars; bind each one as a string.
        let over_string = iterable.ty.non_null().is_stringish();
        let (ty, name, prelude, inner) = match pattern {
            IrPattern::Ident { name, ty, default: None } if !over_string => {
                let cs_ty = if ty.is_unknown() { var() } else { self.cs_type(ty, &inner)? };
                let (inner, local) = inner.declare(name);
                (cs_ty, local, Vec::new(), inner)
            }
            _ => {
                let (inner, item) = inner.temp("item");
                let value = if over_string {
                    CsExpr::call(CsExpr::member(CsExpr::ident(&item), "ToString"), Vec::new())
                } else {
                    CsExpr::ident(&item)
                };
                let (prelude, inner) = self.destructure(pattern, value, inner)?;
                (var(), item, prelude, inner)
            }
        };
        let (lowered, inner) = self.block(body, inner)?;
        let mut loop_body = prelude;
        loop_body.extend(lowered);
        let stmt = CsStmt::ForEach {
            ty,
            name,
            iterable: source,
            body: loop_body,
            is_await,
        };
        Ok((vec![stmt], ctx.absorb(&inner)))
    }

    fn for_in(&mut self, name: &str, object: &IrExpression, body: &[IrStatement], ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let base = object.ty.non_null();
        let (keys, ctx) = match &base {
            IrType::Object(shape) => {
                let names = shape.properties.iter().map(|p| CsExpr::string(&p.name)).collect();
                let keys = CsExpr::NewArray {
                    elem: CsType::Keyword("string"),
                    size: None,
                    items: names,
                };
                (keys, ctx)
            }
            _ => {
                let (object, ctx) = self.expr(object, ctx)?;
                (CsExpr::member(object, "Keys"), ctx)
            }
        };
        let inner = ctx.clone().push_scope();
        let (inner, local) = inner.declare(name);
        let (body, inner) = self.block(body, inner)?;
        let stmt = CsStmt::ForEach {
            ty: var(),
            name: local,
            iterable: keys,
            body,
            is_await: false,
        };
        Ok((vec![stmt], ctx.absorb(&inner)))
    }

    fn try_stmt(
        &mut self,
        block: &[IrStatement],
        catch: Option<&IrCatch>,
        finally: Option<&[IrStatement]>,
        ctx: EmitterContext,
    ) -> Lowered<Vec<CsStmt>> {
        let (block, ctx) = self.block(block, ctx)?;
        let mut catches = Vec::new();
        let mut ctx = ctx;
        if let Some(catch) = catch {
            let inner = ctx.clone().push_scope();
            let (name, inner) = match &catch.param {
                Some(param) => {
                    let (inner, local) = inner.declare(param);
                    (Some(local), inner)
                }
                None => (None, inner),
            };
            let (body, inner) = self.stmts(&catch.body, inner)?;
            ctx = ctx.absorb(&inner);
            catches.push(CsCatch {
                ty: Some(CsType::named("global::System.Exception")),
                name,
                body,
            });
        }
        let (finally, ctx) = match finally {
            Some(stmts) => {
                let (lowered, ctx) = self.block(stmts, ctx)?;
                (Some(lowered), ctx)
            }
            None => (None, ctx),
        };
        Ok((vec![CsStmt::Try { block, catches, finally }], ctx))
    }

    /// Empty cases share the next section; every section ends in a jump.
    fn switch(&mut self, discriminant: &IrExpression, cases: &[IrSwitchCase], ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let (subject, ctx) = self.expr(discriminant, ctx)?;
        let mut ctx = ctx;
        let mut sections = Vec::new();
        let mut labels = Vec::new();
        for (i, case) in cases.iter().enumerate() {
            let label = match &case.test {
                Some(test) => {
                    let (lowered, next) = self.expr(test, ctx)?;
                    ctx = next;
                    Some(lowered)
                }
                None => None,
            };
            labels.push(label);
            if case.body.is_empty() && i + 1 < cases.len() {
                continue;
            }
            let (mut body, next) = self.block(&case.body, ctx)?;
            ctx = next;
            if !body.last().is_some_and(CsStmt::is_jump) {
                body.push(CsStmt::Break);
            }
            sections.push(CsSwitchSection {
                labels: std::mem::take(&mut labels),
                body,
            });
        }
        Ok((vec![CsStmt::Switch { subject, sections }], ctx))
    }

    fn local_function(&mut self, function: &IrFunction, ctx: EmitterContext) -> Lowered<Vec<CsStmt>> {
        let (ctx, name) = ctx.declare(&function.name);
        if function.generator.is_some() {
            let message = format!("local generator function `{}`", function.name);
            return Ok((vec![CsStmt::Throw(Some(not_supported(&message)))], ctx));
        }
        let inner = ctx
            .clone()
            .push_scope()
            .without_generator()
            .with_async(function.is_async)
            .with_function(&function.name)
            .with_type_params(function.type_params.iter().map(|p| p.name.clone()));
        let type_params = self.type_params(&function.type_params, &inner)?;
        let ret = self.cs_type(&function.ret, &inner)?;
        let (params, body, inner) = self.function_body(function, inner)?;
        let method = CsMethod {
            modifiers: if function.is_async { vec!["async"] } else { Vec::new() },
            ret,
            name,
            type_params,
            params,
            body: Some(body.unwrap_or_default()),
        };
        Ok((vec![CsStmt::LocalFunction(method)], ctx.absorb(&inner)))
    }

    /// Parameters and lowered body of a non-generator function.
    pub(crate) fn function_body(
        &mut self,
        function: &IrFunction,
        ctx: EmitterContext,
    ) -> Result<(Vec<CsParam>, Option<Vec<CsStmt>>, EmitterContext), Ice> {
        let (params, prologue, ctx) = self.params(&function.params, ctx)?;
        let Some(stmts) = &function.body else {
            return Ok((params, None, ctx));
        };
        let (lowered, ctx) = self.stmts(stmts, ctx)?;
        let mut body = prologue;
        body.extend(lowered);
        Ok((params, Some(body), ctx))
    }

    /// C# parameters plus the prologue that applies non-constant defaults.
    pub(crate) fn params(
        &mut self,
        params: &[IrParam],
        ctx: EmitterContext,
    ) -> Result<(Vec<CsParam>, Vec<CsStmt>, EmitterContext), Ice> {
        let mut ctx = ctx;
        let mut out = Vec::with_capacity(params.len());
        for param in params {
            let name = escape_identifier(&param.name);
            ctx = ctx.declare_as(&param.name, &name);
            let ty = self.cs_type(&param.ty, &ctx)?;
            let mut cs = CsParam::new(ty, name);
            cs.modifier = if param.rest { Some("params") } else { param.mode.keyword() };
            match &param.default {
                Some(default) if is_plain_literal(default) => {
                    let (lowered, next) = self.expr(default, ctx)?;
                    ctx = next;
                    cs.default = Some(lowered);
                }
                Some(_) => {
                    cs.ty = cs.ty.nullable();
                    cs.default = Some(CsExpr::Default(None));
                }
                None if param.optional => {
                    cs.ty = cs.ty.nullable();
                    cs.default = Some(CsExpr::Default(None));
                }
                None => {}
            }
            out.push(cs);
        }

        let mut prologue = Vec::new();
        for param in params {
            let Some(default) = &param.default else { continue };
            if is_plain_literal(default) {
                continue;
            }
            let passed = CsExpr::Ident(ctx.resolve(&param.name));
            let (value, next) = self.expr(default, ctx)?;
            let ty = self.cs_type(&param.ty, &next)?;
            let (next, local) = next.declare(&param.name);
            ctx = next;
            prologue.push(CsStmt::local(ty, local, Some(CsExpr::binary(passed, "??", value))));
        }
        Ok((out, prologue, ctx))
    }
}

fn index(object: CsExpr, index: CsExpr) -> CsExpr {
    CsExpr::Index {
        object: Box::new(object),
        index: Box::new(index),
        conditional: false,
    }
}

/// The rest array of a tuple with `fixed` leading elements.
fn tail_of(source: CsExpr, fixed: usize) -> CsExpr {
    if fixed == 0 { source } else { tuple_item(source, fixed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_statement_expressions_are_discarded() {
        let stmt = expression_statement(CsExpr::ident("x"));
        assert_eq!(stmt, CsStmt::Expr(CsExpr::assign(CsExpr::ident("_"), CsExpr::ident("x"))));
        let call = CsExpr::call(CsExpr::ident("f"), Vec::new());
        assert_eq!(expression_statement(call.clone()), CsStmt::Expr(call));
    }

    #[test]
    fn test_throw_expression_becomes_throw_statement() {
        let stmt = expression_statement(CsExpr::Throw(Box::new(CsExpr::ident("e"))));
        assert_eq!(stmt, CsStmt::Throw(Some(CsExpr::ident("e"))));
    }

    #[test]
    fn test_tuple_tail_access() {
        assert_eq!(tail_of(CsExpr::ident("t"), 0), CsExpr::ident("t"));
        assert_eq!(tail_of(CsExpr::ident("t"), 2), CsExpr::member(CsExpr::ident("t"), "Item3"));
    }
}
