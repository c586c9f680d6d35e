//! Statements, patterns and function bodies.

use super::expr::cast;
use super::{BodyBuilder, FunctionFrame, FunctionSpec, GeneratorFrame, infer};
use crate::ir::*;
use tsharp_catalog::convert::{DICTIONARY, EXCEPTION};
use tsharp_catalog::{FunctionParam, FunctionShape, IrType, PassingMode};
use tsharp_syntax::ast::*;
use tsharp_syntax::{Span, codes};

impl<'a> BodyBuilder<'a> {
    pub(crate) fn stmts(&mut self, stmts: &[Stmt]) -> Vec<IrStatement> {
        stmts.iter().flat_map(|s| self.stmt(s)).collect()
    }

    /// Statements in a fresh block scope.
    fn block(&mut self, stmts: &[Stmt]) -> Vec<IrStatement> {
        self.locals.push();
        let out = self.stmts(stmts);
        self.locals.pop();
        out
    }

    /// Body of a loop or branch; a block body is not nested twice.
    fn body_of(&mut self, stmt: &Stmt) -> Vec<IrStatement> {
        match &stmt.kind {
            StmtKind::Block(stmts) => self.block(stmts),
            _ => {
                self.locals.push();
                let out = self.stmt(stmt);
                self.locals.pop();
                out
            }
        }
    }

    pub(crate) fn stmt(&mut self, stmt: &Stmt) -> Vec<IrStatement> {
        let span = stmt.span;
        let one = match &stmt.kind {
            StmtKind::Var(var) => return self.var_decl(var),
            StmtKind::Expr(e) => self.expr_stmt(e),
            StmtKind::Return(value) => self.return_stmt(value.as_ref(), span),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                let test = self.condition(test);
                let then = self.body_of(consequent);
                let otherwise = alternate.as_ref().map(|s| self.body_of(s));
                IrStatement::If { test, then, otherwise }
            }
            StmtKind::While { test, body } => {
                let test = self.condition(test);
                let body = self.body_of(body);
                IrStatement::While { test, body }
            }
            StmtKind::DoWhile { body, test } => {
                let body = self.body_of(body);
                let test = self.condition(test);
                IrStatement::DoWhile { body, test }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                self.locals.push();
                let init = init.as_ref().map(|s| self.stmt(s)).unwrap_or_default();
                let test = test.as_ref().map(|t| self.condition(t));
                let update = update.as_ref().map(|u| self.expr(u, None));
                let body = self.body_of(body);
                self.locals.pop();
                IrStatement::For {
                    init,
                    test,
                    update,
                    body,
                }
            }
            StmtKind::ForOf {
                binding,
                iterable,
                body,
                is_await,
            } => self.for_of(binding, iterable, body, *is_await, span),
            StmtKind::ForIn { binding, object, body } => self.for_in(binding, object, body, span),
            StmtKind::Block(stmts) => IrStatement::Block(self.block(stmts)),
            StmtKind::Break(label) => IrStatement::Break(label.clone()),
            StmtKind::Continue(label) => IrStatement::Continue(label.clone()),
            StmtKind::Throw(value) => self.throw(value),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let block = self.guarded(handler.is_some(), |b| b.block(block));
                let catch = handler.as_ref().map(|h| {
                    self.locals.push();
                    if let Some(param) = &h.param {
                        let exception = self.universe.platform_reference(EXCEPTION, Vec::new());
                        self.locals.declare(param.clone(), exception);
                    }
                    let body = self.guarded(true, |b| b.stmts(&h.body));
                    self.locals.pop();
                    IrCatch {
                        param: h.param.clone(),
                        body,
                    }
                });
                let finally = finalizer.as_ref().map(|f| self.guarded(true, |b| b.block(f)));
                IrStatement::Try { block, catch, finally }
            }
            StmtKind::Switch { discriminant, cases } => {
                let discriminant = self.expr(discriminant, None);
                let hint = discriminant.ty.widen_literal();
                self.locals.push();
                let cases = cases
                    .iter()
                    .map(|case| IrSwitchCase {
                        test: case.test.as_ref().map(|t| self.expr(t, Some(&hint))),
                        body: self.stmts(&case.body),
                    })
                    .collect();
                self.locals.pop();
                IrStatement::Switch { discriminant, cases }
            }
            StmtKind::Function(f) => match &f.body {
                Some(body) => IrStatement::LocalFunction(self.local_function(f, body)),
                None => return Vec::new(),
            },
            StmtKind::Class(_) | StmtKind::Interface(_) | StmtKind::Enum(_) | StmtKind::TypeAlias(_) => {
                self.error(
                    codes::UNSUPPORTED_STATEMENT,
                    span,
                    "type declarations are only supported at module level".to_string(),
                );
                IrStatement::Unsupported("nested declaration".to_string())
            }
            StmtKind::Import(_) | StmtKind::ExportNamed(_) | StmtKind::Empty => return Vec::new(),
            StmtKind::Unsupported(text) => {
                self.error(
                    codes::UNSUPPORTED_STATEMENT,
                    span,
                    format!("unsupported statement `{}`", text),
                );
                IrStatement::Unsupported(text.clone())
            }
        };
        vec![one]
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn var_decl(&mut self, var: &VarDecl) -> Vec<IrStatement> {
        let is_const = var.kind == VarKind::Const;
        let mut out = Vec::with_capacity(var.declarators.len());
        for declarator in &var.declarators {
            if let Some(Expr {
                kind: ExprKind::Yield { argument, delegate },
                span,
            }) = &declarator.init
            {
                out.push(self.yield_declaration(declarator, argument.as_deref(), *delegate, is_const, *span));
                continue;
            }
            let annotated = declarator.ty.as_ref().map(|t| self.convert(t));
            let init = declarator.init.as_ref().map(|e| self.expr(e, annotated.as_ref()));
            let ty = match (annotated, &init) {
                (Some(ty), _) => ty,
                (None, Some(init)) => match infer::widen(&init.ty) {
                    IrType::Unknown => IrType::Any,
                    ty => ty,
                },
                (None, None) => IrType::Any,
            };
            let pattern = self.bind_pattern(&declarator.pattern, &ty);
            out.push(IrStatement::VarDecl {
                pattern,
                init,
                is_const,
            });
        }
        out
    }

    /// Declare the names bound by `pattern` against a value of type `ty`.
    pub(crate) fn bind_pattern(&mut self, pattern: &Pattern, ty: &IrType) -> IrPattern {
        match pattern {
            Pattern::Ident { name, default, .. } => {
                let default = default.as_ref().map(|d| Box::new(self.expr(d, Some(&ty.non_null()))));
                let ty = if default.is_some() { ty.non_null() } else { ty.clone() };
                self.locals.declare(name.clone(), ty.clone());
                IrPattern::Ident {
                    name: name.clone(),
                    ty,
                    default,
                }
            }
            Pattern::Array { elements, rest, .. } => {
                let base = ty.non_null();
                let elements = elements
                    .iter()
                    .enumerate()
                    .map(|(i, element)| {
                        element.as_ref().map(|p| {
                            let slot = match &base {
                                IrType::Tuple { elements, rest } => elements
                                    .get(i)
                                    .cloned()
                                    .or_else(|| rest.as_deref().cloned())
                                    .unwrap_or(IrType::Unknown),
                                other => infer::element_type(other),
                            };
                            self.bind_pattern(p, &slot)
                        })
                    })
                    .collect();
                let rest = rest.as_ref().map(|r| {
                    let elem = match &base {
                        IrType::Tuple { rest: Some(rest), .. } => (**rest).clone(),
                        other => infer::element_type(other),
                    };
                    Box::new(self.bind_pattern(r, &IrType::Array(Box::new(elem))))
                });
                IrPattern::Array {
                    ty: ty.clone(),
                    elements,
                    rest,
                }
            }
            Pattern::Object { props, rest, span } => {
                if rest.is_some() {
                    self.error(
                        codes::UNSUPPORTED_STATEMENT,
                        *span,
                        "object rest patterns are not supported".to_string(),
                    );
                }
                let props = props
                    .iter()
                    .map(|prop| {
                        let member = self.property_type(ty, &prop.key, *span);
                        (prop.key.clone(), self.bind_pattern(&prop.value, &member))
                    })
                    .collect();
                IrPattern::Object { ty: ty.clone(), props }
            }
        }
    }

    /// Type of `ty.key` for destructuring.
    fn property_type(&mut self, ty: &IrType, key: &str, span: Span) -> IrType {
        let base = ty.non_null();
        match &base {
            IrType::Any | IrType::Unknown => IrType::Any,
            IrType::Object(shape) => match shape.property(key) {
                Some(prop) => prop.ty.clone(),
                None => {
                    self.unknown_member(&base, key, span);
                    IrType::Unknown
                }
            },
            IrType::Dictionary { value, .. } => (**value).clone(),
            IrType::Reference { id, args } if id.platform_name.as_ref() == DICTIONARY => {
                args.get(1).cloned().unwrap_or(IrType::Unknown)
            }
            _ => match self.lookup(&base, key).and_then(|found| found.instantiated_type()) {
                Some(member) => member,
                None => {
                    self.unknown_member(&base, key, span);
                    IrType::Unknown
                }
            },
        }
    }

    /// Parameters of a function-like body. Destructured parameters are
    /// renamed `argN` and unpacked by a prologue statement.
    pub(crate) fn bind_params(&mut self, params: &[Param], hints: &[Option<IrType>]) -> (Vec<IrParam>, Vec<IrStatement>) {
        let mut out = Vec::with_capacity(params.len());
        let mut prologue = Vec::new();
        for (i, param) in params.iter().enumerate() {
            let ty = match (&param.ty, hints.get(i).cloned().flatten()) {
                (Some(_), _) => self.types.param_type(param, &mut self.diags),
                (None, Some(hint)) => hint,
                (None, None) => IrType::Any,
            };
            let default = param.default.as_ref().map(|d| self.expr(d, Some(&ty)));
            let optional = param.optional || default.is_some();
            let name = match param.name() {
                Some(name) => {
                    self.locals.declare(name.to_string(), ty.clone());
                    name.to_string()
                }
                None => {
                    let name = format!("arg{}", i);
                    self.locals.declare(name.clone(), ty.clone());
                    let pattern = self.bind_pattern(&param.pattern, &ty);
                    prologue.push(IrStatement::VarDecl {
                        pattern,
                        init: Some(IrExpression::new(
                            IrExpressionKind::Local(name.clone()),
                            ty.clone(),
                            param.span,
                        )),
                        is_const: false,
                    });
                    name
                }
            };
            out.push(IrParam {
                name,
                ty,
                mode: PassingMode::Value,
                default,
                optional,
                rest: param.rest,
            });
        }
        (out, prologue)
    }

    fn local_function(&mut self, f: &FunctionDecl, body: &[Stmt]) -> IrFunction {
        // Declared before the body so the function can call itself.
        let pushed = self.types.push_type_params(f.type_params.iter().map(|p| p.name.clone()));
        let params: Vec<FunctionParam> = f
            .params
            .iter()
            .map(|p| FunctionParam {
                name: p.name().unwrap_or("arg").to_string(),
                ty: self.types.param_type(p, &mut self.diags),
                optional: p.optional || p.default.is_some(),
                rest: p.rest,
            })
            .collect();
        let declared_ret = f.return_type.as_ref().map(|t| self.convert(t));
        self.types.pop_type_params(pushed);
        let shape = |ret: IrType| {
            IrType::Function(Box::new(FunctionShape {
                params: params.clone(),
                ret,
                is_async: f.is_async,
            }))
        };
        self.locals
            .declare(f.name.clone(), shape(declared_ret.clone().unwrap_or(IrType::Any)));

        let function = self.function(&FunctionSpec::from_decl(f, body, None));
        self.locals.declare(f.name.clone(), shape(function.ret.clone()));
        function
    }

    /// Build a function-like body: parameters, frame and result type.
    pub(crate) fn function(&mut self, spec: &FunctionSpec<'_>) -> IrFunction {
        let pushed = self
            .types
            .push_type_params(spec.type_params.iter().map(|p| p.name.clone()));
        let type_params: Vec<IrTypeParam> = spec
            .type_params
            .iter()
            .map(|p| IrTypeParam {
                name: p.name.clone(),
                constraint: p.constraint.as_ref().map(|c| self.convert(c)),
            })
            .collect();

        let declared = match spec.signature {
            Some(sig) => Some(sig.ret.clone()),
            None => spec.return_type.map(|t| self.convert(t)),
        };
        let hints: Vec<Option<IrType>> = match spec.signature {
            Some(sig) => sig.params.iter().map(|p| Some(p.ty.clone())).collect(),
            None => Vec::new(),
        };

        let generator_parts = declared.as_ref().and_then(infer::generator_parts);
        let return_expected = match (&declared, &generator_parts) {
            (_, Some((_, ret, _, _))) => Some(ret.clone()),
            (Some(ty), None) if spec.is_async => Some(infer::awaited(ty)),
            (Some(ty), None) => Some(ty.clone()),
            (None, _) => None,
        };
        let generator = spec.is_generator.then(|| GeneratorFrame {
            yield_expected: generator_parts.as_ref().map(|(y, ..)| y.clone()),
            next_ty: generator_parts
                .as_ref()
                .map(|(_, _, n, _)| n.clone())
                .unwrap_or(IrType::Unknown),
            yields: Vec::new(),
            guarded: 0,
        });

        self.locals.push();
        let signature_params = spec.signature.map(|sig| sig.params.clone());
        let (mut params, prologue) = self.bind_params(spec.params, &hints);
        if let Some(sig_params) = signature_params {
            for (param, entry) in params.iter_mut().zip(sig_params) {
                param.mode = entry.mode;
            }
        }
        self.frames.push(FunctionFrame {
            return_expected,
            returns: Vec::new(),
            generator,
        });
        let body = spec.body.map(|stmts| {
            let mut out = prologue;
            out.extend(self.stmts(stmts));
            out
        });
        let frame = self.frames.pop().unwrap_or_default();
        self.locals.pop();
        self.types.pop_type_params(pushed);

        let ret = match declared {
            Some(ty) => ty,
            None => match spec.fallback_ret.clone() {
                Some(ty) if !ty.is_unknown() => ty,
                _ => inferred_result(&frame, spec.is_async),
            },
        };
        let generator = spec.is_generator.then(|| match infer::generator_parts(&ret) {
            Some((yield_ty, return_ty, next_ty, is_async)) => GeneratorInfo {
                yield_ty,
                return_ty,
                next_ty,
                is_async,
            },
            None => GeneratorInfo {
                yield_ty: IrType::Unknown,
                return_ty: IrType::void(),
                next_ty: IrType::Unknown,
                is_async: spec.is_async,
            },
        });
        IrFunction {
            name: spec.name.to_string(),
            type_params,
            params,
            ret,
            body,
            is_async: spec.is_async,
            generator,
            span: spec.span,
        }
    }

    // ========================================================================
    // Statement forms
    // ========================================================================

    fn expr_stmt(&mut self, e: &Expr) -> IrStatement {
        match &e.kind {
            ExprKind::Yield { argument, delegate } => {
                let output = self.yield_output(argument.as_deref(), *delegate, e.span);
                let stmt = IrStatement::Yield {
                    output,
                    receive: None,
                    is_delegate: *delegate,
                };
                self.suspend(stmt, e.span)
            }
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } if matches!(value.kind, ExprKind::Yield { .. }) => {
                let ExprKind::Yield { argument, delegate } = &value.kind else {
                    return IrStatement::Unsupported("yield".to_string());
                };
                if *delegate {
                    self.error(
                        codes::UNSUPPORTED_YIELD,
                        value.span,
                        "the result of `yield*` cannot be assigned".to_string(),
                    );
                }
                let target = self.expr(target, None);
                let output = self.yield_output(argument.as_deref(), false, value.span);
                let stmt = IrStatement::Yield {
                    output,
                    receive: Some(YieldReceive::Assign { target }),
                    is_delegate: false,
                };
                self.suspend(stmt, value.span)
            }
            ExprKind::Call {
                callee,
                args,
                optional: false,
                ..
            } => match &callee.kind {
                ExprKind::Member {
                    object,
                    property,
                    optional: false,
                } if property == "push" => self.push_stmt(object, args, e),
                _ => IrStatement::Expr(self.expr(e, None)),
            },
            _ => IrStatement::Expr(self.expr(e, None)),
        }
    }

    /// `arr.push(x)` on an array becomes `arr = [..arr, x]`.
    fn push_stmt(&mut self, object: &Expr, args: &[Expr], call: &Expr) -> IrStatement {
        let target = self.expr(object, None);
        let IrType::Array(elem) = target.ty.non_null() else {
            return IrStatement::Expr(self.expr(call, None));
        };
        if !matches!(
            target.kind,
            IrExpressionKind::Local(_) | IrExpressionKind::ModuleMember { .. } | IrExpressionKind::Member { .. }
        ) {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                call.span,
                "`push` needs an assignable array".to_string(),
            );
            return IrStatement::Unsupported("push".to_string());
        }
        let ty = target.ty.clone();
        let mut items = vec![IrExpression::new(
            IrExpressionKind::Spread(Box::new(target.clone())),
            ty.clone(),
            target.span,
        )];
        items.extend(args.iter().map(|a| self.expr(a, Some(elem.as_ref()))));
        let value = IrExpression::new(IrExpressionKind::ArrayLiteral(items), ty.clone(), call.span);
        IrStatement::Expr(IrExpression::new(
            IrExpressionKind::Assign {
                op: None,
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
            call.span,
        ))
    }

    fn return_stmt(&mut self, value: Option<&Expr>, span: Span) -> IrStatement {
        let Some(frame) = self.frames.last() else {
            self.error(
                codes::UNSUPPORTED_STATEMENT,
                span,
                "`return` outside of a function".to_string(),
            );
            return IrStatement::Unsupported("return".to_string());
        };
        let expected = frame.return_expected.clone();
        let value = value.map(|v| {
            let built = self.expr(v, expected.as_ref());
            match &expected {
                Some(target @ IrType::TypeParameter(_)) if built.ty != *target => cast(built, target.clone()),
                _ => built,
            }
        });
        if let (Some(value), Some(frame)) = (&value, self.frame()) {
            frame.returns.push(value.ty.clone());
        }
        IrStatement::Return(value)
    }

    fn throw(&mut self, value: &Expr) -> IrStatement {
        let value = self.expr(value, None);
        let exception_ty = self.universe.platform_reference(EXCEPTION, Vec::new());
        let is_exception = match (&value.ty.non_null(), &exception_ty) {
            (IrType::Reference { id, .. }, IrType::Reference { id: exception, .. }) => {
                self.universe.inherits_from(id, exception)
            }
            (IrType::Any, _) => true,
            _ => false,
        };
        if is_exception {
            return IrStatement::Throw(value);
        }
        let span = value.span;
        let message = if value.ty.is_stringish() {
            value
        } else {
            IrExpression::new(
                IrExpressionKind::Template(vec![IrTemplatePart::Expr(value)]),
                IrType::string(),
                span,
            )
        };
        IrStatement::Throw(IrExpression::new(
            IrExpressionKind::New {
                ty: exception_ty.clone(),
                args: vec![IrArgument::value(message)],
            },
            exception_ty,
            span,
        ))
    }

    fn for_of(&mut self, binding: &ForBinding, iterable: &Expr, body: &Stmt, is_await: bool, span: Span) -> IrStatement {
        let iterable = self.expr(iterable, None);
        let elem = match infer::generator_parts(&iterable.ty) {
            Some((yield_ty, ..)) => yield_ty,
            None => infer::element_type(&iterable.ty.non_null()),
        };
        if elem.is_unknown() && !iterable.ty.is_unknown() {
            self.error(
                codes::UNSUPPORTED_STATEMENT,
                span,
                format!("`{}` is not iterable", iterable.ty),
            );
        }
        self.locals.push();
        let pattern = self.loop_binding(binding, &elem, span);
        let body = self.body_of(body);
        self.locals.pop();
        IrStatement::ForOf {
            pattern,
            iterable,
            body,
            is_await,
        }
    }

    fn for_in(&mut self, binding: &ForBinding, object: &Expr, body: &Stmt, span: Span) -> IrStatement {
        let object = self.expr(object, None);
        let key = match object.ty.non_null() {
            IrType::Dictionary { key, .. } => Some(*key),
            IrType::Reference { id, args } if id.platform_name.as_ref() == DICTIONARY => args.first().cloned(),
            IrType::Object(_) | IrType::Any => Some(IrType::string()),
            _ => None,
        };
        let Some(key) = key else {
            self.error(
                codes::UNSUPPORTED_STATEMENT,
                span,
                format!("`for..in` over `{}` is not supported", object.ty),
            );
            return IrStatement::Unsupported("for..in".to_string());
        };
        self.locals.push();
        let pattern = self.loop_binding(binding, &key, span);
        let body = self.body_of(body);
        self.locals.pop();
        let name = pattern.as_ident().unwrap_or("key").to_string();
        IrStatement::ForIn { name, object, body }
    }

    fn loop_binding(&mut self, binding: &ForBinding, elem: &IrType, span: Span) -> IrPattern {
        if binding.kind.is_none() {
            self.error(
                codes::UNSUPPORTED_STATEMENT,
                span,
                "loop variables must be declared in the loop header".to_string(),
            );
        }
        self.bind_pattern(&binding.pattern, elem)
    }

    // ========================================================================
    // Generators
    // ========================================================================

    /// Value produced by `yield`, recorded against the enclosing generator.
    fn yield_output(&mut self, argument: Option<&Expr>, delegate: bool, span: Span) -> Option<IrExpression> {
        let Some(expected) = self.frames.last().and_then(|f| f.generator.as_ref()).map(|g| g.yield_expected.clone())
        else {
            self.error(
                codes::UNSUPPORTED_YIELD,
                span,
                "`yield` outside of a generator function".to_string(),
            );
            return argument.map(|a| self.expr(a, None));
        };
        let output = argument.map(|a| {
            if delegate {
                self.expr(a, None)
            } else {
                self.expr(a, expected.as_ref())
            }
        });
        let yielded = match &output {
            Some(value) if delegate => match infer::generator_parts(&value.ty) {
                Some((yield_ty, ..)) => yield_ty,
                None => infer::element_type(&value.ty),
            },
            Some(value) => value.ty.clone(),
            None => IrType::Unknown,
        };
        if let Some(generator) = self.frame().and_then(|f| f.generator.as_mut()) {
            generator.yields.push(yielded);
        }
        output
    }

    /// `const x = yield e;`
    fn yield_declaration(
        &mut self,
        declarator: &VarDeclarator,
        argument: Option<&Expr>,
        delegate: bool,
        is_const: bool,
        span: Span,
    ) -> IrStatement {
        if delegate {
            self.error(
                codes::UNSUPPORTED_YIELD,
                span,
                "the result of `yield*` cannot be bound".to_string(),
            );
        }
        let output = self.yield_output(argument, false, span);
        let next_ty = self
            .frames
            .last()
            .and_then(|f| f.generator.as_ref())
            .map(|g| g.next_ty.clone())
            .unwrap_or(IrType::Unknown);
        let ty = match &declarator.ty {
            Some(t) => self.convert(t),
            None if next_ty.is_unknown() => IrType::Any,
            None => next_ty,
        };
        let pattern = self.bind_pattern(&declarator.pattern, &ty);
        let stmt = IrStatement::Yield {
            output,
            receive: Some(YieldReceive::Declare { pattern, is_const }),
            is_delegate: false,
        };
        self.suspend(stmt, span)
    }

    /// Run `f` with the current generator marked as unable to suspend.
    fn guarded<T>(&mut self, on: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        if on && let Some(g) = self.frame().and_then(|f| f.generator.as_mut()) {
            g.guarded += 1;
        }
        let out = f(self);
        if on && let Some(g) = self.frame().and_then(|f| f.generator.as_mut()) {
            g.guarded -= 1;
        }
        out
    }

    /// A suspension point, or a stub where an iterator cannot suspend.
    fn suspend(&mut self, stmt: IrStatement, span: Span) -> IrStatement {
        let guarded = self
            .frames
            .last()
            .and_then(|f| f.generator.as_ref())
            .is_some_and(|g| g.guarded > 0);
        if !guarded {
            return stmt;
        }
        self.error(
            codes::UNSUPPORTED_YIELD,
            span,
            "`yield` cannot appear in `catch`, `finally` or a `try` block with a `catch` clause".to_string(),
        );
        IrStatement::Unsupported("yield inside try".to_string())
    }
}

/// Result type of a body without a declared one.
fn inferred_result(frame: &FunctionFrame, is_async: bool) -> IrType {
    let returned = infer::join_all(frame.returns.iter().cloned()).unwrap_or_else(IrType::void);
    let returned = if returned.is_unknown() { IrType::Any } else { returned };
    match &frame.generator {
        Some(generator) => {
            let yielded = infer::join_all(generator.yields.iter().filter(|t| !t.is_unknown()).cloned())
                .unwrap_or(IrType::Unknown);
            infer::generator_type(yielded, returned, generator.next_ty.clone(), is_async)
        }
        None if is_async => infer::task_of(returned),
        None => returned,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::build;
    use super::*;
    use tsharp_catalog::PrimitiveKind;

    fn function<'m>(module: &'m IrModule, name: &str) -> &'m IrFunction {
        module.functions().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_async_result_is_wrapped_in_task() {
        let (ir, diags) = build(&[("main.ts", "async function load() { return 5; }")]);
        assert!(diags.is_empty(), "{:?}", diags);
        let load = function(&ir[0], "load");
        assert!(load.is_async);
        assert_eq!(load.ret, infer::task_of(IrType::number()));
    }

    #[test]
    fn test_generator_types_are_captured() {
        let (ir, diags) = build(&[(
            "main.ts",
            "function* counter(): Generator<int, string, int> {\n  const step = yield 1;\n  yield step;\n  return \"done\";\n}",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let counter = function(&ir[0], "counter");
        let info = counter.generator.as_ref().unwrap();
        let int = IrType::Primitive(PrimitiveKind::Int);
        assert_eq!(info.yield_ty, int);
        assert_eq!(info.return_ty, IrType::string());
        assert_eq!(info.next_ty, int);
        let body = counter.body.as_ref().unwrap();
        assert!(matches!(
            &body[0],
            IrStatement::Yield {
                receive: Some(YieldReceive::Declare { .. }),
                ..
            }
        ));
    }

    #[test]
    fn test_unannotated_generator_infers_yield_type() {
        let (ir, diags) = build(&[("main.ts", "function* letters() { yield \"a\"; yield \"b\"; }")]);
        assert!(diags.is_empty(), "{:?}", diags);
        let info = function(&ir[0], "letters").generator.clone().unwrap();
        assert_eq!(info.yield_ty, IrType::string());
        assert_eq!(info.return_ty, IrType::void());
    }

    #[test]
    fn test_yield_inside_expression_is_rejected() {
        let (_, diags) = build(&[("main.ts", "function* g() { const x = 1 + (yield 2); }")]);
        assert!(diags.contains_code(codes::UNSUPPORTED_YIELD));
    }

    #[test]
    fn test_yield_under_catch_is_rejected() {
        let (ir, diags) = build(&[(
            "main.ts",
            "function* g(): Generator<int, void, int> {\n  try { yield 1; } catch (e) { yield 2; } finally { yield 3; }\n}",
        )]);
        let found: Vec<&str> = diags.iter().map(|d| d.code).collect();
        assert_eq!(found, vec![codes::UNSUPPORTED_YIELD; 3]);
        let body = function(&ir[0], "g").body.as_ref().unwrap();
        let IrStatement::Try { block, catch, finally } = &body[0] else {
            panic!("expected try");
        };
        assert!(matches!(block[0], IrStatement::Unsupported(_)));
        assert!(matches!(catch.as_ref().unwrap().body[0], IrStatement::Unsupported(_)));
        assert!(matches!(finally.as_ref().unwrap()[0], IrStatement::Unsupported(_)));
    }

    #[test]
    fn test_yield_under_try_finally_is_kept() {
        let (ir, diags) = build(&[(
            "main.ts",
            "function* g(): Generator<int, void, int> {\n  try { const a: int = yield 1; } finally { console.log(\"done\"); }\n  yield 2;\n}",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let body = function(&ir[0], "g").body.as_ref().unwrap();
        let IrStatement::Try { block, .. } = &body[0] else {
            panic!("expected try");
        };
        assert!(matches!(block[0], IrStatement::Yield { .. }));
        assert!(matches!(body[1], IrStatement::Yield { .. }));
    }

    #[test]
    fn test_destructured_parameter_gets_prologue() {
        let (ir, diags) = build(&[(
            "main.ts",
            "function sum([a, b]: [int, int]): int { return a + b; }",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let sum = function(&ir[0], "sum");
        assert_eq!(sum.params[0].name, "arg0");
        assert!(matches!(
            &sum.body.as_ref().unwrap()[0],
            IrStatement::VarDecl {
                pattern: IrPattern::Array { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_push_on_array_rebuilds_it() {
        let (ir, diags) = build(&[("main.ts", "function f() { let xs: int[] = []; xs.push(1); return xs; }")]);
        assert!(diags.is_empty(), "{:?}", diags);
        let body = function(&ir[0], "f").body.clone().unwrap();
        let IrStatement::Expr(assign) = &body[1] else {
            panic!("expected expression statement");
        };
        assert!(matches!(assign.kind, IrExpressionKind::Assign { .. }));
    }

    #[test]
    fn test_throwing_a_string_wraps_it() {
        let (ir, _) = build(&[("main.ts", "function fail() { throw \"boom\"; }")]);
        let body = function(&ir[0], "fail").body.clone().unwrap();
        let IrStatement::Throw(value) = &body[0] else {
            panic!("expected throw");
        };
        assert!(matches!(value.kind, IrExpressionKind::New { .. }));
    }
}
