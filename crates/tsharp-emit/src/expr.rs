//! Expression lowering.

use crate::context::EmitterContext;
use crate::cs::*;
use crate::emitter::{Lowered, ModuleEmitter};
use crate::naming::escape_identifier;
use tsharp_catalog::convert::DICTIONARY;
use tsharp_catalog::{IrType, PrimitiveKind};
use tsharp_ir::{
    IrArgument, IrBinaryOp, IrExpression, IrExpressionKind, IrLambda, IrLiteral, IrTemplatePart, IrUnaryOp,
    LambdaBody,
};
use tsharp_syntax::ast::UpdateOp;

/// C# spelling of a numeric literal typed as `kind`.
pub fn number_literal(raw: &str, kind: PrimitiveKind) -> String {
    let lower = raw.to_ascii_lowercase();
    let radix = if lower.starts_with("0x") {
        Some(16)
    } else if lower.starts_with("0b") {
        Some(2)
    } else if lower.starts_with("0o") {
        Some(8)
    } else {
        None
    };
    // Prefixed forms are integers; spell them in decimal so suffixes apply.
    let text = match radix {
        Some(radix) => {
            let digits: String = raw[2..].chars().filter(|c| *c != '_').collect();
            u128::from_str_radix(&digits, radix)
                .map(|v| v.to_string())
                .unwrap_or_else(|_| raw.to_string())
        }
        None => {
            let mut text = raw.to_string();
            if text.ends_with('.') {
                text.push('0');
            }
            text
        }
    };
    let is_real = text.contains(['.', 'e', 'E']);
    match kind {
        PrimitiveKind::Number if is_real => text,
        PrimitiveKind::Number => format!("{}.0", text),
        PrimitiveKind::Float => format!("{}f", text),
        PrimitiveKind::Decimal => format!("{}m", text),
        PrimitiveKind::Long => format!("{}L", text),
        PrimitiveKind::UInt => format!("{}U", text),
        PrimitiveKind::ULong => format!("{}UL", text),
        _ => text,
    }
}

fn binary_op(op: IrBinaryOp) -> &'static str {
    match op {
        IrBinaryOp::Add => "+",
        IrBinaryOp::Sub => "-",
        IrBinaryOp::Mul => "*",
        IrBinaryOp::Div => "/",
        IrBinaryOp::Mod => "%",
        IrBinaryOp::Eq => "==",
        IrBinaryOp::NotEq => "!=",
        IrBinaryOp::Lt => "<",
        IrBinaryOp::Le => "<=",
        IrBinaryOp::Gt => ">",
        IrBinaryOp::Ge => ">=",
        IrBinaryOp::And => "&&",
        IrBinaryOp::Or => "||",
        IrBinaryOp::Coalesce => "??",
        IrBinaryOp::BitAnd => "&",
        IrBinaryOp::BitOr => "|",
        IrBinaryOp::BitXor => "^",
        IrBinaryOp::Shl => "<<",
        IrBinaryOp::Shr => ">>",
        IrBinaryOp::UShr => ">>>",
    }
}

/// Compound assignment operator, where C# has one.
fn compound_op(op: IrBinaryOp) -> Option<&'static str> {
    Some(match op {
        IrBinaryOp::Add => "+=",
        IrBinaryOp::Sub => "-=",
        IrBinaryOp::Mul => "*=",
        IrBinaryOp::Div => "/=",
        IrBinaryOp::Mod => "%=",
        IrBinaryOp::Coalesce => "??=",
        IrBinaryOp::BitAnd => "&=",
        IrBinaryOp::BitOr => "|=",
        IrBinaryOp::BitXor => "^=",
        IrBinaryOp::Shl => "<<=",
        IrBinaryOp::Shr => ">>=",
        IrBinaryOp::UShr => ">>>=",
        _ => return None,
    })
}

/// `throw new global::System.NotSupportedException("...")` standing in for
/// a construct the builder already reported.
pub(crate) fn not_supported(description: &str) -> CsExpr {
    CsExpr::new_object(
        CsType::named("global::System.NotSupportedException"),
        vec![CsExpr::string(&format!("unsupported: {}", description))],
    )
}

pub(crate) fn tuple_item(object: CsExpr, index: usize) -> CsExpr {
    CsExpr::member(object, format!("Item{}", index + 1))
}

fn literal_index(e: &IrExpression) -> Option<usize> {
    match &e.kind {
        IrExpressionKind::Literal(IrLiteral::Number { raw, .. }) => raw.parse().ok(),
        IrExpressionKind::Cast { expr, .. } => literal_index(expr),
        _ => None,
    }
}

impl ModuleEmitter<'_> {
    pub fn expr(&mut self, e: &IrExpression, ctx: EmitterContext) -> Lowered<CsExpr> {
        let lowered = match &e.kind {
            IrExpressionKind::Literal(literal) => match literal {
                IrLiteral::Number { raw, kind: PrimitiveKind::BigInt } => CsExpr::call(
                    CsExpr::member(CsExpr::Type(CsType::named("global::System.Numerics.BigInteger")), "Parse"),
                    vec![CsExpr::string(raw.trim_end_matches('n'))],
                ),
                IrLiteral::Number { raw, kind } => CsExpr::Literal(number_literal(raw, *kind)),
                IrLiteral::String(s) => CsExpr::string(s),
                IrLiteral::Bool(b) => CsExpr::Literal(b.to_string()),
                IrLiteral::Null => CsExpr::Literal("null".to_string()),
            },
            IrExpressionKind::Template(parts) => return self.template(parts, ctx),
            IrExpressionKind::Local(name) => CsExpr::Ident(ctx.resolve(name)),
            IrExpressionKind::ModuleMember {
                namespace,
                container,
                name,
            } => self.module_member(namespace, container, name, &ctx),
            IrExpressionKind::TypeRef(ty) => {
                let ty = self.cs_type(ty, &ctx)?;
                CsExpr::Type(ty.non_nullable().clone())
            }
            IrExpressionKind::This => CsExpr::This,
            IrExpressionKind::Super => CsExpr::Base,
            IrExpressionKind::Member {
                object,
                name,
                optional,
                extension,
            } => {
                let ctx = match extension {
                    Some(namespace) => ctx.with_using(namespace),
                    None => ctx,
                };
                let (object, ctx) = self.expr(object, ctx)?;
                let member = CsExpr::Member {
                    object: Box::new(object),
                    name: escape_identifier(name),
                    conditional: *optional,
                };
                return Ok((member, ctx));
            }
            IrExpressionKind::StaticMember { owner, name } => {
                let owner = self.cs_type(owner, &ctx)?;
                CsExpr::member(CsExpr::Type(owner.non_nullable().clone()), escape_identifier(name))
            }
            IrExpressionKind::Index {
                object,
                index,
                optional,
            } => return self.index(object, index, *optional, ctx),
            IrExpressionKind::Call {
                callee,
                type_args,
                args,
                optional,
            } => return self.call(callee, type_args, args, *optional, ctx),
            IrExpressionKind::New { ty, args } => return self.new_expr(ty, args, ctx),
            IrExpressionKind::Unary { op, operand } => {
                let (operand, ctx) = self.expr(operand, ctx)?;
                let op = match op {
                    IrUnaryOp::Not => "!",
                    IrUnaryOp::Neg => "-",
                    IrUnaryOp::Plus => "+",
                    IrUnaryOp::BitNot => "~",
                };
                let unary = CsExpr::Unary {
                    op,
                    operand: Box::new(operand),
                    postfix: false,
                };
                return Ok((unary, ctx));
            }
            IrExpressionKind::Update { op, prefix, target } => {
                let (target, ctx) = self.expr(target, ctx)?;
                let op = match op {
                    UpdateOp::Increment => "++",
                    UpdateOp::Decrement => "--",
                };
                let update = CsExpr::Unary {
                    op,
                    operand: Box::new(target),
                    postfix: !prefix,
                };
                return Ok((update, ctx));
            }
            IrExpressionKind::Binary { op, left, right } => {
                let (left, ctx) = self.expr(left, ctx)?;
                let (right, ctx) = self.expr(right, ctx)?;
                return Ok((CsExpr::binary(left, binary_op(*op), right), ctx));
            }
            IrExpressionKind::Assign { op, target, value } => {
                let (target, ctx) = self.expr(target, ctx)?;
                let (value, ctx) = self.expr(value, ctx)?;
                let assign = match op.map(|op| (op, compound_op(op))) {
                    None => CsExpr::assign(target, value),
                    Some((_, Some(compound))) => CsExpr::Assign {
                        op: compound,
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    // `&&=` and `||=` have no C# form.
                    Some((op, None)) => {
                        let combined = CsExpr::binary(target.clone(), binary_op(op), value);
                        CsExpr::assign(target, combined)
                    }
                };
                return Ok((assign, ctx));
            }
            IrExpressionKind::Conditional { test, then, otherwise } => {
                let (test, ctx) = self.expr(test, ctx)?;
                let (then, ctx) = self.expr(then, ctx)?;
                let (otherwise, ctx) = self.expr(otherwise, ctx)?;
                let conditional = CsExpr::Conditional {
                    test: Box::new(test),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                };
                return Ok((conditional, ctx));
            }
            IrExpressionKind::ArrayLiteral(items) => return self.array_literal(items, &e.ty, ctx),
            IrExpressionKind::Tuple(items) => return self.tuple_literal(items, &e.ty, ctx),
            IrExpressionKind::ObjectLiteral(props) => return self.object_literal(props, &e.ty, ctx),
            IrExpressionKind::Function(lambda) => return self.lambda(lambda, ctx),
            IrExpressionKind::Await(inner) => {
                let (inner, ctx) = self.expr(inner, ctx)?;
                return Ok((CsExpr::Await(Box::new(inner)), ctx));
            }
            IrExpressionKind::Cast { expr, target } => {
                let ty = self.cs_type(target, &ctx)?;
                let (inner, ctx) = self.expr(expr, ctx)?;
                return Ok((CsExpr::cast(ty, inner), ctx));
            }
            IrExpressionKind::NonNull(inner) => {
                let (inner, ctx) = self.expr(inner, ctx)?;
                return Ok((CsExpr::NullForgiving(Box::new(inner)), ctx));
            }
            IrExpressionKind::Spread(inner) => {
                let (inner, ctx) = self.expr(inner, ctx)?;
                return Ok((CsExpr::Spread(Box::new(inner)), ctx));
            }
            IrExpressionKind::Is { expr, target } => {
                let (inner, ctx) = self.expr(expr, ctx)?;
                if target.is_nullish() {
                    let test = CsExpr::binary(inner, "==", CsExpr::Literal("null".to_string()));
                    return Ok((test, ctx));
                }
                let ty = self.cs_type(target, &ctx)?;
                let test = CsExpr::Is {
                    expr: Box::new(inner),
                    ty: ty.non_nullable().clone(),
                };
                return Ok((test, ctx));
            }
            IrExpressionKind::Unsupported(description) => CsExpr::Throw(Box::new(not_supported(description))),
        };
        Ok((lowered, ctx))
    }

    pub fn exprs(&mut self, items: &[IrExpression], ctx: EmitterContext) -> Lowered<Vec<CsExpr>> {
        let mut out = Vec::with_capacity(items.len());
        let mut ctx = ctx;
        for item in items {
            let (lowered, next) = self.expr(item, ctx)?;
            out.push(lowered);
            ctx = next;
        }
        Ok((out, ctx))
    }

    /// Call arguments. A spread argument fills a `params` array directly.
    pub fn args(&mut self, args: &[IrArgument], ctx: EmitterContext) -> Lowered<Vec<CsArg>> {
        let mut out = Vec::with_capacity(args.len());
        let mut ctx = ctx;
        for arg in args {
            let value = match &arg.value.kind {
                IrExpressionKind::Spread(inner) => inner.as_ref(),
                _ => &arg.value,
            };
            let (lowered, next) = self.expr(value, ctx)?;
            out.push(CsArg {
                modifier: arg.mode.keyword(),
                value: lowered,
            });
            ctx = next;
        }
        Ok((out, ctx))
    }

    fn template(&mut self, parts: &[IrTemplatePart], ctx: EmitterContext) -> Lowered<CsExpr> {
        let mut out = Vec::with_capacity(parts.len());
        let mut ctx = ctx;
        for part in parts {
            match part {
                IrTemplatePart::Text(text) => out.push(CsInterpolation::Text(text.clone())),
                IrTemplatePart::Expr(e) => {
                    let (lowered, next) = self.expr(e, ctx)?;
                    out.push(CsInterpolation::Expr(lowered));
                    ctx = next;
                }
            }
        }
        Ok((CsExpr::Interpolated(out), ctx))
    }

    /// A module-level function or variable: unqualified inside its own
    /// container, `global::`-qualified everywhere else.
    pub(crate) fn module_member(&self, namespace: &str, container: &str, name: &str, ctx: &EmitterContext) -> CsExpr {
        let container = self.program.container(namespace, container);
        let name = escape_identifier(name);
        if ctx.in_container && namespace == self.module.namespace && container == self.container {
            return CsExpr::Ident(name);
        }
        let owner = CsType::named(self.qualify(namespace, &container));
        CsExpr::member(CsExpr::Type(owner), name)
    }

    fn index(&mut self, object: &IrExpression, index: &IrExpression, optional: bool, ctx: EmitterContext) -> Lowered<CsExpr> {
        let object_ty = object.ty.non_null();
        let (target, ctx) = self.expr(object, ctx)?;
        if let IrType::Tuple { elements, rest } = &object_ty
            && let Some(k) = literal_index(index)
        {
            if k < elements.len() {
                return Ok((tuple_item(target, k), ctx));
            }
            if rest.is_some() {
                let tail = if elements.is_empty() {
                    target
                } else {
                    tuple_item(target, elements.len())
                };
                let offset = CsExpr::Literal((k - elements.len()).to_string());
                let access = CsExpr::Index {
                    object: Box::new(tail),
                    index: Box::new(offset),
                    conditional: optional,
                };
                return Ok((access, ctx));
            }
        }
        let (index, ctx) = self.expr(index, ctx)?;
        let access = CsExpr::Index {
            object: Box::new(target),
            index: Box::new(index),
            conditional: optional,
        };
        Ok((access, ctx))
    }

    fn call(
        &mut self,
        callee: &IrExpression,
        type_args: &[IrType],
        args: &[IrArgument],
        optional: bool,
        ctx: EmitterContext,
    ) -> Lowered<CsExpr> {
        let (callee_cs, ctx) = self.expr(callee, ctx)?;
        // Delegates cannot take type arguments.
        let named_method = matches!(
            callee.kind,
            IrExpressionKind::Member { .. } | IrExpressionKind::StaticMember { .. } | IrExpressionKind::ModuleMember { .. }
        ) && !matches!(callee.ty, IrType::Any);
        let mut cs_type_args = Vec::new();
        if named_method {
            for arg in type_args {
                cs_type_args.push(self.type_arg(arg, &ctx)?);
            }
        }
        let (args, ctx) = self.args(args, ctx)?;
        let callee_cs = if optional {
            CsExpr::Member {
                object: Box::new(callee_cs),
                name: "Invoke".to_string(),
                conditional: true,
            }
        } else {
            callee_cs
        };
        let call = CsExpr::Call {
            callee: Box::new(callee_cs),
            type_args: cs_type_args,
            args,
        };
        Ok((call, ctx))
    }

    fn new_expr(&mut self, ty: &IrType, args: &[IrArgument], ctx: EmitterContext) -> Lowered<CsExpr> {
        if let IrType::Array(elem) = ty
            && let [size] = args
        {
            let elem = self.type_arg(elem, &ctx)?;
            let (size, ctx) = self.expr(&size.value, ctx)?;
            let array = CsExpr::NewArray {
                elem,
                size: Some(Box::new(size)),
                items: Vec::new(),
            };
            return Ok((array, ctx));
        }
        let cs_ty = self.cs_type(ty, &ctx)?;
        let (args, ctx) = self.args(args, ctx)?;
        let new = CsExpr::New {
            ty: cs_ty.non_nullable().clone(),
            args,
            initializer: None,
        };
        Ok((new, ctx))
    }

    fn array_literal(&mut self, items: &[IrExpression], ty: &IrType, ctx: EmitterContext) -> Lowered<CsExpr> {
        let base = ty.non_null();
        if let IrType::Tuple { .. } = base {
            return self.tuple_literal(items, &base, ctx);
        }
        let has_spread = items.iter().any(|i| matches!(i.kind, IrExpressionKind::Spread(_)));
        let (lowered, ctx) = self.exprs(items, ctx)?;
        let expr = match &base {
            IrType::Array(elem) if !has_spread => CsExpr::NewArray {
                elem: self.type_arg(elem, &ctx)?,
                size: None,
                items: lowered,
            },
            IrType::Array(_) | IrType::Reference { .. } => CsExpr::Collection {
                ty: self.cs_type(&base, &ctx)?.non_nullable().clone(),
                items: lowered,
            },
            _ if has_spread => CsExpr::Collection {
                ty: CsType::Array(Box::new(CsType::object())),
                items: lowered,
            },
            _ => CsExpr::NewArray {
                elem: CsType::object(),
                size: None,
                items: lowered,
            },
        };
        Ok((expr, ctx))
    }

    /// Tuple values follow the tuple type layout: the fixed elements, then
    /// one array holding the rest.
    fn tuple_literal(&mut self, items: &[IrExpression], ty: &IrType, ctx: EmitterContext) -> Lowered<CsExpr> {
        let (fixed, rest) = match ty.non_null() {
            IrType::Tuple { elements, rest } => (elements.len().min(items.len()), rest.map(|r| *r)),
            _ => (items.len(), None),
        };
        let (mut lowered, ctx) = self.exprs(&items[..fixed], ctx)?;
        if let Some(rest_ty) = rest {
            let (tail, next) = self.exprs(&items[fixed..], ctx)?;
            let array = CsExpr::NewArray {
                elem: self.type_arg(&rest_ty, &next)?,
                size: None,
                items: tail,
            };
            if lowered.is_empty() {
                return Ok((array, next));
            }
            lowered.push(array);
            return Ok((CsExpr::Tuple(lowered), next));
        }
        let expr = match lowered.len() {
            0 => CsExpr::Default(Some(CsType::named("global::System.ValueTuple"))),
            1 => {
                let ty = self.cs_type(ty, &ctx)?;
                CsExpr::New {
                    ty: ty.non_nullable().clone(),
                    args: lowered.into_iter().map(CsArg::new).collect(),
                    initializer: None,
                }
            }
            _ => CsExpr::Tuple(lowered),
        };
        Ok((expr, ctx))
    }

    fn object_literal(&mut self, props: &[(String, IrExpression)], ty: &IrType, ctx: EmitterContext) -> Lowered<CsExpr> {
        let base = ty.non_null();
        let keyed = match &base {
            IrType::Dictionary { key, .. } => Some(key.is_numeric()),
            IrType::Reference { id, args } if id.platform_name.as_ref() == DICTIONARY => {
                Some(args.first().is_some_and(IrType::is_numeric))
            }
            IrType::Object(_) | IrType::Reference { .. } => None,
            _ => Some(false),
        };
        let cs_ty = match &base {
            IrType::Object(_) | IrType::Dictionary { .. } | IrType::Reference { .. } => {
                self.cs_type(&base, &ctx)?.non_nullable().clone()
            }
            _ => CsType::generic(
                "global::System.Collections.Generic.Dictionary",
                vec![CsType::Keyword("string"), CsType::object().nullable()],
            ),
        };
        let mut entries = Vec::with_capacity(props.len());
        let mut ctx = ctx;
        for (name, value) in props {
            let (value, next) = self.expr(value, ctx)?;
            ctx = next;
            entries.push(match keyed {
                Some(true) => CsInit::Keyed(CsExpr::Literal(name.clone()), value),
                Some(false) => CsInit::Keyed(CsExpr::string(name), value),
                None => CsInit::Named(escape_identifier(name), value),
            });
        }
        let new = CsExpr::New {
            ty: cs_ty,
            args: Vec::new(),
            initializer: Some(entries),
        };
        Ok((new, ctx))
    }

    fn lambda(&mut self, lambda: &IrLambda, ctx: EmitterContext) -> Lowered<CsExpr> {
        let inner = ctx.clone().push_scope().with_async(lambda.is_async).without_generator();
        let (params, prologue, inner) = self.params(&lambda.params, inner)?;
        let (body, inner) = match &lambda.body {
            LambdaBody::Expr(e) if prologue.is_empty() => {
                let (e, inner) = self.expr(e, inner)?;
                (CsLambdaBody::Expr(Box::new(e)), inner)
            }
            LambdaBody::Expr(e) => {
                let (e, inner) = self.expr(e, inner)?;
                let mut stmts = prologue;
                if lambda.ret.is_void() && e.is_statement_expression() {
                    stmts.push(CsStmt::Expr(e));
                } else {
                    stmts.push(CsStmt::Return(Some(e)));
                }
                (CsLambdaBody::Block(stmts), inner)
            }
            LambdaBody::Block(stmts) => {
                let (lowered, inner) = self.stmts(stmts, inner)?;
                let mut body = prologue;
                body.extend(lowered);
                (CsLambdaBody::Block(body), inner)
            }
        };
        let lambda = CsExpr::Lambda {
            is_async: lambda.is_async,
            params,
            body,
        };
        Ok((lambda, ctx.absorb(&inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_literals_follow_their_type() {
        assert_eq!(number_literal("1", PrimitiveKind::Number), "1.0");
        assert_eq!(number_literal("1.5", PrimitiveKind::Number), "1.5");
        assert_eq!(number_literal("1e3", PrimitiveKind::Number), "1e3");
        assert_eq!(number_literal("42", PrimitiveKind::Int), "42");
        assert_eq!(number_literal("42", PrimitiveKind::Long), "42L");
        assert_eq!(number_literal("0xff", PrimitiveKind::Number), "255.0");
        assert_eq!(number_literal("0o17", PrimitiveKind::Int), "15");
        assert_eq!(number_literal("2.5", PrimitiveKind::Decimal), "2.5m");
    }

    #[test]
    fn test_binary_operator_spelling() {
        assert_eq!(binary_op(IrBinaryOp::Coalesce), "??");
        assert_eq!(binary_op(IrBinaryOp::UShr), ">>>");
        assert_eq!(compound_op(IrBinaryOp::And), None);
        assert_eq!(compound_op(IrBinaryOp::Coalesce), Some("??="));
    }
}
