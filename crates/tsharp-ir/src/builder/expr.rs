//! Expression typing.

use super::{BodyBuilder, FunctionFrame, infer};
use crate::ir::*;
use tsharp_binding::{DeclId, DeclKind};
use tsharp_catalog::convert::DICTIONARY;
use tsharp_catalog::{
    FunctionParam, FunctionShape, IrType, LiteralValue, MemberKind, MemberLookup, ObjectShape,
    PrimitiveKind, PropertyShape, SignatureEntry,
};
use tsharp_syntax::ast::*;
use tsharp_syntax::{Span, codes};

pub(crate) const MATH: &str = "System.Math";
pub(crate) const STRING: &str = "System.String";

impl<'a> BodyBuilder<'a> {
    pub(crate) fn expr(&mut self, e: &Expr, expected: Option<&IrType>) -> IrExpression {
        let span = e.span;
        match &e.kind {
            ExprKind::Number(raw) => self.number(raw, expected, span),
            ExprKind::String(value) => IrExpression::new(
                IrExpressionKind::Literal(IrLiteral::String(value.clone())),
                IrType::Literal(LiteralValue::String(value.clone())),
                span,
            ),
            ExprKind::Bool(value) => IrExpression::new(
                IrExpressionKind::Literal(IrLiteral::Bool(*value)),
                IrType::boolean(),
                span,
            ),
            ExprKind::Null => IrExpression::new(IrExpressionKind::Literal(IrLiteral::Null), IrType::null(), span),
            ExprKind::Undefined => IrExpression::new(
                IrExpressionKind::Literal(IrLiteral::Null),
                IrType::Primitive(PrimitiveKind::Undefined),
                span,
            ),
            ExprKind::Template(parts) => {
                let parts = parts
                    .iter()
                    .map(|part| match part {
                        TemplatePart::Text(text) => IrTemplatePart::Text(text.clone()),
                        TemplatePart::Expr(e) => IrTemplatePart::Expr(self.expr(e, None)),
                    })
                    .collect();
                IrExpression::new(IrExpressionKind::Template(parts), IrType::string(), span)
            }
            ExprKind::Ident(name) => self.ident(name, span),
            ExprKind::This => self.this(span),
            ExprKind::Super => {
                let ty = self
                    .class
                    .as_ref()
                    .and_then(|c| c.base.clone())
                    .unwrap_or_else(|| self.universe.object_type());
                IrExpression::new(IrExpressionKind::Super, ty, span)
            }
            ExprKind::Array(elements) => self.array_literal(elements, expected, span),
            ExprKind::Object(props) => self.object_literal(props, expected, span),
            ExprKind::Member {
                object,
                property,
                optional,
            } => self.member(object, property, *optional, span),
            ExprKind::Index {
                object,
                index,
                optional,
            } => self.index(object, index, *optional, span),
            ExprKind::Call {
                callee,
                type_args,
                args,
                optional,
            } => self.call(callee, type_args, args, *optional, span),
            ExprKind::New {
                callee,
                type_args,
                args,
            } => self.new_expr(callee, type_args, args, expected, span),
            ExprKind::Unary { op, operand } => self.unary(*op, operand, expected, span),
            ExprKind::Update {
                op,
                prefix,
                operand,
            } => {
                let target = self.expr(operand, None);
                let ty = target.ty.clone();
                IrExpression::new(
                    IrExpressionKind::Update {
                        op: *op,
                        prefix: *prefix,
                        target: Box::new(target),
                    },
                    ty,
                    span,
                )
            }
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, span),
            ExprKind::Assign { op, target, value } => self.assign(*op, target, value, span),
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.condition(test);
                let then = self.expr(consequent, expected);
                let otherwise = self.expr(alternate, expected);
                let ty = match expected {
                    Some(ty) if !ty.is_unknown() => ty.clone(),
                    _ => infer::join_all([then.ty.clone(), otherwise.ty.clone()]).unwrap_or(IrType::Unknown),
                };
                IrExpression::new(
                    IrExpressionKind::Conditional {
                        test: Box::new(test),
                        then: Box::new(then),
                        otherwise: Box::new(otherwise),
                    },
                    ty,
                    span,
                )
            }
            ExprKind::Function(function) => self.lambda(function, expected, span),
            ExprKind::Await(inner) => {
                if self.frames.is_empty() {
                    self.saw_top_level_await = true;
                }
                let inner = self.expr(inner, None);
                let ty = infer::awaited(&inner.ty);
                IrExpression::new(IrExpressionKind::Await(Box::new(inner)), ty, span)
            }
            ExprKind::Yield { .. } => {
                self.error(
                    codes::UNSUPPORTED_YIELD,
                    span,
                    "`yield` is only supported as a statement, a declaration initializer or the right side of an assignment"
                        .to_string(),
                );
                IrExpression::unsupported("yield", span)
            }
            ExprKind::As { expr, ty } => self.as_expr(expr, ty, span),
            ExprKind::NonNull(inner) => {
                let inner = self.expr(inner, expected);
                let ty = inner.ty.non_null();
                IrExpression::new(IrExpressionKind::NonNull(Box::new(inner)), ty, span)
            }
            ExprKind::Spread(inner) => {
                let inner = self.expr(inner, expected);
                let ty = inner.ty.clone();
                IrExpression::new(IrExpressionKind::Spread(Box::new(inner)), ty, span)
            }
            ExprKind::Unsupported(text) => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("unsupported expression `{}`", text),
                );
                IrExpression::unsupported(text.clone(), span)
            }
        }
    }

    fn number(&mut self, raw: &str, expected: Option<&IrType>, span: Span) -> IrExpression {
        let mut kind = infer::literal_kind(expected);
        if kind.is_integral() && infer::is_fractional(raw) {
            self.error(
                codes::FRACTIONAL_INTEGRAL,
                span,
                format!("fractional literal `{}` cannot be typed as `{}`", raw, kind.surface_name()),
            );
            kind = PrimitiveKind::Number;
        }
        IrExpression::new(
            IrExpressionKind::Literal(IrLiteral::Number {
                raw: raw.to_string(),
                kind,
            }),
            IrType::Primitive(kind),
            span,
        )
    }

    // ========================================================================
    // Names
    // ========================================================================

    pub(crate) fn ident(&mut self, name: &str, span: Span) -> IrExpression {
        if let Some(ty) = self.locals.lookup(name) {
            return IrExpression::new(IrExpressionKind::Local(name.to_string()), ty.clone(), span);
        }
        let Some(decl) = self.bindings.lookup_value(self.module, name) else {
            self.error(codes::UNRESOLVED_IDENTIFIER, span, format!("cannot find name `{}`", name));
            return IrExpression::unsupported(name, span);
        };
        self.decl_value(decl, span)
    }

    /// A module-level declaration used as a value.
    pub(crate) fn decl_value(&mut self, decl: DeclId, span: Span) -> IrExpression {
        let name = self.bindings.decl(decl).name.clone();
        match self.decl_kind(decl) {
            DeclKind::Function => {
                let ty = self
                    .function_signatures(decl)
                    .first()
                    .map(signature_type)
                    .unwrap_or(IrType::Unknown);
                IrExpression::new(self.module_member(decl, &name), ty, span)
            }
            DeclKind::Variable { .. } => {
                let ty = self
                    .program
                    .variables
                    .get(&decl)
                    .cloned()
                    .unwrap_or(IrType::Unknown);
                IrExpression::new(self.module_member(decl, &name), ty, span)
            }
            DeclKind::Class | DeclKind::Enum => match self.universe.source_type(decl) {
                Some(id) => type_ref(self.universe.type_for(id, Vec::new()), span),
                None => IrExpression::unsupported(name, span),
            },
            DeclKind::PlatformType { qualified } => match self.universe.resolve_alias(qualified) {
                Some(id) => type_ref(self.universe.type_for(&id, Vec::new()), span),
                None => {
                    self.error(
                        codes::UNRESOLVED_TYPE,
                        span,
                        format!("platform type `{}` is not in the catalog", qualified),
                    );
                    IrExpression::unsupported(name, span)
                }
            },
            DeclKind::Global => self.global_value(&name, span),
            DeclKind::Error => IrExpression::unsupported(name, span),
            DeclKind::Interface | DeclKind::TypeAlias => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("`{}` only refers to a type", name),
                );
                IrExpression::unsupported(name, span)
            }
            DeclKind::Namespace(_) | DeclKind::PlatformNamespace { .. } => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("namespace `{}` cannot be used as a value", name),
                );
                IrExpression::unsupported(name, span)
            }
        }
    }

    fn global_value(&mut self, name: &str, span: Span) -> IrExpression {
        let member = match name {
            "NaN" => "NaN",
            "Infinity" => "PositiveInfinity",
            _ => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("global `{}` cannot be used as a value", name),
                );
                return IrExpression::unsupported(name, span);
            }
        };
        IrExpression::new(
            IrExpressionKind::StaticMember {
                owner: IrType::number(),
                name: member.to_string(),
            },
            IrType::number(),
            span,
        )
    }

    fn this(&mut self, span: Span) -> IrExpression {
        match &self.class {
            Some(class) if !class.is_static => {
                IrExpression::new(IrExpressionKind::This, class.self_ty.clone(), span)
            }
            _ => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    "`this` is only available inside instance members".to_string(),
                );
                IrExpression::unsupported("this", span)
            }
        }
    }

    /// Binding an identifier refers to when it is not shadowed by a local.
    pub(crate) fn module_binding(&self, name: &str) -> Option<(DeclId, &'a DeclKind)> {
        if self.locals.lookup(name).is_some() {
            return None;
        }
        let decl = self.bindings.lookup_value(self.module, name)?;
        Some((decl, self.decl_kind(decl)))
    }

    // ========================================================================
    // Literals
    // ========================================================================

    fn array_literal(&mut self, elements: &[Expr], expected: Option<&IrType>, span: Span) -> IrExpression {
        let expected = expected.map(IrType::non_null);
        if let Some(IrType::Tuple { elements: slots, rest }) = &expected {
            let items = elements
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    let slot = slots.get(i).or(rest.as_deref());
                    self.expr(e, slot)
                })
                .collect();
            let ty = expected.clone().unwrap_or(IrType::Unknown);
            return IrExpression::new(IrExpressionKind::Tuple(items), ty, span);
        }

        let (elem_expected, target) = match &expected {
            Some(IrType::Array(elem)) => (Some((**elem).clone()), None),
            Some(other @ IrType::Reference { .. }) => {
                let elem = infer::element_type(other);
                if elem.is_unknown() {
                    (None, None)
                } else {
                    (Some(elem), Some(other.clone()))
                }
            }
            _ => (None, None),
        };

        let mut items = Vec::with_capacity(elements.len());
        let mut item_types = Vec::with_capacity(elements.len());
        for element in elements {
            let item = match &element.kind {
                ExprKind::Spread(inner) => {
                    let spread_expected = elem_expected.clone().map(|t| IrType::Array(Box::new(t)));
                    let inner = self.expr(inner, spread_expected.as_ref());
                    item_types.push(infer::element_type(&inner.ty));
                    let ty = inner.ty.clone();
                    IrExpression::new(IrExpressionKind::Spread(Box::new(inner)), ty, element.span)
                }
                _ => {
                    let item = self.expr(element, elem_expected.as_ref());
                    item_types.push(item.ty.clone());
                    item
                }
            };
            items.push(item);
        }

        let ty = match target {
            Some(collection) => collection,
            None => {
                let elem = elem_expected
                    .or_else(|| infer::join_all(item_types))
                    .unwrap_or(IrType::Unknown);
                IrType::Array(Box::new(elem))
            }
        };
        IrExpression::new(IrExpressionKind::ArrayLiteral(items), ty, span)
    }

    fn object_literal(&mut self, props: &[ObjectProp], expected: Option<&IrType>, span: Span) -> IrExpression {
        let expected = expected.map(IrType::non_null);
        let value_type = |b: &mut Self, key: &str, prop_span: Span| -> Option<IrType> {
            match &expected {
                Some(IrType::Dictionary { value, .. }) => Some((**value).clone()),
                Some(IrType::Reference { id, args }) if id.platform_name.as_ref() == DICTIONARY => {
                    args.get(1).cloned()
                }
                Some(IrType::Object(shape)) => shape.property(key).map(|p| p.ty.clone()),
                Some(ty @ IrType::Reference { .. }) => match b.lookup(ty, key) {
                    Some(found) => found.instantiated_type(),
                    None => {
                        b.error(
                            codes::UNKNOWN_MEMBER,
                            prop_span,
                            format!("type `{}` has no property `{}`", ty, key),
                        );
                        None
                    }
                },
                _ => None,
            }
        };

        let mut fields = Vec::with_capacity(props.len());
        for prop in props {
            let (key, value) = match prop {
                ObjectProp::KeyValue { key, value } => {
                    let expected_value = value_type(self, key, value.span);
                    (key.clone(), self.expr(value, expected_value.as_ref()))
                }
                ObjectProp::Shorthand { name, span } => {
                    let _ = value_type(self, name, *span);
                    (name.clone(), self.ident(name, *span))
                }
                ObjectProp::Spread(inner) => {
                    self.error(
                        codes::UNSUPPORTED_EXPRESSION,
                        inner.span,
                        "object spread is not supported".to_string(),
                    );
                    continue;
                }
            };
            fields.push((key, value));
        }

        let ty = match expected {
            Some(ty @ (IrType::Dictionary { .. } | IrType::Object(_) | IrType::Reference { .. })) => ty,
            _ => IrType::Object(ObjectShape {
                properties: fields
                    .iter()
                    .map(|(name, value)| PropertyShape {
                        name: name.clone(),
                        ty: infer::widen(&value.ty),
                        optional: false,
                        readonly: false,
                    })
                    .collect(),
            }),
        };
        IrExpression::new(IrExpressionKind::ObjectLiteral(fields), ty, span)
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Member lookup with a PascalCase fallback for platform members.
    pub(crate) fn lookup(&self, receiver: &IrType, name: &str) -> Option<MemberLookup<'a>> {
        let universe = self.universe;
        universe.lookup_member(receiver, name).or_else(|| {
            let pascal = pascal_case(name);
            (pascal != name)
                .then(|| universe.lookup_member(receiver, &pascal))
                .flatten()
        })
    }

    fn member(&mut self, object: &Expr, property: &str, optional: bool, span: Span) -> IrExpression {
        if let Some(resolved) = self.namespace_member(object, property, span) {
            return resolved;
        }
        let target = self.expr(object, None);
        self.member_of(target, property, optional, span)
    }

    /// `ns.x` through a namespace import, a platform namespace or `Math`.
    fn namespace_member(&mut self, object: &Expr, property: &str, span: Span) -> Option<IrExpression> {
        let ExprKind::Ident(head) = &object.kind else {
            return None;
        };
        let (_, kind) = self.module_binding(head)?;
        match kind {
            DeclKind::Namespace(target) => {
                let bindings = self.bindings;
                let found = bindings
                    .lookup_export_value(*target, property)
                    .or_else(|| bindings.lookup_export_type(*target, property));
                Some(match found {
                    Some(decl) => self.decl_value(decl, span),
                    None => {
                        self.error(
                            codes::UNRESOLVED_IDENTIFIER,
                            span,
                            format!("module `{}` has no export `{}`", head, property),
                        );
                        IrExpression::unsupported(property, span)
                    }
                })
            }
            DeclKind::PlatformNamespace { namespace } => {
                let qualified = format!("{}.{}", namespace, property);
                Some(match self.universe.resolve_alias(&qualified) {
                    Some(id) => type_ref(self.universe.type_for(&id, Vec::new()), span),
                    None => {
                        self.error(
                            codes::UNRESOLVED_TYPE,
                            span,
                            format!("platform type `{}` is not in the catalog", qualified),
                        );
                        IrExpression::unsupported(qualified, span)
                    }
                })
            }
            DeclKind::Global if head == "Math" => {
                let owner = self.universe.platform_reference(MATH, Vec::new());
                Some(self.static_member(owner, property, span))
            }
            _ => None,
        }
    }

    pub(crate) fn member_of(&mut self, target: IrExpression, name: &str, optional: bool, span: Span) -> IrExpression {
        if let IrExpressionKind::TypeRef(owner) = &target.kind {
            let owner = owner.clone();
            return self.static_member(owner, name, span);
        }
        let base = target.ty.non_null();
        let member = |object: IrExpression, name: &str, ty: IrType| {
            let ty = if optional { ty.nullable() } else { ty };
            IrExpression::new(
                IrExpressionKind::Member {
                    object: Box::new(object),
                    name: name.to_string(),
                    optional,
                    extension: None,
                },
                ty,
                span,
            )
        };
        match &base {
            IrType::Any | IrType::Unknown | IrType::TypeParameter(_) => member(target, name, IrType::Any),
            IrType::Array(_) if name == "length" => {
                member(target, "Length", IrType::Primitive(PrimitiveKind::Int))
            }
            ty if ty.is_stringish() && name == "length" => {
                member(target, "Length", IrType::Primitive(PrimitiveKind::Int))
            }
            IrType::Object(shape) => match shape.property(name) {
                Some(prop) => {
                    let ty = prop.ty.clone();
                    member(target, name, ty)
                }
                None => self.unknown_member(&base, name, span),
            },
            IrType::Dictionary { value, .. } => {
                let ty = (**value).clone();
                let key = IrExpression::new(
                    IrExpressionKind::Literal(IrLiteral::String(name.to_string())),
                    IrType::string(),
                    span,
                );
                IrExpression::new(
                    IrExpressionKind::Index {
                        object: Box::new(target),
                        index: Box::new(key),
                        optional,
                    },
                    ty,
                    span,
                )
            }
            _ => match self.lookup(&base, name) {
                Some(found) => {
                    let ty = match found.member.kind {
                        MemberKind::Method => found
                            .instantiated_signatures()
                            .first()
                            .map(signature_type)
                            .unwrap_or(IrType::Unknown),
                        _ => found.instantiated_type().unwrap_or(IrType::Unknown),
                    };
                    let member_name = found.member.name.clone();
                    member(target, &member_name, ty)
                }
                None => self.unknown_member(&base, name, span),
            },
        }
    }

    pub(crate) fn static_member(&mut self, owner: IrType, name: &str, span: Span) -> IrExpression {
        let Some(found) = self.lookup(&owner, name) else {
            return self.unknown_member(&owner, name, span);
        };
        let ty = match found.member.kind {
            MemberKind::Method => found
                .instantiated_signatures()
                .first()
                .map(signature_type)
                .unwrap_or(IrType::Unknown),
            _ => found.instantiated_type().unwrap_or(IrType::Unknown),
        };
        IrExpression::new(
            IrExpressionKind::StaticMember {
                owner,
                name: found.member.name.clone(),
            },
            ty,
            span,
        )
    }

    pub(crate) fn unknown_member(&mut self, ty: &IrType, name: &str, span: Span) -> IrExpression {
        self.error(
            codes::UNKNOWN_MEMBER,
            span,
            format!("type `{}` has no member `{}`", ty, name),
        );
        IrExpression::unsupported(name, span)
    }

    fn index(&mut self, object: &Expr, index: &Expr, optional: bool, span: Span) -> IrExpression {
        let target = self.expr(object, None);
        let base = target.ty.non_null();
        let (index, ty) = match &base {
            IrType::Array(elem) => (self.int_index(index), (**elem).clone()),
            IrType::Tuple { elements, rest } => {
                let idx = self.int_index(index);
                let slot = literal_index(&idx).and_then(|k| elements.get(k).cloned());
                let ty = slot
                    .or_else(|| rest.as_deref().cloned())
                    .unwrap_or_else(|| infer::element_type(&base));
                (idx, ty)
            }
            ty if ty.is_stringish() => (self.int_index(index), IrType::Primitive(PrimitiveKind::Char)),
            IrType::Dictionary { key, value } => {
                let key = (**key).clone();
                (self.expr(index, Some(&key)), (**value).clone())
            }
            IrType::Reference { id, args } if id.platform_name.as_ref() == DICTIONARY && args.len() == 2 => {
                let (key, value) = (args[0].clone(), args[1].clone());
                (self.expr(index, Some(&key)), value)
            }
            IrType::Reference { id, args } if id.simple_name() == "List" && args.len() == 1 => {
                let elem = args[0].clone();
                (self.int_index(index), elem)
            }
            IrType::Object(_) => {
                if let ExprKind::String(key) = &index.kind {
                    return self.member_of(target, key, optional, span);
                }
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    "computed access on an object shape needs a string literal key".to_string(),
                );
                return IrExpression::unsupported("index", span);
            }
            IrType::Any | IrType::Unknown => (self.expr(index, None), IrType::Any),
            other => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("type `{}` cannot be indexed", other),
                );
                return IrExpression::unsupported("index", span);
            }
        };
        let ty = if optional { ty.nullable() } else { ty };
        IrExpression::new(
            IrExpressionKind::Index {
                object: Box::new(target),
                index: Box::new(index),
                optional,
            },
            ty,
            span,
        )
    }

    /// An array index, cast to `int` when it is not integral.
    fn int_index(&mut self, index: &Expr) -> IrExpression {
        let int = IrType::Primitive(PrimitiveKind::Int);
        let index = self.expr(index, Some(&int));
        self.to_int(index)
    }

    pub(crate) fn to_int(&mut self, value: IrExpression) -> IrExpression {
        match value.ty.widen_literal() {
            IrType::Primitive(kind) if kind.is_integral() => value,
            _ => cast(value, IrType::Primitive(PrimitiveKind::Int)),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// An expression used as a condition, made boolean.
    pub(crate) fn condition(&mut self, e: &Expr) -> IrExpression {
        let value = self.expr(e, Some(&IrType::boolean()));
        self.truthy(value)
    }

    /// Explicit truthiness test for non-boolean values.
    pub(crate) fn truthy(&mut self, value: IrExpression) -> IrExpression {
        let span = value.span;
        let ty = value.ty.clone();
        let base = ty.non_null().widen_literal();
        if ty.is_primitive(PrimitiveKind::Boolean) {
            return value;
        }
        let compare = |op: IrBinaryOp, value: IrExpression, right: IrExpression| {
            IrExpression::new(
                IrExpressionKind::Binary {
                    op,
                    left: Box::new(value),
                    right: Box::new(right),
                },
                IrType::boolean(),
                span,
            )
        };
        let null = IrExpression::new(IrExpressionKind::Literal(IrLiteral::Null), IrType::null(), span);
        match base {
            IrType::Primitive(PrimitiveKind::Boolean) => {
                let yes = IrExpression::new(IrExpressionKind::Literal(IrLiteral::Bool(true)), IrType::boolean(), span);
                compare(IrBinaryOp::Eq, value, yes)
            }
            IrType::Primitive(kind) if kind.is_numeric() && !ty.is_nullable() => {
                let zero = IrExpression::new(
                    IrExpressionKind::Literal(IrLiteral::Number {
                        raw: "0".to_string(),
                        kind,
                    }),
                    IrType::Primitive(kind),
                    span,
                );
                compare(IrBinaryOp::NotEq, value, zero)
            }
            IrType::Primitive(PrimitiveKind::String) => {
                let owner = self.universe.platform_reference(STRING, Vec::new());
                let callee = IrExpression::new(
                    IrExpressionKind::StaticMember {
                        owner,
                        name: "IsNullOrEmpty".to_string(),
                    },
                    IrType::Unknown,
                    span,
                );
                let call = IrExpression::new(
                    IrExpressionKind::Call {
                        callee: Box::new(callee),
                        type_args: Vec::new(),
                        args: vec![IrArgument::value(value)],
                        optional: false,
                    },
                    IrType::boolean(),
                    span,
                );
                IrExpression::new(
                    IrExpressionKind::Unary {
                        op: IrUnaryOp::Not,
                        operand: Box::new(call),
                    },
                    IrType::boolean(),
                    span,
                )
            }
            _ => compare(IrBinaryOp::NotEq, value, null),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, expected: Option<&IrType>, span: Span) -> IrExpression {
        let (op, operand, ty) = match op {
            UnaryOp::Not => (IrUnaryOp::Not, self.condition(operand), IrType::boolean()),
            UnaryOp::Neg | UnaryOp::Plus => {
                let numeric = expected.filter(|t| t.non_null().is_numeric());
                let operand = self.expr(operand, numeric);
                let ty = if operand.ty.is_numeric() {
                    operand.ty.widen_literal()
                } else {
                    IrType::number()
                };
                let op = if op == UnaryOp::Neg { IrUnaryOp::Neg } else { IrUnaryOp::Plus };
                (op, operand, ty)
            }
            UnaryOp::BitNot => {
                let operand = self.expr(operand, None);
                let operand = self.to_int(operand);
                (IrUnaryOp::BitNot, operand, IrType::Primitive(PrimitiveKind::Int))
            }
            UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete => {
                let word = match op {
                    UnaryOp::TypeOf => "typeof",
                    UnaryOp::Void => "void",
                    _ => "delete",
                };
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("`{}` is not supported here", word),
                );
                return IrExpression::unsupported(word, span);
            }
        };
        IrExpression::new(
            IrExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    /// Build both operands, letting a bare numeric literal take the kind of
    /// the other side.
    fn operands(&mut self, left: &Expr, right: &Expr) -> (IrExpression, IrExpression) {
        if matches!(left.kind, ExprKind::Number(_)) && !matches!(right.kind, ExprKind::Number(_)) {
            let r = self.expr(right, None);
            let hint = operand_hint(&r.ty);
            let l = self.expr(left, hint.as_ref());
            return (l, r);
        }
        let l = self.expr(left, None);
        let hint = operand_hint(&l.ty);
        let r = self.expr(right, hint.as_ref());
        (l, r)
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> IrExpression {
        let ir_op = match op {
            BinaryOp::Eq | BinaryOp::StrictEq | BinaryOp::NotEq | BinaryOp::StrictNotEq => {
                let negated = matches!(op, BinaryOp::NotEq | BinaryOp::StrictNotEq);
                if let Some(test) = self.typeof_test(left, right, negated, span) {
                    return test;
                }
                if negated { IrBinaryOp::NotEq } else { IrBinaryOp::Eq }
            }
            BinaryOp::Lt => IrBinaryOp::Lt,
            BinaryOp::Le => IrBinaryOp::Le,
            BinaryOp::Gt => IrBinaryOp::Gt,
            BinaryOp::Ge => IrBinaryOp::Ge,
            BinaryOp::Add => IrBinaryOp::Add,
            BinaryOp::Sub => IrBinaryOp::Sub,
            BinaryOp::Mul => IrBinaryOp::Mul,
            BinaryOp::Div => IrBinaryOp::Div,
            BinaryOp::Mod => IrBinaryOp::Mod,
            BinaryOp::Exp => return self.power(left, right, span),
            BinaryOp::And => {
                let l = self.condition(left);
                let r = self.condition(right);
                return binary(IrBinaryOp::And, l, r, IrType::boolean(), span);
            }
            BinaryOp::Or => {
                let l = self.expr(left, None);
                if l.ty.is_primitive(PrimitiveKind::Boolean) {
                    let r = self.condition(right);
                    return binary(IrBinaryOp::Or, l, r, IrType::boolean(), span);
                }
                // A value-producing `||` is a null fallback.
                return self.coalesce(l, right, span);
            }
            BinaryOp::Nullish => {
                let l = self.expr(left, None);
                return self.coalesce(l, right, span);
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                let ir_op = match op {
                    BinaryOp::BitAnd => IrBinaryOp::BitAnd,
                    BinaryOp::BitOr => IrBinaryOp::BitOr,
                    BinaryOp::BitXor => IrBinaryOp::BitXor,
                    BinaryOp::Shl => IrBinaryOp::Shl,
                    BinaryOp::Shr => IrBinaryOp::Shr,
                    _ => IrBinaryOp::UShr,
                };
                let int = IrType::Primitive(PrimitiveKind::Int);
                let l = self.expr(left, Some(&int));
                let l = self.to_int(l);
                let r = self.expr(right, Some(&int));
                let r = self.to_int(r);
                let ty = infer::binary_result(ir_op, &l.ty, &r.ty);
                return binary(ir_op, l, r, ty, span);
            }
            BinaryOp::InstanceOf => {
                let value = self.expr(left, None);
                let Some(target) = self.value_as_type(right) else {
                    self.error(
                        codes::UNSUPPORTED_EXPRESSION,
                        right.span,
                        "right side of `instanceof` must name a type".to_string(),
                    );
                    return IrExpression::unsupported("instanceof", span);
                };
                return is_test(value, target, span);
            }
            BinaryOp::In => return self.in_test(left, right, span),
        };
        let (l, r) = self.operands(left, right);
        let ty = infer::binary_result(ir_op, &l.ty, &r.ty);
        binary(ir_op, l, r, ty, span)
    }

    fn coalesce(&mut self, left: IrExpression, right: &Expr, span: Span) -> IrExpression {
        let hint = left.ty.non_null();
        let r = self.expr(right, Some(&hint));
        let ty = infer::binary_result(IrBinaryOp::Coalesce, &left.ty, &r.ty);
        binary(IrBinaryOp::Coalesce, left, r, ty, span)
    }

    fn power(&mut self, left: &Expr, right: &Expr, span: Span) -> IrExpression {
        let number = IrType::number();
        let l = self.expr(left, Some(&number));
        let r = self.expr(right, Some(&number));
        let owner = self.universe.platform_reference(MATH, Vec::new());
        let callee = IrExpression::new(
            IrExpressionKind::StaticMember {
                owner,
                name: "Pow".to_string(),
            },
            IrType::Unknown,
            span,
        );
        IrExpression::new(
            IrExpressionKind::Call {
                callee: Box::new(callee),
                type_args: Vec::new(),
                args: vec![IrArgument::value(l), IrArgument::value(r)],
                optional: false,
            },
            number,
            span,
        )
    }

    /// `typeof x === "string"` becomes a type test.
    fn typeof_test(&mut self, left: &Expr, right: &Expr, negated: bool, span: Span) -> Option<IrExpression> {
        let (operand, tag) = match (&left.kind, &right.kind) {
            (ExprKind::Unary { op: UnaryOp::TypeOf, operand }, ExprKind::String(tag))
            | (ExprKind::String(tag), ExprKind::Unary { op: UnaryOp::TypeOf, operand }) => (operand, tag),
            _ => return None,
        };
        let value = self.expr(operand, None);
        let test = match tag.as_str() {
            "string" => is_test(value, IrType::string(), span),
            "number" => is_test(value, IrType::number(), span),
            "boolean" => is_test(value, IrType::boolean(), span),
            "bigint" => is_test(value, IrType::Primitive(PrimitiveKind::BigInt), span),
            "object" => is_test(value, self.universe.object_type(), span),
            "undefined" => {
                let null = IrExpression::new(IrExpressionKind::Literal(IrLiteral::Null), IrType::null(), span);
                binary(IrBinaryOp::Eq, value, null, IrType::boolean(), span)
            }
            other => {
                self.error(
                    codes::UNSUPPORTED_EXPRESSION,
                    span,
                    format!("`typeof` test for \"{}\" is not supported", other),
                );
                return Some(IrExpression::unsupported("typeof", span));
            }
        };
        Some(if negated {
            IrExpression::new(
                IrExpressionKind::Unary {
                    op: IrUnaryOp::Not,
                    operand: Box::new(test),
                },
                IrType::boolean(),
                span,
            )
        } else {
            test
        })
    }

    /// `key in dict` on dictionaries.
    fn in_test(&mut self, left: &Expr, right: &Expr, span: Span) -> IrExpression {
        let object = self.expr(right, None);
        let key_ty = match object.ty.non_null() {
            IrType::Dictionary { key, .. } => Some(*key),
            IrType::Reference { id, args } if id.platform_name.as_ref() == DICTIONARY => args.first().cloned(),
            _ => None,
        };
        let Some(key_ty) = key_ty else {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                format!("`in` is only supported on dictionaries, not `{}`", object.ty),
            );
            return IrExpression::unsupported("in", span);
        };
        let key = self.expr(left, Some(&key_ty));
        let callee = IrExpression::new(
            IrExpressionKind::Member {
                object: Box::new(object),
                name: "ContainsKey".to_string(),
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
                args: vec![IrArgument::value(key)],
                optional: false,
            },
            IrType::boolean(),
            span,
        )
    }

    /// A value expression naming a type (`instanceof Foo`, `new ns.Foo`).
    pub(crate) fn value_as_type(&mut self, e: &Expr) -> Option<IrType> {
        let name = dotted_name(e)?;
        let node = TypeNode::new(
            TypeKind::Reference {
                name,
                args: Vec::new(),
            },
            e.span,
        );
        let ty = self.convert(&node);
        (!ty.is_unknown()).then_some(ty)
    }

    fn assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, span: Span) -> IrExpression {
        let target = self.expr(target, None);
        if !is_assignable(&target) {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                "invalid assignment target".to_string(),
            );
        }
        let ty = target.ty.clone();
        let op = match op {
            AssignOp::Assign => None,
            AssignOp::Add => Some(IrBinaryOp::Add),
            AssignOp::Sub => Some(IrBinaryOp::Sub),
            AssignOp::Mul => Some(IrBinaryOp::Mul),
            AssignOp::Div => Some(IrBinaryOp::Div),
            AssignOp::Mod => Some(IrBinaryOp::Mod),
            AssignOp::BitAnd => Some(IrBinaryOp::BitAnd),
            AssignOp::BitOr => Some(IrBinaryOp::BitOr),
            AssignOp::BitXor => Some(IrBinaryOp::BitXor),
            AssignOp::Shl => Some(IrBinaryOp::Shl),
            AssignOp::Shr => Some(IrBinaryOp::Shr),
            AssignOp::Nullish => Some(IrBinaryOp::Coalesce),
        };
        let hint = match op {
            Some(IrBinaryOp::Coalesce) => ty.non_null(),
            _ => ty.clone(),
        };
        let value = self.expr(value, Some(&hint));
        IrExpression::new(
            IrExpressionKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
            span,
        )
    }

    fn as_expr(&mut self, inner: &Expr, ty: &TypeNode, span: Span) -> IrExpression {
        let target = self.convert(ty);
        let mut value = self.expr(inner, Some(&target));
        let retype = value.ty.canonical() == target.canonical()
            || target.is_unknown()
            || matches!(
                value.kind,
                IrExpressionKind::ObjectLiteral(_) | IrExpressionKind::ArrayLiteral(_) | IrExpressionKind::Tuple(_)
            );
        if retype {
            if !target.is_unknown() {
                value.ty = target;
            }
            value.span = span;
            return value;
        }
        cast(value, target)
    }

    // ========================================================================
    // Functions
    // ========================================================================

    pub(crate) fn lambda(&mut self, f: &FunctionExpr, expected: Option<&IrType>, span: Span) -> IrExpression {
        if f.is_generator {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                "generator function expressions are not supported".to_string(),
            );
            return IrExpression::unsupported("function*", span);
        }
        let shape = match expected.map(IrType::non_null) {
            Some(IrType::Function(shape)) => Some(*shape),
            _ => None,
        };
        let pushed = self
            .types
            .push_type_params(f.type_params.iter().map(|p| p.name.clone()));
        let annotated = f.return_type.as_ref().map(|t| self.convert(t));
        let ret_expected = annotated.or_else(|| {
            shape
                .as_ref()
                .map(|s| s.ret.clone())
                .filter(|t| !t.has_type_parameters() && !t.is_unknown())
        });
        let inner_expected = ret_expected.map(|t| if f.is_async { infer::awaited(&t) } else { t });

        let hints: Vec<Option<IrType>> = (0..f.params.len())
            .map(|i| shape.as_ref().and_then(|s| s.params.get(i)).map(|p| p.ty.clone()))
            .collect();
        self.locals.push();
        let (params, prologue) = self.bind_params(&f.params, &hints);
        self.frames.push(FunctionFrame {
            return_expected: inner_expected.clone(),
            ..Default::default()
        });
        let (body, inner_ret) = match &f.body {
            FunctionBody::Expr(e) => {
                let value = self.expr(e, inner_expected.as_ref());
                let ty = inner_expected
                    .clone()
                    .unwrap_or_else(|| infer::widen(&value.ty));
                let body = if prologue.is_empty() {
                    LambdaBody::Expr(Box::new(value))
                } else {
                    let mut stmts = prologue;
                    stmts.push(IrStatement::Return(Some(value)));
                    LambdaBody::Block(stmts)
                };
                (body, ty)
            }
            FunctionBody::Block(stmts) => {
                let mut out = prologue;
                out.extend(self.stmts(stmts));
                let returns = self.frames.last().map(|frame| frame.returns.clone()).unwrap_or_default();
                let ty = inner_expected
                    .clone()
                    .or_else(|| infer::join_all(returns))
                    .unwrap_or_else(IrType::void);
                (LambdaBody::Block(out), ty)
            }
        };
        self.frames.pop();
        self.locals.pop();
        self.types.pop_type_params(pushed);

        let ret = if f.is_async { infer::task_of(inner_ret) } else { inner_ret };
        let ty = IrType::Function(Box::new(FunctionShape {
            params: params
                .iter()
                .map(|p| FunctionParam {
                    name: p.name.clone(),
                    ty: p.ty.clone(),
                    optional: p.optional,
                    rest: p.rest,
                })
                .collect(),
            ret: ret.clone(),
            is_async: f.is_async,
        }));
        IrExpression::new(
            IrExpressionKind::Function(Box::new(IrLambda {
                params,
                ret,
                body,
                is_async: f.is_async,
            })),
            ty,
            span,
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub(crate) fn type_ref(ty: IrType, span: Span) -> IrExpression {
    IrExpression::new(IrExpressionKind::TypeRef(ty.clone()), ty, span)
}

pub(crate) fn cast(value: IrExpression, target: IrType) -> IrExpression {
    let span = value.span;
    IrExpression::new(
        IrExpressionKind::Cast {
            expr: Box::new(value),
            target: target.clone(),
        },
        target,
        span,
    )
}

fn binary(op: IrBinaryOp, left: IrExpression, right: IrExpression, ty: IrType, span: Span) -> IrExpression {
    IrExpression::new(
        IrExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        ty,
        span,
    )
}

fn is_test(value: IrExpression, target: IrType, span: Span) -> IrExpression {
    IrExpression::new(
        IrExpressionKind::Is {
            expr: Box::new(value),
            target,
        },
        IrType::boolean(),
        span,
    )
}

/// Expected type handed to the other operand of a binary operator.
fn operand_hint(ty: &IrType) -> Option<IrType> {
    match ty {
        IrType::Unknown | IrType::Any => None,
        other => Some(other.widen_literal()),
    }
}

/// Function type of a catalog signature.
pub(crate) fn signature_type(sig: &SignatureEntry) -> IrType {
    IrType::Function(Box::new(FunctionShape {
        params: sig
            .params
            .iter()
            .map(|p| FunctionParam {
                name: p.name.clone(),
                ty: p.ty.clone(),
                optional: p.optional,
                rest: p.rest,
            })
            .collect(),
        ret: sig.ret.clone(),
        is_async: false,
    }))
}

pub(crate) fn pascal_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `a.b.c` for identifier and member chains.
pub(crate) fn dotted_name(e: &Expr) -> Option<String> {
    match &e.kind {
        ExprKind::Ident(name) => Some(name.clone()),
        ExprKind::Member {
            object,
            property,
            optional: false,
        } => Some(format!("{}.{}", dotted_name(object)?, property)),
        _ => None,
    }
}

fn literal_index(index: &IrExpression) -> Option<usize> {
    match &index.kind {
        IrExpressionKind::Literal(IrLiteral::Number { raw, .. }) => raw.parse().ok(),
        _ => None,
    }
}

fn is_assignable(target: &IrExpression) -> bool {
    matches!(
        target.kind,
        IrExpressionKind::Local(_)
            | IrExpressionKind::ModuleMember { .. }
            | IrExpressionKind::Member { .. }
            | IrExpressionKind::StaticMember { .. }
            | IrExpressionKind::Index { .. }
            | IrExpressionKind::Unsupported(_)
    )
}

#[cfg(test)]
mod tests {
    use super::super::tests::{build, variable};
    use super::*;
    use tsharp_catalog::PrimitiveKind;

    fn init_of(source: &str, name: &str) -> (IrExpression, tsharp_syntax::Diagnostics) {
        let (ir, diags) = build(&[("main.ts", source)]);
        (variable(&ir[0], name).init.clone().unwrap(), diags)
    }

    #[test]
    fn test_numeric_literals_follow_expected_type() {
        let (init, diags) = init_of("const a: long = 42;", "a");
        assert!(diags.is_empty());
        assert_eq!(
            init.kind,
            IrExpressionKind::Literal(IrLiteral::Number {
                raw: "42".into(),
                kind: PrimitiveKind::Long
            })
        );
        let (_, diags) = init_of("const b: int = 1.5;", "b");
        assert!(diags.contains_code(codes::FRACTIONAL_INTEGRAL));
    }

    #[test]
    fn test_conditional_joins_branches() {
        let (init, _) = init_of("const v = true ? \"a\" : null;", "v");
        assert_eq!(init.ty, IrType::string().nullable());
    }

    #[test]
    fn test_string_concat_and_comparison() {
        let (init, _) = init_of("const s = \"n=\" + 1;", "s");
        assert_eq!(init.ty, IrType::string());
        let (init, _) = init_of("const b = 1 < 2;", "b");
        assert_eq!(init.ty, IrType::boolean());
    }

    #[test]
    fn test_object_literal_synthesizes_shape() {
        let (init, diags) = init_of("const p = { x: 1, name: \"a\" };", "p");
        assert!(diags.is_empty());
        let IrType::Object(shape) = &init.ty else {
            panic!("expected shape, got {:?}", init.ty);
        };
        assert_eq!(shape.property("x").unwrap().ty, IrType::number());
        assert_eq!(shape.property("name").unwrap().ty, IrType::string());
    }

    #[test]
    fn test_object_literal_against_interface() {
        let (init, diags) = init_of(
            "interface Point { x: int; y: int }\nconst p: Point = { x: 1, y: 2 };",
            "p",
        );
        assert!(diags.is_empty(), "{:?}", diags);
        let IrExpressionKind::ObjectLiteral(fields) = &init.kind else {
            panic!("expected object literal");
        };
        assert_eq!(fields[0].1.ty, IrType::Primitive(PrimitiveKind::Int));
    }

    #[test]
    fn test_arrow_is_typed_from_context() {
        let (init, diags) = init_of("const f: (n: int) => int = n => n + 1;", "f");
        assert!(diags.is_empty(), "{:?}", diags);
        let IrExpressionKind::Function(lambda) = &init.kind else {
            panic!("expected lambda");
        };
        assert_eq!(lambda.params[0].ty, IrType::Primitive(PrimitiveKind::Int));
        assert_eq!(lambda.ret, IrType::Primitive(PrimitiveKind::Int));
    }

    #[test]
    fn test_unknown_identifier_is_reported() {
        let (init, diags) = init_of("const v = missing + 1;", "v");
        assert!(diags.contains_code(codes::UNRESOLVED_IDENTIFIER));
        assert!(matches!(init.kind, IrExpressionKind::Binary { .. }));
    }

    #[test]
    fn test_typeof_comparison_becomes_type_test() {
        let (init, _) = init_of("const x: any = 1;\nconst b = typeof x === \"string\";", "b");
        assert!(matches!(init.kind, IrExpressionKind::Is { .. }));
    }

    #[test]
    fn test_array_index_casts_double_to_int() {
        let (init, _) = init_of("const xs = [1, 2];\nconst i = 0.0 + 1;\nconst v = xs[i];", "v");
        let IrExpressionKind::Index { index, .. } = &init.kind else {
            panic!("expected index");
        };
        assert!(matches!(index.kind, IrExpressionKind::Cast { .. }));
        assert_eq!(init.ty, IrType::number());
    }
}
