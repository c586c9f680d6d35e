//! Classes, interfaces and enums.

use super::call::CallArg;
use super::{BodyBuilder, ClassFrame, FunctionSpec};
use crate::error::Ice;
use crate::ir::*;
use std::collections::HashMap;
use std::sync::Arc;
use tsharp_catalog::{
    EnumRepr, IrType, MemberKind, MemberLookup, NominalEntry, NominalKind, SignatureEntry, TypeParamEntry,
    Visibility,
};
use tsharp_syntax::ast::{
    Accessibility, ClassDecl, ClassMember, ClassMemberKind, EnumDecl, Expr, ExprKind, MethodKind,
    Param, Stmt, StmtKind, UnaryOp,
};
use tsharp_syntax::{Span, codes};

/// What the override check decided for one member.
struct Placement {
    visibility: Visibility,
    modifier: OverrideModifier,
}

impl<'a> BodyBuilder<'a> {
    fn entry(&self, name: &str) -> Result<&'a NominalEntry, Ice> {
        let id = self.source_type_id(name)?;
        let universe = self.universe;
        universe.entry(&id).ok_or_else(|| Ice::MissingCatalogEntry {
            name: name.to_string(),
            module: self.file.to_string(),
        })
    }

    pub(crate) fn class(&mut self, class: &ClassDecl) -> Result<IrClass, Ice> {
        let entry = self.entry(&class.name)?;
        let pushed = self
            .types
            .push_type_params(entry.type_params.iter().map(|p| p.name.clone()));
        let self_ty = IrType::Reference {
            id: entry.id.clone(),
            args: entry
                .type_params
                .iter()
                .map(|p| IrType::type_param(&p.name))
                .collect(),
        };
        let saved = self.class.replace(ClassFrame {
            id: entry.id.clone(),
            self_ty,
            base: entry.base.clone(),
            is_static: false,
        });

        let mut members: Vec<IrClassMember> = Vec::new();
        // Accessor pairs share one property.
        let mut accessors: HashMap<String, usize> = HashMap::new();
        for member in &class.members {
            self.set_static(member.modifiers.is_static);
            match &member.kind {
                ClassMemberKind::Property { name, init, .. } => {
                    let property = self.property(entry, member, name, init.as_ref());
                    members.push(IrClassMember::Property(property));
                }
                ClassMemberKind::Method {
                    name,
                    kind: kind @ (MethodKind::Getter | MethodKind::Setter),
                    params,
                    return_type,
                    body,
                    ..
                } => {
                    let spec = FunctionSpec {
                        name,
                        type_params: &[],
                        params,
                        return_type: return_type.as_ref(),
                        body: body.as_deref(),
                        is_async: false,
                        is_generator: false,
                        span: member.span,
                        signature: None,
                        fallback_ret: None,
                    };
                    let function = self.function(&spec);
                    let index = match accessors.get(name) {
                        Some(index) => *index,
                        None => {
                            let property = self.property(entry, member, name, None);
                            members.push(IrClassMember::Property(property));
                            accessors.insert(name.clone(), members.len() - 1);
                            members.len() - 1
                        }
                    };
                    let Some(IrClassMember::Property(property)) = members.get_mut(index) else {
                        continue;
                    };
                    let body = function.body.unwrap_or_default();
                    match kind {
                        MethodKind::Getter => property.getter = Some(body),
                        _ => {
                            property.setter = Some(IrSetter {
                                param: function
                                    .params
                                    .first()
                                    .map(|p| p.name.clone())
                                    .unwrap_or_else(|| "value".to_string()),
                                body,
                            });
                        }
                    }
                }
                ClassMemberKind::Method {
                    name,
                    type_params,
                    params,
                    return_type,
                    body,
                    is_generator,
                    ..
                } => {
                    let is_abstract = member.modifiers.is_abstract;
                    // Overload signatures only shape the catalog entry.
                    if body.is_none() && !is_abstract {
                        continue;
                    }
                    let spec = FunctionSpec {
                        name,
                        type_params,
                        params,
                        return_type: return_type.as_ref(),
                        body: body.as_deref(),
                        is_async: member.modifiers.is_async,
                        is_generator: *is_generator,
                        span: member.span,
                        signature: None,
                        fallback_ret: None,
                    };
                    let function = self.function(&spec);
                    let placement = self.placement(entry, member, name, MemberKind::Method, Some(function.params.len()));
                    members.push(IrClassMember::Method(IrMethod {
                        function,
                        visibility: placement.visibility,
                        is_static: member.modifiers.is_static,
                        modifier: placement.modifier,
                    }));
                }
                ClassMemberKind::Constructor { params, body } => {
                    let Some(body) = body else {
                        continue;
                    };
                    let (constructor, properties) = self.constructor(member, params, body);
                    members.extend(properties.into_iter().map(IrClassMember::Property));
                    members.push(IrClassMember::Constructor(constructor));
                }
                ClassMemberKind::Unsupported(text) => {
                    self.error(
                        codes::UNSUPPORTED_STATEMENT,
                        member.span,
                        format!("unsupported class member `{}`", text),
                    );
                }
            }
        }

        self.class = saved;
        let type_params = self.type_params(&entry.type_params);
        self.types.pop_type_params(pushed);
        Ok(IrClass {
            id: entry.id.clone(),
            name: class.name.clone(),
            type_params,
            base: entry.base.clone(),
            interfaces: entry.interfaces.clone(),
            members,
            is_abstract: class.is_abstract,
            span: class.span,
        })
    }

    fn set_static(&mut self, is_static: bool) {
        if let Some(class) = self.class.as_mut() {
            class.is_static = is_static;
        }
    }

    fn type_params(&self, params: &[TypeParamEntry]) -> Vec<IrTypeParam> {
        params
            .iter()
            .map(|p| IrTypeParam {
                name: p.name.clone(),
                constraint: p.constraint.clone(),
            })
            .collect()
    }

    /// Field or accessor property, typed from the catalog entry.
    fn property(&mut self, entry: &'a NominalEntry, member: &ClassMember, name: &str, init: Option<&Expr>) -> IrProperty {
        let catalog = entry
            .members_named(name)
            .find(|m| m.kind == MemberKind::Property);
        let ty = catalog.and_then(|m| m.ty.clone()).unwrap_or(IrType::Any);
        let readonly = catalog.map_or(member.modifiers.readonly, |m| m.modifiers.readonly);
        let init = init.map(|e| self.expr(e, Some(&ty)));
        let placement = self.placement(entry, member, name, MemberKind::Property, None);
        IrProperty {
            name: name.to_string(),
            ty,
            visibility: placement.visibility,
            is_static: member.modifiers.is_static,
            readonly,
            modifier: placement.modifier,
            init,
            getter: None,
            setter: None,
        }
    }

    /// Constructor body, its `super(...)` call and parameter properties.
    fn constructor(&mut self, member: &ClassMember, params: &[Param], body: &[Stmt]) -> (IrConstructor, Vec<IrProperty>) {
        self.locals.push();
        self.frames.push(Default::default());
        let (ir_params, mut prologue) = self.bind_params(params, &[]);

        let mut properties = Vec::new();
        for (param, ir) in params.iter().zip(&ir_params) {
            if !param.is_parameter_property() {
                continue;
            }
            properties.push(IrProperty {
                name: ir.name.clone(),
                ty: ir.ty.clone(),
                visibility: visibility(param.accessibility),
                is_static: false,
                readonly: param.readonly,
                modifier: OverrideModifier::None,
                init: None,
                getter: None,
                setter: None,
            });
            prologue.push(IrStatement::Expr(self.assign_this(&ir.name, &ir.ty, param.span)));
        }

        let (base_args, rest) = match body.split_first() {
            Some((first, rest)) => match super_args(first) {
                Some(args) => (Some(self.base_args(args, first.span)), rest),
                None => (None, body),
            },
            None => (None, body),
        };
        let mut stmts = prologue;
        stmts.extend(self.stmts(rest));
        self.frames.pop();
        self.locals.pop();

        let constructor = IrConstructor {
            visibility: visibility(member.modifiers.accessibility),
            params: ir_params,
            base_args,
            body: stmts,
        };
        (constructor, properties)
    }

    fn assign_this(&mut self, name: &str, ty: &IrType, span: Span) -> IrExpression {
        let this = self.expr(&Expr { kind: ExprKind::This, span }, None);
        let target = IrExpression::new(
            IrExpressionKind::Member {
                object: Box::new(this),
                name: name.to_string(),
                optional: false,
                extension: None,
            },
            ty.clone(),
            span,
        );
        let value = IrExpression::new(IrExpressionKind::Local(name.to_string()), ty.clone(), span);
        IrExpression::new(
            IrExpressionKind::Assign {
                op: None,
                target: Box::new(target),
                value: Box::new(value),
            },
            ty.clone(),
            span,
        )
    }

    /// Arguments of `super(...)`, resolved against the base constructors.
    fn base_args(&mut self, args: &[Expr], span: Span) -> Vec<IrArgument> {
        let base = self.class.as_ref().and_then(|c| c.base.clone());
        let universe = self.universe;
        let Some((entry, type_args)) = base.as_ref().and_then(|b| universe.entry_of_type(b)) else {
            self.error(
                codes::UNSUPPORTED_EXPRESSION,
                span,
                "`super(...)` needs a base class".to_string(),
            );
            return Vec::new();
        };
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
        if sigs.is_empty() {
            return args.iter().map(|a| IrArgument::value(self.expr(a, None))).collect();
        }
        let call_args = args.iter().map(CallArg::Source).collect();
        self.resolve_call("base", &sigs, HashMap::new(), &[], None, call_args, span)
            .map(|resolved| resolved.args)
            .unwrap_or_default()
    }

    // ========================================================================
    // Overrides
    // ========================================================================

    /// Visibility and override modifier for a class member, checked
    /// against what it inherits.
    fn placement(
        &mut self,
        entry: &NominalEntry,
        member: &ClassMember,
        name: &str,
        kind: MemberKind,
        param_count: Option<usize>,
    ) -> Placement {
        let declared = visibility(member.modifiers.accessibility);
        let own = if member.modifiers.is_abstract {
            OverrideModifier::Abstract
        } else if kind == MemberKind::Method && !member.modifiers.is_static && declared != Visibility::Private {
            OverrideModifier::Virtual
        } else {
            OverrideModifier::None
        };
        let universe = self.universe;
        let inherited = universe
            .lookup_inherited_member(&entry.id, name)
            .filter(|found| found.member.modifiers.visibility != Visibility::Private);
        let Some(inherited) = inherited else {
            return Placement {
                visibility: declared,
                modifier: own,
            };
        };

        if inherited.declaring.kind == NominalKind::Interface {
            if declared != Visibility::Public {
                self.error(
                    codes::INTERFACE_NOT_PUBLIC,
                    member.span,
                    format!(
                        "`{}` implements `{}.{}` and must be public",
                        name, inherited.declaring.id.surface_name, name
                    ),
                );
            }
            return Placement {
                visibility: Visibility::Public,
                modifier: own,
            };
        }

        if member.modifiers.is_static || !overrides(&inherited, kind, param_count) {
            return Placement {
                visibility: declared,
                modifier: OverrideModifier::New,
            };
        }

        let required = required_visibility(&inherited);
        if declared.rank() < required.rank() {
            self.error(
                codes::VISIBILITY_NARROWED,
                member.span,
                format!(
                    "`{}` overrides a {} member and cannot be {}",
                    name,
                    required.keyword(),
                    declared.keyword()
                ),
            );
        } else if declared.rank() > required.rank() {
            self.warning(
                codes::VISIBILITY_WIDENED,
                member.span,
                format!(
                    "`{}` overrides a {} member; emitted as {}",
                    name,
                    required.keyword(),
                    required.keyword()
                ),
            );
        }
        Placement {
            visibility: required,
            modifier: OverrideModifier::Override,
        }
    }

    // ========================================================================
    // Interfaces and enums
    // ========================================================================

    pub(crate) fn interface(&mut self, name: &str, span: Span) -> Result<IrInterface, Ice> {
        let entry = self.entry(name)?;
        let mut members = Vec::new();
        for member in &entry.members {
            match member.kind {
                MemberKind::Property | MemberKind::Field => members.push(IrInterfaceMember::Property {
                    name: member.name.clone(),
                    ty: member.ty.clone().unwrap_or(IrType::Any),
                    optional: member.modifiers.optional,
                    readonly: member.modifiers.readonly,
                }),
                MemberKind::Method => {
                    for sig in &member.signatures {
                        members.push(IrInterfaceMember::Method {
                            name: member.name.clone(),
                            type_params: self.type_params(&sig.type_params),
                            params: sig
                                .params
                                .iter()
                                .map(|p| IrParam {
                                    name: p.name.clone(),
                                    ty: p.ty.clone(),
                                    mode: p.mode,
                                    default: None,
                                    optional: p.optional,
                                    rest: p.rest,
                                })
                                .collect(),
                            ret: sig.ret.clone(),
                        });
                    }
                }
                MemberKind::Constructor => {}
            }
        }
        Ok(IrInterface {
            id: entry.id.clone(),
            name: name.to_string(),
            type_params: self.type_params(&entry.type_params),
            extends: entry.interfaces.clone(),
            members,
            as_class: self.universe.is_data_shape(entry),
            span,
        })
    }

    pub(crate) fn enum_decl(&mut self, decl: &EnumDecl) -> Result<IrEnum, Ice> {
        let entry = self.entry(&decl.name)?;
        let repr = entry.enum_repr.unwrap_or(EnumRepr::Numeric);
        let mut next: i64 = 0;
        let mut members = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            let value = match (repr, member.init.as_ref().map(|e| &e.kind)) {
                (EnumRepr::String, Some(ExprKind::String(text))) => EnumValue::Str(text.clone()),
                (EnumRepr::String, _) => {
                    self.error(
                        codes::UNSUPPORTED_EXPRESSION,
                        member.span,
                        format!("member `{}` of a string enum needs a string initializer", member.name),
                    );
                    EnumValue::Str(member.name.clone())
                }
                (EnumRepr::Numeric, None) => EnumValue::Int(next),
                (EnumRepr::Numeric, Some(_)) => {
                    let value = member.init.as_ref().and_then(enum_number);
                    match value {
                        Some(value) => EnumValue::Int(value),
                        None => {
                            self.error(
                                codes::UNSUPPORTED_EXPRESSION,
                                member.span,
                                format!("member `{}` needs a constant integer initializer", member.name),
                            );
                            EnumValue::Int(next)
                        }
                    }
                }
            };
            if let EnumValue::Int(value) = value {
                next = value + 1;
            }
            members.push(IrEnumMember {
                name: member.name.clone(),
                value,
            });
        }
        Ok(IrEnum {
            id: entry.id.clone(),
            name: decl.name.clone(),
            repr,
            members,
            span: decl.span,
        })
    }
}

fn visibility(accessibility: Option<Accessibility>) -> Visibility {
    match accessibility {
        Some(Accessibility::Private) => Visibility::Private,
        Some(Accessibility::Protected) => Visibility::Protected,
        Some(Accessibility::Public) | None => Visibility::Public,
    }
}

/// Visibility an override must be emitted with. A platform member that is
/// `protected internal` is only `protected` from another assembly.
fn required_visibility(inherited: &MemberLookup<'_>) -> Visibility {
    let declared = inherited.member.modifiers.visibility;
    if declared == Visibility::ProtectedInternal && !inherited.declaring.origin.is_source() {
        Visibility::Protected
    } else {
        declared
    }
}

/// Whether a member of `kind` overrides `inherited` rather than hiding it.
fn overrides(inherited: &MemberLookup<'_>, kind: MemberKind, param_count: Option<usize>) -> bool {
    let member = inherited.member;
    let same_kind = match (member.kind, kind) {
        (MemberKind::Property | MemberKind::Field, MemberKind::Property) => member.kind == MemberKind::Property,
        (a, b) => a == b,
    };
    let overridable = member.modifiers.overridability.can_be_overridden() || inherited.declaring.origin.is_source();
    let compatible = match param_count {
        Some(count) => member.signatures.iter().any(|s| s.params.len() == count),
        None => true,
    };
    same_kind && overridable && compatible && !member.modifiers.is_static
}

/// Arguments of a leading `super(...)` statement.
fn super_args(stmt: &Stmt) -> Option<&[Expr]> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    match &expr.kind {
        ExprKind::Call { callee, args, .. } if matches!(callee.kind, ExprKind::Super) => Some(args),
        _ => None,
    }
}

/// Constant value of a numeric enum initializer.
fn enum_number(init: &Expr) -> Option<i64> {
    match &init.kind {
        ExprKind::Number(raw) => parse_integer(raw),
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => enum_number(operand).map(|v| -v),
        _ => None,
    }
}

fn parse_integer(raw: &str) -> Option<i64> {
    let digits = raw.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else {
        lower.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::build;
    use super::*;
    use tsharp_syntax::Diagnostics;

    fn class<'m>(ir: &'m [IrModule], name: &str) -> &'m IrClass {
        ir.iter().flat_map(|m| m.classes()).find(|c| c.name == name).unwrap()
    }

    fn method<'c>(class: &'c IrClass, name: &str) -> &'c IrMethod {
        class
            .members
            .iter()
            .find_map(|m| match m {
                IrClassMember::Method(m) if m.function.name == name => Some(m),
                _ => None,
            })
            .unwrap()
    }

    fn codes_of(diags: &Diagnostics) -> Vec<&str> {
        diags.iter().map(|d| d.code).collect()
    }

    const ANIMALS: &str = "class Animal {\n  constructor(public name: string) {}\n  speak(): string { return this.name; }\n}\n";

    #[test]
    fn test_override_of_source_method() {
        let src = format!("{}class Dog extends Animal {{\n  speak(): string {{ return \"woof\"; }}\n}}\n", ANIMALS);
        let (ir, diags) = build(&[("animals.ts", &src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(method(class(&ir, "Animal"), "speak").modifier, OverrideModifier::Virtual);
        let dog = method(class(&ir, "Dog"), "speak");
        assert_eq!(dog.modifier, OverrideModifier::Override);
        assert_eq!(dog.visibility, Visibility::Public);
    }

    #[test]
    fn test_narrowed_override_is_an_error() {
        let src = format!("{}class Cat extends Animal {{\n  protected speak(): string {{ return \"meow\"; }}\n}}\n", ANIMALS);
        let (_, diags) = build(&[("animals.ts", &src)]);
        assert_eq!(codes_of(&diags), vec![codes::VISIBILITY_NARROWED]);
    }

    #[test]
    fn test_widened_override_is_a_warning() {
        let src = "class Base {\n  protected describe(): string { return \"base\"; }\n}\nclass Derived extends Base {\n  describe(): string { return \"derived\"; }\n}\n";
        let (ir, diags) = build(&[("shapes.ts", src)]);
        assert_eq!(codes_of(&diags), vec![codes::VISIBILITY_WIDENED]);
        assert_eq!(method(class(&ir, "Derived"), "describe").visibility, Visibility::Protected);
    }

    #[test]
    fn test_different_arity_hides_instead() {
        let src = format!(
            "{}class Parrot extends Animal {{\n  speak(times: int): string {{ return \"hello\"; }}\n}}\n",
            ANIMALS
        );
        let (ir, _) = build(&[("animals.ts", &src)]);
        assert_eq!(method(class(&ir, "Parrot"), "speak").modifier, OverrideModifier::New);
    }

    #[test]
    fn test_interface_member_must_be_public() {
        let src = "interface Named {\n  label(): string;\n}\nclass Tag implements Named {\n  private label(): string { return \"t\"; }\n}\n";
        let (_, diags) = build(&[("tags.ts", src)]);
        assert!(diags.contains_code(codes::INTERFACE_NOT_PUBLIC));
    }

    #[test]
    fn test_constructor_parameter_properties_and_super() {
        let src = format!("{}class Puppy extends Animal {{\n  constructor() {{ super(\"rex\"); }}\n}}\n", ANIMALS);
        let (ir, diags) = build(&[("animals.ts", &src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let animal = class(&ir, "Animal");
        assert!(animal.members.iter().any(|m| matches!(
            m,
            IrClassMember::Property(p) if p.name == "name" && p.ty == IrType::string()
        )));
        let puppy = class(&ir, "Puppy");
        let ctor = puppy
            .members
            .iter()
            .find_map(|m| match m {
                IrClassMember::Constructor(c) => Some(c),
                _ => None,
            })
            .unwrap();
        assert_eq!(ctor.base_args.as_ref().map(Vec::len), Some(1));
        assert!(ctor.body.is_empty());
    }

    #[test]
    fn test_getter_and_setter_merge() {
        let src = "class Counter {\n  private count: int = 0;\n  get value(): int { return this.count; }\n  set value(v: int) { this.count = v; }\n}\n";
        let (ir, diags) = build(&[("counter.ts", src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let properties: Vec<&IrProperty> = class(&ir, "Counter")
            .members
            .iter()
            .filter_map(|m| match m {
                IrClassMember::Property(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(properties.len(), 2);
        let value = properties[1];
        assert!(value.getter.is_some());
        assert_eq!(value.setter.as_ref().map(|s| s.param.as_str()), Some("v"));
    }

    #[test]
    fn test_enum_values() {
        let src = "enum Level { Low, Mid = 5, High }\nenum Color { Red = \"red\", Blue = \"blue\" }\n";
        let (ir, diags) = build(&[("enums.ts", src)]);
        assert!(diags.is_empty(), "{:?}", diags);
        let enums: Vec<&IrEnum> = ir[0]
            .declarations
            .iter()
            .filter_map(|d| match d {
                IrDeclaration::Enum(e) => Some(e),
                _ => None,
            })
            .collect();
        let values: Vec<&EnumValue> = enums[0].members.iter().map(|m| &m.value).collect();
        assert_eq!(values, vec![&EnumValue::Int(0), &EnumValue::Int(5), &EnumValue::Int(6)]);
        assert_eq!(enums[1].repr, EnumRepr::String);
        assert_eq!(enums[1].members[0].value, EnumValue::Str("red".to_string()));
    }

    #[test]
    fn test_property_only_interface_is_data_shape() {
        let (ir, _) = build(&[("user.ts", "export interface User { name: string; age: int; }")]);
        let IrDeclaration::Interface(user) = &ir[0].declarations[0] else {
            panic!("expected interface");
        };
        assert!(user.as_class);
        assert_eq!(user.members.len(), 2);
    }
}
