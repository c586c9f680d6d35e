//! Pass B: heritage and members of every source skeleton.
//!
//! Updates are computed against the finished Pass A catalog and applied
//! afterwards, so every conversion sees the same set of names.

use crate::convert::{SELF_TYPE_PARAM, TASK, TypeConverter};
use crate::entry::{
    MemberEntry, MemberKind, MemberModifiers, Overridability, ParamEntry, SignatureEntry,
    TypeParamEntry, Visibility,
};
use crate::type_id::TypeId;
use crate::types::IrType;
use crate::universe::Universe;
use tsharp_binding::{Bindings, ModuleId};
use tsharp_syntax::ast::*;
use tsharp_syntax::Diagnostics;

struct Update {
    id: TypeId,
    type_params: Vec<TypeParamEntry>,
    base: Option<IrType>,
    interfaces: Vec<IrType>,
    members: Vec<MemberEntry>,
}

pub(crate) fn complete_source_types(
    universe: &mut Universe,
    modules: &[SourceModule],
    bindings: &Bindings,
    diags: &mut Diagnostics,
) {
    let mut updates = Vec::new();
    for (index, module) in modules.iter().enumerate() {
        let module_id = ModuleId::new(index);
        for stmt in &module.body {
            let name = match &stmt.kind {
                StmtKind::Class(c) => &c.name,
                StmtKind::Interface(i) => &i.name,
                StmtKind::Enum(e) => &e.name,
                StmtKind::TypeAlias(a) => &a.name,
                _ => continue,
            };
            let Some(decl) = bindings.lookup_type(module_id, name) else {
                continue;
            };
            let Some(id) = universe.source_type(decl).cloned() else {
                continue;
            };
            let mut conv = TypeConverter::new(universe, bindings, module_id);
            let update = match &stmt.kind {
                StmtKind::Class(class) => class_update(&mut conv, universe, id, class, diags),
                StmtKind::Interface(iface) => interface_update(&mut conv, id, iface, diags),
                StmtKind::Enum(decl) => enum_update(id, decl),
                StmtKind::TypeAlias(alias) => match &alias.ty.kind {
                    TypeKind::Object(members) => {
                        let pushed = conv.push_type_params(alias.type_params.iter().map(|p| p.name.clone()));
                        let type_params = conv.type_param_entries(&alias.type_params, diags);
                        let members = type_members(&mut conv, members, diags);
                        conv.pop_type_params(pushed);
                        Update {
                            id,
                            type_params,
                            base: None,
                            interfaces: Vec::new(),
                            members,
                        }
                    }
                    _ => continue,
                },
                _ => continue,
            };
            tracing::trace!(ty = %update.id, members = update.members.len(), "completed source type");
            updates.push(update);
        }
    }

    for update in updates {
        let Some(entry) = universe.entry_mut(&update.id) else {
            continue;
        };
        // Merged interfaces contribute several updates.
        if !update.type_params.is_empty() {
            entry.type_params = update.type_params;
        }
        if update.base.is_some() {
            entry.base = update.base;
        }
        entry.interfaces.extend(update.interfaces);
        entry.members.extend(update.members);
    }
}

fn visibility(accessibility: Option<Accessibility>) -> Visibility {
    match accessibility {
        Some(Accessibility::Private) => Visibility::Private,
        Some(Accessibility::Protected) => Visibility::Protected,
        Some(Accessibility::Public) | None => Visibility::Public,
    }
}

fn class_update(
    conv: &mut TypeConverter<'_>,
    universe: &Universe,
    id: TypeId,
    class: &ClassDecl,
    diags: &mut Diagnostics,
) -> Update {
    let pushed = conv.push_type_params(class.type_params.iter().map(|p| p.name.clone()));
    let type_params = conv.type_param_entries(&class.type_params, diags);
    let base = class.extends.as_ref().map(|b| conv.convert(b, diags));
    let interfaces = class.implements.iter().map(|i| conv.convert(i, diags)).collect();
    let self_type = IrType::Reference {
        id: id.clone(),
        args: class
            .type_params
            .iter()
            .map(|p| IrType::type_param(&p.name))
            .collect(),
    };

    let mut members: Vec<MemberEntry> = Vec::new();
    for member in &class.members {
        let mods = &member.modifiers;
        let mut modifiers = MemberModifiers {
            is_static: mods.is_static,
            visibility: visibility(mods.accessibility),
            overridability: Overridability::None,
            readonly: mods.readonly,
            optional: false,
            is_extension: false,
        };
        match &member.kind {
            ClassMemberKind::Property {
                name,
                ty,
                init,
                optional,
            } => {
                let mut ty = match ty {
                    Some(ty) => conv.convert(ty, diags),
                    None => init
                        .as_ref()
                        .map(|e| initializer_type(conv, e, diags))
                        .unwrap_or(IrType::Any),
                };
                if *optional {
                    ty = ty.nullable();
                    modifiers.optional = true;
                }
                if mods.is_abstract {
                    modifiers.overridability = Overridability::Abstract;
                }
                members.push(MemberEntry {
                    name: name.clone(),
                    kind: MemberKind::Property,
                    signatures: Vec::new(),
                    ty: Some(ty),
                    modifiers,
                });
            }
            ClassMemberKind::Method {
                name,
                kind: accessor @ (MethodKind::Getter | MethodKind::Setter),
                params,
                return_type,
                ..
            } => {
                let ty = match (accessor, return_type, params.first()) {
                    (MethodKind::Getter, Some(ret), _) => conv.convert(ret, diags),
                    (MethodKind::Setter, _, Some(param)) => conv.param_type(param, diags),
                    _ => IrType::Any,
                };
                let is_getter = *accessor == MethodKind::Getter;
                if let Some(existing) = members
                    .iter_mut()
                    .find(|m| m.name == *name && m.kind == MemberKind::Property)
                {
                    if !is_getter {
                        existing.modifiers.readonly = false;
                    }
                    continue;
                }
                modifiers.readonly = is_getter;
                members.push(MemberEntry {
                    name: name.clone(),
                    kind: MemberKind::Property,
                    signatures: Vec::new(),
                    ty: Some(ty),
                    modifiers,
                });
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
                let returns_self = matches!(return_type.as_ref().map(|t| &t.kind), Some(TypeKind::This));
                let mut names: Vec<String> = type_params.iter().map(|p| p.name.clone()).collect();
                if returns_self {
                    names.push(SELF_TYPE_PARAM.to_string());
                }
                let pushed = conv.push_type_params(names);
                let mut sig_type_params = conv.type_param_entries(type_params, diags);
                if returns_self {
                    sig_type_params.push(TypeParamEntry {
                        name: SELF_TYPE_PARAM.to_string(),
                        constraint: Some(self_type.clone()),
                    });
                }
                let params = conv.param_entries(params, diags);
                let ret = match return_type {
                    Some(ret) => conv.convert(ret, diags),
                    None => default_return(universe, body.as_deref(), mods.is_async, *is_generator),
                };
                conv.pop_type_params(pushed);

                modifiers.overridability = if mods.is_abstract {
                    Overridability::Abstract
                } else if mods.is_override {
                    Overridability::Override
                } else if !mods.is_static && modifiers.visibility != Visibility::Private {
                    Overridability::Virtual
                } else {
                    Overridability::None
                };
                push_signature(
                    &mut members,
                    name,
                    MemberKind::Method,
                    SignatureEntry {
                        type_params: sig_type_params,
                        params,
                        ret,
                    },
                    body.is_none() && !mods.is_abstract,
                    modifiers,
                );
            }
            ClassMemberKind::Constructor { params, body } => {
                for param in params.iter().filter(|p| p.is_parameter_property()) {
                    let Some(name) = param.name() else {
                        continue;
                    };
                    let ty = conv.param_type(param, diags);
                    members.push(MemberEntry {
                        name: name.to_string(),
                        kind: MemberKind::Property,
                        signatures: Vec::new(),
                        ty: Some(ty),
                        modifiers: MemberModifiers {
                            visibility: visibility(param.accessibility),
                            readonly: param.readonly,
                            ..MemberModifiers::default()
                        },
                    });
                }
                let params: Vec<ParamEntry> = conv.param_entries(params, diags);
                push_signature(
                    &mut members,
                    "constructor",
                    MemberKind::Constructor,
                    SignatureEntry {
                        type_params: Vec::new(),
                        params,
                        ret: IrType::void(),
                    },
                    body.is_none(),
                    modifiers,
                );
            }
            ClassMemberKind::Unsupported(_) => {}
        }
    }
    conv.pop_type_params(pushed);

    Update {
        id,
        type_params,
        base,
        interfaces,
        members,
    }
}

/// Add a signature to the member named `name`, creating it if needed.
/// Declared overload signatures hide the implementation signature.
fn push_signature(
    members: &mut Vec<MemberEntry>,
    name: &str,
    kind: MemberKind,
    signature: SignatureEntry,
    is_overload: bool,
    modifiers: MemberModifiers,
) {
    if let Some(existing) = members.iter_mut().find(|m| m.name == name && m.kind == kind) {
        if !is_overload && !existing.signatures.is_empty() {
            // Implementation after overloads: keep the overloads' surface.
            existing.modifiers = modifiers;
            return;
        }
        existing.signatures.push(signature);
        return;
    }
    members.push(MemberEntry {
        name: name.to_string(),
        kind,
        signatures: vec![signature],
        ty: None,
        modifiers,
    });
}

fn interface_update(
    conv: &mut TypeConverter<'_>,
    id: TypeId,
    iface: &InterfaceDecl,
    diags: &mut Diagnostics,
) -> Update {
    let pushed = conv.push_type_params(iface.type_params.iter().map(|p| p.name.clone()));
    let type_params = conv.type_param_entries(&iface.type_params, diags);
    let interfaces = iface.extends.iter().map(|e| conv.convert(e, diags)).collect();
    let members = type_members(conv, &iface.members, diags);
    conv.pop_type_params(pushed);
    Update {
        id,
        type_params,
        base: None,
        interfaces,
        members,
    }
}

fn type_members(conv: &mut TypeConverter<'_>, members: &[TypeMember], diags: &mut Diagnostics) -> Vec<MemberEntry> {
    let mut out: Vec<MemberEntry> = Vec::new();
    for member in members {
        match &member.kind {
            TypeMemberKind::Property {
                name,
                ty,
                optional,
                readonly,
            } => {
                let mut ty = conv.convert_or(ty.as_ref(), IrType::Any, diags);
                if *optional {
                    ty = ty.nullable();
                }
                out.push(MemberEntry {
                    name: name.clone(),
                    kind: MemberKind::Property,
                    signatures: Vec::new(),
                    ty: Some(ty),
                    modifiers: MemberModifiers {
                        readonly: *readonly,
                        optional: *optional,
                        overridability: Overridability::Abstract,
                        ..MemberModifiers::default()
                    },
                });
            }
            TypeMemberKind::Method {
                name,
                type_params,
                params,
                return_type,
                optional,
            } => {
                let pushed = conv.push_type_params(type_params.iter().map(|p| p.name.clone()));
                let signature = SignatureEntry {
                    type_params: conv.type_param_entries(type_params, diags),
                    params: conv.param_entries(params, diags),
                    ret: conv.convert_or(return_type.as_ref(), IrType::void(), diags),
                };
                conv.pop_type_params(pushed);
                push_signature(
                    &mut out,
                    name,
                    MemberKind::Method,
                    signature,
                    true,
                    MemberModifiers {
                        optional: *optional,
                        overridability: Overridability::Abstract,
                        ..MemberModifiers::default()
                    },
                );
            }
            TypeMemberKind::Index { .. } | TypeMemberKind::Call { .. } | TypeMemberKind::Unsupported(_) => {}
        }
    }
    out
}

fn enum_update(id: TypeId, decl: &EnumDecl) -> Update {
    let members = decl
        .members
        .iter()
        .map(|m| MemberEntry {
            name: m.name.clone(),
            kind: MemberKind::Field,
            signatures: Vec::new(),
            ty: Some(IrType::reference(id.clone())),
            modifiers: MemberModifiers {
                is_static: true,
                readonly: true,
                ..MemberModifiers::default()
            },
        })
        .collect();
    Update {
        id,
        type_params: Vec::new(),
        base: None,
        interfaces: Vec::new(),
        members,
    }
}

/// Type of an unannotated property from its initializer's syntax.
fn initializer_type(conv: &mut TypeConverter<'_>, init: &Expr, diags: &mut Diagnostics) -> IrType {
    match &init.kind {
        ExprKind::Number(_) => IrType::number(),
        ExprKind::String(_) | ExprKind::Template(_) => IrType::string(),
        ExprKind::Bool(_) => IrType::boolean(),
        ExprKind::New { callee, type_args, .. } => match &callee.kind {
            ExprKind::Ident(name) => {
                let node = TypeNode::new(
                    TypeKind::Reference {
                        name: name.clone(),
                        args: type_args.clone(),
                    },
                    callee.span,
                );
                conv.convert(&node, diags)
            }
            _ => IrType::Any,
        },
        ExprKind::As { ty, .. } => conv.convert(ty, diags),
        _ => IrType::Any,
    }
}

/// Return type of an unannotated method: `void` unless some `return`
/// carries a value.
fn default_return(universe: &Universe, body: Option<&[Stmt]>, is_async: bool, is_generator: bool) -> IrType {
    if is_generator {
        return IrType::Unknown;
    }
    let returns_value = body.is_some_and(|stmts| stmts.iter().any(returns_value));
    match (is_async, returns_value) {
        (false, false) => IrType::void(),
        (false, true) => IrType::Unknown,
        (true, false) => universe.platform_reference(TASK, Vec::new()),
        (true, true) => universe.platform_reference(crate::convert::TASK_OF, vec![IrType::Unknown]),
    }
}

fn returns_value(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(value) => value.is_some(),
        StmtKind::If {
            consequent,
            alternate,
            ..
        } => returns_value(consequent) || alternate.as_deref().is_some_and(returns_value),
        StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::For { body, .. }
        | StmtKind::ForOf { body, .. }
        | StmtKind::ForIn { body, .. } => returns_value(body),
        StmtKind::Block(stmts) => stmts.iter().any(returns_value),
        StmtKind::Try {
            block,
            handler,
            finalizer,
        } => {
            block.iter().any(returns_value)
                || handler.as_ref().is_some_and(|h| h.body.iter().any(returns_value))
                || finalizer.as_ref().is_some_and(|f| f.iter().any(returns_value))
        }
        StmtKind::Switch { cases, .. } => cases.iter().any(|c| c.body.iter().any(returns_value)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::entry::{MemberKind, NominalKind, Overridability, Visibility};
    use crate::types::IrType;
    use crate::universe::{CatalogOptions, Universe};
    use tsharp_binding::Bindings;
    use tsharp_syntax::Diagnostics;

    fn build(files: &[(&str, &str)]) -> (Universe, Diagnostics) {
        let modules: Vec<_> = files
            .iter()
            .map(|(path, text)| tsharp_syntax::read_typescript(path, text).unwrap())
            .collect();
        let bindings = Bindings::build(&modules, "@dotnet/");
        let mut diags = Diagnostics::new();
        let universe = Universe::build(&modules, &bindings, &CatalogOptions::default(), &mut diags);
        (universe, diags)
    }

    #[test]
    fn test_forward_references_across_modules() {
        // `a.ts` refers to a type declared in a module read after it.
        let (universe, diags) = build(&[
            ("a.ts", "import { B } from \"./models/b\";\nexport class A { b: B; items: B[] = []; }\n"),
            ("models/b.ts", "export class B { name = \"\"; }\n"),
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
        let a = universe.resolve_alias("App.A").unwrap();
        let b = universe.resolve_alias("App.models.B").unwrap();
        let entry = universe.entry(&a).unwrap();
        assert_eq!(entry.member("b").unwrap().ty, Some(IrType::reference(b.clone())));
        assert_eq!(
            universe.entry(&b).unwrap().member("name").unwrap().ty,
            Some(IrType::string())
        );
    }

    #[test]
    fn test_class_members_and_heritage() {
        let (universe, diags) = build(&[(
            "shapes.ts",
            "export abstract class Shape {\n  constructor(protected readonly name: string) {}\n  abstract area(): number;\n  describe(): string { return this.name; }\n  private secret(): void {}\n}\nexport class Circle extends Shape {\n  area(): number { return 1; }\n}\n",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let shape_id = universe.resolve_alias("App.Shape").unwrap();
        let shape = universe.entry(&shape_id).unwrap();
        assert!(shape.is_abstract);
        assert_eq!(
            shape.member("area").unwrap().modifiers.overridability,
            Overridability::Abstract
        );
        assert_eq!(
            shape.member("describe").unwrap().modifiers.overridability,
            Overridability::Virtual
        );
        assert_eq!(
            shape.member("secret").unwrap().modifiers.overridability,
            Overridability::None
        );
        let name = shape.member("name").unwrap();
        assert_eq!(name.kind, MemberKind::Property);
        assert_eq!(name.modifiers.visibility, Visibility::Protected);
        assert!(name.modifiers.readonly);

        let circle = universe.resolve_alias("App.Circle").unwrap();
        let (declaring, member) = universe.lookup_member_with_inheritance(&circle, "describe").unwrap();
        assert_eq!(declaring.id, shape_id);
        assert_eq!(member.signatures[0].ret, IrType::string());
    }

    #[test]
    fn test_merged_interfaces_and_nominal_aliases() {
        let (universe, diags) = build(&[(
            "main.ts",
            "interface Named { name: string; }\ninterface Named { nick?: string; }\ntype Point = { x: number; y: number };\n",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let named = universe.resolve_alias("App.Named").unwrap();
        let entry = universe.entry(&named).unwrap();
        assert_eq!(entry.members.len(), 2);
        assert!(entry.member("nick").unwrap().ty.as_ref().unwrap().is_nullable());
        let point = universe.resolve_alias("App.Point").unwrap();
        let point = universe.entry(&point).unwrap();
        assert_eq!(point.kind, NominalKind::Interface);
        assert!(universe.is_data_shape(point));
    }

    #[test]
    fn test_this_return_gets_self_parameter() {
        let (universe, _) = build(&[(
            "builder.ts",
            "export class Builder { add(x: number): this { return this; } }\n",
        )]);
        let id = universe.resolve_alias("App.Builder").unwrap();
        let add = universe.entry(&id).unwrap().member("add").unwrap();
        let sig = &add.signatures[0];
        assert_eq!(sig.type_params[0].name, "TSelf");
        assert_eq!(sig.ret, IrType::type_param("TSelf"));
        assert_eq!(sig.type_params[0].constraint, Some(IrType::reference(id.clone())));
    }
}
