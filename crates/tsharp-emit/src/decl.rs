//! Declarations and the per-module file layout.
//!
//! Classes, interfaces and enums become members of the module namespace.
//! Functions, variables and top-level statements go into one static
//! container class named after the file.

use crate::context::EmitterContext;
use crate::cs::*;
use crate::emitter::ModuleEmitter;
use crate::error::Ice;
use crate::naming::{escape_identifier, escape_qualified};
use crate::types::{data_property, needs_default};
use tsharp_catalog::{EnumRepr, IrType};
use tsharp_catalog::universe::OBJECT_TYPE;
use tsharp_ir::{
    EnumValue, IrClass, IrClassMember, IrConstructor, IrDeclaration, IrEnum, IrFunction, IrInterface,
    IrInterfaceMember, IrMethod, IrProperty, IrTypeParam, IrVariable, OverrideModifier,
};

fn override_keyword(modifier: OverrideModifier) -> Option<&'static str> {
    match modifier {
        OverrideModifier::None => None,
        OverrideModifier::Virtual => Some("virtual"),
        OverrideModifier::Override => Some("override"),
        OverrideModifier::New => Some("new"),
        OverrideModifier::Abstract => Some("abstract"),
    }
}

fn member_modifiers(visibility: &'static str, is_static: bool, modifier: OverrideModifier) -> Vec<&'static str> {
    let mut modifiers = vec![visibility];
    if is_static {
        modifiers.push("static");
    }
    modifiers.extend(override_keyword(modifier));
    modifiers
}

impl ModuleEmitter<'_> {
    /// The module as one C# file.
    pub fn emit_module(&mut self) -> Result<CsFile, Ice> {
        let module = self.module;
        let mut types = Vec::new();
        let mut container_members = Vec::new();
        for decl in &module.declarations {
            match decl {
                IrDeclaration::Class(class) => types.push(CsTypeDecl::Class(self.class_decl(class)?)),
                IrDeclaration::Interface(interface) => types.push(self.interface_decl(interface)?),
                IrDeclaration::Enum(e) => types.push(self.enum_decl(e)),
                IrDeclaration::Function { function, exported } => {
                    container_members.extend(self.module_function(function, *exported)?);
                }
                IrDeclaration::Variable(variable) => container_members.push(self.module_variable(variable)?),
            }
        }

        let container_ctx = EmitterContext::new().in_container();
        if module.is_entry {
            let ctx = container_ctx
                .for_member(true, module.top_level_async)
                .with_function("Main");
            let (body, ctx) = self.stmts(&module.top_level, ctx)?;
            self.finish(&ctx);
            let (modifiers, ret) = if module.top_level_async {
                (
                    vec!["public", "static", "async"],
                    CsType::named("global::System.Threading.Tasks.Task"),
                )
            } else {
                (vec!["public", "static"], CsType::void())
            };
            container_members.push(CsMember::Method(CsMethod {
                modifiers,
                ret,
                name: "Main".to_string(),
                type_params: Vec::new(),
                params: Vec::new(),
                body: Some(body),
            }));
        } else if !module.top_level.is_empty() {
            let ctx = container_ctx.for_member(true, false).with_function(&module.container);
            let (body, ctx) = self.stmts(&module.top_level, ctx)?;
            self.finish(&ctx);
            container_members.push(CsMember::Constructor(CsConstructor {
                modifiers: vec!["static"],
                name: self.container.clone(),
                params: Vec::new(),
                base_args: None,
                body,
            }));
        }
        if !container_members.is_empty() {
            let container = CsClass {
                members: container_members,
                ..CsClass::new(vec!["public", "static"], self.container.clone())
            };
            types.push(CsTypeDecl::Class(container));
        }

        let shapes = std::mem::take(&mut self.shapes);
        tracing::trace!(module = %module.path, shapes = shapes.len(), "module emitted");
        types.extend(shapes.into_decls());
        Ok(CsFile {
            usings: self.usings.iter().map(|u| escape_qualified(u)).collect(),
            namespace: escape_qualified(&module.namespace),
            types,
        })
    }

    /// Type parameters with the constraints C# can express.
    pub(crate) fn type_params(&mut self, params: &[IrTypeParam], ctx: &EmitterContext) -> Result<Vec<CsTypeParam>, Ice> {
        let mut out = Vec::with_capacity(params.len());
        for param in params {
            let mut cs = CsTypeParam::new(escape_identifier(&param.name));
            if let Some(constraint) = &param.constraint {
                let expressible = match constraint {
                    IrType::Reference { id, .. } => {
                        self.universe.primitive_of(id).is_none() && id.platform_name.as_ref() != OBJECT_TYPE
                    }
                    IrType::TypeParameter(_) => true,
                    _ => false,
                };
                if expressible {
                    let ty = self.cs_type(constraint, ctx)?;
                    cs.constraints.push(ty.non_nullable().clone());
                }
            }
            out.push(cs);
        }
        Ok(out)
    }

    fn class_decl(&mut self, class: &IrClass) -> Result<CsClass, Ice> {
        tracing::trace!(class = %class.name, members = class.members.len(), "class");
        let name = escape_identifier(&class.name);
        let self_type = CsType::generic(
            name.clone(),
            class
                .type_params
                .iter()
                .map(|p| CsType::named(escape_identifier(&p.name)))
                .collect(),
        );
        let ctx = EmitterContext::new()
            .with_type_params(class.type_params.iter().map(|p| p.name.clone()))
            .with_self_type(self_type);
        self.class_id = Some(class.id.platform_name.to_string());

        let type_params = self.type_params(&class.type_params, &ctx)?;
        let mut bases = Vec::new();
        if let Some(base) = &class.base {
            let is_object = matches!(base, IrType::Reference { id, .. } if id.platform_name.as_ref() == OBJECT_TYPE);
            if !is_object {
                bases.push(self.cs_type(base, &ctx)?.non_nullable().clone());
            }
        }
        for interface in &class.interfaces {
            bases.push(self.cs_type(interface, &ctx)?.non_nullable().clone());
        }

        let mut members = Vec::with_capacity(class.members.len());
        for member in &class.members {
            match member {
                IrClassMember::Property(prop) => members.push(self.property(prop, &ctx)?),
                IrClassMember::Method(method) => members.extend(self.method(method, &ctx)?),
                IrClassMember::Constructor(ctor) => members.push(self.constructor(ctor, &name, &ctx)?),
            }
        }
        self.class_id = None;

        let mut modifiers = vec!["public"];
        if class.is_abstract {
            modifiers.push("abstract");
        }
        Ok(CsClass {
            modifiers,
            name,
            type_params,
            bases,
            members,
        })
    }

    fn property(&mut self, prop: &IrProperty, ctx: &EmitterContext) -> Result<CsMember, Ice> {
        let ty = self.cs_type(&prop.ty, ctx)?;
        let modifiers = member_modifiers(prop.visibility.keyword(), prop.is_static, prop.modifier);
        let name = escape_identifier(&prop.name);
        let abstract_member = prop.modifier == OverrideModifier::Abstract;

        if prop.is_auto() {
            let init = match &prop.init {
                Some(init) => {
                    let (lowered, inner) = self.expr(init, ctx.for_member(prop.is_static, false))?;
                    self.finish(&inner);
                    Some(lowered)
                }
                None if needs_default(&ty) && !abstract_member => Some(CsExpr::NullForgiving(Box::new(CsExpr::Default(None)))),
                None => None,
            };
            if let Some(CsExpr::Throw(thrown)) = init {
                return Ok(CsMember::Property(throwing_property(modifiers, ty, name, *thrown, !prop.readonly)));
            }
            let mut cs = CsProperty::auto(modifiers, ty, name);
            if prop.readonly {
                cs.setter = None;
            }
            cs.init = init;
            return Ok(CsMember::Property(cs));
        }

        let getter = match &prop.getter {
            Some(body) => {
                let inner = ctx.for_member(prop.is_static, false).with_function(&prop.name);
                let (lowered, inner) = self.stmts(body, inner)?;
                self.finish(&inner);
                Some(CsAccessor::Body(lowered))
            }
            None => None,
        };
        let setter = match &prop.setter {
            Some(setter) => {
                let inner = ctx
                    .for_member(prop.is_static, false)
                    .with_function(&prop.name)
                    .declare_as(&setter.param, "value");
                let (lowered, inner) = self.stmts(&setter.body, inner)?;
                self.finish(&inner);
                Some(CsAccessor::Body(lowered))
            }
            None => None,
        };
        Ok(CsMember::Property(CsProperty {
            modifiers,
            ty,
            name,
            getter,
            setter,
            init_only: false,
            init: None,
        }))
    }

    fn method(&mut self, method: &IrMethod, ctx: &EmitterContext) -> Result<Vec<CsMember>, Ice> {
        let function = &method.function;
        let mut modifiers = member_modifiers(method.visibility.keyword(), method.is_static, method.modifier);
        let inner = ctx
            .for_member(method.is_static, function.is_async)
            .with_type_params(function.type_params.iter().map(|p| p.name.clone()));
        if function.generator.is_some() {
            let (members, inner) = self.generator_members(function, modifiers, &inner)?;
            self.finish(&inner);
            return Ok(members);
        }
        if function.is_async && function.body.is_some() {
            modifiers.push("async");
        }
        Ok(vec![CsMember::Method(self.function_method(function, modifiers, inner)?)])
    }

    /// A non-generator function as a method.
    fn function_method(
        &mut self,
        function: &IrFunction,
        modifiers: Vec<&'static str>,
        ctx: EmitterContext,
    ) -> Result<CsMethod, Ice> {
        let ctx = ctx.with_function(&function.name);
        let type_params = self.type_params(&function.type_params, &ctx)?;
        let ret = self.cs_type(&function.ret, &ctx)?;
        let (params, body, ctx) = self.function_body(function, ctx)?;
        self.finish(&ctx);
        Ok(CsMethod {
            modifiers,
            ret,
            name: escape_identifier(&function.name),
            type_params,
            params,
            body,
        })
    }

    fn constructor(&mut self, ctor: &IrConstructor, class_name: &str, ctx: &EmitterContext) -> Result<CsMember, Ice> {
        let inner = ctx.for_member(false, false).with_function(class_name);
        let (params, prologue, inner) = self.params(&ctor.params, inner)?;
        let (base_args, inner) = match &ctor.base_args {
            Some(args) => {
                let (lowered, inner) = self.args(args, inner)?;
                (Some(lowered), inner)
            }
            None => (None, inner),
        };
        let (lowered, inner) = self.stmts(&ctor.body, inner)?;
        self.finish(&inner);
        let mut body = prologue;
        body.extend(lowered);
        Ok(CsMember::Constructor(CsConstructor {
            modifiers: vec![ctor.visibility.keyword()],
            name: class_name.to_string(),
            params,
            base_args,
            body,
        }))
    }

    fn interface_decl(&mut self, interface: &IrInterface) -> Result<CsTypeDecl, Ice> {
        tracing::trace!(interface = %interface.name, as_class = interface.as_class, "interface");
        let ctx = EmitterContext::new().with_type_params(interface.type_params.iter().map(|p| p.name.clone()));
        let name = escape_identifier(&interface.name);
        let type_params = self.type_params(&interface.type_params, &ctx)?;
        let mut bases = Vec::with_capacity(interface.extends.len());
        for base in &interface.extends {
            bases.push(self.cs_type(base, &ctx)?.non_nullable().clone());
        }

        let mut members = Vec::with_capacity(interface.members.len());
        for member in &interface.members {
            match member {
                IrInterfaceMember::Property {
                    name,
                    ty,
                    optional,
                    readonly,
                } => {
                    let ty = self.cs_type(ty, &ctx)?;
                    let ty = if *optional { ty.nullable() } else { ty };
                    let prop = if interface.as_class {
                        data_property(ty, name, *readonly)
                    } else {
                        let mut prop = CsProperty::auto(Vec::new(), ty, escape_identifier(name));
                        if *readonly {
                            prop.setter = None;
                        }
                        prop
                    };
                    members.push(CsMember::Property(prop));
                }
                IrInterfaceMember::Method {
                    name,
                    type_params,
                    params,
                    ret,
                } => {
                    let inner = ctx
                        .for_member(false, false)
                        .with_type_params(type_params.iter().map(|p| p.name.clone()));
                    let cs_type_params = self.type_params(type_params, &inner)?;
                    let ret = self.cs_type(ret, &inner)?;
                    let (params, _, inner) = self.params(params, inner)?;
                    self.finish(&inner);
                    members.push(CsMember::Method(CsMethod {
                        modifiers: Vec::new(),
                        ret,
                        name: escape_identifier(name),
                        type_params: cs_type_params,
                        params,
                        body: None,
                    }));
                }
            }
        }

        if interface.as_class {
            return Ok(CsTypeDecl::Class(CsClass {
                modifiers: vec!["public"],
                name,
                type_params,
                bases,
                members,
            }));
        }
        Ok(CsTypeDecl::Interface(CsInterface {
            modifiers: vec!["public"],
            name,
            type_params,
            bases,
            members,
        }))
    }

    fn enum_decl(&mut self, e: &IrEnum) -> CsTypeDecl {
        let name = escape_identifier(&e.name);
        if e.repr == EnumRepr::Numeric {
            let members = e
                .members
                .iter()
                .map(|m| {
                    let value = match &m.value {
                        EnumValue::Int(v) => Some(CsExpr::Literal(v.to_string())),
                        EnumValue::Str(_) => None,
                    };
                    (escape_identifier(&m.name), value)
                })
                .collect();
            return CsTypeDecl::Enum(CsEnum {
                modifiers: vec!["public"],
                name,
                members,
            });
        }
        // String enums erase to `string`; the members are its constants.
        let members = e
            .members
            .iter()
            .map(|m| {
                let value = match &m.value {
                    EnumValue::Str(s) => CsExpr::string(s),
                    EnumValue::Int(v) => CsExpr::string(&v.to_string()),
                };
                CsMember::Field(CsField {
                    modifiers: vec!["public", "const"],
                    ty: CsType::Keyword("string"),
                    name: escape_identifier(&m.name),
                    init: Some(value),
                })
            })
            .collect();
        CsTypeDecl::Class(CsClass {
            members,
            ..CsClass::new(vec!["public", "static"], name)
        })
    }

    fn module_function(&mut self, function: &IrFunction, exported: bool) -> Result<Vec<CsMember>, Ice> {
        let visibility = if exported { "public" } else { "internal" };
        let ctx = EmitterContext::new()
            .in_container()
            .for_member(true, function.is_async)
            .with_type_params(function.type_params.iter().map(|p| p.name.clone()));
        if function.generator.is_some() {
            let (members, ctx) = self.generator_members(function, vec![visibility, "static"], &ctx)?;
            self.finish(&ctx);
            return Ok(members);
        }
        let mut modifiers = vec![visibility, "static"];
        if function.is_async {
            modifiers.push("async");
        }
        Ok(vec![CsMember::Method(self.function_method(function, modifiers, ctx)?)])
    }

    fn module_variable(&mut self, variable: &IrVariable) -> Result<CsMember, Ice> {
        let ctx = EmitterContext::new()
            .in_container()
            .for_member(true, false)
            .with_function(&variable.name);
        let ty = self.cs_type(&variable.ty, &ctx)?;
        let init = match &variable.init {
            Some(init) => {
                let (lowered, ctx) = self.expr(init, ctx)?;
                self.finish(&ctx);
                Some(lowered)
            }
            None if needs_default(&ty) => Some(CsExpr::NullForgiving(Box::new(CsExpr::Default(None)))),
            None => None,
        };
        let mut modifiers = vec![if variable.exported { "public" } else { "internal" }, "static"];
        let name = escape_identifier(&variable.name);
        if let Some(CsExpr::Throw(thrown)) = init {
            return Ok(CsMember::Property(throwing_property(
                modifiers,
                ty,
                name,
                *thrown,
                !variable.is_const,
            )));
        }
        if variable.is_const {
            modifiers.push("readonly");
        }
        Ok(CsMember::Field(CsField { modifiers, ty, name, init }))
    }
}

/// A stubbed initializer moved into a getter, since C# rejects `throw` as
/// a field or auto-property initializer.
fn throwing_property(
    modifiers: Vec<&'static str>,
    ty: CsType,
    name: String,
    thrown: CsExpr,
    writable: bool,
) -> CsProperty {
    CsProperty {
        modifiers,
        ty,
        name,
        getter: Some(CsAccessor::Body(vec![CsStmt::Throw(Some(thrown))])),
        setter: writable.then(|| CsAccessor::Body(Vec::new())),
        init_only: false,
        init: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throwing_initializer_becomes_getter() {
        let thrown = CsExpr::new_object(CsType::named("global::System.NotSupportedException"), Vec::new());
        let prop = throwing_property(vec!["public", "static"], CsType::object(), "v".to_string(), thrown.clone(), false);
        assert_eq!(prop.getter, Some(CsAccessor::Body(vec![CsStmt::Throw(Some(thrown))])));
        assert_eq!(prop.setter, None);
        assert_eq!(prop.init, None);
    }

    #[test]
    fn test_member_modifier_order() {
        assert_eq!(
            member_modifiers("protected internal", true, OverrideModifier::New),
            vec!["protected internal", "static", "new"]
        );
        assert_eq!(member_modifiers("public", false, OverrideModifier::None), vec!["public"]);
    }
}
