//! Pass A: register every source nominal type by name.
//!
//! Skeletons carry identity, kind and type parameter names only, so that
//! Pass B can resolve any reference between source types in any order.

use crate::entry::{EnumRepr, NominalEntry, NominalKind, Origin, TypeParamEntry};
use crate::naming::{module_namespace, source_platform_name};
use crate::type_id::TypeId;
use crate::universe::Universe;
use tsharp_binding::{Bindings, DeclId, ModuleId};
use tsharp_syntax::ast::{ExprKind, SourceModule, StmtKind, TypeKind, TypeParam};

pub(crate) fn register_source_types(
    universe: &mut Universe,
    modules: &[SourceModule],
    bindings: &Bindings,
) {
    let mut registered = 0usize;
    for (index, module) in modules.iter().enumerate() {
        let module_id = ModuleId::new(index);
        let namespace = module_namespace(universe.root_namespace(), &module.path);
        for stmt in &module.body {
            let (name, kind, type_params, is_abstract, enum_repr) = match &stmt.kind {
                StmtKind::Class(class) => (
                    &class.name,
                    NominalKind::Class,
                    class.type_params.as_slice(),
                    class.is_abstract,
                    None,
                ),
                StmtKind::Interface(iface) => (
                    &iface.name,
                    NominalKind::Interface,
                    iface.type_params.as_slice(),
                    false,
                    None,
                ),
                StmtKind::Enum(decl) => {
                    let is_string = decl
                        .members
                        .iter()
                        .any(|m| matches!(m.init.as_ref().map(|e| &e.kind), Some(ExprKind::String(_))));
                    let repr = if is_string { EnumRepr::String } else { EnumRepr::Numeric };
                    (&decl.name, NominalKind::Enum, &[][..], false, Some(repr))
                }
                // Object-literal aliases become nominal; others stay transparent.
                StmtKind::TypeAlias(alias) if matches!(alias.ty.kind, TypeKind::Object(_)) => (
                    &alias.name,
                    NominalKind::Interface,
                    alias.type_params.as_slice(),
                    false,
                    None,
                ),
                _ => continue,
            };

            let Some(decl) = local_type_decl(bindings, module_id, name) else {
                continue;
            };
            if universe.source_type(decl).is_some() {
                // Merged interface declaration.
                continue;
            }

            let id = TypeId::new(
                name.as_str(),
                source_platform_name(&namespace, name, type_params.len()),
            );
            let mut entry = NominalEntry::skeleton(id, kind, Origin::Source { module: module_id, decl });
            entry.type_params = type_param_names(type_params);
            entry.is_abstract = is_abstract;
            entry.enum_repr = enum_repr;
            if universe.register_source(decl, entry).is_some() {
                registered += 1;
            } else {
                tracing::trace!(%name, "source type collides with an existing type");
            }
        }
    }
    tracing::debug!(registered, "registered source type skeletons");
}

fn local_type_decl(bindings: &Bindings, module: ModuleId, name: &str) -> Option<DeclId> {
    let decl = bindings.lookup_type(module, name)?;
    (bindings.decl(decl).module == Some(module)).then_some(decl)
}

fn type_param_names(params: &[TypeParam]) -> Vec<TypeParamEntry> {
    params
        .iter()
        .map(|p| TypeParamEntry {
            name: p.name.clone(),
            constraint: None,
        })
        .collect()
}
