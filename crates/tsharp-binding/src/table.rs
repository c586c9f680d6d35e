//! Declaration tables and module scopes.

use crate::handles::{DeclId, MemberId, ModuleId, SignatureId, TypeSyntaxId};
use crate::overload::Arity;
use std::collections::BTreeMap;
use tsharp_syntax::ast::*;
use tsharp_syntax::{Diagnostic, Diagnostics, Span, codes};

/// Names that resolve without an import.
const GLOBALS: &[&str] = &[
    "console", "Math", "Error", "Array", "Object", "String", "Number", "Boolean", "Promise",
    "JSON", "NaN", "Infinity",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Interface,
    TypeAlias,
    Enum,
    Function,
    Variable { mutable: bool },
    /// `import * as m from "./m"`
    Namespace(ModuleId),
    /// A type imported from a platform namespace, by qualified name.
    PlatformType { qualified: String },
    /// `import * as g from "@dotnet/System.Collections.Generic"`
    PlatformNamespace { namespace: String },
    /// Built-in global such as `console` or `Math`.
    Global,
    /// Placeholder for something that failed to resolve.
    Error,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclKind,
    /// Declaring module; `None` for globals and platform types.
    pub module: Option<ModuleId>,
    pub span: Span,
    pub exported: bool,
    pub signatures: Vec<SignatureId>,
    pub members: Vec<MemberId>,
    /// Variable annotation or alias body.
    pub type_syntax: Option<TypeSyntaxId>,
    /// Alias type parameters, in declaration order.
    pub type_params: Vec<String>,
}

impl Declaration {
    fn new(name: impl Into<String>, kind: DeclKind, module: Option<ModuleId>, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            module,
            span,
            exported: false,
            signatures: Vec::new(),
            members: Vec::new(),
            type_syntax: None,
            type_params: Vec::new(),
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Class
                | DeclKind::Interface
                | DeclKind::TypeAlias
                | DeclKind::Enum
                | DeclKind::PlatformType { .. }
        )
    }
}

/// A call signature as written.
#[derive(Debug, Clone)]
pub struct Signature {
    pub owner: DeclId,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub has_body: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

impl Arity for Signature {
    fn min_args(&self) -> usize {
        self.params
            .iter()
            .filter(|p| !p.optional && !p.rest && p.default.is_none())
            .count()
    }

    fn max_args(&self) -> Option<usize> {
        if self.params.iter().any(|p| p.rest) {
            None
        } else {
            Some(self.params.len())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
    Accessor,
    Constructor,
}

#[derive(Debug, Clone)]
pub struct Member {
    pub owner: DeclId,
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub signatures: Vec<SignatureId>,
    pub span: Span,
}

/// Names visible at the top level of one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleScope {
    pub path: String,
    pub values: BTreeMap<String, DeclId>,
    pub types: BTreeMap<String, DeclId>,
    pub export_values: BTreeMap<String, DeclId>,
    pub export_types: BTreeMap<String, DeclId>,
}

/// Result of name binding over a whole program.
#[derive(Debug, Default)]
pub struct Bindings {
    modules: Vec<ModuleScope>,
    decls: Vec<Declaration>,
    signatures: Vec<Signature>,
    members: Vec<Member>,
    type_syntax: Vec<TypeNode>,
    globals: BTreeMap<String, DeclId>,
    diagnostics: Diagnostics,
}

impl Bindings {
    /// Bind every module. `platform_prefix` marks platform namespace imports
    /// (e.g. `@dotnet/`).
    pub fn build(modules: &[SourceModule], platform_prefix: &str) -> Self {
        let mut bindings = Bindings::default();

        for name in GLOBALS {
            let id = bindings.alloc_decl(Declaration::new(*name, DeclKind::Global, None, Span::default()));
            bindings.globals.insert(name.to_string(), id);
        }

        for (index, module) in modules.iter().enumerate() {
            bindings.modules.push(ModuleScope {
                path: module.path.clone(),
                ..Default::default()
            });
            bindings.declare_module(ModuleId::new(index), module);
        }

        // Imports see every module's local exports.
        for (index, module) in modules.iter().enumerate() {
            bindings.resolve_imports(ModuleId::new(index), module, platform_prefix);
        }

        // `export { x }` may re-export an import.
        for (index, module) in modules.iter().enumerate() {
            bindings.resolve_named_exports(ModuleId::new(index), module);
        }

        tracing::debug!(
            modules = bindings.modules.len(),
            declarations = bindings.decls.len(),
            signatures = bindings.signatures.len(),
            "bound program"
        );
        bindings
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn signature(&self, id: SignatureId) -> &Signature {
        &self.signatures[id.index()]
    }

    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.index()]
    }

    pub fn type_syntax(&self, id: TypeSyntaxId) -> &TypeNode {
        &self.type_syntax[id.index()]
    }

    pub fn module(&self, id: ModuleId) -> &ModuleScope {
        &self.modules[id.index()]
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module_by_path(&self, path: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| m.path == path)
            .map(ModuleId::new)
    }

    /// Signatures of a declaration, in declaration order.
    pub fn signatures_of(&self, id: DeclId) -> Vec<&Signature> {
        self.decl(id)
            .signatures
            .iter()
            .map(|s| self.signature(*s))
            .collect()
    }

    /// Look up a value name at module level, then among globals.
    pub fn lookup_value(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        self.module(module)
            .values
            .get(name)
            .or_else(|| self.globals.get(name))
            .copied()
    }

    /// Look up a type name at module level.
    pub fn lookup_type(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        self.module(module).types.get(name).copied()
    }

    /// Resolve a possibly dotted type name (`ns.Name`).
    pub fn lookup_qualified_type(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        let Some((head, rest)) = name.split_once('.') else {
            return self.lookup_type(module, name);
        };
        let head_id = self.lookup_value(module, head)?;
        match &self.decl(head_id).kind {
            DeclKind::Namespace(target) => self.lookup_export_type(*target, rest),
            _ => None,
        }
    }

    pub fn lookup_export_value(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        self.module(module).export_values.get(name).copied()
    }

    pub fn lookup_export_type(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        self.module(module).export_types.get(name).copied()
    }

    /// Members of a class or interface declaration.
    pub fn members_of(&self, id: DeclId) -> impl Iterator<Item = &Member> {
        self.decl(id).members.iter().map(|m| self.member(*m))
    }

    /// Diagnostics produced while binding.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    // ========================================================================
    // Declaration pass
    // ========================================================================

    fn alloc_decl(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId::new(self.decls.len());
        self.decls.push(decl);
        id
    }

    fn alloc_signature(&mut self, signature: Signature) -> SignatureId {
        let id = SignatureId::new(self.signatures.len());
        self.signatures.push(signature);
        id
    }

    fn alloc_member(&mut self, member: Member) -> MemberId {
        let id = MemberId::new(self.members.len());
        self.members.push(member);
        id
    }

    fn alloc_type_syntax(&mut self, node: TypeNode) -> TypeSyntaxId {
        let id = TypeSyntaxId::new(self.type_syntax.len());
        self.type_syntax.push(node);
        id
    }

    fn scope_mut(&mut self, module: ModuleId) -> &mut ModuleScope {
        &mut self.modules[module.index()]
    }

    fn declare_module(&mut self, module_id: ModuleId, module: &SourceModule) {
        for stmt in &module.body {
            match &stmt.kind {
                StmtKind::Function(func) => self.declare_function(module_id, func),
                StmtKind::Var(var) => {
                    for declarator in &var.declarators {
                        for name in declarator.pattern.bound_names() {
                            let mut decl = Declaration::new(
                                name,
                                DeclKind::Variable {
                                    mutable: var.kind != VarKind::Const,
                                },
                                Some(module_id),
                                declarator.span,
                            );
                            decl.exported = var.exported;
                            if let (Some(ty), Pattern::Ident { .. }) =
                                (&declarator.ty, &declarator.pattern)
                            {
                                decl.type_syntax = Some(self.alloc_type_syntax(ty.clone()));
                            }
                            self.insert_value(module_id, decl);
                        }
                    }
                }
                StmtKind::Class(class) => self.declare_class(module_id, class),
                StmtKind::Interface(iface) => self.declare_interface(module_id, iface),
                StmtKind::TypeAlias(alias) => {
                    let mut decl =
                        Declaration::new(&alias.name, DeclKind::TypeAlias, Some(module_id), alias.span);
                    decl.exported = alias.exported;
                    decl.type_syntax = Some(self.alloc_type_syntax(alias.ty.clone()));
                    decl.type_params = alias.type_params.iter().map(|p| p.name.clone()).collect();
                    self.insert_type(module_id, decl);
                }
                StmtKind::Enum(decl) => {
                    let mut entry =
                        Declaration::new(&decl.name, DeclKind::Enum, Some(module_id), decl.span);
                    entry.exported = decl.exported;
                    let id = self.insert_type(module_id, entry);
                    self.bind_value(module_id, &decl.name, id, decl.exported);
                }
                _ => {}
            }
        }
    }

    fn declare_function(&mut self, module_id: ModuleId, func: &FunctionDecl) {
        // Overloads share one declaration.
        let id = match self.module(module_id).values.get(&func.name).copied() {
            Some(existing) if self.decl(existing).kind == DeclKind::Function => existing,
            _ => {
                let mut decl =
                    Declaration::new(&func.name, DeclKind::Function, Some(module_id), func.span);
                decl.exported = func.exported;
                self.insert_value(module_id, decl)
            }
        };
        let signature = self.alloc_signature(Signature {
            owner: id,
            type_params: func.type_params.clone(),
            params: func.params.clone(),
            return_type: func.return_type.clone(),
            has_body: func.body.is_some(),
            is_async: func.is_async,
            is_generator: func.is_generator,
            span: func.span,
        });
        self.decls[id.index()].signatures.push(signature);
    }

    fn declare_class(&mut self, module_id: ModuleId, class: &ClassDecl) {
        let mut decl = Declaration::new(&class.name, DeclKind::Class, Some(module_id), class.span);
        decl.exported = class.exported;
        let id = self.insert_type(module_id, decl);
        self.bind_value(module_id, &class.name, id, class.exported);

        for member in &class.members {
            let is_static = member.modifiers.is_static;
            match &member.kind {
                ClassMemberKind::Property { name, .. } => {
                    self.add_member(id, name, MemberKind::Property, is_static, Vec::new(), member.span);
                }
                ClassMemberKind::Constructor { params, body } => {
                    // Parameter properties are members too.
                    for param in params.iter().filter(|p| p.is_parameter_property()) {
                        if let Some(name) = param.name() {
                            self.add_member(id, name, MemberKind::Property, false, Vec::new(), param.span);
                        }
                    }
                    let signature = self.alloc_signature(Signature {
                        owner: id,
                        type_params: Vec::new(),
                        params: params.clone(),
                        return_type: None,
                        has_body: body.is_some(),
                        is_async: false,
                        is_generator: false,
                        span: member.span,
                    });
                    self.add_member(id, "constructor", MemberKind::Constructor, false, vec![signature], member.span);
                }
                ClassMemberKind::Method {
                    name,
                    kind,
                    type_params,
                    params,
                    return_type,
                    body,
                    is_generator,
                } => {
                    if *kind != MethodKind::Method {
                        if !self.members_of(id).any(|m| m.name == *name && m.kind == MemberKind::Accessor) {
                            self.add_member(id, name, MemberKind::Accessor, is_static, Vec::new(), member.span);
                        }
                        continue;
                    }
                    let signature = self.alloc_signature(Signature {
                        owner: id,
                        type_params: type_params.clone(),
                        params: params.clone(),
                        return_type: return_type.clone(),
                        has_body: body.is_some(),
                        is_async: member.modifiers.is_async,
                        is_generator: *is_generator,
                        span: member.span,
                    });
                    let existing = self.decl(id).members.iter().copied().find(|m| {
                        let m = self.member(*m);
                        m.name == *name && m.kind == MemberKind::Method && m.is_static == is_static
                    });
                    match existing {
                        Some(member_id) => self.members[member_id.index()].signatures.push(signature),
                        None => {
                            self.add_member(id, name, MemberKind::Method, is_static, vec![signature], member.span);
                        }
                    }
                }
                ClassMemberKind::Unsupported(_) => {}
            }
        }
    }

    fn declare_interface(&mut self, module_id: ModuleId, iface: &InterfaceDecl) {
        // Declaration merging: a second `interface X` adds members.
        let id = match self.module(module_id).types.get(&iface.name).copied() {
            Some(existing) if self.decl(existing).kind == DeclKind::Interface => existing,
            _ => {
                let mut decl =
                    Declaration::new(&iface.name, DeclKind::Interface, Some(module_id), iface.span);
                decl.exported = iface.exported;
                self.insert_type(module_id, decl)
            }
        };
        for member in &iface.members {
            match &member.kind {
                TypeMemberKind::Property { name, .. } => {
                    self.add_member(id, name, MemberKind::Property, false, Vec::new(), member.span);
                }
                TypeMemberKind::Method {
                    name,
                    type_params,
                    params,
                    return_type,
                    ..
                } => {
                    let signature = self.alloc_signature(Signature {
                        owner: id,
                        type_params: type_params.clone(),
                        params: params.clone(),
                        return_type: return_type.clone(),
                        has_body: false,
                        is_async: false,
                        is_generator: false,
                        span: member.span,
                    });
                    self.add_member(id, name, MemberKind::Method, false, vec![signature], member.span);
                }
                _ => {}
            }
        }
    }

    fn add_member(
        &mut self,
        owner: DeclId,
        name: &str,
        kind: MemberKind,
        is_static: bool,
        signatures: Vec<SignatureId>,
        span: Span,
    ) {
        let id = self.alloc_member(Member {
            owner,
            name: name.to_string(),
            kind,
            is_static,
            signatures,
            span,
        });
        self.decls[owner.index()].members.push(id);
    }

    fn insert_value(&mut self, module_id: ModuleId, decl: Declaration) -> DeclId {
        let name = decl.name.clone();
        let exported = decl.exported;
        let id = self.alloc_decl(decl);
        tracing::trace!(module = %module_id, name = %name, decl = %id, "declare value");
        self.bind_value(module_id, &name, id, exported);
        id
    }

    fn insert_type(&mut self, module_id: ModuleId, decl: Declaration) -> DeclId {
        let name = decl.name.clone();
        let exported = decl.exported;
        let id = self.alloc_decl(decl);
        tracing::trace!(module = %module_id, name = %name, decl = %id, "declare type");
        let scope = self.scope_mut(module_id);
        scope.types.insert(name.clone(), id);
        if exported {
            scope.export_types.insert(name, id);
        }
        id
    }

    fn bind_value(&mut self, module_id: ModuleId, name: &str, id: DeclId, exported: bool) {
        let scope = self.scope_mut(module_id);
        scope.values.insert(name.to_string(), id);
        if exported {
            scope.export_values.insert(name.to_string(), id);
        }
    }

    // ========================================================================
    // Import pass
    // ========================================================================

    fn resolve_imports(&mut self, module_id: ModuleId, module: &SourceModule, platform_prefix: &str) {
        for stmt in &module.body {
            let StmtKind::Import(import) = &stmt.kind else {
                continue;
            };

            if let Some(namespace) = import.source.strip_prefix(platform_prefix) {
                self.bind_platform_import(module_id, import, namespace, stmt.span);
                continue;
            }

            let target = resolve_module_specifier(&module.path, &import.source)
                .and_then(|stem| self.module_by_stem(&stem));
            let Some(target) = target else {
                self.diagnostics.push(
                    Diagnostic::error(
                        codes::UNRESOLVED_IMPORT,
                        format!("cannot find module '{}'", import.source),
                    )
                    .at(&module.path, stmt.span),
                );
                for spec in &import.specifiers {
                    self.bind_error(module_id, spec.local(), stmt.span);
                }
                continue;
            };

            for spec in &import.specifiers {
                match spec {
                    ImportSpecifier::Namespace { local } => {
                        let id = self.alloc_decl(Declaration::new(
                            local,
                            DeclKind::Namespace(target),
                            Some(module_id),
                            stmt.span,
                        ));
                        self.bind_value(module_id, local, id, false);
                    }
                    ImportSpecifier::Named { imported, local } => {
                        let value = self.lookup_export_value(target, imported);
                        let ty = self.lookup_export_type(target, imported);
                        if value.is_none() && ty.is_none() {
                            self.diagnostics.push(
                                Diagnostic::error(
                                    codes::UNRESOLVED_IMPORT,
                                    format!(
                                        "module '{}' has no exported member '{}'",
                                        import.source, imported
                                    ),
                                )
                                .at(&module.path, stmt.span),
                            );
                            self.bind_error(module_id, local, stmt.span);
                            continue;
                        }
                        let scope = self.scope_mut(module_id);
                        if let (Some(value), false) = (value, import.type_only) {
                            scope.values.insert(local.clone(), value);
                        }
                        if let Some(ty) = ty {
                            scope.types.insert(local.clone(), ty);
                        }
                    }
                    ImportSpecifier::Default { local } => {
                        self.diagnostics.push(
                            Diagnostic::error(
                                codes::UNRESOLVED_IMPORT,
                                format!("default import '{}' is not supported", local),
                            )
                            .at(&module.path, stmt.span)
                            .with_hint("use a named import"),
                        );
                        self.bind_error(module_id, local, stmt.span);
                    }
                }
            }
        }
    }

    fn bind_platform_import(&mut self, module_id: ModuleId, import: &ImportDecl, namespace: &str, span: Span) {
        for spec in &import.specifiers {
            match spec {
                ImportSpecifier::Named { imported, local } => {
                    let decl = Declaration::new(
                        local,
                        DeclKind::PlatformType {
                            qualified: format!("{}.{}", namespace, imported),
                        },
                        Some(module_id),
                        span,
                    );
                    let id = self.alloc_decl(decl);
                    let scope = self.scope_mut(module_id);
                    scope.types.insert(local.clone(), id);
                    scope.values.insert(local.clone(), id);
                }
                ImportSpecifier::Namespace { local } | ImportSpecifier::Default { local } => {
                    let id = self.alloc_decl(Declaration::new(
                        local,
                        DeclKind::PlatformNamespace {
                            namespace: namespace.to_string(),
                        },
                        Some(module_id),
                        span,
                    ));
                    self.bind_value(module_id, local, id, false);
                }
            }
        }
    }

    fn bind_error(&mut self, module_id: ModuleId, local: &str, span: Span) {
        let id = self.alloc_decl(Declaration::new(local, DeclKind::Error, Some(module_id), span));
        let scope = self.scope_mut(module_id);
        scope.values.insert(local.to_string(), id);
        scope.types.insert(local.to_string(), id);
    }

    fn resolve_named_exports(&mut self, module_id: ModuleId, module: &SourceModule) {
        for stmt in &module.body {
            let StmtKind::ExportNamed(specifiers) = &stmt.kind else {
                continue;
            };
            for spec in specifiers {
                let value = self.module(module_id).values.get(&spec.local).copied();
                let ty = self.module(module_id).types.get(&spec.local).copied();
                if value.is_none() && ty.is_none() {
                    self.diagnostics.push(
                        Diagnostic::error(
                            codes::UNRESOLVED_IDENTIFIER,
                            format!("cannot export unknown name '{}'", spec.local),
                        )
                        .at(&module.path, stmt.span),
                    );
                    continue;
                }
                for id in [value, ty].into_iter().flatten() {
                    if self.decl(id).module == Some(module_id) {
                        self.decls[id.index()].exported = true;
                    }
                }
                let scope = self.scope_mut(module_id);
                if let Some(value) = value {
                    scope.export_values.insert(spec.exported.clone(), value);
                }
                if let Some(ty) = ty {
                    scope.export_types.insert(spec.exported.clone(), ty);
                }
            }
        }
    }

    fn module_by_stem(&self, stem: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|m| {
                let path = m.path.as_str();
                let own_stem = path.rsplit_once('.').map(|(s, _)| s).unwrap_or(path);
                own_stem == stem || own_stem == format!("{}/index", stem)
            })
            .map(ModuleId::new)
    }
}

/// Resolve a relative specifier against the importing module's path.
///
/// Returns the target's path without extension, or `None` for non-relative
/// specifiers and paths that climb above the source root.
pub fn resolve_module_specifier(from: &str, specifier: &str) -> Option<String> {
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return None;
    }
    let mut parts: Vec<&str> = from.split('/').collect();
    parts.pop();
    for segment in specifier.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    let stem = [".ts", ".js", ".mts"]
        .iter()
        .find_map(|ext| joined.strip_suffix(ext))
        .unwrap_or(&joined);
    Some(stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overload::{OverloadSelection, select_by_arity};
    use tsharp_syntax::read_typescript;

    fn bind(files: &[(&str, &str)]) -> Bindings {
        let modules: Vec<SourceModule> = files
            .iter()
            .map(|(path, code)| read_typescript(path, code).unwrap())
            .collect();
        Bindings::build(&modules, "@dotnet/")
    }

    #[test]
    fn test_resolve_module_specifier() {
        assert_eq!(
            resolve_module_specifier("models/user.ts", "./address").as_deref(),
            Some("models/address")
        );
        assert_eq!(
            resolve_module_specifier("models/user.ts", "../util/strings.js").as_deref(),
            Some("util/strings")
        );
        assert_eq!(resolve_module_specifier("main.ts", "../outside"), None);
        assert_eq!(resolve_module_specifier("main.ts", "lodash"), None);
    }

    #[test]
    fn test_relative_import_binds_export() {
        let bindings = bind(&[
            ("models/user.ts", "export class User {}"),
            ("main.ts", "import { User } from './models/user';\nconst u = new User();"),
        ]);
        let main = bindings.module_by_path("main.ts").unwrap();
        let user = bindings.lookup_type(main, "User").unwrap();
        assert_eq!(bindings.decl(user).kind, DeclKind::Class);
        assert_eq!(bindings.lookup_value(main, "User"), Some(user));
        assert!(bindings.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_import_is_diagnosed_and_bound_to_error() {
        let bindings = bind(&[("main.ts", "import { Nope } from './missing';")]);
        assert!(bindings.diagnostics().contains_code(codes::UNRESOLVED_IMPORT));
        let main = ModuleId::new(0);
        let id = bindings.lookup_value(main, "Nope").unwrap();
        assert_eq!(bindings.decl(id).kind, DeclKind::Error);
    }

    #[test]
    fn test_platform_import() {
        let bindings = bind(&[(
            "main.ts",
            "import { List } from '@dotnet/System.Collections.Generic';",
        )]);
        let id = bindings.lookup_type(ModuleId::new(0), "List").unwrap();
        assert_eq!(
            bindings.decl(id).kind,
            DeclKind::PlatformType {
                qualified: "System.Collections.Generic.List".into()
            }
        );
    }

    #[test]
    fn test_overloads_share_declaration() {
        let bindings = bind(&[(
            "main.ts",
            r#"
            function f(a: int): int;
            function f(a: int, b: int): int;
            function f(a: int, b?: int): int { return a; }
            "#,
        )]);
        let id = bindings.lookup_value(ModuleId::new(0), "f").unwrap();
        let sigs: Vec<Signature> = bindings.signatures_of(id).into_iter().cloned().collect();
        assert_eq!(sigs.len(), 3);
        assert_eq!(select_by_arity(&sigs[..2], 2), OverloadSelection::Unique(1));
    }

    #[test]
    fn test_namespace_import_and_qualified_type() {
        let bindings = bind(&[
            ("shapes.ts", "export interface Point { x: number }"),
            ("main.ts", "import * as shapes from './shapes';"),
        ]);
        let main = ModuleId::new(1);
        let point = bindings.lookup_qualified_type(main, "shapes.Point").unwrap();
        assert_eq!(bindings.decl(point).name, "Point");
    }

    #[test]
    fn test_class_members_recorded() {
        let bindings = bind(&[(
            "main.ts",
            r#"
            class A {
                constructor(private readonly id: int) {}
                get label(): string { return ""; }
                set label(v: string) {}
                run(): void {}
                static make(): A { return new A(1); }
            }
            "#,
        )]);
        let a = bindings.lookup_type(ModuleId::new(0), "A").unwrap();
        let names: Vec<(&str, MemberKind)> = bindings
            .members_of(a)
            .map(|m| (m.name.as_str(), m.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("id", MemberKind::Property),
                ("constructor", MemberKind::Constructor),
                ("label", MemberKind::Accessor),
                ("run", MemberKind::Method),
                ("make", MemberKind::Method),
            ]
        );
    }

    #[test]
    fn test_globals_resolve() {
        let bindings = bind(&[("main.ts", "console.log(1);")]);
        let id = bindings.lookup_value(ModuleId::new(0), "console").unwrap();
        assert_eq!(bindings.decl(id).kind, DeclKind::Global);
    }
}
