//! The deterministic type binder.
//!
//! [`IrBuilder`] walks every module's syntax tree and produces typed
//! [`IrModule`]s. Bindings are consulted only to learn which declaration a
//! name refers to; every type comes from the catalog or from the closed
//! typing rules in [`infer`].
//!
//! Module-level variable types and unannotated function results are computed
//! in a pre-pass so that later modules and earlier call sites see them.

mod call;
mod class;
mod expr;
mod infer;
mod stmt;

use crate::error::Ice;
use crate::ir::*;
use std::collections::{HashMap, HashSet};
use tsharp_binding::{Bindings, DeclId, DeclKind, ModuleId, ScopeStack};
use tsharp_catalog::{
    IrType, SignatureEntry, TypeConverter, TypeId, Universe, module_container_name,
    module_namespace,
};
use tsharp_syntax::ast::{
    FunctionDecl, Param, SourceModule, Stmt, StmtKind, TypeNode, TypeParam,
};
use tsharp_syntax::{Diagnostic, Diagnostics, Span, codes};

/// File name whose top-level statements become the program entry point.
const ENTRY_MODULE: &str = "main.ts";

/// Build the IR for every module of a compilation.
pub fn build_program(
    modules: &[SourceModule],
    bindings: &Bindings,
    universe: &Universe,
    diags: &mut Diagnostics,
) -> Result<Vec<IrModule>, Ice> {
    IrBuilder::new(modules, bindings, universe).build(diags)
}

pub struct IrBuilder<'a> {
    modules: &'a [SourceModule],
    bindings: &'a Bindings,
    universe: &'a Universe,
}

#[derive(Debug, Clone)]
pub(crate) struct ModuleInfo {
    pub namespace: String,
    pub container: String,
}

/// Facts about module-level declarations gathered before bodies are built.
#[derive(Debug, Default)]
pub(crate) struct ProgramInfo {
    pub modules: Vec<ModuleInfo>,
    pub variables: HashMap<DeclId, IrType>,
    pub returns: HashMap<DeclId, IrType>,
}

impl<'a> IrBuilder<'a> {
    pub fn new(modules: &'a [SourceModule], bindings: &'a Bindings, universe: &'a Universe) -> Self {
        Self {
            modules,
            bindings,
            universe,
        }
    }

    pub fn build(&self, diags: &mut Diagnostics) -> Result<Vec<IrModule>, Ice> {
        if self.bindings.module_count() < self.modules.len() {
            return Err(Ice::MissingModule {
                index: self.bindings.module_count(),
            });
        }
        let mut program = ProgramInfo {
            modules: self
                .modules
                .iter()
                .map(|m| ModuleInfo {
                    namespace: module_namespace(self.universe.root_namespace(), &m.path),
                    container: module_container_name(&m.path),
                })
                .collect(),
            ..Default::default()
        };
        self.collect_module_types(&mut program);

        let mut out = Vec::with_capacity(self.modules.len());
        for (index, module) in self.modules.iter().enumerate() {
            let ir = self.build_module(ModuleId::new(index), module, &program, diags)?;
            tracing::trace!(path = %module.path, declarations = ir.declarations.len(), "built module");
            out.push(ir);
        }
        tracing::debug!(
            modules = out.len(),
            variables = program.variables.len(),
            inferred_returns = program.returns.len(),
            "built IR"
        );
        Ok(out)
    }

    fn body_builder<'p>(&self, module: ModuleId, program: &'p ProgramInfo) -> BodyBuilder<'p>
    where
        'a: 'p,
    {
        BodyBuilder::new(self.universe, self.bindings, program, module)
    }

    /// Pre-pass: module variable types and inferred function results, in
    /// module order. Diagnostics from this pass are discarded; the real
    /// pass reports them.
    fn collect_module_types(&self, program: &mut ProgramInfo) {
        for (index, module) in self.modules.iter().enumerate() {
            let module_id = ModuleId::new(index);
            for stmt in &module.body {
                match &stmt.kind {
                    StmtKind::Var(var) => {
                        for declarator in &var.declarators {
                            let Some(name) = declarator.pattern.as_ident() else {
                                continue;
                            };
                            let Some(decl) = self.local_value(module_id, name) else {
                                continue;
                            };
                            let ty = {
                                let mut body = self.body_builder(module_id, program);
                                body.declared_variable_type(declarator.ty.as_ref(), declarator.init.as_ref())
                            };
                            program.variables.insert(decl, ty);
                        }
                    }
                    StmtKind::Function(function) if function.return_type.is_none() => {
                        let Some(body_stmts) = &function.body else {
                            continue;
                        };
                        let Some(decl) = self.local_value(module_id, &function.name) else {
                            continue;
                        };
                        let ret = {
                            let mut body = self.body_builder(module_id, program);
                            let spec = FunctionSpec::from_decl(function, body_stmts, None);
                            body.function(&spec).ret
                        };
                        program.returns.insert(decl, ret);
                    }
                    _ => {}
                }
            }
        }
    }

    fn local_value(&self, module: ModuleId, name: &str) -> Option<DeclId> {
        let decl = self.bindings.lookup_value(module, name)?;
        (self.bindings.decl(decl).module == Some(module)).then_some(decl)
    }

    fn build_module(
        &self,
        module_id: ModuleId,
        module: &SourceModule,
        program: &ProgramInfo,
        diags: &mut Diagnostics,
    ) -> Result<IrModule, Ice> {
        let info = program
            .modules
            .get(module_id.index())
            .ok_or(Ice::MissingModule {
                index: module_id.index(),
            })?;
        let mut body = self.body_builder(module_id, program);
        let mut declarations = Vec::new();
        let mut top_level = Vec::new();
        let mut emitted_types: HashSet<TypeId> = HashSet::new();

        for stmt in &module.body {
            match &stmt.kind {
                StmtKind::Class(class) => {
                    declarations.push(IrDeclaration::Class(body.class(class)?));
                }
                StmtKind::Interface(iface) => {
                    let ir = body.interface(&iface.name, iface.span)?;
                    if emitted_types.insert(ir.id.clone()) {
                        declarations.push(IrDeclaration::Interface(ir));
                    }
                }
                StmtKind::TypeAlias(alias) => {
                    let decl = body.type_decl(&alias.name)?;
                    if body.universe.source_type(decl).is_some() {
                        let ir = body.interface(&alias.name, alias.span)?;
                        if emitted_types.insert(ir.id.clone()) {
                            declarations.push(IrDeclaration::Interface(ir));
                        }
                    }
                }
                StmtKind::Enum(decl) => {
                    declarations.push(IrDeclaration::Enum(body.enum_decl(decl)?));
                }
                StmtKind::Function(function) => {
                    // Overload signatures have no body and emit nothing.
                    let Some(stmts) = &function.body else {
                        continue;
                    };
                    let decl = self.local_value(module_id, &function.name).ok_or_else(|| {
                        Ice::UnboundDeclaration {
                            name: function.name.clone(),
                            module: module.path.clone(),
                        }
                    })?;
                    let fallback = program.returns.get(&decl).cloned();
                    let spec = FunctionSpec::from_decl(function, stmts, fallback);
                    declarations.push(IrDeclaration::Function {
                        function: body.function(&spec),
                        exported: function.exported,
                    });
                }
                StmtKind::Var(var) => {
                    for declarator in &var.declarators {
                        let Some(name) = declarator.pattern.as_ident() else {
                            body.error(
                                codes::UNSUPPORTED_STATEMENT,
                                declarator.span,
                                "destructuring is not supported at module level".to_string(),
                            );
                            continue;
                        };
                        let decl = self.local_value(module_id, name);
                        let ty = decl
                            .and_then(|d| program.variables.get(&d).cloned())
                            .unwrap_or(IrType::Unknown);
                        let init = declarator.init.as_ref().map(|e| body.expr(e, Some(&ty)));
                        declarations.push(IrDeclaration::Variable(IrVariable {
                            name: name.to_string(),
                            ty,
                            init,
                            is_const: var.kind == tsharp_syntax::ast::VarKind::Const,
                            exported: var.exported,
                        }));
                    }
                }
                StmtKind::Import(_) | StmtKind::ExportNamed(_) | StmtKind::Empty => {}
                _ => top_level.extend(body.top_level_stmt(stmt)),
            }
        }

        let top_level_async = body.saw_top_level_await;
        diags.extend(body.finish());
        Ok(IrModule {
            path: module.path.clone(),
            namespace: info.namespace.clone(),
            container: info.container.clone(),
            declarations,
            top_level,
            is_entry: module.path == ENTRY_MODULE,
            top_level_async,
        })
    }
}

// ============================================================================
// Body builder
// ============================================================================

/// Per-function state: what `return` expects and what `yield` collects.
#[derive(Debug, Clone, Default)]
pub(crate) struct FunctionFrame {
    /// `None` when the result type is inferred from the body.
    pub return_expected: Option<IrType>,
    pub returns: Vec<IrType>,
    pub generator: Option<GeneratorFrame>,
}

#[derive(Debug, Clone)]
pub(crate) struct GeneratorFrame {
    pub yield_expected: Option<IrType>,
    pub next_ty: IrType,
    pub yields: Vec<IrType>,
    /// Depth of enclosing regions an iterator cannot suspend in: a `try`
    /// block with a `catch` clause, a `catch` body or a `finally` body.
    pub guarded: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct ClassFrame {
    pub id: TypeId,
    pub self_ty: IrType,
    pub base: Option<IrType>,
    pub is_static: bool,
}

/// Everything needed to build one function-like body.
pub(crate) struct FunctionSpec<'s> {
    pub name: &'s str,
    pub type_params: &'s [TypeParam],
    pub params: &'s [Param],
    pub return_type: Option<&'s TypeNode>,
    pub body: Option<&'s [Stmt]>,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
    /// Catalog signature that fixes parameter and result types.
    pub signature: Option<&'s SignatureEntry>,
    /// Result type to use when the source has no annotation.
    pub fallback_ret: Option<IrType>,
}

impl<'s> FunctionSpec<'s> {
    pub fn from_decl(decl: &'s FunctionDecl, body: &'s [Stmt], fallback_ret: Option<IrType>) -> Self {
        Self {
            name: &decl.name,
            type_params: &decl.type_params,
            params: &decl.params,
            return_type: decl.return_type.as_ref(),
            body: Some(body),
            is_async: decl.is_async,
            is_generator: decl.is_generator,
            span: decl.span,
            signature: None,
            fallback_ret,
        }
    }
}

pub(crate) struct BodyBuilder<'a> {
    pub universe: &'a Universe,
    pub bindings: &'a Bindings,
    pub program: &'a ProgramInfo,
    pub module: ModuleId,
    pub file: &'a str,
    pub types: TypeConverter<'a>,
    pub locals: ScopeStack<IrType>,
    pub frames: Vec<FunctionFrame>,
    pub class: Option<ClassFrame>,
    pub diags: Diagnostics,
    pub saw_top_level_await: bool,
}

impl<'a> BodyBuilder<'a> {
    pub fn new(
        universe: &'a Universe,
        bindings: &'a Bindings,
        program: &'a ProgramInfo,
        module: ModuleId,
    ) -> Self {
        Self {
            universe,
            bindings,
            program,
            module,
            file: &bindings.module(module).path,
            types: TypeConverter::new(universe, bindings, module),
            locals: ScopeStack::new(),
            frames: Vec::new(),
            class: None,
            diags: Diagnostics::new(),
            saw_top_level_await: false,
        }
    }

    pub fn finish(self) -> Diagnostics {
        self.diags
    }

    pub fn error(&mut self, code: &'static str, span: Span, message: String) {
        self.diags.push(Diagnostic::error(code, message).at(self.file, span));
    }

    pub fn warning(&mut self, code: &'static str, span: Span, message: String) {
        self.diags.push(Diagnostic::warning(code, message).at(self.file, span));
    }

    /// Run `f` with diagnostics discarded. Used to type an expression
    /// before the expected type it will be rebuilt against is known.
    pub fn scratch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::take(&mut self.diags);
        let saved_await = self.saw_top_level_await;
        let result = f(self);
        self.diags = saved;
        self.saw_top_level_await = saved_await;
        result
    }

    pub fn convert(&mut self, node: &TypeNode) -> IrType {
        self.types.convert(node, &mut self.diags)
    }

    pub fn module_info(&self, module: ModuleId) -> Option<&'a ModuleInfo> {
        self.program.modules.get(module.index())
    }

    pub fn frame(&mut self) -> Option<&mut FunctionFrame> {
        self.frames.last_mut()
    }

    /// The type declaration named `name` in this module.
    pub fn type_decl(&self, name: &str) -> Result<DeclId, Ice> {
        self.bindings
            .lookup_type(self.module, name)
            .filter(|d| self.bindings.decl(*d).module == Some(self.module))
            .ok_or_else(|| Ice::UnboundDeclaration {
                name: name.to_string(),
                module: self.file.to_string(),
            })
    }

    /// Catalog identity of a source type declared in this module.
    pub fn source_type_id(&self, name: &str) -> Result<TypeId, Ice> {
        let decl = self.type_decl(name)?;
        self.universe
            .source_type(decl)
            .cloned()
            .ok_or_else(|| Ice::MissingCatalogEntry {
                name: name.to_string(),
                module: self.file.to_string(),
            })
    }

    /// Type of a module-level variable from its annotation or initializer.
    pub fn declared_variable_type(&mut self, annotation: Option<&TypeNode>, init: Option<&tsharp_syntax::ast::Expr>) -> IrType {
        if let Some(annotation) = annotation {
            return self.scratch(|b| b.convert(annotation));
        }
        match init {
            Some(init) => self.scratch(|b| infer::widen(&b.expr(init, None).ty)),
            None => IrType::Any,
        }
    }

    /// Result type of a module function as seen by callers.
    pub fn function_signatures(&mut self, decl: DeclId) -> Vec<SignatureEntry> {
        let bindings = self.bindings;
        let sigs = bindings.signatures_of(decl);
        let has_overloads = sigs.iter().any(|s| !s.has_body);
        let fallback = self.program.returns.get(&decl).cloned().unwrap_or(IrType::Unknown);
        sigs.into_iter()
            .filter(|s| !has_overloads || !s.has_body)
            .map(|s| self.types.signature_entry(s, fallback.clone(), &mut self.diags))
            .collect()
    }

    /// How a module-level value is addressed from other code.
    pub fn module_member(&self, decl: DeclId, name: &str) -> IrExpressionKind {
        let module = self.bindings.decl(decl).module.unwrap_or(self.module);
        let (namespace, container) = self
            .module_info(module)
            .map(|info| (info.namespace.clone(), info.container.clone()))
            .unwrap_or_default();
        IrExpressionKind::ModuleMember {
            namespace,
            container,
            name: name.to_string(),
        }
    }

    /// Top-level statement of a module body.
    fn top_level_stmt(&mut self, stmt: &Stmt) -> Vec<IrStatement> {
        self.stmt(stmt)
    }

    /// Whether `decl` is a declaration of the given kind.
    pub fn decl_kind(&self, decl: DeclId) -> &'a DeclKind {
        &self.bindings.decl(decl).kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsharp_catalog::{CatalogOptions, PrimitiveKind};

    pub(crate) fn build(sources: &[(&str, &str)]) -> (Vec<IrModule>, Diagnostics) {
        let modules: Vec<SourceModule> = sources
            .iter()
            .map(|(path, src)| tsharp_syntax::read_typescript(path, src).unwrap())
            .collect();
        let bindings = Bindings::build(&modules, "@dotnet/");
        let mut diags = Diagnostics::new();
        let universe = Universe::build(&modules, &bindings, &CatalogOptions::default(), &mut diags);
        let ir = build_program(&modules, &bindings, &universe, &mut diags).unwrap();
        (ir, diags)
    }

    pub(crate) fn variable<'m>(module: &'m IrModule, name: &str) -> &'m IrVariable {
        module
            .declarations
            .iter()
            .find_map(|d| match d {
                IrDeclaration::Variable(v) if v.name == name => Some(v),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_module_layout() {
        let (ir, diags) = build(&[("models/user.ts", "export const answer: int = 42;")]);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(ir[0].namespace, "App.models");
        assert_eq!(ir[0].container, "user");
        assert!(!ir[0].is_entry);
        let answer = variable(&ir[0], "answer");
        assert_eq!(answer.ty, IrType::Primitive(PrimitiveKind::Int));
        assert!(answer.is_const);
    }

    #[test]
    fn test_entry_module_collects_top_level_statements() {
        let (ir, _) = build(&[("main.ts", "const x = 1;\nconsole.log(x);")]);
        assert!(ir[0].is_entry);
        assert_eq!(ir[0].top_level.len(), 1);
        assert_eq!(variable(&ir[0], "x").ty, IrType::number());
    }

    #[test]
    fn test_unannotated_function_result_is_inferred_for_callers() {
        let (ir, diags) = build(&[(
            "main.ts",
            "function twice(n: int) { return n * 2; }\nconst y = twice(4);",
        )]);
        assert!(diags.is_empty(), "{:?}", diags);
        let int = IrType::Primitive(PrimitiveKind::Int);
        assert_eq!(ir[0].functions().next().unwrap().ret, int);
        assert_eq!(variable(&ir[0], "y").ty, int);
    }

    #[test]
    fn test_cross_module_variable_type() {
        let (ir, diags) = build(&[
            ("config.ts", "export const limit = 10.5;"),
            ("main.ts", "import { limit } from \"./config\";\nconst twice = limit * 2;"),
        ]);
        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(variable(&ir[1], "twice").ty, IrType::number());
    }
}
