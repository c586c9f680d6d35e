//! Per-module emission state.

use crate::EmitOptions;
use crate::context::EmitterContext;
use crate::error::Ice;
use crate::naming::{escape_identifier, escape_qualified};
use crate::shapes::ShapeRegistry;
use std::collections::{BTreeSet, HashMap};
use tsharp_catalog::Universe;
use tsharp_ir::{IrClassMember, IrDeclaration, IrFunction, IrModule};

/// Result of one lowering step: the produced node and the context after it.
pub(crate) type Lowered<T> = Result<(T, EmitterContext), Ice>;

/// A generator whose iterator can be driven directly by `yield*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GeneratorTarget {
    pub type_params: usize,
    pub is_async: bool,
}

/// Facts about the whole program the emitter needs while lowering one
/// module.
#[derive(Debug, Default)]
pub(crate) struct ProgramIndex {
    /// `(namespace, container)` → emitted container class name.
    containers: HashMap<(String, String), String>,
    /// `(namespace, container, function)` of module-level generators.
    functions: HashMap<(String, String, String), GeneratorTarget>,
    /// `(class platform name, method)` of generator methods.
    methods: HashMap<(String, String), GeneratorTarget>,
}

impl ProgramIndex {
    pub fn build(modules: &[IrModule]) -> Self {
        let mut index = Self::default();
        for module in modules {
            let clashes = module.declarations.iter().any(|d| match d {
                IrDeclaration::Class(c) => c.name == module.container,
                IrDeclaration::Interface(i) => i.name == module.container,
                IrDeclaration::Enum(e) => e.name == module.container,
                IrDeclaration::Function { function, .. } => function.name == module.container,
                IrDeclaration::Variable(v) => v.name == module.container,
            });
            let container = if clashes {
                format!("{}_module", module.container)
            } else {
                escape_identifier(&module.container)
            };
            index
                .containers
                .insert((module.namespace.clone(), module.container.clone()), container);

            for decl in &module.declarations {
                match decl {
                    IrDeclaration::Function { function, .. } => {
                        if let Some(target) = target_of(function) {
                            index.functions.insert(
                                (module.namespace.clone(), module.container.clone(), function.name.clone()),
                                target,
                            );
                        }
                    }
                    IrDeclaration::Class(class) => {
                        for member in &class.members {
                            if let IrClassMember::Method(method) = member
                                && let Some(target) = target_of(&method.function)
                            {
                                index.methods.insert(
                                    (class.id.platform_name.to_string(), method.function.name.clone()),
                                    target,
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        index
    }

    pub fn container(&self, namespace: &str, container: &str) -> String {
        self.containers
            .get(&(namespace.to_string(), container.to_string()))
            .cloned()
            .unwrap_or_else(|| escape_identifier(container))
    }

    pub fn generator_function(&self, namespace: &str, container: &str, name: &str) -> Option<GeneratorTarget> {
        self.functions
            .get(&(namespace.to_string(), container.to_string(), name.to_string()))
            .copied()
    }

    pub fn generator_method(&self, class: &str, name: &str) -> Option<GeneratorTarget> {
        self.methods.get(&(class.to_string(), name.to_string())).copied()
    }
}

fn target_of(function: &IrFunction) -> Option<GeneratorTarget> {
    function.generator.as_ref().map(|g| GeneratorTarget {
        type_params: function.type_params.len(),
        is_async: g.is_async,
    })
}

/// Lowers one [`IrModule`] to a C# file.
pub(crate) struct ModuleEmitter<'a> {
    pub universe: &'a Universe,
    pub options: &'a EmitOptions,
    pub program: &'a ProgramIndex,
    pub module: &'a IrModule,
    pub shapes: ShapeRegistry,
    /// Emitted name of this module's container class.
    pub container: String,
    /// Platform name of the class being emitted.
    pub class_id: Option<String>,
    /// Namespaces the file must import.
    pub usings: BTreeSet<String>,
}

impl<'a> ModuleEmitter<'a> {
    pub fn new(universe: &'a Universe, options: &'a EmitOptions, program: &'a ProgramIndex, module: &'a IrModule) -> Self {
        let container = program.container(&module.namespace, &module.container);
        Self {
            universe,
            options,
            program,
            module,
            shapes: ShapeRegistry::new(),
            container,
            class_id: None,
            usings: BTreeSet::new(),
        }
    }

    /// Keep what a finished member body needed at file level.
    pub fn finish(&mut self, ctx: &EmitterContext) {
        self.usings.extend(ctx.usings.iter().cloned());
    }

    /// `global::Namespace.Name` with reserved segments escaped.
    pub fn qualify(&self, namespace: &str, name: &str) -> String {
        let name = escape_qualified(name);
        if namespace.is_empty() {
            format!("global::{}", name)
        } else {
            format!("global::{}.{}", escape_qualified(namespace), name)
        }
    }
}
