//! C# code generation for the tsharp compiler.
//!
//! [`emit_program`] lowers typed [`IrModule`]s to C# source text, one file
//! per module. Lowering goes through a small C# syntax tree ([`cs`]) that
//! [`CsWriter`] prints; every decision (type erasure, naming, generator
//! state machines) is made while building that tree.

pub mod cs;
pub mod naming;
pub mod print;

mod context;
mod decl;
mod emitter;
mod error;
mod expr;
mod generator;
mod shapes;
mod stmt;
mod types;

pub use error::Ice;
pub use print::CsWriter;
pub use shapes::shape_class_name;
pub use types::primitive_type;

use emitter::{ModuleEmitter, ProgramIndex};
use std::collections::BTreeMap;
use tsharp_catalog::Universe;
use tsharp_ir::IrModule;

/// Emitter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Namespace of the support library (`Union`, `IteratorResult`,
    /// `Generator`).
    pub runtime_namespace: String,
    /// Widest union lowered to `Union<...>`; wider ones become `object`.
    pub max_union_arity: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runtime_namespace: "Tsharp.Runtime".to_string(),
            max_union_arity: 8,
        }
    }
}

/// Generated files keyed by output path (`models/user.cs`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOutput {
    pub files: BTreeMap<String, String>,
}

/// `models/user.ts` → `models/user.cs`.
pub fn output_path(module_path: &str) -> String {
    let (dir, file) = match module_path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, module_path),
    };
    let stem = file.split_once('.').map(|(stem, _)| stem).unwrap_or(file);
    match dir {
        Some(dir) => format!("{}/{}.cs", dir, stem),
        None => format!("{}.cs", stem),
    }
}

/// Lower every module to C# text.
pub fn emit_program(modules: &[IrModule], universe: &Universe, options: &EmitOptions) -> Result<EmitOutput, Ice> {
    let program = ProgramIndex::build(modules);
    let mut files = BTreeMap::new();
    for module in modules {
        let mut emitter = ModuleEmitter::new(universe, options, &program, module);
        let file = emitter.emit_module()?;
        let text = CsWriter::file(&file);
        tracing::trace!(module = %module.path, bytes = text.len(), "module written");
        files.insert(output_path(&module.path), text);
    }
    tracing::debug!(files = files.len(), "emitted program");
    Ok(EmitOutput { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsharp_binding::Bindings;
    use tsharp_catalog::CatalogOptions;
    use tsharp_syntax::{Diagnostics, SourceModule};

    fn emit(sources: &[(&str, &str)]) -> BTreeMap<String, String> {
        let modules: Vec<SourceModule> = sources
            .iter()
            .map(|(path, src)| tsharp_syntax::read_typescript(path, src).unwrap())
            .collect();
        let bindings = Bindings::build(&modules, "@dotnet/");
        let mut diags = Diagnostics::new();
        let universe = tsharp_catalog::Universe::build(&modules, &bindings, &CatalogOptions::default(), &mut diags);
        let ir = tsharp_ir::build_program(&modules, &bindings, &universe, &mut diags).unwrap();
        assert!(diags.is_empty(), "{:?}", diags);
        emit_program(&ir, &universe, &EmitOptions::default()).unwrap().files
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle)
            .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, text))
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(output_path("models/user.ts"), "models/user.cs");
        assert_eq!(output_path("main.ts"), "main.cs");
        assert_eq!(output_path("a/b/c.d.ts"), "a/b/c.cs");
    }

    #[test]
    fn test_enum_module_layout() {
        let files = emit(&[("models/color.ts", "export enum Color { Red, Green = 5 }")]);
        insta::assert_snapshot!(files["models/color.cs"], @r"
        #nullable enable

        namespace App.models;

        public enum Color
        {
            Red = 0,
            Green = 5,
        }
        ");
    }

    #[test]
    fn test_functions_live_in_the_file_container() {
        let files = emit(&[("util/math.ts", "export function twice(n: int): int { return n * 2; }")]);
        let text = &files["util/math.cs"];
        assert!(text.contains("namespace App.util;"), "{}", text);
        assert!(text.contains("public static class math"), "{}", text);
        assert!(text.contains("public static int twice(int n)"), "{}", text);
    }

    #[test]
    fn test_shadowed_locals_get_unique_names() {
        let files = emit(&[(
            "main.ts",
            "function f(): void {\n  let x: int = 1;\n  if (x > 0) { let x: int = 2; console.log(x); }\n  console.log(x);\n}",
        )]);
        let text = &files["main.cs"];
        assert!(text.contains("int x = 1;"), "{}", text);
        assert!(text.contains("int x1 = 2;"), "{}", text);
    }

    #[test]
    fn test_generator_round_trip_ordering() {
        let files = emit(&[(
            "gen.ts",
            "export function* echo(): Generator<int, void, int> {\n  const a: int = yield 1;\n  yield a;\n}",
        )]);
        let text = &files["gen.cs"];
        // Exchange, iterator, wrapper, entry point.
        let exchange = position(text, "public sealed class echo_exchange");
        let iterator = position(text, "echo_iterator(echo_exchange exchange)");
        let wrapper = position(text, "public sealed class echo_Generator");
        let entry = position(text, "echo()");
        assert!(exchange < iterator && iterator < wrapper && wrapper < entry, "{}", text);
        // Output is written before suspending; Input is read after resuming.
        let output = position(text, "exchange.Output = 1;");
        let suspend = position(text, "yield return exchange;");
        let receive = position(text, "int a = ");
        assert!(output < suspend && suspend < receive, "{}", text);
        assert!(text[receive..].contains("exchange.Input"), "{}", text);
    }

    #[test]
    fn test_unions_and_dictionaries() {
        let files = emit(&[(
            "data.ts",
            "export const lookup: { [key: string]: int } = {};\nexport const maybe: string | null = null;",
        )]);
        let text = &files["data.cs"];
        assert!(
            text.contains("global::System.Collections.Generic.Dictionary<string, int> lookup"),
            "{}",
            text
        );
        assert!(text.contains("string? maybe"), "{}", text);
    }

    #[test]
    fn test_reserved_namespace_and_type_names_are_escaped() {
        let files = emit(&[
            (
                "class/static.ts",
                "export class event {}\nexport function make(): event { return new event(); }",
            ),
            (
                "main.ts",
                "import { event, make } from \"./class/static\";\nconst a: event = make();\nconsole.log(a);",
            ),
        ]);
        let lib = &files["class/static.cs"];
        assert!(lib.contains("namespace App.@class;"), "{}", lib);
        assert!(lib.contains("public class @event"), "{}", lib);
        assert!(lib.contains("public static class @static"), "{}", lib);
        let main = &files["main.cs"];
        assert!(main.contains("global::App.@class.@event a = "), "{}", main);
        assert!(main.contains("global::App.@class.@static.make()"), "{}", main);
        assert!(!main.contains("App.class"), "{}", main);
    }

    #[test]
    fn test_function_named_after_its_file_moves_the_container() {
        let files = emit(&[
            ("greet.ts", "export function greet(name: string): string { return \"hi \" + name; }"),
            ("main.ts", "import { greet } from \"./greet\";\nconsole.log(greet(\"ada\"));"),
        ]);
        assert!(files["greet.cs"].contains("public static class greet_module"), "{}", files["greet.cs"]);
        assert!(files["main.cs"].contains("global::App.greet_module.greet("), "{}", files["main.cs"]);
    }
}
