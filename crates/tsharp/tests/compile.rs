//! End-to-end compilation through the public driver API.

use tsharp::{CompileError, CompileOutput, CompilerOptions, codes, compile, compile_dir};

fn sources(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items.iter().map(|(p, t)| (p.to_string(), t.to_string())).collect()
}

fn compile_ok(items: &[(&str, &str)]) -> CompileOutput {
    compile(&sources(items), &CompilerOptions::default()).unwrap()
}

fn codes_of(output: &CompileOutput) -> Vec<&str> {
    output.diagnostics.iter().map(|d| d.code).collect()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, text))
}

/// Each needle must appear after the previous one.
fn assert_in_order(text: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        let found = text[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("`{}` not found after byte {} in:\n{}", needle, from, text));
        from += found + needle.len();
    }
}

const STEPS: &str = "export function* steps(): Generator<int, void, int> {\n  const a: int = yield 1;\n  const b: int = yield a;\n  const c: int = yield b;\n  console.log(c);\n}\n";

const PROGRAM: &[(&str, &str)] = &[
    (
        "models/user.ts",
        "export interface User { name: string; age: int; }\nexport class Account {\n  constructor(public owner: User) {}\n  describe(): string { return this.owner.name; }\n}\n",
    ),
    (
        "util/format.ts",
        "import { User } from \"../models/user\";\nexport function greet(user: User): string { return \"hello \" + user.name; }\n",
    ),
    (
        "main.ts",
        "import { User, Account } from \"./models/user\";\nimport { greet } from \"./util/format\";\nconst user: User = { name: \"ada\", age: 36 };\nconst account = new Account(user);\nconsole.log(greet(user));\nconsole.log(account.describe());\n",
    ),
];

#[test]
fn test_output_is_deterministic() {
    let first = compile_ok(PROGRAM);
    let second = compile_ok(PROGRAM);
    assert_eq!(first.files, second.files);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);
}

#[test]
fn test_files_mirror_source_directories() {
    let output = compile_ok(PROGRAM);
    let paths: Vec<&str> = output.files.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["main.cs", "models/user.cs", "util/format.cs"]);

    let user = &output.files["models/user.cs"];
    assert!(user.contains("namespace App.models;"), "{}", user);
    assert!(user.contains("public class User"), "{}", user);
    assert!(user.contains("public class Account"), "{}", user);

    let format = &output.files["util/format.cs"];
    assert!(format.contains("namespace App.util;"), "{}", format);
    assert!(format.contains("public static string greet("), "{}", format);

    let main = &output.files["main.cs"];
    assert!(main.contains("Main("), "{}", main);
    assert!(main.contains("global::System.Console.WriteLine("), "{}", main);
}

#[test]
fn test_root_namespace_comes_from_options() {
    let options = CompilerOptions {
        root_namespace: "Game".to_string(),
        ..CompilerOptions::default()
    };
    let output = compile(&sources(&[("models/color.ts", "export enum Color { Red, Green = 5 }")]), &options).unwrap();
    insta::assert_snapshot!(output.files["models/color.cs"], @r"
    #nullable enable

    namespace Game.models;

    public enum Color
    {
        Red = 0,
        Green = 5,
    }
    ");
}

#[test]
fn test_overload_is_selected_by_argument_shape() {
    let output = compile_ok(&[(
        "main.ts",
        "const a: int = 1;\nconst b: int = 2;\nconst m = Math.max(a, b);\nconst d = Math.max(1.5, 2);\n",
    )]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let main = &output.files["main.cs"];
    assert!(main.contains("int m = global::System.Math.Max("), "{}", main);
    assert!(main.contains("double d = global::System.Math.Max("), "{}", main);
}

#[test]
fn test_narrowed_override_is_reported() {
    let output = compile_ok(&[(
        "animals.ts",
        "export class Animal {\n  speak(): string { return \"...\"; }\n}\nexport class Cat extends Animal {\n  protected speak(): string { return \"meow\"; }\n}\n",
    )]);
    assert_eq!(codes_of(&output), vec![codes::VISIBILITY_NARROWED]);
    assert!(output.has_errors());
    // Output is still produced alongside the error.
    assert!(output.files["animals.cs"].contains("public class Cat : "));
}

#[test]
fn test_widened_override_keeps_base_visibility() {
    let output = compile_ok(&[(
        "shapes.ts",
        "export class Base {\n  protected describe(): string { return \"base\"; }\n}\nexport class Derived extends Base {\n  describe(): string { return \"derived\"; }\n}\n",
    )]);
    assert_eq!(codes_of(&output), vec![codes::VISIBILITY_WIDENED]);
    assert!(!output.has_errors());
    let text = &output.files["shapes.cs"];
    assert!(text.contains("protected override string describe()"), "{}", text);
}

#[test]
fn test_every_alias_spelling_lowers_to_one_type() {
    let output = compile_ok(&[(
        "values.ts",
        "export const a: number = 1;\nexport const b: double = 2;\nexport const c: Array<string> = [];\nexport const d: string[] = [];\n",
    )]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let text = &output.files["values.cs"];
    assert!(text.contains("double a"), "{}", text);
    assert!(text.contains("double b"), "{}", text);
    assert!(text.contains("string[] c"), "{}", text);
    assert!(text.contains("string[] d"), "{}", text);
}

#[test]
fn test_generator_suspends_before_reading_input() {
    let output = compile_ok(&[(
        "gen.ts",
        "export function* counter(): Generator<int, void, int> {\n  let total: int = 0;\n  while (true) {\n    const step: int = yield total;\n    total = total + step;\n  }\n}\n",
    )]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let text = &output.files["gen.cs"];
    let wrapper = position(text, "public sealed class counter_Generator");
    let entry = position(text, "counter()");
    assert!(wrapper < entry, "{}", text);
    let write = position(text, "exchange.Output = total;");
    let suspend = position(text, "yield return exchange;");
    let read = position(text, "int step = ");
    assert!(write < suspend && suspend < read, "{}", text);
}

#[test]
fn test_syntax_error_skips_only_that_module() {
    let output = compile_ok(&[
        ("broken.ts", "const = ;"),
        ("fine.ts", "export function one(): int { return 1; }"),
    ]);
    assert_eq!(codes_of(&output), vec![codes::SYNTAX_ERROR]);
    let span = output.diagnostics[0].span.as_ref().unwrap();
    assert_eq!(span.file, "broken.ts");
    assert!(!output.files.contains_key("broken.cs"));
    assert!(output.files.contains_key("fine.cs"));
}

#[test]
fn test_unresolved_identifier_is_a_diagnostic() {
    let output = compile_ok(&[("main.ts", "console.log(missing);")]);
    assert!(codes_of(&output).contains(&codes::UNRESOLVED_IDENTIFIER));
    assert!(output.files.contains_key("main.cs"));
}

#[test]
fn test_compile_dir_matches_in_memory() {
    let dir = tempfile::TempDir::new().unwrap();
    let src = dir.path().join("src");
    for (path, text) in PROGRAM {
        let file = src.join(path);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, text).unwrap();
    }
    let options = CompilerOptions::discover(dir.path()).unwrap();
    let from_disk = compile_dir(&options).unwrap();
    assert_eq!(from_disk.files, compile_ok(PROGRAM).files);
}

#[test]
fn test_compile_dir_requires_source_root() {
    let dir = tempfile::TempDir::new().unwrap();
    let options = CompilerOptions::discover(dir.path()).unwrap();
    assert!(matches!(compile_dir(&options), Err(CompileError::MissingSourceRoot(_))));
}

#[test]
fn test_each_resume_reads_its_own_input() {
    let output = compile_ok(&[("gen/steps.ts", STEPS)]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let text = &output.files["gen/steps.cs"];
    assert_eq!(text.matches("yield return exchange;").count(), 3, "{}", text);
    assert_in_order(
        text,
        &[
            "exchange.Output = 1;",
            "yield return exchange;",
            "int a = ",
            "exchange.Input",
            "exchange.Output = a;",
            "yield return exchange;",
            "int b = ",
            "exchange.Input",
            "exchange.Output = b;",
            "yield return exchange;",
            "int c = ",
            "exchange.Input",
            "global::System.Console.WriteLine(c)",
        ],
    );
    assert!(text.contains("next(int value = default)"), "{}", text);
}

#[test]
fn test_caller_resumes_with_literal_inputs() {
    let output = compile_ok(&[
        ("gen/steps.ts", STEPS),
        (
            "main.ts",
            "import { steps } from \"./gen/steps\";\nconst it = steps();\nconst first = it.next();\nconst second = it.next(5);\nconsole.log(second.value);\n",
        ),
    ]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let main = &output.files["main.cs"];
    assert_in_order(main, &["global::App.gen.steps_module.steps()", "it.next()", "it.next(5)", "second.value"]);
    assert!(!main.contains("NotSupportedException"), "{}", main);
}

#[test]
fn test_delegation_to_source_generator_runs_its_iterator() {
    let output = compile_ok(&[
        (
            "gen/source.ts",
            "export function* letters(): Generator<string, void, int> {\n  const n: int = yield \"a\";\n  console.log(n);\n}\n",
        ),
        (
            "main.ts",
            "import { letters } from \"./gen/source\";\nexport function* relay(): Generator<string, void, int> {\n  yield* letters();\n  yield \"z\";\n}\n",
        ),
    ]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let main = &output.files["main.cs"];
    assert_in_order(
        main,
        &[
            "var inner = new global::App.gen.source.letters_exchange();",
            "foreach (var step in global::App.gen.source.letters_iterator(inner))",
            "exchange.Output = inner.Output;",
            "yield return exchange;",
            "inner.Input = exchange.Input;",
            "exchange.Output = \"z\";",
            "yield return exchange;",
        ],
    );
}

#[test]
fn test_delegation_to_generator_value_forwards_input() {
    let output = compile_ok(&[(
        "pipe.ts",
        "export function* relay(source: Generator<int, void, int>): Generator<int, void, int> {\n  yield* source;\n}\n",
    )]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let text = &output.files["pipe.cs"];
    assert_in_order(
        text,
        &[
            "var it = source;",
            "var step = it.next()",
            "step.done",
            "exchange.Input ?? default",
            "exchange.Output = step.value;",
            "yield return exchange;",
        ],
    );
}

#[test]
fn test_async_generator_awaits_its_iterator() {
    let output = compile_ok(&[(
        "clock.ts",
        "export async function* ticks(): AsyncGenerator<int, void, int> {\n  const a: int = yield 1;\n  console.log(a);\n}\nexport async function* relay(): AsyncGenerator<int, void, int> {\n  yield* ticks();\n}\n",
    )]);
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let text = &output.files["clock.cs"];
    assert!(text.contains("IAsyncEnumerable<ticks_exchange>"), "{}", text);
    assert!(text.contains("AsyncGenerator<int"), "{}", text);
    assert!(text.contains("await _iterator.MoveNextAsync()"), "{}", text);
    assert_in_order(
        text,
        &["var inner = new ticks_exchange();", "await foreach (var step in ticks_iterator(inner))"],
    );
}

#[test]
fn test_yield_under_catch_is_stubbed() {
    let output = compile_ok(&[(
        "gen.ts",
        "export function* g(): Generator<int, void, int> {\n  try { const a: int = yield 1; console.log(a); } catch (e) { console.log(e); }\n}\n",
    )]);
    assert_eq!(codes_of(&output), vec![codes::UNSUPPORTED_YIELD]);
    let text = &output.files["gen.cs"];
    assert!(!text.contains("yield return exchange;"), "{}", text);
    assert_in_order(text, &["try", "throw new global::System.NotSupportedException("]);
}

#[test]
fn test_stubbed_initializers_become_throwing_getters() {
    let output = compile_ok(&[(
        "values.ts",
        "function f(x: int): int { return x; }\nexport const v = f(\"a\");\nexport class Box {\n  n: int = f(\"b\");\n}\n",
    )]);
    assert!(codes_of(&output).contains(&codes::NO_MATCHING_OVERLOAD), "{:?}", output.diagnostics);
    let text = &output.files["values.cs"];
    assert!(!text.contains("= throw"), "{}", text);
    assert_eq!(text.matches("throw new global::System.NotSupportedException(").count(), 2, "{}", text);
}
