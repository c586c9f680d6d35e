//! Project configuration driving a compilation.

use std::path::Path;
use tempfile::TempDir;
use tsharp::{CONFIG_FILE, CompilerOptions, ConfigError, codes, compile_dir};

const GAUGE_MANIFEST: &str = r#"{
  "namespace": "Acme.Widgets",
  "assembly": "Acme",
  "types": [
    {
      "name": "Gauge",
      "kind": "class",
      "baseType": "System.Object",
      "isStatic": true,
      "members": [
        { "name": "Read", "kind": "method", "isStatic": true,
          "signatures": [{ "parameters": [], "returnType": "System.Int32" }] }
      ]
    }
  ]
}"#;

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

#[test]
fn test_project_with_metadata_root() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        CONFIG_FILE,
        "source_root = \"app\"\nroot_namespace = \"Plant\"\nmetadata_roots = [\"meta\"]\n",
    );
    write(dir.path(), "meta/Acme.Widgets.manifest.json", GAUGE_MANIFEST);
    write(
        dir.path(),
        "app/main.ts",
        "import { Gauge } from \"@dotnet/Acme.Widgets\";\nconst level = Gauge.Read();\nconsole.log(level);\n",
    );

    let options = CompilerOptions::discover(dir.path()).unwrap();
    assert_eq!(options.root_namespace, "Plant");
    let output = compile_dir(&options).unwrap();
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
    let main = &output.files["main.cs"];
    assert!(main.contains("namespace Plant;"), "{}", main);
    assert!(main.contains("int level = global::Acme.Widgets.Gauge.Read();"), "{}", main);
}

#[test]
fn test_broken_manifest_is_a_warning() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), CONFIG_FILE, "metadata_roots = [\"meta\"]\n");
    write(dir.path(), "meta/Broken.manifest.json", "{ \"namespace\": ");
    write(dir.path(), "src/main.ts", "console.log(\"ok\");\n");

    let options = CompilerOptions::discover(dir.path()).unwrap();
    let output = compile_dir(&options).unwrap();
    let found: Vec<&str> = output.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(found, vec![codes::MANIFEST_SKIPPED]);
    assert!(!output.has_errors());
    assert!(output.files.contains_key("main.cs"));
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), CONFIG_FILE, "max_union_arity = \"many\"\n");
    assert!(matches!(
        CompilerOptions::discover(dir.path()),
        Err(ConfigError::Parse { .. })
    ));
}
