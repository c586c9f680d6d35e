//! One compilation run: read, bind, catalog, lower, emit.
//!
//! A [`Compilation`] owns everything a run produces. Nothing is shared
//! between runs, so independent compilations can proceed on separate
//! threads.

use crate::config::CompilerOptions;
use crate::error::CompileError;
use std::collections::BTreeMap;
use std::path::Path;
use tsharp_binding::Bindings;
use tsharp_catalog::Universe;
use tsharp_ir::IrModule;
use tsharp_syntax::{Diagnostic, Diagnostics, ReadError, SourceModule, Span, codes, reader_for_extension};

/// Result of a finished compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// C# text keyed by output path (`models/user.cs`).
    pub files: BTreeMap<String, String>,
    /// Every diagnostic, in the order phases reported them.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Per-run compilation context.
pub struct Compilation {
    options: CompilerOptions,
    modules: Vec<SourceModule>,
    bindings: Bindings,
    universe: Universe,
    diagnostics: Diagnostics,
}

impl Compilation {
    /// Parse `sources` (`(logical path, text)` pairs), bind names and build
    /// the type catalog. Syntax errors become diagnostics and drop the
    /// offending module.
    pub fn new(sources: &[(String, String)], options: CompilerOptions) -> Result<Self, CompileError> {
        options.validate()?;
        let mut diagnostics = Diagnostics::new();
        let mut modules = Vec::with_capacity(sources.len());
        for (path, text) in sources {
            let Some(reader) = source_extension(path).and_then(reader_for_extension) else {
                return Err(CompileError::UnsupportedSource(path.clone()));
            };
            match reader.read(path, text) {
                Ok(module) => modules.push(module),
                Err(ReadError::Syntax {
                    path,
                    line,
                    column,
                    snippet,
                }) => {
                    diagnostics.push(
                        Diagnostic::error(codes::SYNTAX_ERROR, format!("syntax error near `{}`", snippet))
                            .at(&path, Span::new(0, 0, line, column)),
                    );
                }
                Err(source) => {
                    return Err(CompileError::Read {
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        tracing::debug!(modules = modules.len(), skipped = sources.len() - modules.len(), "read sources");

        let bindings = Bindings::build(&modules, &options.platform_prefix);
        let universe = Universe::build(&modules, &bindings, &options.catalog_options(), &mut diagnostics);
        tracing::debug!(types = universe.entries().count(), "built catalog");

        let compilation = Self {
            options,
            modules,
            bindings,
            universe,
            diagnostics,
        };
        compilation.check_base_library()?;
        Ok(compilation)
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Build the typed IR for every module.
    pub fn lower(&mut self) -> Result<Vec<IrModule>, CompileError> {
        let modules = tsharp_ir::build_program(&self.modules, &self.bindings, &self.universe, &mut self.diagnostics)?;
        tracing::debug!(modules = modules.len(), diagnostics = self.diagnostics.len(), "built IR");
        self.check_base_library()?;
        Ok(modules)
    }

    /// A missing standard type stops the run; third-party ones stay
    /// diagnostics.
    fn check_base_library(&self) -> Result<(), CompileError> {
        match self.diagnostics.iter().find(|d| d.code == codes::MISSING_STDLIB_TYPE) {
            Some(missing) => {
                tracing::error!(diagnostic = %missing, "base library type missing");
                Err(CompileError::MissingStdlibType(Box::new(missing.clone())))
            }
            None => Ok(()),
        }
    }

    /// Lower and emit, consuming the compilation.
    pub fn finish(mut self) -> Result<CompileOutput, CompileError> {
        let ir = self.lower()?;
        let emitted = tsharp_emit::emit_program(&ir, &self.universe, &self.options.emit_options())?;
        Ok(CompileOutput {
            files: emitted.files,
            diagnostics: self.diagnostics.into_vec(),
        })
    }
}

/// Compile in-memory sources.
pub fn compile(sources: &[(String, String)], options: &CompilerOptions) -> Result<CompileOutput, CompileError> {
    let output = Compilation::new(sources, options.clone())?.finish()?;
    tracing::debug!(
        files = output.files.len(),
        diagnostics = output.diagnostics.len(),
        errors = output.has_errors(),
        "compiled"
    );
    Ok(output)
}

/// Compile every `.ts` file under `options.source_root`.
pub fn compile_dir(options: &CompilerOptions) -> Result<CompileOutput, CompileError> {
    let sources = read_source_root(&options.source_root)?;
    compile(&sources, options)
}

/// Extension after the last dot of the file name (`ts` for `a/b.ts`).
fn source_extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// A file some reader handles; declaration files are skipped.
fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.contains(".d.") && source_extension(name).and_then(reader_for_extension).is_some()
}

/// Collect sources under `root` as `(logical path, text)` pairs,
/// sorted by path. Declaration files, `node_modules` and hidden directories
/// are skipped.
pub fn read_source_root(root: &Path) -> Result<Vec<(String, String)>, CompileError> {
    if !root.is_dir() {
        return Err(CompileError::MissingSourceRoot(root.to_path_buf()));
    }
    let mut sources = Vec::new();
    let walker = walkdir::WalkDir::new(root).into_iter().filter_entry(|e| {
        e.depth() == 0 || {
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && name != "node_modules"
        }
    });
    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_source_file(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let logical = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let text = std::fs::read_to_string(entry.path()).map_err(|source| CompileError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        tracing::trace!(path = %logical, bytes = text.len(), "source file");
        sources.push((logical, text));
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sources(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(p, t)| (p.to_string(), t.to_string())).collect()
    }

    #[test]
    fn test_source_file_filter() {
        assert!(is_source_file(Path::new("a/b.ts")));
        assert!(!is_source_file(Path::new("a/b.d.ts")));
        assert!(!is_source_file(Path::new("a/b.js")));
        assert!(is_source_file(Path::new("a/b.mts")));
    }

    #[test]
    fn test_source_without_reader_is_rejected() {
        let result = Compilation::new(&sources(&[("notes.md", "# hi")]), CompilerOptions::default());
        assert!(matches!(result, Err(CompileError::UnsupportedSource(path)) if path == "notes.md"));
    }

    #[test]
    fn test_read_source_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("models")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        std::fs::write(root.join("main.ts"), "").unwrap();
        std::fs::write(root.join("models/user.ts"), "").unwrap();
        std::fs::write(root.join("models/user.d.ts"), "").unwrap();
        std::fs::write(root.join("node_modules/pkg/index.ts"), "").unwrap();

        let found: Vec<String> = read_source_root(root).unwrap().into_iter().map(|(p, _)| p).collect();
        assert_eq!(found, vec!["main.ts", "models/user.ts"]);
    }

    #[test]
    fn test_missing_source_root() {
        let dir = TempDir::new().unwrap();
        let result = read_source_root(&dir.path().join("nope"));
        assert!(matches!(result, Err(CompileError::MissingSourceRoot(_))));
    }

    #[test]
    fn test_compilation_stages() {
        let mut compilation = Compilation::new(
            &sources(&[("models/point.ts", "export class Point { x: int = 0; }")]),
            CompilerOptions::default(),
        )
        .unwrap();
        assert_eq!(compilation.modules().len(), 1);
        assert!(compilation.universe().resolve_alias("App.models.Point").is_some());
        let ir = compilation.lower().unwrap();
        assert_eq!(ir[0].namespace, "App.models");
        assert!(compilation.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_base_library_type_stops_the_run() {
        let result = compile(
            &sources(&[("main.ts", "let a: System.Frobnicator | null = null;\nconsole.log(a);")]),
            &CompilerOptions::default(),
        );
        let Err(CompileError::MissingStdlibType(diagnostic)) = result else {
            panic!("expected a missing base library type, got {:?}", result);
        };
        assert_eq!(diagnostic.code, codes::MISSING_STDLIB_TYPE);
        assert!(diagnostic.message.contains("System.Frobnicator"), "{}", diagnostic);
    }

    #[test]
    fn test_missing_third_party_type_is_recoverable() {
        let output = compile(
            &sources(&[("main.ts", "let a: Acme.Widget | null = null;\nconsole.log(a);")]),
            &CompilerOptions::default(),
        )
        .unwrap();
        assert!(output.diagnostics.iter().any(|d| d.code == codes::UNRESOLVED_TYPE));
        assert!(output.files.contains_key("main.cs"));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let options = CompilerOptions {
            max_union_arity: 0,
            ..CompilerOptions::default()
        };
        assert!(matches!(compile(&[], &options), Err(CompileError::Config(_))));
    }
}
