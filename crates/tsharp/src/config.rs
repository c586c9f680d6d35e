//! Compiler options and the `tsharp.toml` file.
//!
//! Example `tsharp.toml`:
//! ```toml
//! source_root = "src"
//! root_namespace = "Game"
//! metadata_roots = ["metadata"]
//! max_union_arity = 4
//! ```
//!
//! Every key is optional. Relative paths are resolved against the
//! directory holding the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tsharp_catalog::CatalogOptions;
use tsharp_emit::EmitOptions;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "tsharp.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerOptions {
    /// Directory holding the `.ts` sources; module paths are relative to it.
    pub source_root: PathBuf,
    /// Namespace every module namespace is nested under.
    pub root_namespace: String,
    /// Extra directories scanned for `*.manifest.json` metadata.
    pub metadata_roots: Vec<PathBuf>,
    /// Import specifier prefix naming a platform namespace
    /// (`@dotnet/System.Linq`).
    pub platform_prefix: String,
    /// Namespace of the support library the output links against.
    pub runtime_namespace: String,
    /// Widest union emitted as `Union<...>`.
    pub max_union_arity: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("src"),
            root_namespace: "App".to_string(),
            metadata_roots: Vec::new(),
            platform_prefix: "@dotnet/".to_string(),
            runtime_namespace: "Tsharp.Runtime".to_string(),
            max_union_arity: 8,
        }
    }
}

fn is_namespace(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}

impl CompilerOptions {
    /// Read options from a `tsharp.toml` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut options: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(dir) = path.parent() {
            options.resolve_paths(dir);
        }
        options.validate()?;
        tracing::debug!(path = %path.display(), namespace = %options.root_namespace, "loaded configuration");
        Ok(options)
    }

    /// `tsharp.toml` in `dir` if there is one, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            return Self::load(&path);
        }
        let mut options = Self::default();
        options.resolve_paths(dir);
        Ok(options)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.source_root.is_relative() {
            self.source_root = base.join(&self.source_root);
        }
        for root in &mut self.metadata_roots {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_namespace(&self.root_namespace) {
            return Err(ConfigError::Invalid(format!(
                "root_namespace `{}` is not a dotted identifier",
                self.root_namespace
            )));
        }
        if !is_namespace(&self.runtime_namespace) {
            return Err(ConfigError::Invalid(format!(
                "runtime_namespace `{}` is not a dotted identifier",
                self.runtime_namespace
            )));
        }
        if self.max_union_arity < 2 {
            return Err(ConfigError::Invalid("max_union_arity must be at least 2".to_string()));
        }
        if self.platform_prefix.is_empty() {
            return Err(ConfigError::Invalid("platform_prefix must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            root_namespace: self.root_namespace.clone(),
            metadata_roots: self.metadata_roots.clone(),
        }
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            runtime_namespace: self.runtime_namespace.clone(),
            max_union_arity: self.max_union_arity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = CompilerOptions::default();
        assert_eq!(options.root_namespace, "App");
        assert_eq!(options.platform_prefix, "@dotnet/");
        assert_eq!(options.runtime_namespace, "Tsharp.Runtime");
        assert_eq!(options.max_union_arity, 8);
        assert!(options.metadata_roots.is_empty());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "root_namespace = \"Game.Core\"\nmetadata_roots = [\"meta\"]\nmax_union_arity = 4\n",
        )
        .unwrap();

        let options = CompilerOptions::load(&path).unwrap();
        assert_eq!(options.root_namespace, "Game.Core");
        assert_eq!(options.max_union_arity, 4);
        assert_eq!(options.source_root, dir.path().join("src"));
        assert_eq!(options.metadata_roots, vec![dir.path().join("meta")]);
        assert_eq!(options.runtime_namespace, "Tsharp.Runtime");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "root_namspace = \"Typo\"\n").unwrap();
        assert!(matches!(CompilerOptions::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values() {
        let options = CompilerOptions {
            max_union_arity: 1,
            ..CompilerOptions::default()
        };
        assert!(matches!(options.validate(), Err(ConfigError::Invalid(_))));
        let options = CompilerOptions {
            root_namespace: "My App".to_string(),
            ..CompilerOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_discover_without_file() {
        let dir = TempDir::new().unwrap();
        let options = CompilerOptions::discover(dir.path()).unwrap();
        assert_eq!(options.source_root, dir.path().join("src"));
    }
}
