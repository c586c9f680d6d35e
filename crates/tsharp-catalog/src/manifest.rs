//! Platform metadata manifests.
//!
//! A manifest describes the public surface of one platform namespace:
//!
//! ```json
//! {
//!   "namespace": "System.Collections.Generic",
//!   "assembly": "System.Collections",
//!   "types": [
//!     {
//!       "name": "List`1",
//!       "kind": "class",
//!       "typeParameters": ["T"],
//!       "interfaces": ["System.Collections.Generic.IEnumerable`1<T>"],
//!       "members": [
//!         { "name": "Add", "kind": "method",
//!           "signatures": [{ "parameters": [{ "name": "item", "type": "T" }],
//!                            "returnType": "System.Void" }] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Files are named `<namespace>.manifest.json` and found by scanning the
//! configured metadata roots.

use crate::entry::{MemberKind, NominalKind, Overridability, PassingMode, Visibility};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_SUFFIX: &str = ".manifest.json";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub namespace: String,
    pub assembly: String,
    #[serde(default)]
    pub types: Vec<ManifestType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestType {
    /// Metadata name, with arity suffix for generics (``List`1``).
    pub name: String,
    pub kind: NominalKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub is_value_type: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_sealed: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub members: Vec<ManifestMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMember {
    pub name: String,
    pub kind: MemberKind,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub virtuality: Overridability,
    #[serde(default)]
    pub readonly: bool,
    /// Static method callable with instance syntax on its first parameter.
    #[serde(default)]
    pub is_extension: bool,
    /// Property and field type.
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub signatures: Vec<ManifestSignature>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSignature {
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ManifestParam>,
    #[serde(default = "default_return")]
    pub return_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub mode: PassingMode,
    #[serde(default)]
    pub optional: bool,
    /// C# `params` array.
    #[serde(default)]
    pub params: bool,
}

fn default_visibility() -> Visibility {
    Visibility::Public
}

fn default_return() -> String {
    "System.Void".to_string()
}

impl Manifest {
    /// Parse manifest text. `path` is only used for error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest =
            serde_json::from_str(text).map_err(|source| ManifestError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate(path)?;
        Ok(manifest)
    }

    /// Read and parse one manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn validate(&self, path: &Path) -> Result<(), ManifestError> {
        let invalid = |message: String| ManifestError::Invalid {
            path: path.to_path_buf(),
            message,
        };
        if self.namespace.trim().is_empty() {
            return Err(invalid("empty namespace".into()));
        }
        for ty in &self.types {
            let arity = ty
                .name
                .rsplit_once('`')
                .and_then(|(_, n)| n.parse::<usize>().ok())
                .unwrap_or(0);
            if arity != ty.type_parameters.len() {
                return Err(invalid(format!(
                    "type '{}' declares {} type parameters but its name has arity {}",
                    ty.name,
                    ty.type_parameters.len(),
                    arity
                )));
            }
            for member in &ty.members {
                let needs_signature =
                    matches!(member.kind, MemberKind::Method | MemberKind::Constructor);
                if needs_signature && member.signatures.is_empty() {
                    return Err(invalid(format!(
                        "member '{}.{}' has no signatures",
                        ty.name, member.name
                    )));
                }
                if !needs_signature && member.ty.is_none() {
                    return Err(invalid(format!(
                        "member '{}.{}' has no type",
                        ty.name, member.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Find manifest files under `roots`, in a stable order.
pub fn find_manifests(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for root in roots {
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok());
        for entry in walker {
            if entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(MANIFEST_SUFFIX))
            {
                found.push(entry.into_path());
            }
        }
    }
    found
}

/// Load every manifest under `roots`. Failures are returned alongside the
/// successfully parsed manifests so that callers can report and continue.
pub fn scan_roots(roots: &[PathBuf]) -> (Vec<Manifest>, Vec<ManifestError>) {
    let mut manifests = Vec::new();
    let mut errors = Vec::new();
    for path in find_manifests(roots) {
        match Manifest::load(&path) {
            Ok(manifest) => manifests.push(manifest),
            Err(err) => errors.push(err),
        }
    }
    (manifests, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"{
        "namespace": "Acme.Collections",
        "assembly": "Acme",
        "types": [{
            "name": "Bag`1",
            "kind": "class",
            "typeParameters": ["T"],
            "members": [
                { "name": "Count", "kind": "property", "type": "System.Int32" },
                { "name": "TryTake", "kind": "method", "virtuality": "virtual",
                  "signatures": [{ "parameters": [{ "name": "item", "type": "T", "mode": "out" }],
                                   "returnType": "System.Boolean" }] }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(Path::new("bag.manifest.json"), LIST).unwrap();
        assert_eq!(manifest.namespace, "Acme.Collections");
        let bag = &manifest.types[0];
        assert_eq!(bag.type_parameters, vec!["T"]);
        let try_take = &bag.members[1];
        assert_eq!(try_take.virtuality, Overridability::Virtual);
        assert_eq!(try_take.signatures[0].parameters[0].mode, PassingMode::Out);
        assert_eq!(try_take.visibility, Visibility::Public);
    }

    #[test]
    fn test_arity_mismatch_is_invalid() {
        let text = r#"{ "namespace": "N", "assembly": "A",
            "types": [{ "name": "Box`2", "kind": "class", "typeParameters": ["T"] }] }"#;
        let err = Manifest::parse(Path::new("n.manifest.json"), text).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { .. }));
    }

    #[test]
    fn test_scan_roots_sorted_and_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("acme");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Acme.Collections.manifest.json"), LIST).unwrap();
        std::fs::write(dir.path().join("Broken.manifest.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let (manifests, errors) = scan_roots(&[dir.path().to_path_buf()]);
        assert_eq!(manifests.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ManifestError::Json { .. }));
    }
}
