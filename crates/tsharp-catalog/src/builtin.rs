//! Base-library manifests compiled into the catalog.

use crate::manifest::{Manifest, ManifestError};
use std::path::Path;

/// `(file name, manifest text)` for every embedded manifest.
const BUILTIN: &[(&str, &str)] = &[
    ("System.manifest.json", include_str!("../data/System.manifest.json")),
    ("System.IO.manifest.json", include_str!("../data/System.IO.manifest.json")),
    (
        "System.Collections.Generic.manifest.json",
        include_str!("../data/System.Collections.Generic.manifest.json"),
    ),
    ("System.Linq.manifest.json", include_str!("../data/System.Linq.manifest.json")),
    ("System.Numerics.manifest.json", include_str!("../data/System.Numerics.manifest.json")),
    (
        "System.Threading.Tasks.manifest.json",
        include_str!("../data/System.Threading.Tasks.manifest.json"),
    ),
    ("Tsharp.Runtime.manifest.json", include_str!("../data/Tsharp.Runtime.manifest.json")),
];

/// Parse the embedded manifests.
pub fn builtin_manifests() -> (Vec<Manifest>, Vec<ManifestError>) {
    let mut manifests = Vec::new();
    let mut errors = Vec::new();
    for (name, text) in BUILTIN {
        match Manifest::parse(Path::new(name), text) {
            Ok(manifest) => manifests.push(manifest),
            Err(err) => errors.push(err),
        }
    }
    (manifests, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_manifests_parse() {
        let (manifests, errors) = builtin_manifests();
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(manifests.len(), BUILTIN.len());
        let system = manifests.iter().find(|m| m.namespace == "System").unwrap();
        assert!(system.types.iter().any(|t| t.name == "Console"));
    }
}
