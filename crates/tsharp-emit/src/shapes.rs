//! Sealed classes standing in for anonymous object types.
//!
//! Each distinct shape used by a module gets one class named after a hash
//! of its canonical form, so the same shape always maps to the same name.

use crate::cs::{CsClass, CsMember, CsTypeDecl};
use std::collections::{BTreeMap, HashMap};
use tsharp_catalog::ObjectShape;

const PREFIX: &str = "Shape_";

/// Class name for `shape`: `Shape_` followed by 8 hex digits of the blake3
/// hash of its canonical form.
pub fn shape_class_name(shape: &ObjectShape) -> String {
    let canonical = tsharp_catalog::IrType::Object(shape.clone()).canonical();
    let hash = blake3::hash(canonical.as_bytes());
    let hex = hash.to_hex();
    format!("{}{}", PREFIX, &hex.as_str()[..8])
}

/// Shape classes of one module, keyed by name.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    classes: BTreeMap<String, CsClass>,
    /// Canonical form → class name, to skip rehashing.
    names: HashMap<String, String>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the class for `shape`, if it is already registered.
    pub fn lookup(&self, shape: &ObjectShape) -> Option<&str> {
        let canonical = tsharp_catalog::IrType::Object(shape.clone()).canonical();
        self.names.get(&canonical).map(String::as_str)
    }

    /// Record the class for `shape`. The first registration wins.
    pub fn insert(&mut self, shape: &ObjectShape, members: Vec<CsMember>) -> String {
        let canonical = tsharp_catalog::IrType::Object(shape.clone()).canonical();
        if let Some(name) = self.names.get(&canonical) {
            return name.clone();
        }
        let name = shape_class_name(shape);
        tracing::trace!(shape = %canonical, class = %name, "shape class");
        self.names.insert(canonical, name.clone());
        self.classes.entry(name.clone()).or_insert_with(|| CsClass {
            members,
            ..CsClass::new(vec!["public", "sealed"], name.clone())
        });
        name
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Registered classes in name order.
    pub fn into_decls(self) -> Vec<CsTypeDecl> {
        self.classes.into_values().map(CsTypeDecl::Class).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsharp_catalog::{IrType, PropertyShape};

    fn point(x: &str) -> ObjectShape {
        ObjectShape {
            properties: vec![
                PropertyShape {
                    name: x.to_string(),
                    ty: IrType::number(),
                    optional: false,
                    readonly: false,
                },
                PropertyShape {
                    name: "y".to_string(),
                    ty: IrType::number(),
                    optional: false,
                    readonly: false,
                },
            ],
        }
    }

    #[test]
    fn test_same_shape_same_class() {
        let mut shapes = ShapeRegistry::new();
        let a = shapes.insert(&point("x"), Vec::new());
        let b = shapes.insert(&point("x"), Vec::new());
        let c = shapes.insert(&point("z"), Vec::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(shapes.len(), 2);
        assert!(a.starts_with("Shape_") && a.len() == "Shape_".len() + 8);
    }

    #[test]
    fn test_name_is_stable() {
        assert_eq!(shape_class_name(&point("x")), shape_class_name(&point("x")));
    }
}
