//! Surface spelling to canonical identity.

use crate::type_id::{TypeId, strip_arity};
use std::collections::HashMap;

/// Every spelling under which a nominal type may be named.
///
/// For ``System.Collections.Generic.List`1`` that is ``List`1``, `List_1`,
/// `List_1$instance`, the qualified forms of each and the bare simple name
/// `List`. Bare names are first-come: a later type with the same simple name
/// is still reachable through its metadata or qualified spellings.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_name: HashMap<String, TypeId>,
    by_arity: HashMap<(String, usize), TypeId>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register all spellings of `id`.
    pub fn register(&mut self, id: &TypeId) {
        let namespace = id.namespace().to_string();
        let metadata = id.metadata_name().to_string();
        let simple = id.simple_name().to_string();
        let arity = id.arity();

        let mut local = vec![metadata.clone()];
        if arity > 0 {
            let mangled = format!("{}_{}", simple, arity);
            local.push(format!("{}$instance", mangled));
            local.push(mangled);
        } else {
            local.push(format!("{}$instance", simple));
        }

        for name in &local {
            self.insert(name.clone(), id);
            if !namespace.is_empty() {
                self.insert(format!("{}.{}", namespace, name), id);
            }
        }

        self.by_name.entry(simple.clone()).or_insert_with(|| id.clone());
        if !namespace.is_empty() {
            self.by_name
                .entry(format!("{}.{}", namespace, simple))
                .or_insert_with(|| id.clone());
        }
        self.by_arity
            .entry((simple.clone(), arity))
            .or_insert_with(|| id.clone());
        if !namespace.is_empty() {
            self.by_arity
                .entry((format!("{}.{}", namespace, simple), arity))
                .or_insert_with(|| id.clone());
        }
    }

    /// Register only namespace-qualified spellings. Source types use this so
    /// that their bare names resolve through imports alone.
    pub fn register_qualified(&mut self, id: &TypeId) {
        let namespace = id.namespace();
        if namespace.is_empty() {
            return;
        }
        let qualified = id.qualified_name();
        self.insert(id.platform_name.to_string(), id);
        if id.arity() > 0 {
            self.insert(format!("{}_{}", qualified, id.arity()), id);
        }
        self.by_name.entry(qualified.clone()).or_insert_with(|| id.clone());
        self.by_arity
            .entry((qualified, id.arity()))
            .or_insert_with(|| id.clone());
    }

    /// Register an extra spelling, such as a keyword (`number`, `double`).
    pub fn register_spelling(&mut self, spelling: &str, id: &TypeId) {
        self.insert(spelling.to_string(), id);
    }

    fn insert(&mut self, spelling: String, id: &TypeId) {
        if let Some(existing) = self.by_name.get(&spelling) {
            if existing != id {
                tracing::trace!(%spelling, kept = %existing.platform_name, dropped = %id.platform_name, "alias already taken");
            }
            return;
        }
        self.by_name.insert(spelling, id.clone());
    }

    pub fn resolve(&self, spelling: &str) -> Option<&TypeId> {
        self.by_name.get(spelling)
    }

    /// Resolve a generic name by how many type arguments it is given
    /// (`List` with one argument is ``List`1``).
    pub fn resolve_with_arity(&self, spelling: &str, arity: usize) -> Option<&TypeId> {
        let base = strip_arity(spelling);
        self.by_arity
            .get(&(base.to_string(), arity))
            .or_else(|| self.by_name.get(spelling).filter(|id| id.arity() == arity))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_spelling_resolves_to_one_id() {
        let list = TypeId::new("List", "System.Collections.Generic.List`1");
        let mut table = AliasTable::new();
        table.register(&list);

        for spelling in [
            "List",
            "List`1",
            "List_1",
            "List_1$instance",
            "System.Collections.Generic.List",
            "System.Collections.Generic.List`1",
            "System.Collections.Generic.List_1",
        ] {
            assert_eq!(table.resolve(spelling), Some(&list), "{}", spelling);
        }
    }

    #[test]
    fn test_first_simple_name_wins() {
        let sys = TypeId::new("Task", "System.Threading.Tasks.Task");
        let other = TypeId::new("Task", "Acme.Task");
        let mut table = AliasTable::new();
        table.register(&sys);
        table.register(&other);
        assert_eq!(table.resolve("Task"), Some(&sys));
        assert_eq!(table.resolve("Acme.Task"), Some(&other));
    }

    #[test]
    fn test_qualified_registration_skips_bare_name() {
        let user = TypeId::new("User", "App.models.User");
        let mut table = AliasTable::new();
        table.register_qualified(&user);
        assert_eq!(table.resolve("App.models.User"), Some(&user));
        assert_eq!(table.resolve("User"), None);
    }

    #[test]
    fn test_resolve_by_arity() {
        let task = TypeId::new("Task", "System.Threading.Tasks.Task");
        let task_of = TypeId::new("Task", "System.Threading.Tasks.Task`1");
        let mut table = AliasTable::new();
        table.register(&task);
        table.register(&task_of);
        assert_eq!(table.resolve_with_arity("Task", 0), Some(&task));
        assert_eq!(table.resolve_with_arity("Task", 1), Some(&task_of));
        assert_eq!(table.resolve_with_arity("Task", 2), None);
    }
}
