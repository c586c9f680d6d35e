//! Lexical scopes for locals.

use std::collections::HashMap;

/// Stack of block scopes mapping source names to `V`.
///
/// Lookup walks from the innermost scope outward. Module-level and global
/// names are not stored here; callers fall back to
/// [`Bindings::lookup_value`](crate::Bindings::lookup_value) when a name is
/// not found.
#[derive(Debug, Clone)]
pub struct ScopeStack<V> {
    scopes: Vec<HashMap<String, V>>,
}

impl<V> Default for ScopeStack<V> {
    fn default() -> Self {
        Self { scopes: Vec::new() }
    }
}

impl<V> ScopeStack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in the innermost scope, opening one if none exists.
    pub fn declare(&mut self, name: impl Into<String>, value: V) {
        if self.scopes.is_empty() {
            self.push();
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut V> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Run `f` inside a fresh scope.
    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push();
        let result = f(self);
        self.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", 1);
        let inner = scopes.scoped(|s| {
            s.declare("x", 2);
            *s.lookup("x").unwrap()
        });
        assert_eq!(inner, 2);
        assert_eq!(scopes.lookup("x"), Some(&1));
        assert_eq!(scopes.lookup("y"), None);
    }
}
