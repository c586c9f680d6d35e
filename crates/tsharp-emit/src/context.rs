//! The emitter's view of where it is.
//!
//! An [`EmitterContext`] is a value: lowering steps take one and hand back
//! the context that follows them. Nested scopes are entered on a clone and
//! folded back with [`EmitterContext::absorb`], which keeps the names the
//! nested scope allocated reserved for the rest of the method.

use crate::cs::CsType;
use crate::naming::{LocalNames, escape_identifier};
use std::collections::{BTreeSet, HashMap};

/// The enclosing generator body, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorScope {
    /// Local holding the exchange object.
    pub exchange: String,
    /// Type of `exchange.Input`.
    pub input: CsType,
    pub is_async: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitterContext {
    /// Function whose body is being lowered.
    pub function: String,
    /// Type nesting depth.
    pub indent: usize,
    /// Namespaces whose extension methods the file needs.
    pub usings: BTreeSet<String>,
    pub is_static: bool,
    pub is_async: bool,
    pub generator: Option<GeneratorScope>,
    pub type_params: Vec<String>,
    /// Type that `this` types stand for inside a class.
    pub self_type: Option<CsType>,
    /// Inside the module's static container class.
    pub in_container: bool,
    pub locals: LocalNames,
    scopes: Vec<HashMap<String, String>>,
}

impl EmitterContext {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            ..Self::default()
        }
    }

    /// Fresh method body: new local table, same type environment.
    pub fn for_member(&self, is_static: bool, is_async: bool) -> Self {
        Self {
            function: String::new(),
            indent: self.indent + 1,
            usings: self.usings.clone(),
            is_static,
            is_async,
            generator: None,
            type_params: self.type_params.clone(),
            self_type: self.self_type.clone(),
            in_container: self.in_container,
            locals: LocalNames::new(),
            scopes: vec![HashMap::new()],
        }
    }

    pub fn with_async(self, is_async: bool) -> Self {
        Self { is_async, ..self }
    }

    pub fn with_function(self, function: &str) -> Self {
        Self {
            function: function.to_string(),
            ..self
        }
    }

    /// Lambdas and local functions are never generator bodies.
    pub fn without_generator(self) -> Self {
        Self {
            generator: None,
            ..self
        }
    }

    pub fn with_generator(self, generator: GeneratorScope) -> Self {
        Self {
            generator: Some(generator),
            ..self
        }
    }

    pub fn with_self_type(self, self_type: CsType) -> Self {
        Self {
            self_type: Some(self_type),
            ..self
        }
    }

    pub fn in_container(self) -> Self {
        Self {
            in_container: true,
            ..self
        }
    }

    pub fn with_type_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_using(mut self, namespace: &str) -> Self {
        self.usings.insert(namespace.to_string());
        self
    }

    pub fn has_type_param(&self, name: &str) -> bool {
        self.type_params.iter().any(|p| p == name)
    }

    pub fn push_scope(mut self) -> Self {
        self.scopes.push(HashMap::new());
        self
    }

    /// Bind source name `name` to a fresh method-unique C# name.
    pub fn declare(mut self, name: &str) -> (Self, String) {
        let local = self.locals.allocate(name);
        self.bind(name, &local);
        (self, local)
    }

    /// Bind `name` to an existing C# name, reserving it.
    pub fn declare_as(mut self, name: &str, local: &str) -> Self {
        self.locals.reserve(local);
        self.bind(name, local);
        self
    }

    /// A name for compiler-introduced locals, never visible to source.
    pub fn temp(mut self, base: &str) -> (Self, String) {
        let local = self.locals.allocate(base);
        (self, local)
    }

    fn bind(&mut self, name: &str, local: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), local.to_string());
        }
    }

    /// C# name for a source local, innermost binding first.
    pub fn resolve(&self, name: &str) -> String {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
            .unwrap_or_else(|| escape_identifier(name))
    }

    /// Continue after a nested scope: keep this context's bindings but
    /// everything the nested one allocated or imported.
    pub fn absorb(mut self, inner: &EmitterContext) -> Self {
        self.locals.absorb(&inner.locals);
        self.usings.extend(inner.usings.iter().cloned());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_names_stay_reserved() {
        let ctx = EmitterContext::new();
        let (ctx, outer) = ctx.declare("x");
        let inner = ctx.clone().push_scope();
        let (inner, shadow) = inner.declare("x");
        assert_eq!(inner.resolve("x"), "x1");
        let ctx = ctx.absorb(&inner);
        assert_eq!(ctx.resolve("x"), outer);
        let (_, sibling) = ctx.declare("x");
        assert_eq!(shadow, "x1");
        assert_eq!(sibling, "x2");
    }

    #[test]
    fn test_unbound_names_are_escaped() {
        let ctx = EmitterContext::new();
        assert_eq!(ctx.resolve("base"), "@base");
        assert_eq!(ctx.resolve("$x"), "_x");
    }

    #[test]
    fn test_usings_flow_out_of_nested_scopes() {
        let ctx = EmitterContext::new();
        let inner = ctx.clone().push_scope().with_using("System.Linq");
        let ctx = ctx.absorb(&inner);
        assert!(ctx.usings.contains("System.Linq"));
    }
}
