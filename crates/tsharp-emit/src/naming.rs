//! Identifier safety and method-wide local name allocation.

use std::collections::HashSet;

/// C# reserved keywords. Contextual keywords (`var`, `value`, `async`...)
/// are valid identifiers and are not listed.
const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// A source identifier made safe for C#: `$` becomes `_` and reserved
/// words are prefixed with `@`.
pub fn escape_identifier(name: &str) -> String {
    let cleaned: String = name.chars().map(|c| if c == '$' { '_' } else { c }).collect();
    let cleaned = if cleaned.is_empty() { "_".to_string() } else { cleaned };
    if is_reserved(&cleaned) {
        format!("@{}", cleaned)
    } else {
        cleaned
    }
}

/// A dotted namespace or type path with every segment escaped
/// (`App.class.event` is `App.@class.@event`).
pub fn escape_qualified(path: &str) -> String {
    path.split('.').map(escape_identifier).collect::<Vec<_>>().join(".")
}

/// Names already taken in one method body, including every nested block
/// and lambda.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalNames {
    used: HashSet<String>,
}

impl LocalNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `base` if it is free, otherwise `base1`, `base2`... whichever
    /// is the smallest unused suffix.
    pub fn allocate(&mut self, base: &str) -> String {
        let base = escape_identifier(base);
        if self.used.insert(base.clone()) {
            return base;
        }
        let stem = base.trim_start_matches('@');
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{}{}", stem, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Mark `name` as taken without renaming it.
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(escape_identifier(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Take over every name `other` has allocated.
    pub fn absorb(&mut self, other: &LocalNames) {
        self.used.extend(other.used.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words_are_escaped() {
        assert_eq!(escape_identifier("class"), "@class");
        assert_eq!(escape_identifier("value"), "value");
        assert_eq!(escape_identifier("$el"), "_el");
    }

    #[test]
    fn test_qualified_paths_escape_each_segment() {
        assert_eq!(escape_qualified("App.class.event"), "App.@class.@event");
        assert_eq!(escape_qualified("App.@class"), "App.@class");
        assert_eq!(escape_qualified("System.Collections"), "System.Collections");
    }

    #[test]
    fn test_allocation_uses_smallest_free_suffix() {
        let mut names = LocalNames::new();
        assert_eq!(names.allocate("x"), "x");
        assert_eq!(names.allocate("x"), "x1");
        names.reserve("x3");
        assert_eq!(names.allocate("x"), "x2");
        assert_eq!(names.allocate("x"), "x4");
    }

    #[test]
    fn test_escaped_names_get_plain_suffixes() {
        let mut names = LocalNames::new();
        assert_eq!(names.allocate("event"), "@event");
        assert_eq!(names.allocate("event"), "event1");
    }
}
