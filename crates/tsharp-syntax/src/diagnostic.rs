//! Coded, recoverable user diagnostics.
//!
//! Every phase appends to a [`Diagnostics`] bag instead of failing. The bag
//! preserves insertion order so that two runs over identical input report
//! identical sequences.

use crate::span::{SourceSpan, Span};
use serde::Serialize;
use std::fmt;

/// Diagnostic codes, grouped by phase.
pub mod codes {
    // Catalog loading
    pub const MANIFEST_SKIPPED: &str = "TSH0001";
    pub const MISSING_STDLIB_TYPE: &str = "TSH0003";

    // Reading and binding
    pub const SYNTAX_ERROR: &str = "TSH1001";
    pub const UNRESOLVED_IMPORT: &str = "TSH1002";
    pub const UNRESOLVED_IDENTIFIER: &str = "TSH1003";

    // Type conversion
    pub const UNRESOLVED_TYPE: &str = "TSH2001";
    pub const TYPE_ARGUMENT_COUNT: &str = "TSH2002";
    pub const UNSUPPORTED_KEY_TYPE: &str = "TSH2003";
    pub const CIRCULAR_ALIAS: &str = "TSH2004";
    pub const INTERSECTION_ERASED: &str = "TSH2005";

    // Expressions and statements
    pub const UNSUPPORTED_EXPRESSION: &str = "TSH3001";
    pub const UNSUPPORTED_STATEMENT: &str = "TSH3002";
    pub const NO_MATCHING_OVERLOAD: &str = "TSH3003";
    pub const FRACTIONAL_INTEGRAL: &str = "TSH3004";
    pub const UNKNOWN_MEMBER: &str = "TSH3005";
    pub const BYREF_NOT_LOCAL: &str = "TSH3006";
    pub const UNSUPPORTED_YIELD: &str = "TSH3010";

    // Classes
    pub const VISIBILITY_NARROWED: &str = "TSH4001";
    pub const VISIBILITY_WIDENED: &str = "TSH4002";
    pub const INTERFACE_NOT_PUBLIC: &str = "TSH4003";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
            span: None,
            hint: None,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            hint: None,
        }
    }

    pub fn at(mut self, file: &str, span: Span) -> Self {
        if !span.is_dummy() {
            self.span = Some(SourceSpan::new(file, span));
        }
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(span) = &self.span {
            write!(f, "{}: ", span)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Whether any diagnostic carries `code`.
    pub fn contains_code(&self, code: &str) -> bool {
        self.items.iter().any(|d| d.code == code)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_span_and_hint() {
        let diag = Diagnostic::error(codes::UNRESOLVED_TYPE, "cannot find type 'Foo'")
            .at("main.ts", Span::new(4, 7, 1, 5))
            .with_hint("import it from its module");
        assert_eq!(
            diag.to_string(),
            "main.ts:1:5: error TSH2001: cannot find type 'Foo' (hint: import it from its module)"
        );
    }

    #[test]
    fn test_dummy_span_is_dropped() {
        let diag = Diagnostic::warning(codes::MANIFEST_SKIPPED, "bad").at("x.ts", Span::default());
        assert!(diag.span.is_none());
    }

    #[test]
    fn test_serialized_form() {
        let diag = Diagnostic::error(codes::UNRESOLVED_IMPORT, "cannot resolve './gone'")
            .at("main.ts", Span::new(0, 19, 1, 1));
        insta::assert_json_snapshot!(diag, @r#"
        {
          "code": "TSH1002",
          "severity": "error",
          "message": "cannot resolve './gone'",
          "span": {
            "file": "main.ts",
            "line": 1,
            "column": 1,
            "start": 0,
            "end": 19
          },
          "hint": null
        }
        "#);
    }

    #[test]
    fn test_bag_tracks_errors() {
        let mut bag = Diagnostics::new();
        bag.push(Diagnostic::warning(codes::VISIBILITY_WIDENED, "w"));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::error(codes::UNKNOWN_MEMBER, "e"));
        assert!(bag.has_errors());
        assert!(bag.contains_code("TSH3005"));
        assert_eq!(bag.len(), 2);
    }
}
