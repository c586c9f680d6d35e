//! Source locations.

use serde::Serialize;

/// Byte range plus 1-based line/column of the start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        if other.start < self.start {
            return other.to(self);
        }
        Span {
            start: self.start,
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

/// A span tied to the logical path of the module it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub start: u32,
    pub end: u32,
}

impl SourceSpan {
    pub fn new(file: impl Into<String>, span: Span) -> Self {
        Self {
            file: file.into(),
            line: span.line,
            column: span.column,
            start: span.start,
            end: span.end,
        }
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_join_orders_operands() {
        let a = Span::new(10, 14, 2, 3);
        let b = Span::new(2, 6, 1, 3);
        let joined = a.to(b);
        assert_eq!(joined.start, 2);
        assert_eq!(joined.end, 14);
        assert_eq!(joined.line, 1);
    }

    #[test]
    fn test_source_span_display() {
        let span = SourceSpan::new("models/user.ts", Span::new(0, 4, 3, 7));
        assert_eq!(span.to_string(), "models/user.ts:3:7");
    }
}
