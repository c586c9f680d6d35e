//! Parser for manifest type strings.
//!
//! Grammar:
//!
//! ```text
//! type  := name args? suffix*
//! name  := ident ('.' ident)* ('`' digits)?
//! args  := '<' type (',' type)* '>'
//! suffix:= '[]' | '?'
//! ```
//!
//! Examples: `System.Int32`, `T[]`, ``System.Collections.Generic.Dictionary`2<TKey, TValue>``,
//! `System.Int32?`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference `{input}` at {offset}: {message}")]
pub struct TypeRefError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

pub fn parse_type_ref(input: &str) -> Result<TypeRef, TypeRefError> {
    let mut parser = Parser {
        input,
        bytes: input.as_bytes(),
        pos: 0,
    };
    let ty = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(ty)
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> TypeRefError {
        TypeRefError {
            input: self.input.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_type(&mut self) -> Result<TypeRef, TypeRefError> {
        let name = self.parse_name()?;
        let mut args = Vec::new();
        if self.eat(b'<') {
            loop {
                args.push(self.parse_type()?);
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b'>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        let mut ty = TypeRef::Named { name, args };
        loop {
            if self.eat(b'[') {
                if !self.eat(b']') {
                    return Err(self.error("expected ']'"));
                }
                ty = TypeRef::Array(Box::new(ty));
            } else if self.eat(b'?') {
                ty = TypeRef::Nullable(Box::new(ty));
            } else {
                break;
            }
        }
        Ok(ty)
    }

    fn parse_name(&mut self) -> Result<String, TypeRefError> {
        self.skip_ws();
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'`' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name = &self.input[start..self.pos];
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
            return Err(self.error("expected type name"));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    #[test]
    fn test_generic_with_suffixes() {
        let ty = parse_type_ref("System.Collections.Generic.Dictionary`2<System.String, T[]>?").unwrap();
        assert_eq!(
            ty,
            TypeRef::Nullable(Box::new(named(
                "System.Collections.Generic.Dictionary`2",
                vec![
                    named("System.String", vec![]),
                    TypeRef::Array(Box::new(named("T", vec![]))),
                ]
            )))
        );
    }

    #[test]
    fn test_errors_report_offset() {
        let err = parse_type_ref("List`1<T").unwrap_err();
        assert_eq!(err.offset, 8);
        assert!(parse_type_ref("").is_err());
        assert!(parse_type_ref("A B").is_err());
    }
}
