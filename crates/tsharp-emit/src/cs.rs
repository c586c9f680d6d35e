//! C# syntax tree.
//!
//! Only the subset of C# the emitter produces. Types and member names are
//! stored already qualified and escaped; the printer adds no decisions of
//! its own apart from layout.

use std::fmt;

// ============================================================================
// Files and type declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CsFile {
    pub usings: Vec<String>,
    pub namespace: String,
    pub types: Vec<CsTypeDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsTypeDecl {
    Class(CsClass),
    Interface(CsInterface),
    Enum(CsEnum),
}

impl CsTypeDecl {
    pub fn name(&self) -> &str {
        match self {
            CsTypeDecl::Class(c) => &c.name,
            CsTypeDecl::Interface(i) => &i.name,
            CsTypeDecl::Enum(e) => &e.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsTypeParam {
    pub name: String,
    pub constraints: Vec<CsType>,
}

impl CsTypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsClass {
    /// `public sealed`, `public static`, `public abstract`...
    pub modifiers: Vec<&'static str>,
    pub name: String,
    pub type_params: Vec<CsTypeParam>,
    pub bases: Vec<CsType>,
    pub members: Vec<CsMember>,
}

impl CsClass {
    pub fn new(modifiers: Vec<&'static str>, name: impl Into<String>) -> Self {
        Self {
            modifiers,
            name: name.into(),
            type_params: Vec::new(),
            bases: Vec::new(),
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsInterface {
    pub modifiers: Vec<&'static str>,
    pub name: String,
    pub type_params: Vec<CsTypeParam>,
    pub bases: Vec<CsType>,
    pub members: Vec<CsMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsEnum {
    pub modifiers: Vec<&'static str>,
    pub name: String,
    pub members: Vec<(String, Option<CsExpr>)>,
}

// ============================================================================
// Members
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum CsMember {
    Field(CsField),
    Property(CsProperty),
    Method(CsMethod),
    Constructor(CsConstructor),
    Type(CsTypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsField {
    pub modifiers: Vec<&'static str>,
    pub ty: CsType,
    pub name: String,
    pub init: Option<CsExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsAccessor {
    /// `get;` / `set;` / `init;`
    Auto,
    Body(Vec<CsStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsProperty {
    pub modifiers: Vec<&'static str>,
    pub ty: CsType,
    pub name: String,
    pub getter: Option<CsAccessor>,
    pub setter: Option<CsAccessor>,
    /// Setter keyword is `init` instead of `set`.
    pub init_only: bool,
    pub init: Option<CsExpr>,
}

impl CsProperty {
    pub fn auto(modifiers: Vec<&'static str>, ty: CsType, name: impl Into<String>) -> Self {
        Self {
            modifiers,
            ty,
            name: name.into(),
            getter: Some(CsAccessor::Auto),
            setter: Some(CsAccessor::Auto),
            init_only: false,
            init: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsParam {
    /// `ref`, `out`, `in`, `params` or `this`.
    pub modifier: Option<&'static str>,
    pub ty: CsType,
    pub name: String,
    pub default: Option<CsExpr>,
}

impl CsParam {
    pub fn new(ty: CsType, name: impl Into<String>) -> Self {
        Self {
            modifier: None,
            ty,
            name: name.into(),
            default: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsMethod {
    pub modifiers: Vec<&'static str>,
    pub ret: CsType,
    pub name: String,
    pub type_params: Vec<CsTypeParam>,
    pub params: Vec<CsParam>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<CsStmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsConstructor {
    pub modifiers: Vec<&'static str>,
    pub name: String,
    pub params: Vec<CsParam>,
    pub base_args: Option<Vec<CsArg>>,
    pub body: Vec<CsStmt>,
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CsType {
    /// `int`, `string`, `object`, `void`, `dynamic`...
    Keyword(&'static str),
    /// Qualified or type-parameter name with optional type arguments.
    Named { name: String, args: Vec<CsType> },
    Array(Box<CsType>),
    Tuple(Vec<CsType>),
    Nullable(Box<CsType>),
}

impl CsType {
    pub fn named(name: impl Into<String>) -> Self {
        CsType::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<CsType>) -> Self {
        CsType::Named {
            name: name.into(),
            args,
        }
    }

    pub fn object() -> Self {
        CsType::Keyword("object")
    }

    pub fn void() -> Self {
        CsType::Keyword("void")
    }

    /// `T?`. Already nullable types are returned unchanged, so `T??` never
    /// appears.
    pub fn nullable(self) -> Self {
        match self {
            CsType::Nullable(_) => self,
            CsType::Keyword("void") | CsType::Keyword("dynamic") => self,
            other => CsType::Nullable(Box::new(other)),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, CsType::Nullable(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CsType::Keyword("void"))
    }

    /// The type without a trailing `?`.
    pub fn non_nullable(&self) -> &CsType {
        match self {
            CsType::Nullable(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for CsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsType::Keyword(k) => f.write_str(k),
            CsType::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            CsType::Array(elem) => write!(f, "{}[]", elem),
            CsType::Tuple(elements) => {
                f.write_str("(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", elem)?;
                }
                f.write_str(")")
            }
            CsType::Nullable(inner) => write!(f, "{}?", inner),
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CsCatch {
    pub ty: Option<CsType>,
    pub name: Option<String>,
    pub body: Vec<CsStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsSwitchSection {
    /// `None` is the `default:` label.
    pub labels: Vec<Option<CsExpr>>,
    pub body: Vec<CsStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsStmt {
    Expr(CsExpr),
    Local {
        ty: CsType,
        name: String,
        init: Option<CsExpr>,
    },
    Return(Option<CsExpr>),
    If {
        test: CsExpr,
        then: Vec<CsStmt>,
        otherwise: Option<Vec<CsStmt>>,
    },
    While {
        test: CsExpr,
        body: Vec<CsStmt>,
    },
    DoWhile {
        body: Vec<CsStmt>,
        test: CsExpr,
    },
    For {
        /// At most one local declaration or a list of expressions.
        init: Vec<CsStmt>,
        test: Option<CsExpr>,
        update: Vec<CsExpr>,
        body: Vec<CsStmt>,
    },
    ForEach {
        ty: CsType,
        name: String,
        iterable: CsExpr,
        body: Vec<CsStmt>,
        is_await: bool,
    },
    Block(Vec<CsStmt>),
    Break,
    Continue,
    Throw(Option<CsExpr>),
    Try {
        block: Vec<CsStmt>,
        catches: Vec<CsCatch>,
        finally: Option<Vec<CsStmt>>,
    },
    Switch {
        subject: CsExpr,
        sections: Vec<CsSwitchSection>,
    },
    YieldReturn(CsExpr),
    YieldBreak,
    LocalFunction(CsMethod),
    /// Pre-rendered runtime glue, printed line by line.
    Verbatim(String),
}

impl CsStmt {
    pub fn expr(e: CsExpr) -> Self {
        CsStmt::Expr(e)
    }

    pub fn local(ty: CsType, name: impl Into<String>, init: Option<CsExpr>) -> Self {
        CsStmt::Local {
            ty,
            name: name.into(),
            init,
        }
    }

    /// Whether control never falls through the end of this statement.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            CsStmt::Return(_) | CsStmt::Break | CsStmt::Continue | CsStmt::Throw(_) | CsStmt::YieldBreak
        )
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CsArg {
    pub modifier: Option<&'static str>,
    pub value: CsExpr,
}

impl CsArg {
    pub fn new(value: CsExpr) -> Self {
        Self { modifier: None, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsInterpolation {
    Text(String),
    Expr(CsExpr),
}

/// One entry of an object or collection initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum CsInit {
    /// `Name = value`
    Named(String, CsExpr),
    /// `[key] = value`
    Keyed(CsExpr, CsExpr),
    /// Collection element.
    Item(CsExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsLambdaBody {
    Expr(Box<CsExpr>),
    Block(Vec<CsStmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CsExpr {
    /// Literal already in C# spelling (`42L`, `"a"`, `null`).
    Literal(String),
    Ident(String),
    /// A type used as an expression (static member receiver).
    Type(CsType),
    This,
    Base,
    Member {
        object: Box<CsExpr>,
        name: String,
        conditional: bool,
    },
    Index {
        object: Box<CsExpr>,
        index: Box<CsExpr>,
        conditional: bool,
    },
    Call {
        callee: Box<CsExpr>,
        type_args: Vec<CsType>,
        args: Vec<CsArg>,
    },
    New {
        ty: CsType,
        args: Vec<CsArg>,
        initializer: Option<Vec<CsInit>>,
    },
    /// `new T[] { ... }` or `new T[n]`.
    NewArray {
        elem: CsType,
        size: Option<Box<CsExpr>>,
        items: Vec<CsExpr>,
    },
    /// `[a, ..b]`, given a target type by a cast.
    Collection {
        ty: CsType,
        items: Vec<CsExpr>,
    },
    Spread(Box<CsExpr>),
    Unary {
        op: &'static str,
        operand: Box<CsExpr>,
        postfix: bool,
    },
    Binary {
        op: &'static str,
        left: Box<CsExpr>,
        right: Box<CsExpr>,
    },
    Assign {
        op: &'static str,
        target: Box<CsExpr>,
        value: Box<CsExpr>,
    },
    Conditional {
        test: Box<CsExpr>,
        then: Box<CsExpr>,
        otherwise: Box<CsExpr>,
    },
    Lambda {
        is_async: bool,
        params: Vec<CsParam>,
        body: CsLambdaBody,
    },
    Cast {
        ty: CsType,
        expr: Box<CsExpr>,
    },
    Is {
        expr: Box<CsExpr>,
        ty: CsType,
    },
    Await(Box<CsExpr>),
    Interpolated(Vec<CsInterpolation>),
    Tuple(Vec<CsExpr>),
    /// `x!`
    NullForgiving(Box<CsExpr>),
    /// `default` or `default(T)`.
    Default(Option<CsType>),
    Throw(Box<CsExpr>),
    Verbatim(String),
}

impl CsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        CsExpr::Ident(name.into())
    }

    pub fn string(value: &str) -> Self {
        CsExpr::Literal(string_literal(value))
    }

    pub fn member(object: CsExpr, name: impl Into<String>) -> Self {
        CsExpr::Member {
            object: Box::new(object),
            name: name.into(),
            conditional: false,
        }
    }

    pub fn call(callee: CsExpr, args: Vec<CsExpr>) -> Self {
        CsExpr::Call {
            callee: Box::new(callee),
            type_args: Vec::new(),
            args: args.into_iter().map(CsArg::new).collect(),
        }
    }

    pub fn new_object(ty: CsType, args: Vec<CsExpr>) -> Self {
        CsExpr::New {
            ty,
            args: args.into_iter().map(CsArg::new).collect(),
            initializer: None,
        }
    }

    pub fn assign(target: CsExpr, value: CsExpr) -> Self {
        CsExpr::Assign {
            op: "=",
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn binary(left: CsExpr, op: &'static str, right: CsExpr) -> Self {
        CsExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn cast(ty: CsType, expr: CsExpr) -> Self {
        CsExpr::Cast {
            ty,
            expr: Box::new(expr),
        }
    }

    /// Whether C# accepts this expression as a statement on its own.
    pub fn is_statement_expression(&self) -> bool {
        match self {
            CsExpr::Call { .. } | CsExpr::New { .. } | CsExpr::Assign { .. } | CsExpr::Await(_) => true,
            CsExpr::Unary { op, .. } => matches!(*op, "++" | "--"),
            _ => false,
        }
    }
}

/// `"text"` with C# escapes.
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    out.push_str(&escape_text(value));
    out.push('"');
    out
}

/// Escape text for a regular (non-verbatim) string literal.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_is_never_doubled() {
        let ty = CsType::Keyword("int").nullable().nullable();
        assert_eq!(ty.to_string(), "int?");
        assert_eq!(CsType::void().nullable().to_string(), "void");
    }

    #[test]
    fn test_generic_type_display() {
        let ty = CsType::generic(
            "global::System.Collections.Generic.Dictionary",
            vec![CsType::Keyword("string"), CsType::Array(Box::new(CsType::Keyword("int")))],
        );
        assert_eq!(ty.to_string(), "global::System.Collections.Generic.Dictionary<string, int[]>");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string_literal("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }
}
