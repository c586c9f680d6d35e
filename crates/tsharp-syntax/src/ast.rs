//! TypeScript syntax tree.
//!
//! This is the parsed form handed to the rest of the compiler. It keeps every
//! annotation exactly as written; nothing here is resolved or typed. Syntax
//! that has no representation is kept as an `Unsupported` node so that later
//! phases can report it with a location instead of aborting the module.

use crate::span::Span;

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModule {
    /// Logical path relative to the source root, with forward slashes
    /// (e.g. `models/user.ts`).
    pub path: String,
    pub body: Vec<Stmt>,
}

impl SourceModule {
    pub fn new(path: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }

    /// Module path without the extension (`models/user`).
    pub fn stem(&self) -> &str {
        self.path
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.path)
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Var(VarDecl),
    Function(FunctionDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    TypeAlias(TypeAliasDecl),
    Enum(EnumDecl),
    Import(ImportDecl),
    /// `export { a, b as c };`
    ExportNamed(Vec<ExportSpecifier>),
    Expr(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForOf {
        binding: ForBinding,
        iterable: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    ForIn {
        binding: ForBinding,
        object: Expr,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expr),
    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Empty,
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarators: Vec<VarDeclarator>,
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub pattern: Pattern,
    pub ty: Option<TypeNode>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Left side of a `for..of` / `for..in` header. `kind` is `None` when the
/// loop assigns to an existing binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub kind: Option<VarKind>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident {
        name: String,
        default: Option<Box<Expr>>,
        span: Span,
    },
    Array {
        elements: Vec<Option<Pattern>>,
        rest: Option<Box<Pattern>>,
        span: Span,
    },
    Object {
        props: Vec<ObjectPatternProp>,
        rest: Option<String>,
        span: Span,
    },
}

impl Pattern {
    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Pattern::Ident {
            name: name.into(),
            default: None,
            span,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Pattern::Ident { span, .. }
            | Pattern::Array { span, .. }
            | Pattern::Object { span, .. } => *span,
        }
    }

    /// The bound name, if this is a plain identifier pattern.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Pattern::Ident { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Every name bound by the pattern, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Ident { name, .. } => out.push(name),
            Pattern::Array { elements, rest, .. } => {
                for element in elements.iter().flatten() {
                    element.collect_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Object { props, rest, .. } => {
                for prop in props {
                    prop.value.collect_names(out);
                }
                if let Some(rest) = rest {
                    out.push(rest);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProp {
    pub key: String,
    pub value: Pattern,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeNode>,
    pub default: Option<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Pattern,
    pub ty: Option<TypeNode>,
    pub optional: bool,
    pub rest: bool,
    pub default: Option<Expr>,
    /// Set on constructor parameter properties (`constructor(private x: T)`).
    pub accessibility: Option<Accessibility>,
    pub readonly: bool,
    pub span: Span,
}

impl Param {
    pub fn name(&self) -> Option<&str> {
        self.pattern.as_ident()
    }

    pub fn is_parameter_property(&self) -> bool {
        self.accessibility.is_some() || self.readonly
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    /// `None` for overload signatures.
    pub body: Option<Vec<Stmt>>,
    pub is_async: bool,
    pub is_generator: bool,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiers {
    pub accessibility: Option<Accessibility>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub readonly: bool,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<TypeNode>,
    pub implements: Vec<TypeNode>,
    pub members: Vec<ClassMember>,
    pub is_abstract: bool,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: ClassMemberKind,
    pub modifiers: Modifiers,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMemberKind {
    Property {
        name: String,
        ty: Option<TypeNode>,
        init: Option<Expr>,
        optional: bool,
    },
    Method {
        name: String,
        kind: MethodKind,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        body: Option<Vec<Stmt>>,
        is_generator: bool,
    },
    Constructor {
        params: Vec<Param>,
        body: Option<Vec<Stmt>>,
    },
    Unsupported(String),
}

impl ClassMember {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ClassMemberKind::Property { name, .. } | ClassMemberKind::Method { name, .. } => {
                Some(name)
            }
            ClassMemberKind::Constructor { .. } => Some("constructor"),
            ClassMemberKind::Unsupported(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeNode>,
    pub members: Vec<TypeMember>,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMember {
    pub kind: TypeMemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeMemberKind {
    Property {
        name: String,
        ty: Option<TypeNode>,
        optional: bool,
        readonly: bool,
    },
    Method {
        name: String,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_type: Option<TypeNode>,
        optional: bool,
    },
    /// `[key: K]: V`
    Index {
        key_name: String,
        key: TypeNode,
        value: TypeNode,
        readonly: bool,
    },
    Call {
        params: Vec<Param>,
        return_type: Option<TypeNode>,
    },
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeNode,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub is_const: bool,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: String,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    Named { imported: String, local: String },
    Default { local: String },
    Namespace { local: String },
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Default { local }
            | ImportSpecifier::Namespace { local } => local,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Ident(name.into()), span)
    }

    pub fn number(raw: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Number(raw.into()), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::String(value.into()), span)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal, raw source text.
    Number(String),
    String(String),
    Template(Vec<TemplatePart>),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    This,
    Super,
    Array(Vec<Expr>),
    Object(Vec<ObjectProp>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        type_args: Vec<TypeNode>,
        args: Vec<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        type_args: Vec<TypeNode>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Function(Box<FunctionExpr>),
    Await(Box<Expr>),
    Yield {
        argument: Option<Box<Expr>>,
        delegate: bool,
    },
    As {
        expr: Box<Expr>,
        ty: TypeNode,
    },
    NonNull(Box<Expr>),
    Spread(Box<Expr>),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProp {
    KeyValue { key: String, value: Expr },
    Shorthand { name: String, span: Span },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub body: FunctionBody,
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<Stmt>),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Nullish,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    InstanceOf,
    In,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "**" => BinaryOp::Exp,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNotEq,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "??" => BinaryOp::Nullish,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            ">>>" => BinaryOp::UShr,
            "instanceof" => BinaryOp::InstanceOf,
            "in" => BinaryOp::In,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::StrictEq
                | BinaryOp::StrictNotEq
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::InstanceOf
                | BinaryOp::In
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "!" => UnaryOp::Not,
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "~" => UnaryOp::BitNot,
            "typeof" => UnaryOp::TypeOf,
            "void" => UnaryOp::Void,
            "delete" => UnaryOp::Delete,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Nullish,
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Mod,
            "&=" => AssignOp::BitAnd,
            "|=" => AssignOp::BitOr,
            "^=" => AssignOp::BitXor,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            "??=" => AssignOp::Nullish,
            _ => return None,
        })
    }
}

// ============================================================================
// Type annotations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub span: Span,
}

impl TypeNode {
    pub fn new(kind: TypeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn keyword(keyword: TypeKeyword) -> Self {
        Self::new(TypeKind::Keyword(keyword), Span::default())
    }

    pub fn reference(name: impl Into<String>, args: Vec<TypeNode>) -> Self {
        Self::new(
            TypeKind::Reference {
                name: name.into(),
                args,
            },
            Span::default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Keyword(TypeKeyword),
    /// Named type, possibly dotted (`ns.Name`) and possibly generic.
    Reference {
        name: String,
        args: Vec<TypeNode>,
    },
    Array(Box<TypeNode>),
    Tuple(Vec<TupleElement>),
    Union(Vec<TypeNode>),
    Intersection(Vec<TypeNode>),
    Literal(LiteralType),
    Object(Vec<TypeMember>),
    Function {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        ret: Box<TypeNode>,
    },
    This,
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKeyword {
    Any,
    Unknown,
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
    Never,
    Object,
    BigInt,
    Symbol,
}

impl TypeKeyword {
    pub fn from_text(text: &str) -> Option<Self> {
        Some(match text {
            "any" => TypeKeyword::Any,
            "unknown" => TypeKeyword::Unknown,
            "number" => TypeKeyword::Number,
            "string" => TypeKeyword::String,
            "boolean" => TypeKeyword::Boolean,
            "void" => TypeKeyword::Void,
            "null" => TypeKeyword::Null,
            "undefined" => TypeKeyword::Undefined,
            "never" => TypeKeyword::Never,
            "object" => TypeKeyword::Object,
            "bigint" => TypeKeyword::BigInt,
            "symbol" => TypeKeyword::Symbol,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub name: Option<String>,
    pub ty: TypeNode,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralType {
    String(String),
    Number(String),
    Boolean(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_stem() {
        let module = SourceModule::new("models/user.ts", Vec::new());
        assert_eq!(module.stem(), "models/user");
    }

    #[test]
    fn test_pattern_bound_names() {
        let span = Span::default();
        let pattern = Pattern::Array {
            elements: vec![
                Some(Pattern::ident("a", span)),
                None,
                Some(Pattern::Object {
                    props: vec![ObjectPatternProp {
                        key: "x".into(),
                        value: Pattern::ident("b", span),
                    }],
                    rest: Some("others".into()),
                    span,
                }),
            ],
            rest: Some(Box::new(Pattern::ident("tail", span))),
            span,
        };
        assert_eq!(pattern.bound_names(), vec!["a", "b", "others", "tail"]);
    }

    #[test]
    fn test_operator_tokens() {
        assert_eq!(BinaryOp::from_token("??"), Some(BinaryOp::Nullish));
        assert_eq!(AssignOp::from_token("+="), Some(AssignOp::Add));
        assert_eq!(UnaryOp::from_token("typeof"), Some(UnaryOp::TypeOf));
        assert!(BinaryOp::from_token("=>").is_none());
        assert!(BinaryOp::Nullish.is_logical());
    }
}
