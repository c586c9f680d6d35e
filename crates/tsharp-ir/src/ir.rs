//! The typed intermediate representation.
//!
//! Every [`IrExpression`] carries the [`IrType`] the builder computed for
//! it. The emitter reads these types and never recomputes them.

use tsharp_catalog::{EnumRepr, IrType, PassingMode, PrimitiveKind, TypeId, Visibility};
use tsharp_syntax::Span;
use tsharp_syntax::ast::UpdateOp;

// ============================================================================
// Modules and declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IrModule {
    /// Logical source path (`models/user.ts`).
    pub path: String,
    /// Target namespace (`App.models`).
    pub namespace: String,
    /// Static class holding module-level functions and variables.
    pub container: String,
    pub declarations: Vec<IrDeclaration>,
    /// Statements that run when the module initializes.
    pub top_level: Vec<IrStatement>,
    /// The program entry point; its top-level statements form `Main`.
    pub is_entry: bool,
    /// Top-level statements contain `await`.
    pub top_level_async: bool,
}

impl IrModule {
    pub fn classes(&self) -> impl Iterator<Item = &IrClass> {
        self.declarations.iter().filter_map(|d| match d {
            IrDeclaration::Class(class) => Some(class),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &IrFunction> {
        self.declarations.iter().filter_map(|d| match d {
            IrDeclaration::Function { function, .. } => Some(function),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrDeclaration {
    Class(IrClass),
    Interface(IrInterface),
    Enum(IrEnum),
    Function { function: IrFunction, exported: bool },
    Variable(IrVariable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrTypeParam {
    pub name: String,
    pub constraint: Option<IrType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrClass {
    pub id: TypeId,
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub base: Option<IrType>,
    pub interfaces: Vec<IrType>,
    pub members: Vec<IrClassMember>,
    pub is_abstract: bool,
    pub span: Span,
}

/// How a member relates to the member it inherits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrideModifier {
    #[default]
    None,
    Virtual,
    Override,
    /// Hides an inherited member.
    New,
    Abstract,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrClassMember {
    Property(IrProperty),
    Method(IrMethod),
    Constructor(IrConstructor),
}

/// A class property. With neither accessor body present it is an
/// auto-property.
#[derive(Debug, Clone, PartialEq)]
pub struct IrProperty {
    pub name: String,
    pub ty: IrType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub readonly: bool,
    pub modifier: OverrideModifier,
    pub init: Option<IrExpression>,
    pub getter: Option<Vec<IrStatement>>,
    pub setter: Option<IrSetter>,
}

impl IrProperty {
    pub fn is_auto(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrSetter {
    pub param: String,
    pub body: Vec<IrStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrMethod {
    pub function: IrFunction,
    pub visibility: Visibility,
    pub is_static: bool,
    pub modifier: OverrideModifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrConstructor {
    pub visibility: Visibility,
    pub params: Vec<IrParam>,
    /// Arguments of the leading `super(...)` call.
    pub base_args: Option<Vec<IrArgument>>,
    pub body: Vec<IrStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrInterface {
    pub id: TypeId,
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub extends: Vec<IrType>,
    pub members: Vec<IrInterfaceMember>,
    /// Property-only shapes are emitted as classes.
    pub as_class: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrInterfaceMember {
    Property {
        name: String,
        ty: IrType,
        optional: bool,
        readonly: bool,
    },
    Method {
        name: String,
        type_params: Vec<IrTypeParam>,
        params: Vec<IrParam>,
        ret: IrType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrEnum {
    pub id: TypeId,
    pub name: String,
    pub repr: EnumRepr,
    pub members: Vec<IrEnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrEnumMember {
    pub name: String,
    pub value: EnumValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrVariable {
    pub name: String,
    pub ty: IrType,
    pub init: Option<IrExpression>,
    pub is_const: bool,
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrParam {
    pub name: String,
    pub ty: IrType,
    pub mode: PassingMode,
    pub default: Option<IrExpression>,
    pub optional: bool,
    pub rest: bool,
}

/// Element types of a generator: what it yields, what it returns and what
/// `next` accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorInfo {
    pub yield_ty: IrType,
    pub return_ty: IrType,
    pub next_ty: IrType,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub type_params: Vec<IrTypeParam>,
    pub params: Vec<IrParam>,
    /// Declared result: `Task<T>` for async functions, the generator
    /// interface for generators.
    pub ret: IrType,
    /// `None` for abstract and interface members.
    pub body: Option<Vec<IrStatement>>,
    pub is_async: bool,
    pub generator: Option<GeneratorInfo>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum IrPattern {
    Ident {
        name: String,
        ty: IrType,
        default: Option<Box<IrExpression>>,
    },
    /// `ty` is the destructured value's type.
    Array {
        ty: IrType,
        elements: Vec<Option<IrPattern>>,
        rest: Option<Box<IrPattern>>,
    },
    Object {
        ty: IrType,
        props: Vec<(String, IrPattern)>,
    },
}

impl IrPattern {
    pub fn ident(name: impl Into<String>, ty: IrType) -> Self {
        IrPattern::Ident {
            name: name.into(),
            ty,
            default: None,
        }
    }

    pub fn ty(&self) -> &IrType {
        match self {
            IrPattern::Ident { ty, .. } | IrPattern::Array { ty, .. } | IrPattern::Object { ty, .. } => ty,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            IrPattern::Ident { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Where the value sent into a suspended generator goes.
#[derive(Debug, Clone, PartialEq)]
pub enum YieldReceive {
    /// `const x = yield e;`
    Declare { pattern: IrPattern, is_const: bool },
    /// `x = yield e;`
    Assign { target: IrExpression },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrCatch {
    pub param: Option<String>,
    pub body: Vec<IrStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrSwitchCase {
    /// `None` for `default:`.
    pub test: Option<IrExpression>,
    pub body: Vec<IrStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrStatement {
    VarDecl {
        pattern: IrPattern,
        init: Option<IrExpression>,
        is_const: bool,
    },
    Expr(IrExpression),
    Return(Option<IrExpression>),
    If {
        test: IrExpression,
        then: Vec<IrStatement>,
        otherwise: Option<Vec<IrStatement>>,
    },
    While {
        test: IrExpression,
        body: Vec<IrStatement>,
    },
    DoWhile {
        body: Vec<IrStatement>,
        test: IrExpression,
    },
    For {
        init: Vec<IrStatement>,
        test: Option<IrExpression>,
        update: Option<IrExpression>,
        body: Vec<IrStatement>,
    },
    ForOf {
        pattern: IrPattern,
        iterable: IrExpression,
        body: Vec<IrStatement>,
        is_await: bool,
    },
    /// Iterates the keys of a dictionary or the property names of a shape.
    ForIn {
        name: String,
        object: IrExpression,
        body: Vec<IrStatement>,
    },
    Block(Vec<IrStatement>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(IrExpression),
    Try {
        block: Vec<IrStatement>,
        catch: Option<IrCatch>,
        finally: Option<Vec<IrStatement>>,
    },
    Switch {
        discriminant: IrExpression,
        cases: Vec<IrSwitchCase>,
    },
    Yield {
        output: Option<IrExpression>,
        receive: Option<YieldReceive>,
        is_delegate: bool,
    },
    LocalFunction(IrFunction),
    /// Construct that could not be lowered; a diagnostic was reported.
    Unsupported(String),
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct IrExpression {
    pub kind: IrExpressionKind,
    pub ty: IrType,
    pub span: Span,
}

impl IrExpression {
    pub fn new(kind: IrExpressionKind, ty: IrType, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn unsupported(description: impl Into<String>, span: Span) -> Self {
        Self::new(IrExpressionKind::Unsupported(description.into()), IrType::Unknown, span)
    }

    pub fn is_local(&self) -> bool {
        matches!(self.kind, IrExpressionKind::Local(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrLiteral {
    /// Raw numeric text with the kind it was typed as.
    Number { raw: String, kind: PrimitiveKind },
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrTemplatePart {
    Text(String),
    Expr(IrExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrArgument {
    pub value: IrExpression,
    pub mode: PassingMode,
}

impl IrArgument {
    pub fn value(value: IrExpression) -> Self {
        Self {
            value,
            mode: PassingMode::Value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Coalesce,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrUnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LambdaBody {
    Block(Vec<IrStatement>),
    Expr(Box<IrExpression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrLambda {
    pub params: Vec<IrParam>,
    pub ret: IrType,
    pub body: LambdaBody,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrExpressionKind {
    Literal(IrLiteral),
    Template(Vec<IrTemplatePart>),
    Local(String),
    /// Function or variable of a module's static container.
    ModuleMember {
        namespace: String,
        container: String,
        name: String,
    },
    /// A type used as a value: the receiver of static members.
    TypeRef(IrType),
    This,
    Super,
    Member {
        object: Box<IrExpression>,
        name: String,
        optional: bool,
        /// Namespace to import for an extension method.
        extension: Option<String>,
    },
    StaticMember {
        owner: IrType,
        name: String,
    },
    Index {
        object: Box<IrExpression>,
        index: Box<IrExpression>,
        optional: bool,
    },
    Call {
        callee: Box<IrExpression>,
        type_args: Vec<IrType>,
        args: Vec<IrArgument>,
        optional: bool,
    },
    New {
        ty: IrType,
        args: Vec<IrArgument>,
    },
    Unary {
        op: IrUnaryOp,
        operand: Box<IrExpression>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<IrExpression>,
    },
    Binary {
        op: IrBinaryOp,
        left: Box<IrExpression>,
        right: Box<IrExpression>,
    },
    /// `op` is set for compound assignments.
    Assign {
        op: Option<IrBinaryOp>,
        target: Box<IrExpression>,
        value: Box<IrExpression>,
    },
    Conditional {
        test: Box<IrExpression>,
        then: Box<IrExpression>,
        otherwise: Box<IrExpression>,
    },
    ArrayLiteral(Vec<IrExpression>),
    Tuple(Vec<IrExpression>),
    ObjectLiteral(Vec<(String, IrExpression)>),
    Function(Box<IrLambda>),
    Await(Box<IrExpression>),
    Cast {
        expr: Box<IrExpression>,
        target: IrType,
    },
    NonNull(Box<IrExpression>),
    Spread(Box<IrExpression>),
    /// Runtime type test (`instanceof`, `typeof x === "string"`).
    Is {
        expr: Box<IrExpression>,
        target: IrType,
    },
    Unsupported(String),
}
