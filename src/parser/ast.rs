// AST node definitions for the template language

use crate::name::Name;
use crate::span::Span;

/// Top-level AST: a list of statements
#[derive(Debug, Clone)]
pub struct Ast {
    pub stmts: Vec<Stmt>,
}

/// A statement with source span
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// A type name as written in the template. Resolution against the type
/// tables happens at evaluation time; `Struct`/`Enum`/`Unsigned` carry the
/// keyword so lookup uses the prefixed key (`"struct Foo"`, ...).
#[derive(Debug, Clone, Copy)]
pub struct TypeName {
    pub kind: TypeNameKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub enum TypeNameKind {
    /// Plain identifier: `uint32`, `MyTypedef`
    Plain(Name),
    /// `struct NAME`
    Struct(Name),
    /// `enum NAME`
    Enum(Name),
    /// `unsigned NAME`
    Unsigned(Name),
    /// `void` (function return types only)
    Void,
}

// --- Boxed payload structs for large StmtKind variants ---

/// Buffer-binding variable definition: `TYPE NAME(args)? ([len])? ;`
#[derive(Debug, Clone)]
pub struct VarDefData {
    pub ty: TypeName,
    pub name: Name,
    pub args: Vec<Expr>,
    pub array_len: Option<Expr>,
}

/// Local in-memory variable: `local TYPE NAME ([len])? (= expr)? ;`
#[derive(Debug, Clone)]
pub struct LocalVarDefData {
    pub ty: TypeName,
    pub name: Name,
    pub array_len: Option<Expr>,
    pub init: Option<Expr>,
}

/// Immediate instantiation attached to a struct/enum definition:
/// `... } NAME(args)? ([len])? ;`
#[derive(Debug, Clone)]
pub struct InstanceDecl {
    pub name: Name,
    pub args: Vec<Expr>,
    pub array_len: Option<Expr>,
    pub span: Span,
}

/// A declared parameter: `TYPE NAME`
#[derive(Debug, Clone, Copy)]
pub struct ParamDecl {
    pub ty: TypeName,
    pub name: Name,
    pub span: Span,
}

/// Struct definition, covering all four grammar forms
/// (anonymous vs named, plain vs typedef).
#[derive(Debug, Clone)]
pub struct StructDefData {
    /// Tag name after `struct`; None for anonymous structs
    pub tag: Option<Name>,
    /// Alias name of the `typedef struct { ... } NAME;` form
    pub typedef_name: Option<Name>,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
    pub instance: Option<InstanceDecl>,
}

#[derive(Debug, Clone)]
pub struct EnumMemberDecl {
    pub name: Name,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDefData {
    /// `<TYPE>` underlying type; defaults to `int`
    pub underlying: Option<TypeName>,
    pub tag: Option<Name>,
    pub is_typedef: bool,
    /// Alias name of the `typedef enum { ... } NAME;` form
    pub typedef_name: Option<Name>,
    pub members: Vec<EnumMemberDecl>,
    pub instance: Option<InstanceDecl>,
}

/// `typedef TYPE NAME;`
#[derive(Debug, Clone)]
pub struct TypedefData {
    pub ty: TypeName,
    pub name: Name,
}

#[derive(Debug, Clone)]
pub struct FuncDefData {
    pub return_ty: TypeName,
    pub name: Name,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct IfData {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    /// `else` branch; `else if` chains nest another `If` here
    pub else_body: Option<Vec<Stmt>>,
}

/// `for` loop; `while (E) S` is lowered to `for (; E; ) S` by the parser.
#[derive(Debug, Clone)]
pub struct ForData {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum CaseLabel {
    Value(Expr),
    Default,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub label: CaseLabel,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchData {
    pub scrutinee: Expr,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    VarDef(Box<VarDefData>),
    LocalVarDef(Box<LocalVarDefData>),
    StructDef(Box<StructDefData>),
    EnumDef(Box<EnumDefData>),
    Typedef(Box<TypedefData>),
    FuncDef(Box<FuncDefData>),
    If(Box<IfData>),
    For(Box<ForData>),
    Switch(Box<SwitchData>),
    Break,
    Continue,
    Return(Option<Expr>),
    ExprStmt(Expr),
    Empty,
}

/// Expression with source span. Only precedence-correct trees appear in
/// the final AST; the flat capture below is folded before statements are
/// assembled.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i128),
    StringLiteral(String),
    /// Variable reference: `NAME (. NAME | [ EXPR ])*`
    Path(Box<PathExpr>),
    Call {
        name: Name,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct PathExpr {
    pub head: Name,
    pub segments: Vec<PathSeg>,
}

#[derive(Debug, Clone)]
pub enum PathSeg {
    Member(Name),
    Index(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogAnd,
    LogOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    LogNot,
    BitNot,
}

// --- Flat expression capture ---

/// A raw expression as captured by the parser: operands and operator
/// symbols in source order, before precedence folding.
#[derive(Debug, Clone)]
pub struct RawExpr {
    pub items: Vec<RawItem>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum RawItem {
    Operand(Expr),
    Op(OpSym, Span),
}

/// Operator symbols as they appear in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpSym {
    Not,
    BitNot,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogAnd,
    LogOr,
    Assign,
}
