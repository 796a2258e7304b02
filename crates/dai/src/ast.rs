//! Abstract syntax tree: statement and expression node types.
//!
//! Every node carries a [`NodeMeta`]: its span and the indices of its first
//! and last token in the [`TokenList`][crate::token_list::TokenList] it was
//! parsed from, so the formatter can walk the original token stream and
//! interleave comments. Composite nodes own their children outright (`Box`
//! for single children, `Vec`/`SmallVec` for lists); there is no shared
//! ownership and no `recursive` destruction flag to thread through, since
//! drop glue already tears a subtree down exactly once.

use crate::position::Span;
use smallvec::SmallVec;

/// Span plus the token-index range `[first_token, last_token]` (inclusive)
/// a node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeMeta {
    pub span: Span,
    pub first_token: usize,
    pub last_token: usize,
}

impl NodeMeta {
    #[must_use]
    pub const fn new(span: Span, first_token: usize, last_token: usize) -> Self {
        Self { span, first_token, last_token }
    }

    /// Merges two metas into one spanning both, keeping `self`'s first token
    /// and `other`'s last token. Used when a parse function combines a
    /// left-hand subtree with a token or subtree that follows it.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        Self { span: self.span.join(other.span), first_token: self.first_token, last_token: other.last_token }
    }
}

/// The root of a parsed source file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A function or method parameter name.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// `-x`
    Neg,
    /// `!x`
    Bang,
    /// `not x`
    Not,
    /// `~x`
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    NotEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl InfixOp {
    /// The source spelling, used by the formatter to re-emit the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::And => "and",
            Self::Or => "or",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

impl AssignOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::AsteriskAssign => "*=",
            Self::SlashAssign => "/=",
        }
    }
}

impl PrefixOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Bang => "!",
            Self::Not => "not ",
            Self::BitNot => "~",
        }
    }
}

// ---------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Stmt {
    Var(VarStmt),
    Return(ReturnStmt),
    Expr(ExprStmt),
    If(IfStmt),
    Block(BlockStmt),
    Assign(AssignStmt),
    FnDecl(FnDeclStmt),
    ClassDecl(ClassDeclStmt),
    InstanceVar(InstanceVarStmt),
    Method(MethodStmt),
    ClassVar(ClassVarStmt),
    ClassMethod(ClassMethodStmt),
    While(WhileStmt),
    Continue(NodeMeta),
    Break(NodeMeta),
    ForIn(ForInStmt),
}

impl Stmt {
    #[must_use]
    pub const fn meta(&self) -> NodeMeta {
        match self {
            Self::Var(s) => s.meta,
            Self::Return(s) => s.meta,
            Self::Expr(s) => s.meta,
            Self::If(s) => s.meta,
            Self::Block(s) => s.meta,
            Self::Assign(s) => s.meta,
            Self::FnDecl(s) => s.meta,
            Self::ClassDecl(s) => s.meta,
            Self::InstanceVar(s) => s.meta,
            Self::Method(s) => s.meta,
            Self::ClassVar(s) => s.meta,
            Self::ClassMethod(s) => s.meta,
            Self::While(s) => s.meta,
            Self::Continue(m) | Self::Break(m) => *m,
            Self::ForIn(s) => s.meta,
        }
    }

    /// Whether this statement kind is allowed directly inside a class body.
    #[must_use]
    pub const fn is_class_member(&self) -> bool {
        matches!(self, Self::InstanceVar(_) | Self::Method(_) | Self::ClassVar(_) | Self::ClassMethod(_))
    }
}

#[derive(Debug, Clone)]
pub struct VarStmt {
    pub meta: NodeMeta,
    pub is_con: bool,
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub meta: NodeMeta,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub meta: NodeMeta,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct ElifClause {
    pub meta: NodeMeta,
    pub condition: Expr,
    pub consequence: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub meta: NodeMeta,
    pub condition: Expr,
    pub consequence: BlockStmt,
    pub elifs: Vec<ElifClause>,
    pub alternative: Option<BlockStmt>,
}

#[derive(Debug, Clone)]
pub struct BlockStmt {
    pub meta: NodeMeta,
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub meta: NodeMeta,
    pub target: Expr,
    pub op: AssignOp,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct FnDeclStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub params: SmallVec<[Param; 4]>,
    pub defaults: SmallVec<[Expr; 4]>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct ClassDeclStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub parent: Option<String>,
    /// Restricted to [`Stmt::is_class_member`] statements; the parser
    /// rejects anything else at construction time.
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct InstanceVarStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct MethodStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub params: SmallVec<[Param; 4]>,
    pub defaults: SmallVec<[Expr; 4]>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct ClassVarStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct ClassMethodStmt {
    pub meta: NodeMeta,
    pub name: String,
    pub params: SmallVec<[Param; 4]>,
    pub defaults: SmallVec<[Expr; 4]>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub meta: NodeMeta,
    pub condition: Expr,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct ForInStmt {
    pub meta: NodeMeta,
    /// `i` in `for (var i, e in expr)`; absent binds `nil` (§4.4 For-in).
    pub index: Option<String>,
    pub element: String,
    pub iterable: Expr,
    pub body: BlockStmt,
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Expr {
    Int(IntLiteral),
    Float(FloatLiteral),
    Bool(BoolLiteral),
    Nil(NodeMeta),
    Ident(Identifier),
    Prefix(Box<PrefixExpr>),
    Infix(Box<InfixExpr>),
    FnLiteral(Box<FnLiteral>),
    StringLit(StringLiteral),
    ArrayLit(ArrayLiteral),
    MapLit(MapLiteral),
    Call(Box<CallExpr>),
    Dot(Box<DotExpr>),
    Subscript(Box<SubscriptExpr>),
    SelfAccess(SelfAccessExpr),
    SuperAccess(SuperAccessExpr),
    ClassAccess(ClassAccessExpr),
}

impl Expr {
    #[must_use]
    pub fn meta(&self) -> NodeMeta {
        match self {
            Self::Int(e) => e.meta,
            Self::Float(e) => e.meta,
            Self::Bool(e) => e.meta,
            Self::Nil(m) => *m,
            Self::Ident(e) => e.meta,
            Self::Prefix(e) => e.meta,
            Self::Infix(e) => e.meta,
            Self::FnLiteral(e) => e.meta,
            Self::StringLit(e) => e.meta,
            Self::ArrayLit(e) => e.meta,
            Self::MapLit(e) => e.meta,
            Self::Call(e) => e.meta,
            Self::Dot(e) => e.meta,
            Self::Subscript(e) => e.meta,
            Self::SelfAccess(e) => e.meta,
            Self::SuperAccess(e) => e.meta,
            Self::ClassAccess(e) => e.meta,
        }
    }

    /// Whether this expression can legally appear as an assignment target
    /// (identifier, dot, self-dot, or subscript chain; §4.4 Assignment).
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(self, Self::Ident(_) | Self::Dot(_) | Self::Subscript(_) | Self::SelfAccess(_))
    }
}

#[derive(Debug, Clone)]
pub struct IntLiteral {
    pub meta: NodeMeta,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct FloatLiteral {
    pub meta: NodeMeta,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct BoolLiteral {
    pub meta: NodeMeta,
    pub value: bool,
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub meta: NodeMeta,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub meta: NodeMeta,
    pub op: PrefixOp,
    pub operand: Expr,
    /// Present iff the source wrapped this expression in parentheses
    /// (§4.5: outer parens are preserved only when originally present).
    pub parens: bool,
}

#[derive(Debug, Clone)]
pub struct InfixExpr {
    pub meta: NodeMeta,
    pub op: InfixOp,
    pub left: Expr,
    pub right: Expr,
    pub parens: bool,
}

#[derive(Debug, Clone)]
pub struct FnLiteral {
    pub meta: NodeMeta,
    pub params: SmallVec<[Param; 4]>,
    pub defaults: SmallVec<[Expr; 4]>,
    pub body: BlockStmt,
}

#[derive(Debug, Clone)]
pub struct StringLiteral {
    pub meta: NodeMeta,
    /// Escape-decoded value; the original quoted spelling is still available
    /// via the token at `meta.first_token` for the formatter.
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteral {
    pub meta: NodeMeta,
    pub elements: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct MapLiteral {
    pub meta: NodeMeta,
    pub pairs: Vec<(Expr, Expr)>,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub meta: NodeMeta,
    pub callee: Expr,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct DotExpr {
    pub meta: NodeMeta,
    pub receiver: Expr,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptExpr {
    pub meta: NodeMeta,
    pub target: Expr,
    pub index: Expr,
}

/// `self` or `self.name`.
#[derive(Debug, Clone)]
pub struct SelfAccessExpr {
    pub meta: NodeMeta,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SuperAccessExpr {
    pub meta: NodeMeta,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ClassAccessExpr {
    pub meta: NodeMeta,
    pub name: String,
}

impl Expr {
    /// The fully-parenthesised canonical rendering used by tests to assert
    /// on parse shape without depending on spans (e.g. `"(1 + (2 * 3))"`).
    #[must_use]
    pub fn to_literal_string(&self) -> String {
        match self {
            Self::Int(e) => e.value.to_string(),
            Self::Float(e) => e.value.to_string(),
            Self::Bool(e) => e.value.to_string(),
            Self::Nil(_) => "nil".to_string(),
            Self::Ident(e) => e.name.clone(),
            Self::Prefix(e) => format!("({}{})", e.op.as_str(), e.operand.to_literal_string()),
            Self::Infix(e) => format!("({} {} {})", e.left.to_literal_string(), e.op.as_str(), e.right.to_literal_string()),
            Self::FnLiteral(e) => format!("fn({})", params_literal(&e.params)),
            Self::StringLit(e) => format!("{:?}", e.value),
            Self::ArrayLit(e) => {
                if e.elements.is_empty() {
                    "[]".to_string()
                } else {
                    let items: Vec<String> = e.elements.iter().map(Self::to_literal_string).collect();
                    format!("[{}, ]", items.join(", "))
                }
            }
            Self::MapLit(e) => {
                let items: Vec<String> =
                    e.pairs.iter().map(|(k, v)| format!("{}: {}", k.to_literal_string(), v.to_literal_string())).collect();
                format!("{{{}}}", items.join(", "))
            }
            Self::Call(e) => {
                let args: Vec<String> = e.args.iter().map(Self::to_literal_string).collect();
                format!("{}({})", e.callee.to_literal_string(), args.join(", "))
            }
            Self::Dot(e) => format!("{}.{}", e.receiver.to_literal_string(), e.name),
            Self::Subscript(e) => format!("{}[{}]", e.target.to_literal_string(), e.index.to_literal_string()),
            Self::SelfAccess(e) => match &e.name {
                Some(name) => format!("self.{name}"),
                None => "self".to_string(),
            },
            Self::SuperAccess(e) => format!("super.{}", e.name),
            Self::ClassAccess(e) => format!("class.{}", e.name),
        }
    }
}

fn params_literal(params: &[Param]) -> String {
    params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn meta() -> NodeMeta {
        NodeMeta::new(Span::new(Position::new(1, 1), Position::new(1, 2)), 0, 0)
    }

    #[test]
    fn stmt_meta_reaches_through_every_variant() {
        let stmts = vec![
            Stmt::Continue(meta()),
            Stmt::Break(meta()),
            Stmt::Expr(ExprStmt { meta: meta(), expr: Expr::Nil(meta()) }),
        ];
        for s in stmts {
            assert_eq!(s.meta(), meta());
        }
    }

    #[test]
    fn only_class_level_statements_are_class_members() {
        assert!(Stmt::InstanceVar(InstanceVarStmt { meta: meta(), name: "a".into(), value: None }).is_class_member());
        assert!(!Stmt::Break(meta()).is_class_member());
    }

    #[test]
    fn assignable_targets_match_the_spec_list() {
        assert!(Expr::Ident(Identifier { meta: meta(), name: "x".into() }).is_assignable());
        assert!(Expr::SelfAccess(SelfAccessExpr { meta: meta(), name: Some("a".into()) }).is_assignable());
        assert!(!Expr::Int(IntLiteral { meta: meta(), value: 1 }).is_assignable());
    }

    fn int(v: i64) -> Expr {
        Expr::Int(IntLiteral { meta: meta(), value: v })
    }

    fn infix(op: InfixOp, left: Expr, right: Expr) -> Expr {
        Expr::Infix(Box::new(InfixExpr { meta: meta(), op, left, right, parens: false }))
    }

    #[test]
    fn literal_string_renders_fully_parenthesised_infix() {
        let e = infix(InfixOp::Add, int(1), infix(InfixOp::Mul, int(2), int(3)));
        assert_eq!(e.to_literal_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn literal_string_renders_array_literals_with_a_trailing_comma() {
        let e = Expr::ArrayLit(ArrayLiteral {
            meta: meta(),
            elements: vec![
                int(1),
                infix(InfixOp::Mul, int(2), int(2)),
                infix(InfixOp::Add, int(3), int(3)),
            ],
        });
        assert_eq!(e.to_literal_string(), "[1, (2 * 2), (3 + 3), ]");
    }
}
