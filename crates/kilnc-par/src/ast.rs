//! AST node definitions.
//!
//! Nodes live in one flat arena ([`Ast`]) and refer to each other by
//! [`NodeId`] handle, so the tree has no owning pointers and the semantic
//! analyser can re-seat a node's payload in place (cast insertion moves the
//! original payload to a fresh id and re-purposes the old id as the cast).
//!
//! Every node carries its source span, a resolved semantic type slot
//! (empty until analysis), and a constant-value slot filled by literal
//! parsing and constant folding.

use kilnc_lex::{NameId, StrId};
use kilnc_util::{define_idx, IndexVec, Span};

define_idx!(
    /// Handle of a node in the [`Ast`] arena.
    NodeId
);
define_idx!(
    /// Canonical semantic type handle, assigned by the type store during
    /// analysis. Equal ids mean equal types.
    TypeId
);

/// Lexical shape of a literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    Bool,
    Str,
    Char,
}

/// A compile-time constant value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(StrId),
    Char(char),
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// Surface syntax, for diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    /// Unary plus; numeric identity.
    Plus,
    Neg,
    Not,
    /// Pointer dereference `*x`.
    Deref,
    /// Address-of `&x`.
    AddrOf,
    PreInc,
    PreDec,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Plus => "+",
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::Deref => "*",
            UnOp::AddrOf => "&",
            UnOp::PreInc => "++",
            UnOp::PreDec => "--",
        }
    }
}

/// Postfix `++`/`--`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostfixOp {
    Inc,
    Dec,
}

/// Assignment operators, simple and compound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }
}

/// Payload of an AST node, one variant per construct.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Program {
        decls: Vec<NodeId>,
    },
    VarDecl {
        name: NameId,
        is_const: bool,
        ty: NodeId,
        init: Option<NodeId>,
    },
    FnDecl {
        name: NameId,
        params: Vec<NodeId>,
        ret: Option<NodeId>,
        body: NodeId,
    },
    Param {
        name: NameId,
        ty: NodeId,
    },
    Block {
        stmts: Vec<NodeId>,
    },
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    Return {
        expr: Option<NodeId>,
    },
    Break,
    Continue,
    ExprStmt {
        expr: NodeId,
    },

    Literal {
        kind: LiteralKind,
    },
    Ident {
        name: NameId,
    },
    Binary {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: UnOp,
        expr: NodeId,
    },
    Postfix {
        op: PostfixOp,
        expr: NodeId,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Index {
        target: NodeId,
        index: NodeId,
    },
    InitList {
        elems: Vec<NodeId>,
    },

    // Syntactic type expressions.
    PrimType {
        name: NameId,
    },
    PtrType {
        inner: NodeId,
    },
    ArrayType {
        elem: NodeId,
        size: Option<NodeId>,
    },
    FnType {
        params: Vec<NodeId>,
        ret: Option<NodeId>,
    },

    /// Synthesised by the analyser; never produced by the parser.
    Cast {
        expr: NodeId,
        to: TypeId,
    },
}

/// One AST node.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// Canonical semantic type; `None` until semantic analysis.
    pub ty: Option<TypeId>,
    /// Constant value when the node is a compile-time constant expression.
    pub const_value: Option<ConstValue>,
}

impl Node {
    pub fn is_const_expr(&self) -> bool {
        self.const_value.is_some()
    }
}

/// The node arena. Owns every node of one compilation's tree.
#[derive(Debug, Default)]
pub struct Ast {
    pub nodes: IndexVec<NodeId, Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node with empty annotation slots.
    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.nodes.push(Node {
            kind,
            span,
            ty: None,
            const_value: None,
        })
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id].span
    }

    #[inline]
    pub fn ty(&self, id: NodeId) -> Option<TypeId> {
        self.nodes[id].ty
    }

    /// Whether the node is a syntactic lvalue: an identifier, a subscript,
    /// or a dereference. Postfix `++`/`--` is not an lvalue.
    pub fn is_lvalue(&self, id: NodeId) -> bool {
        matches!(
            self.nodes[id].kind,
            NodeKind::Ident { .. }
                | NodeKind::Index { .. }
                | NodeKind::Unary {
                    op: UnOp::Deref,
                    ..
                }
        )
    }
}
