//! kilnc-par - Parser (Syntactic Analyzer)
//!
//! Recursive-descent parser with precedence climbing for expressions.
//! Consumes the lexer's token slice and builds the AST node arena; on the
//! first syntax error it stops and returns one structured [`ParseError`].
//!
//! Grammar summary (left-recursive constructs are expressed iteratively):
//!
//! ```ebnf
//! Program       := Declaration*
//! Declaration   := FnDecl | VarDecl ";"
//! FnDecl        := "fn" IDENT "(" ParamList? ")" ("->" Type)? Block
//! VarDecl       := "const"? IDENT ":" Type ("=" (InitList | Expr))?
//! Type          := TypeAtom ("*" | "[" Expr? "]")*
//! TypeAtom      := "(" Type ")"
//!                | "fn" "(" (Type ("," Type)*)? ")" ("->" Type)?
//!                | BASE_TYPE | IDENT
//! Statement     := If | While | For | Return | Break | Continue | Block
//!                | VarDecl ";" | ExprStmt
//! Expression    := Assignment
//! ```
//!
//! Expressions use the precedence ladder `|| < && < ==,!= < relational <
//! additive < multiplicative < unary < postfix`, all left-associative;
//! assignment is right-associative and requires a syntactic lvalue on the
//! left.

pub mod ast;
mod expr;
mod items;
mod stmt;
mod types;

pub use ast::{
    AssignOp, Ast, BinOp, ConstValue, LiteralKind, Node, NodeId, NodeKind, PostfixOp, TypeId, UnOp,
};

use kilnc_lex::{Token, TokenKind};
use kilnc_util::Span;
use thiserror::Error;

/// A syntax error. Parsing stops at the first one.
///
/// `span` already points where the renderer should place the caret: at the
/// offending token, or just past the previous token for "missing X"
/// errors.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

/// The recursive-descent parser.
pub struct Parser<'src, 'tok> {
    tokens: &'tok [Token<'src>],
    pos: usize,
    pub(crate) ast: Ast,
}

impl<'src, 'tok> Parser<'src, 'tok> {
    /// Create a parser over a lexed token slice. The slice must end with
    /// an `Eof` token (the lexer guarantees this).
    pub fn new(tokens: &'tok [Token<'src>]) -> Self {
        debug_assert!(matches!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::Eof)
        ));
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    /// Parse a whole program. Returns the AST arena and the `Program`
    /// root node on success.
    pub fn parse_program(mut self) -> Result<(Ast, NodeId), ParseError> {
        let start = self.current().span;
        let mut decls = Vec::new();
        while !self.check(TokenKind::Eof) {
            decls.push(self.parse_declaration()?);
        }
        let span = if decls.is_empty() {
            start
        } else {
            start.join(self.prev().span)
        };
        let root = self.ast.push(NodeKind::Program { decls }, span);
        Ok((self.ast, root))
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    /// Token at `offset` past the cursor; clamped to the trailing `Eof`.
    pub(crate) fn peek(&self, offset: usize) -> &Token<'src> {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    #[inline]
    pub(crate) fn current(&self) -> &Token<'src> {
        self.peek(0)
    }

    /// The last consumed token; used for span joins and for errors that
    /// point at the gap after it.
    pub(crate) fn prev(&self) -> &Token<'src> {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    pub(crate) fn advance(&mut self) -> Token<'src> {
        let token = *self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected {kind}, found {}", self.describe_current())))
        }
    }

    /// Like [`expect`](Self::expect), but the error points just past the
    /// previous token (used for missing `;` and closing delimiters).
    pub(crate) fn expect_after_prev(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_after_prev(format!("expected {kind}")))
        }
    }

    fn describe_current(&self) -> String {
        let token = self.current();
        match token.kind {
            TokenKind::Eof => token.kind.to_string(),
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Str
            | TokenKind::CharLit
            | TokenKind::Unknown => format!("`{}`", token.lexeme),
            kind => kind.to_string(),
        }
    }

    /// Error at the current token.
    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            span: self.current().span,
        }
    }

    /// Error at the position immediately after the previous token.
    pub(crate) fn error_after_prev(&self, message: impl Into<String>) -> ParseError {
        let prev = self.prev().span;
        ParseError {
            message: message.into(),
            span: Span::point(prev.end_line, prev.end_col),
        }
    }

    /// Join `start` with the span of the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.join(self.prev().span)
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn test_empty_program() {
        let (ast, root) = parse_ok("");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("expected program root");
        };
        assert!(decls.is_empty());
    }

    #[test]
    fn test_scenario_return_literal() {
        let (ast, root) = parse_ok("fn main() -> i64 { return 10; }");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("expected program");
        };
        assert_eq!(decls.len(), 1);
        let NodeKind::FnDecl {
            params, ret, body, ..
        } = ast.kind(decls[0])
        else {
            panic!("expected fn");
        };
        assert!(params.is_empty());
        assert!(ret.is_some());
        let NodeKind::Block { stmts } = ast.kind(*body) else {
            panic!("expected block body");
        };
        assert_eq!(stmts.len(), 1);
        let NodeKind::Return { expr: Some(value) } = ast.kind(stmts[0]) else {
            panic!("expected return with value");
        };
        assert_eq!(
            ast.node(*value).const_value,
            Some(ConstValue::Int(10))
        );
    }

    #[test]
    fn test_first_error_stops_parsing() {
        let err = parse("fn f( { }").unwrap_err();
        assert!(err.message.contains("expected"), "{}", err.message);
    }

    #[test]
    fn test_missing_semicolon_points_after_prev_token() {
        let err = parse("fn f() { x: i32 = 1 }").unwrap_err();
        // `1` ends at 1:20; the caret belongs right after it.
        assert_eq!(err.span, Span::point(1, 20));
    }

    #[test]
    fn test_unknown_token_is_refused() {
        let err = parse("fn f() { x: i32 = @; }").unwrap_err();
        assert!(err.message.contains('@'), "{}", err.message);
    }

    #[test]
    fn test_span_covers_children() {
        let (ast, root) = parse_ok("fn main() -> i64 {\n  return 1 + 2;\n}");
        // Program span covers every node in the arena.
        let program = ast.span(root);
        for (_, node) in ast.nodes.iter_enumerated() {
            assert!(
                program.covers(node.span),
                "program {program:?} does not cover {:?}",
                node.span
            );
        }
    }
}
