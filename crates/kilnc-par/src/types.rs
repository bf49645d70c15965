//! Type expression parsing.
//!
//! `Type := TypeAtom ("*" | "[" Expr? "]")*` — suffixes wrap left to
//! right, so `i32*[4]` is an array of four pointers. Atoms are base-type
//! keywords, user type names, parenthesised types, and function types.

use kilnc_lex::{primitive_name_id, TokenKind};

use crate::ast::{NodeId, NodeKind};
use crate::{ParseError, Parser};

impl<'src, 'tok> Parser<'src, 'tok> {
    pub(crate) fn parse_type(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let mut node = self.parse_type_atom()?;
        loop {
            if self.eat(TokenKind::Star).is_some() {
                node = self
                    .ast
                    .push(NodeKind::PtrType { inner: node }, self.span_from(start));
            } else if self.eat(TokenKind::LBracket).is_some() {
                let size = if self.check(TokenKind::RBracket) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.expect_after_prev(TokenKind::RBracket)?;
                node = self
                    .ast
                    .push(NodeKind::ArrayType { elem: node, size }, self.span_from(start));
            } else {
                return Ok(node);
            }
        }
    }

    fn parse_type_atom(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        match self.current().kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect_after_prev(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::KwFn => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let mut params = Vec::new();
                if !self.check(TokenKind::RParen) {
                    loop {
                        params.push(self.parse_type()?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect_after_prev(TokenKind::RParen)?;
                let ret = if self.eat(TokenKind::Arrow).is_some() {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                Ok(self
                    .ast
                    .push(NodeKind::FnType { params, ret }, self.span_from(start)))
            }
            kind if kind.is_base_type() => {
                let token = self.advance();
                let Some(name) = primitive_name_id(kind) else {
                    unreachable!("base-type kind without a primitive name");
                };
                Ok(self.ast.push(NodeKind::PrimType { name }, token.span))
            }
            TokenKind::Ident => {
                let token = self.advance();
                let Some(name) = token.name() else {
                    unreachable!("identifier token without a name payload");
                };
                Ok(self.ast.push(NodeKind::PrimType { name }, token.span))
            }
            _ => Err(self.error_here(format!(
                "expected type, found {}",
                self.current().kind
            ))),
        }
    }
}
