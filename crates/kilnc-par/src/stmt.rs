//! Statement parsing.
//!
//! Statement position distinguishes variable declarations from expression
//! statements by one token of lookahead (`IDENT ":"`). Function
//! declarations are top-level only; meeting `fn` here is an error.

use kilnc_lex::TokenKind;

use crate::ast::{NodeId, NodeKind};
use crate::{ParseError, Parser};

impl<'src, 'tok> Parser<'src, 'tok> {
    pub(crate) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        self.expect_after_prev(TokenKind::RBrace)?;
        Ok(self
            .ast
            .push(NodeKind::Block { stmts }, self.span_from(start)))
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        match self.current().kind {
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwFor => self.parse_for(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwBreak => {
                let start = self.current().span;
                self.advance();
                self.expect_after_prev(TokenKind::Semicolon)?;
                Ok(self.ast.push(NodeKind::Break, self.span_from(start)))
            }
            TokenKind::KwContinue => {
                let start = self.current().span;
                self.advance();
                self.expect_after_prev(TokenKind::Semicolon)?;
                Ok(self.ast.push(NodeKind::Continue, self.span_from(start)))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::KwFn => {
                Err(self.error_here("function declarations are not allowed inside blocks"))
            }
            TokenKind::KwConst => self.parse_var_decl_stmt(),
            TokenKind::Ident if self.peek(1).kind == TokenKind::Colon => {
                self.parse_var_decl_stmt()
            }
            _ => {
                let start = self.current().span;
                let expr = self.parse_expression()?;
                self.expect_after_prev(TokenKind::Semicolon)?;
                Ok(self
                    .ast
                    .push(NodeKind::ExprStmt { expr }, self.span_from(start)))
            }
        }
    }

    fn parse_var_decl_stmt(&mut self) -> Result<NodeId, ParseError> {
        let decl = self.parse_var_decl()?;
        self.expect_after_prev(TokenKind::Semicolon)?;
        Ok(decl)
    }

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::KwIf)?;
        let cond = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.eat(TokenKind::KwElse).is_some() {
            // `else if` recurses, `else { ... }` takes a block.
            let node = if self.check(TokenKind::KwIf) {
                self.parse_if()?
            } else {
                self.parse_block()?
            };
            Some(node)
        } else {
            None
        };
        Ok(self.ast.push(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            self.span_from(start),
        ))
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::KwWhile)?;
        let cond = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(self
            .ast
            .push(NodeKind::While { cond, body }, self.span_from(start)))
    }

    /// `"for" Init? ";" Cond? ";" Post? Block` — the init clause may be a
    /// variable declaration (scoped to the loop) or an expression.
    fn parse_for(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::KwFor)?;
        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::KwConst)
            || (self.check(TokenKind::Ident) && self.peek(1).kind == TokenKind::Colon)
        {
            Some(self.parse_var_decl()?)
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_after_prev(TokenKind::Semicolon)?;
        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_after_prev(TokenKind::Semicolon)?;
        let post = if self.check(TokenKind::LBrace) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let body = self.parse_block()?;
        Ok(self.ast.push(
            NodeKind::For {
                init,
                cond,
                post,
                body,
            },
            self.span_from(start),
        ))
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::KwReturn)?;
        let expr = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_after_prev(TokenKind::Semicolon)?;
        Ok(self
            .ast
            .push(NodeKind::Return { expr }, self.span_from(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{parse, parse_ok};
    use crate::Ast;

    fn first_fn_body(source: &str) -> (Ast, Vec<NodeId>) {
        let (ast, root) = parse_ok(source);
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        let NodeKind::FnDecl { body, .. } = ast.kind(decls[0]) else {
            panic!("no fn");
        };
        let NodeKind::Block { stmts } = ast.kind(*body) else {
            panic!("no block");
        };
        let stmts = stmts.clone();
        (ast, stmts)
    }

    #[test]
    fn test_if_else_chain() {
        let (ast, stmts) =
            first_fn_body("fn f(x: i64) { if x > 0 { } else if x < 0 { } else { } }");
        let NodeKind::If {
            else_branch: Some(else_id),
            ..
        } = ast.kind(stmts[0])
        else {
            panic!("no if/else");
        };
        // `else if` recurses into another If node.
        let NodeKind::If {
            else_branch: Some(final_else),
            ..
        } = ast.kind(*else_id)
        else {
            panic!("no else-if");
        };
        assert!(matches!(ast.kind(*final_else), NodeKind::Block { .. }));
    }

    #[test]
    fn test_while_loop() {
        let (ast, stmts) = first_fn_body("fn f(x: i64) { while x > 0 { x -= 1; } }");
        assert!(matches!(ast.kind(stmts[0]), NodeKind::While { .. }));
    }

    #[test]
    fn test_for_full_header() {
        let (ast, stmts) = first_fn_body("fn f() { for i: i64 = 0; i < 10; i++ { } }");
        let NodeKind::For {
            init: Some(init),
            cond: Some(_),
            post: Some(_),
            ..
        } = ast.kind(stmts[0])
        else {
            panic!("incomplete for header");
        };
        assert!(matches!(ast.kind(*init), NodeKind::VarDecl { .. }));
    }

    #[test]
    fn test_for_empty_header() {
        let (ast, stmts) = first_fn_body("fn f() { for ;; { break; } }");
        let NodeKind::For {
            init: None,
            cond: None,
            post: None,
            ..
        } = ast.kind(stmts[0])
        else {
            panic!("expected empty for header");
        };
    }

    #[test]
    fn test_return_void() {
        let (ast, stmts) = first_fn_body("fn f() { return; }");
        assert!(matches!(ast.kind(stmts[0]), NodeKind::Return { expr: None }));
    }

    #[test]
    fn test_break_continue() {
        let (ast, stmts) = first_fn_body("fn f() { while true { break; continue; } }");
        let NodeKind::While { body, .. } = ast.kind(stmts[0]) else {
            panic!("no while");
        };
        let NodeKind::Block { stmts: inner } = ast.kind(*body) else {
            panic!("no body");
        };
        assert!(matches!(ast.kind(inner[0]), NodeKind::Break));
        assert!(matches!(ast.kind(inner[1]), NodeKind::Continue));
    }

    #[test]
    fn test_nested_block_statement() {
        let (ast, stmts) = first_fn_body("fn f() { { x: i32 = 1; } }");
        assert!(matches!(ast.kind(stmts[0]), NodeKind::Block { .. }));
    }

    #[test]
    fn test_fn_inside_block_is_error() {
        let err = parse("fn outer() { fn inner() { } }").unwrap_err();
        assert!(
            err.message.contains("not allowed inside blocks"),
            "{}",
            err.message
        );
    }

    #[test]
    fn test_var_decl_lookahead() {
        // `x: i32 = 1;` is a declaration, `x = 1;` an expression statement.
        let (ast, stmts) = first_fn_body("fn f() { x: i32 = 1; x = 2; }");
        assert!(matches!(ast.kind(stmts[0]), NodeKind::VarDecl { .. }));
        assert!(matches!(ast.kind(stmts[1]), NodeKind::ExprStmt { .. }));
    }
}
