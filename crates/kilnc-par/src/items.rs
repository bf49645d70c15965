//! Declaration parsing: functions, variables, initializer lists.

use kilnc_lex::TokenKind;

use crate::ast::{NodeId, NodeKind};
use crate::{ParseError, Parser};

impl<'src, 'tok> Parser<'src, 'tok> {
    pub(crate) fn parse_declaration(&mut self) -> Result<NodeId, ParseError> {
        if self.check(TokenKind::KwFn) {
            self.parse_fn_decl()
        } else {
            let decl = self.parse_var_decl()?;
            self.expect_after_prev(TokenKind::Semicolon)?;
            Ok(decl)
        }
    }

    fn parse_fn_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::KwFn)?;
        let name_token = self.expect(TokenKind::Ident)?;
        let Some(name) = name_token.name() else {
            unreachable!("identifier token without a name payload");
        };

        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_start = self.current().span;
                let param_token = self.expect(TokenKind::Ident)?;
                let Some(param_name) = param_token.name() else {
                    unreachable!("identifier token without a name payload");
                };
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                params.push(self.ast.push(
                    NodeKind::Param {
                        name: param_name,
                        ty,
                    },
                    self.span_from(param_start),
                ));
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
        let body = self.parse_block()?;
        Ok(self.ast.push(
            NodeKind::FnDecl {
                name,
                params,
                ret,
                body,
            },
            self.span_from(start),
        ))
    }

    /// `"const"? IDENT ":" Type ("=" (InitList | Expr))?` — the trailing
    /// semicolon belongs to the caller.
    pub(crate) fn parse_var_decl(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let is_const = self.eat(TokenKind::KwConst).is_some();
        let name_token = self.expect(TokenKind::Ident)?;
        let Some(name) = name_token.name() else {
            unreachable!("identifier token without a name payload");
        };
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let init = if self.eat(TokenKind::Assign).is_some() {
            let value = if self.check(TokenKind::LBrace) {
                self.parse_init_list()?
            } else {
                self.parse_expression()?
            };
            Some(value)
        } else {
            None
        };
        Ok(self.ast.push(
            NodeKind::VarDecl {
                name,
                is_const,
                ty,
                init,
            },
            self.span_from(start),
        ))
    }

    /// `"{" (Elem ("," Elem)*)? "}"`; elements are expressions or nested
    /// lists; a trailing comma is a syntax error.
    pub(crate) fn parse_init_list(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        self.expect(TokenKind::LBrace)?;
        let mut elems = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let elem = if self.check(TokenKind::LBrace) {
                    self.parse_init_list()?
                } else {
                    self.parse_expression()?
                };
                elems.push(elem);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
                if self.check(TokenKind::RBrace) {
                    return Err(self.error_here("trailing comma in initializer list"));
                }
            }
        }
        self.expect_after_prev(TokenKind::RBrace)?;
        Ok(self
            .ast
            .push(NodeKind::InitList { elems }, self.span_from(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{parse, parse_ok};

    #[test]
    fn test_var_decl_forms() {
        let (ast, root) = parse_ok("a: i32;\nb: i64 = 5;\nconst c: bool = true;");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        assert_eq!(decls.len(), 3);
        let NodeKind::VarDecl { is_const, init, .. } = ast.kind(decls[0]) else {
            panic!("decl 0");
        };
        assert!(!*is_const && init.is_none());
        let NodeKind::VarDecl { init, .. } = ast.kind(decls[1]) else {
            panic!("decl 1");
        };
        assert!(init.is_some());
        let NodeKind::VarDecl { is_const, .. } = ast.kind(decls[2]) else {
            panic!("decl 2");
        };
        assert!(*is_const);
    }

    #[test]
    fn test_fn_decl_with_params() {
        let (ast, root) = parse_ok("fn add(a: i64, b: i64) -> i64 { return a + b; }");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        let NodeKind::FnDecl { params, ret, .. } = ast.kind(decls[0]) else {
            panic!("no fn");
        };
        assert_eq!(params.len(), 2);
        assert!(ret.is_some());
        assert!(matches!(ast.kind(params[0]), NodeKind::Param { .. }));
    }

    #[test]
    fn test_fn_without_return_type() {
        let (ast, root) = parse_ok("fn side_effect() { }");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        let NodeKind::FnDecl { ret, .. } = ast.kind(decls[0]) else {
            panic!("no fn");
        };
        assert!(ret.is_none());
    }

    #[test]
    fn test_init_list_nested() {
        let (ast, root) = parse_ok("m: i64[2][2] = {{1, 2}, {3, 4}};");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        let NodeKind::VarDecl {
            init: Some(init), ..
        } = ast.kind(decls[0])
        else {
            panic!("no init");
        };
        let NodeKind::InitList { elems } = ast.kind(*init) else {
            panic!("no list");
        };
        assert_eq!(elems.len(), 2);
        assert!(matches!(ast.kind(elems[0]), NodeKind::InitList { .. }));
    }

    #[test]
    fn test_trailing_comma_rejected() {
        let err = parse("v: i64[2] = {1, 2,};").unwrap_err();
        assert!(err.message.contains("trailing comma"), "{}", err.message);
    }

    #[test]
    fn test_empty_init_list() {
        let (ast, root) = parse_ok("v: i64[] = {};");
        let NodeKind::Program { decls } = ast.kind(root) else {
            panic!("no program");
        };
        let NodeKind::VarDecl {
            init: Some(init), ..
        } = ast.kind(decls[0])
        else {
            panic!("no init");
        };
        let NodeKind::InitList { elems } = ast.kind(*init) else {
            panic!("no list");
        };
        assert!(elems.is_empty());
    }

    #[test]
    fn test_missing_var_semicolon() {
        assert!(parse("x: i32 = 1").is_err());
    }
}
