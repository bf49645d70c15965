//! Expression parsing: precedence climbing over the binary operator
//! ladder, with prefix and postfix layers.
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|-----------------------------|---------------|
//! | 1 | `\|\|`                          | Left |
//! | 2 | `&&`                        | Left |
//! | 3 | `==`, `!=`                  | Left |
//! | 4 | `<`, `<=`, `>`, `>=`        | Left |
//! | 5 | `+`, `-`                    | Left |
//! | 6 | `*`, `/`, `%`               | Left |
//!
//! Assignment sits below the ladder, is right-associative, and requires a
//! syntactic lvalue on the left. Prefix operators bind tighter than any
//! binary operator; postfix (`++`, `--`, subscript, call) tighter still.

use kilnc_lex::{Token, TokenKind, TokenValue};

use crate::ast::{AssignOp, BinOp, ConstValue, LiteralKind, NodeId, NodeKind, PostfixOp, UnOp};
use crate::{ParseError, Parser};

/// Binding powers for the climb; left-associative operators get
/// `right = left + 1`.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8, BinOp)> {
    let entry = match kind {
        TokenKind::OrOr => (1, 2, BinOp::Or),
        TokenKind::AndAnd => (3, 4, BinOp::And),
        TokenKind::EqEq => (5, 6, BinOp::Eq),
        TokenKind::NotEq => (5, 6, BinOp::Ne),
        TokenKind::Lt => (7, 8, BinOp::Lt),
        TokenKind::Gt => (7, 8, BinOp::Gt),
        TokenKind::LtEq => (7, 8, BinOp::Le),
        TokenKind::GtEq => (7, 8, BinOp::Ge),
        TokenKind::Plus => (9, 10, BinOp::Add),
        TokenKind::Minus => (9, 10, BinOp::Sub),
        TokenKind::Star => (11, 12, BinOp::Mul),
        TokenKind::Slash => (11, 12, BinOp::Div),
        TokenKind::Percent => (11, 12, BinOp::Rem),
        _ => return None,
    };
    Some(entry)
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Rem,
        _ => return None,
    };
    Some(op)
}

impl<'src, 'tok> Parser<'src, 'tok> {
    pub(crate) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let lhs = self.parse_binary(0)?;
        if let Some(op) = assign_op(self.current().kind) {
            if !self.ast.is_lvalue(lhs) {
                return Err(self.error_here("invalid assignment target"));
            }
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(self.ast.push(
                NodeKind::Assign {
                    op,
                    target: lhs,
                    value,
                },
                self.span_from(start),
            ));
        }
        Ok(lhs)
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let mut lhs = self.parse_unary()?;
        while let Some((left_bp, right_bp, op)) = infix_binding_power(self.current().kind) {
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(right_bp)?;
            lhs = self
                .ast
                .push(NodeKind::Binary { op, lhs, rhs }, self.span_from(start));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let op = match self.current().kind {
            TokenKind::Plus => UnOp::Plus,
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Not => UnOp::Not,
            TokenKind::Star => UnOp::Deref,
            TokenKind::Amp => UnOp::AddrOf,
            TokenKind::PlusPlus => UnOp::PreInc,
            TokenKind::MinusMinus => UnOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        Ok(self
            .ast
            .push(NodeKind::Unary { op, expr }, self.span_from(start)))
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let start = self.current().span;
        let mut node = self.parse_primary()?;
        loop {
            match self.current().kind {
                TokenKind::PlusPlus => {
                    self.advance();
                    node = self.ast.push(
                        NodeKind::Postfix {
                            op: PostfixOp::Inc,
                            expr: node,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    node = self.ast.push(
                        NodeKind::Postfix {
                            op: PostfixOp::Dec,
                            expr: node,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_after_prev(TokenKind::RBracket)?;
                    node = self.ast.push(
                        NodeKind::Index {
                            target: node,
                            index,
                        },
                        self.span_from(start),
                    );
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    self.expect_after_prev(TokenKind::RParen)?;
                    node = self.ast.push(
                        NodeKind::Call { callee: node, args },
                        self.span_from(start),
                    );
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        match self.current().kind {
            TokenKind::Int => {
                let token = self.advance();
                let value = parse_int_literal(&token)?;
                let id = self.ast.push(
                    NodeKind::Literal {
                        kind: LiteralKind::Int,
                    },
                    token.span,
                );
                self.ast.node_mut(id).const_value = Some(ConstValue::Int(value));
                Ok(id)
            }
            TokenKind::Float => {
                let token = self.advance();
                let value = parse_float_literal(&token)?;
                let id = self.ast.push(
                    NodeKind::Literal {
                        kind: LiteralKind::Float,
                    },
                    token.span,
                );
                self.ast.node_mut(id).const_value = Some(ConstValue::Float(value));
                Ok(id)
            }
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let token = self.advance();
                let id = self.ast.push(
                    NodeKind::Literal {
                        kind: LiteralKind::Bool,
                    },
                    token.span,
                );
                self.ast.node_mut(id).const_value =
                    Some(ConstValue::Bool(token.kind == TokenKind::KwTrue));
                Ok(id)
            }
            TokenKind::Str => {
                let token = self.advance();
                let TokenValue::Str(content) = token.value else {
                    unreachable!("string token without a string payload");
                };
                let id = self.ast.push(
                    NodeKind::Literal {
                        kind: LiteralKind::Str,
                    },
                    token.span,
                );
                self.ast.node_mut(id).const_value = Some(ConstValue::Str(content));
                Ok(id)
            }
            TokenKind::CharLit => {
                let token = self.advance();
                let TokenValue::Char(c) = token.value else {
                    unreachable!("char token without a decoded code point");
                };
                let id = self.ast.push(
                    NodeKind::Literal {
                        kind: LiteralKind::Char,
                    },
                    token.span,
                );
                self.ast.node_mut(id).const_value = Some(ConstValue::Char(c));
                Ok(id)
            }
            TokenKind::Ident => {
                let token = self.advance();
                let Some(name) = token.name() else {
                    unreachable!("identifier token without a name payload");
                };
                Ok(self.ast.push(NodeKind::Ident { name }, token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_after_prev(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.error_here(format!(
                "expected expression, found {}",
                self.describe_current()
            ))),
        }
    }
}

/// Decimal accumulation with an `i64` overflow check.
fn parse_int_literal(token: &Token<'_>) -> Result<i64, ParseError> {
    let mut value: i64 = 0;
    for byte in token.lexeme.bytes() {
        let digit = (byte - b'0') as i64;
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ParseError {
                message: "invalid integer literal or overflow".into(),
                span: token.span,
            })?;
    }
    Ok(value)
}

/// Float conversion: integer part, optional fraction, optional
/// `e[+-]?digits` exponent; anything else is rejected.
fn parse_float_literal(token: &Token<'_>) -> Result<f64, ParseError> {
    token.lexeme.parse::<f64>().map_err(|_| ParseError {
        message: "invalid float literal".into(),
        span: token.span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{parse, parse_expr};
    use crate::Ast;

    fn assert_binary(ast: &Ast, id: NodeId, op: BinOp) -> (NodeId, NodeId) {
        match ast.kind(id) {
            NodeKind::Binary {
                op: actual,
                lhs,
                rhs,
            } => {
                assert_eq!(*actual, op, "expected {op:?}");
                (*lhs, *rhs)
            }
            other => panic!("expected Binary({op:?}), got {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Precedence shapes
    // ---------------------------------------------------------------

    #[test]
    fn test_mul_binds_tighter_than_add() {
        let (ast, root) = parse_expr("a + b * c");
        let (lhs, rhs) = assert_binary(&ast, root, BinOp::Add);
        assert!(matches!(ast.kind(lhs), NodeKind::Ident { .. }));
        assert_binary(&ast, rhs, BinOp::Mul);
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let (ast, root) = parse_expr("a - b - c");
        let (lhs, rhs) = assert_binary(&ast, root, BinOp::Sub);
        assert_binary(&ast, lhs, BinOp::Sub);
        assert!(matches!(ast.kind(rhs), NodeKind::Ident { .. }));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let (ast, root) = parse_expr("a || b && c");
        let (_, rhs) = assert_binary(&ast, root, BinOp::Or);
        assert_binary(&ast, rhs, BinOp::And);
    }

    #[test]
    fn test_relational_binds_tighter_than_equality() {
        let (ast, root) = parse_expr("a == b < c");
        let (_, rhs) = assert_binary(&ast, root, BinOp::Eq);
        assert_binary(&ast, rhs, BinOp::Lt);
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let (ast, root) = parse_expr("(a + b) * c");
        let (lhs, _) = assert_binary(&ast, root, BinOp::Mul);
        assert_binary(&ast, lhs, BinOp::Add);
    }

    // ---------------------------------------------------------------
    // Unary and postfix
    // ---------------------------------------------------------------

    #[test]
    fn test_chained_unary() {
        let (ast, root) = parse_expr("- -x");
        let NodeKind::Unary {
            op: UnOp::Neg,
            expr,
        } = ast.kind(root)
        else {
            panic!("outer neg");
        };
        assert!(matches!(
            ast.kind(*expr),
            NodeKind::Unary { op: UnOp::Neg, .. }
        ));
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        let (ast, root) = parse_expr("-a + b");
        let (lhs, _) = assert_binary(&ast, root, BinOp::Add);
        assert!(matches!(
            ast.kind(lhs),
            NodeKind::Unary { op: UnOp::Neg, .. }
        ));
    }

    #[test]
    fn test_deref_and_addr_of() {
        let (ast, root) = parse_expr("*p");
        assert!(matches!(
            ast.kind(root),
            NodeKind::Unary {
                op: UnOp::Deref,
                ..
            }
        ));
        let (ast, root) = parse_expr("&x");
        assert!(matches!(
            ast.kind(root),
            NodeKind::Unary {
                op: UnOp::AddrOf,
                ..
            }
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let (ast, root) = parse_expr("table[0](1, 2)");
        let NodeKind::Call { callee, args } = ast.kind(root) else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(ast.kind(*callee), NodeKind::Index { .. }));
    }

    #[test]
    fn test_postfix_increment() {
        let (ast, root) = parse_expr("i++");
        assert!(matches!(
            ast.kind(root),
            NodeKind::Postfix {
                op: PostfixOp::Inc,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_argument_call() {
        let (ast, root) = parse_expr("ping()");
        let NodeKind::Call { args, .. } = ast.kind(root) else {
            panic!("expected call");
        };
        assert!(args.is_empty());
    }

    // ---------------------------------------------------------------
    // Assignment
    // ---------------------------------------------------------------

    #[test]
    fn test_assignment_is_right_associative() {
        let (ast, root) = parse_expr("a = b = c");
        let NodeKind::Assign { value, .. } = ast.kind(root) else {
            panic!("expected assign");
        };
        assert!(matches!(ast.kind(*value), NodeKind::Assign { .. }));
    }

    #[test]
    fn test_compound_assignment() {
        let (ast, root) = parse_expr("x += 1");
        assert!(matches!(
            ast.kind(root),
            NodeKind::Assign {
                op: AssignOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_assignment_to_lvalues() {
        for source in ["x = 1", "v[0] = 1", "*p = 1"] {
            parse_expr(source);
        }
    }

    #[test]
    fn test_assignment_to_non_lvalue_fails() {
        for source in ["1 = 2", "x + y = 1", "x++ = 1", "f() = 1"] {
            let wrapped = format!("fn probe() {{ {source}; }}");
            let err = parse(&wrapped).unwrap_err();
            assert!(
                err.message.contains("assignment target"),
                "{source}: {}",
                err.message
            );
        }
    }

    // ---------------------------------------------------------------
    // Literals
    // ---------------------------------------------------------------

    #[test]
    fn test_int_literal_round_trip() {
        let (ast, root) = parse_expr("9223372036854775807");
        assert_eq!(
            ast.node(root).const_value,
            Some(ConstValue::Int(i64::MAX))
        );
    }

    #[test]
    fn test_int_literal_overflow_rejected() {
        let err = parse("fn probe() { x: i64 = 9223372036854775808; }").unwrap_err();
        assert_eq!(err.message, "invalid integer literal or overflow");
    }

    #[test]
    fn test_float_literal() {
        let (ast, root) = parse_expr("3.5");
        assert_eq!(ast.node(root).const_value, Some(ConstValue::Float(3.5)));
    }

    #[test]
    fn test_bool_and_char_literals() {
        let (ast, root) = parse_expr("true");
        assert_eq!(ast.node(root).const_value, Some(ConstValue::Bool(true)));
        let (ast, root) = parse_expr("'k'");
        assert_eq!(ast.node(root).const_value, Some(ConstValue::Char('k')));
    }

    #[test]
    fn test_literals_are_const_expressions() {
        for source in ["0", "1.25", "false", "\"s\"", "'c'"] {
            let (ast, root) = parse_expr(source);
            assert!(ast.node(root).is_const_expr(), "{source}");
        }
    }
}
