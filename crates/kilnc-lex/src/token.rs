//! Token model.
//!
//! Tokens are zero-copy: the lexeme borrows the source buffer, and any
//! canonicalised payload (identifier name, unescaped string content) is an
//! index into the lexer's interners.

use std::fmt;

use kilnc_util::{define_idx, Span};

define_idx!(
    /// Dense index into the identifier interner.
    NameId
);
define_idx!(
    /// Dense index into the string-literal interner (unescaped content).
    StrId
);
define_idx!(
    /// Dense index into the keyword interner.
    KwId
);

/// Kind of a lexed token.
///
/// The keyword block is kept contiguous with the base-type names last, so
/// the "is this a type keyword" test reads as one range of variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Arrow,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Not,
    Amp,
    PlusPlus,
    MinusMinus,

    // Literals
    Int,
    Float,
    Str,
    CharLit,

    Ident,

    // Keywords
    KwFn,
    KwConst,
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwReturn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,

    // Base-type keywords (contiguous block)
    KwVoid,
    KwI32,
    KwI64,
    KwF32,
    KwF64,
    KwBool,
    KwChar,
    KwStr,

    /// Invalid character or unterminated literal. The parser refuses these.
    Unknown,
    /// Synthesised end-of-input token.
    Eof,
}

impl TokenKind {
    /// Whether this kind names a base type (`void` through `str`).
    pub fn is_base_type(self) -> bool {
        matches!(
            self,
            TokenKind::KwVoid
                | TokenKind::KwI32
                | TokenKind::KwI64
                | TokenKind::KwF32
                | TokenKind::KwF64
                | TokenKind::KwBool
                | TokenKind::KwChar
                | TokenKind::KwStr
        )
    }

    /// Whether this kind is an assignment operator (`=` or compound).
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Colon => "`:`",
            TokenKind::Arrow => "`->`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Assign => "`=`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::PercentAssign => "`%=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Not => "`!`",
            TokenKind::Amp => "`&`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::CharLit => "character literal",
            TokenKind::Ident => "identifier",
            TokenKind::KwFn => "`fn`",
            TokenKind::KwConst => "`const`",
            TokenKind::KwIf => "`if`",
            TokenKind::KwElse => "`else`",
            TokenKind::KwWhile => "`while`",
            TokenKind::KwFor => "`for`",
            TokenKind::KwReturn => "`return`",
            TokenKind::KwBreak => "`break`",
            TokenKind::KwContinue => "`continue`",
            TokenKind::KwTrue => "`true`",
            TokenKind::KwFalse => "`false`",
            TokenKind::KwVoid => "`void`",
            TokenKind::KwI32 => "`i32`",
            TokenKind::KwI64 => "`i64`",
            TokenKind::KwF32 => "`f32`",
            TokenKind::KwF64 => "`f64`",
            TokenKind::KwBool => "`bool`",
            TokenKind::KwChar => "`char`",
            TokenKind::KwStr => "`str`",
            TokenKind::Unknown => "invalid token",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// Canonicalised payload attached to some token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenValue {
    /// No payload.
    None,
    /// Identifier: dense index in the identifier interner.
    Name(NameId),
    /// String literal: dense index of the unescaped content.
    Str(StrId),
    /// Character literal: the decoded code point.
    Char(char),
}

/// A lexed token. `lexeme` borrows the source buffer.
#[derive(Clone, Copy, Debug)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
    pub value: TokenValue,
}

impl<'src> Token<'src> {
    /// The identifier payload, if this is an identifier token.
    pub fn name(&self) -> Option<NameId> {
        match self.value {
            TokenValue::Name(id) => Some(id),
            _ => None,
        }
    }
}

// Tokens are stored by the hundred thousand; keep them cache-friendly.
static_assertions::const_assert!(std::mem::size_of::<Token<'static>>() <= 48);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_range() {
        assert!(TokenKind::KwVoid.is_base_type());
        assert!(TokenKind::KwStr.is_base_type());
        assert!(TokenKind::KwI64.is_base_type());
        assert!(!TokenKind::KwFn.is_base_type());
        assert!(!TokenKind::Ident.is_base_type());
    }

    #[test]
    fn test_assign_op_classification() {
        assert!(TokenKind::Assign.is_assign_op());
        assert!(TokenKind::PercentAssign.is_assign_op());
        assert!(!TokenKind::EqEq.is_assign_op());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TokenKind::Semicolon.to_string(), "`;`");
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
        assert_eq!(TokenKind::Ident.to_string(), "identifier");
    }
}
