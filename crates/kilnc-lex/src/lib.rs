//! kilnc-lex - Lexical Analysis
//!
//! Turns a borrowed source buffer into a sequence of zero-copy tokens with
//! source spans. Identifiers, keywords, and string literals are resolved
//! through dense interners created alongside the token stream; see
//! [`lexer::Lexer`] for the entry point and [`token::Token`] for the token
//! model.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::{primitive_name_id, LexError, LexOutput, Lexer, KEYWORDS, PRIMITIVE_NAMES};
pub use token::{KwId, NameId, StrId, Token, TokenKind, TokenValue};
