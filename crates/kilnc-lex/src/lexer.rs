//! The lexer: source buffer to token sequence.
//!
//! Tokens are produced in source order into an arena-backed sequence. Three
//! interners are created up front:
//!
//! - **keywords**: pre-seeded with the fixed keyword table, metadata is the
//!   keyword's token kind. Classification uses `peek`, so identifiers that
//!   merely look like keywords never pollute the identifier interner.
//! - **identifiers**: pre-seeded with the primitive type names so their
//!   dense indices are stable low values the type store can key on.
//! - **strings**: unescaped string-literal content.
//!
//! Invalid characters and unterminated literals become `Unknown` tokens;
//! the lexer itself never aborts on malformed input, only on allocation
//! failure.

use kilnc_util::{Arena, ArenaError, ArenaVec, Interner, Span};
use thiserror::Error;

use crate::cursor::Cursor;
use crate::token::{KwId, NameId, StrId, Token, TokenKind, TokenValue};

/// The fixed keyword table: word to token kind.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::KwFn),
    ("const", TokenKind::KwConst),
    ("if", TokenKind::KwIf),
    ("else", TokenKind::KwElse),
    ("while", TokenKind::KwWhile),
    ("for", TokenKind::KwFor),
    ("return", TokenKind::KwReturn),
    ("break", TokenKind::KwBreak),
    ("continue", TokenKind::KwContinue),
    ("true", TokenKind::KwTrue),
    ("false", TokenKind::KwFalse),
    ("void", TokenKind::KwVoid),
    ("i32", TokenKind::KwI32),
    ("i64", TokenKind::KwI64),
    ("f32", TokenKind::KwF32),
    ("f64", TokenKind::KwF64),
    ("bool", TokenKind::KwBool),
    ("char", TokenKind::KwChar),
    ("str", TokenKind::KwStr),
];

/// Primitive type names, pre-seeded into the identifier interner at
/// construction so their `NameId`s are dense indices 0..=7. The type
/// store's primitive registry keys on these.
pub const PRIMITIVE_NAMES: [&str; 8] = ["void", "i32", "i64", "f32", "f64", "bool", "char", "str"];

/// The `NameId` a base-type keyword's name carries in a lexer-seeded
/// identifier interner. The mapping mirrors [`PRIMITIVE_NAMES`].
pub fn primitive_name_id(kind: TokenKind) -> Option<NameId> {
    let index = match kind {
        TokenKind::KwVoid => 0,
        TokenKind::KwI32 => 1,
        TokenKind::KwI64 => 2,
        TokenKind::KwF32 => 3,
        TokenKind::KwF64 => 4,
        TokenKind::KwBool => 5,
        TokenKind::KwChar => 6,
        TokenKind::KwStr => 7,
        _ => return None,
    };
    Some(NameId(index))
}

/// Lexing failure. Malformed input never fails the lexer (it produces
/// `Unknown` tokens); only allocation can.
#[derive(Debug, Error)]
pub enum LexError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

/// Everything the lexer hands downstream: the token sequence plus the
/// interners later phases resolve names and strings through.
pub struct LexOutput<'src, 'a> {
    pub tokens: ArenaVec<'a, Token<'src>>,
    pub idents: Interner<'a, NameId, ()>,
    pub strings: Interner<'a, StrId, ()>,
    pub keywords: Interner<'a, KwId, TokenKind>,
}

/// Lexer over a borrowed source buffer.
pub struct Lexer<'src, 'a> {
    cursor: Cursor<'src>,
    tokens: ArenaVec<'a, Token<'src>>,
    keywords: Interner<'a, KwId, TokenKind>,
    idents: Interner<'a, NameId, ()>,
    strings: Interner<'a, StrId, ()>,

    /// Byte position where the current token starts.
    token_start: usize,
    token_start_line: u32,
    token_start_col: u32,
}

impl<'src, 'a> Lexer<'src, 'a> {
    /// Create a lexer; seeds the keyword and identifier interners.
    pub fn new(source: &'src str, arena: &'a Arena) -> Result<Self, LexError> {
        let mut keywords = Interner::new(arena);
        for &(word, kind) in KEYWORDS {
            keywords.intern(word, kind)?;
        }
        let mut idents = Interner::new(arena);
        for name in PRIMITIVE_NAMES {
            idents.intern(name, ())?;
        }
        Ok(Self {
            cursor: Cursor::new(source),
            tokens: ArenaVec::new(arena),
            keywords,
            idents,
            strings: Interner::new(arena),
            token_start: 0,
            token_start_line: 1,
            token_start_col: 1,
        })
    }

    /// Lex the whole buffer. All-or-nothing with respect to allocation
    /// failure; the final token is always `Eof`.
    pub fn lex_all(&mut self) -> Result<(), LexError> {
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            self.tokens.push(token)?;
            if done {
                return Ok(());
            }
        }
    }

    /// The tokens lexed so far, in source order.
    pub fn tokens(&self) -> &[Token<'src>] {
        self.tokens.as_slice()
    }

    /// The identifier interner.
    pub fn idents(&self) -> &Interner<'a, NameId, ()> {
        &self.idents
    }

    /// Tear down the lexer, keeping the tokens and interners.
    pub fn into_output(self) -> LexOutput<'src, 'a> {
        LexOutput {
            tokens: self.tokens,
            idents: self.idents,
            strings: self.strings,
            keywords: self.keywords,
        }
    }

    fn next_token(&mut self) -> Result<Token<'src>, LexError> {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_col = self.cursor.column();

        if self.cursor.is_at_end() {
            return Ok(self.make(TokenKind::Eof, TokenValue::None));
        }

        let token = match self.cursor.current() {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '+' => self.plus(),
            '-' => self.minus(),
            '*' => self.two_char('=', TokenKind::StarAssign, TokenKind::Star),
            '/' => self.two_char('=', TokenKind::SlashAssign, TokenKind::Slash),
            '%' => self.two_char('=', TokenKind::PercentAssign, TokenKind::Percent),
            '=' => self.two_char('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => self.two_char('=', TokenKind::NotEq, TokenKind::Not),
            '<' => self.two_char('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.two_char('=', TokenKind::GtEq, TokenKind::Gt),
            '&' => self.two_char('&', TokenKind::AndAnd, TokenKind::Amp),
            '|' => self.two_char('|', TokenKind::OrOr, TokenKind::Unknown),
            '"' => self.string_literal()?,
            '\'' => self.char_literal(),
            c if c == '_' || c.is_ascii_alphabetic() => self.identifier_or_keyword()?,
            c if c.is_ascii_digit() => self.number(),
            _ => self.single(TokenKind::Unknown),
        };
        Ok(token)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current() {
                c if c.is_ascii_whitespace() => self.cursor.advance(),
                '/' if self.cursor.peek(1) == '/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != '\n' {
                        self.cursor.advance();
                    }
                }
                '/' if self.cursor.peek(1) == '*' => {
                    self.cursor.advance();
                    self.cursor.advance();
                    // No nesting; an unterminated block comment runs to EOF.
                    while !self.cursor.is_at_end() {
                        if self.cursor.current() == '*' && self.cursor.peek(1) == '/' {
                            self.cursor.advance();
                            self.cursor.advance();
                            break;
                        }
                        self.cursor.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn make(&self, kind: TokenKind, value: TokenValue) -> Token<'src> {
        Token {
            kind,
            lexeme: self.cursor.slice(self.token_start, self.cursor.position()),
            span: Span::new(
                self.token_start_line,
                self.token_start_col,
                self.cursor.line(),
                self.cursor.column(),
            ),
            value,
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token<'src> {
        self.cursor.advance();
        self.make(kind, TokenValue::None)
    }

    fn two_char(&mut self, second: char, long: TokenKind, short: TokenKind) -> Token<'src> {
        self.cursor.advance();
        let kind = if self.cursor.eat(second) { long } else { short };
        self.make(kind, TokenValue::None)
    }

    fn plus(&mut self) -> Token<'src> {
        self.cursor.advance();
        let kind = if self.cursor.eat('+') {
            TokenKind::PlusPlus
        } else if self.cursor.eat('=') {
            TokenKind::PlusAssign
        } else {
            TokenKind::Plus
        };
        self.make(kind, TokenValue::None)
    }

    fn minus(&mut self) -> Token<'src> {
        self.cursor.advance();
        let kind = if self.cursor.eat('-') {
            TokenKind::MinusMinus
        } else if self.cursor.eat('=') {
            TokenKind::MinusAssign
        } else if self.cursor.eat('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Minus
        };
        self.make(kind, TokenValue::None)
    }

    fn identifier_or_keyword(&mut self) -> Result<Token<'src>, LexError> {
        while matches!(self.cursor.current(), c if c == '_' || c.is_ascii_alphanumeric()) {
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice(self.token_start, self.cursor.position());
        if let Some(entry) = self.keywords.peek(lexeme) {
            let kind = entry.meta;
            return Ok(self.make(kind, TokenValue::None));
        }
        let name = self.idents.intern(lexeme, ())?;
        Ok(self.make(TokenKind::Ident, TokenValue::Name(name)))
    }

    fn number(&mut self) -> Token<'src> {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        // A dot only extends the literal when fractional digits follow;
        // `1.` lexes as an integer followed by a stray dot.
        if self.cursor.current() == '.' && self.cursor.peek(1).is_ascii_digit() {
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
            return self.make(TokenKind::Float, TokenValue::None);
        }
        self.make(TokenKind::Int, TokenValue::None)
    }

    fn string_literal(&mut self) -> Result<Token<'src>, LexError> {
        self.cursor.advance();
        let mut content = String::new();
        loop {
            if self.cursor.is_at_end() {
                // Unterminated: span covers from the opening quote.
                return Ok(self.make(TokenKind::Unknown, TokenValue::None));
            }
            match self.cursor.current() {
                '"' => {
                    self.cursor.advance();
                    let id = self.strings.intern(&content, ())?;
                    return Ok(self.make(TokenKind::Str, TokenValue::Str(id)));
                }
                '\\' => {
                    self.cursor.advance();
                    if self.cursor.is_at_end() {
                        return Ok(self.make(TokenKind::Unknown, TokenValue::None));
                    }
                    content.push(unescape(self.cursor.current()));
                    self.cursor.advance();
                }
                c => {
                    content.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    fn char_literal(&mut self) -> Token<'src> {
        self.cursor.advance();
        if self.cursor.is_at_end() {
            return self.make(TokenKind::Unknown, TokenValue::None);
        }
        let decoded = match self.cursor.current() {
            '\\' => {
                self.cursor.advance();
                if self.cursor.is_at_end() {
                    return self.make(TokenKind::Unknown, TokenValue::None);
                }
                let c = unescape(self.cursor.current());
                self.cursor.advance();
                c
            }
            '\'' => {
                // Empty literal.
                self.cursor.advance();
                return self.make(TokenKind::Unknown, TokenValue::None);
            }
            c => {
                self.cursor.advance();
                c
            }
        };
        if !self.cursor.eat('\'') {
            return self.make(TokenKind::Unknown, TokenValue::None);
        }
        self.make(TokenKind::CharLit, TokenValue::Char(decoded))
    }
}

/// Decode the character after a backslash. Unrecognised escapes yield the
/// character itself.
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}
