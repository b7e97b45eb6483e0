use crate::error::LexError;
use lazy_static::lazy_static;
use mprot_schema::Pos;
use std::collections::HashMap;
use std::fmt;

const BOM: char = '\u{feff}';

/// Longest single token accepted before the tokenizer reports a buffer overflow.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Invalid(LexError),
    Semicolon,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Asterisk,
    Assign,
    Period,
    Ident,
    Str,
    Int,
    Float,
    Comment,
    // keywords
    Package,
    Import,
    Const,
    Enum,
    Struct,
    Union,
    Service,
    Map,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("package", TokenKind::Package);
        m.insert("import",  TokenKind::Import);
        m.insert("const",   TokenKind::Const);
        m.insert("enum",    TokenKind::Enum);
        m.insert("struct",  TokenKind::Struct);
        m.insert("union",   TokenKind::Union);
        m.insert("service", TokenKind::Service);
        m.insert("map",     TokenKind::Map);
        m
    };
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Eof        => "eof",
            TokenKind::Invalid(_) => "invalid",
            TokenKind::Semicolon  => ";",
            TokenKind::LParen     => "(",
            TokenKind::RParen     => ")",
            TokenKind::LBrack     => "[",
            TokenKind::RBrack     => "]",
            TokenKind::LBrace     => "{",
            TokenKind::RBrace     => "}",
            TokenKind::Comma      => ",",
            TokenKind::Asterisk   => "*",
            TokenKind::Assign     => "=",
            TokenKind::Period     => ".",
            TokenKind::Ident      => "ident",
            TokenKind::Str        => "string",
            TokenKind::Int        => "int",
            TokenKind::Float      => "float",
            TokenKind::Comment    => "comment",
            TokenKind::Package    => "package",
            TokenKind::Import     => "import",
            TokenKind::Const      => "const",
            TokenKind::Enum       => "enum",
            TokenKind::Struct     => "struct",
            TokenKind::Union      => "union",
            TokenKind::Service    => "service",
            TokenKind::Map        => "map",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token. Synthetic terminators carry `"\n"`.
    pub text: String,
    pub pos:  Pos,
}

/// Turns schema source bytes into tokens, one per call to [`Tokenizer::next`].
///
/// A newline ends a statement when the previous token was an identifier, a
/// literal, `)`, `]` or `}`; in that case it comes out as a `;` token with the
/// text `"\n"`. Everywhere else newlines are plain whitespace.
pub struct Tokenizer<'a> {
    src:           &'a [u8],
    file:          String,
    max_token_len: usize,
    implicit_semi: bool,

    ch:     Option<char>,     // current character, None at EOF or on a bad byte
    bad:    Option<LexError>, // decoding error for the current byte
    ch_off: usize,
    rd_off: usize,
    line:   usize,
    column: usize,

    tok_off:    usize,
    tok_line:   usize,
    tok_column: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a [u8], file: &str) -> Self {
        let mut t = Tokenizer {
            src,
            file: file.to_string(),
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            implicit_semi: false,
            ch: Some('\n'), // so the first character lands on line 1, column 1
            bad: None,
            ch_off: 0,
            rd_off: 0,
            line: 0,
            column: 0,
            tok_off: 0,
            tok_line: 0,
            tok_column: 0,
        };
        t.next_char();
        if t.ch == Some(BOM) {
            t.next_char();
        }
        t.begin_token();
        t
    }

    pub fn with_max_token_len(mut self, max_token_len: usize) -> Self {
        self.max_token_len = max_token_len;
        self
    }

    /// Scans the next token. Once the input is exhausted every call returns `Eof`.
    pub fn next(&mut self) -> Token {
        self.skip_whitespace();
        let (token, implicit_semi) = self.scan();
        self.implicit_semi = implicit_semi;
        token
    }

    fn scan(&mut self) -> (Token, bool) {
        let prev_semi = self.implicit_semi;

        if let Some(err) = self.bad.clone() {
            return (self.invalid_token(err, true), prev_semi);
        }

        let c = match self.ch {
            Some(c) => c,
            None if prev_semi => return (self.synthetic_semicolon(), false),
            None => return (self.make(TokenKind::Eof, String::new()), false),
        };

        if is_letter(c) {
            let token = self.scan_identifier();
            let semi = token.kind == TokenKind::Ident;
            return (token, semi);
        }
        if c == '-' || c.is_ascii_digit() {
            return (self.scan_number(false), true);
        }

        match c {
            BOM => (self.invalid_token(LexError::InvalidBom, true), false),
            '`' => (self.scan_string(true), true),
            '"' => (self.scan_string(false), true),
            ';' | '\n' => (self.single(TokenKind::Semicolon), false),
            '(' => (self.single(TokenKind::LParen), false),
            ')' => (self.single(TokenKind::RParen), true),
            '[' => (self.single(TokenKind::LBrack), false),
            ']' => (self.single(TokenKind::RBrack), true),
            '{' => (self.single(TokenKind::LBrace), false),
            '}' => (self.single(TokenKind::RBrace), true),
            ',' => (self.single(TokenKind::Comma), false),
            '*' => (self.single(TokenKind::Asterisk), false),
            '=' => (self.single(TokenKind::Assign), false),
            '.' => {
                self.next_char();
                if self.ch.is_some_and(|c| c.is_ascii_digit()) {
                    (self.scan_number(true), true)
                } else {
                    (self.token(TokenKind::Period), false)
                }
            }
            '/' => {
                // the terminator goes first, the comment is scanned on the next call
                if prev_semi {
                    return (self.synthetic_semicolon(), false);
                }
                self.next_char();
                match self.ch {
                    Some('/') => (self.scan_line_comment(), false),
                    Some('*') => (self.scan_block_comment(), false),
                    _ => (self.invalid_token(LexError::InvalidToken("'/'".into()), false), false),
                }
            }
            _ => {
                let shown = if c.is_control() {
                    format!("U+{:04X}", c as u32)
                } else {
                    format!("'{}'", c)
                };
                (self.invalid_token(LexError::InvalidToken(shown), true), prev_semi)
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        while self.ch.is_some_and(|c| is_letter(c) || c.is_alphanumeric()) {
            self.next_char();
        }
        self.token(TokenKind::Ident)
    }

    fn scan_number(&mut self, mut saw_period: bool) -> Token {
        if !saw_period {
            if self.is('-') {
                self.next_char();
                if self.is('.') {
                    self.next_char();
                    saw_period = true;
                }
                if !self.ch.is_some_and(|c| c.is_ascii_digit()) {
                    return self.invalid_token(LexError::InvalidNumber, false);
                }
            }
        }

        if !saw_period {
            if self.is('0') {
                self.next_char();
                if self.is('x') || self.is('X') {
                    self.next_char();
                    if self.skip_digits(16) == 0 {
                        return self.invalid_token(LexError::InvalidHexNumber, false);
                    }
                    return self.token(TokenKind::Int);
                }

                self.skip_digits(8);
                let octal = self.skip_digits(10) == 0;
                if !(self.is('.') || self.is('e') || self.is('E')) {
                    if !octal {
                        return self.invalid_token(LexError::InvalidOctNumber, false);
                    }
                    return self.token(TokenKind::Int);
                }
            } else {
                self.skip_digits(10);
            }
        }

        // decimal or float
        let mut kind = TokenKind::Int;
        if saw_period {
            kind = TokenKind::Float;
            self.skip_digits(10);
        } else if self.is('.') {
            kind = TokenKind::Float;
            self.next_char();
            self.skip_digits(10);
        }
        if self.is('e') || self.is('E') {
            kind = TokenKind::Float;
            self.next_char();
            if self.is('+') || self.is('-') {
                self.next_char();
            }
            if self.skip_digits(10) == 0 {
                return self.invalid_token(LexError::InvalidFloatNumber, false);
            }
        }
        self.token(kind)
    }

    fn scan_string(&mut self, raw: bool) -> Token {
        let delim = self.ch;
        self.next_char();
        loop {
            if let Some(err) = self.bad.clone() {
                return self.invalid_token(err, true);
            }
            match self.ch {
                None => return self.invalid_token(LexError::StringNotTerminated, true),
                Some(BOM) => return self.invalid_token(LexError::InvalidBom, true),
                c if c == delim => {
                    self.next_char();
                    return self.token(TokenKind::Str);
                }
                Some('\n') if !raw => {
                    return self.invalid_token(LexError::StringNotTerminated, false);
                }
                Some('\\') if !raw => {
                    if let Err(err) = self.skip_escape() {
                        return self.invalid_token(err, false);
                    }
                    continue; // next character already read
                }
                _ => {}
            }
            self.next_char();
        }
    }

    fn scan_line_comment(&mut self) -> Token {
        loop {
            self.next_char();
            if let Some(err) = self.bad.clone() {
                return self.invalid_token(err, true);
            }
            match self.ch {
                Some('\n') => {
                    self.next_char();
                    let mut token = self.token(TokenKind::Comment);
                    if token.kind == TokenKind::Comment {
                        token.text.pop(); // strip trailing newline
                    }
                    return token;
                }
                None => return self.token(TokenKind::Comment),
                Some(BOM) => return self.invalid_token(LexError::InvalidBom, true),
                _ => {}
            }
        }
    }

    fn scan_block_comment(&mut self) -> Token {
        self.next_char(); // skip '*' of the opening "/*"
        loop {
            if let Some(err) = self.bad.clone() {
                return self.invalid_token(err, true);
            }
            match self.ch {
                None => return self.invalid_token(LexError::CommentNotTerminated, true),
                Some(BOM) => return self.invalid_token(LexError::InvalidBom, true),
                Some('*') => {
                    self.next_char();
                    if self.is('/') {
                        self.next_char();
                        return self.token(TokenKind::Comment);
                    }
                }
                _ => self.next_char(),
            }
        }
    }

    fn skip_digits(&mut self, base: u32) -> usize {
        let mut n = 0;
        while let Some(c) = self.ch {
            match c.to_digit(16) {
                Some(d) if d < base => {}
                _ => break,
            }
            self.next_char();
            n += 1;
        }
        n
    }

    fn skip_escape(&mut self) -> Result<(), LexError> {
        self.next_char(); // skip '\\'
        let min_digits = match self.ch {
            Some('a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '"' | '\'') => {
                self.next_char();
                return Ok(());
            }
            Some('0'..='7') => {
                return if self.skip_digits(8) < 3 {
                    Err(LexError::InvalidEscapeSequence)
                } else {
                    Ok(())
                };
            }
            Some('x') => 2,
            Some('u') => 4,
            Some('U') => 8,
            _ => return Err(LexError::InvalidEscapeSequence),
        };
        self.next_char();
        if self.skip_digits(16) < min_digits {
            return Err(LexError::InvalidEscapeSequence);
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.ch {
            match c {
                ' ' | '\t' | '\r' => {}
                '\n' if !self.implicit_semi => {}
                _ => break,
            }
            self.next_char();
        }
        self.begin_token();
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        self.next_char();
        self.token(kind)
    }

    fn synthetic_semicolon(&mut self) -> Token {
        self.make(TokenKind::Semicolon, "\n".to_string())
    }

    fn invalid_token(&mut self, err: LexError, advance: bool) -> Token {
        let text = self.ch.map(String::from).unwrap_or_default();
        let token = self.make(TokenKind::Invalid(err), text);
        if advance {
            self.next_char();
        }
        self.begin_token();
        token
    }

    fn token(&mut self, kind: TokenKind) -> Token {
        let bytes = &self.src[self.tok_off..self.ch_off];
        if bytes.len() > self.max_token_len {
            let token = self.make(TokenKind::Invalid(LexError::BufferOverflow), String::new());
            self.begin_token();
            return token;
        }

        let text = String::from_utf8_lossy(bytes).into_owned();
        let kind = match kind {
            TokenKind::Ident => KEYWORDS.get(text.as_str()).cloned().unwrap_or(TokenKind::Ident),
            kind => kind,
        };
        let token = self.make(kind, text);
        self.begin_token();
        token
    }

    fn make(&self, kind: TokenKind, text: String) -> Token {
        Token {
            kind,
            text,
            pos: Pos::new(self.file.clone(), self.tok_line, self.tok_column),
        }
    }

    fn begin_token(&mut self) {
        self.tok_off = self.ch_off;
        self.tok_line = self.line;
        self.tok_column = self.column;
    }

    fn is(&self, c: char) -> bool {
        self.ch == Some(c)
    }

    fn next_char(&mut self) {
        if self.ch == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        self.ch_off = self.rd_off;
        match decode_char(&self.src[self.rd_off..]) {
            None => {
                self.ch = None;
                self.bad = None;
            }
            Some(Ok(('\0', n))) => {
                self.ch = None;
                self.bad = Some(LexError::NullChar);
                self.rd_off += n;
            }
            Some(Ok((c, n))) => {
                self.ch = Some(c);
                self.bad = None;
                self.rd_off += n;
            }
            Some(Err(n)) => {
                self.ch = None;
                self.bad = Some(LexError::InvalidEncoding);
                self.rd_off += n;
            }
        }
    }
}

fn is_letter(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Decodes the first character of `bytes`. `None` means end of input,
/// `Err(n)` an invalid sequence whose first `n` bytes should be skipped.
fn decode_char(bytes: &[u8]) -> Option<Result<(char, usize), usize>> {
    let first = *bytes.first()?;
    let width = match first {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Some(Err(1)),
    };
    let decoded = bytes
        .get(..width)
        .and_then(|b| std::str::from_utf8(b).ok())
        .and_then(|s| s.chars().next());
    Some(decoded.map(|c| (c, width)).ok_or(1))
}
