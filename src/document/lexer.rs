//! Tokenizer for JSON with `//` line comments and trailing commas.
//!
//! Whitespace and comments are returned as tokens rather than skipped so the
//! parser can attach them to the tree.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    String,
    Number,
    /// `true`, `false` or `null`
    Literal,
    Whitespace,
    /// `//` up to, but not including, the end of line
    Comment,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Literal => "literal",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
        };
        f.write_str(text)
    }
}

/// 1-based position of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: Position,
}

/// A lexing failure with the position it occurred at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, offset: 0, line: 1, column: 1, failed: false }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn current_position(&self) -> Position {
        Position { line: self.line, column: self.column }
    }

    fn error<S: Into<String>>(&mut self, message: S) -> LexError {
        self.failed = true;
        LexError { position: self.current_position(), message: message.into() }
    }

    /// Consumes `len` bytes, keeping line and column up to date.
    fn advance(&mut self, len: usize) -> &'a str {
        let text = &self.source[self.offset..self.offset + len];
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += len;
        text
    }

    fn whitespace_len(&self) -> usize {
        let rest = self.rest();
        let mut len = 0;
        // A byte order mark is only allowed at the very start of the input.
        if self.offset == 0 && rest.starts_with('\u{feff}') {
            len = '\u{feff}'.len_utf8();
        }
        len + rest[len..]
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
            .count()
    }

    fn comment_len(&mut self) -> Result<usize, LexError> {
        let rest = self.rest();
        if rest.starts_with("//") {
            Ok(rest.find('\n').unwrap_or(rest.len()))
        } else if rest.starts_with("/*") {
            Err(self.error("block comments are not supported"))
        } else {
            Err(self.error("unexpected character '/'"))
        }
    }

    fn string_len(&mut self) -> Result<usize, LexError> {
        let bytes = self.rest().as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'"' => return Ok(i + 1),
                b'\\' => {
                    match bytes.get(i + 1) {
                        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => i += 2,
                        Some(b'u') => {
                            let digits = bytes.get(i + 2..i + 6);
                            match digits {
                                Some(d) if d.iter().all(u8::is_ascii_hexdigit) => i += 6,
                                _ => return Err(self.error("invalid unicode escape in string")),
                            }
                        }
                        _ => return Err(self.error("invalid escape in string")),
                    }
                }
                b if b < 0x20 => return Err(self.error("control character in string")),
                _ => i += 1,
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number_len(&mut self) -> Result<usize, LexError> {
        let bytes = self.rest().as_bytes();
        let digits_from = |start: usize| bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();

        let mut i = 0;
        if bytes.first() == Some(&b'-') {
            i += 1;
        }
        match bytes.get(i) {
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i += digits_from(i),
            _ => return Err(self.error("invalid number")),
        }
        if bytes.get(i) == Some(&b'.') {
            let fraction = digits_from(i + 1);
            if fraction == 0 {
                return Err(self.error("invalid number: missing digits after '.'"));
            }
            i += 1 + fraction;
        }
        if matches!(bytes.get(i), Some(b'e' | b'E')) {
            i += 1;
            if matches!(bytes.get(i), Some(b'+' | b'-')) {
                i += 1;
            }
            let exponent = digits_from(i);
            if exponent == 0 {
                return Err(self.error("invalid number: missing exponent digits"));
            }
            i += exponent;
        }
        if bytes.get(i).is_some_and(|b| b.is_ascii_alphanumeric()) {
            return Err(self.error("invalid number"));
        }
        Ok(i)
    }

    fn literal_len(&mut self) -> Result<usize, LexError> {
        let word_len = self.rest().bytes().take_while(u8::is_ascii_alphanumeric).count();
        let word = &self.rest()[..word_len];
        match word {
            "true" | "false" | "null" => Ok(word_len),
            _ => Err(self.error(format!("unexpected token '{word}'"))),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        let Some(c) = self.rest().chars().next() else {
            return Ok(None);
        };
        let position = self.current_position();
        let (kind, len) = match c {
            '{' => (TokenKind::LeftBrace, 1),
            '}' => (TokenKind::RightBrace, 1),
            '[' => (TokenKind::LeftBracket, 1),
            ']' => (TokenKind::RightBracket, 1),
            ':' => (TokenKind::Colon, 1),
            ',' => (TokenKind::Comma, 1),
            '"' => (TokenKind::String, self.string_len()?),
            '/' => (TokenKind::Comment, self.comment_len()?),
            '-' | '0'..='9' => (TokenKind::Number, self.number_len()?),
            'a'..='z' | 'A'..='Z' => (TokenKind::Literal, self.literal_len()?),
            ' ' | '\t' | '\n' | '\r' | '\u{feff}' if self.whitespace_len() > 0 => {
                (TokenKind::Whitespace, self.whitespace_len())
            }
            other => return Err(self.error(format!("unexpected character '{other}'"))),
        };
        let text = self.advance(len);
        Ok(Some(Token { kind, text, position }))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}
