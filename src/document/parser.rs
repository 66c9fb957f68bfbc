//! Recursive descent parser building the lossless tree from lexer tokens.

use std::iter::Peekable;

use super::lexer::{LexError, Lexer, Position, Token, TokenKind};
use super::{Array, Container, Document, Element, Member, Object, Scalar, Trivia, TriviaPiece, Value};

type ParseResult<T> = std::result::Result<T, LexError>;

struct Parser<'a> {
    tokens: Peekable<Lexer<'a>>,
    /// Position just past the input, reported for unexpected end of input.
    end: Position,
}

/// Parses `source` into a [`Document`].
pub fn parse(source: &str) -> ParseResult<Document> {
    let mut parser = Parser { tokens: Lexer::new(source).peekable(), end: end_position(source) };
    let leading = parser.trivia()?;
    let root = parser.value()?;
    let trailing = parser.trivia()?;
    if let Some(token) = parser.next()? {
        return Err(unexpected(&token, "end of document"));
    }
    Ok(Document { leading, root, trailing })
}

fn end_position(source: &str) -> Position {
    let line = source.matches('\n').count() + 1;
    let column = source.rsplit('\n').next().map_or(0, |last| last.chars().count()) + 1;
    Position { line, column }
}

fn unexpected(token: &Token<'_>, expected: &str) -> LexError {
    LexError {
        position: token.position,
        message: format!("expected {expected}, found {} '{}'", token.kind, token.text),
    }
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> ParseResult<Option<Token<'a>>> {
        self.tokens.next().transpose()
    }

    fn peek_kind(&mut self) -> ParseResult<Option<TokenKind>> {
        match self.tokens.peek() {
            Some(Ok(token)) => Ok(Some(token.kind)),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(None),
        }
    }

    fn expect_token(&mut self, expected: &str) -> ParseResult<Token<'a>> {
        self.next()?.ok_or_else(|| LexError {
            position: self.end,
            message: format!("expected {expected}, found end of input"),
        })
    }

    /// Collects whitespace and comments up to the next significant token.
    fn trivia(&mut self) -> ParseResult<Trivia> {
        let mut trivia = Trivia::new();
        while let Some(kind) = self.peek_kind()? {
            let piece = match kind {
                TokenKind::Whitespace => TriviaPiece::Whitespace,
                TokenKind::Comment => TriviaPiece::Comment,
                _ => break,
            };
            if let Some(token) = self.next()? {
                trivia.push(piece(token.text.to_string()));
            }
        }
        Ok(trivia)
    }

    fn value(&mut self) -> ParseResult<Value> {
        let token = self.expect_token("a value")?;
        match token.kind {
            TokenKind::LeftBrace => self.object().map(Value::Object),
            TokenKind::LeftBracket => self.array().map(Value::Array),
            TokenKind::String | TokenKind::Number | TokenKind::Literal => {
                Ok(Value::Scalar(Scalar { raw: token.text.to_string() }))
            }
            _ => Err(unexpected(&token, "a value")),
        }
    }

    /// Parses the rest of an object after its `{`.
    fn object(&mut self) -> ParseResult<Object> {
        let mut entries = Vec::new();
        loop {
            let leading = self.trivia()?;
            let token = self.expect_token("a string key or '}'")?;
            match token.kind {
                TokenKind::RightBrace => return Ok(Container { entries, close: leading }),
                TokenKind::String => {}
                _ => return Err(unexpected(&token, "a string key or '}'")),
            }
            let key = serde_json::from_str::<String>(token.text).map_err(|e| LexError {
                position: token.position,
                message: format!("invalid key: {e}"),
            })?;
            let before_colon = self.trivia()?;
            let colon = self.expect_token("':'")?;
            if colon.kind != TokenKind::Colon {
                return Err(unexpected(&colon, "':'"));
            }
            let after_colon = self.trivia()?;
            let value = self.value()?;
            let trailing = self.trivia()?;
            let mut member = Member {
                leading,
                key_raw: token.text.to_string(),
                key,
                before_colon,
                after_colon,
                value,
                trailing,
                comma: false,
            };
            let separator = self.expect_token("',' or '}'")?;
            match separator.kind {
                TokenKind::Comma => {
                    member.comma = true;
                    entries.push(member);
                }
                TokenKind::RightBrace => {
                    entries.push(member);
                    return Ok(Container { entries, close: Trivia::new() });
                }
                _ => return Err(unexpected(&separator, "',' or '}'")),
            }
        }
    }

    /// Parses the rest of an array after its `[`.
    fn array(&mut self) -> ParseResult<Array> {
        let mut entries = Vec::new();
        loop {
            let leading = self.trivia()?;
            if self.peek_kind()? == Some(TokenKind::RightBracket) {
                self.next()?;
                return Ok(Container { entries, close: leading });
            }
            let value = self.value()?;
            let trailing = self.trivia()?;
            let mut element = Element { leading, value, trailing, comma: false };
            let separator = self.expect_token("',' or ']'")?;
            match separator.kind {
                TokenKind::Comma => {
                    element.comma = true;
                    entries.push(element);
                }
                TokenKind::RightBracket => {
                    entries.push(element);
                    return Ok(Container { entries, close: Trivia::new() });
                }
                _ => return Err(unexpected(&separator, "',' or ']'")),
            }
        }
    }
}
