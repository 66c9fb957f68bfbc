//! Lossless document model for `devcontainer.json`-style files.
//!
//! The format is JSON plus `//` line comments and trailing commas. Parsing
//! produces a tree in which every byte of whitespace and every comment is kept
//! as [`Trivia`], so writing an untouched tree back reproduces the input
//! exactly and edits only change the regions they touch.

mod lexer;
mod parser;
mod writer;

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

pub use lexer::Position;

/// One run of whitespace or a single `//` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriviaPiece {
    Whitespace(String),
    Comment(String),
}

/// Whitespace and comments found between two tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trivia {
    pieces: Vec<TriviaPiece>,
}

impl Trivia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn whitespace<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::new();
        }
        Self { pieces: vec![TriviaPiece::Whitespace(text)] }
    }

    pub fn pieces(&self) -> &[TriviaPiece] {
        &self.pieces
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn push(&mut self, piece: TriviaPiece) {
        match (self.pieces.last_mut(), piece) {
            (Some(TriviaPiece::Whitespace(last)), TriviaPiece::Whitespace(text)) => {
                last.push_str(&text)
            }
            (_, TriviaPiece::Whitespace(text)) if text.is_empty() => {}
            (_, piece) => self.pieces.push(piece),
        }
    }

    /// Appends `other` after the pieces already held.
    pub fn append(&mut self, other: Trivia) {
        for piece in other.pieces {
            self.push(piece);
        }
    }

    /// Comment texts, including their leading `//`.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.pieces.iter().filter_map(|piece| match piece {
            TriviaPiece::Comment(text) => Some(text.as_str()),
            TriviaPiece::Whitespace(_) => None,
        })
    }

    pub fn has_comments(&self) -> bool {
        self.comments().next().is_some()
    }

    pub fn has_newline(&self) -> bool {
        self.pieces
            .iter()
            .any(|piece| matches!(piece, TriviaPiece::Whitespace(text) if text.contains('\n')))
    }

    /// Whether the last comment is not followed by a line break, so the next
    /// token would end up inside it.
    pub fn ends_in_comment(&self) -> bool {
        for piece in self.pieces.iter().rev() {
            match piece {
                TriviaPiece::Comment(_) => return true,
                TriviaPiece::Whitespace(text) if text.contains('\n') => return false,
                TriviaPiece::Whitespace(_) => {}
            }
        }
        false
    }

    /// Ends a trailing comment with a line break indented by `indent`.
    pub fn break_after_comment(&mut self, indent: &str) {
        if !self.ends_in_comment() {
            return;
        }
        while matches!(self.pieces.last(), Some(TriviaPiece::Whitespace(_))) {
            self.pieces.pop();
        }
        self.pieces.push(TriviaPiece::Whitespace(format!("\n{indent}")));
    }

    /// Indentation of the line the following token starts on, if that token
    /// starts a new line.
    pub fn line_indent(&self) -> Option<&str> {
        match self.pieces.last()? {
            TriviaPiece::Whitespace(text) => text.rfind('\n').map(|i| &text[i + 1..]),
            TriviaPiece::Comment(_) => None,
        }
    }

    /// Splits at the first line break: everything on the current line, and
    /// the rest starting with the line break.
    pub fn split_line(self) -> (Trivia, Trivia) {
        let mut head = Trivia::new();
        let mut tail = Trivia::new();
        let mut pieces = self.pieces.into_iter();
        for piece in pieces.by_ref() {
            match piece {
                TriviaPiece::Whitespace(text) => match text.find('\n') {
                    Some(i) => {
                        // Keep a "\r\n" pair together in the tail.
                        let split = if text[..i].ends_with('\r') { i - 1 } else { i };
                        head.push(TriviaPiece::Whitespace(text[..split].to_string()));
                        tail.push(TriviaPiece::Whitespace(text[split..].to_string()));
                        break;
                    }
                    None => head.push(TriviaPiece::Whitespace(text)),
                },
                comment => head.push(comment),
            }
        }
        for piece in pieces {
            tail.push(piece);
        }
        (head, tail)
    }

    /// Rewrites the indentation of every line break inside this trivia.
    pub fn reindent(&mut self, reindent: &Reindent) {
        if reindent.is_noop() {
            return;
        }
        for piece in &mut self.pieces {
            if let TriviaPiece::Whitespace(text) = piece {
                if !text.contains('\n') {
                    continue;
                }
                let mut lines = text.split('\n');
                let mut result = lines.next().unwrap_or_default().to_string();
                for line in lines {
                    result.push('\n');
                    result.push_str(&reindent.apply(line));
                }
                *text = result;
            }
        }
    }
}

/// Maps indentation from one nesting context to another.
///
/// A line indented with `from` gets `to` instead; whole `from_unit` steps
/// after that prefix are converted to `to_unit` steps, so content written
/// with two spaces per level can be moved into a tab-indented document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reindent {
    pub from: String,
    pub to: String,
    pub from_unit: String,
    pub to_unit: String,
}

impl Reindent {
    pub fn new<S: Into<String>, T: Into<String>>(from: S, to: T) -> Self {
        Self { from: from.into(), to: to.into(), ..Self::default() }
    }

    pub fn with_units<S: Into<String>, T: Into<String>>(mut self, from_unit: S, to_unit: T) -> Self {
        self.from_unit = from_unit.into();
        self.to_unit = to_unit.into();
        self
    }

    fn is_noop(&self) -> bool {
        self.from == self.to && self.from_unit == self.to_unit
    }

    fn apply(&self, line: &str) -> String {
        let Some(mut rest) = line.strip_prefix(self.from.as_str()) else {
            return line.to_string();
        };
        let mut result = self.to.clone();
        if !self.from_unit.is_empty() && !self.to_unit.is_empty() {
            while let Some(next) = rest.strip_prefix(self.from_unit.as_str()) {
                result.push_str(&self.to_unit);
                rest = next;
            }
        }
        result.push_str(rest);
        result
    }
}

/// A string, number, `true`, `false` or `null`, kept as its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    raw: String,
}

impl Scalar {
    /// A string scalar holding `value`, escaped as JSON.
    pub fn string(value: &str) -> Self {
        Self { raw: serde_json::Value::String(value.to_string()).to_string() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The decoded value if this scalar is a string.
    pub fn as_str(&self) -> Option<String> {
        if !self.raw.starts_with('"') {
            return None;
        }
        serde_json::from_str(&self.raw).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Object(Object),
    Array(Array),
    Scalar(Scalar),
}

impl Value {
    pub fn string(value: &str) -> Self {
        Value::Scalar(Scalar::string(value))
    }

    pub fn as_str(&self) -> Option<String> {
        match self {
            Value::Scalar(scalar) => scalar.as_str(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Re-indents every line inside this value.
    pub fn reindent(&mut self, reindent: &Reindent) {
        match self {
            Value::Object(object) => object.reindent(reindent),
            Value::Array(array) => array.reindent(reindent),
            Value::Scalar(_) => {}
        }
    }

    /// Converts to a plain `serde_json::Value`, dropping comments and layout.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self {
            Value::Scalar(scalar) => serde_json::from_str(&scalar.raw)
                .map_err(|e| Error::malformed("JSON value", e.to_string())),
            Value::Array(array) => array
                .entries
                .iter()
                .map(|element| element.value.to_json())
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            Value::Object(object) => {
                let mut map = serde_json::Map::new();
                for member in &object.entries {
                    map.insert(member.key.clone(), member.value.to_json()?);
                }
                Ok(serde_json::Value::Object(map))
            }
        }
    }
}

/// Behaviour shared by object members and array elements.
pub trait Entry: Clone {
    fn leading(&self) -> &Trivia;
    fn leading_mut(&mut self) -> &mut Trivia;
    fn trailing(&self) -> &Trivia;
    fn trailing_mut(&mut self) -> &mut Trivia;
    fn value(&self) -> &Value;
    fn has_comma(&self) -> bool;
    fn set_comma(&mut self, comma: bool);
    fn reindent(&mut self, reindent: &Reindent);
}

/// `"key": value` inside an object, with the trivia around each token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub leading: Trivia,
    key_raw: String,
    key: String,
    pub before_colon: Trivia,
    pub after_colon: Trivia,
    pub value: Value,
    /// Between the value and the comma or closing brace.
    pub trailing: Trivia,
    pub comma: bool,
}

impl Member {
    pub fn new(key: &str, value: Value) -> Self {
        Self {
            leading: Trivia::new(),
            key_raw: Scalar::string(key).raw,
            key: key.to_string(),
            before_colon: Trivia::new(),
            after_colon: Trivia::whitespace(" "),
            value,
            trailing: Trivia::new(),
            comma: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Entry for Member {
    fn leading(&self) -> &Trivia {
        &self.leading
    }
    fn leading_mut(&mut self) -> &mut Trivia {
        &mut self.leading
    }
    fn trailing(&self) -> &Trivia {
        &self.trailing
    }
    fn trailing_mut(&mut self) -> &mut Trivia {
        &mut self.trailing
    }
    fn value(&self) -> &Value {
        &self.value
    }
    fn has_comma(&self) -> bool {
        self.comma
    }
    fn set_comma(&mut self, comma: bool) {
        self.comma = comma;
    }
    fn reindent(&mut self, reindent: &Reindent) {
        self.leading.reindent(reindent);
        self.before_colon.reindent(reindent);
        self.after_colon.reindent(reindent);
        self.value.reindent(reindent);
        self.trailing.reindent(reindent);
    }
}

/// A value inside an array, with the trivia around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub leading: Trivia,
    pub value: Value,
    pub trailing: Trivia,
    pub comma: bool,
}

impl Element {
    pub fn new(value: Value) -> Self {
        Self { leading: Trivia::new(), value, trailing: Trivia::new(), comma: false }
    }
}

impl Entry for Element {
    fn leading(&self) -> &Trivia {
        &self.leading
    }
    fn leading_mut(&mut self) -> &mut Trivia {
        &mut self.leading
    }
    fn trailing(&self) -> &Trivia {
        &self.trailing
    }
    fn trailing_mut(&mut self) -> &mut Trivia {
        &mut self.trailing
    }
    fn value(&self) -> &Value {
        &self.value
    }
    fn has_comma(&self) -> bool {
        self.comma
    }
    fn set_comma(&mut self, comma: bool) {
        self.comma = comma;
    }
    fn reindent(&mut self, reindent: &Reindent) {
        self.leading.reindent(reindent);
        self.value.reindent(reindent);
        self.trailing.reindent(reindent);
    }
}

/// Entries between a pair of brackets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container<E> {
    pub entries: Vec<E>,
    /// Trivia before the closing bracket that follows a trailing comma, or
    /// the whole inside of an empty container.
    pub close: Trivia,
}

pub type Object = Container<Member>;
pub type Array = Container<Element>;

impl<E: Entry> Container<E> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindent(&mut self, reindent: &Reindent) {
        for entry in &mut self.entries {
            entry.reindent(reindent);
        }
        self.close.reindent(reindent);
    }

    /// Adds `entry` after the last one, following the container's layout.
    ///
    /// `line_indent` is the indentation of the line holding the opening
    /// bracket; it is used when the container is empty and spans lines, and
    /// for line breaks needed to end a comment.
    pub fn push_entry(&mut self, mut entry: E, line_indent: &str) {
        let layout = self.entries.last().map(|last| last.leading().line_indent().map(str::to_string));
        let indent = match &layout {
            Some(Some(indent)) => indent.clone(),
            _ => line_indent.to_string(),
        };
        match layout {
            Some(Some(_)) => {
                if !entry.leading().has_newline() {
                    *entry.leading_mut() = Trivia::whitespace(format!("\n{indent}"));
                }
            }
            Some(None) => {
                if !entry.leading().has_newline() && !entry.leading().has_comments() {
                    *entry.leading_mut() = Trivia::whitespace(" ");
                }
            }
            None => {
                if entry.leading().has_newline() && !self.close.has_newline() {
                    self.close = Trivia::whitespace(format!("\n{line_indent}"));
                }
            }
        }

        if let Some(last) = self.entries.last_mut() {
            // Comments on the last entry's line stay on that line, after its comma.
            let same_line = if last.has_comma() {
                entry.set_comma(true);
                let (same_line, rest) = std::mem::take(&mut self.close).split_line();
                if same_line.has_comments() {
                    self.close = rest;
                    same_line
                } else {
                    let mut close = same_line;
                    close.append(rest);
                    self.close = close;
                    Trivia::new()
                }
            } else {
                let (same_line, rest) = std::mem::take(last.trailing_mut()).split_line();
                last.set_comma(true);
                let mut close = rest;
                close.append(std::mem::take(&mut self.close));
                self.close = close;
                entry.set_comma(false);
                same_line
            };
            if same_line.has_comments() {
                let mut leading = same_line;
                leading.append(std::mem::take(entry.leading_mut()));
                *entry.leading_mut() = leading;
            }
        } else {
            entry.set_comma(false);
        }
        entry.leading_mut().break_after_comment(&indent);

        if entry.has_comma() && entry.trailing().has_comments() {
            let mut close = std::mem::take(entry.trailing_mut());
            close.append(std::mem::take(&mut self.close));
            self.close = close;
            self.close.break_after_comment(line_indent);
        } else if entry.trailing().ends_in_comment() && !self.close.has_newline() {
            self.close = Trivia::whitespace(format!("\n{line_indent}"));
        }
        self.entries.push(entry);
    }
}

impl Object {
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|member| member.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|member| member.key == key).map(|member| &member.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|member| member.key == key)
            .map(|member| &mut member.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|member| member.key.as_str())
    }

    /// Replaces the value of `key` in place, or appends a new member.
    pub fn set(&mut self, key: &str, value: Value, line_indent: &str) {
        match self.get_mut(key) {
            Some(existing) => *existing = value,
            None => self.push_entry(Member::new(key, value), line_indent),
        }
    }
}

/// A parsed file: the root value plus the trivia around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub leading: Trivia,
    pub root: Value,
    pub trailing: Trivia,
}

impl Document {
    /// Parses `text`; `source_name` is used in error messages.
    pub fn parse_named(text: &str, source_name: &str) -> Result<Self> {
        parser::parse(text).map_err(|e| Error::malformed(source_name, e.to_string()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_named(text, "JSON document")
    }

    /// Reads and parses the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(Error::IoError)?;
        Self::parse_named(&text, &path.display().to_string())
    }

    pub fn root_object(&self) -> Option<&Object> {
        self.root.as_object()
    }

    pub fn root_object_mut(&mut self) -> Option<&mut Object> {
        self.root.as_object_mut()
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.root.to_json()
    }
}
