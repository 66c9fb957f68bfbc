//! Serialization of the document tree, the inverse of the parser.

use std::fmt::{self, Display, Formatter, Write};

use super::{Container, Document, Element, Member, Trivia, TriviaPiece, Value};

impl Display for Trivia {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for piece in self.pieces() {
            match piece {
                TriviaPiece::Whitespace(text) | TriviaPiece::Comment(text) => f.write_str(text)?,
            }
        }
        Ok(())
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}:{}{}{}",
            self.leading, self.key_raw, self.before_colon, self.after_colon, self.value, self.trailing
        )?;
        if self.comma {
            f.write_char(',')?;
        }
        Ok(())
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.leading, self.value, self.trailing)?;
        if self.comma {
            f.write_char(',')?;
        }
        Ok(())
    }
}

fn write_container<E: Display>(
    f: &mut Formatter<'_>,
    container: &Container<E>,
    open: char,
    close: char,
) -> fmt::Result {
    f.write_char(open)?;
    for entry in &container.entries {
        write!(f, "{entry}")?;
    }
    write!(f, "{}{close}", container.close)
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(object) => write_container(f, object, '{', '}'),
            Value::Array(array) => write_container(f, array, '[', ']'),
            Value::Scalar(scalar) => f.write_str(scalar.raw()),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.leading, self.root, self.trailing)
    }
}
