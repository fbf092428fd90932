//! Parse errors.

use crate::Token;
use thiserror::Error;

/// Output of every parser.
///
/// The usual [`Result`] methods cover everything a caller needs:
/// [`unwrap`](Result::unwrap) and [`unwrap_err`](Result::unwrap_err) panic on the wrong variant,
/// [`map`](Result::map) and [`map_err`](Result::map_err) transform one variant, and
/// [`map_or_else`](Result::map_or_else) folds both into a plain value.
pub type ParseResult<T = ()> = Result<Token<T>, ParseError>;

/// Why a parser failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A literal or pattern did not match the input.
    Mismatch,
    /// A sequence element was required, but the input was exhausted.
    UnexpectedEnd,
    /// A sequence matched only ignored tokens.
    EmptySequence,
    /// A list matched no item.
    EmptyList,
    /// All alternatives failed; see [`ParseError::causes`].
    Alternatives,
    /// An error raised by a grammar.
    Custom,
}

/// A failure to parse, located at a byte offset of the source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at {index}")]
pub struct ParseError {
    kind: ErrorKind,
    message: String,
    index: usize,
    causes: Vec<ParseError>,
}

impl ParseError {
    /// Create an error raised by a grammar.
    pub fn new(message: impl Into<String>, index: usize) -> Self {
        Self::with_kind(ErrorKind::Custom, message, index)
    }

    pub(crate) fn with_kind(kind: ErrorKind, message: impl Into<String>, index: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            index,
            causes: Vec::new(),
        }
    }

    /// Combine several errors into one located at `index`.
    ///
    /// The message of the resulting error contains the rendering of every given error.
    ///
    /// ~~~
    /// # use tessel::ParseError;
    /// let e = ParseError::merge(vec![ParseError::new("foo", 1), ParseError::new("bar", 2)], 0);
    /// assert_eq!(e.to_string(), "multiple errors occurred:\nfoo at 1\nbar at 2 at 0");
    /// assert_eq!(e.causes().len(), 2);
    /// ~~~
    pub fn merge(errors: Vec<ParseError>, index: usize) -> Self {
        let mut message = String::from("multiple errors occurred:");
        for e in &errors {
            message.push('\n');
            message.push_str(&e.to_string());
        }
        Self {
            kind: ErrorKind::Alternatives,
            message,
            index,
            causes: errors,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Description of the error, without its location.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset of the source where the error was detected.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The errors that were merged into this one, if any.
    pub fn causes(&self) -> &[ParseError] {
        &self.causes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = ParseError::with_kind(ErrorKind::UnexpectedEnd, "unexpected end of input", 7);
        assert_eq!(e.to_string(), "unexpected end of input at 7");
        assert_eq!(e.kind(), ErrorKind::UnexpectedEnd);
        assert!(e.causes().is_empty());
    }

    #[test]
    fn merge_nested() {
        let inner = ParseError::merge(vec![ParseError::new("a", 0)], 0);
        let outer = ParseError::merge(vec![inner.clone(), ParseError::new("b", 0)], 0);
        assert_eq!(outer.kind(), ErrorKind::Alternatives);
        assert_eq!(outer.causes()[0], inner);
        assert!(outer.message().contains(&inner.to_string()));
        assert!(outer.message().contains("b at 0"));
    }

    #[test]
    fn merge_nothing() {
        let e = ParseError::merge(Vec::new(), 3);
        assert_eq!(e.message(), "multiple errors occurred:");
        assert_eq!(e.index(), 3);
    }
}
