//! Primitive parsers that inspect the source string.
//!
//! These are the only parsers that look at characters;
//! every other parser in this crate is built from them.

use crate::{ErrorKind, Groups, ParseError, ParseResult, Parser, Token, TokenKind, Value};
use log::trace;
use regex_automata::meta::{self, BuildError};
use regex_automata::{Anchored, Input};

/// Match a literal string.
///
/// On success, the token has kind `"text"` and its value is the matched text.
///
/// ~~~
/// use tessel::{text, Parser, ParseResult};
/// let res: ParseResult = text("let").parse("let x", 0);
/// assert_eq!(res.unwrap().value().as_text(), Some("let"));
/// let res: ParseResult = text("let").parse("var x", 0);
/// assert_eq!(res.unwrap_err().to_string(), r#"expected "let", found "var" at 0"#);
/// ~~~
pub fn text(literal: impl Into<String>) -> Text {
    Text {
        literal: literal.into(),
        case_insensitive: false,
    }
}

/// Match a literal string, ignoring case.
///
/// The token value is the text as it occurs in the source.
pub fn text_ci(literal: impl Into<String>) -> Text {
    text(literal).case_insensitive()
}

/// A parser returned by [`text`] and [`text_ci`].
#[derive(Clone, Debug)]
pub struct Text {
    literal: String,
    case_insensitive: bool,
}

impl Text {
    /// Compare the literal to the source after lowercasing both.
    pub fn case_insensitive(self) -> Self {
        Self {
            literal: self.literal.to_lowercase(),
            case_insensitive: true,
        }
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }
}

/// Return the longest prefix of `rest` that has at most `n` characters.
fn sample(rest: &str, n: usize) -> &str {
    let len = rest.char_indices().nth(n).map_or(rest.len(), |(i, _)| i);
    &rest[..len]
}

/// Fail if `index` is past the end of `src` or inside of a character.
fn check_offset(src: &str, index: usize) -> Result<(), ParseError> {
    if src.is_char_boundary(index) {
        Ok(())
    } else {
        let msg = format!("invalid offset into input of length {}", src.len());
        Err(ParseError::with_kind(ErrorKind::Mismatch, msg, index))
    }
}

impl<T> Parser<T> for Text {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        check_offset(src, index)?;
        let sample = sample(&src[index..], self.literal.chars().count());
        let matches = if self.case_insensitive {
            sample.to_lowercase() == self.literal
        } else {
            sample == self.literal
        };
        if !matches {
            let msg = format!("expected \"{}\", found \"{}\"", self.literal, sample);
            return Err(ParseError::with_kind(ErrorKind::Mismatch, msg, index));
        }
        let value = Value::Text(sample.to_owned());
        Ok(Token::new(index, sample.len(), TokenKind::named("text"), value))
    }
}

/// Match a regular expression, starting exactly at the given offset.
///
/// On success, the token has kind `"regex"` and its value holds the capture groups.
/// The search is anchored at the offset, so it never looks further ahead than the match.
/// Still, the pattern sees the whole source, so
/// assertions like `^` and `\b` take the text before the offset into account.
///
/// ~~~
/// use tessel::{regex, Parser, ParseResult};
/// let op = regex(r"\s*([-+])\s*").unwrap();
/// let res: ParseResult = op.parse("1 + 2", 1);
/// let token = res.unwrap();
/// assert_eq!(token.end(), 4);
/// assert_eq!(token.value().as_groups().and_then(|g| g.get(1)), Some("+"));
///
/// // there is a match at offset 2, but not at offset 0
/// let res: ParseResult = op.parse("1 + 2", 0);
/// assert!(res.is_err());
/// ~~~
pub fn regex(pattern: &str) -> Result<Pattern, BuildError> {
    Pattern::new(pattern)
}

/// A parser returned by [`regex`].
#[derive(Clone, Debug)]
pub struct Pattern {
    re: meta::Regex,
    source: String,
}

impl Pattern {
    /// Compile a pattern and return a parser for it.
    pub fn new(pattern: &str) -> Result<Self, BuildError> {
        Self::with_builder(&meta::Builder::new(), pattern)
    }

    /// Compile a pattern with the given configuration, for example to ignore case:
    ///
    /// ~~~
    /// use regex_automata::{meta, util::syntax};
    /// use tessel::{Parser, Pattern, Token};
    /// let mut builder = meta::Builder::new();
    /// builder.syntax(syntax::Config::new().case_insensitive(true));
    /// let select = Pattern::with_builder(&builder, "select").unwrap();
    /// let token: Token = select.parse("SELECT *", 0).unwrap();
    /// assert_eq!(token.size(), 6);
    /// ~~~
    pub fn with_builder(builder: &meta::Builder, pattern: &str) -> Result<Self, BuildError> {
        Ok(Self {
            re: builder.build(pattern)?,
            source: pattern.to_owned(),
        })
    }

    pub fn as_regex(&self) -> &meta::Regex {
        &self.re
    }

    /// The pattern this parser was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl<T> Parser<T> for Pattern {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        let mut caps = self.re.create_captures();
        if src.is_char_boundary(index) {
            let input = Input::new(src)
                .span(index..src.len())
                .anchored(Anchored::Yes);
            self.re.search_captures(&input, &mut caps);
        }
        match caps.get_match() {
            Some(m) => {
                trace!("/{}/ matched {} bytes at {}", self.source, m.len(), index);
                let value = Value::Groups(Groups::from_captures(src, &caps));
                Ok(Token::new(index, m.len(), TokenKind::named("regex"), value))
            }
            None => {
                let msg = format!("cannot match /{}/", self.source);
                Err(ParseError::with_kind(ErrorKind::Mismatch, msg, index))
            }
        }
    }
}
