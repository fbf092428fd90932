//! Positioned values produced by successful parses.

use core::fmt;
use regex_automata::util::captures::Captures;
use regex_automata::PatternID;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The label of a token.
///
/// Grammars label their tokens with arbitrary names, such as `"number"`.
/// The structural combinators use the names `"text"`, `"regex"`, `"sequence"` and `"list"`.
/// Tokens of kind [`TokenKind::Ignore`] are consumed input whose
/// payload does not matter; see [`Token::ignore`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum TokenKind {
    /// Consumed input without a payload.
    Ignore,
    /// A label chosen by the parser that produced the token.
    Named(String),
}

impl TokenKind {
    /// Shorthand for `TokenKind::Named(name.into())`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Return the name of the kind, or `None` for [`TokenKind::Ignore`].
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Ignore => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ignore => "<ignore>".fmt(f),
            Self::Named(name) => name.fmt(f),
        }
    }
}

/// Capture groups of a regular expression match.
///
/// Group 0 is the whole match; groups that did not participate in the match are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Groups {
    groups: Vec<Option<String>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    names: Vec<Option<String>>,
}

impl Groups {
    pub(crate) fn from_captures(src: &str, caps: &Captures) -> Self {
        let groups = caps.iter().map(|span| Some(src.get(span?.range())?.to_owned()));
        let names = caps.group_info().pattern_names(PatternID::ZERO);
        Self {
            groups: groups.collect(),
            names: names.map(|name| name.map(str::to_owned)).collect(),
        }
    }

    /// The text matched by the whole pattern.
    pub fn full(&self) -> Option<&str> {
        self.get(0)
    }

    /// The text matched by the `i`-th group.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.groups.get(i)?.as_deref()
    }

    /// The text matched by the group called `name`, as in `(?P<name>...)`.
    pub fn name(&self, name: &str) -> Option<&str> {
        let i = self.names.iter().position(|n| n.as_deref() == Some(name))?;
        self.get(i)
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.groups.iter().map(|g| g.as_deref())
    }
}

/// The payload of a token.
///
/// The primitive and structural combinators produce
/// [`Text`](Value::Text), [`Groups`](Value::Groups) and [`Tokens`](Value::Tokens);
/// grammars are free to replace them by anything else via [`Token::produce`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum Value<T> {
    /// No payload, as carried by ignore tokens.
    None,
    /// Matched literal text.
    Text(String),
    /// Capture groups of a regular expression match.
    Groups(Groups),
    /// A single token, for example the interesting part of a sequence.
    Token(Box<Token<T>>),
    /// Retained tokens of a sequence or list, in order.
    Tokens(Vec<Token<T>>),
    /// Grammar-specific data.
    Custom(T),
}

impl<T> Value<T> {
    /// Return true for [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The text of a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The capture groups of a [`Value::Groups`].
    pub fn as_groups(&self) -> Option<&Groups> {
        match self {
            Self::Groups(g) => Some(g),
            _ => None,
        }
    }

    /// The token inside of a [`Value::Token`].
    pub fn as_token(&self) -> Option<&Token<T>> {
        match self {
            Self::Token(t) => Some(t),
            _ => None,
        }
    }

    /// The tokens of a [`Value::Tokens`].
    pub fn as_tokens(&self) -> Option<&[Token<T>]> {
        match self {
            Self::Tokens(ts) => Some(ts),
            _ => None,
        }
    }

    /// The data of a [`Value::Custom`].
    pub fn as_custom(&self) -> Option<&T> {
        match self {
            Self::Custom(x) => Some(x),
            _ => None,
        }
    }

    /// Take the tokens out of a [`Value::Tokens`].
    pub fn into_tokens(self) -> Option<Vec<Token<T>>> {
        match self {
            Self::Tokens(ts) => Some(ts),
            _ => None,
        }
    }

    /// Take the data out of a [`Value::Custom`].
    pub fn into_custom(self) -> Option<T> {
        match self {
            Self::Custom(x) => Some(x),
            _ => None,
        }
    }
}

impl<T> From<Token<T>> for Value<T> {
    fn from(token: Token<T>) -> Self {
        Self::Token(Box::new(token))
    }
}

impl<T> From<Vec<Token<T>>> for Value<T> {
    fn from(tokens: Vec<Token<T>>) -> Self {
        Self::Tokens(tokens)
    }
}

/// A labelled value that was parsed from `src[index..index + size]`.
///
/// Tokens cannot be modified once created.
/// [`Token::produce`] and [`Token::ignore`] yield new tokens
/// that cover the same span of the source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Token<T = ()> {
    index: usize,
    size: usize,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    kind: TokenKind,
    value: Value<T>,
}

impl<T> Token<T> {
    /// Create a token covering `size` bytes starting at `index`.
    pub fn new(index: usize, size: usize, kind: TokenKind, value: Value<T>) -> Self {
        Self {
            index,
            size,
            kind,
            value,
        }
    }

    /// Create a token that consumes `size` bytes at `index`, but is otherwise ignored.
    pub fn ignored(index: usize, size: usize) -> Self {
        Self::new(index, size, TokenKind::Ignore, Value::None)
    }

    /// Offset of the first byte covered by the token.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of bytes covered by the token.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset of the first byte after the token, i.e. `index + size`.
    pub fn end(&self) -> usize {
        self.index + self.size
    }

    /// Label of the token.
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Payload of the token.
    pub fn value(&self) -> &Value<T> {
        &self.value
    }

    pub fn into_value(self) -> Value<T> {
        self.value
    }

    /// Return true if the token is of kind [`TokenKind::Ignore`].
    pub fn is_ignore(&self) -> bool {
        self.kind == TokenKind::Ignore
    }

    /// Return true if the token is labelled with the given name.
    pub fn is(&self, name: &str) -> bool {
        self.kind.name() == Some(name)
    }

    /// Relabel the token, keeping its position.
    ///
    /// ~~~
    /// # use tessel::{Token, TokenKind, Value};
    /// let raw: Token<u32> = Token::new(3, 2, TokenKind::named("regex"), Value::Text("42".into()));
    /// let num = raw.produce(TokenKind::named("number"), Value::Custom(42));
    /// assert_eq!((num.index(), num.size()), (3, 2));
    /// assert!(num.is("number"));
    /// ~~~
    pub fn produce(self, kind: TokenKind, value: Value<T>) -> Self {
        Self::new(self.index, self.size, kind, value)
    }

    /// Turn the token into an ignore token, keeping its position.
    pub fn ignore(self) -> Self {
        Self::ignored(self.index, self.size)
    }
}
