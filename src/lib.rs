//! Backtracking parser combinators producing positioned tokens.
//!
//! A parser in this crate is a function from a source string and a start offset
//! to either a [`Token`] that describes what was matched at that offset, or a
//! [`ParseError`] that describes why nothing was matched.
//! Grammars are built by composing a handful of combinators:
//!
//! | Combinator              | Matches
//! | :---------------------- | :---------------------------------------------------
//! | [`text`]                | a literal string ([`text_ci`] ignores case)
//! | [`regex`]               | a regular expression, starting exactly at the offset
//! | [`ignore`]              | what the wrapped parser matches, discarding its payload
//! | [`opt`]                 | what the wrapped parser matches, or nothing
//! | [`alt`]                 | what the first succeeding parser matches
//! | [`seq`]                 | all parsers, one after another
//! | [`list`]                | an item parser repeatedly, optionally with delimiters
//!
//! ~~~
//! use tessel::{list, regex, seq, text, Parser, ParseResult};
//!
//! let word = || regex("[a-z]+").unwrap();
//! let words = list(word()).delimiter(text(","));
//! let res: ParseResult = words.parse("a,b,c", 0);
//! let token = res.unwrap();
//! assert_eq!((token.index(), token.end()), (0, 5));
//! assert_eq!(token.value().as_tokens().map(|items| items.len()), Some(3));
//!
//! let res: ParseResult = seq((word(), text("!"))).parse("hi?", 0);
//! assert_eq!(res.unwrap_err().index(), 2);
//! ~~~
//!
//! Parsing never mutates anything: every parser is a pure function of
//! the source and the offset, so alternatives can simply be retried from
//! the same offset when a branch fails.
//! The price is that nothing is memoised, so grammars with a lot of
//! shared prefixes between alternatives may re-parse the same input many times.
//!
//! # Left recursion
//!
//! Like every recursive-descent parser, this crate cannot handle
//! left-recursive rules such as `expr ::= expr '-' term`.
//! Either write the rule right-recursively and re-associate the resulting tree,
//! or match the operator chain with [`list`] and fold over the items.
//! The `calc` demo shows the first approach.
#![forbid(unsafe_code)]

pub mod combinator;
pub mod error;
pub mod str;
pub mod token;

#[doc(inline)]
pub use combinator::{alt, fail, ignore, list, opt, seq, Combinator, Parsers};
#[doc(inline)]
pub use error::{ErrorKind, ParseError, ParseResult};
#[doc(inline)]
pub use str::{regex, text, text_ci, Pattern, Text};
#[doc(inline)]
pub use token::{Groups, Token, TokenKind, Value};

use std::rc::Rc;
use std::sync::Arc;

/// A parser takes a source string and a start offset, and
/// yields either a token starting at that offset or an error.
///
/// The returned token always starts at `index`, and its end never exceeds `src.len()`.
/// Offsets are byte offsets into `src`.
///
/// `parse` takes `&self`, because backtracking means that
/// the same parser may be run many times on different offsets.
/// This also makes `dyn Parser<T>` usable, which is handy to erase
/// the types of large grammars, see [`Combinator::boxed`].
///
/// The type parameter `T` is the type of custom values that a grammar
/// stores in its tokens via [`Value::Custom`].
/// Primitive parsers like [`text`] work for any `T`.
pub trait Parser<T> {
    /// Parse a token starting at byte offset `index` of `src`.
    fn parse(&self, src: &str, index: usize) -> ParseResult<T>;
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for &P {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        (**self).parse(src, index)
    }
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for Box<P> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        (**self).parse(src, index)
    }
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for Rc<P> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        (**self).parse(src, index)
    }
}

impl<T, P: Parser<T> + ?Sized> Parser<T> for Arc<P> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        (**self).parse(src, index)
    }
}

/// Construct a parser from a function.
///
/// This is similar to [`core::iter::from_fn`].
/// It is the usual way to write a grammar rule that post-processes
/// the token of another parser, for example to relabel it:
///
/// ~~~
/// use tessel::{from_fn, regex, ParseError, Parser, TokenKind, Value};
///
/// fn number() -> impl Parser<f64> {
///     let digits = regex(r"\d+").unwrap();
///     from_fn(move |src, index| {
///         let token = digits.parse(src, index)?;
///         let n: f64 = token
///             .value()
///             .as_groups()
///             .and_then(|g| g.full()?.parse().ok())
///             .ok_or_else(|| ParseError::new("invalid number", index))?;
///         Ok(token.produce(TokenKind::named("number"), Value::Custom(n)))
///     })
/// }
///
/// let token = number().parse("42", 0).unwrap();
/// assert!(token.is("number"));
/// assert_eq!(token.value().as_custom(), Some(&42.0));
/// ~~~
pub fn from_fn<T, F: Fn(&str, usize) -> ParseResult<T>>(f: F) -> FromFn<F> {
    FromFn(f)
}

/// A parser that returns the output of the function `F` called with given source and offset.
///
/// This is returned by [`from_fn`].
#[derive(Clone)]
pub struct FromFn<F>(F);

impl<T, F: Fn(&str, usize) -> ParseResult<T>> Parser<T> for FromFn<F> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        self.0(src, index)
    }
}

/// Lazily construct a parser from a function.
///
/// `lazy!(p)` expands to `from_fn(|src, index| p().parse(src, index))`.
/// The parser `p()` is therefore only built once parsing reaches it,
/// and the type of the resulting parser does not mention the type of `p()`.
/// This allows you to create recursive grammar rules:
///
/// ~~~
/// use tessel::{alt, lazy, seq, text, Parser, ParseResult};
///
/// // nested ::= "(" nested ")" | "x"
/// fn nested() -> impl Parser<()> {
///     alt((seq((text("("), lazy!(nested), text(")"))), text("x")))
/// }
///
/// let res: ParseResult = nested().parse("((x))", 0);
/// assert_eq!(res.unwrap().end(), 5);
/// ~~~
///
/// Note that a rule is rebuilt every time parsing reaches it.
/// Building a rule is cheap for [`text`] and the structural combinators,
/// but compiling a [`Pattern`] is not, so rules that are reached often
/// should compile their patterns once, for example in a static.
#[macro_export]
macro_rules! lazy {
    ($p:expr) => {
        $crate::from_fn(|src: &str, index: usize| $crate::Parser::parse(&$p(), src, index))
    };
}
