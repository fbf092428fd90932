//! Create new parsers by combining existing ones.
//!
//! There are two flavours of combinators in this crate:
//!
//! * Functions that take parsers and return a parser:
//!   [`ignore`], [`opt`], [`alt`], [`seq`] and [`list`].
//!   [`alt`] and [`seq`] take a whole collection of parsers, see [`Parsers`].
//! * Combinators in the [`Combinator`] trait:
//!   These are methods on a single parser, such as
//!   [`Combinator::opt`] or [`Combinator::or`].
//!
//! # Overview
//!
//! Here, `a`, `b` and `c` are languages recognised by parsers of the same name.
//!
//! | Language             | Parser                                   | Token kind
//! | :------------------- | :--------------------------------------- | :-----------
//! | `abc`                | [`seq((a, b, c))`](seq)                  | `"sequence"`
//! | <code>a\|b\|c</code> | [`alt((a, b, c))`](alt) or [`a.or(b)`](Combinator::or) | that of the match
//! | `a?`                 | [`opt(a)`](opt) or [`a.opt()`](Combinator::opt) | that of `a`, or ignore
//! | `a+`                 | [`list(a)`](list)                        | `"list"`
//! | `a(ba)*b?`           | [`list(a).delimiter(b)`](List::delimiter) | `"list"`
//!
//! # Ignore tokens
//!
//! Structural combinators collect the tokens of their parts, except for ignore tokens.
//! Ignore tokens still consume input, so they are the means to
//! skip whitespace and punctuation that carry no information:
//!
//! ~~~
//! use tessel::{ignore, seq, text, Parser, ParseResult};
//! let call = seq((text("f"), ignore(text("(")), text("x"), ignore(text(")"))));
//! let res: ParseResult = call.parse("f(x)", 0);
//! let token = res.unwrap();
//! assert_eq!(token.size(), 4);
//! let items = token.value().as_tokens().unwrap();
//! let texts: Vec<_> = items.iter().filter_map(|t| t.value().as_text()).collect();
//! assert_eq!(texts, ["f", "x"]);
//! ~~~
use crate::{ErrorKind, ParseError, ParseResult, Parser, Token, TokenKind, Value};
use core::ops::ControlFlow;
use log::trace;

/// A collection of parsers that can be run one after the other.
///
/// This is implemented for tuples of up to twelve parsers,
/// which may all have different types, as well as for
/// slices, arrays and vectors of parsers of the same type.
/// To mix parsers of different types in a vector, box them,
/// see [`Combinator::boxed`].
pub trait Parsers<T> {
    /// Call `f` on every parser in order, until `f` breaks.
    fn try_each<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&dyn Parser<T>) -> ControlFlow<B>;
}

impl<T, P: Parser<T>> Parsers<T> for [P] {
    fn try_each<B, F>(&self, mut f: F) -> ControlFlow<B>
    where
        F: FnMut(&dyn Parser<T>) -> ControlFlow<B>,
    {
        for p in self {
            if let ControlFlow::Break(b) = f(p as &dyn Parser<T>) {
                return ControlFlow::Break(b);
            }
        }
        ControlFlow::Continue(())
    }
}

impl<T, P: Parser<T>, const N: usize> Parsers<T> for [P; N] {
    fn try_each<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&dyn Parser<T>) -> ControlFlow<B>,
    {
        self.as_slice().try_each(f)
    }
}

impl<T, P: Parser<T>> Parsers<T> for Vec<P> {
    fn try_each<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&dyn Parser<T>) -> ControlFlow<B>,
    {
        self.as_slice().try_each(f)
    }
}

impl<T, S: Parsers<T> + ?Sized> Parsers<T> for &S {
    fn try_each<B, F>(&self, f: F) -> ControlFlow<B>
    where
        F: FnMut(&dyn Parser<T>) -> ControlFlow<B>,
    {
        (**self).try_each(f)
    }
}

/// Generate `impl`s of [`Parsers`] for `(P1, P2, ..., Pn)`.
macro_rules! impl_parsers_for_tuples {
    ($($acc:ident)+; $head:ident $($tail:ident)*) => {
        impl_parsers_for_tuples!($($acc)+      ;          );
        impl_parsers_for_tuples!($($acc)+ $head; $($tail)*);
    };
    ($($parser:ident)+;) => {
        #[allow(non_snake_case)]
        impl<T, $($parser: Parser<T>),+> Parsers<T> for ($($parser),+,) {
            fn try_each<B, F>(&self, mut f: F) -> ControlFlow<B>
            where
                F: FnMut(&dyn Parser<T>) -> ControlFlow<B>,
            {
                let ($($parser),+,) = self;
                $(if let ControlFlow::Break(b) = f($parser as &dyn Parser<T>) {
                    return ControlFlow::Break(b);
                })+
                ControlFlow::Continue(())
            }
        }
    }
}
impl_parsers_for_tuples!(P1; P2 P3 P4 P5 P6 P7 P8 P9 P10 P11 P12);

/// A parser that always fails with the given message.
///
/// This is also the type of the absent delimiter and lookahead
/// parsers in [`Seq`] and [`List`].
pub fn fail(message: impl Into<String>) -> Fail {
    Fail(message.into())
}

/// A parser returned by [`fail`].
#[derive(Clone, Debug)]
pub struct Fail(String);

impl<T> Parser<T> for Fail {
    fn parse(&self, _src: &str, index: usize) -> ParseResult<T> {
        Err(ParseError::new(self.0.clone(), index))
    }
}

/// Match what `p` matches, but return an ignore token.
pub fn ignore<P>(p: P) -> Ignore<P> {
    Ignore(p)
}

/// A parser returned by [`ignore`].
#[derive(Clone)]
pub struct Ignore<P>(P);

impl<T, P: Parser<T>> Parser<T> for Ignore<P> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        self.0.parse(src, index).map(Token::ignore)
    }
}

/// Match what `p` matches, or nothing.
///
/// If `p` fails, this returns an ignore token of size 0 at the given offset,
/// so the resulting parser never fails.
///
/// ~~~
/// use tessel::{opt, text, Parser, ParseResult};
/// let res: ParseResult = opt(text("-")).parse("5", 0);
/// let token = res.unwrap();
/// assert!(token.is_ignore());
/// assert_eq!((token.index(), token.size()), (0, 0));
/// ~~~
pub fn opt<P>(p: P) -> Opt<P> {
    Opt(p)
}

/// A parser returned by [`opt`].
#[derive(Clone)]
pub struct Opt<P>(P);

impl<T, P: Parser<T>> Parser<T> for Opt<P> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        self.0.parse(src, index).or_else(|e| {
            trace!("optional parser skipped: {}", e);
            Ok(Token::ignored(index, 0))
        })
    }
}

/// Return the token of the first parser that succeeds.
///
/// All parsers are run at the same offset, in the given order.
/// This is ordered choice: if several parsers match,
/// the first one wins, even if a later one would match more input.
/// If all parsers fail, their errors are merged with [`ParseError::merge`].
///
/// ~~~
/// use tessel::{alt, text, ErrorKind, Parser, ParseResult};
/// let p = alt((text("foo"), text("bar")));
/// let res: ParseResult = p.parse("bar", 0);
/// assert_eq!(res.unwrap().value().as_text(), Some("bar"));
///
/// let res: ParseResult = p.parse("baz", 0);
/// let err = res.unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Alternatives);
/// assert!(err.message().contains("\"foo\"") && err.message().contains("\"bar\""));
/// ~~~
pub fn alt<Ps>(parsers: Ps) -> Alt<Ps> {
    Alt(parsers)
}

/// A parser returned by [`alt`].
#[derive(Clone)]
pub struct Alt<Ps>(Ps);

impl<T, Ps: Parsers<T>> Parser<T> for Alt<Ps> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        let mut errors = Vec::new();
        let found = self.0.try_each(|p| match p.parse(src, index) {
            Ok(token) => ControlFlow::Break(token),
            Err(e) => {
                errors.push(e);
                ControlFlow::Continue(())
            }
        });
        match found {
            ControlFlow::Break(token) => {
                trace!("alternative {} matched at {}", errors.len(), index);
                Ok(token)
            }
            ControlFlow::Continue(()) => Err(ParseError::merge(errors, index)),
        }
    }
}

/// Run parsers one after the other, each starting where the previous one ended.
///
/// The resulting token spans all consumed input and
/// holds the tokens of all parsers, except for ignore tokens.
/// A sequence that yields only ignore tokens fails.
///
/// The end of the input is only checked when a parser fails:
/// a parser that succeeds at the end of the input, for example
/// an [`opt`] that matches nothing, just adds its token.
/// If a parser fails at the end of the input, the sequence fails with
/// [`ErrorKind::UnexpectedEnd`].
/// Otherwise, the error of the failing parser is returned, unless
/// a lookahead parser is set with [`Seq::check_end`]: if that one matches where
/// the failing parser started, the sequence succeeds with the tokens matched so far.
///
/// ~~~
/// use tessel::{seq, text, Parser, ParseResult};
/// // "key" followed by an optional "=value", but stop at ";"
/// let p = seq((text("key"), text("="), text("value"))).check_end(text(";"));
/// let res: ParseResult = p.parse("key;", 0);
/// let token = res.unwrap();
/// assert_eq!(token.size(), 3);
/// assert_eq!(token.value().as_tokens().map(|t| t.len()), Some(1));
///
/// let res: ParseResult = p.parse("key!", 0);
/// assert_eq!(res.unwrap_err().index(), 3);
/// ~~~
pub fn seq<Ps>(parsers: Ps) -> Seq<Ps> {
    Seq {
        parsers,
        end: None,
    }
}

/// A parser returned by [`seq`].
#[derive(Clone)]
pub struct Seq<Ps, E = Fail> {
    parsers: Ps,
    end: Option<E>,
}

impl<Ps, E> Seq<Ps, E> {
    /// Succeed early if a parser fails at a position where `end` matches.
    ///
    /// `end` only looks ahead; the input it matches is not consumed.
    pub fn check_end<E2>(self, end: E2) -> Seq<Ps, E2> {
        Seq {
            parsers: self.parsers,
            end: Some(end),
        }
    }
}

/// Return true if the lookahead parser `end` is present and matches.
fn at_end<T, E: Parser<T>>(end: &Option<E>, src: &str, index: usize) -> bool {
    end.as_ref()
        .map_or(false, |end| end.parse(src, index).is_ok())
}

impl<T, Ps: Parsers<T>, E: Parser<T>> Parser<T> for Seq<Ps, E> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        let mut items = Vec::new();
        let mut last = index;
        let flow = self.parsers.try_each(|p| match p.parse(src, last) {
            Ok(token) => {
                last = token.end();
                if !token.is_ignore() {
                    items.push(token);
                }
                ControlFlow::Continue(())
            }
            Err(_) if last >= src.len() => {
                let msg = "unexpected end of input";
                let e = ParseError::with_kind(ErrorKind::UnexpectedEnd, msg, last);
                ControlFlow::Break(Err(e))
            }
            Err(e) => {
                if at_end::<T, E>(&self.end, src, last) {
                    trace!("sequence stopped early at {}", last);
                    ControlFlow::Break(Ok(()))
                } else {
                    ControlFlow::Break(Err(e))
                }
            }
        });
        if let ControlFlow::Break(Err(e)) = flow {
            return Err(e);
        }

        if items.is_empty() {
            let msg = "cannot match sequence";
            return Err(ParseError::with_kind(ErrorKind::EmptySequence, msg, last));
        }
        let kind = TokenKind::named("sequence");
        Ok(Token::new(index, last - index, kind, Value::Tokens(items)))
    }
}

/// Match `item` one or more times.
///
/// ~~~
/// use tessel::{list, regex, Parser, ParseResult};
/// let p = list(regex("[a-z]+").unwrap()).delimiter(regex(",").unwrap());
/// let res: ParseResult = p.parse("a,b,c", 0);
/// let token = res.unwrap();
/// assert_eq!((token.index(), token.end()), (0, 5));
/// let items = token.value().as_tokens().unwrap();
/// let words: Vec<_> = items.iter().filter_map(|t| t.value().as_groups()?.full()).collect();
/// assert_eq!(words, ["a", "b", "c"]);
/// ~~~
pub fn list<P>(item: P) -> List<P> {
    List {
        item,
        delimiter: None,
        end: None,
    }
}

/// A parser returned by [`list`].
///
/// The list is parsed as follows:
/// As long as the input is not exhausted, parse an item.
/// If this fails, the whole list fails with the error of the item.
/// Otherwise, stop if the [lookahead parser](List::check_end) matches after the item.
/// Then, if a [delimiter](List::delimiter) is set, parse it; if that fails, stop.
///
/// When stopping, the list succeeds if it has collected a non-ignore item,
/// otherwise it fails with [`ErrorKind::EmptyList`].
#[derive(Clone)]
pub struct List<P, D = Fail, E = Fail> {
    item: P,
    delimiter: Option<D>,
    end: Option<E>,
}

impl<P, D, E> List<P, D, E> {
    /// Require `delimiter` between items.
    ///
    /// A trailing delimiter is consumed.
    pub fn delimiter<D2>(self, delimiter: D2) -> List<P, D2, E> {
        List {
            item: self.item,
            delimiter: Some(delimiter),
            end: self.end,
        }
    }

    /// Stop after an item if `end` matches.
    ///
    /// `end` only looks ahead; the input it matches is not consumed.
    pub fn check_end<E2>(self, end: E2) -> List<P, D, E2> {
        List {
            item: self.item,
            delimiter: self.delimiter,
            end: Some(end),
        }
    }
}

impl<T, P: Parser<T>, D: Parser<T>, E: Parser<T>> Parser<T> for List<P, D, E> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        let mut items = Vec::new();
        let mut last = index;
        while last < src.len() {
            let start = last;
            let item = self.item.parse(src, last)?;
            last = item.end();
            if !item.is_ignore() {
                items.push(item);
            }

            if at_end::<T, E>(&self.end, src, last) {
                trace!("list end detected at {}", last);
                break;
            }
            if let Some(delimiter) = &self.delimiter {
                match delimiter.parse(src, last) {
                    Ok(token) => last = token.end(),
                    Err(_) => break,
                }
            }
            if last == start {
                trace!("list item consumed nothing at {}", last);
                break;
            }
        }

        if items.is_empty() {
            let msg = "cannot match list";
            return Err(ParseError::with_kind(ErrorKind::EmptyList, msg, last));
        }
        let kind = TokenKind::named("list");
        Ok(Token::new(index, last - index, kind, Value::Tokens(items)))
    }
}

/// A combinator combines parsers to form new ones.
///
/// Every [`Parser`] implements the [`Combinator`] trait.
/// To use the [`Combinator`] trait, import it as follows:
///
/// ~~~
/// use tessel::Combinator;
/// ~~~
pub trait Combinator<T>: Parser<T>
where
    Self: Sized,
{
    /// Apply a function to the token of the parser.
    fn map<F: Fn(Token<T>) -> Token<T>>(self, f: F) -> Map<Self, F> {
        Map(self, f)
    }

    /// Relabel the token of the parser, computing a new value from it.
    ///
    /// The position of the token is preserved.
    ///
    /// ~~~
    /// use tessel::{regex, Combinator, Parser, Value};
    /// let ident = regex("[a-z]+").unwrap().produce("identifier", |t| {
    ///     Value::Text(t.value().as_groups().and_then(|g| g.full()).unwrap_or_default().into())
    /// });
    /// let token = Parser::<()>::parse(&ident, "abc", 0).unwrap();
    /// assert!(token.is("identifier"));
    /// assert_eq!(token.value().as_text(), Some("abc"));
    /// ~~~
    fn produce<F>(self, kind: impl Into<String>, f: F) -> Produce<Self, F>
    where
        F: Fn(Token<T>) -> Value<T>,
    {
        Produce(self, TokenKind::named(kind), f)
    }

    /// Apply a function to the error of the parser.
    fn map_err<F: Fn(ParseError) -> ParseError>(self, f: F) -> MapErr<Self, F> {
        MapErr(self, f)
    }

    /// See [`ignore`].
    fn ignore(self) -> Ignore<Self> {
        Ignore(self)
    }

    /// See [`opt`].
    fn opt(self) -> Opt<Self> {
        Opt(self)
    }

    /// If the first parser succeeds, return its token, otherwise
    /// return the token of the second parser.
    ///
    /// `p0.or(p1)` is equivalent to `alt((p0, p1))`.
    /// However, `p0.or(p1).or(p2)` nests the merged errors,
    /// so for more than two parsers, [`alt`] is preferable.
    fn or<P: Parser<T>>(self, other: P) -> Alt<(Self, P)> {
        Alt((self, other))
    }

    /// Erase the type of the parser.
    fn boxed<'a>(self) -> Box<dyn Parser<T> + 'a>
    where
        Self: 'a,
    {
        Box::new(self)
    }
}

impl<T, P: Parser<T>> Combinator<T> for P {}

/// A parser returned by [`Combinator::map`].
#[derive(Clone)]
pub struct Map<P, F>(P, F);

impl<T, P: Parser<T>, F: Fn(Token<T>) -> Token<T>> Parser<T> for Map<P, F> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        self.0.parse(src, index).map(&self.1)
    }
}

/// A parser returned by [`Combinator::produce`].
#[derive(Clone)]
pub struct Produce<P, F>(P, TokenKind, F);

impl<T, P: Parser<T>, F: Fn(Token<T>) -> Value<T>> Parser<T> for Produce<P, F> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        let token = self.0.parse(src, index)?;
        let (index, size) = (token.index(), token.size());
        Ok(Token::new(index, size, self.1.clone(), (self.2)(token)))
    }
}

/// A parser returned by [`Combinator::map_err`].
#[derive(Clone)]
pub struct MapErr<P, F>(P, F);

impl<T, P: Parser<T>, F: Fn(ParseError) -> ParseError> Parser<T> for MapErr<P, F> {
    fn parse(&self, src: &str, index: usize) -> ParseResult<T> {
        self.0.parse(src, index).map_err(&self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{text, Pattern};

    fn re(s: &str) -> Pattern {
        Pattern::new(s).unwrap()
    }

    fn texts<T>(token: &Token<T>) -> Vec<&str> {
        let items = token.value().as_tokens().unwrap_or_default();
        items.iter().filter_map(|t| t.value().as_text()).collect()
    }

    #[test]
    fn alt_prefers_first() {
        let p = alt((text("a"), text("ab")));
        let t: Token = p.parse("ab", 0).unwrap();
        assert_eq!(t.size(), 1);
        let p = alt([text("ab"), text("a")]);
        let t: Token = p.parse("ab", 0).unwrap();
        assert_eq!(t.size(), 2);
    }

    #[test]
    fn alt_empty() {
        let p = alt(Vec::<Fail>::new());
        let e = Parser::<()>::parse(&p, "x", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Alternatives);
        assert!(e.causes().is_empty());
    }

    #[test]
    fn alt_boxed() {
        let p: Vec<Box<dyn Parser<()>>> = vec![text("x").boxed(), re("[0-9]").boxed()];
        let t = alt(p).parse("7", 0).unwrap();
        assert!(t.is("regex"));
    }

    #[test]
    fn seq_all_ignored() {
        let p = seq((ignore(text("(")), ignore(text(")"))));
        let e = Parser::<()>::parse(&p, "()x", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::EmptySequence);
        assert_eq!(e.index(), 2);
    }

    #[test]
    fn seq_unexpected_end() {
        let p = seq((text("a"), text("b")));
        let e = Parser::<()>::parse(&p, "a", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnexpectedEnd);
        assert_eq!(e.index(), 1);
        // the end of input takes precedence over the lookahead
        let p = seq((text("a"), text("b"))).check_end(text(""));
        let e = Parser::<()>::parse(&p, "a", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnexpectedEnd);
    }

    #[test]
    fn seq_optional_at_end() {
        let p = seq((text("a"), opt(text("b"))));
        let t: Token = p.parse("a", 0).unwrap();
        assert_eq!(t.size(), 1);
        assert_eq!(texts(&t), ["a"]);
    }

    #[test]
    fn seq_propagates_error() {
        let p = seq((text("a"), text("b"))).check_end(text(";"));
        let e = Parser::<()>::parse(&p, "ac", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Mismatch);
        assert_eq!(e.index(), 1);
    }

    #[test]
    fn list_without_delimiter() {
        let p = list(text("ab"));
        let t: Token = p.parse("ababab", 0).unwrap();
        assert_eq!(texts(&t), ["ab", "ab", "ab"]);
        // an item that fails after the first one fails the whole list
        let e = Parser::<()>::parse(&p, "abax", 0).unwrap_err();
        assert_eq!(e.index(), 2);
    }

    #[test]
    fn list_trailing_delimiter() {
        let p = list(re("[a-z]")).delimiter(text(","));
        let t: Token = p.parse("a,b,", 0).unwrap();
        assert_eq!((t.size(), t.value().as_tokens().map(|ts| ts.len())), (4, Some(2)));
        let t: Token = p.parse("a,b;c", 0).unwrap();
        assert_eq!(t.end(), 3);
    }

    #[test]
    fn list_check_end() {
        let p = list(re("[a-z]+")).delimiter(text(" ")).check_end(text(" WHERE"));
        let t: Token = p.parse("a b WHERE", 0).unwrap();
        assert_eq!(t.end(), 3);
    }

    #[test]
    fn list_empty() {
        let e = Parser::<()>::parse(&list(text("a")), "", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::EmptyList);
        let e = Parser::<()>::parse(&list(ignore(text("a"))), "a", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::EmptyList);
        assert_eq!(e.index(), 1);
    }

    #[test]
    fn list_zero_length_items() {
        let p = list(opt(text("a")));
        let e = Parser::<()>::parse(&p, "b", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::EmptyList);
        assert_eq!(e.index(), 0);
    }

    #[test]
    fn fail_always_fails() {
        let e = Parser::<()>::parse(&fail("no way"), "abc", 2).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Custom);
        assert_eq!(e.to_string(), "no way at 2");
        let t: Token = alt((fail("no"), text("a"))).parse("a", 0).unwrap();
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn map_keeps_result_shape() {
        let p = text("ab").map(|t: Token| t.ignore());
        let t = p.parse("abc", 0).unwrap();
        assert!(t.is_ignore());
        assert_eq!((t.index(), t.size()), (0, 2));
        let e = p.parse("xbc", 0).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Mismatch);
    }

    #[test]
    fn map_err_and_produce() {
        let p = Combinator::<()>::map_err(text("x"), |e| ParseError::new("wanted x", e.index()));
        let e = Parser::<()>::parse(&p, "y", 0).unwrap_err();
        assert_eq!(e.to_string(), "wanted x at 0");

        let p = text("x").produce("var", |t: Token<char>| {
            Value::Custom(t.value().as_text().and_then(|s| s.chars().next()).unwrap_or('?'))
        });
        let t = p.parse("x", 0).unwrap();
        assert_eq!(t.value().as_custom(), Some(&'x'));
        assert_eq!(t.kind(), &TokenKind::named("var"));
    }
}
