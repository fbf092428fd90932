//! A small SQL-like query language.
//!
//! ~~~ text
//! echo "SELECT movie.name FROM movie WHERE movie.year >= 2000" | cargo run --example ssql -- --pretty
//! ~~~
//!
//! Queries have the form
//!
//! ~~~ text
//! SELECT table.column [, table.column]*
//! FROM table [JOIN table ON test]*
//! [WHERE test]
//! ~~~
//!
//! where a test compares two values with one of `= > < <= >= <>`, and
//! a value is a column, a number, or a string in single quotes,
//! in which a quote is written as `''`.
//! Keywords are case-insensitive.

use anyhow::Context;
use clap::Parser as _;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::io::{self, Read};
use tessel::{
    alt, from_fn, ignore, list, opt, seq, Combinator, ParseError, ParseResult, Parser, Pattern,
    Token, TokenKind, Value,
};

static SELECT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s*SELECT\s+").unwrap());
static FROM: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s*FROM\s+").unwrap());
static JOIN: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s*JOIN\s+").unwrap());
static ON: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s+ON\s+").unwrap());
static WHERE: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s*WHERE\s+").unwrap());
static WHERE_AHEAD: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)\s*WHERE\b").unwrap());
static WS: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s+").unwrap());
static COMMA: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*,\s*").unwrap());
static DOT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\.").unwrap());
static IDENT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)[a-z][a-z0-9_]*").unwrap());
static NUMBER: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\d+(\.\d+)?").unwrap());
static STRING: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"'((?:[^']|'')*)'").unwrap());
static CMP: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*(<=|>=|<>|=|<|>)\s*").unwrap());

/// Custom token values of the query grammar.
///
/// Names and strings are stored as [`Value::Text`],
/// the columns of a `SELECT` as [`Value::Tokens`] and
/// the test of a `WHERE` as [`Value::Token`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
enum Sql {
    Number(f64),
    Column(Column),
    Test(Box<Test>),
    Join(Box<Join>),
    Source(Source),
    Query(Box<Query>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Column {
    table: String,
    column: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Test {
    lhs: Token<Sql>,
    op: String,
    rhs: Token<Sql>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Join {
    table: String,
    test: Token<Sql>,
}

/// The `FROM` clause.
#[derive(Clone, Debug, PartialEq, Serialize)]
struct Source {
    table: String,
    joins: Vec<Token<Sql>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Query {
    select: Vec<Token<Sql>>,
    from: Token<Sql>,
    #[serde(rename = "where")]
    filter: Option<Token<Sql>>,
}

fn full<T>(token: &Token<T>) -> &str {
    let groups = token.value().as_groups();
    groups.and_then(|g| g.full()).unwrap_or_default()
}

fn name(token: &Token<Sql>) -> Option<String> {
    token.value().as_text().map(str::to_owned)
}

/// Run `p` and build a token of the given kind from the tokens it retained.
fn rule<P, F>(kind: &'static str, p: P, f: F) -> impl Parser<Sql>
where
    P: Parser<Sql>,
    F: Fn(Vec<Token<Sql>>) -> Option<Value<Sql>>,
{
    from_fn(move |src, index| {
        let token = p.parse(src, index)?;
        let size = token.size();
        let items = token.into_value().into_tokens().unwrap_or_default();
        let value = f(items).ok_or_else(|| ParseError::new(format!("malformed {kind}"), index))?;
        Ok(Token::new(index, size, TokenKind::named(kind), value))
    })
}

fn number() -> impl Parser<Sql> {
    from_fn(|src, index| {
        let token: Token<Sql> = NUMBER.parse(src, index)?;
        let n: f64 = full(&token)
            .parse()
            .map_err(|e| ParseError::new(format!("invalid number: {e}"), index))?;
        Ok(token.produce(TokenKind::named("number"), Value::Custom(Sql::Number(n))))
    })
}

fn string() -> impl Parser<Sql> {
    (&*STRING).produce("string", |t: Token<Sql>| {
        let quoted = t.value().as_groups().and_then(|g| g.get(1));
        Value::Text(quoted.unwrap_or_default().replace("''", "'"))
    })
}

fn ident(kind: &'static str) -> impl Parser<Sql> {
    (&*IDENT).produce(kind, |t: Token<Sql>| Value::Text(full(&t).to_owned()))
}

fn column_id() -> impl Parser<Sql> {
    let p = seq((ident("table-name"), ignore(&*DOT), ident("column-name")));
    rule("column-id", p, |items| {
        let [table, column] = <[Token<Sql>; 2]>::try_from(items).ok()?;
        let (table, column) = (name(&table)?, name(&column)?);
        Some(Value::Custom(Sql::Column(Column { table, column })))
    })
}

fn val() -> impl Parser<Sql> {
    alt((column_id(), number(), string()))
}

fn value_test() -> impl Parser<Sql> {
    rule("value-test", seq((val(), &*CMP, val())), |items| {
        let [lhs, op, rhs] = <[Token<Sql>; 3]>::try_from(items).ok()?;
        let op = op.value().as_groups()?.get(1)?.to_owned();
        Some(Value::Custom(Sql::Test(Box::new(Test { lhs, op, rhs }))))
    })
}

fn where_clause() -> impl Parser<Sql> {
    rule("where", seq((ignore(&*WHERE), value_test())), |items| {
        let [test] = <[Token<Sql>; 1]>::try_from(items).ok()?;
        Some(Value::from(test))
    })
}

fn join() -> impl Parser<Sql> {
    let p = seq((ignore(&*JOIN), ident("table-name"), ignore(&*ON), value_test()));
    rule("join", p, |items| {
        let [table, test] = <[Token<Sql>; 2]>::try_from(items).ok()?;
        let table = name(&table)?;
        Some(Value::Custom(Sql::Join(Box::new(Join { table, test }))))
    })
}

fn from_clause() -> impl Parser<Sql> {
    let joins = list(join()).delimiter(&*WS).check_end(&*WHERE_AHEAD);
    let p = seq((ignore(&*FROM), ident("table-name"), opt(joins)));
    rule("from", p, |items| {
        let mut items = items.into_iter();
        let table = name(&items.next()?)?;
        let joins = items.next().and_then(|t| t.into_value().into_tokens());
        let joins = joins.unwrap_or_default();
        Some(Value::Custom(Sql::Source(Source { table, joins })))
    })
}

fn select() -> impl Parser<Sql> {
    let columns = list(column_id()).delimiter(&*COMMA);
    rule("select", seq((ignore(&*SELECT), columns)), |items| {
        let [columns] = <[Token<Sql>; 1]>::try_from(items).ok()?;
        columns.into_value().into_tokens().map(Value::Tokens)
    })
}

fn query() -> impl Parser<Sql> {
    let p = seq((
        select(),
        ignore(&*WS),
        from_clause(),
        ignore(opt(&*WS)),
        opt(where_clause()),
    ));
    rule("query", p, |items| {
        let mut items = items.into_iter();
        let select = items.next()?.into_value().into_tokens()?;
        let from = items.next()?;
        let filter = items.next();
        Some(Value::Custom(Sql::Query(Box::new(Query { select, from, filter }))))
    })
}

/// Parse a query that may be followed by whitespace.
fn parse(src: &str) -> ParseResult<Sql> {
    let token = query().parse(src, 0)?;
    let rest = src.get(token.end()..).unwrap_or_default();
    if !rest.trim().is_empty() {
        return Err(ParseError::new("unexpected input after query", token.end()));
    }
    Ok(token)
}

/// Show the source up to `radius` bytes around `index`, marking `index` with a caret.
fn excerpt(src: &str, index: usize, radius: usize) -> String {
    let floor = |mut i: usize| {
        while !src.is_char_boundary(i) {
            i -= 1;
        }
        i
    };
    let index = floor(index.min(src.len()));
    let start = floor(index.saturating_sub(radius));
    let end = floor((index + radius).min(src.len()));
    let line: String = src[start..end]
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let caret = src[start..index].chars().count();
    format!("{line}\n{}^", " ".repeat(caret))
}

#[derive(clap::Parser)]
#[command(name = "ssql")]
#[command(about = "Parse SQL-like queries and print their token tree as JSON")]
struct Args {
    /// Query to parse; read from standard input if absent
    query: Option<String>,
    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let src = match args.query {
        Some(query) => query,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read query from standard input")?;
            buf
        }
    };

    let token = match parse(&src) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("{}", excerpt(&src, e.index(), 10));
            return Err(e.into());
        }
    };
    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&token)?);
    } else {
        println!("{}", serde_json::to_string(&token)?);
    }
    Ok(())
}
