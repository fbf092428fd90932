//! Arithmetic expressions with variables and assignments.
//!
//! ~~~ text
//! cargo run --example calc -- --pretty --eval -v x=3 -v a=8 "y = 2 + x * x * (a - 5) / 3 % 15"
//! ~~~
//!
//! The grammar is right-recursive, because a recursive-descent parser
//! cannot handle left-recursive rules such as `add ::= add '+' mul`:
//!
//! ~~~ text
//! expr   ::= add | mul | factor
//! add    ::= (mul | atom) ('+' | '-') (add | mul | atom)
//! mul    ::= atom ('*' | '/' | '%') (mul | atom)
//! factor ::= assign | atom
//! assign ::= identifier '=' expr
//! atom   ::= number | identifier | '(' expr ')'
//! ~~~
//!
//! After parsing an operator chain, it is re-associated to the left,
//! so that `1 - 2 - 3` means `(1 - 2) - 3`.
//! Parenthesised expressions become `paren` tokens,
//! which the re-association does not look into.

use clap::Parser as _;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Read};
use tessel::{
    alt, from_fn, ignore, lazy, seq, Combinator, ParseError, ParseResult, Parser, Pattern, Token,
    TokenKind, Value,
};

static NUMBER: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\d+(\.\d+)?").unwrap());
static IDENT: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"(?i)[a-z_][a-z_0-9]*").unwrap());
static ADD_OP: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*([-+])\s*").unwrap());
static MUL_OP: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*([*/%])\s*").unwrap());
static EQUALS: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*=\s*").unwrap());
static LPAREN: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*\(\s*").unwrap());
static RPAREN: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"\s*\)\s*").unwrap());

/// Custom token values of the calculator grammar.
///
/// Identifiers are stored as [`Value::Text`] and
/// parenthesised expressions as [`Value::Token`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
enum Calc {
    Number(f64),
    Binary(Box<Binary>),
    Assign(Box<Assign>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Binary {
    lhs: Token<Calc>,
    op: char,
    rhs: Token<Calc>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Assign {
    name: String,
    rhs: Token<Calc>,
}

fn full<T>(token: &Token<T>) -> &str {
    let groups = token.value().as_groups();
    groups.and_then(|g| g.full()).unwrap_or_default()
}

fn operator<T>(token: &Token<T>) -> Option<char> {
    token.value().as_groups()?.get(1)?.chars().next()
}

fn number() -> impl Parser<Calc> {
    from_fn(|src, index| {
        let token: Token<Calc> = NUMBER.parse(src, index)?;
        let n: f64 = full(&token)
            .parse()
            .map_err(|e| ParseError::new(format!("invalid number: {e}"), index))?;
        Ok(token.produce(TokenKind::named("number"), Value::Custom(Calc::Number(n))))
    })
}

fn identifier() -> impl Parser<Calc> {
    (&*IDENT).produce("identifier", |t: Token<Calc>| Value::Text(full(&t).to_owned()))
}

fn paren() -> impl Parser<Calc> {
    let p = seq((ignore(&*LPAREN), lazy!(expr), ignore(&*RPAREN)));
    p.produce("paren", |t: Token<Calc>| {
        let inner = t.into_value().into_tokens().and_then(|ts| ts.into_iter().next());
        inner.map_or(Value::None, Value::from)
    })
}

fn atom() -> impl Parser<Calc> {
    alt((number(), identifier(), paren()))
}

/// Move the terms and operators of a chain of `kind` tokens into `terms` and `ops`, in order.
fn flatten(kind: &str, token: Token<Calc>, terms: &mut Vec<Token<Calc>>, ops: &mut Vec<char>) {
    let binary = matches!(token.value(), Value::Custom(Calc::Binary(_)));
    if !(binary && token.is(kind)) {
        terms.push(token);
        return;
    }
    if let Value::Custom(Calc::Binary(b)) = token.into_value() {
        let Binary { lhs, op, rhs } = *b;
        flatten(kind, lhs, terms, ops);
        ops.push(op);
        flatten(kind, rhs, terms, ops);
    }
}

/// Build `lhs op rhs`, associating to the left if `rhs` is a chain of the same kind.
///
/// `lhs` is never a chain of the same kind, because the grammar is right-recursive.
fn chain(kind: &str, lhs: Token<Calc>, op: char, rhs: Token<Calc>) -> Token<Calc> {
    let (mut terms, mut ops) = (Vec::new(), vec![op]);
    flatten(kind, rhs, &mut terms, &mut ops);
    ops.into_iter().zip(terms).fold(lhs, |lhs, (op, rhs)| {
        let (index, size) = (lhs.index(), rhs.end() - lhs.index());
        let value = Value::Custom(Calc::Binary(Box::new(Binary { lhs, op, rhs })));
        Token::new(index, size, TokenKind::named(kind), value)
    })
}

fn binary<L, R>(kind: &'static str, lhs: L, op: &'static Pattern, rhs: R) -> impl Parser<Calc>
where
    L: Parser<Calc>,
    R: Parser<Calc>,
{
    let p = seq((lhs, op, rhs));
    from_fn(move |src, index| {
        let token: Token<Calc> = p.parse(src, index)?;
        let mut items = token.into_value().into_tokens().unwrap_or_default().into_iter();
        match (items.next(), items.next().as_ref().and_then(operator), items.next()) {
            (Some(lhs), Some(op), Some(rhs)) => Ok(chain(kind, lhs, op, rhs)),
            _ => Err(ParseError::new(format!("malformed {kind}"), index)),
        }
    })
}

fn mul() -> impl Parser<Calc> {
    binary("mul", atom(), &MUL_OP, alt((lazy!(mul), atom())))
}

fn add() -> impl Parser<Calc> {
    let lhs = alt((mul(), atom()));
    binary("add", lhs, &ADD_OP, alt((lazy!(add), mul(), atom())))
}

fn assign() -> impl Parser<Calc> {
    let p = seq((identifier(), ignore(&*EQUALS), lazy!(expr)));
    from_fn(move |src, index| {
        let token: Token<Calc> = p.parse(src, index)?;
        let size = token.size();
        let mut items = token.into_value().into_tokens().unwrap_or_default().into_iter();
        match (items.next(), items.next()) {
            (Some(lhs), Some(rhs)) => {
                let name = lhs.value().as_text().unwrap_or_default().to_owned();
                let value = Value::Custom(Calc::Assign(Box::new(Assign { name, rhs })));
                Ok(Token::new(index, size, TokenKind::named("assignment"), value))
            }
            _ => Err(ParseError::new("malformed assignment", index)),
        }
    })
}

fn factor() -> impl Parser<Calc> {
    alt((assign(), atom()))
}

fn expr() -> impl Parser<Calc> {
    alt((add(), mul(), factor()))
}

/// Parse an expression that may be surrounded by whitespace.
fn parse(src: &str) -> ParseResult<Calc> {
    let start = src.len() - src.trim_start().len();
    let token = expr().parse(src, start)?;
    let rest = src.get(token.end()..).unwrap_or_default();
    if !rest.trim().is_empty() {
        return Err(ParseError::new("unexpected input after expression", token.end()));
    }
    Ok(token)
}

#[derive(Debug, thiserror::Error)]
enum EvalError {
    #[error("unbound variable `{0}` at {1}")]
    Unbound(String, usize),
    #[error("division by zero at {0}")]
    DivisionByZero(usize),
    #[error("unexpected {0} token at {1}")]
    Unexpected(TokenKind, usize),
}

type Env = HashMap<String, f64>;

/// Evaluate an expression, storing the values of assignments in `env`.
fn eval(token: &Token<Calc>, env: &mut Env) -> Result<f64, EvalError> {
    let unexpected = || EvalError::Unexpected(token.kind().clone(), token.index());
    match token.value() {
        Value::Custom(Calc::Number(n)) => Ok(*n),
        Value::Text(name) if token.is("identifier") => env
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::Unbound(name.clone(), token.index())),
        Value::Token(inner) if token.is("paren") => eval(inner, env),
        Value::Custom(Calc::Binary(b)) => {
            let lhs = eval(&b.lhs, env)?;
            let rhs = eval(&b.rhs, env)?;
            match b.op {
                '+' => Ok(lhs + rhs),
                '-' => Ok(lhs - rhs),
                '*' => Ok(lhs * rhs),
                '/' | '%' if rhs == 0.0 => Err(EvalError::DivisionByZero(b.rhs.index())),
                '/' => Ok(lhs / rhs),
                '%' => Ok(lhs % rhs),
                _ => Err(unexpected()),
            }
        }
        Value::Custom(Calc::Assign(a)) => {
            let value = eval(&a.rhs, env)?;
            env.insert(a.name.clone(), value);
            Ok(value)
        }
        _ => Err(unexpected()),
    }
}

fn parse_var(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, found `{s}`"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for `{name}`: {e}"))?;
    Ok((name.trim().to_owned(), value))
}

#[derive(clap::Parser)]
#[command(name = "calc")]
#[command(about = "Parse arithmetic expressions and print their token tree as JSON")]
struct Args {
    /// Expression to parse; read from standard input if absent
    expr: Option<String>,
    /// Variable binding such as `x=3`, may be repeated
    #[arg(short = 'v', long = "var", value_parser = parse_var)]
    vars: Vec<(String, f64)>,
    /// Evaluate the expression after printing its token tree
    #[arg(short, long)]
    eval: bool,
    /// Indent the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let src = match args.expr {
        Some(expr) => expr,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let token = parse(&src)?;
    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&token)?);
    } else {
        println!("{}", serde_json::to_string(&token)?);
    }

    if args.eval {
        let mut env: Env = args.vars.into_iter().collect();
        println!("{}", eval(&token, &mut env)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, vars: &[(&str, f64)]) -> Result<f64, EvalError> {
        let mut env = vars.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        eval(&parse(src).unwrap(), &mut env)
    }

    fn binary(token: &Token<Calc>) -> &Binary {
        match token.value() {
            Value::Custom(Calc::Binary(b)) => b,
            v => panic!("expected binary, found {v:?}"),
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(run("2 + 3 * 4", &[]).unwrap(), 14.0);
        assert_eq!(run("2 * 3 + 4", &[]).unwrap(), 10.0);
        assert_eq!(run("  2.5 * 2 ", &[]).unwrap(), 5.0);
    }

    #[test]
    fn chains_associate_left() {
        assert_eq!(run("1 - 2 - 3", &[]).unwrap(), -4.0);
        assert_eq!(run("8 / 4 / 2", &[]).unwrap(), 1.0);
        assert_eq!(run("2 - 3 * 4 - 5 % 3", &[]).unwrap(), -12.0);

        let token = parse("1 - 2 - 3").unwrap();
        assert!(token.is("add"));
        assert_eq!((token.index(), token.size()), (0, 9));
        let top = binary(&token);
        assert_eq!(top.op, '-');
        assert!(top.lhs.is("add"));
        assert_eq!((top.lhs.index(), top.lhs.end()), (0, 5));
        assert!(top.rhs.is("number"));
    }

    #[test]
    fn parentheses_are_kept() {
        assert_eq!(run("(1 - 2) - 3", &[]).unwrap(), -4.0);
        assert_eq!(run("1 - (2 - 3)", &[]).unwrap(), 2.0);

        let token = parse("1 - (2 - 3)").unwrap();
        let top = binary(&token);
        assert!(top.rhs.is("paren"));
        assert!(top.rhs.value().as_token().map_or(false, |t| t.is("add")));
    }

    #[test]
    fn variables() {
        let mut env = Env::from([("x".to_string(), 3.0), ("a".to_string(), 8.0)]);
        let token = parse("y = 2 + x * x * (a - 5) / 3 % 15").unwrap();
        assert!(token.is("assignment"));
        assert_eq!(eval(&token, &mut env).unwrap(), 11.0);
        assert_eq!(env.get("y"), Some(&11.0));

        assert_eq!(run("X + 1", &[("X", 1.0)]).unwrap(), 2.0);
        assert!(matches!(run("a + 1", &[]), Err(EvalError::Unbound(name, 0)) if name == "a"));
    }

    #[test]
    fn division_by_zero() {
        let res = run("1 / (x - x)", &[("x", 1.0)]);
        assert!(matches!(res, Err(EvalError::DivisionByZero(4))));
    }

    #[test]
    fn trailing_input() {
        let e = parse("1 + 2)").unwrap_err();
        assert_eq!(e.index(), 5);
        assert!(parse("1 +").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn json_tree() {
        let token = parse("a = 1").unwrap();
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["type"], "assignment");
        assert_eq!(json["value"]["name"], "a");
        assert_eq!(json["value"]["rhs"]["type"], "number");
        assert_eq!(json["value"]["rhs"]["value"], 1.0);
    }

    #[test]
    fn vars_from_command_line() {
        assert_eq!(parse_var("x=3"), Ok(("x".to_string(), 3.0)));
        assert!(parse_var("x").is_err());
        assert!(parse_var("x=y").is_err());
    }
}
