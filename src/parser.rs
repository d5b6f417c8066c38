//! Text front end producing [`syntax::Node`](crate::syntax::Node) trees.
//!
//! ```text
//! number : /-?[0-9]+(\.[0-9]+)?/
//! symbol : /[a-zA-Z0-9_+\-*\/\\=<>!&%^]+/
//! sexpr  : '(' expr* ')'
//! qexpr  : '{' expr* '}'
//! expr   : number | symbol | sexpr | qexpr
//! program: expr*
//! ```

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0},
    combinator::{opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::pair,
};

use crate::ast::Value;
use crate::evaluator::{Environment, eval};
use crate::reader::read;
use crate::syntax::{Bracket, Node};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^";

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Front-end options
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParseConfig {
    /// Treat `;` up to the end of the line as a comment
    pub handle_comments: bool,
}

/// Convert nom parsing errors to structured parse errors
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::with_context(
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                    input,
                    position,
                ),
                _ if e.input.is_empty() => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input, unclosed bracket",
                    input,
                    position,
                ),
                ErrorKind::Char => ParseError::with_context(
                    ParseErrorKind::InvalidSyntax,
                    format!("Expected closing bracket at position {position}"),
                    input,
                    position,
                ),
                _ => ParseError::with_context(
                    ParseErrorKind::InvalidSyntax,
                    format!("Invalid syntax at position {position}"),
                    input,
                    position,
                ),
            }
        }
        nom::Err::Incomplete(_) => ParseError::new(
            ParseErrorKind::Incomplete,
            "Incomplete input",
            None,
            None,
        ),
    }
}

/// Skip whitespace and, if enabled, line comments
fn skip(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    let (mut input, _) = multispace0.parse(input)?;
    if config.handle_comments {
        while let Some(comment) = input.strip_prefix(';') {
            let end = comment.find('\n').map_or(comment.len(), |i| i + 1);
            let (rest, _) = multispace0.parse(&comment[end..])?;
            input = rest;
        }
    }
    Ok((input, ()))
}

/// Parse a number; it must not run straight into further symbol characters
fn parse_number(input: &str) -> IResult<&str, Node> {
    let (remaining, text) = recognize((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    ))
    .parse(input)?;

    if remaining.starts_with(is_symbol_char) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        )));
    }
    Ok((remaining, Node::number(text)))
}

/// Parse a symbol (identifier or operator)
fn parse_symbol(input: &str) -> IResult<&str, Node> {
    let (remaining, text) = take_while1(is_symbol_char).parse(input)?;
    Ok((remaining, Node::symbol(text)))
}

/// Parse a bracketed group; once opened, a group must be closed by the matching bracket
fn parse_group(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Node> {
    let (input, open) = alt((char('('), char('{'))).parse(input)?;
    let bracket = if open == '(' {
        Bracket::Round
    } else {
        Bracket::Curly
    };

    let (input, children) = parse_exprs(input, config, depth + 1)?;
    let (input, _) = skip(input, config)?;
    let (input, _) = char(bracket.close())
        .parse(input)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| {
            nom::Err::Failure(nom::error::Error::new(input, ErrorKind::Char))
        })?;

    Ok((input, Node::group(bracket, children)))
}

/// Parse one expression with depth tracking
fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Node> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, _) = skip(input, config)?;
    alt((
        |input| parse_group(input, config, depth),
        parse_number,
        parse_symbol,
    ))
    .parse(input)
}

fn parse_exprs(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Vec<Node>> {
    many0(|input| parse_expr(input, config, depth)).parse(input)
}

/// Parse a whole program (a sequence of expressions) with default settings
pub fn parse_program(input: &str) -> Result<Node, Error> {
    parse_program_with_config(input, ParseConfig::default())
}

/// Parse a whole program into the implicit root group
pub fn parse_program_with_config(input: &str, config: ParseConfig) -> Result<Node, Error> {
    let parsed = parse_exprs(input, config, 0).and_then(|(remaining, nodes)| {
        let (remaining, _) = skip(remaining, config)?;
        Ok((remaining, nodes))
    });

    match parsed {
        Ok(("", nodes)) => Ok(Node::root(nodes)),
        Ok((remaining, _)) => {
            let position = input.len() - remaining.len();
            let message = if remaining.starts_with([')', '}']) {
                format!("Unexpected closing bracket at position {position}")
            } else {
                format!("Unexpected character at position {position}")
            };
            Err(Error::ParseError(ParseError::with_context(
                ParseErrorKind::InvalidSyntax,
                message,
                input,
                position,
            )))
        }
        Err(e) => Err(Error::ParseError(to_parse_error(input, e))),
    }
}

/// Parse, read and evaluate one line of input in `env`
pub fn run(env: &Environment, input: &str) -> Result<Value, Error> {
    let config = ParseConfig {
        handle_comments: true,
    };
    let tree = parse_program_with_config(input, config)?;
    Ok(eval(read(&tree), env))
}
