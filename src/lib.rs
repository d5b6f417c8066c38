//! Teddy - a small Lisp interpreter
//!
//! This crate turns a parsed syntax tree into dynamically-typed values and evaluates
//! them against a lexically chained environment. It supports user-defined closures,
//! partial application (currying), variadic formals and a builtin library covering
//! arithmetic, list manipulation, comparison, conditionals and definitions.
//!
//! ```text
//! (+ 1 2.5)                      ; 3.500000, mixed arithmetic widens to float
//! (head {1 2 3})                 ; {1}, braces are quoted (inert) lists
//! (def {add} (\ {a b} {+ a b}))  ; closures are built with \
//! ((add 3) 4)                    ; 7, too few arguments curries
//! (if (> 2 1) {1} {2})           ; branches are quoted and evaluated on demand
//! ```
//!
//! ## Errors are values
//!
//! Evaluation never fails in the Rust sense. Every runtime problem (unbound symbols,
//! type and arity mismatches, division by zero, ...) becomes a [`ast::Value::Error`]
//! that flows upward like any other value and short-circuits the list being
//! evaluated. [`EvalError`] classifies those problems inside the crate; its
//! `Display` text is the message the error value carries.
//!
//! Only the text front end ([`parser`], behind the default `parser` feature) reports
//! failures through the Rust-level [`Error`] type.
//!
//! ## Modules
//!
//! - `ast`: the value model and its textual rendering
//! - `syntax`: the generic parse-tree node consumed by the reader
//! - `reader`: parse tree to value conversion
//! - `evaluator`: environments, `eval` and `apply`
//! - `builtinops`: the builtin function registry
//! - `parser`: nom-based text front end producing `syntax` trees

use std::fmt;

use crate::builtinops::Arity;

/// Maximum nesting depth accepted by the text parser.
/// Evaluation itself is not depth limited.
pub const MAX_PARSE_DEPTH: usize = 256;

/// Formal parameter symbol that collects all remaining arguments into one list
pub const REST_MARKER: &str = "&";

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (unknown characters, stray closing brackets)
    InvalidSyntax,
    /// Input ended before a group was closed
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 40 chars)
    pub context: Option<String>,
    /// The problematic character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 40;

        // Context is cut by characters, not bytes
        let error_offset = input
            .get(..error_offset)
            .map_or(error_offset, |prefix| prefix.chars().count());

        let context_start = error_offset.saturating_sub(10);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        let found = input.chars().nth(error_offset).map(String::from);

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Errors reported by the text front end
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    ParseError(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

/// Runtime error kinds.
///
/// These never escape the evaluator as Rust errors: the builtin dispatcher and
/// the apply engine turn them into [`ast::Value::Error`] carrying the `Display`
/// text below.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Numeric literal that does not fit its numeric kind
    BadNumber,
    /// Symbol lookup exhausted the environment chain
    Unbound(String),
    /// An argument had the wrong variant (argument indices are 1-based)
    Type {
        function: String,
        index: usize,
        got: &'static str,
        expected: &'static str,
    },
    /// Wrong argument count for a builtin or a closure
    Arity {
        function: String,
        got: usize,
        expected: Arity,
    },
    /// An operation that needs a non-empty list received `{}`
    EmptyList { function: String, index: usize },
    DivisionByZero,
    /// Operation undefined for its operands (float modulo, negative integer power)
    Domain(String),
    /// Integer arithmetic left the i64 range
    Overflow(&'static str),
    /// First element of an evaluated S-expression is not a function
    NotAFunction { got: &'static str },
    /// Malformed formal parameter list
    BadFormals(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::BadNumber => write!(f, "bad number"),
            EvalError::Unbound(name) => write!(f, "Unbound Symbol '{name}'"),
            EvalError::Type {
                function,
                index,
                got,
                expected,
            } => write!(
                f,
                "Function '{function}' passed incorrect type for argument {index}. Got {got}, Expected {expected}."
            ),
            EvalError::Arity {
                function,
                got,
                expected,
            } => write!(
                f,
                "Function '{function}' passed incorrect number of arguments. Got {got}, Expected {expected}."
            ),
            EvalError::EmptyList { function, index } => {
                write!(f, "Function '{function}' passed {{}} for argument {index}.")
            }
            EvalError::DivisionByZero => write!(f, "Division By Zero"),
            EvalError::Domain(msg) => write!(f, "{msg}"),
            EvalError::Overflow(op) => write!(f, "Integer overflow in {op}"),
            EvalError::NotAFunction { got } => write!(
                f,
                "S-Expression starts with incorrect type. Got {got}, Expected Function."
            ),
            EvalError::BadFormals(msg) => write!(f, "Function format invalid. {msg}"),
        }
    }
}

impl std::error::Error for EvalError {}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod reader;
pub mod syntax;

#[cfg(feature = "parser")]
pub mod parser;

#[cfg(feature = "parser")]
pub use parser::run;
