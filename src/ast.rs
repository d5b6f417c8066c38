//! Core value model of the interpreter.
//!
//! [`Value`] is a closed tagged variant covering both numeric kinds, error values,
//! symbols, the two list forms and functions. A value owns its children exclusively;
//! the only shared state is the environment a [`Closure`] carries, which is an
//! aliased handle rather than an owned copy.
//!
//! Ergonomic helpers such as [`val`], [`sym`], [`sexpr`] and [`qexpr`] are provided
//! for building values in code and tests. Equality is structural (see the
//! `PartialEq` impl) and `Display` implements the textual rendering used by the REPL.

use crate::EvalError;
use crate::builtinops::BuiltinOp;
use crate::evaluator::Environment;

/// Type alias for integer values in interpreter
pub type IntegerType = i64;

/// Type alias for floating-point values in interpreter
pub type FloatType = f64;

/// How a list behaves under evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// S-expression: evaluated as a function application
    Eager,
    /// Q-expression: inert data, evaluates to itself
    Quoted,
}

/// Core value type in interpreter
#[derive(Clone)]
pub enum Value {
    Integer(IntegerType),
    Float(FloatType),
    /// Inert error value carrying a human-readable message
    Error(String),
    /// Unresolved identifier
    Symbol(String),
    /// Ordered list, either evaluated (`( )`) or quoted (`{ }`)
    List(ListKind, Vec<Value>),
    Function(Function),
}

/// The two kinds of callable values
#[derive(Clone)]
pub enum Function {
    /// Native operation from the builtin registry
    Builtin(&'static BuiltinOp),
    /// User-defined function created by `\`
    Closure(Closure),
}

/// A user-defined function.
///
/// `env` holds the arguments bound so far by partial application. It is shared
/// between copies of the closure and never mutated after construction: binding
/// more arguments always produces a new closure with a new environment.
#[derive(Clone)]
pub struct Closure {
    pub(crate) formals: Vec<String>,
    pub(crate) body: Vec<Value>,
    pub(crate) env: Environment,
}

impl Closure {
    pub(crate) fn new(formals: Vec<String>, body: Vec<Value>, env: Environment) -> Self {
        Closure { formals, body, env }
    }

    /// Formal parameters still waiting for an argument
    pub fn formals(&self) -> &[String] {
        &self.formals
    }

    pub fn body(&self) -> &[Value] {
        &self.body
    }

    /// Environment holding the arguments bound so far
    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl Value {
    /// Name of the variant, as used in type error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::List(ListKind::Eager, _) => "S-Expression",
            Value::List(ListKind::Quoted, _) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

impl From<EvalError> for Value {
    fn from(err: EvalError) -> Self {
        Value::Error(err.to_string())
    }
}

impl From<Result<Value, EvalError>> for Value {
    fn from(result: Result<Value, EvalError>) -> Self {
        result.unwrap_or_else(Value::from)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(n as IntegerType)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(IntegerType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl From<FloatType> for Value {
    fn from(n: FloatType) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Integer(IntegerType::from(b))
    }
}

// Collections convert to quoted lists: that is the language's data list.
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(ListKind::Quoted, v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(ListKind::Quoted, arr.into_iter().map(Into::into).collect())
    }
}

/// Helper function for creating symbols
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating values from Rust literals
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating an S-expression
pub fn sexpr(items: Vec<Value>) -> Value {
    Value::List(ListKind::Eager, items)
}

/// Helper function for creating a Q-expression
pub fn qexpr(items: Vec<Value>) -> Value {
    Value::List(ListKind::Quoted, items)
}

/// The empty S-expression `()`, returned by side-effecting builtins
pub fn unit() -> Value {
    Value::List(ListKind::Eager, vec![])
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::Error(msg) => write!(f, "Error({msg:?})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::List(kind, items) => {
                write!(f, "{kind:?}(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::Function(Function::Builtin(op)) => write!(f, "Builtin({})", op.id),
            Value::Function(Function::Closure(c)) => {
                write!(f, "Closure(formals={:?}, body={:?})", c.formals, c.body)
            }
        }
    }
}

fn fmt_list(
    f: &mut std::fmt::Formatter<'_>,
    items: &[Value],
    open: char,
    close: char,
) -> std::fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:.6}"),
            Value::Error(msg) => write!(f, "Error: {msg}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::List(ListKind::Eager, items) => fmt_list(f, items, '(', ')'),
            Value::List(ListKind::Quoted, items) => fmt_list(f, items, '{', '}'),
            Value::Function(Function::Builtin(op)) => write!(f, "#<builtin:{}>", op.id),
            Value::Function(Function::Closure(_)) => write!(f, "#<function>"),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Builtins compare by registry id, not function pointer
            (Function::Builtin(a), Function::Builtin(b)) => a.id == b.id,
            // Captured environments are excluded from closure equality
            (Function::Closure(a), Function::Closure(b)) => {
                a.formals == b.formals && a.body == b.body
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(k1, a), Value::List(k2, b)) => k1 == k2 && a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false, // Different variants are never equal, Integer(1) != Float(1.0) included
        }
    }
}
