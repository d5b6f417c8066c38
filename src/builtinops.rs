//! Built-in operations registry.
//!
//! Every builtin is an ordinary function value bound in the global environment, so
//! builtins can be passed around, redefined or partially hidden like any other
//! binding. There are no special forms: `if`, `def` and `\` receive quoted lists
//! and decide themselves what to evaluate.
//!
//! ```text
//! (+ 1 2 3)              ; arithmetic over one or more numbers
//! (join {1} {2 3})       ; list operations work on Q-expressions
//! (if (< 1 2) {1} {2})   ; branches are Q-expressions
//! (def {x y} 1 2)        ; bind several symbols at once
//! ```
//!
//! ## Error Handling
//!
//! Each builtin validates the shape of its arguments before acting:
//!
//! - **Arity**: checked by the dispatcher against [`BuiltinOp::arity`]
//! - **Types**: numbers where numbers are required, Q-expressions for list arguments
//! - **Empty lists**: `head`, `tail` and `init` reject `{}`
//! - **Domains**: division by zero, float modulo and integer overflow are errors
//!
//! Failures are reported as [`EvalError`]s and surface as error values naming the
//! function, the 1-based argument index and the expected vs actual type or count.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the signature of [`BuiltinFn`]
//! 2. **Add it to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering the validation paths

use crate::EvalError;
use crate::ast::{
    Closure, FloatType, Function, IntegerType, ListKind, Value, qexpr, sexpr, unit,
};
use crate::evaluator::{Environment, eval};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Canonical builtin function signature.
///
/// Builtins receive ownership of their (already evaluated) arguments and the
/// caller's environment.
pub type BuiltinFn = fn(Vec<Value>, &Environment) -> Result<Value, EvalError>;

/// Number of arguments a builtin accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn validate(self, function: &str, got: usize) -> Result<(), EvalError> {
        let ok = match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::Arity {
                function: function.to_owned(),
                got,
                expected: self,
            })
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug)]
pub struct BuiltinOp {
    /// The symbol this operation is bound to in the global environment
    pub id: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    func: BuiltinFn,
}

impl BuiltinOp {
    /// Run the operation, converting any failure into an error value
    pub(crate) fn call(&self, args: Vec<Value>, env: &Environment) -> Value {
        tracing::trace!(function = self.id, args = args.len(), "builtin call");
        if let Some(err) = args.iter().find(|arg| arg.is_error()) {
            return err.clone();
        }
        if let Err(err) = self.arity.validate(self.id, args.len()) {
            return err.into();
        }
        (self.func)(args, env).into()
    }
}

//
// Argument validation helpers (argument indices are 1-based)
//

fn type_error(function: &str, index: usize, got: &Value, expected: &'static str) -> EvalError {
    EvalError::Type {
        function: function.to_owned(),
        index,
        got: got.type_name(),
        expected,
    }
}

/// Unwrap a Q-expression argument into its elements
fn expect_quoted(function: &str, index: usize, value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::List(ListKind::Quoted, items) => Ok(items),
        other => Err(type_error(function, index, &other, "Q-Expression")),
    }
}

/// Unwrap a non-empty Q-expression argument into its elements
fn expect_non_empty(function: &str, index: usize, value: Value) -> Result<Vec<Value>, EvalError> {
    let items = expect_quoted(function, index, value)?;
    if items.is_empty() {
        return Err(EvalError::EmptyList {
            function: function.to_owned(),
            index,
        });
    }
    Ok(items)
}

fn expect_number(function: &str, index: usize, value: &Value) -> Result<(), EvalError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(type_error(function, index, value, "Number"))
    }
}

/// Names held by a Q-expression argument made only of symbols
fn expect_symbols(
    function: &str,
    index: usize,
    items: Vec<Value>,
) -> Result<Vec<String>, EvalError> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Symbol(name) => Ok(name),
            other => Err(type_error(function, index, &other, "Symbol")),
        })
        .collect()
}

/// Split the arguments of a fixed-arity builtin
fn fixed<const N: usize>(function: &str, args: Vec<Value>) -> Result<[Value; N], EvalError> {
    let got = args.len();
    <[Value; N]>::try_from(args).map_err(|_| EvalError::Arity {
        function: function.to_owned(),
        got,
        expected: Arity::Exact(N),
    })
}

//
// Numeric helpers
//

/// A pair of numeric operands after widening
enum Operands {
    Integers(IntegerType, IntegerType),
    Floats(FloatType, FloatType),
}

fn as_float(value: &Value) -> FloatType {
    match value {
        Value::Integer(n) => *n as FloatType,
        Value::Float(n) => *n,
        _ => FloatType::NAN,
    }
}

/// If either operand is a float, both are widened to float
fn widen(x: &Value, y: &Value) -> Operands {
    match (x, y) {
        (Value::Integer(a), Value::Integer(b)) => Operands::Integers(*a, *b),
        _ => Operands::Floats(as_float(x), as_float(y)),
    }
}

/// Arithmetic operators folded over numeric arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Min,
    Max,
}

impl ArithOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
            ArithOp::Pow => "^",
            ArithOp::Min => "min",
            ArithOp::Max => "max",
        }
    }

    fn overflow(self) -> EvalError {
        EvalError::Overflow(match self {
            ArithOp::Add => "addition",
            ArithOp::Sub => "subtraction",
            ArithOp::Mul => "multiplication",
            ArithOp::Div => "division",
            ArithOp::Rem => "modulo",
            ArithOp::Pow => "exponentiation",
            ArithOp::Min | ArithOp::Max => "comparison",
        })
    }

    fn apply_integers(self, a: IntegerType, b: IntegerType) -> Result<Value, EvalError> {
        let result = match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div | ArithOp::Rem if b == 0 => return Err(EvalError::DivisionByZero),
            ArithOp::Div => a.checked_div(b),
            ArithOp::Rem => a.checked_rem(b),
            ArithOp::Pow if b < 0 => {
                return Err(EvalError::Domain(
                    "Function '^' passed a negative Integer exponent.".to_owned(),
                ));
            }
            // These bases stay bounded for any exponent, even one beyond u32
            ArithOp::Pow if matches!(a, -1..=1) => Some(match a {
                0 if b == 0 => 1,
                -1 if b % 2 != 0 => -1,
                -1 => 1,
                _ => a,
            }),
            ArithOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)),
            ArithOp::Min => Some(a.min(b)),
            ArithOp::Max => Some(a.max(b)),
        };
        result.map(Value::Integer).ok_or_else(|| self.overflow())
    }

    fn apply_floats(self, a: FloatType, b: FloatType) -> Result<Value, EvalError> {
        let result = match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
            ArithOp::Div => a / b,
            ArithOp::Rem => {
                return Err(EvalError::Domain(
                    "Function '%' is only defined for two Integers.".to_owned(),
                ));
            }
            ArithOp::Pow => a.powf(b),
            ArithOp::Min => a.min(b),
            ArithOp::Max => a.max(b),
        };
        Ok(Value::Float(result))
    }
}

/// Left fold of one or more numbers, widening per step
fn fold_numeric(op: ArithOp, args: Vec<Value>) -> Result<Value, EvalError> {
    for (i, arg) in args.iter().enumerate() {
        expect_number(op.symbol(), i + 1, arg)?;
    }

    let mut iter = args.into_iter();
    let Some(first) = iter.next() else {
        return Err(EvalError::Arity {
            function: op.symbol().to_owned(),
            got: 0,
            expected: Arity::AtLeast(1),
        });
    };

    // Unary minus negates
    if op == ArithOp::Sub && iter.len() == 0 {
        return match first {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or(EvalError::Overflow("negation")),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Ok(other),
        };
    }

    iter.try_fold(first, |acc, next| match widen(&acc, &next) {
        Operands::Integers(a, b) => op.apply_integers(a, b),
        Operands::Floats(a, b) => op.apply_floats(a, b),
    })
}

fn builtin_add(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Add, args)
}

fn builtin_sub(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Sub, args)
}

fn builtin_mul(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Mul, args)
}

fn builtin_div(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Div, args)
}

fn builtin_mod(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Rem, args)
}

fn builtin_pow(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Pow, args)
}

fn builtin_min(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Min, args)
}

fn builtin_max(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    fold_numeric(ArithOp::Max, args)
}

// Macro to generate ordering comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
            let [x, y] = fixed($op_str, args)?;
            expect_number($op_str, 1, &x)?;
            expect_number($op_str, 2, &y)?;
            let result = match widen(&x, &y) {
                Operands::Integers(a, b) => a $op b,
                Operands::Floats(a, b) => a $op b,
            };
            Ok(Value::from(result))
        }
    };
}

numeric_comparison!(builtin_gt, >, ">");
numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_ge, >=, ">=");
numeric_comparison!(builtin_le, <=, "<=");

fn builtin_eq(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [x, y] = fixed("==", args)?;
    Ok(Value::from(x == y))
}

fn builtin_ne(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [x, y] = fixed("!=", args)?;
    Ok(Value::from(x != y))
}

//
// List operations
//

fn builtin_list(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    Ok(qexpr(args))
}

fn builtin_head(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [list] = fixed("head", args)?;
    let mut items = expect_non_empty("head", 1, list)?;
    items.truncate(1);
    Ok(qexpr(items))
}

fn builtin_tail(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [list] = fixed("tail", args)?;
    let mut items = expect_non_empty("tail", 1, list)?;
    items.remove(0);
    Ok(qexpr(items))
}

fn builtin_init(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [list] = fixed("init", args)?;
    let mut items = expect_non_empty("init", 1, list)?;
    items.pop();
    Ok(qexpr(items))
}

fn builtin_len(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [list] = fixed("len", args)?;
    let items = expect_quoted("len", 1, list)?;
    let len = IntegerType::try_from(items.len()).map_err(|_| EvalError::Overflow("len"))?;
    Ok(Value::Integer(len))
}

fn builtin_eval(args: Vec<Value>, env: &Environment) -> Result<Value, EvalError> {
    let [list] = fixed("eval", args)?;
    let items = expect_quoted("eval", 1, list)?;
    Ok(eval(sexpr(items), env))
}

fn builtin_join(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let mut joined = Vec::new();
    for (i, arg) in args.into_iter().enumerate() {
        joined.extend(expect_quoted("join", i + 1, arg)?);
    }
    Ok(qexpr(joined))
}

fn builtin_cons(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [first, list] = fixed("cons", args)?;
    if let Value::List(..) = first {
        return Err(type_error("cons", 1, &first, "non-list value"));
    }
    let tail = expect_quoted("cons", 2, list)?;
    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(first);
    items.extend(tail);
    Ok(qexpr(items))
}

//
// Conditional, definitions and lambda
//

fn builtin_if(args: Vec<Value>, env: &Environment) -> Result<Value, EvalError> {
    let [condition, then_branch, else_branch] = fixed("if", args)?;

    let truthy = match condition {
        Value::Integer(n) => n != 0,
        Value::Float(n) => n != 0.0,
        other => return Err(type_error("if", 1, &other, "Number")),
    };
    let then_items = expect_quoted("if", 2, then_branch)?;
    let else_items = expect_quoted("if", 3, else_branch)?;

    let branch = if truthy { then_items } else { else_items };
    Ok(eval(sexpr(branch), env))
}

/// Where `def`-style builtins install their bindings
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    Global,
    Local,
}

fn define(
    function: &'static str,
    scope: Scope,
    args: Vec<Value>,
    env: &Environment,
) -> Result<Value, EvalError> {
    let mut args = args.into_iter();
    let names = match args.next() {
        Some(first) => expect_quoted(function, 1, first)?,
        None => Vec::new(),
    };
    let names = expect_symbols(function, 1, names)?;

    if names.len() != args.len() {
        return Err(EvalError::Arity {
            function: function.to_owned(),
            got: args.len(),
            expected: Arity::Exact(names.len()),
        });
    }

    for (name, value) in names.into_iter().zip(args) {
        tracing::debug!(function, symbol = %name, ?scope, "define");
        match scope {
            Scope::Global => env.define_global(name, value),
            Scope::Local => env.define_local(name, value),
        }
    }
    Ok(unit())
}

fn builtin_def(args: Vec<Value>, env: &Environment) -> Result<Value, EvalError> {
    define("def", Scope::Global, args, env)
}

fn builtin_put(args: Vec<Value>, env: &Environment) -> Result<Value, EvalError> {
    define("=", Scope::Local, args, env)
}

fn builtin_lambda(args: Vec<Value>, _env: &Environment) -> Result<Value, EvalError> {
    let [formals, body] = fixed("\\", args)?;
    let formals = expect_quoted("\\", 1, formals)?;
    let body = expect_quoted("\\", 2, body)?;
    let formals = expect_symbols("\\", 1, formals)?;

    Ok(Value::Function(Function::Closure(Closure::new(
        formals,
        body,
        Environment::new(),
    ))))
}

fn builtin_print(_args: Vec<Value>, env: &Environment) -> Result<Value, EvalError> {
    for name in env.bound_names() {
        println!("{name}");
    }
    Ok(unit())
}

/// Global registry of all built-in operations.
static BUILTIN_OPS: [BuiltinOp; 27] = [
    // Arithmetic operations
    BuiltinOp {
        id: "+",
        arity: Arity::AtLeast(1),
        func: builtin_add,
    },
    BuiltinOp {
        id: "-",
        arity: Arity::AtLeast(1),
        func: builtin_sub,
    },
    BuiltinOp {
        id: "*",
        arity: Arity::AtLeast(1),
        func: builtin_mul,
    },
    BuiltinOp {
        id: "/",
        arity: Arity::AtLeast(1),
        func: builtin_div,
    },
    BuiltinOp {
        id: "%",
        arity: Arity::AtLeast(1),
        func: builtin_mod,
    },
    BuiltinOp {
        id: "^",
        arity: Arity::AtLeast(1),
        func: builtin_pow,
    },
    BuiltinOp {
        id: "min",
        arity: Arity::AtLeast(1),
        func: builtin_min,
    },
    BuiltinOp {
        id: "max",
        arity: Arity::AtLeast(1),
        func: builtin_max,
    },
    // List operations
    BuiltinOp {
        id: "list",
        arity: Arity::Any,
        func: builtin_list,
    },
    BuiltinOp {
        id: "head",
        arity: Arity::Exact(1),
        func: builtin_head,
    },
    BuiltinOp {
        id: "tail",
        arity: Arity::Exact(1),
        func: builtin_tail,
    },
    BuiltinOp {
        id: "init",
        arity: Arity::Exact(1),
        func: builtin_init,
    },
    BuiltinOp {
        id: "len",
        arity: Arity::Exact(1),
        func: builtin_len,
    },
    BuiltinOp {
        id: "eval",
        arity: Arity::Exact(1),
        func: builtin_eval,
    },
    BuiltinOp {
        id: "join",
        arity: Arity::AtLeast(1),
        func: builtin_join,
    },
    BuiltinOp {
        id: "cons",
        arity: Arity::Exact(2),
        func: builtin_cons,
    },
    // Comparison operations
    BuiltinOp {
        id: ">",
        arity: Arity::Exact(2),
        func: builtin_gt,
    },
    BuiltinOp {
        id: "<",
        arity: Arity::Exact(2),
        func: builtin_lt,
    },
    BuiltinOp {
        id: ">=",
        arity: Arity::Exact(2),
        func: builtin_ge,
    },
    BuiltinOp {
        id: "<=",
        arity: Arity::Exact(2),
        func: builtin_le,
    },
    BuiltinOp {
        id: "==",
        arity: Arity::Exact(2),
        func: builtin_eq,
    },
    BuiltinOp {
        id: "!=",
        arity: Arity::Exact(2),
        func: builtin_ne,
    },
    // Control flow
    BuiltinOp {
        id: "if",
        arity: Arity::Exact(3),
        func: builtin_if,
    },
    // Definitions
    BuiltinOp {
        id: "def",
        arity: Arity::AtLeast(1),
        func: builtin_def,
    },
    BuiltinOp {
        id: "=",
        arity: Arity::AtLeast(1),
        func: builtin_put,
    },
    BuiltinOp {
        id: "\\",
        arity: Arity::Exact(2),
        func: builtin_lambda,
    },
    // Introspection; arguments are ignored so it can be invoked as (print {})
    BuiltinOp {
        id: "print",
        arity: Arity::Any,
        func: builtin_print,
    },
];

/// Lazy static map from id to BuiltinOp (private - use find_builtin_op)
static BUILTIN_BY_ID: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.id, op)).collect());

/// Get all builtin operations (for internal use by evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    &BUILTIN_OPS
}

/// Find a builtin operation by its identifier
pub fn find_builtin_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_ID.get(id).copied()
}
