use crate::ast::{Closure, Function, ListKind, Value, qexpr, sexpr, unit};
use crate::builtinops::{Arity, get_builtin_ops};
use crate::{EvalError, REST_MARKER};

mod environment;

pub use environment::Environment;

/// Evaluate a value in `env`.
///
/// Symbols are looked up, S-expressions are applied, everything else (numbers,
/// errors, Q-expressions and functions) evaluates to itself.
pub fn eval(expr: Value, env: &Environment) -> Value {
    match expr {
        Value::Symbol(name) => env.lookup(&name).into(),
        Value::List(ListKind::Eager, items) => eval_sexpr(items, env),
        other => other,
    }
}

/// Evaluate an S-expression (function application)
///
/// Elements are evaluated left to right; the first error value stops evaluation
/// and becomes the result of the whole list.
fn eval_sexpr(items: Vec<Value>, env: &Environment) -> Value {
    let mut evaluated = Vec::with_capacity(items.len());
    for item in items {
        let value = eval(item, env);
        if value.is_error() {
            return value;
        }
        evaluated.push(value);
    }

    let mut evaluated = evaluated.into_iter();
    match (evaluated.next(), evaluated.len()) {
        (None, _) => unit(),
        (Some(single), 0) => single,
        (Some(Value::Function(func)), _) => apply(&func, evaluated.collect(), env),
        (Some(other), _) => EvalError::NotAFunction {
            got: other.type_name(),
        }
        .into(),
    }
}

/// Apply a function to already evaluated arguments.
///
/// `env` is the caller's environment: builtins receive it directly and a fully
/// applied closure evaluates its body in a fresh environment chained to it.
pub fn apply(func: &Function, args: Vec<Value>, env: &Environment) -> Value {
    match func {
        Function::Builtin(op) => op.call(args, env),
        Function::Closure(closure) => apply_closure(closure, args, env).into(),
    }
}

/// Bind arguments to formals, currying when arguments run out first
fn apply_closure(
    closure: &Closure,
    args: Vec<Value>,
    env: &Environment,
) -> Result<Value, EvalError> {
    let given = args.len();
    let total = closure.formals.len();
    tracing::trace!(given, total, "closure call");

    // Arguments bound by earlier partial applications come first
    let mut bound = closure.env.local_bindings();
    let mut remaining = closure.formals.as_slice();
    let mut args = args.into_iter();

    while args.len() > 0 {
        let Some((formal, rest)) = remaining.split_first() else {
            return Err(EvalError::Arity {
                function: "lambda".to_owned(),
                got: given,
                expected: Arity::Exact(total),
            });
        };

        if formal == REST_MARKER {
            let [collector] = rest else {
                return Err(rest_marker_misplaced());
            };
            bound.push((collector.clone(), qexpr(args.by_ref().collect())));
            remaining = &[];
            break;
        }

        if let Some(arg) = args.next() {
            bound.push((formal.clone(), arg));
        }
        remaining = rest;
    }

    // A trailing rest marker with nothing left to collect binds the empty list
    if let [marker, rest @ ..] = remaining
        && marker == REST_MARKER
    {
        let [collector] = rest else {
            return Err(rest_marker_misplaced());
        };
        bound.push((collector.clone(), qexpr(vec![])));
        remaining = &[];
    }

    if !remaining.is_empty() {
        tracing::debug!(remaining = remaining.len(), "partial application");
        let captured = Environment::new();
        for (name, value) in bound {
            captured.define_local(name, value);
        }
        return Ok(Value::Function(Function::Closure(Closure::new(
            remaining.to_vec(),
            closure.body.clone(),
            captured,
        ))));
    }

    let call_env = Environment::with_parent(env);
    for (name, value) in bound {
        call_env.define_local(name, value);
    }
    Ok(eval(sexpr(closure.body.clone()), &call_env))
}

fn rest_marker_misplaced() -> EvalError {
    EvalError::BadFormals(format!(
        "Symbol '{REST_MARKER}' not followed by single symbol."
    ))
}

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let env = Environment::new();
    for builtin_op in get_builtin_ops() {
        env.define_local(
            builtin_op.id,
            Value::Function(Function::Builtin(builtin_op)),
        );
    }
    env
}

#[cfg(all(test, feature = "parser"))]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{sym, val};
    use crate::parser::parse_program;
    use crate::reader::read;

    /// Test result variants for comprehensive testing
    #[derive(Debug)]
    enum TestResult {
        EvalResult(Value),           // Evaluation should produce this value
        SpecificError(&'static str), // Evaluation should produce an error containing this string
        Error,                       // Evaluation should produce any error value
    }
    use TestResult::*;

    /// Test environment containing test cases that share state
    struct TestEnvironment(Vec<(&'static str, TestResult)>);

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> TestResult {
        EvalResult(val(value))
    }

    /// Macro for setup expressions that return the empty S-expression (like def)
    macro_rules! test_setup {
        ($expr:expr) => {
            ($expr, EvalResult(unit()))
        };
    }

    fn eval_str(input: &str, env: &Environment) -> Value {
        let tree = parse_program(input).unwrap();
        eval(read(&tree), env)
    }

    fn execute_test_case(input: &str, expected: &TestResult, env: &Environment, test_id: &str) {
        let actual = eval_str(input, env);
        match (&actual, expected) {
            (_, EvalResult(expected_val)) => {
                assert_eq!(
                    &actual, expected_val,
                    "{test_id}: '{input}' expected {expected_val:?}, got {actual:?}"
                );
            }
            (Value::Error(_), Error) => {}
            (Value::Error(msg), SpecificError(expected_text)) => {
                assert!(
                    msg.contains(expected_text),
                    "{test_id}: error should contain '{expected_text}', got: {msg}"
                );
            }
            (_, Error) => panic!("{test_id}: '{input}' expected error, got {actual:?}"),
            (_, SpecificError(expected_text)) => {
                panic!("{test_id}: expected error containing '{expected_text}', got {actual:?}")
            }
        }
    }

    fn run_comprehensive_tests(test_cases: Vec<(&str, TestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let env = create_global_env();
            let test_id = format!("#{}", i + 1);
            execute_test_case(input, expected, &env, &test_id);
        }
    }

    fn run_tests_in_environment(test_environments: Vec<TestEnvironment>) {
        for (env_idx, TestEnvironment(test_cases)) in test_environments.iter().enumerate() {
            let env = create_global_env();
            for (test_idx, (input, expected)) in test_cases.iter().enumerate() {
                let test_id = format!("Environment #{} test #{}", env_idx + 1, test_idx + 1);
                execute_test_case(input, expected, &env, &test_id);
            }
        }
    }

    #[test]
    fn test_self_evaluating_and_structure() {
        run_comprehensive_tests(vec![
            ("42", success(42)),
            ("-7", success(-7)),
            ("2.5", success(2.5)),
            ("{1 2 x}", success([val(1), val(2), sym("x")])),
            ("{}", success(Vec::<Value>::new())),
            ("()", EvalResult(unit())),
            ("(5)", success(5)),
            ("((((5))))", success(5)),
            ("+ 1 2", success(3)), // the implicit root group is an S-expression
            ("(1 2 3)", SpecificError("S-Expression starts with incorrect type. Got Integer")),
            ("({1} 2)", SpecificError("Got Q-Expression, Expected Function")),
            ("undefined", SpecificError("Unbound Symbol 'undefined'")),
            ("(- {1})", Error),
            ("99999999999999999999", SpecificError("bad number")),
        ]);
    }

    #[test]
    fn test_function_values() {
        let env = create_global_env();
        let plus = eval_str("+", &env);
        assert!(matches!(plus, Value::Function(Function::Builtin(op)) if op.id == "+"));

        let lambda = eval_str("\\ {x} {x}", &env);
        match lambda {
            Value::Function(Function::Closure(c)) => {
                assert_eq!(c.formals(), ["x".to_owned()]);
                assert_eq!(c.body(), [sym("x")]);
                assert!(c.env().local_bindings().is_empty());
            }
            other => panic!("expected closure, got {other:?}"),
        }
    }

    #[test]
    fn test_first_error_wins() {
        run_comprehensive_tests(vec![
            ("(+ 1 (/ 1 0) (head {}))", SpecificError("Division By Zero")),
            ("(+ (head {}) (/ 1 0))", SpecificError("passed {} for argument 1")),
            ("(1 2 (undefined))", SpecificError("Unbound Symbol 'undefined'")),
            ("(a b)", SpecificError("Unbound Symbol 'a'")),
        ]);
    }

    #[test]
    fn test_error_short_circuits_side_effects() {
        let env = create_global_env();
        let result = eval_str("(list (/ 1 0) (def {x} 1))", &env);
        assert_eq!(result, Value::Error("Division By Zero".to_owned()));
        assert!(env.lookup("x").is_err());
    }

    #[test]
    fn test_closures_and_currying() {
        run_tests_in_environment(vec![
            TestEnvironment(vec![
                test_setup!("def {add} (\\ {a b} {+ a b})"),
                ("add 3 4", success(7)),
                ("(add 3) 4", success(7)),
                test_setup!("def {add3} (add 3)"),
                ("add3 10", success(13)),
                ("add3 20", success(23)),
                ("add 1 2 3", SpecificError("Got 3, Expected 2")),
                ("add3 1 2", SpecificError("Got 2, Expected 1")),
            ]),
            TestEnvironment(vec![
                ("(\\ {x y} {- x y}) 10 4", success(6)),
                ("((\\ {x y} {- x y}) 10) 4", success(6)),
                ("(\\ {x} {x}) 2.5", success(2.5)),
            ]),
        ]);
    }

    #[test]
    fn test_partial_application_does_not_mutate_closure() {
        let env = create_global_env();
        eval_str("def {f} (\\ {a b} {list a b})", &env);
        let f_before = env.lookup("f").unwrap();

        let curried = eval_str("f 1", &env);
        match &curried {
            Value::Function(Function::Closure(c)) => {
                assert_eq!(c.formals(), ["b".to_owned()]);
                assert_eq!(c.env().lookup("a"), Ok(val(1)));
            }
            other => panic!("expected closure, got {other:?}"),
        }

        assert_eq!(env.lookup("f").unwrap(), f_before);
        assert_eq!(eval_str("f 5 6", &env), val([5, 6]));

        // Each partial application gets its own environment
        eval_str("def {g} (f 1)", &env);
        eval_str("def {h} (f 2)", &env);
        assert_eq!(eval_str("g 0", &env), val([1, 0]));
        assert_eq!(eval_str("h 0", &env), val([2, 0]));
    }

    #[test]
    fn test_variadic_formals() {
        run_tests_in_environment(vec![TestEnvironment(vec![
            test_setup!("def {pack} (\\ {x & xs} {list x xs})"),
            ("pack 1 2 3", success([val(1), val([2, 3])])),
            ("pack 1", success([val(1), val(Vec::<Value>::new())])),
            test_setup!("def {all} (\\ {& xs} {xs})"),
            ("all 1 2", success([1, 2])),
            test_setup!("def {bad} (\\ {& xs ys} {xs})"),
            ("bad 1", SpecificError("Symbol '&' not followed by single symbol")),
        ])]);
    }

    #[test]
    fn test_body_sees_caller_environment() {
        run_tests_in_environment(vec![TestEnvironment(vec![
            test_setup!(
                "def {fact} (\\ {n} {if (== n 0) {1} {* n (fact (- n 1))}})"
            ),
            ("fact 10", success(3628800)),
            test_setup!("def {even odd} (\\ {n} {if (== n 0) {1} {odd (- n 1)}}) (\\ {n} {if (== n 0) {0} {even (- n 1)}})"),
            ("even 10", success(1)),
            ("odd 7", success(1)),
        ])]);
    }

    #[test]
    fn test_def_is_global_and_assign_is_local() {
        run_tests_in_environment(vec![TestEnvironment(vec![
            test_setup!("def {set-global} (\\ {v} {def {g} v})"),
            test_setup!("def {set-local} (\\ {v} {= {l} v})"),
            test_setup!("set-global 5"),
            ("g", success(5)),
            test_setup!("set-local 6"),
            ("l", SpecificError("Unbound Symbol 'l'")),
            test_setup!("= {top} 9"),
            ("top", success(9)),
        ])]);
    }

    #[test]
    fn test_closure_equality_ignores_environment() {
        run_comprehensive_tests(vec![
            ("== (\\ {x} {x}) (\\ {x} {x})", success(1)),
            ("== (\\ {x} {x}) (\\ {x} {+ x 1})", success(0)),
            ("!= (\\ {x} {x}) (\\ {y} {y})", success(1)),
            ("== ((\\ {a b} {a}) 1) ((\\ {a b} {a}) 2)", success(1)),
            ("== + +", success(1)),
            ("== + -", success(0)),
        ]);
    }
}
