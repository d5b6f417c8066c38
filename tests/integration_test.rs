//! End-to-end behavior through the public API: text in, rendered values out.
#![cfg(feature = "parser")]
#![expect(clippy::unwrap_used)] // test code OK

use teddy::ast::{Function, Value, qexpr, sexpr, sym, unit, val};
use teddy::evaluator::{Environment, apply, create_global_env, eval};
use teddy::parser::parse_program;
use teddy::reader::read;
use teddy::{Error, ParseErrorKind, run};

fn eval_line(env: &Environment, input: &str) -> Value {
    run(env, input).unwrap()
}

fn assert_error_contains(value: &Value, text: &str) {
    match value {
        Value::Error(msg) => assert!(msg.contains(text), "expected '{text}' in '{msg}'"),
        other => panic!("expected error containing '{text}', got {other:?}"),
    }
}

#[test]
fn numeric_literals_evaluate_to_themselves() {
    let env = create_global_env();
    for (text, expected) in [
        ("0", val(0)),
        ("42", val(42)),
        ("-17", val(-17)),
        ("9223372036854775807", val(i64::MAX)),
        ("2.5", val(2.5)),
        ("-0.125", val(-0.125)),
    ] {
        let tree = parse_program(text).unwrap();
        // The root group holds a single literal, which reads as that literal
        let value = eval(read(&tree), &env);
        assert_eq!(value, expected, "literal {text}");
    }
}

#[test]
fn closures_curry_into_new_closures() {
    let env = create_global_env();
    let add = eval_line(&env, "\\ {a b} {+ a b}");
    let Value::Function(add) = add else {
        panic!("lambda should produce a function, got {add:?}");
    };

    let partial = apply(&add, vec![val(3)], &env);
    let Value::Function(Function::Closure(closure)) = &partial else {
        panic!("partial application should produce a closure, got {partial:?}");
    };
    assert_eq!(closure.formals(), ["b".to_owned()]);
    assert_eq!(closure.env().lookup("a"), Ok(val(3)));
    assert_eq!(closure.body(), [sym("+"), sym("a"), sym("b")]);

    let Value::Function(partial) = partial else {
        unreachable!()
    };
    assert_eq!(apply(&partial, vec![val(4)], &env), val(7));

    // The original closure still expects two arguments
    let Function::Closure(original) = &add else {
        panic!("expected closure");
    };
    assert_eq!(original.formals().len(), 2);
    assert_eq!(apply(&add, vec![val(1), val(2)], &env), val(3));
}

#[test]
fn arithmetic_widens_and_reports_domain_errors() {
    let env = create_global_env();
    assert_eq!(eval_line(&env, "(+ 1 2.5)"), Value::Float(3.5));
    assert_eq!(eval_line(&env, "(+ 1 2)"), Value::Integer(3));
    assert_error_contains(&eval_line(&env, "(% 1 2.5)"), "only defined for two Integers");
    assert_error_contains(&eval_line(&env, "(/ 1 0)"), "Division By Zero");
    assert_error_contains(&eval_line(&env, "(/ 1.0 0.0)"), "Division By Zero");
    assert_error_contains(&eval_line(&env, "(% 7 0)"), "Division By Zero");
    assert_eq!(eval_line(&env, "^ 1 5000000000"), val(1));
    assert_eq!(eval_line(&env, "^ 0 5000000000"), val(0));
}

#[test]
fn head_requires_non_empty_list() {
    let env = create_global_env();
    assert_error_contains(&eval_line(&env, "(head {})"), "passed {} for argument 1");
    assert_eq!(eval_line(&env, "(head {1 2 3})"), qexpr(vec![val(1)]));
}

#[test]
fn def_is_global_and_put_is_local() {
    let env = create_global_env();
    assert_eq!(eval_line(&env, "(def {x} 5)"), unit());
    assert_eq!(eval_line(&env, "x"), val(5));

    eval_line(&env, "def {set-global} (\\ {v} {def {leaked} v})");
    eval_line(&env, "set-global 9");
    assert_eq!(eval_line(&env, "leaked"), val(9));

    eval_line(&env, "def {set-local} (\\ {v} {= {hidden} v})");
    assert_eq!(eval_line(&env, "set-local 9"), unit());
    assert_error_contains(&eval_line(&env, "hidden"), "Unbound Symbol 'hidden'");
}

#[test]
fn if_only_evaluates_the_taken_branch() {
    let env = create_global_env();
    assert_eq!(eval_line(&env, "(if 0 {1} {2})"), val(2));
    assert_eq!(eval_line(&env, "(if 1 {1} {2})"), val(1));
    assert_eq!(eval_line(&env, "(if 1 {1} {/ 1 0})"), val(1));

    assert_eq!(eval_line(&env, "if 0 {def {side} 1} {0}"), val(0));
    assert_error_contains(&eval_line(&env, "side"), "Unbound Symbol");
}

#[test]
fn closures_compare_structurally() {
    let env = create_global_env();
    assert_eq!(eval_line(&env, "== (\\ {a} {a}) (\\ {a} {a})"), val(1));
    assert_eq!(eval_line(&env, "!= (\\ {a} {a}) (\\ {a} {+ a 1})"), val(1));

    // Captured arguments are not part of the comparison
    eval_line(&env, "def {add} (\\ {a b} {+ a b})");
    assert_eq!(eval_line(&env, "== (add 1) (add 2)"), val(1));
}

#[test]
fn first_error_wins_and_stops_evaluation() {
    let env = create_global_env();
    assert_error_contains(&eval_line(&env, "(1 2 (/ 1 0))"), "Division By Zero");
    assert_error_contains(
        &eval_line(&env, "(+ 1 (/ 1 0) (missing))"),
        "Division By Zero",
    );
    assert_error_contains(
        &eval_line(&env, "(+ 1 (missing) (/ 1 0))"),
        "Unbound Symbol 'missing'",
    );

    eval_line(&env, "list (/ 1 0) (def {after} 1)");
    assert_error_contains(&eval_line(&env, "after"), "Unbound Symbol 'after'");
}

#[test]
fn renders_results_like_the_prompt() {
    let env = create_global_env();
    let cases = [
        ("+ 1 2", "3"),
        ("+ 1 2.5", "3.500000"),
        ("list 1 2 {3 4}", "{1 2 {3 4}}"),
        ("{}", "{}"),
        ("()", "()"),
        ("head", "#<builtin:head>"),
        ("\\ {x} {x}", "#<function>"),
        ("/ 10 0", "Error: Division By Zero"),
        ("nope", "Error: Unbound Symbol 'nope'"),
        ("1 2", "Error: S-Expression starts with incorrect type. Got Integer, Expected Function."),
    ];
    for (input, expected) in cases {
        assert_eq!(eval_line(&env, input).to_string(), expected, "rendering '{input}'");
    }
}

#[test]
fn recursive_programs() {
    let env = create_global_env();
    let program = [
        "def {fun} (\\ {args body} {def (head args) (\\ (tail args) body)})",
        "fun {fact n} {if (<= n 1) {1} {* n (fact (- n 1))}}",
        "fun {len-of xs} {if (== xs {}) {0} {+ 1 (len-of (tail xs))}}",
        "fun {sum & xs} {eval (join {+ 0} xs)}",
    ];
    for line in program {
        assert_eq!(eval_line(&env, line), unit(), "defining '{line}'");
    }

    assert_eq!(eval_line(&env, "fact 10"), val(3_628_800));
    assert_eq!(eval_line(&env, "len-of {1 2 3 4}"), val(4));
    assert_eq!(eval_line(&env, "sum 1 2 3 4.5"), val(10.5));
    assert_eq!(eval_line(&env, "sum 5"), val(5));
    assert_error_contains(&eval_line(&env, "fact 30"), "Integer overflow");
}

#[test]
fn environments_are_isolated() {
    let first = create_global_env();
    let second = create_global_env();
    eval_line(&first, "def {x} 1");
    assert_eq!(eval_line(&first, "x"), val(1));
    assert_error_contains(&eval_line(&second, "x"), "Unbound Symbol 'x'");
}

#[test]
fn builtins_can_be_rebound() {
    let env = create_global_env();
    eval_line(&env, "def {plus} +");
    assert_eq!(eval_line(&env, "plus 2 3"), val(5));
    eval_line(&env, "def {+} -");
    assert_eq!(eval_line(&env, "+ 2 3"), val(-1));
}

#[test]
fn eval_runs_quoted_code() {
    let env = create_global_env();
    assert_eq!(eval_line(&env, "eval {+ 1 2}"), val(3));
    assert_eq!(eval_line(&env, "eval (list * 2 (+ 1 2))"), val(6));
    assert_eq!(
        eval(sexpr(vec![sym("eval"), qexpr(vec![sym("len"), val([1, 2])])]), &env),
        val(2)
    );
}

#[test]
fn parse_errors_surface_as_rust_errors() {
    let env = create_global_env();
    match run(&env, "(+ 1 2") {
        Err(Error::ParseError(e)) => assert_eq!(e.kind, ParseErrorKind::Incomplete),
        other => panic!("expected incomplete input, got {other:?}"),
    }
    match run(&env, "+ 1 2)") {
        Err(Error::ParseError(e)) => assert_eq!(e.kind, ParseErrorKind::InvalidSyntax),
        other => panic!("expected invalid syntax, got {other:?}"),
    }
}
