//! Conversion from the generic parse tree into [`Value`]s.
//!
//! Reading never evaluates and never fails as a whole: a numeric literal that does
//! not fit its kind becomes an error value in place.

use crate::EvalError;
use crate::ast::{FloatType, IntegerType, ListKind, Value};
use crate::syntax::{Bracket, Node, NodeKind};

/// Read a parse tree node into a value
pub fn read(node: &Node) -> Value {
    match node.kind {
        NodeKind::Number => read_number(&node.text),
        NodeKind::Symbol => Value::Symbol(node.text.clone()),
        // A bare punctuation node has no value of its own
        NodeKind::Punct => Value::List(ListKind::Eager, vec![]),
        NodeKind::Group => {
            let kind = match node.bracket {
                Some(Bracket::Curly) => ListKind::Quoted,
                Some(Bracket::Round) | None => ListKind::Eager,
            };
            let items = node
                .children
                .iter()
                .filter(|child| child.kind != NodeKind::Punct)
                .map(read)
                .collect();
            Value::List(kind, items)
        }
    }
}

/// Numbers with a decimal point are floats, everything else is an integer
fn read_number(text: &str) -> Value {
    if text.contains('.') {
        match text.parse::<FloatType>() {
            Ok(n) if n.is_finite() => Value::Float(n),
            _ => EvalError::BadNumber.into(),
        }
    } else {
        match text.parse::<IntegerType>() {
            Ok(n) => Value::Integer(n),
            Err(_) => EvalError::BadNumber.into(),
        }
    }
}
