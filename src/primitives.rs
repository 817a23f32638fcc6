use std::io::Write;

use crate::environment;
use crate::evaluator::EvalResult;
use crate::interpreter::Interpreter;
use crate::symbol::sym;
use crate::types::Value;

/// A native function. It receives the list of already evaluated arguments.
pub type PrimitiveFn = fn(&mut Interpreter, Value) -> EvalResult;

/// Every primitive, in the order they appear in the global environment.
pub const PRIMITIVES: &[(&str, PrimitiveFn)] = &[
    ("car", prim_car),
    ("cdr", prim_cdr),
    ("cons", prim_cons),
    ("assoc", prim_assoc),
    ("eq", prim_eq),
    ("pair?", prim_is_pair),
    ("symbol?", prim_is_symbol),
    ("null?", prim_is_null),
    ("read", prim_read),
    ("write", prim_write),
];

// Extracts the leading arguments of a primitive call. Missing ones read as nil
// and any surplus is ignored.
macro_rules! args {
    ($interp:expr, $args:expr, $first:ident) => {
        let $first = $interp.heap.first_or_nil($args);
    };
    ($interp:expr, $args:expr, $first:ident, $second:ident) => {
        let $first = $interp.heap.first_or_nil($args);
        let $second = $interp.heap.second($args);
    };
}

fn truth(condition: bool) -> Value {
    if condition {
        Value::Symbol(sym::T)
    } else {
        Value::Nil
    }
}

fn prim_car(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, list);
    match list {
        Value::Pair(id) => Ok(interp.heap.first(id)),
        other => Err(interp.type_mismatch("car", "a pair", other)),
    }
}

fn prim_cdr(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, list);
    match list {
        Value::Pair(id) => Ok(interp.heap.rest(id)),
        other => Err(interp.type_mismatch("cdr", "a pair", other)),
    }
}

fn prim_cons(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, first, rest);
    if let Value::Primitive(_) = first {
        return Err(interp.type_mismatch("cons", "a symbol, pair or nil", first));
    }
    Ok(interp.heap.cons(first, rest))
}

fn prim_assoc(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, key, alist);
    Ok(environment::assoc(&interp.heap, key, alist))
}

fn prim_eq(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, a, b);
    Ok(truth(a == b))
}

fn prim_is_pair(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, value);
    Ok(truth(value.is_pair()))
}

// nil counts as a symbol here, as it is an atom.
fn prim_is_symbol(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, value);
    Ok(truth(value.is_atom()))
}

fn prim_is_null(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, value);
    Ok(truth(value.is_nil()))
}

/// Reads the next expression from the interpreter's input, unevaluated.
fn prim_read(interp: &mut Interpreter, _args: Value) -> EvalResult {
    interp.read()
}

/// Prints its argument to the output without a trailing newline.
fn prim_write(interp: &mut Interpreter, args: Value) -> EvalResult {
    args!(interp, args, value);
    let text = interp.print(value);
    write!(interp.out, "{}", text)?;
    Ok(Value::Symbol(sym::T))
}
