use std::io;
use thiserror::Error;

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::primitives::PRIMITIVES;
use crate::reader::ReadError;
use crate::symbol::sym;
use crate::trace::TraceLevel;
use crate::types::{Primitive, Value};

// --- Evaluation Error ---
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("'{0}' is undefined")]
    UnboundSymbol(String),
    #[error("cannot eval expression '{0}'")]
    Unevaluable(String),
    #[error("{context} expects {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: String,
    },
    #[error("evaluation nested deeper than {0} levels")]
    StackExhausted(usize),
    #[error("cannot write output: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of every failure the interpreter can raise.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    UnboundSymbol,
    Unevaluable,
    TypeMismatch,
    StackExhausted,
    Io,
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Read(ReadError::TooDeep { .. }) => ErrorKind::StackExhausted,
            EvalError::Read(_) => ErrorKind::MalformedInput,
            EvalError::UnboundSymbol(_) => ErrorKind::UnboundSymbol,
            EvalError::Unevaluable(_) => ErrorKind::Unevaluable,
            EvalError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EvalError::StackExhausted(_) => ErrorKind::StackExhausted,
            EvalError::Io(_) => ErrorKind::Io,
        }
    }
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

impl Interpreter {
    pub(crate) fn type_mismatch(
        &self,
        context: impl Into<String>,
        expected: &'static str,
        found: Value,
    ) -> EvalError {
        EvalError::TypeMismatch {
            context: context.into(),
            expected,
            found: self.print(found),
        }
    }

    /// Evaluates `exp` in `env`. `level` is the nesting depth of this evaluation,
    /// 0 for a top-level expression.
    pub fn eval(&mut self, exp: Value, env: Environment, level: usize) -> EvalResult {
        if level >= self.max_depth {
            return Err(EvalError::StackExhausted(self.max_depth));
        }
        let tracing = self.tracer.enabled(TraceLevel::Eval);
        if tracing {
            self.trace_eval_start(exp, env, level);
        }
        let result = self.eval_expr(exp, env, level);
        if tracing {
            self.trace_eval_done(level);
        }
        result
    }

    // Kept out of line so the formatting buffers stay off the recursive frames.
    #[cold]
    #[inline(never)]
    fn trace_eval_start(&mut self, exp: Value, env: Environment, level: usize) {
        let env_text = self.print(env.alist());
        let exp_text = self.print(exp);
        self.tracer
            .line(level, format_args!("*** eval ({}) ********", level));
        self.tracer.line(level, format_args!("env: {}", env_text));
        self.tracer.line(level, format_args!("exp: {}", exp_text));
    }

    #[cold]
    #[inline(never)]
    fn trace_eval_done(&mut self, level: usize) {
        self.tracer
            .line(level, format_args!("*** eval ({}) done ***", level));
    }

    fn eval_expr(&mut self, exp: Value, env: Environment, level: usize) -> EvalResult {
        let id = match exp {
            Value::Nil => return Ok(Value::Nil),
            Value::Symbol(symbol) => {
                return env.get(&self.heap, symbol).ok_or_else(|| {
                    EvalError::UnboundSymbol(self.symbols.name(symbol).to_string())
                });
            }
            Value::Primitive(_) => return Err(EvalError::Unevaluable(self.print(exp))),
            Value::Pair(id) => id,
        };
        let operator = self.heap.first(id);
        let operands = self.heap.rest(id);

        match operator {
            Value::Symbol(sym::QUOTE) => Ok(self.heap.first_or_nil(operands)),
            Value::Symbol(sym::IF) => self.eval_if(operands, env, level),
            Value::Symbol(sym::LAMBDA) => Ok(exp),
            Value::Symbol(sym::COND) => self.eval_cond(operands, env, level),
            Value::Symbol(sym::APPLY) => self.eval_apply(operands, env, level),
            Value::Symbol(sym::LABELS) => self.eval_labels(operands, env, level),
            Value::Symbol(_) => self.eval_call(exp, operator, operands, env, level),
            Value::Pair(_) if self.is_lambda(operator) => {
                self.apply_lambda(operator, operands, env, level)
            }
            _ => Err(EvalError::Unevaluable(self.print(exp))),
        }
    }

    fn is_lambda(&self, value: Value) -> bool {
        self.heap.first_or_nil(value) == Value::Symbol(sym::LAMBDA)
    }

    /// `(if test then else)`
    fn eval_if(&mut self, operands: Value, env: Environment, level: usize) -> EvalResult {
        let test = self.heap.first_or_nil(operands);
        let branches = self.heap.rest_or_nil(operands);
        let branch = if self.eval(test, env, level + 1)?.is_nil() {
            self.heap.second(branches)
        } else {
            self.heap.first_or_nil(branches)
        };
        self.eval(branch, env, level + 1)
    }

    /// `(cond (test consequent...)...)`
    fn eval_cond(&mut self, clauses: Value, env: Environment, level: usize) -> EvalResult {
        let clauses: Vec<Value> = self.heap.iter(clauses).collect();
        for clause in clauses {
            if !clause.is_pair() {
                return Err(self.type_mismatch("cond clause", "a list", clause));
            }
            let test = self.heap.first_or_nil(clause);
            let result = self.eval(test, env, level + 1)?;
            if result.is_nil() {
                continue;
            }
            let consequents = self.heap.rest_or_nil(clause);
            if consequents.is_nil() {
                return Ok(result);
            }
            return self.eval_body(consequents, env, level + 1);
        }
        Ok(Value::Nil)
    }

    /// `(apply function list)`: the list is evaluated once and handed to the
    /// primitive as its argument list.
    fn eval_apply(&mut self, operands: Value, env: Environment, level: usize) -> EvalResult {
        let function = self.heap.first_or_nil(operands);
        let function = self.eval(function, env, level + 1)?;
        let Value::Primitive(primitive) = function else {
            return Err(self.type_mismatch("apply", "a primitive", function));
        };
        let list = self.heap.second(operands);
        let args = self.eval(list, env, level + 1)?;
        self.apply_primitive(primitive, args, level)
    }

    /// `(labels ((name definition)...) body...)`. Every name is bound before any
    /// definition is evaluated, so definitions can refer to each other.
    fn eval_labels(&mut self, operands: Value, env: Environment, level: usize) -> EvalResult {
        let bindings: Vec<Value> = self.heap.iter(self.heap.first_or_nil(operands)).collect();
        let mut extended = env;
        let mut pending = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let Some(name) = self.heap.first_or_nil(binding).as_symbol() else {
                return Err(self.type_mismatch("labels binding", "(name definition)", binding));
            };
            let (next, cell) = extended.define_placeholder(&mut self.heap, name);
            extended = next;
            pending.push((cell, self.heap.second(binding)));
        }
        for (cell, definition) in pending {
            let value = self.eval(definition, extended, level + 1)?;
            self.heap.set_first(cell, value);
        }
        let body = self.heap.rest_or_nil(operands);
        self.eval_body(body, extended, level + 1)
    }

    /// A call whose operator is a symbol other than a special form.
    fn eval_call(
        &mut self,
        exp: Value,
        operator: Value,
        operands: Value,
        env: Environment,
        level: usize,
    ) -> EvalResult {
        match self.eval(operator, env, level + 1)? {
            Value::Primitive(primitive) => {
                let args = self.evlis(operands, env, level)?;
                self.apply_primitive(primitive, args, level)
            }
            callee @ Value::Pair(_) if self.is_lambda(callee) => {
                self.apply_lambda(callee, operands, env, level + 1)
            }
            _ => Err(EvalError::Unevaluable(self.print(exp))),
        }
    }

    /// Evaluates each element of `list` in `env`, left to right, into a fresh list.
    fn evlis(&mut self, list: Value, env: Environment, level: usize) -> EvalResult {
        let expressions: Vec<Value> = self.heap.iter(list).collect();
        let mut values = Vec::with_capacity(expressions.len());
        for expression in expressions {
            values.push(self.eval(expression, env, level + 1)?);
        }
        Ok(self.heap.list(&values))
    }

    /// Binds the parameters of `lambda` to the argument expressions, each evaluated
    /// in the caller's `env`, then evaluates the body in the extended environment.
    ///
    /// Binding stops at whichever list runs out first: missing arguments leave their
    /// parameters unbound and surplus argument expressions are never evaluated.
    fn apply_lambda(
        &mut self,
        lambda: Value,
        args: Value,
        env: Environment,
        level: usize,
    ) -> EvalResult {
        let params: Vec<Value> = self.heap.iter(self.heap.second(lambda)).collect();
        let args: Vec<Value> = self.heap.iter(args).collect();
        let mut extended = env;
        for (param, arg) in params.into_iter().zip(args) {
            let Some(name) = param.as_symbol() else {
                return Err(self.type_mismatch("lambda parameter", "a symbol", param));
            };
            let value = self.eval(arg, env, level + 1)?;
            extended = extended.define(&mut self.heap, name, value);
        }
        let body = self.heap.rest_or_nil(self.heap.rest_or_nil(lambda));
        self.eval_body(body, extended, level)
    }

    /// Evaluates each form in turn, returning the last value (nil for no forms).
    fn eval_body(&mut self, body: Value, env: Environment, level: usize) -> EvalResult {
        let forms: Vec<Value> = self.heap.iter(body).collect();
        let mut result = Value::Nil;
        for form in forms {
            result = self.eval(form, env, level)?;
        }
        Ok(result)
    }

    pub(crate) fn apply_primitive(
        &mut self,
        primitive: Primitive,
        args: Value,
        level: usize,
    ) -> EvalResult {
        let (name, function) = PRIMITIVES[primitive.0];
        if self.tracer.enabled(TraceLevel::Prim) {
            let args_text = self.print(args);
            self.tracer
                .line(level, format_args!("(<primitive {}> {})", name, args_text));
        }
        function(self, args)
    }
}
