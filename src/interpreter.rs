use std::io::Write;

use crate::Span;
use crate::config::Config;
use crate::environment::Environment;
use crate::evaluator::EvalResult;
use crate::heap::Heap;
use crate::printer::Printer;
use crate::reader::Reader;
use crate::symbol::SymbolTable;
use crate::trace::Tracer;
use crate::types::Value;

/// One interpreter instance: its symbols, its heap, the input it reads from and
/// the output `write` prints to. Nothing is shared between instances.
pub struct Interpreter {
    pub(crate) symbols: SymbolTable,
    pub(crate) heap: Heap,
    pub(crate) reader: Reader,
    pub(crate) out: Box<dyn Write>,
    pub(crate) tracer: Tracer,
    pub(crate) max_depth: usize,
    global_env: Environment,
    last_span: Option<Span>,
}

impl Interpreter {
    pub fn new(source: impl Into<String>, out: Box<dyn Write>) -> Self {
        Self::with_config(source, out, &Config::default())
    }

    pub fn with_config(source: impl Into<String>, out: Box<dyn Write>, config: &Config) -> Self {
        let mut symbols = SymbolTable::new();
        let mut heap = Heap::new();
        let global_env = Environment::new_global_populated(&mut heap, &mut symbols);
        log::debug!(
            "interpreter ready: trace={}, max_depth={}",
            config.trace,
            config.max_depth
        );
        Interpreter {
            symbols,
            heap,
            reader: Reader::new(source).with_max_depth(config.max_depth),
            out,
            tracer: Tracer::stderr(config.trace),
            max_depth: config.max_depth,
            global_env,
            last_span: None,
        }
    }

    /// Sends trace lines to `tracer` instead of standard error.
    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    /// Reads one top-level expression, evaluates it in the global environment
    /// and returns the printed result.
    pub fn interpret(&mut self) -> EvalResult<String> {
        let value = self.eval_next()?;
        Ok(self.print(value))
    }

    /// Like `interpret`, but returns the value itself.
    pub fn eval_next(&mut self) -> EvalResult {
        let (exp, span) = self
            .reader
            .read(&mut self.symbols, &mut self.heap, &mut self.tracer)?;
        log::debug!("read expression at {}", span);
        self.last_span = Some(span);
        self.eval(exp, self.global_env, 0)
    }

    /// Reads the next expression without evaluating it.
    pub fn read(&mut self) -> EvalResult {
        let (value, _) = self
            .reader
            .read(&mut self.symbols, &mut self.heap, &mut self.tracer)?;
        Ok(value)
    }

    pub fn has_more(&self) -> bool {
        self.reader.has_more()
    }

    /// Replaces the remaining input. Symbols, heap and bindings are kept.
    pub fn reset(&mut self, source: impl Into<String>) {
        self.reader.reset(source);
        self.last_span = None;
    }

    pub fn source(&self) -> &str {
        self.reader.source()
    }

    pub fn print(&self, value: Value) -> String {
        Printer::new(&self.heap, &self.symbols).print(value)
    }

    pub fn global_env(&self) -> Environment {
        self.global_env
    }

    /// Names bound in the global environment.
    pub fn bound_names(&self) -> Vec<String> {
        self.global_env.identifiers(&self.heap, &self.symbols)
    }

    /// Span of the last top-level expression read.
    pub fn last_span(&self) -> Option<Span> {
        self.last_span
    }

    pub fn intern(&mut self, name: &str) -> Value {
        Value::Symbol(self.symbols.intern(name))
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}
