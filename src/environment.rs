use crate::heap::Heap;
use crate::primitives::PRIMITIVES;
use crate::symbol::{SymbolTable, sym};
use crate::types::{PairId, Primitive, Symbol, Value};

/// First element of `alist` that is a pair whose first is identical to `key`, else nil.
/// Elements that are not pairs are skipped.
pub fn assoc(heap: &Heap, key: Value, alist: Value) -> Value {
    if key.is_nil() {
        return Value::Nil;
    }
    heap.iter(alist)
        .find(|&entry| match entry {
            Value::Pair(id) => heap.first(id) == key,
            _ => false,
        })
        .unwrap_or(Value::Nil)
}

/// An association list of `(symbol value)` bindings, newest first.
///
/// Environments are never mutated once built: binding a name conses a new
/// entry in front, which shadows any older binding of the same symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    alist: Value,
}

impl Environment {
    /// The empty environment.
    pub fn new() -> Self {
        Environment { alist: Value::Nil }
    }

    /// The top-level environment: every primitive, plus `nil` and `t`.
    pub fn new_global_populated(heap: &mut Heap, symbols: &mut SymbolTable) -> Self {
        let mut env = Environment::new()
            .define(heap, sym::T, Value::Symbol(sym::T))
            .define(heap, sym::NIL, Value::Nil);
        for (index, (name, _)) in PRIMITIVES.iter().enumerate().rev() {
            let symbol = symbols.intern(name);
            env = env.define(heap, symbol, Value::Primitive(Primitive(index)));
        }
        log::debug!("global environment holds {} primitives", PRIMITIVES.len());
        env
    }

    pub fn from_alist(alist: Value) -> Self {
        Environment { alist }
    }

    pub fn alist(self) -> Value {
        self.alist
    }

    /// Returns a new environment with `symbol` bound to `value` in front.
    pub fn define(self, heap: &mut Heap, symbol: Symbol, value: Value) -> Self {
        let cell = heap.cons(value, Value::Nil);
        let binding = heap.cons(Value::Symbol(symbol), cell);
        Environment {
            alist: heap.cons(binding, self.alist),
        }
    }

    /// Binds `symbol` to nil and also returns the cell holding the value, so
    /// it can be filled in once the environment it belongs to exists.
    pub fn define_placeholder(self, heap: &mut Heap, symbol: Symbol) -> (Self, PairId) {
        let cell = heap.alloc(Value::Nil, Value::Nil);
        let binding = heap.cons(Value::Symbol(symbol), Value::Pair(cell));
        let env = Environment {
            alist: heap.cons(binding, self.alist),
        };
        (env, cell)
    }

    /// The cell holding the value of the newest binding of `symbol`.
    pub fn value_cell(self, heap: &Heap, symbol: Symbol) -> Option<PairId> {
        match assoc(heap, Value::Symbol(symbol), self.alist) {
            Value::Pair(binding) => match heap.rest(binding) {
                Value::Pair(cell) => Some(cell),
                _ => None,
            },
            _ => None,
        }
    }

    /// Looks up the value of the newest binding of `symbol`.
    pub fn get(self, heap: &Heap, symbol: Symbol) -> Option<Value> {
        self.value_cell(heap, symbol).map(|cell| heap.first(cell))
    }

    /// Names of every bound symbol, newest first, without duplicates.
    pub fn identifiers(self, heap: &Heap, symbols: &SymbolTable) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for binding in heap.iter(self.alist) {
            if let Some(symbol) = heap.first_or_nil(binding).as_symbol() {
                let name = symbols.name(symbol);
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}
