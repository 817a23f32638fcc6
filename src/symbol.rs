use std::collections::HashMap;

use crate::types::Symbol;

/// Interned symbol table. Each case-folded name maps to exactly one `Symbol`,
/// so symbol comparison everywhere else is an integer comparison.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    by_key: HashMap<String, Symbol>,
    names: Vec<String>,
}

/// Well-known symbols, pre-interned at startup.
/// These must match the order of interning in `SymbolTable::new()`.
pub mod sym {
    use crate::types::Symbol;

    pub const QUOTE: Symbol = Symbol(0);
    pub const IF: Symbol = Symbol(1);
    pub const LAMBDA: Symbol = Symbol(2);
    pub const COND: Symbol = Symbol(3);
    pub const APPLY: Symbol = Symbol(4);
    pub const LABELS: Symbol = Symbol(5);
    pub const T: Symbol = Symbol(6);
    pub const NIL: Symbol = Symbol(7);

    pub(super) const NAMES: [&str; 8] = ["quote", "if", "lambda", "cond", "apply", "labels", "t", "nil"];

    /// The special forms, in dispatch order.
    pub const SPECIAL_FORMS: [Symbol; 6] = [QUOTE, IF, LAMBDA, COND, APPLY, LABELS];
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            by_key: HashMap::new(),
            names: Vec::new(),
        };
        for name in sym::NAMES {
            table.intern(name);
        }
        table
    }

    /// Returns the canonical handle for `name`, registering it on first sight.
    /// Names are compared case-insensitively; the first spelling seen is kept for printing.
    pub fn intern(&mut self, name: &str) -> Symbol {
        let key = name.to_lowercase();
        if let Some(&symbol) = self.by_key.get(&key) {
            return symbol;
        }
        let symbol = Symbol(self.names.len() as u32);
        log::trace!("interned symbol #{} '{}'", symbol.0, name);
        self.by_key.insert(key, symbol);
        self.names.push(name.to_string());
        symbol
    }

    /// Looks up a symbol without interning it.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.by_key.get(&name.to_lowercase()).copied()
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        &self.names[symbol.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
