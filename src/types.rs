use std::fmt;

/// Handle to an interned symbol: an index into the interpreter's `SymbolTable`.
/// Two symbols with the same case-folded name always carry the same index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub(crate) u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a cons cell: an index into the interpreter's `Heap`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub(crate) u32);

impl PairId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a native function in the fixed primitive table.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Primitive(pub(crate) usize);

impl Primitive {
    pub fn name(self) -> &'static str {
        crate::primitives::PRIMITIVES[self.0].0
    }
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({})", self.name())
    }
}

/// The single runtime type of the interpreter.
///
/// Every variant is a small handle, so `==` on values is identity: two
/// separately consed lists with the same contents are *not* equal, while
/// two readings of the same symbol name are.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// The empty list, which is also the only false value.
    #[default]
    Nil,
    Symbol(Symbol),
    Pair(PairId),
    Primitive(Primitive),
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// Atoms are the leaves of list structure: symbols and nil.
    pub fn is_atom(self) -> bool {
        matches!(self, Value::Nil | Value::Symbol(_))
    }

    pub fn as_symbol(self) -> Option<Symbol> {
        match self {
            Value::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Symbol(_) => "symbol",
            Value::Pair(_) => "pair",
            Value::Primitive(_) => "primitive",
        }
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<PairId> for Value {
    fn from(id: PairId) -> Self {
        Value::Pair(id)
    }
}
