use std::collections::HashSet;

use crate::types::{PairId, Value};

/// A single cons cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Cell {
    first: Value,
    rest: Value,
}

/// The cons cell arena. All pairs live here and `PairId` is an index into `cells`,
/// so a circular list is just a cell whose rest names an earlier slot.
/// Cells are never freed.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    cells: Vec<Cell>,
}

impl Heap {
    pub fn new() -> Self {
        Heap {
            cells: Vec::with_capacity(1024),
        }
    }

    /// Allocates a fresh cell and returns its handle.
    pub fn alloc(&mut self, first: Value, rest: Value) -> PairId {
        let id = PairId(self.cells.len() as u32);
        self.cells.push(Cell { first, rest });
        id
    }

    /// Allocates a fresh pair.
    pub fn cons(&mut self, first: Value, rest: Value) -> Value {
        Value::Pair(self.alloc(first, rest))
    }

    #[inline]
    pub fn first(&self, id: PairId) -> Value {
        self.cells[id.index()].first
    }

    #[inline]
    pub fn rest(&self, id: PairId) -> Value {
        self.cells[id.index()].rest
    }

    #[inline]
    pub fn set_first(&mut self, id: PairId, value: Value) {
        self.cells[id.index()].first = value;
    }

    #[inline]
    pub fn set_rest(&mut self, id: PairId, value: Value) {
        self.cells[id.index()].rest = value;
    }

    /// First of a pair, nil for anything else. Used to destructure special forms,
    /// where a missing piece reads as nil.
    pub fn first_or_nil(&self, value: Value) -> Value {
        match value {
            Value::Pair(id) => self.first(id),
            _ => Value::Nil,
        }
    }

    /// Rest of a pair, nil for anything else.
    pub fn rest_or_nil(&self, value: Value) -> Value {
        match value {
            Value::Pair(id) => self.rest(id),
            _ => Value::Nil,
        }
    }

    /// `(first (rest value))`, the second element of a list.
    pub fn second(&self, value: Value) -> Value {
        self.first_or_nil(self.rest_or_nil(value))
    }

    /// Builds a proper list from a slice of values.
    pub fn list(&mut self, values: &[Value]) -> Value {
        values
            .iter()
            .rev()
            .fold(Value::Nil, |rest, &first| self.cons(first, rest))
    }

    pub fn iter(&self, list: Value) -> ListIter<'_> {
        ListIter {
            heap: self,
            current: list,
            seen: HashSet::new(),
        }
    }

    /// Number of allocated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Iterates over the elements of a list.
///
/// A dotted tail is yielded as the last element, and iteration ends as soon as
/// the chain of rests returns to a pair it has already visited.
pub struct ListIter<'a> {
    heap: &'a Heap,
    current: Value,
    seen: HashSet<PairId>,
}

impl Iterator for ListIter<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self.current {
            Value::Nil => None,
            Value::Pair(id) => {
                if !self.seen.insert(id) {
                    self.current = Value::Nil;
                    return None;
                }
                self.current = self.heap.rest(id);
                Some(self.heap.first(id))
            }
            tail => {
                self.current = Value::Nil;
                Some(tail)
            }
        }
    }
}
