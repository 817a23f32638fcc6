use std::collections::HashSet;

use crate::heap::Heap;
use crate::symbol::SymbolTable;
use crate::types::{PairId, Value};

pub const CIRCULAR: &str = "#<circular list>";

/// Renders values as text that the reader accepts again.
pub struct Printer<'a> {
    heap: &'a Heap,
    symbols: &'a SymbolTable,
    // Pairs on the path from the root to the value being printed.
    active: HashSet<PairId>,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap, symbols: &'a SymbolTable) -> Self {
        Printer {
            heap,
            symbols,
            active: HashSet::new(),
        }
    }

    pub fn print(&mut self, value: Value) -> String {
        let mut out = String::new();
        self.print_obj(value, true, &mut out);
        out
    }

    /// `head_of_list` is false while printing the rest of a list, where the
    /// opening paren has already been written.
    pub fn print_obj(&mut self, value: Value, head_of_list: bool, out: &mut String) {
        match value {
            Value::Nil => out.push_str("nil"),
            Value::Symbol(symbol) => write_symbol(self.symbols.name(symbol), out),
            Value::Primitive(primitive) => {
                out.push_str("#<primitive:");
                out.push_str(primitive.name());
                out.push('>');
            }
            Value::Pair(id) => self.print_list(id, head_of_list, out),
        }
    }

    fn print_list(&mut self, head: PairId, head_of_list: bool, out: &mut String) {
        if self.active.contains(&head) {
            out.push_str(CIRCULAR);
            return;
        }
        if head_of_list {
            out.push('(');
        }
        let mut entered = Vec::new();
        let mut current = head;
        loop {
            self.active.insert(current);
            entered.push(current);

            let first = self.heap.first(current);
            self.print_obj(first, true, out);

            match self.heap.rest(current) {
                Value::Nil => break,
                Value::Pair(next) if self.active.contains(&next) => {
                    out.push(' ');
                    out.push_str(CIRCULAR);
                    break;
                }
                Value::Pair(next) => {
                    out.push(' ');
                    current = next;
                }
                tail => {
                    out.push_str(" . ");
                    self.print_obj(tail, false, out);
                    break;
                }
            }
        }
        out.push(')');
        for id in entered {
            self.active.remove(&id);
        }
    }
}

/// Characters that end or alter a token when read unescaped.
fn is_special(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '\'' | ';' | '\\' | '|')
}

fn write_symbol(name: &str, out: &mut String) {
    let needs_quoting = name.is_empty() || name == "." || name.chars().any(is_special);
    if !needs_quoting {
        out.push_str(name);
    } else if !name.contains('|') {
        out.push('|');
        out.push_str(name);
        out.push('|');
    } else {
        for c in name.chars() {
            if is_special(c) {
                out.push('\\');
            }
            out.push(c);
        }
    }
}
