//! The runtime value stack and activation-record frame (spec §4 "Runtime
//! Stack").

use std::collections::HashMap;
use std::rc::Rc;

use crate::symbol::SymbolRef;
use crate::value::{Address, Cell, CellHandle};

/// Typed value stack: push/pop/top, per spec §6 "Runtime stack interface".
#[derive(Default)]
pub struct RuntimeStack {
    cells: Vec<Cell>,
}

impl RuntimeStack {
    pub fn new() -> RuntimeStack {
        RuntimeStack { cells: Vec::new() }
    }

    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn push_int(&mut self, value: i64) {
        self.push(Cell::Int(value));
    }

    pub fn push_char(&mut self, value: char) {
        self.push(Cell::Char(value));
    }

    pub fn push_float(&mut self, value: f64) {
        self.push(Cell::Float(value));
    }

    pub fn push_bool(&mut self, value: bool) {
        self.push(Cell::Bool(value));
    }

    pub fn push_address(&mut self, address: Address) {
        self.push(Cell::Address(address));
    }

    pub fn pop(&mut self) -> Cell {
        self.cells.pop().expect("runtime stack underflow")
    }

    pub fn top(&self) -> &Cell {
        self.cells.last().expect("runtime stack is empty")
    }

    pub fn top_mut(&mut self) -> &mut Cell {
        self.cells.last_mut().expect("runtime stack is empty")
    }

    /// Replaces the address on top of stack in place — used by the l-value
    /// navigator while walking subscripts and field designators (spec
    /// §4.2 step 3: "update the in-place top of stack").
    pub fn set_top_address(&mut self, address: Address) {
        *self.top_mut() = Cell::Address(address);
    }

    pub fn depth(&self) -> usize {
        self.cells.len()
    }
}

/// The active activation record: binds symbols to the cell holding their
/// current value (spec §3 "Runtime stack frame").
#[derive(Default)]
pub struct Frame {
    values: HashMap<*const crate::symbol::SymbolNode, CellHandle>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            values: HashMap::new(),
        }
    }

    pub fn bind(&mut self, symbol: &SymbolRef, initial: Cell) -> CellHandle {
        let handle = initial.new_cell_handle();
        self.values.insert(Rc::as_ptr(symbol), Rc::clone(&handle));
        handle
    }

    /// Looks up the cell holding `symbol`'s current value within this
    /// activation record (spec §6 `get_value_address`).
    pub fn get_value_address(&self, symbol: &SymbolRef) -> CellHandle {
        self.values
            .get(&Rc::as_ptr(symbol))
            .cloned()
            .unwrap_or_else(|| panic!("symbol `{}` is not bound in the active frame", symbol.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolNode;
    use crate::types::TypeRegistry;

    #[test]
    fn push_pop_balances() {
        let mut stack = RuntimeStack::new();
        assert_eq!(stack.depth(), 0);
        stack.push_int(7);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.pop().as_int(), 7);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn frame_round_trips_a_bound_symbol() {
        let reg = TypeRegistry::new();
        let symbol: SymbolRef = Rc::new(SymbolNode::variable("a", Rc::clone(&reg.int_ty)));
        let mut frame = Frame::new();
        frame.bind(&symbol, Cell::Int(42));

        let handle = frame.get_value_address(&symbol);
        assert_eq!(handle.borrow().as_int(), 42);
    }

    #[test]
    fn set_top_address_replaces_in_place() {
        let buf = Rc::new(std::cell::RefCell::new(vec![0u8; 8]));
        let mut stack = RuntimeStack::new();
        stack.push_address(Address::Bytes(Rc::clone(&buf), 0));
        stack.set_top_address(Address::Bytes(Rc::clone(&buf), 4));
        match stack.top().as_address() {
            Address::Bytes(_, offset) => assert_eq!(*offset, 4),
            _ => panic!("expected bytes address"),
        }
    }
}
