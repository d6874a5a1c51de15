//! Array-literal construction (spec §4.1.5).
//!
//! The original source grows a raw byte buffer with manual reallocation and
//! leaves its lifetime to the caller. Per the spec's design note the buffer
//! here is owned by an `ArrayBuilder` that hands the finished allocation to
//! the statement executor as a `BufferHandle` — ordinary `Rc` bookkeeping
//! does the freeing, never a leak or a double-free.
//!
//! Byte layout uses `byteorder`, little-endian, the same way the teacher's
//! `vexfile` crate serializes register/constant-pool entries.

use std::rc::Rc;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::types::{ArrayPayload, TypeCode, TypeDescriptor, TypeForm, TypePayload, TypeRef, TypeRegistry};
use crate::value::{Address, BufferHandle, Cell};

/// Raised when an array literal's declared byte size cannot be represented
/// as `usize` (spec §7 `allocation_failure`). This is the crate's own
/// bounds check, not a process-level OOM — the global allocator aborts on
/// that already, so the only way to reach this is a literal whose total
/// size would overflow `usize` before any real allocation is attempted.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct ArrayOverflow;

fn checked_grow(current: usize, additional: usize) -> Result<usize, ArrayOverflow> {
    current.checked_add(additional).ok_or(ArrayOverflow)
}

/// Accumulates one array literal's elements into a single contiguous
/// buffer, tracking enough bookkeeping to build the resulting array type
/// descriptor once the literal is closed.
pub struct ArrayBuilder {
    buffer: Vec<u8>,
    element_count: i64,
    last_element_type: Option<TypeRef>,
}

impl ArrayBuilder {
    pub fn new() -> ArrayBuilder {
        ArrayBuilder {
            buffer: Vec::new(),
            element_count: 0,
            last_element_type: None,
        }
    }

    /// Appends a scalar element's raw bytes (spec §4.1.5 step 2, scalar
    /// case). `ty` is the element's static type, consulted only to decide
    /// the wire width — the recorded element type is whatever the caller
    /// passes here, last write wins (spec §9 "preserved oddity").
    pub fn push_scalar(&mut self, cell: &Cell, ty: TypeRef) -> Result<(), ArrayOverflow> {
        let width = match cell {
            Cell::Int(_) | Cell::Float(_) => 8,
            Cell::Char(_) | Cell::Bool(_) => 1,
            Cell::Address(_) => panic!("push_scalar called with an address cell"),
        };
        checked_grow(self.buffer.len(), width)?;

        match cell {
            Cell::Int(v) => self.buffer.write_i64::<LittleEndian>(*v).unwrap(),
            Cell::Float(v) => self.buffer.write_f64::<LittleEndian>(*v).unwrap(),
            Cell::Char(c) => self.buffer.push(*c as u8),
            Cell::Bool(b) => self.buffer.push(if *b { 1 } else { 0 }),
            Cell::Address(_) => unreachable!(),
        }
        self.element_count += 1;
        self.last_element_type = Some(ty);
        Ok(())
    }

    /// Appends an aggregate element by copying `ty.size` bytes out of the
    /// address on top of stack (spec §4.1.5 step 2, aggregate case).
    pub fn push_aggregate(&mut self, address: &Address, ty: TypeRef) -> Result<(), ArrayOverflow> {
        checked_grow(self.buffer.len(), ty.size)?;
        self.buffer.extend_from_slice(&address.read_bytes(ty.size));
        self.element_count += 1;
        self.last_element_type = Some(ty);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Closes the literal: returns the finished buffer and a fresh array
    /// descriptor per spec §4.1.5 step 5 (`element_count = max_index =
    /// num_elements`, element type the *last* pushed element's type).
    ///
    /// Built directly rather than through `TypeRegistry::make_array`: that
    /// constructor derives `element_count` from `max_index - min_index + 1`
    /// and `size` from `element_count * element_type.size`, which would
    /// silently undo the quirk this preserves (`max_index` set to the same
    /// value as `element_count`, one past the real last index) and would
    /// mis-size a literal whose elements aren't all the last element's
    /// width. `size` here is the buffer's actual byte length.
    pub fn finish(self, registry: &TypeRegistry) -> (BufferHandle, TypeRef) {
        let element_type = self
            .last_element_type
            .unwrap_or_else(|| registry.dummy_ty.clone());
        let element_count = self.element_count;
        let array_ty = Rc::new(TypeDescriptor {
            form: TypeForm::Array,
            type_code: TypeCode::Complex,
            size: self.buffer.len(),
            name: None,
            payload: TypePayload::Array(ArrayPayload {
                index_type: Rc::clone(&registry.int_ty),
                element_type,
                min_index: 0,
                max_index: element_count,
                element_count: element_count.max(0) as usize,
            }),
        });
        (Rc::new(std::cell::RefCell::new(self.buffer)), array_ty)
    }
}

impl Default for ArrayBuilder {
    fn default() -> ArrayBuilder {
        ArrayBuilder::new()
    }
}
