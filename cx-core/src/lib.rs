//! Shared runtime data model for the Cx expression evaluator: type
//! descriptors, symbol nodes, the tagged value cell, the runtime stack, the
//! token cursor, and array-literal construction.
//!
//! `cx-eval` consumes these types to drive the four mutually recursive
//! evaluators; this crate owns no evaluation logic of its own.

pub mod array;
pub mod stack;
pub mod symbol;
pub mod token;
pub mod types;
pub mod value;

pub use array::{ArrayBuilder, ArrayOverflow};
pub use stack::{Frame, RuntimeStack};
pub use symbol::{BufferedStreamReader, ConstantValue, StreamReader, SymbolKind, SymbolNode, SymbolRef};
pub use token::{
    Operator, Token, TokenCursor, VecTokenCursor, ADD_OPS, ASSIGN_OPS, MUL_OPS, RELATION_OPS,
    UNARY_OPS,
};
pub use types::{
    base_type, is_aggregate, is_char, is_float, is_integral, same_type, ArrayPayload,
    ComplexPayload, EnumPayload, FieldDescriptor, StreamPayload, TypeCode, TypeDescriptor,
    TypeForm, TypePayload, TypeRef, TypeRegistry,
};
pub use value::{Address, BufferHandle, Cell, CellHandle};
