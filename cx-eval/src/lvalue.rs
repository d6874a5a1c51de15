//! The l-value navigator (spec §4.2): transforms a base address into the
//! effective address of a subscripted/field-accessed sub-element, then
//! optionally dereferences down to a scalar rvalue.

use byteorder::{ByteOrder, LittleEndian};
use std::rc::Rc;

use cx_core::{
    is_aggregate, Address, Cell, Operator, SymbolKind, SymbolRef, Token, TokenCursor, TypeCode,
    TypePayload, TypeRef,
};

use crate::collaborators::Collaborators;
use crate::error::{EvalResult, RuntimeError};
use crate::evaluator::{expression, Context};

/// `execute_variable(symbol, address_flag)`.
pub fn execute_variable(
    ctx: &mut Context,
    collab: &mut dyn Collaborators,
    symbol: &SymbolRef,
    address_flag: bool,
) -> EvalResult<TypeRef> {
    if symbol.kind == SymbolKind::Stream {
        return Ok(Rc::clone(&symbol.ty));
    }

    let handle = ctx.frame.get_value_address(symbol);
    let pushes_stored_address =
        symbol.kind == SymbolKind::ReferenceParameter || is_aggregate(symbol.ty.form);

    if pushes_stored_address {
        let stored = handle.borrow().as_address().clone();
        ctx.stack.push_address(stored);
    } else {
        ctx.stack.push_address(Address::Cell(Rc::clone(&handle)));
    }

    navigate_from_top_of_stack(ctx, collab, Rc::clone(&symbol.ty), address_flag, Some(symbol))
}

/// The postfix part of the navigator: consumes subscript/field chains
/// against whatever address is already on top of stack, then optionally
/// dereferences to a scalar rvalue. Shared by `execute_variable` (base
/// address from a symbol's bound cell) and array-literal construction
/// (base address fresh off the literal's own buffer — spec §8's
/// `[10, 20, 30][1]` scenario subscripts a literal directly, not just a
/// named variable).
pub fn navigate_from_top_of_stack(
    ctx: &mut Context,
    collab: &mut dyn Collaborators,
    mut working_type: TypeRef,
    address_flag: bool,
    trace_symbol: Option<&SymbolRef>,
) -> EvalResult<TypeRef> {
    loop {
        match ctx.cursor.token() {
            Token::Op(Operator::LBracket) => {
                navigate_subscripts(ctx, collab, &mut working_type)?;
            }
            Token::Op(Operator::Dot) => {
                navigate_field(ctx, &mut working_type);
            }
            _ => break,
        }
    }

    if !address_flag && !is_aggregate(working_type.form) {
        let address = ctx.stack.pop();
        let address = address.as_address();
        let value = read_scalar(address, &working_type);
        if let Some(symbol) = trace_symbol {
            collab.trace_data_fetch(symbol, &value, &working_type);
        }
        ctx.stack.push(value);
    }

    Ok(working_type)
}

fn navigate_subscripts(
    ctx: &mut Context,
    collab: &mut dyn Collaborators,
    working_type: &mut TypeRef,
) -> EvalResult<()> {
    ctx.cursor.get_token(); // consume '['
    loop {
        expression(ctx, collab)?;
        let index = ctx.stack.pop().as_int();

        let (min_index, max_index, element_type) = match &working_type.payload {
            TypePayload::Array(array) => (array.min_index, array.max_index, Rc::clone(&array.element_type)),
            _ => panic!("subscript applied to a non-array working type"),
        };
        if index < min_index || index > max_index {
            return Err(RuntimeError::ValueOutOfRange {
                index,
                min: min_index,
                max: max_index,
            });
        }

        let offset = (index - min_index) as usize * element_type.size;
        let base = ctx.stack.pop();
        let address = base.as_address().offset_bytes(offset);
        ctx.stack.push_address(address);
        *working_type = element_type;

        if matches!(ctx.cursor.token(), Token::Op(Operator::Comma)) {
            ctx.cursor.get_token();
            continue;
        }
        break;
    }
    if matches!(ctx.cursor.token(), Token::Op(Operator::RBracket)) {
        ctx.cursor.get_token();
    }
    Ok(())
}

fn navigate_field(ctx: &mut Context, working_type: &mut TypeRef) {
    ctx.cursor.get_token(); // consume '.'
    let field_symbol = match ctx.cursor.token() {
        Token::Ident(sym) => Rc::clone(sym),
        other => panic!("expected a field name after `.`, found {:?}", other),
    };
    ctx.cursor.get_token();

    let (offset, field_type) = match &working_type.payload {
        TypePayload::Complex(complex) => {
            let field = complex
                .field(&field_symbol.name)
                .unwrap_or_else(|| panic!("unknown field `{}`", field_symbol.name));
            (field.offset, Rc::clone(&field.field_type))
        }
        _ => panic!("field access applied to a non-record working type"),
    };

    let base = ctx.stack.pop();
    let address = base.as_address().offset_bytes(offset);
    ctx.stack.push_address(address);
    *working_type = field_type;
}

/// Reads one scalar value out of an address, decoding raw bytes according
/// to the static type when the address points into a byte buffer.
fn read_scalar(address: &Address, ty: &TypeRef) -> Cell {
    match address {
        Address::Cell(handle) => handle.borrow().clone(),
        Address::Bytes(buf, offset) => {
            let data = buf.borrow();
            match ty.type_code {
                TypeCode::Int => Cell::Int(LittleEndian::read_i64(&data[*offset..*offset + 8])),
                TypeCode::Float => Cell::Float(LittleEndian::read_f64(&data[*offset..*offset + 8])),
                TypeCode::Char | TypeCode::WChar => Cell::Char(data[*offset] as char),
                TypeCode::Bool => Cell::Bool(data[*offset] != 0),
                other => panic!("cannot read a scalar of type code {:?} from a byte buffer", other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use cx_core::{Frame, RuntimeStack, SymbolNode, TypeRegistry, VecTokenCursor};

    use super::*;
    use crate::collaborators::NullCollaborators;

    #[test]
    fn subscript_walks_a_flat_int_array_to_the_element_address() {
        let reg = TypeRegistry::new();
        let array_ty = reg.make_array(Rc::clone(&reg.int_ty), 0, 2);

        let mut bytes = Vec::new();
        for v in [10i64, 20, 30] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let buf = Rc::new(RefCell::new(bytes));

        let symbol = Rc::new(SymbolNode::variable("a", Rc::clone(&array_ty)));
        let mut frame = Frame::new();
        frame.bind(&symbol, Cell::Address(Address::Bytes(buf, 0)));

        let mut stack = RuntimeStack::new();
        let mut cursor = VecTokenCursor::new(vec![
            Token::Op(Operator::LBracket),
            Token::IntLit(1),
            Token::Op(Operator::RBracket),
        ]);
        let mut collab = NullCollaborators;
        let mut ctx = Context {
            stack: &mut stack,
            frame: &mut frame,
            cursor: &mut cursor,
            registry: &reg,
        };

        let ty = execute_variable(&mut ctx, &mut collab, &symbol, false).unwrap();
        assert!(!cx_core::is_char(&ty));
        assert_eq!(stack.pop().as_int(), 20);
    }

    #[test]
    fn out_of_range_subscript_raises_value_out_of_range() {
        let reg = TypeRegistry::new();
        let array_ty = reg.make_array(Rc::clone(&reg.int_ty), 0, 2);
        let buf = Rc::new(RefCell::new(vec![0u8; 24]));
        let symbol = Rc::new(SymbolNode::variable("a", Rc::clone(&array_ty)));
        let mut frame = Frame::new();
        frame.bind(&symbol, Cell::Address(Address::Bytes(buf, 0)));

        let mut stack = RuntimeStack::new();
        let mut cursor = VecTokenCursor::new(vec![
            Token::Op(Operator::LBracket),
            Token::IntLit(9),
            Token::Op(Operator::RBracket),
        ]);
        let mut collab = NullCollaborators;
        let mut ctx = Context {
            stack: &mut stack,
            frame: &mut frame,
            cursor: &mut cursor,
            registry: &reg,
        };

        let err = execute_variable(&mut ctx, &mut collab, &symbol, false).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::ValueOutOfRange { index: 9, min: 0, max: 2 }
        );
    }
}
