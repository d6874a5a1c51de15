//! The four mutually recursive evaluators: expression → simple-expression →
//! term → factor (spec §4.1). Each consumes tokens from the cursor, pushes
//! its result onto the runtime stack, and returns the result's type.

use std::cell::RefCell;
use std::rc::Rc;

use cx_core::{
    is_char, is_float, token_in, Address, BufferHandle, Cell, Frame, Operator, RuntimeStack,
    SymbolKind, SymbolRef, Token, TokenCursor, TypeRef, TypeRegistry, ADD_OPS, ASSIGN_OPS,
    MUL_OPS, RELATION_OPS, UNARY_OPS,
};
use cx_core::ArrayBuilder;

use crate::collaborators::Collaborators;
use crate::error::{EvalResult, RuntimeError};
use crate::lvalue;

/// Bundles the shared, borrowed state every evaluator call threads
/// through: the value stack, the active frame, the token cursor, and the
/// type registry. `Collaborators` is threaded as a separate argument (see
/// `collaborators.rs`) rather than stored here, so an implementation can
/// call back into `expression`/`term`/etc. without aliasing `ctx` against
/// itself.
pub struct Context<'a> {
    pub stack: &'a mut RuntimeStack,
    pub frame: &'a mut Frame,
    pub cursor: &'a mut dyn TokenCursor,
    pub registry: &'a TypeRegistry,
}

fn take_op(ctx: &Context) -> Operator {
    match ctx.cursor.token() {
        Token::Op(op) => *op,
        other => panic!("expected an operator token, found {:?}", other),
    }
}

/// 4.1.1 — relational layer.
pub fn expression(ctx: &mut Context, collab: &mut dyn Collaborators) -> EvalResult<TypeRef> {
    let left_ty = simple_expression(ctx, collab)?;

    if token_in(ctx.cursor.token(), RELATION_OPS) {
        let op = take_op(ctx);
        ctx.cursor.get_token();
        let right_ty = simple_expression(ctx, collab)?;

        let right = ctx.stack.pop();
        let left = ctx.stack.pop();
        let result = evaluate_relation(op, &left, &left_ty, &right, &right_ty);
        ctx.stack.push_bool(result);
        return Ok(Rc::clone(&ctx.registry.bool_ty));
    }

    Ok(left_ty)
}

fn evaluate_relation(op: Operator, left: &Cell, left_ty: &TypeRef, right: &Cell, right_ty: &TypeRef) -> bool {
    if is_float(left_ty) || is_float(right_ty) {
        apply_relation_f64(op, left.as_promoted_float(), right.as_promoted_float())
    } else if matches!(left, Cell::Address(_)) {
        compare_strings(op, left, right, left_ty)
    } else {
        apply_relation_i64(op, left.as_ordinal(), right.as_ordinal())
    }
}

fn compare_strings(op: Operator, left: &Cell, right: &Cell, left_ty: &TypeRef) -> bool {
    // Preserves the original's observed quirk: the compare length is the
    // *first* operand's declared size, not the shorter of the two.
    let len = left_ty.size;
    let left_bytes = left.as_address().read_bytes(len);
    let right_bytes = right.as_address().read_bytes(len);
    apply_relation_ordering(op, left_bytes.cmp(&right_bytes))
}

fn apply_relation_i64(op: Operator, l: i64, r: i64) -> bool {
    match op {
        Operator::EqEq => l == r,
        Operator::NotEq => l != r,
        Operator::Lt => l < r,
        Operator::Gt => l > r,
        Operator::Le => l <= r,
        Operator::Ge => l >= r,
        _ => unreachable!("non-relational operator reached relation dispatch"),
    }
}

fn apply_relation_f64(op: Operator, l: f64, r: f64) -> bool {
    match op {
        Operator::EqEq => l == r,
        Operator::NotEq => l != r,
        Operator::Lt => l < r,
        Operator::Gt => l > r,
        Operator::Le => l <= r,
        Operator::Ge => l >= r,
        _ => unreachable!("non-relational operator reached relation dispatch"),
    }
}

fn apply_relation_ordering(op: Operator, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        Operator::EqEq => ordering == Equal,
        Operator::NotEq => ordering != Equal,
        Operator::Lt => ordering == Less,
        Operator::Gt => ordering == Greater,
        Operator::Le => ordering != Greater,
        Operator::Ge => ordering != Less,
        _ => unreachable!("non-relational operator reached relation dispatch"),
    }
}

/// 4.1.2 — additive and logical-OR layer.
pub fn simple_expression(ctx: &mut Context, collab: &mut dyn Collaborators) -> EvalResult<TypeRef> {
    let leading_unary = if token_in(ctx.cursor.token(), UNARY_OPS) {
        let op = take_op(ctx);
        ctx.cursor.get_token();
        Some(op)
    } else {
        None
    };

    let mut ty = term(ctx, collab)?;

    // Preserved oddity (spec §9): the leading unary binds to the first
    // term only, not to the whole additive chain.
    if let Some(op) = leading_unary {
        apply_unary(ctx, op, &ty);
    }

    while token_in(ctx.cursor.token(), ADD_OPS) {
        let op = take_op(ctx);
        ctx.cursor.get_token();
        let right_ty = term(ctx, collab)?;

        let right = ctx.stack.pop();
        let left = ctx.stack.pop();
        let (result, result_ty) = apply_additive(ctx, op, left, &ty, right, &right_ty)?;
        ctx.stack.push(result);
        ty = result_ty;
    }

    Ok(ty)
}

fn apply_unary(ctx: &mut Context, op: Operator, ty: &TypeRef) {
    let value = ctx.stack.pop();
    let result = match op {
        Operator::Minus => {
            if is_float(ty) {
                Cell::Float(-value.as_promoted_float())
            } else {
                Cell::Int(-value.as_ordinal())
            }
        }
        Operator::Plus => value,
        Operator::Tilde => Cell::Int(!value.as_ordinal()),
        _ => unreachable!("non-unary operator reached unary dispatch"),
    };
    ctx.stack.push(result);
}

fn apply_additive(
    ctx: &mut Context,
    op: Operator,
    left: Cell,
    left_ty: &TypeRef,
    right: Cell,
    right_ty: &TypeRef,
) -> EvalResult<(Cell, TypeRef)> {
    match op {
        Operator::Plus | Operator::Minus => {
            if is_float(left_ty) || is_float(right_ty) {
                let l = left.as_promoted_float();
                let r = right.as_promoted_float();
                let v = if op == Operator::Plus { l + r } else { l - r };
                Ok((Cell::Float(v), Rc::clone(&ctx.registry.float_ty)))
            } else if is_char(left_ty) {
                let l = left.as_ordinal();
                let r = right.as_ordinal();
                let v = if op == Operator::Plus { l + r } else { l - r };
                let c = char::from_u32(v as u32).unwrap_or('\0');
                Ok((Cell::Char(c), Rc::clone(left_ty)))
            } else {
                let l = left.as_ordinal();
                let r = right.as_ordinal();
                let v = if op == Operator::Plus { l + r } else { l - r };
                Ok((Cell::Int(v), Rc::clone(&ctx.registry.int_ty)))
            }
        }
        Operator::Shl | Operator::Shr | Operator::Amp | Operator::Caret | Operator::Pipe => {
            let l = left.as_ordinal();
            let r = right.as_ordinal();
            let v = match op {
                Operator::Shl => l << r,
                Operator::Shr => l >> r,
                Operator::Amp => l & r,
                Operator::Caret => l ^ r,
                Operator::Pipe => l | r,
                _ => unreachable!(),
            };
            Ok((Cell::Int(v), Rc::clone(&ctx.registry.int_ty)))
        }
        Operator::PipePipe => {
            let l = left.as_ordinal() != 0;
            let r = right.as_ordinal() != 0;
            Ok((Cell::Bool(l || r), Rc::clone(&ctx.registry.bool_ty)))
        }
        _ => unreachable!("non-additive operator reached additive dispatch"),
    }
}

/// 4.1.3 — multiplicative and logical-AND layer.
pub fn term(ctx: &mut Context, collab: &mut dyn Collaborators) -> EvalResult<TypeRef> {
    let mut ty = factor(ctx, collab)?;

    while token_in(ctx.cursor.token(), MUL_OPS) {
        let op = take_op(ctx);
        ctx.cursor.get_token();
        let right_ty = factor(ctx, collab)?;

        let right = ctx.stack.pop();
        let left = ctx.stack.pop();
        let (result, result_ty) = apply_multiplicative(ctx, op, left, &ty, right, &right_ty)?;
        ctx.stack.push(result);
        ty = result_ty;
    }

    Ok(ty)
}

fn apply_multiplicative(
    ctx: &mut Context,
    op: Operator,
    left: Cell,
    left_ty: &TypeRef,
    right: Cell,
    right_ty: &TypeRef,
) -> EvalResult<(Cell, TypeRef)> {
    match op {
        Operator::Star => {
            if is_float(left_ty) || is_float(right_ty) {
                Ok((
                    Cell::Float(left.as_promoted_float() * right.as_promoted_float()),
                    Rc::clone(&ctx.registry.float_ty),
                ))
            } else {
                Ok((
                    Cell::Int(left.as_ordinal() * right.as_ordinal()),
                    Rc::clone(&ctx.registry.int_ty),
                ))
            }
        }
        Operator::Slash => {
            if is_float(left_ty) || is_float(right_ty) {
                let r = right.as_promoted_float();
                if r == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok((
                    Cell::Float(left.as_promoted_float() / r),
                    Rc::clone(&ctx.registry.float_ty),
                ))
            } else {
                let r = right.as_ordinal();
                if r == 0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                // Direct integer division (spec §9 redesign: the source
                // truncated via a float cast; this is the same result
                // computed without the detour).
                Ok((Cell::Int(left.as_ordinal() / r), Rc::clone(&ctx.registry.int_ty)))
            }
        }
        Operator::Percent => {
            let r = right.as_ordinal();
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok((Cell::Int(left.as_ordinal() % r), Rc::clone(&ctx.registry.int_ty)))
        }
        Operator::AmpAmp => {
            let l = left.as_ordinal() != 0;
            let r = right.as_ordinal() != 0;
            Ok((Cell::Bool(l && r), Rc::clone(&ctx.registry.bool_ty)))
        }
        _ => unreachable!("non-multiplicative operator reached multiplicative dispatch"),
    }
}

/// 4.1.4 — primary layer.
pub fn factor(ctx: &mut Context, collab: &mut dyn Collaborators) -> EvalResult<TypeRef> {
    match ctx.cursor.token().clone() {
        Token::Ident(symbol) => factor_identifier(ctx, collab, symbol),
        Token::IntLit(v) => {
            ctx.cursor.get_token();
            ctx.stack.push_int(v);
            Ok(Rc::clone(&ctx.registry.int_ty))
        }
        Token::FloatLit(v) => {
            ctx.cursor.get_token();
            ctx.stack.push_float(v);
            Ok(Rc::clone(&ctx.registry.float_ty))
        }
        Token::CharLit(c) => {
            ctx.cursor.get_token();
            ctx.stack.push_char(c);
            Ok(Rc::clone(&ctx.registry.char_ty))
        }
        Token::StringLit(s) => factor_string_literal(ctx, &s),
        Token::Op(Operator::Bang) => {
            ctx.cursor.get_token();
            let _ = factor(ctx, collab)?;
            let v = ctx.stack.pop().as_ordinal();
            ctx.stack.push_bool(v == 0);
            Ok(Rc::clone(&ctx.registry.bool_ty))
        }
        Token::Op(Operator::LParen) => {
            ctx.cursor.get_token();
            let ty = expression(ctx, collab)?;
            if matches!(ctx.cursor.token(), Token::Op(Operator::RParen)) {
                ctx.cursor.get_token();
            }
            Ok(ty)
        }
        Token::Op(Operator::LBracket) => factor_array_literal(ctx, collab),
        other => panic!("unexpected token in factor position: {:?}", other),
    }
}

fn factor_string_literal(ctx: &mut Context, s: &str) -> EvalResult<TypeRef> {
    ctx.cursor.get_token();
    let chars: Vec<char> = s.chars().collect();

    if chars.len() <= 1 {
        ctx.stack.push_char(chars.into_iter().next().unwrap_or('\0'));
        return Ok(Rc::clone(&ctx.registry.char_ty));
    }

    let bytes: Vec<u8> = chars.iter().map(|c| *c as u8).collect();
    let buf: BufferHandle = Rc::new(RefCell::new(bytes));
    let max_index = chars.len() as i64 - 1;
    let array_ty = ctx.registry.make_array(Rc::clone(&ctx.registry.char_ty), 0, max_index);
    ctx.stack.push_address(Address::Bytes(buf, 0));
    Ok(array_ty)
}

fn factor_array_literal(ctx: &mut Context, collab: &mut dyn Collaborators) -> EvalResult<TypeRef> {
    ctx.cursor.get_token(); // consume '['
    let mut builder = ArrayBuilder::new();

    loop {
        if matches!(ctx.cursor.token(), Token::Op(Operator::RBracket)) {
            break;
        }
        let elem_ty = expression(ctx, collab)?;
        let value = ctx.stack.pop();
        let pushed = match &value {
            Cell::Address(addr) => builder.push_aggregate(addr, elem_ty),
            _ => builder.push_scalar(&value, elem_ty),
        };
        pushed.map_err(|_| RuntimeError::AllocationFailure)?;
        if matches!(ctx.cursor.token(), Token::Op(Operator::Comma)) {
            ctx.cursor.get_token();
            continue;
        }
        break;
    }

    if matches!(ctx.cursor.token(), Token::Op(Operator::RBracket)) {
        ctx.cursor.get_token();
    }

    let (buf, array_ty) = builder.finish(ctx.registry);
    ctx.stack.push_address(Address::Bytes(buf, 0));
    lvalue::navigate_from_top_of_stack(ctx, collab, array_ty, false, None)
}

fn factor_identifier(
    ctx: &mut Context,
    collab: &mut dyn Collaborators,
    symbol: SymbolRef,
) -> EvalResult<TypeRef> {
    match symbol.kind {
        SymbolKind::Function => {
            ctx.cursor.get_token();
            collab.execute_subroutine_call(ctx, &symbol)
        }
        SymbolKind::Constant => collab.execute_constant(ctx, &symbol),
        SymbolKind::Type => {
            ctx.cursor.get_token();
            Ok(Rc::clone(&symbol.ty))
        }
        SymbolKind::Stream => {
            ctx.cursor.get_token();
            let reader = symbol
                .stream
                .as_ref()
                .expect("stream symbol has no attached reader");
            // `is_stdin` distinguishes the terminal stream from a file
            // stream only at the collaborator layer that opens the
            // underlying handle; both read through the same `StreamReader`.
            let c = reader.read_char().unwrap_or('\0');
            ctx.stack.push_char(c);
            collab.trace_data_fetch(&symbol, ctx.stack.top(), &ctx.registry.char_ty);
            Ok(Rc::clone(&ctx.registry.char_ty))
        }
        SymbolKind::Variable | SymbolKind::ValueParameter | SymbolKind::ReferenceParameter => {
            ctx.cursor.get_token();
            if token_in(ctx.cursor.token(), ASSIGN_OPS) {
                collab.execute_assignment(ctx, &symbol)
            } else {
                lvalue::execute_variable(ctx, collab, &symbol, false)
            }
        }
    }
}
