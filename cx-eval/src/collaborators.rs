//! The collaborators the core delegates to but does not implement itself
//! (spec §4.3, §6 "tracing hook"): constant materialization, subroutine
//! calls, and assignment. These have fixed contracts in the spec but their
//! bodies belong to the surrounding interpreter (symbol table, statement
//! executor) — out of scope for the evaluator core.
//!
//! `execute_assignment` and `execute_constant` are allowed to call back
//! into `expression`/`term`/etc. (assignment's right-hand side is itself
//! an expression), so they take the same `Context` the evaluators do, plus
//! `self` reborrowed as the `Collaborators` object to recurse with.

use std::cell::RefCell;
use std::rc::Rc;

use cx_core::{Address, BufferHandle, Cell, ConstantValue, SymbolRef, TypeRef};

use crate::error::EvalResult;
use crate::evaluator::{expression, Context};

pub trait Collaborators {
    /// Pushes `symbol`'s literal value and advances past it (spec §4.3).
    fn execute_constant(&mut self, ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef>;

    /// Leaves the call's return value on top of stack, cursor positioned
    /// past the closing parenthesis (spec §4.3). Opaque to the core.
    fn execute_subroutine_call(&mut self, ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef>;

    /// Evaluates the right-hand side, stores into `symbol`'s lvalue, and
    /// leaves the stored value on top of stack (spec §4.3).
    fn execute_assignment(&mut self, ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef>;

    /// Observability hook invoked after each rvalue materialization (spec
    /// §6). The core never interprets its return value.
    fn trace_data_fetch(&mut self, symbol: &SymbolRef, cell: &Cell, ty: &TypeRef);
}

/// A `Collaborators` that panics on every call — useful for exercising
/// the evaluator/navigator in isolation, where a test deliberately never
/// reaches a constant, call, or assignment.
pub struct NullCollaborators;

impl Collaborators for NullCollaborators {
    fn execute_constant(&mut self, _ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        panic!("NullCollaborators: unexpected constant reference to `{}`", symbol.name)
    }

    fn execute_subroutine_call(&mut self, _ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        panic!("NullCollaborators: unexpected call to `{}`", symbol.name)
    }

    fn execute_assignment(&mut self, _ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        panic!("NullCollaborators: unexpected assignment to `{}`", symbol.name)
    }

    fn trace_data_fetch(&mut self, _symbol: &SymbolRef, _cell: &Cell, _ty: &TypeRef) {}
}

/// A minimal, working `Collaborators` good enough to drive the end-to-end
/// scenarios in spec §8: constants of every literal kind, and assignment
/// to a plain local variable. Subroutine calls remain out of scope — a
/// hosting interpreter supplies its own implementation once statement
/// execution exists.
#[derive(Default)]
pub struct DefaultCollaborators;

impl Collaborators for DefaultCollaborators {
    fn execute_constant(&mut self, ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        let value = symbol
            .constant
            .as_ref()
            .unwrap_or_else(|| panic!("constant symbol `{}` has no literal value", symbol.name));

        let ty = match value {
            ConstantValue::Int(v) => {
                ctx.stack.push_int(*v);
                Rc::clone(&ctx.registry.int_ty)
            }
            ConstantValue::Float(v) => {
                ctx.stack.push_float(*v);
                Rc::clone(&ctx.registry.float_ty)
            }
            ConstantValue::Char(v) => {
                ctx.stack.push_char(*v);
                Rc::clone(&ctx.registry.char_ty)
            }
            ConstantValue::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                if chars.len() <= 1 {
                    ctx.stack.push_char(chars.into_iter().next().unwrap_or('\0'));
                    Rc::clone(&ctx.registry.char_ty)
                } else {
                    let bytes: Vec<u8> = chars.iter().map(|c| *c as u8).collect();
                    let buf: BufferHandle = Rc::new(RefCell::new(bytes));
                    let max_index = chars.len() as i64 - 1;
                    let array_ty = ctx.registry.make_array(Rc::clone(&ctx.registry.char_ty), 0, max_index);
                    ctx.stack.push_address(Address::Bytes(buf, 0));
                    array_ty
                }
            }
        };

        ctx.cursor.get_token();
        self.trace_data_fetch(symbol, ctx.stack.top(), &ty);
        Ok(ty)
    }

    fn execute_subroutine_call(&mut self, _ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        panic!(
            "DefaultCollaborators: function call to `{}` requires a statement executor, not supplied here",
            symbol.name
        )
    }

    fn execute_assignment(&mut self, ctx: &mut Context, symbol: &SymbolRef) -> EvalResult<TypeRef> {
        ctx.cursor.get_token(); // consume the assignment operator
        let rhs_ty = expression(ctx, self)?;
        let value = ctx.stack.pop();

        let handle = ctx.frame.get_value_address(symbol);
        *handle.borrow_mut() = value.clone();

        ctx.stack.push(value);
        Ok(rhs_ty)
    }

    fn trace_data_fetch(&mut self, _symbol: &SymbolRef, _cell: &Cell, _ty: &TypeRef) {}
}
