//! End-to-end scenarios from spec §8, each built from a hand-assembled
//! token stream (the lexer/parser is an external collaborator — see
//! `cx-cli` for a real one) and run through the full evaluator stack.

use std::rc::Rc;

use cx_core::{
    ConstantValue, Frame, Operator, RuntimeStack, SymbolNode, Token, TypeRegistry, VecTokenCursor,
};

use crate::collaborators::DefaultCollaborators;
use crate::error::RuntimeError;
use crate::evaluator::{expression, Context};

fn run(reg: &TypeRegistry, frame: &mut Frame, tokens: Vec<Token>) -> Result<(i64, cx_core::Cell), RuntimeError> {
    let mut stack = RuntimeStack::new();
    let mut cursor = VecTokenCursor::new(tokens);
    let mut collab = DefaultCollaborators::default();
    let mut ctx = Context {
        stack: &mut stack,
        frame,
        cursor: &mut cursor,
        registry: reg,
    };
    let depth_before = ctx.stack.depth();
    expression(&mut ctx, &mut collab)?;
    let depth_after = ctx.stack.depth();
    Ok((depth_after as i64 - depth_before as i64, ctx.stack.pop()))
}

#[test]
fn precedence_climbs_through_addition_and_multiplication() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();
    let (delta, result) = run(
        &reg,
        &mut frame,
        vec![
            Token::IntLit(1),
            Token::Op(Operator::Plus),
            Token::IntLit(2),
            Token::Op(Operator::Star),
            Token::IntLit(3),
        ],
    )
    .unwrap();
    assert_eq!(delta, 1);
    assert_eq!(result.as_int(), 7);
}

#[test]
fn integer_and_float_division_and_modulo() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();

    let (_, r) = run(&reg, &mut frame, vec![Token::IntLit(5), Token::Op(Operator::Slash), Token::IntLit(2)]).unwrap();
    assert_eq!(r.as_int(), 2);

    let (_, r) = run(&reg, &mut frame, vec![Token::FloatLit(5.0), Token::Op(Operator::Slash), Token::IntLit(2)]).unwrap();
    assert_eq!(r.as_float(), 2.5);

    let (_, r) = run(&reg, &mut frame, vec![Token::IntLit(5), Token::Op(Operator::Percent), Token::IntLit(2)]).unwrap();
    assert_eq!(r.as_int(), 1);
}

#[test]
fn relational_and_logical_and_combine_without_short_circuit() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();
    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::Op(Operator::LParen),
            Token::IntLit(3),
            Token::Op(Operator::Lt),
            Token::IntLit(5),
            Token::Op(Operator::RParen),
            Token::Op(Operator::AmpAmp),
            Token::Op(Operator::LParen),
            Token::IntLit(2),
            Token::Op(Operator::EqEq),
            Token::IntLit(2),
            Token::Op(Operator::RParen),
        ],
    )
    .unwrap();
    assert!(r.as_bool());
}

#[test]
fn logical_not_of_a_parenthesized_comparison() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();
    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::Op(Operator::Bang),
            Token::Op(Operator::LParen),
            Token::IntLit(1),
            Token::Op(Operator::EqEq),
            Token::IntLit(0),
            Token::Op(Operator::RParen),
        ],
    )
    .unwrap();
    assert!(r.as_bool());
}

#[test]
fn string_literal_comparisons() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();

    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::StringLit(Rc::from("abc")),
            Token::Op(Operator::EqEq),
            Token::StringLit(Rc::from("abc")),
        ],
    )
    .unwrap();
    assert!(r.as_bool());

    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::StringLit(Rc::from("abc")),
            Token::Op(Operator::Lt),
            Token::StringLit(Rc::from("abd")),
        ],
    )
    .unwrap();
    assert!(r.as_bool());
}

#[test]
fn array_literal_subscript_yields_its_element_and_records_element_count() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();
    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::Op(Operator::LBracket),
            Token::IntLit(10),
            Token::Op(Operator::Comma),
            Token::IntLit(20),
            Token::Op(Operator::Comma),
            Token::IntLit(30),
            Token::Op(Operator::RBracket),
            Token::Op(Operator::LBracket),
            Token::IntLit(1),
            Token::Op(Operator::RBracket),
        ],
    )
    .unwrap();
    assert_eq!(r.as_int(), 20);
}

#[test]
fn assignment_then_use_reads_back_the_stored_value() {
    let reg = TypeRegistry::new();
    let symbol = Rc::new(SymbolNode::variable("a", Rc::clone(&reg.int_ty)));
    let mut frame = Frame::new();
    frame.bind(&symbol, cx_core::Cell::Int(0));

    let assign_tokens = vec![
        Token::Ident(Rc::clone(&symbol)),
        Token::Op(Operator::Assign),
        Token::IntLit(7),
    ];
    let (_, assigned) = run(&reg, &mut frame, assign_tokens).unwrap();
    assert_eq!(assigned.as_int(), 7);

    let use_tokens = vec![
        Token::Ident(Rc::clone(&symbol)),
        Token::Op(Operator::Plus),
        Token::IntLit(1),
    ];
    let (_, used) = run(&reg, &mut frame, use_tokens).unwrap();
    assert_eq!(used.as_int(), 8);

    let handle = frame.get_value_address(&symbol);
    assert_eq!(handle.borrow().as_int(), 7);
}

#[test]
fn shift_bitwise_or_and_bitwise_not() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();

    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::IntLit(1),
            Token::Op(Operator::Shl),
            Token::IntLit(3),
            Token::Op(Operator::Pipe),
            Token::IntLit(1),
        ],
    )
    .unwrap();
    assert_eq!(r.as_int(), 9);

    let (_, r) = run(&reg, &mut frame, vec![Token::Op(Operator::Tilde), Token::IntLit(0)]).unwrap();
    assert_eq!(r.as_int(), -1);
}

#[test]
fn division_by_zero_is_fatal_regardless_of_the_dividend() {
    let reg = TypeRegistry::new();
    let mut frame = Frame::new();
    let err = run(&reg, &mut frame, vec![Token::IntLit(5), Token::Op(Operator::Slash), Token::IntLit(0)])
        .unwrap_err();
    assert_eq!(err, RuntimeError::DivisionByZero);
}

#[test]
fn integer_constant_round_trips_through_addition_and_subtraction() {
    let reg = TypeRegistry::new();
    let const_symbol = Rc::new(SymbolNode::constant("FORTY_TWO", Rc::clone(&reg.int_ty), ConstantValue::Int(42)));
    let mut frame = Frame::new();
    let (_, r) = run(
        &reg,
        &mut frame,
        vec![
            Token::Ident(const_symbol),
            Token::Op(Operator::Plus),
            Token::IntLit(8),
            Token::Op(Operator::Minus),
            Token::IntLit(8),
        ],
    )
    .unwrap();
    assert_eq!(r.as_int(), 42);
}
