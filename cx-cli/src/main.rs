//! Demo driver: reads one Cx expression from the command line, lexes it
//! with `cx-cli`'s pest grammar, and evaluates it through `cx-eval`.
//! Mirrors `vex`'s CLI shape (clap `app_from_crate!`, a single positional
//! argument) — the thing it drives is an expression evaluator instead of
//! a virtual machine image.

#[macro_use]
extern crate clap;

use std::rc::Rc;

use clap::Arg;

use cx_core::{Cell, Frame, RuntimeStack, TypeCode, TypeRef, TypeRegistry, VecTokenCursor};
use cx_eval::evaluator::{expression, Context};
use cx_eval::DefaultCollaborators;

mod lexer;
mod parser;
#[cfg(test)]
mod test;

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("EXPRESSION")
                .help("The Cx expression to evaluate")
                .index(1)
                .required(true),
        )
        .get_matches();

    let source = matches.value_of("EXPRESSION").unwrap();

    let registry = Rc::new(TypeRegistry::new());
    let mut symbols = lexer::SymbolTable::new(Rc::clone(&registry));
    let mut frame = Frame::new();

    let tokens = lexer::tokenize(source, &mut symbols, &mut frame).unwrap_or_else(|err| {
        eprintln!("parse error: {}", err);
        std::process::exit(1);
    });

    let mut stack = RuntimeStack::new();
    let mut cursor = VecTokenCursor::new(tokens);
    let mut collab = DefaultCollaborators::default();
    let mut ctx = Context {
        stack: &mut stack,
        frame: &mut frame,
        cursor: &mut cursor,
        registry: &*registry,
    };

    match expression(&mut ctx, &mut collab) {
        Ok(ty) => {
            let cell = ctx.stack.top();
            println!("{}", describe(cell, &ty));
        }
        Err(err) => {
            eprintln!("runtime error: {}", err);
            std::process::exit(1);
        }
    }
}

fn describe(cell: &Cell, ty: &TypeRef) -> String {
    match (cell, ty.type_code) {
        (Cell::Int(v), TypeCode::Bool) => format!("{}", *v != 0),
        (Cell::Bool(v), _) => format!("{}", v),
        (Cell::Int(v), _) => format!("{}", v),
        (Cell::Float(v), _) => format!("{}", v),
        (Cell::Char(v), _) => format!("'{}'", v),
        (Cell::Address(_), _) => format!("<{} bytes>", ty.size),
    }
}
