//! Pest-generated lexer, grounded in vasm's `derive(Parser)` over a
//! `.pest` grammar file (`vasm::parser`).

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "cx.pest"]
pub struct CxParser;
