//! Turns pest's token pairs into the `cx_core::Token` stream the
//! evaluator core consumes, and declares identifiers into a symbol table
//! and frame as it goes (grounded in vasm's `lib.rs`: parse with pest,
//! then walk `Pair`s into the domain's own types).

use std::collections::HashMap;
use std::rc::Rc;

use cx_core::{Cell, Frame, Operator, SymbolNode, SymbolRef, Token, TypeRegistry};
use cx_support::FromMnemonic;
use pest::Parser;

use crate::parser::{CxParser, Rule};

pub type Error = pest::error::Error<Rule>;

/// Resolves identifiers to symbol nodes, declaring a fresh `int` variable
/// (initialized to zero in the active frame) the first time a name is
/// seen — the demo CLI has no separate declaration syntax of its own.
pub struct SymbolTable {
    registry: Rc<TypeRegistry>,
    symbols: HashMap<String, SymbolRef>,
}

impl SymbolTable {
    pub fn new(registry: Rc<TypeRegistry>) -> SymbolTable {
        SymbolTable {
            registry,
            symbols: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, name: &str, frame: &mut Frame) -> SymbolRef {
        if let Some(symbol) = self.symbols.get(name) {
            return Rc::clone(symbol);
        }
        let symbol: SymbolRef = Rc::new(SymbolNode::variable(name, Rc::clone(&self.registry.int_ty)));
        frame.bind(&symbol, Cell::Int(0));
        self.symbols.insert(name.to_string(), Rc::clone(&symbol));
        symbol
    }
}

pub fn tokenize(source: &str, symbols: &mut SymbolTable, frame: &mut Frame) -> Result<Vec<Token>, Error> {
    let mut pairs = CxParser::parse(Rule::program, source)?;
    let program = pairs.next().expect("program rule always produces one pair");

    let mut tokens = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::EOI => break,
            Rule::ident => tokens.push(Token::Ident(symbols.resolve(pair.as_str(), frame))),
            Rule::int_lit => tokens.push(Token::IntLit(
                pair.as_str().parse().expect("int_lit grammar guarantees a valid integer"),
            )),
            Rule::float_lit => tokens.push(Token::FloatLit(
                pair.as_str().parse().expect("float_lit grammar guarantees a valid float"),
            )),
            Rule::char_lit => {
                let inner = pair
                    .as_str()
                    .chars()
                    .nth(1)
                    .expect("char_lit grammar guarantees one inner character");
                tokens.push(Token::CharLit(inner));
            }
            Rule::string_lit => {
                let raw = pair.as_str();
                tokens.push(Token::StringLit(Rc::from(&raw[1..raw.len() - 1])));
            }
            Rule::op1 | Rule::op2 => {
                let op = Operator::from_mnemonic(pair.as_str())
                    .unwrap_or_else(|e| panic!("lexer produced an unrecognized operator spelling: {}", e));
                tokens.push(Token::Op(op));
            }
            other => panic!("unexpected grammar rule in token position: {:?}", other),
        }
    }
    Ok(tokens)
}
