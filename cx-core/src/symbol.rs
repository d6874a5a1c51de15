//! Symbol nodes (spec §3 "Symbol node", §6 "Symbol node fields").
//!
//! A `SymbolNode` is produced by the (out-of-scope) parser/symbol-table
//! builder; the evaluator only reads it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::types::TypeRef;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Function,
    Constant,
    Type,
    Variable,
    ReferenceParameter,
    ValueParameter,
    Stream,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Int(i64),
    Float(f64),
    Char(char),
    Str(Rc<str>),
}

/// Delegate for reading one character from a stream symbol.
///
/// Mirrors the teacher's `IOHandler` trait (`cx-core`'s analogue of
/// `vcpu::memory::io::IOHandler`): the runtime behavior of a stream is
/// injected rather than hardcoded, so tests can substitute a canned
/// character source instead of opening a real file or terminal.
pub trait StreamReader {
    /// Reads and consumes one character, or `None` at end of stream.
    fn read_char(&self) -> Option<char>;
}

/// A `StreamReader` backed by a fixed in-memory sequence, useful for tests
/// and for the standard-input stream's "one line read ahead of time" mode.
pub struct BufferedStreamReader {
    remaining: RefCell<std::vec::IntoIter<char>>,
}

impl BufferedStreamReader {
    pub fn new(contents: impl Into<String>) -> BufferedStreamReader {
        let chars: Vec<char> = contents.into().chars().collect();
        BufferedStreamReader {
            remaining: RefCell::new(chars.into_iter()),
        }
    }
}

impl StreamReader for BufferedStreamReader {
    fn read_char(&self) -> Option<char> {
        self.remaining.borrow_mut().next()
    }
}

#[derive(Debug)]
pub struct SymbolNode {
    pub kind: SymbolKind,
    pub ty: TypeRef,
    pub name: Rc<str>,
    pub constant: Option<ConstantValue>,
    /// Whether this symbol denotes the standard-input stream specifically
    /// (spec §4.1.4: "if the identifier denotes the standard-input
    /// stream, pushes one character from the terminal").
    pub is_stdin: bool,
    pub stream: Option<Rc<dyn StreamReader>>,
}

pub type SymbolRef = Rc<SymbolNode>;

impl SymbolNode {
    pub fn variable(name: impl Into<Rc<str>>, ty: TypeRef) -> SymbolNode {
        SymbolNode {
            kind: SymbolKind::Variable,
            ty,
            name: name.into(),
            constant: None,
            is_stdin: false,
            stream: None,
        }
    }

    pub fn constant(name: impl Into<Rc<str>>, ty: TypeRef, value: ConstantValue) -> SymbolNode {
        SymbolNode {
            kind: SymbolKind::Constant,
            ty,
            name: name.into(),
            constant: Some(value),
            is_stdin: false,
            stream: None,
        }
    }

    pub fn stream(
        name: impl Into<Rc<str>>,
        ty: TypeRef,
        reader: Rc<dyn StreamReader>,
        is_stdin: bool,
    ) -> SymbolNode {
        SymbolNode {
            kind: SymbolKind::Stream,
            ty,
            name: name.into(),
            constant: None,
            is_stdin,
            stream: Some(reader),
        }
    }
}
