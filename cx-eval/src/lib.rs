//! The expression-evaluation core: the four mutually recursive evaluators
//! over a typed runtime stack, the l-value navigator, and the external
//! collaborator contracts they delegate to.

pub mod collaborators;
pub mod error;
pub mod evaluator;
pub mod lvalue;

pub use collaborators::{Collaborators, DefaultCollaborators, NullCollaborators};
pub use error::{EvalResult, RuntimeError};
pub use evaluator::{expression, factor, simple_expression, term, Context};
pub use lvalue::execute_variable;

#[cfg(test)]
mod test;
