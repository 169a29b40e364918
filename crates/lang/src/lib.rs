//! Scanner, parser and tree-walking interpreter for the Numen stack
//! language: a small, dynamically-typed, concatenative language where every
//! program manipulates a single explicit operand stack.
//!
//! The public pipeline is [`run_source`]: scan + parse a program into a
//! [`block::BlockTable`], then run its `_global` block followed by `main` if
//! one is defined, per the reference implementation's entry-point order.

pub mod block;
pub mod builtins;
pub mod interp;
pub mod parser;
pub mod scanner;

pub use numen_core::{Keyword, NumenError, NumenResult, SourcePos, TypeName, Value};

pub use block::{Block, BlockTable, Heap, Parameter, GLOBAL};
pub use interp::Interpreter;
pub use parser::parse_program;

/// Parse and run a complete program from source text.
///
/// Equivalent to `parse_program` followed by `Interpreter::run`, exposed as
/// a single call for callers (the CLI, tests) that don't need the
/// intermediate block table.
pub fn run_source(source: &str) -> NumenResult<()> {
    let table = parse_program(source)?;
    Interpreter::new(&table).run()
}
