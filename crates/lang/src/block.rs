//! Block table: a flat `name -> Block` map built by the parser and read by
//! the interpreter. Function calls reference each other by name rather than
//! by pointer, so the table is free to contain cycles (function `a` calling
//! function `b` calling `a`).

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use numen_core::Value;

/// The name of the synthetic top-level block that holds a program's
/// top-level tokens.
pub const GLOBAL: &str = "_global";

/// One parameter slot in a function's parameter list, in source (left to
/// right) order.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// A typed slot: pops a value of the given type and leaves it on the
    /// callee's initial operand stack.
    Typed(numen_core::TypeName),
    /// An identifier slot: pops a value and binds it into the callee's
    /// function heap under this name.
    Identifier(String),
}

/// A named, ordered sequence of tokens: either a user-defined function body
/// or the synthetic `_global` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: Vec<Value>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Block { name: name.into(), parameters: Vec::new(), body: Vec::new() }
    }
}

/// `name -> Block` map, populated only during parsing and read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct BlockTable(HashMap<String, Block>);

impl BlockTable {
    pub fn new() -> Self {
        BlockTable(HashMap::new())
    }

    /// Get or create the named block, so a function definition and its
    /// (possibly forward) references can both touch the same entry.
    pub fn entry_or_insert(&mut self, name: &str) -> &mut Block {
        self.0.entry(name.to_string()).or_insert_with(|| Block::new(name))
    }
}

impl Deref for BlockTable {
    type Target = HashMap<String, Block>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BlockTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A lexical scope: either a per-invocation function heap or the
/// program-wide global heap.
pub type Heap = HashMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_or_insert_creates_and_reuses() {
        let mut table = BlockTable::new();
        table.entry_or_insert("sq").body.push(Value::Int(1));
        assert_eq!(table.entry_or_insert("sq").body.len(), 1);
    }
}
