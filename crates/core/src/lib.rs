//! Numen Core: the `Value` type and the fatal error hierarchy shared by the
//! scanner, parser and interpreter.
//!
//! Key design principle: the language has exactly one kind of runtime datum,
//! `Value`, with no composite values — so this crate stays small and has no
//! stack/arena machinery of its own. The operand stack itself is just a
//! `Vec<Value>` owned by the interpreter crate.
//!
//! # Modules
//!
//! - `value`: the runtime `Value` enum, `TypeName` and `Keyword` payload types.
//! - `error`: `NumenError`, the single fatal-error type propagated with `?`
//!   from every pipeline stage.

pub mod error;
pub mod value;

pub use error::{NumenError, NumenResult, SourcePos};
pub use value::{Keyword, TypeName, Value};
