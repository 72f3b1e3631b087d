//! qescript - embedded configuration and expression interpreter.
//!
//! This crate is the interpreter subsystem of a larger editor: it tokenizes
//! a small C-like surface syntax, evaluates expressions with a
//! precedence-climbing evaluator over a fixed-size value stack, dispatches
//! identifier-headed calls to a host-registered command table, reads and
//! writes host variables through a variable-broker interface, and executes
//! `if`/`else` statements and blocks with automatic semicolon insertion.
//!
//! The crate never references a concrete editor. Everything it needs from
//! its embedding host — variables, commands, buffer/window state — is
//! expressed as the traits in [`host`]. [`context::Context`] is the single
//! entry point: its three methods (`eval_expression`, `eval_region`,
//! `eval_file`) mirror the reference interpreter's three call sites (an
//! interactive prompt, a buffer region evaluated as a script, and a
//! loaded configuration file).
//!
//! Module layout, leaves first:
//! - [`value`]: the tagged value type held in each stack slot.
//! - [`token`] / [`cursor`] / [`lexer`]: tokenization.
//! - [`error`]: the lexical/syntactic/semantic/resource error taxonomy.
//! - [`host`]: the traits an embedding host implements.
//! - [`eval`]: value conversions, operator semantics, the expression
//!   evaluator, and skip mode.
//! - [`dispatch`]: command-call resolution and argument binding.
//! - [`stmt`]: the statement driver (blocks, `if`/`else`, ASI).
//! - [`context`]: per-evaluation state and the three entry points.

mod cursor;
mod dispatch;
mod eval;
mod lexer;
mod stmt;
mod token;

pub mod context;
pub mod error;
pub mod host;
pub mod value;

pub use context::Context;
pub use error::{Error, ErrorKind, Result};
pub use value::Value;
