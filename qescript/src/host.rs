//! Traits an embedding host implements to plug into the interpreter.
//!
//! `qescript` never references a concrete editor type. It only ever talks
//! to a [`VariableBroker`], a [`CommandRegistry`], and a [`Buffer`] — the
//! Rust-trait translation of spec.md §6's "collaborator interfaces
//! consumed". An embedder (see `qescript-cli`'s demo host) implements all
//! three against its own state.

use crate::value::Value;

/// What a variable read returns, mirroring the C broker's
/// `{UNKNOWN | NUMBER | STRING | CHARS}` result.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Unknown,
    Number(i64),
    /// An immutable string-valued variable.
    Str(String),
    /// A mutable character-buffer-valued variable (e.g. a mode name).
    /// Distinguished from `Str` only in the broker's own bookkeeping; the
    /// interpreter treats both identically once read.
    Chars(String),
}

/// What may be assigned to a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Number(i64),
    Str(String),
}

/// Read/write access to host-owned variables.
pub trait VariableBroker {
    fn get(&self, name: &str) -> VarValue;

    /// Assigns `value` to `name`. `Err` carries a message for a failed
    /// assignment (e.g. an unknown or read-only variable); the interpreter
    /// does not itself interpret the message, it only reports it.
    fn set(&mut self, name: &str, value: SetValue) -> std::result::Result<(), String>;
}

/// Pseudo-argument kinds supplied by the command definition itself rather
/// than parsed from the call site, plus the typed, caller-supplied kinds
/// and their default values when the caller omits the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgSpec {
    /// The active window/buffer handle, always passed implicitly first.
    Window,
    /// The command's own integer constant (`CmdDef::int_value`).
    IntVal,
    /// The command's own prompt string, used as a fixed string argument.
    StringVal,
    /// A caller-supplied integer argument, defaulting as given when the
    /// call site omits it.
    Int(IntDefault),
    /// A caller-supplied string argument. No default: omitting it is a
    /// "missing arguments" error.
    Str,
}

/// Default value (and, for `NegOne`, a post-parse sign flip) applied to an
/// [`ArgSpec::Int`] argument the caller did not supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntDefault {
    /// No default: omitting the argument is a "missing arguments" error.
    Required,
    /// `NO_ARG` sentinel (`i64::MIN`), used by commands that distinguish
    /// "not given" from any real value.
    NoArg,
    /// Defaults to `1` (the common repeat-count argument).
    One,
    /// Defaults to `-1`; also negates a caller-supplied value (mirrors the
    /// reference's `CMD_ARG_NEG_ARGVAL`, which doubles as both).
    NegOne,
    /// Defaults to the buffer's mark.
    Mark,
    /// Defaults to the buffer's point (current offset).
    Point,
    /// Defaults to zero.
    Zero,
    /// Defaults to the buffer's total size.
    BufferSize,
}

/// Sentinel returned for an omitted [`IntDefault::NoArg`] argument.
pub const NO_ARG: i64 = i64::MIN;

/// A host-registered command.
#[derive(Debug, Clone)]
pub struct CmdDef {
    pub name: &'static str,
    /// If true, the command mutates the buffer; dispatch refuses to run it
    /// against a read-only buffer.
    pub mutates: bool,
    pub args: Vec<ArgSpec>,
    /// The command's own integer constant, supplied to `ArgSpec::IntVal`
    /// slots (e.g. a repeat-count command bound to both "forward" and
    /// "backward" variants via different constants).
    pub int_value: i64,
    /// The command's own fixed string, supplied to `ArgSpec::StringVal`
    /// slots (e.g. a prompt string bound into the command definition
    /// rather than read from the call site).
    pub string_value: &'static str,
}

/// An evaluated, type-converted command argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Str(String),
}

/// Lookup and invocation of host commands.
pub trait CommandRegistry {
    fn find(&self, name: &str) -> Option<&CmdDef>;

    /// Invokes `name` with the already-converted argument vector (the
    /// window argument, if any, is included per the command's `args`).
    /// `Err` carries a message describing the failure.
    fn invoke(&mut self, name: &str, args: Vec<ArgValue>) -> std::result::Result<Value, String>;
}

/// The minimal buffer/window surface the dispatcher needs for pseudo-
/// argument defaults and the read-only guard.
pub trait Buffer {
    fn mark(&self) -> i64;
    fn point(&self) -> i64;
    fn total_size(&self) -> i64;
    fn is_read_only(&self) -> bool;
}
