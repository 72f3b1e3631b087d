//! The interpreter context: source buffer, cursor state, current token,
//! and the fixed-size value stack.

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Result};
use crate::eval;
use crate::host::{Buffer, CommandRegistry, VariableBroker};
use crate::lexer::{self, LexError};
use crate::stmt;
use crate::token::{Prec, Token};
use crate::value::Value;

/// Value-stack depth. Exceeding it is a first-class "stack overflow"
/// error rather than a dynamically growing allocation.
pub const STACK_SIZE: usize = 16;

/// Largest script this crate will parse from a region or file, matching
/// the reference interpreter's 128 KiB − 1 cap.
pub const MAX_SCRIPT_LENGTH: usize = 131_071;

/// Per-evaluation interpreter state: one `Context` per top-level
/// evaluation (an expression, a region, or a file).
pub struct Context {
    source_name: String,
    text: Vec<u8>,
    position: usize,
    line: u32,
    token: Token,
    prec: Prec,
    token_start: usize,
    token_line: u32,
    newline_seen: bool,
    stack: [Value; STACK_SIZE],
    stack_high: usize,
}

impl Context {
    fn new(source_name: impl Into<String>, mut text: Vec<u8>) -> Self {
        if text.last() != Some(&0) {
            text.push(0);
        }
        Context {
            source_name: source_name.into(),
            text,
            position: 0,
            line: 1,
            token: Token::Void,
            prec: Prec::None,
            token_start: 0,
            token_line: 1,
            newline_seen: false,
            stack: Default::default(),
            stack_high: 0,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn prec(&self) -> Prec {
        self.prec
    }

    pub fn newline_seen(&self) -> bool {
        self.newline_seen
    }

    pub fn token_line(&self) -> u32 {
        self.token_line
    }

    /// Builds a located error at the current token's line.
    pub fn error(&self, kind: ErrorKind) -> Error {
        Error::new(self.source_name.clone(), self.token_line, kind)
    }

    /// Builds a located error at an arbitrary line (used when rewinding
    /// to the start of a failed expression).
    pub fn error_at(&self, line: u32, kind: ErrorKind) -> Error {
        Error::new(self.source_name.clone(), line, kind)
    }

    /// Reads the next token, advancing cursor/line state. A lexical
    /// error halts the whole parse, matching the reference scanner: it
    /// is not recoverable at the statement level.
    pub fn advance(&mut self) -> Result<()> {
        let mut cursor = Cursor::new(&self.text);
        cursor.set_position(self.position);
        cursor.set_line(self.line);
        let result = lexer::next_token(&mut cursor);
        self.position = cursor.position();
        self.line = cursor.line();
        match result {
            Ok(lexed) => {
                self.token = lexed.token;
                self.prec = lexed.prec;
                self.token_start = lexed.start;
                self.token_line = lexed.line;
                self.newline_seen = lexed.newline_seen;
                Ok(())
            }
            Err((kind, line)) => {
                self.token = Token::Err;
                let error_kind = match kind {
                    LexError::UnterminatedString => ErrorKind::UnterminatedString,
                    LexError::InvalidNumber => ErrorKind::InvalidNumber,
                    LexError::UnsupportedOperator(c) => ErrorKind::UnsupportedOperator(c),
                };
                Err(self.error_at(line, error_kind))
            }
        }
    }

    /// True if the current token is `tok`; if so, consumes it.
    pub fn eat(&mut self, tok: &Token) -> Result<bool> {
        if &self.token == tok {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// True if the current token is the operator `s`; if so, consumes it.
    pub fn eat_op(&mut self, s: &str) -> Result<bool> {
        if self.token.is_op(s) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Requires the current token to be the operator `s`, consuming it.
    pub fn expect_op(&mut self, s: &str) -> Result<()> {
        if self.eat_op(s)? {
            Ok(())
        } else {
            let c = s.chars().next().unwrap_or('?');
            Err(self.error(ErrorKind::Expected(c)))
        }
    }

    /// Rewinds cursor/line to the start of the current token, used when
    /// an expression fails and the caller must restart error recovery
    /// from the failing expression's first token.
    pub fn rewind_to_token_start(&mut self) {
        self.position = self.token_start;
        self.line = self.token_line;
    }

    pub fn stack_get(&self, slot: usize) -> &Value {
        &self.stack[slot]
    }

    pub fn stack_set(&mut self, slot: usize, value: Value) {
        self.stack[slot] = value;
        if slot + 1 > self.stack_high {
            self.stack_high = slot + 1;
        }
    }

    pub fn stack_take(&mut self, slot: usize) -> Value {
        std::mem::take(&mut self.stack[slot])
    }

    /// Resets every slot at or above `from` to `Void`, matching the
    /// reference's per-statement release point.
    pub fn stack_reset_from(&mut self, from: usize) {
        for slot in &mut self.stack[from..] {
            *slot = Value::Void;
        }
        self.stack_high = from;
    }

    fn finish(
        source_name: impl Into<String>,
        text: Vec<u8>,
        broker: &mut dyn VariableBroker,
        commands: &mut dyn CommandRegistry,
        buffer: &dyn Buffer,
    ) -> Result<Value> {
        let mut ctx = Context::new(source_name, text);
        ctx.advance()?;
        stmt::run_all(&mut ctx, broker, commands, buffer)?;
        let value = ctx.stack_take(0);
        eval::getvalue(&mut ctx, broker, value)
    }

    /// Evaluates `text` as a script and returns the final value of the
    /// top-level expression slot (after a final `getvalue`), mirroring
    /// the reference's "evaluate expression" prompt entry point.
    pub fn eval_expression(
        text: &str,
        broker: &mut dyn VariableBroker,
        commands: &mut dyn CommandRegistry,
        buffer: &dyn Buffer,
    ) -> Result<Value> {
        Self::finish("<string>", text.as_bytes().to_vec(), broker, commands, buffer)
    }

    /// Evaluates `bytes` (already extracted from a buffer region by the
    /// host) as a script.
    pub fn eval_region(
        source_name: &str,
        bytes: &[u8],
        broker: &mut dyn VariableBroker,
        commands: &mut dyn CommandRegistry,
        buffer: &dyn Buffer,
    ) -> Result<Value> {
        if bytes.len() > MAX_SCRIPT_LENGTH {
            return Err(Error::new(source_name, 0, ErrorKind::BufferTooLarge));
        }
        Self::finish(source_name.to_string(), bytes.to_vec(), broker, commands, buffer)
    }

    /// Reads a file and evaluates it as a script, mirroring
    /// `parse_config_file`.
    pub fn eval_file(
        path: &std::path::Path,
        broker: &mut dyn VariableBroker,
        commands: &mut dyn CommandRegistry,
        buffer: &dyn Buffer,
    ) -> Result<Value> {
        let name = path.to_string_lossy().into_owned();
        let bytes = std::fs::read(path).map_err(|e| Error::new(name.clone(), 0, ErrorKind::Io(e.to_string())))?;
        if bytes.len() > MAX_SCRIPT_LENGTH {
            return Err(Error::new(name, 0, ErrorKind::FileTooLarge));
        }
        Self::finish(name, bytes, broker, commands, buffer)
    }
}

#[cfg(test)]
impl Context {
    /// A bare, unadvanced context over `text`, for unit tests in sibling
    /// modules (e.g. [`crate::dispatch`]) that want to drive the lexer
    /// and stack directly without going through a full `eval_*` entry
    /// point.
    pub(crate) fn eval_expression_for_test(text: &str) -> Context {
        Context::new("<test>", text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ArgValue, CmdDef, SetValue, VarValue};
    use std::collections::HashMap;

    struct FakeBuffer;
    impl Buffer for FakeBuffer {
        fn mark(&self) -> i64 {
            0
        }
        fn point(&self) -> i64 {
            0
        }
        fn total_size(&self) -> i64 {
            0
        }
        fn is_read_only(&self) -> bool {
            false
        }
    }

    struct FakeBroker {
        vars: HashMap<String, VarValue>,
    }
    impl VariableBroker for FakeBroker {
        fn get(&self, name: &str) -> VarValue {
            self.vars.get(name).cloned().unwrap_or(VarValue::Unknown)
        }
        fn set(&mut self, name: &str, value: SetValue) -> std::result::Result<(), String> {
            let v = match value {
                SetValue::Number(n) => VarValue::Number(n),
                SetValue::Str(s) => VarValue::Str(s),
            };
            self.vars.insert(name.to_string(), v);
            Ok(())
        }
    }

    struct FakeCommands;
    impl CommandRegistry for FakeCommands {
        fn find(&self, _name: &str) -> Option<&CmdDef> {
            None
        }
        fn invoke(&mut self, name: &str, _args: Vec<ArgValue>) -> std::result::Result<Value, String> {
            Err(format!("unknown command '{name}'"))
        }
    }

    fn fixture() -> (FakeBroker, FakeCommands, FakeBuffer) {
        (
            FakeBroker {
                vars: HashMap::from([("a".to_string(), VarValue::Number(0))]),
            },
            FakeCommands,
            FakeBuffer,
        )
    }

    #[test]
    fn evaluates_arithmetic() {
        let (mut broker, mut commands, buffer) = fixture();
        let v = Context::eval_expression("1 + 2 * 3", &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Number(7));
    }

    #[test]
    fn evaluates_string_concat() {
        let (mut broker, mut commands, buffer) = fixture();
        let v = Context::eval_expression(r#""a" + "b" + "c""#, &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Str("abc".into()));
    }

    #[test]
    fn region_over_size_cap_is_rejected() {
        let (mut broker, mut commands, buffer) = fixture();
        let big = vec![b'1'; MAX_SCRIPT_LENGTH + 1];
        let err = Context::eval_region("<region>", &big, &mut broker, &mut commands, &buffer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BufferTooLarge);
    }

    #[test]
    fn underscore_dash_equivalence() {
        let (mut broker, mut commands, buffer) = fixture();
        Context::eval_expression("tab-width = 4", &mut broker, &mut commands, &buffer).unwrap();
        let v = Context::eval_expression("tab_width", &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Number(4));
    }
}
