//! Crate-level integration tests exercising `Context`'s three entry points
//! against a small fake host, covering the end-to-end scenarios and
//! boundary behaviors from the interpreter's testable-properties list.

use qescript::context::{Context, MAX_SCRIPT_LENGTH};
use qescript::error::ErrorKind;
use qescript::host::{ArgSpec, ArgValue, Buffer, CmdDef, CommandRegistry, IntDefault, SetValue, VarValue, VariableBroker};
use qescript::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;

struct FakeBuffer {
    read_only: bool,
    mark: i64,
    point: i64,
    total_size: i64,
}

impl Default for FakeBuffer {
    fn default() -> Self {
        FakeBuffer {
            read_only: false,
            mark: 0,
            point: 0,
            total_size: 0,
        }
    }
}

impl Buffer for FakeBuffer {
    fn mark(&self) -> i64 {
        self.mark
    }
    fn point(&self) -> i64 {
        self.point
    }
    fn total_size(&self) -> i64 {
        self.total_size
    }
    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

#[derive(Default)]
struct FakeBroker {
    vars: HashMap<String, VarValue>,
}

impl VariableBroker for FakeBroker {
    fn get(&self, name: &str) -> VarValue {
        self.vars.get(name).cloned().unwrap_or(VarValue::Unknown)
    }
    fn set(&mut self, name: &str, value: SetValue) -> Result<(), String> {
        let v = match value {
            SetValue::Number(n) => VarValue::Number(n),
            SetValue::Str(s) => VarValue::Str(s),
        };
        self.vars.insert(name.to_string(), v);
        Ok(())
    }
}

/// A single registered command: `goto(n)`, standing in for a typical
/// mutating editor command with one required integer argument.
struct FakeCommands {
    goto_def: CmdDef,
    calls: RefCell<Vec<(String, Vec<ArgValue>)>>,
}

impl FakeCommands {
    fn new() -> Self {
        FakeCommands {
            goto_def: CmdDef {
                name: "goto",
                mutates: true,
                args: vec![ArgSpec::Window, ArgSpec::Int(IntDefault::Required)],
                int_value: 0,
                string_value: "",
            },
            calls: RefCell::new(vec![]),
        }
    }
}

impl CommandRegistry for FakeCommands {
    fn find(&self, name: &str) -> Option<&CmdDef> {
        (name == "goto").then_some(&self.goto_def)
    }
    fn invoke(&mut self, name: &str, args: Vec<ArgValue>) -> Result<Value, String> {
        self.calls.get_mut().push((name.to_string(), args));
        Ok(Value::Void)
    }
}

fn fixture() -> (FakeBroker, FakeCommands, FakeBuffer) {
    (FakeBroker::default(), FakeCommands::new(), FakeBuffer::default())
}

#[test]
fn arithmetic_precedence() {
    let (mut broker, mut commands, buffer) = fixture();
    let v = Context::eval_expression("1 + 2 * 3", &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(7));
}

#[test]
fn string_concat() {
    let (mut broker, mut commands, buffer) = fixture();
    let v = Context::eval_expression(r#""a" + "b" + "c""#, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Str("abc".into()));
}

#[test]
fn printf_style_format() {
    let (mut broker, mut commands, buffer) = fixture();
    let v = Context::eval_expression(r#""x=%d y=%s" % (42, "q")"#, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Str("x=42 y=q".into()));
}

#[test]
fn underscore_dash_equivalence() {
    let (mut broker, mut commands, buffer) = fixture();
    Context::eval_expression("tab-width = 4", &mut broker, &mut commands, &buffer).unwrap();
    let v = Context::eval_expression("tab_width", &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(4));
}

#[test]
fn unknown_command_reports_and_is_recoverable() {
    let (mut broker, mut commands, buffer) = fixture();
    let err = Context::eval_expression("unknown_cmd()", &mut broker, &mut commands, &buffer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownCommand("unknown-cmd".to_string()));
}

#[test]
fn command_dispatch_passes_window_and_converted_int() {
    let (mut broker, mut commands, buffer) = fixture();
    Context::eval_expression("goto(17)", &mut broker, &mut commands, &buffer).unwrap();
    let calls = commands.calls.borrow();
    assert_eq!(calls[0].0, "goto");
    assert_eq!(calls[0].1, vec![ArgValue::Int(17)]);
}

#[test]
fn read_only_buffer_refuses_mutating_command() {
    let (mut broker, mut commands, _buf) = fixture();
    let buffer = FakeBuffer {
        read_only: true,
        ..Default::default()
    };
    let err = Context::eval_expression("goto(3)", &mut broker, &mut commands, &buffer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ReadOnly);
}

#[test]
fn integer_round_trips_through_string_and_int() {
    let (mut broker, mut commands, buffer) = fixture();
    for n in [0i64, 1, -1, 42, i64::MAX, i64::MIN + 1] {
        let expr = format!("int(string({n}))");
        let v = Context::eval_expression(&expr, &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Number(n), "round trip failed for {n}");
    }
}

#[test]
fn char_round_trips_through_int_and_char() {
    let (mut broker, mut commands, buffer) = fixture();
    for scalar in [0x41u32, 0x20, 0xE9, 0x1F600] {
        let expr = format!("int(char({scalar}))");
        let v = Context::eval_expression(&expr, &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Number(scalar as i64));
    }
}

#[test]
fn negation_is_involutive_except_at_min() {
    let (mut broker, mut commands, buffer) = fixture();
    for n in [0i64, 1, -1, 42, -42, i64::MAX, i64::MIN + 1] {
        let expr = format!("-(-({n}))");
        let v = Context::eval_expression(&expr, &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(v, Value::Number(n));
    }
}

#[test]
fn string_length_property() {
    let (mut broker, mut commands, buffer) = fixture();
    let v = Context::eval_expression(r#""hello".length"#, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(5));
}

#[test]
fn division_overflow_cases() {
    let (mut broker, mut commands, buffer) = fixture();
    for expr in ["1 / 0", "1 % 0", &format!("{} / -1", i64::MIN)] {
        let err = Context::eval_expression(expr, &mut broker, &mut commands, &buffer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionOverflow, "expr: {expr}");
    }
}

#[test]
fn sixteen_nested_parens_evaluate() {
    let (mut broker, mut commands, buffer) = fixture();
    let expr = "(".repeat(15) + "1" + &")".repeat(15);
    let v = Context::eval_expression(&expr, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(1));
}

#[test]
fn deep_assignment_chain_overflows_the_stack() {
    // Parens reuse the same slot (`expr(ctx, slot, ...)`), so nesting them
    // never grows the stack. A right-nested assignment chain does: each
    // `=` recurses into `slot + 1` for its right-hand side, so sixteen
    // chained assignments walk the stack from slot 0 up through slot 16,
    // one past the sixteen-slot limit.
    let (mut broker, mut commands, buffer) = fixture();
    let names: Vec<String> = (0..16).map(|i| format!("a{i}")).collect();
    let expr = names.join("=") + "=1";
    let err = Context::eval_expression(&expr, &mut broker, &mut commands, &buffer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StackOverflow);
}

#[test]
fn logical_and_short_circuits() {
    let (mut broker, mut commands, buffer) = fixture();
    // If the RHS were evaluated it would assign `a`; short-circuit means
    // it never runs because the LHS is already false.
    Context::eval_expression("a = 9; 0 && (a = 1)", &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(broker.get("a"), VarValue::Number(9));
}

#[test]
fn logical_or_short_circuits() {
    let (mut broker, mut commands, buffer) = fixture();
    Context::eval_expression("a = 9; 1 || (a = 1)", &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(broker.get("a"), VarValue::Number(9));
}

#[test]
fn region_over_size_cap_is_rejected() {
    let (mut broker, mut commands, buffer) = fixture();
    let big = vec![b'1'; MAX_SCRIPT_LENGTH + 1];
    let err = Context::eval_region("<region>", &big, &mut broker, &mut commands, &buffer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BufferTooLarge);
}

#[test]
fn region_at_size_cap_passes() {
    let (mut broker, mut commands, buffer) = fixture();
    let mut src = vec![b' '; MAX_SCRIPT_LENGTH - 1];
    src.push(b'1');
    let v = Context::eval_region("<region>", &src, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(1));
}

#[test]
fn file_over_size_cap_is_rejected() {
    let (mut broker, mut commands, buffer) = fixture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.qe");
    std::fs::write(&path, vec![b'1'; MAX_SCRIPT_LENGTH + 1]).unwrap();
    let err = Context::eval_file(&path, &mut broker, &mut commands, &buffer).unwrap_err();
    assert_eq!(err.kind, ErrorKind::FileTooLarge);
}

#[test]
fn file_loads_and_evaluates() {
    let (mut broker, mut commands, buffer) = fixture();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.qe");
    std::fs::write(&path, "tab-width = 8;\ntab-width\n").unwrap();
    let v = Context::eval_file(&path, &mut broker, &mut commands, &buffer).unwrap();
    assert_eq!(v, Value::Number(8));
}
