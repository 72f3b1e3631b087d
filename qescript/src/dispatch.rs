//! Command dispatch: resolves a call-site identifier against the host's
//! command registry, falling back to the three built-in conversion
//! functions (`char`, `int`, `string`) only when the host has nothing
//! registered under that name.

use crate::context::Context;
use crate::error::{ErrorKind, Result};
use crate::eval;
use crate::host::{ArgSpec, ArgValue, Buffer, CommandRegistry, IntDefault, VariableBroker};
use crate::token::Prec;
use crate::value::Value;

/// Handles a call-site `name(...)`, leaving the result in `slot` and the
/// cursor past the closing `)`.
pub fn call(
    ctx: &mut Context,
    slot: usize,
    name: &str,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<()> {
    let Some(def) = commands.find(name).cloned() else {
        return match name {
            "char" => {
                let v = builtin_arg(ctx, slot, "char", broker, commands, buffer)?;
                let c = eval::tochar(ctx, broker, v)?;
                ctx.stack_set(slot, Value::Char(c));
                Ok(())
            }
            "int" => {
                let v = builtin_arg(ctx, slot, "int", broker, commands, buffer)?;
                let n = eval::tonum(ctx, broker, v)?;
                ctx.stack_set(slot, Value::Number(n));
                Ok(())
            }
            "string" => {
                let v = builtin_arg(ctx, slot, "string", broker, commands, buffer)?;
                let s = eval::tostr(ctx, broker, v)?;
                ctx.stack_set(slot, Value::Str(s));
                Ok(())
            }
            _ => Err(ctx.error(ErrorKind::UnknownCommand(name.to_string()))),
        };
    };

    if def.mutates && buffer.is_read_only() {
        return Err(ctx.error(ErrorKind::ReadOnly));
    }

    let mut args = Vec::with_capacity(def.args.len());
    let mut sep_needed = false;

    for spec in &def.args {
        match spec {
            ArgSpec::Window => continue,
            ArgSpec::IntVal => {
                args.push(ArgValue::Int(def.int_value));
                continue;
            }
            ArgSpec::StringVal => {
                args.push(ArgValue::Str(def.string_value.to_string()));
                continue;
            }
            ArgSpec::Int(default_kind) => {
                if ctx.token().is_op(")") {
                    if *default_kind == IntDefault::Required {
                        return Err(ctx.error(ErrorKind::MissingArguments(name.to_string())));
                    }
                    args.push(ArgValue::Int(eval::default_int(buffer, *default_kind)));
                    continue;
                }
                if sep_needed {
                    ctx.expect_op(",")?;
                }
                sep_needed = true;
                eval::expr(ctx, slot + 1, Prec::Assignment, false, broker, commands, buffer)
                    .map_err(|_| ctx.error(ErrorKind::MissingArguments(name.to_string())))?;
                let v = ctx.stack_take(slot + 1);
                let mut n = eval::tonum(ctx, broker, v)?;
                if *default_kind == IntDefault::NegOne {
                    n = n.wrapping_neg();
                }
                args.push(ArgValue::Int(n));
            }
            ArgSpec::Str => {
                if ctx.token().is_op(")") {
                    // No default for a string argument: the original
                    // leaves the cursor in front of ')' and lets the
                    // expression parser complain, which surfaces the
                    // same "missing arguments" error it does for ints.
                    return Err(ctx.error(ErrorKind::MissingArguments(name.to_string())));
                }
                if sep_needed {
                    ctx.expect_op(",")?;
                }
                sep_needed = true;
                eval::expr(ctx, slot + 1, Prec::Assignment, false, broker, commands, buffer)
                    .map_err(|_| ctx.error(ErrorKind::MissingArguments(name.to_string())))?;
                let v = ctx.stack_take(slot + 1);
                let s = eval::tostr(ctx, broker, v)?;
                args.push(ArgValue::Str(s));
            }
        }
    }

    if !ctx.eat_op(")")? {
        return Err(ctx.error(ErrorKind::ExtraArguments(name.to_string())));
    }

    let result = commands
        .invoke(name, args)
        .map_err(|msg| ctx.error(ErrorKind::CommandFailed(name.to_string(), msg)))?;
    ctx.stack_set(slot, result);
    Ok(())
}

/// Parses the single argument of a built-in `char`/`int`/`string` call,
/// matching the reference's `qe_cfg_get_args(ds, sp, 1, 1)`: exactly one
/// argument, no more, no fewer.
fn builtin_arg(
    ctx: &mut Context,
    slot: usize,
    name: &'static str,
    broker: &mut dyn VariableBroker,
    commands: &mut dyn CommandRegistry,
    buffer: &dyn Buffer,
) -> Result<Value> {
    let mut count = 0usize;
    while !ctx.token().is_op(")") {
        if count > 0 {
            ctx.expect_op(",")?;
        }
        eval::expr(ctx, slot + 1 + count, Prec::Assignment, false, broker, commands, buffer)?;
        count += 1;
    }
    ctx.expect_op(")")?;
    if count < 1 {
        return Err(ctx.error(ErrorKind::MissingArguments(name.to_string())));
    }
    if count > 1 {
        return Err(ctx.error(ErrorKind::ExtraArguments(name.to_string())));
    }
    Ok(ctx.stack_take(slot + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{CmdDef, SetValue, VarValue};
    use std::cell::RefCell;

    struct FakeBuffer {
        read_only: bool,
    }
    impl Buffer for FakeBuffer {
        fn mark(&self) -> i64 {
            5
        }
        fn point(&self) -> i64 {
            9
        }
        fn total_size(&self) -> i64 {
            100
        }
        fn is_read_only(&self) -> bool {
            self.read_only
        }
    }

    struct FakeBroker;
    impl VariableBroker for FakeBroker {
        fn get(&self, _name: &str) -> VarValue {
            VarValue::Unknown
        }
        fn set(&mut self, _name: &str, _value: SetValue) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    struct FakeCommands {
        def: Option<CmdDef>,
        calls: RefCell<Vec<(String, Vec<ArgValue>)>>,
    }
    impl CommandRegistry for FakeCommands {
        fn find(&self, name: &str) -> Option<&CmdDef> {
            self.def.as_ref().filter(|d| d.name == name)
        }
        fn invoke(&mut self, name: &str, args: Vec<ArgValue>) -> std::result::Result<Value, String> {
            self.calls.get_mut().push((name.to_string(), args.clone()));
            Ok(Value::Number(args.len() as i64))
        }
    }

    fn ctx_for(src: &str) -> Context {
        let mut ctx = Context::eval_expression_for_test(src);
        ctx.advance().unwrap();
        ctx
    }

    #[test]
    fn builtin_int_converts_string() {
        let mut ctx = ctx_for("int(\"42\"))");
        let mut broker = FakeBroker;
        let mut commands = FakeCommands { def: None, calls: RefCell::new(vec![]) };
        let buffer = FakeBuffer { read_only: false };
        ctx.stack_set(0, Value::Ident("int".to_string()));
        call(&mut ctx, 0, "int", &mut broker, &mut commands, &buffer).unwrap();
        assert_eq!(*ctx.stack_get(0), Value::Number(42));
    }

    #[test]
    fn missing_required_int_argument_errors() {
        let mut ctx = ctx_for(")");
        let mut broker = FakeBroker;
        let def = CmdDef {
            name: "goto",
            mutates: false,
            args: vec![ArgSpec::Int(IntDefault::Required)],
            int_value: 0,
            string_value: "",
        };
        let mut commands = FakeCommands { def: Some(def), calls: RefCell::new(vec![]) };
        let buffer = FakeBuffer { read_only: false };
        let err = call(&mut ctx, 0, "goto", &mut broker, &mut commands, &buffer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingArguments("goto".to_string()));
    }

    #[test]
    fn read_only_buffer_rejects_mutating_command() {
        let mut ctx = ctx_for(")");
        let mut broker = FakeBroker;
        let def = CmdDef {
            name: "insert",
            mutates: true,
            args: vec![],
            int_value: 0,
            string_value: "",
        };
        let mut commands = FakeCommands { def: Some(def), calls: RefCell::new(vec![]) };
        let buffer = FakeBuffer { read_only: true };
        let err = call(&mut ctx, 0, "insert", &mut broker, &mut commands, &buffer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReadOnly);
    }

    #[test]
    fn neg_argval_negates_explicit_value() {
        let mut ctx = ctx_for("3)");
        let mut broker = FakeBroker;
        let def = CmdDef {
            name: "repeat",
            mutates: false,
            args: vec![ArgSpec::Int(IntDefault::NegOne)],
            int_value: 0,
            string_value: "",
        };
        let mut commands = FakeCommands { def: Some(def), calls: RefCell::new(vec![]) };
        let buffer = FakeBuffer { read_only: false };
        call(&mut ctx, 0, "repeat", &mut broker, &mut commands, &buffer).unwrap();
        let (_, args) = &commands.calls.borrow()[0];
        assert_eq!(args[0], ArgValue::Int(-3));
    }

    #[test]
    fn extra_arguments_reported() {
        let mut ctx = ctx_for("1, 2)");
        let mut broker = FakeBroker;
        let def = CmdDef {
            name: "one-arg",
            mutates: false,
            args: vec![ArgSpec::Int(IntDefault::Required)],
            int_value: 0,
            string_value: "",
        };
        let mut commands = FakeCommands { def: Some(def), calls: RefCell::new(vec![]) };
        let buffer = FakeBuffer { read_only: false };
        let err = call(&mut ctx, 0, "one-arg", &mut broker, &mut commands, &buffer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExtraArguments("one-arg".to_string()));
    }
}
