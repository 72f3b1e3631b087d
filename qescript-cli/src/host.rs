//! A toy in-memory host: an editor's worth of state (text, point, mark,
//! read-only flag), host variables, and two demo commands (`insert` and
//! `print`), enough to exercise the three `qescript::host` traits end to
//! end from the command line.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use qescript::host::{
    ArgSpec, ArgValue, Buffer, CmdDef, CommandRegistry, IntDefault, SetValue, VarValue,
    VariableBroker,
};
use qescript::value::Value;

use crate::config::Config;

/// The buffer a script runs against: a flat byte vector with a point and
/// a mark, standing in for an editor's text buffer.
pub struct DemoBuffer {
    text: RefCell<Vec<u8>>,
    point: Cell<i64>,
    mark: Cell<i64>,
    read_only: bool,
}

impl DemoBuffer {
    pub fn new(initial: Vec<u8>, read_only: bool) -> Self {
        let len = initial.len() as i64;
        DemoBuffer {
            text: RefCell::new(initial),
            point: Cell::new(len),
            mark: Cell::new(0),
            read_only,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.text.borrow().clone()
    }
}

impl Buffer for DemoBuffer {
    fn mark(&self) -> i64 {
        self.mark.get()
    }
    fn point(&self) -> i64 {
        self.point.get()
    }
    fn total_size(&self) -> i64 {
        self.text.borrow().len() as i64
    }
    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

/// Host variables, seeded with the fallback set a real editor would
/// otherwise supply per buffer/mode (`tab-width`, `indent-width`, ...),
/// backed by the loaded [`Config`].
pub struct DemoVars {
    vars: HashMap<String, VarValue>,
}

impl DemoVars {
    pub fn from_config(config: &Config) -> Self {
        let mut vars = HashMap::new();
        vars.insert("tab-width".to_string(), VarValue::Number(config.tab_width));
        vars.insert(
            "default-tab-width".to_string(),
            VarValue::Number(config.default_tab_width),
        );
        vars.insert(
            "indent-tabs-mode".to_string(),
            VarValue::Number(config.indent_tabs_mode as i64),
        );
        vars.insert("indent-width".to_string(), VarValue::Number(config.indent_width));
        DemoVars { vars }
    }
}

impl VariableBroker for DemoVars {
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

/// Two demo commands: `insert(text)` appends at point (refused on a
/// read-only buffer), `print(text, repeat)` writes to stdout and never
/// touches the buffer.
pub struct DemoCommands<'a> {
    buffer: &'a DemoBuffer,
    insert_def: CmdDef,
    print_def: CmdDef,
}

impl<'a> DemoCommands<'a> {
    pub fn new(buffer: &'a DemoBuffer) -> Self {
        DemoCommands {
            buffer,
            insert_def: CmdDef {
                name: "insert",
                mutates: true,
                args: vec![ArgSpec::Window, ArgSpec::Str],
                int_value: 0,
                string_value: "",
            },
            print_def: CmdDef {
                name: "print",
                mutates: false,
                args: vec![ArgSpec::Window, ArgSpec::Str, ArgSpec::Int(IntDefault::One)],
                int_value: 0,
                string_value: "",
            },
        }
    }
}

impl<'a> CommandRegistry for DemoCommands<'a> {
    fn find(&self, name: &str) -> Option<&CmdDef> {
        match name {
            "insert" => Some(&self.insert_def),
            "print" => Some(&self.print_def),
            _ => None,
        }
    }

    fn invoke(&mut self, name: &str, args: Vec<ArgValue>) -> Result<Value, String> {
        match name {
            "insert" => {
                let Some(ArgValue::Str(text)) = args.first() else {
                    return Err("insert requires a string argument".to_string());
                };
                let mut buf = self.buffer.text.borrow_mut();
                let at = self.buffer.point.get().clamp(0, buf.len() as i64) as usize;
                buf.splice(at..at, text.bytes());
                self.buffer.point.set((at + text.len()) as i64);
                Ok(Value::Void)
            }
            "print" => {
                let Some(ArgValue::Str(text)) = args.first() else {
                    return Err("print requires a string argument".to_string());
                };
                let count = match args.get(1) {
                    Some(ArgValue::Int(n)) => *n,
                    _ => 1,
                };
                for _ in 0..count.max(0) {
                    println!("{text}");
                }
                Ok(Value::Void)
            }
            _ => Err(format!("unknown command '{name}'")),
        }
    }
}
