use ::std::collections::HashMap;
use ::std::fmt;
use ::std::io::{self, Write};

use num::{CheckedAdd, CheckedSub, One, Zero};

use super::instructions::{Instruction, Value};

/// Name under which the top-level program shows up in traces and errors.
pub const MAIN: &str = "main";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub registers: usize,
    pub initial_values: Vec<Value>,
    pub instructions: Vec<Instruction>,
}

impl Program {
    /// Execution starts at the first parsed instruction, whatever its label.
    pub fn entry(&self) -> Option<&Instruction> {
        self.instructions.first()
    }

    pub fn register_bank(&self) -> RegisterBank {
        RegisterBank::new(self.initial_values.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Macro {
    pub name: String,
    pub body: Vec<Instruction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous definition with the same name.
    pub fn insert(&mut self, name: &str, body: Vec<Instruction>) -> Option<Macro> {
        let def = Macro {
            name: name.to_owned(),
            body,
        };
        self.macros.insert(name.to_owned(), def)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Macro names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.macros.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// The machine state: one fixed-length vector shared by the program and every macro it calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterBank {
    values: Vec<Value>,
}

impl RegisterBank {
    pub fn new(values: Vec<Value>) -> Self {
        RegisterBank { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, register: usize) -> Option<Value> {
        self.values.get(register).copied()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// `None` when the register does not exist.
    pub fn is_zero(&self, register: usize) -> Option<bool> {
        self.values.get(register).map(Zero::is_zero)
    }

    pub fn increment(&mut self, register: usize) -> Option<Result<Value, Value>> {
        self.apply(register, |value| CheckedAdd::checked_add(value, &One::one()))
    }

    pub fn decrement(&mut self, register: usize) -> Option<Result<Value, Value>> {
        self.apply(register, |value| CheckedSub::checked_sub(value, &One::one()))
    }

    /// Outer `None`: no such register. Inner `Err`: the operation overflowed, register untouched.
    fn apply<F>(&mut self, register: usize, operator: F) -> Option<Result<Value, Value>>
        where F: Fn(&Value) -> Option<Value>
    {
        let slot = self.values.get_mut(register)?;
        Some(match operator(slot) {
            Some(result) => {
                *slot = result;
                Ok(result)
            }
            None => Err(*slot),
        })
    }
}

impl fmt::Display for RegisterBank {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "[")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

pub fn print_program<W: Write>(out: &mut W, program: &Program, macros: &MacroTable) -> io::Result<()> {
    writeln!(out, "Registers: {}", program.registers)?;
    writeln!(out, "Initial values: {}", RegisterBank::new(program.initial_values.clone()))?;
    writeln!(out, "Instructions ({}):", program.instructions.len())?;
    for inst in program.instructions.iter() {
        writeln!(out, "  {}", inst)?;
    }
    for name in macros.names() {
        if let Some(def) = macros.get(name) {
            writeln!(out, "Macro '{}' ({} instructions):", name, def.body.len())?;
            for inst in def.body.iter() {
                writeln!(out, "  {}", inst)?;
            }
        }
    }
    Ok(())
}
