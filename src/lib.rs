//! Interpreter for Norma-style register machines: unbounded integer registers driven by
//! `add`, `sub` and `zero` instructions connected through numeric labels, plus named
//! macros that run as a single pseudo-instruction against the caller's registers.

pub mod config;
pub mod error;
pub mod instructions;
pub mod interpreter;
pub mod labels;
pub mod loader;
pub mod program;
pub mod trace;

pub use config::{ParseMode, RunConfig, UnknownOperationPolicy};
pub use error::{LineError, ParseError, RuntimeError};
pub use instructions::{Instruction, Label, Op, Value};
pub use interpreter::{run, Halt, Machine, Outcome};
pub use loader::{parse_line, parse_macros, parse_program, Loader};
pub use program::{Macro, MacroTable, Program, RegisterBank};
