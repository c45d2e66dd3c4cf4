use thiserror::Error;

use super::instructions::{Label, Value};

/// Why a single instruction line could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected at least 3 fields (label, operation, successor), found {0}")]
    TooFewTokens(usize),
    #[error("expected at most 4 fields, found {0}")]
    TooManyTokens(usize),
    #[error("label '{0}' is not a non-negative integer")]
    InvalidLabel(String),
    #[error("register '{0}' is not a non-negative integer")]
    InvalidRegister(String),
    #[error("successor label '{0}' is not a non-negative integer")]
    InvalidSuccessor(String),
    #[error("missing operation name in '{0}'")]
    EmptyOperation(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: {source}")]
    Line { line: usize, source: LineError },
    #[error("missing register count on line 1")]
    MissingRegisterCount,
    #[error("missing initial register values on line 2")]
    MissingInitialValues,
    #[error("line 1: register count '{0}' is not a non-negative integer")]
    InvalidRegisterCount(String),
    #[error("line 2: initial value '{0}' is not an integer")]
    InvalidInitialValue(String),
    #[error("{declared} registers declared but {supplied} initial values supplied")]
    RegisterCountMismatch { declared: usize, supplied: usize },
    #[error("line {line}: instruction appears before any macro header")]
    InstructionOutsideMacro { line: usize },
    #[error("line {line}: invalid macro name '{name}'")]
    InvalidMacroName { line: usize, name: String },
    #[error("line {line}: macro '{name}' is defined more than once")]
    DuplicateMacro { line: usize, name: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("'{routine}' label {label}: register {register} out of range (machine has {len} registers)")]
    RegisterOutOfRange {
        routine: String,
        label: Label,
        register: usize,
        len: usize,
    },
    #[error("'{routine}' label {label}: register {register} overflows from {value}")]
    RegisterOverflow {
        routine: String,
        label: Label,
        register: usize,
        value: Value,
    },
    #[error("'{routine}' label {label}: unknown operation '{name}'")]
    UnknownOperation {
        routine: String,
        label: Label,
        name: String,
    },
    #[error("macro '{name}' exceeds the call depth limit of {limit}")]
    CallDepthExceeded { name: String, limit: usize },
}
