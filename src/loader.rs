use ::std::str::FromStr;

use log::{debug, warn};

use super::config::ParseMode;
use super::error::{LineError, ParseError};
use super::instructions::{Instruction, Label, Op, Value};
use super::program::{MacroTable, Program};

const COMMENT: char = ';';
const LABEL_SEPARATOR: char = ':';
const REGISTER_SEPARATOR: char = '_';

/// Readability words removed before tokenizing. English and Portuguese spellings are both accepted.
const KEYWORDS: &[&str] = &[
    "goto", "then", "else", "do", "if",
    "vá_para", "então", "senão", "faça", "se",
];

/// Drops everything from the first `;` on and trims what is left.
pub fn strip_comment(line: &str) -> &str {
    match line.split_once(COMMENT) {
        Some((code, _)) => code.trim(),
        None => line.trim(),
    }
}

/// Reads one instruction line.
///
/// Blank lines, comments and lines without a `:` are not instructions and give `Ok(None)`.
/// `LABEL: OP_REGISTER then NEXT [else OTHERWISE]` gives an instruction; with a single
/// successor both branches point to it. An operation token without `_` names a macro.
pub fn parse_line(line: &str) -> Result<Option<Instruction>, LineError> {
    let line = strip_comment(line);
    if line.is_empty() || !line.contains(LABEL_SEPARATOR) {
        return Ok(None);
    }

    let line = line.replace(LABEL_SEPARATOR, " ");
    let parts: Vec<&str> = line
        .split_whitespace()
        .filter(|part| !KEYWORDS.contains(part))
        .collect();
    match parts.len() {
        n if n < 3 => return Err(LineError::TooFewTokens(n)),
        n if n > 4 => return Err(LineError::TooManyTokens(n)),
        _ => (),
    }

    let label = parse_operand(parts[0]).map_err(LineError::InvalidLabel)?;
    let (op, register) = parse_operation(parts[1])?;
    let next_true = parse_operand(parts[2]).map_err(LineError::InvalidSuccessor)?;
    let next_false = match parts.get(3) {
        Some(part) => parse_operand(part).map_err(LineError::InvalidSuccessor)?,
        None => next_true,
    };

    Ok(Some(Instruction {
        label,
        op,
        register,
        next_true,
        next_false,
    }))
}

fn parse_operation(part: &str) -> Result<(Op, usize), LineError> {
    match part.split_once(REGISTER_SEPARATOR) {
        Some(("", _)) => Err(LineError::EmptyOperation(part.to_owned())),
        Some((name, register)) => {
            let register = parse_operand(register).map_err(LineError::InvalidRegister)?;
            Ok((Op::from_name(name), register))
        }
        None => Ok((Op::Macro(part.to_owned()), 0)),
    }
}

fn parse_operand<T: FromStr>(part: &str) -> Result<T, String> {
    part.parse::<T>().map_err(|_| part.to_owned())
}

/// Parses a program in strict mode.
pub fn parse_program<I, S>(lines: I) -> Result<Program, ParseError>
    where
        I: IntoIterator<Item=S>,
        S: AsRef<str> {
    Loader::new().load_program(lines)
}

/// Parses a macro source in strict mode.
pub fn parse_macros<I, S>(lines: I) -> Result<MacroTable, ParseError>
    where
        I: IntoIterator<Item=S>,
        S: AsRef<str> {
    Loader::new().load_macros(lines)
}

pub struct Loader {
    mode: ParseMode,
    warnings: Vec<ParseError>,
    macros: MacroTable,
    current_macro: Option<String>,
    body: Vec<Instruction>,
}

impl Loader {
    pub fn new() -> Self {
        Self::with_mode(ParseMode::Strict)
    }

    pub fn with_mode(mode: ParseMode) -> Self {
        Self {
            mode,
            warnings: Vec::new(),
            macros: MacroTable::new(),
            current_macro: None,
            body: Vec::new(),
        }
    }

    /// Lines dropped by the last load in lenient mode, oldest first.
    pub fn warnings(&self) -> &[ParseError] {
        &self.warnings
    }

    pub fn load_program<I, S>(&mut self, lines: I) -> Result<Program, ParseError>
        where
            I: IntoIterator<Item=S>,
            S: AsRef<str> {
        self.warnings.clear();
        let mut lines = lines.into_iter();

        let count = lines.next().ok_or(ParseError::MissingRegisterCount)?;
        let count = strip_comment(count.as_ref());
        let registers: usize = parse_operand(count).map_err(ParseError::InvalidRegisterCount)?;

        let values = lines.next().ok_or(ParseError::MissingInitialValues)?;
        let initial_values = strip_comment(values.as_ref())
            .split_whitespace()
            .map(|value| parse_operand::<Value>(value).map_err(ParseError::InvalidInitialValue))
            .collect::<Result<Vec<_>, _>>()?;
        if initial_values.len() != registers {
            return Err(ParseError::RegisterCountMismatch {
                declared: registers,
                supplied: initial_values.len(),
            });
        }

        let mut instructions = Vec::new();
        for (idx, line) in lines.enumerate() {
            // The two header lines come first and line numbers are 1-based.
            if let Some(inst) = self.process_instruction(idx + 3, line.as_ref())? {
                instructions.push(inst);
            }
        }

        debug!(
            "loaded program: {} registers, {} instructions",
            registers,
            instructions.len()
        );
        Ok(Program {
            registers,
            initial_values,
            instructions,
        })
    }

    /// Reads `NAME:` headers, each followed by the instructions of that macro.
    pub fn load_macros<I, S>(&mut self, lines: I) -> Result<MacroTable, ParseError>
        where
            I: IntoIterator<Item=S>,
            S: AsRef<str> {
        self.warnings.clear();
        self.macros = MacroTable::new();
        self.current_macro = None;
        self.body.clear();

        for (idx, line) in lines.into_iter().enumerate() {
            let number = idx + 1;
            let line = strip_comment(line.as_ref());
            if line.is_empty() {
                continue;
            }

            let header = match parse_line(line) {
                Ok(Some(_)) => None,
                _ => line.strip_suffix(LABEL_SEPARATOR),
            };
            if let Some(name) = header {
                self.process_header(number, name.trim())?;
            } else if self.current_macro.is_some() {
                if let Some(inst) = self.process_instruction(number, line)? {
                    self.body.push(inst);
                }
            } else if line.contains(LABEL_SEPARATOR) {
                self.reject(ParseError::InstructionOutsideMacro { line: number })?;
            } else {
                warn!("line {}: ignoring line without a label: '{}'", number, line);
            }
        }
        self.save_macro();

        debug!("loaded macros: {:?}", self.macros.names());
        Ok(::std::mem::take(&mut self.macros))
    }

    fn process_header(&mut self, line: usize, name: &str) -> Result<(), ParseError> {
        self.save_macro();
        // A `_` would make every call site read as OP_REGISTER.
        let invalid = name.is_empty()
            || name.contains(char::is_whitespace)
            || name.contains(LABEL_SEPARATOR)
            || name.contains(REGISTER_SEPARATOR);
        if invalid {
            // Lines up to the next valid header have no macro to belong to.
            return self.reject(ParseError::InvalidMacroName {
                line,
                name: name.to_owned(),
            });
        }

        if self.macros.contains(name) {
            self.reject(ParseError::DuplicateMacro {
                line,
                name: name.to_owned(),
            })?;
        }
        self.current_macro = Some(name.to_owned());
        Ok(())
    }

    fn save_macro(&mut self) {
        if let Some(name) = self.current_macro.take() {
            let body = ::std::mem::take(&mut self.body);
            debug!("macro '{}': {} instructions", name, body.len());
            self.macros.insert(&name, body);
        }
    }

    fn process_instruction(&mut self, line: usize, text: &str) -> Result<Option<Instruction>, ParseError> {
        match parse_line(text) {
            Ok(Some(inst)) => Ok(Some(inst)),
            Ok(None) => {
                let code = strip_comment(text);
                if !code.is_empty() {
                    warn!("line {}: ignoring line without a label: '{}'", line, code);
                }
                Ok(None)
            }
            Err(source) => self.reject(ParseError::Line { line, source }).map(|_| None),
        }
    }

    /// Fails in strict mode; in lenient mode records the problem and carries on.
    fn reject(&mut self, error: ParseError) -> Result<(), ParseError> {
        match self.mode {
            ParseMode::Strict => Err(error),
            ParseMode::Lenient => {
                warn!("{}", error);
                self.warnings.push(error);
                Ok(())
            }
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Labels referenced as successors that no instruction in `body` defines.
///
/// Reaching one of these is how a (sub)program halts, so they are not errors,
/// but listing them helps spot a mistyped label.
pub fn exits(body: &[Instruction]) -> Vec<Label> {
    let mut exits: Vec<Label> = body
        .iter()
        .flat_map(|inst| [inst.next_true, inst.next_false])
        .filter(|next| !body.iter().any(|inst| inst.label == *next))
        .collect();
    exits.sort_unstable();
    exits.dedup();
    exits
}
