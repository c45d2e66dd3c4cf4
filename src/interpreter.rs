use ::std::fmt;

use log::{debug, warn};

use super::config::{RunConfig, UnknownOperationPolicy};
use super::error::RuntimeError;
use super::instructions::{Instruction, Label, Op};
use super::labels::LabelIndex;
use super::program::{Macro, MacroTable, Program, RegisterBank, MAIN};
use super::trace::{NoTrace, Trace};

/// Why a program or macro stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The successor label is not defined in the running instruction list. This is the normal way to stop.
    Unresolved(Label),
    /// Neither a primitive nor a loaded macro.
    UnknownOperation(String),
    /// The instruction list has no instructions at all.
    Empty,
    /// The configured step budget ran out before the program halted.
    StepBudgetExhausted,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Halt::Unresolved(label) => write!(f, "no instruction at label {}", label),
            Halt::UnknownOperation(name) => write!(f, "unknown operation '{}'", name),
            Halt::Empty => write!(f, "no instructions"),
            Halt::StepBudgetExhausted => write!(f, "step budget exhausted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub registers: RegisterBank,
    /// Executed instructions, macro calls and macro bodies included.
    pub steps: u64,
    pub halt: Halt,
}

/// Runs `program` to completion with default settings and returns the final registers.
///
/// A program that never halts makes this never return; use [`Machine`] with a step
/// budget when that matters.
pub fn run(program: &Program, macros: &MacroTable) -> Result<RegisterBank, RuntimeError> {
    Machine::new(macros).run(program).map(|outcome| outcome.registers)
}

struct CallFrame<'a> {
    name: &'a str,
    depth: usize,
    labels: LabelIndex<'a>,
    current: Option<&'a Instruction>,
    /// Set when `current` became `None` by failing to resolve a label.
    halted: Option<Halt>,
    /// Successor of the macro call this frame is waiting on.
    resume: Option<Label>,
}

impl<'a> CallFrame<'a> {
    fn new(name: &'a str, depth: usize, body: &'a [Instruction]) -> Self {
        let labels = LabelIndex::new(body);
        CallFrame {
            name,
            depth,
            current: labels.entry(),
            labels,
            halted: None,
            resume: None,
        }
    }

    fn goto(&mut self, label: Label) -> ExecutionStatus<'a> {
        self.current = self.labels.find(label);
        match self.current {
            Some(_) => ExecutionStatus::Normal,
            None => ExecutionStatus::Return(Halt::Unresolved(label)),
        }
    }

    fn resume_after_call(&mut self) {
        if let Some(label) = self.resume.take() {
            if let ExecutionStatus::Return(halt) = self.goto(label) {
                self.halted = Some(halt);
            }
        }
    }
}

enum ExecutionStatus<'a> {
    Normal,
    Call(&'a Macro),
    Return(Halt),
}

/// The register machine.
///
/// Macro calls do not recurse on the host stack: every active program or macro is a
/// frame on an explicit call stack, so nesting depth is bounded only by memory
/// (or by [`RunConfig::max_depth`]).
pub struct Machine<'a, T: Trace = NoTrace> {
    macros: &'a MacroTable,
    config: RunConfig,
    trace: T,
    steps: u64,
}

impl<'a> Machine<'a, NoTrace> {
    pub fn new(macros: &'a MacroTable) -> Self {
        Machine {
            macros,
            config: RunConfig::default(),
            trace: NoTrace,
            steps: 0,
        }
    }
}

impl<'a, T: Trace> Machine<'a, T> {
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace<U: Trace>(self, trace: U) -> Machine<'a, U> {
        Machine {
            macros: self.macros,
            config: self.config,
            trace,
            steps: self.steps,
        }
    }

    pub fn trace(&self) -> &T {
        &self.trace
    }

    pub fn into_trace(self) -> T {
        self.trace
    }

    /// Steps executed by the last run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn run(&mut self, program: &Program) -> Result<Outcome, RuntimeError> {
        let mut registers = program.register_bank();
        let halt = self.execute(MAIN, &program.instructions, &mut registers)?;
        Ok(Outcome {
            registers,
            steps: self.steps,
            halt,
        })
    }

    /// Runs `body` from its first instruction against `registers`, which every macro it
    /// calls shares. Returns why the top-level `body` stopped.
    pub fn execute<'b>(
        &mut self,
        name: &'b str,
        body: &'b [Instruction],
        registers: &mut RegisterBank,
    ) -> Result<Halt, RuntimeError>
        where 'a: 'b
    {
        self.steps = 0;
        let mut halt = Halt::Empty;
        let mut call_stack = vec![CallFrame::new(name, 0, body)];
        while let Some(frame) = call_stack.last_mut() {
            match self.run_until_call(frame, registers)? {
                ExecutionStatus::Normal => (),
                ExecutionStatus::Call(callee) => {
                    let depth = frame.depth + 1;
                    if let Some(limit) = self.config.max_depth {
                        if depth > limit {
                            return Err(RuntimeError::CallDepthExceeded {
                                name: callee.name.clone(),
                                limit,
                            });
                        }
                    }
                    self.trace.enter(depth, &callee.name);
                    call_stack.push(CallFrame::new(&callee.name, depth, &callee.body));
                }
                ExecutionStatus::Return(reason) => {
                    self.trace.halt(frame.depth, frame.name, &reason);
                    if reason == Halt::StepBudgetExhausted {
                        warn!("'{}' stopped after {} steps", name, self.steps);
                        halt = reason;
                        break;
                    }
                    let (callee, depth) = (frame.name, frame.depth);
                    call_stack.pop();
                    match call_stack.last_mut() {
                        Some(caller) => {
                            self.trace.leave(depth, callee, registers);
                            caller.resume_after_call();
                        }
                        None => halt = reason,
                    }
                }
            }
        }

        debug!("'{}' halted after {} steps: {}", name, self.steps, halt);
        Ok(halt)
    }

    fn run_until_call<'b>(
        &mut self,
        frame: &mut CallFrame<'b>,
        registers: &mut RegisterBank,
    ) -> Result<ExecutionStatus<'b>, RuntimeError>
        where 'a: 'b
    {
        loop {
            if let Some(limit) = self.config.max_steps {
                if self.steps >= limit && frame.current.is_some() {
                    break Ok(ExecutionStatus::Return(Halt::StepBudgetExhausted));
                }
            }
            match self.step(frame, registers)? {
                ExecutionStatus::Normal => (),
                status => break Ok(status),
            }
        }
    }

    fn step<'b>(
        &mut self,
        frame: &mut CallFrame<'b>,
        registers: &mut RegisterBank,
    ) -> Result<ExecutionStatus<'b>, RuntimeError>
        where 'a: 'b
    {
        let macros: &'a MacroTable = self.macros;
        let inst = match frame.current {
            Some(inst) => inst,
            None => return Ok(ExecutionStatus::Return(frame.halted.take().unwrap_or(Halt::Empty))),
        };
        self.steps += 1;

        let next = match &inst.op {
            Op::Zero => match registers.is_zero(inst.register) {
                Some(true) => inst.next_true,
                Some(false) => inst.next_false,
                None => return Err(out_of_range(frame, inst, registers)),
            },
            Op::Add | Op::Sub => {
                let result = match inst.op {
                    Op::Add => registers.increment(inst.register),
                    _ => registers.decrement(inst.register),
                };
                match result {
                    Some(Ok(_)) => inst.next_true,
                    Some(Err(value)) => {
                        return Err(RuntimeError::RegisterOverflow {
                            routine: frame.name.to_owned(),
                            label: inst.label,
                            register: inst.register,
                            value,
                        })
                    }
                    None => return Err(out_of_range(frame, inst, registers)),
                }
            }
            Op::Macro(name) => {
                self.trace.step(frame.depth, frame.name, inst, registers);
                return match macros.get(name) {
                    Some(callee) => {
                        frame.resume = Some(inst.next_true);
                        Ok(ExecutionStatus::Call(callee))
                    }
                    None => self.unknown_operation(frame, inst, name),
                };
            }
        };

        self.trace.step(frame.depth, frame.name, inst, registers);
        Ok(frame.goto(next))
    }

    fn unknown_operation<'b>(
        &mut self,
        frame: &mut CallFrame<'b>,
        inst: &Instruction,
        name: &str,
    ) -> Result<ExecutionStatus<'b>, RuntimeError> {
        match self.config.unknown_operation {
            UnknownOperationPolicy::Fail => Err(RuntimeError::UnknownOperation {
                routine: frame.name.to_owned(),
                label: inst.label,
                name: name.to_owned(),
            }),
            UnknownOperationPolicy::Halt => {
                warn!("'{}' label {}: unknown operation '{}', halting", frame.name, inst.label, name);
                frame.current = None;
                Ok(ExecutionStatus::Return(Halt::UnknownOperation(name.to_owned())))
            }
        }
    }
}

fn out_of_range(frame: &CallFrame, inst: &Instruction, registers: &RegisterBank) -> RuntimeError {
    RuntimeError::RegisterOutOfRange {
        routine: frame.name.to_owned(),
        label: inst.label,
        register: inst.register,
        len: registers.len(),
    }
}
