use ::std::io::Write;

use log::{debug, trace};

use super::instructions::{Instruction, Value};
use super::interpreter::Halt;
use super::program::RegisterBank;

/// Observer of a running machine. It sees every executed instruction but cannot change the run.
///
/// `depth` is 0 for the top-level program and grows by one per nested macro call.
#[allow(unused_variables)]
pub trait Trace {
    /// Called after `inst` executed, with the registers it left behind.
    fn step(&mut self, depth: usize, routine: &str, inst: &Instruction, registers: &RegisterBank) {}

    fn enter(&mut self, depth: usize, name: &str) {}

    fn leave(&mut self, depth: usize, name: &str, registers: &RegisterBank) {}

    fn halt(&mut self, depth: usize, routine: &str, halt: &Halt) {}
}

impl<'a, T: Trace + ?Sized> Trace for &'a mut T {
    fn step(&mut self, depth: usize, routine: &str, inst: &Instruction, registers: &RegisterBank) {
        (**self).step(depth, routine, inst, registers)
    }

    fn enter(&mut self, depth: usize, name: &str) {
        (**self).enter(depth, name)
    }

    fn leave(&mut self, depth: usize, name: &str, registers: &RegisterBank) {
        (**self).leave(depth, name, registers)
    }

    fn halt(&mut self, depth: usize, routine: &str, halt: &Halt) {
        (**self).halt(depth, routine, halt)
    }
}

pub struct NoTrace;

impl Trace for NoTrace {}

/// Sends the trace to the `log` facade: steps at trace level, calls and halts at debug level.
pub struct LogTrace;

impl Trace for LogTrace {
    fn step(&mut self, depth: usize, routine: &str, inst: &Instruction, registers: &RegisterBank) {
        trace!("{:depth$}[{}] {} -> {}", "", routine, inst, registers, depth = depth * 2);
    }

    fn enter(&mut self, depth: usize, name: &str) {
        debug!("{:depth$}Calling '{}'", "", name, depth = depth * 2);
    }

    fn leave(&mut self, depth: usize, name: &str, registers: &RegisterBank) {
        debug!("{:depth$}Returning from '{}' with {}", "", name, registers, depth = depth * 2);
    }

    fn halt(&mut self, depth: usize, routine: &str, halt: &Halt) {
        debug!("{:depth$}'{}' halted: {}", "", routine, halt, depth = depth * 2);
    }
}

/// Human-readable trace written to any output. Write failures are ignored.
pub struct WriteTrace<W: Write> {
    out: W,
}

impl<W: Write> WriteTrace<W> {
    pub fn new(out: W) -> Self {
        WriteTrace { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Trace for WriteTrace<W> {
    fn step(&mut self, depth: usize, routine: &str, inst: &Instruction, registers: &RegisterBank) {
        let _ = writeln!(self.out, "{:depth$}[{}] {:<28} {}", "", routine, inst.to_string(), registers, depth = depth * 2);
    }

    fn enter(&mut self, depth: usize, name: &str) {
        let _ = writeln!(self.out, "{:depth$}-> {}", "", name, depth = depth * 2);
    }

    fn leave(&mut self, depth: usize, name: &str, _registers: &RegisterBank) {
        let _ = writeln!(self.out, "{:depth$}<- {}", "", name, depth = depth * 2);
    }

    fn halt(&mut self, depth: usize, routine: &str, halt: &Halt) {
        let _ = writeln!(self.out, "{:depth$}[{}] halted: {}", "", routine, halt, depth = depth * 2);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Step {
        depth: usize,
        routine: String,
        instruction: Instruction,
        registers: Vec<Value>,
    },
    Enter {
        depth: usize,
        name: String,
    },
    Leave {
        depth: usize,
        name: String,
    },
    Halt {
        depth: usize,
        routine: String,
        halt: Halt,
    },
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Step { .. }))
            .count()
    }

    /// Labels executed at the given call depth, in order.
    pub fn labels_at(&self, depth: usize) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Step { depth: d, instruction, .. } if *d == depth => Some(instruction.label),
                _ => None,
            })
            .collect()
    }
}

impl Trace for Recorder {
    fn step(&mut self, depth: usize, routine: &str, inst: &Instruction, registers: &RegisterBank) {
        self.events.push(Event::Step {
            depth,
            routine: routine.to_owned(),
            instruction: inst.clone(),
            registers: registers.as_slice().to_vec(),
        });
    }

    fn enter(&mut self, depth: usize, name: &str) {
        self.events.push(Event::Enter {
            depth,
            name: name.to_owned(),
        });
    }

    fn leave(&mut self, depth: usize, name: &str, _registers: &RegisterBank) {
        self.events.push(Event::Leave {
            depth,
            name: name.to_owned(),
        });
    }

    fn halt(&mut self, depth: usize, routine: &str, halt: &Halt) {
        self.events.push(Event::Halt {
            depth,
            routine: routine.to_owned(),
            halt: halt.clone(),
        });
    }
}
