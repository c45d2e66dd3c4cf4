use ::std::fmt;

/// Address of an instruction. Labels are looked up by value, never by position.
pub type Label = u32;

/// Contents of a single register. Registers are signed because `sub` does not stop at zero.
pub type Value = i64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Zero,
    /// Invocation of a named macro; anything that is not one of the three primitives.
    Macro(String),
}

impl Op {
    pub fn from_name(name: &str) -> Op {
        match name {
            "add" => Op::Add,
            "sub" => Op::Sub,
            "zero" => Op::Zero,
            other => Op::Macro(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Zero => "zero",
            Op::Macro(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub label: Label,
    pub op: Op,
    /// Register operand. Macro calls written without `_` carry 0 here and never read it.
    pub register: usize,
    pub next_true: Label,
    pub next_false: Label,
}

impl Instruction {
    pub fn add(label: Label, register: usize, next: Label) -> Self {
        Self::single(label, Op::Add, register, next)
    }

    pub fn sub(label: Label, register: usize, next: Label) -> Self {
        Self::single(label, Op::Sub, register, next)
    }

    pub fn zero(label: Label, register: usize, if_zero: Label, otherwise: Label) -> Self {
        Instruction {
            label,
            op: Op::Zero,
            register,
            next_true: if_zero,
            next_false: otherwise,
        }
    }

    pub fn call(label: Label, name: &str, next: Label) -> Self {
        Self::single(label, Op::Macro(name.to_owned()), 0, next)
    }

    fn single(label: Label, op: Op, register: usize, next: Label) -> Self {
        Instruction {
            label,
            op,
            register,
            next_true: next,
            next_false: next,
        }
    }

    pub fn is_branch(&self) -> bool {
        self.next_true != self.next_false
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}: ", self.label)?;
        match &self.op {
            Op::Macro(name) if self.register == 0 => write!(f, "{}", name)?,
            op => write!(f, "{}_{}", op.name(), self.register)?,
        };
        write!(f, " then {}", self.next_true)?;
        if self.is_branch() {
            write!(f, " else {}", self.next_false)?;
        }
        Ok(())
    }
}
