use std::str::FromStr;

use crate::error::ExecError;
use crate::operand::Operand;
use crate::state::Flags;

/// Condition checked by a jump, against the flags left by the last `cmp`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cond {
    /// `jmp`
    Always,
    /// `je`, `jz`
    Zero,
    /// `jne`, `jnz`
    NotZero,
    /// `jg`
    Greater,
    /// `jge`
    GreaterEq,
    /// `jl`
    Less,
    /// `jle`
    LessEq,
}

impl Cond {
    pub fn holds(self, Flags { zf, sf }: Flags) -> bool {
        match self {
            Cond::Always => true,
            Cond::Zero => zf,
            Cond::NotZero => !zf,
            Cond::Greater => !zf && !sf,
            Cond::GreaterEq => zf || !sf,
            Cond::Less => !zf && sf,
            Cond::LessEq => zf || sf,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Mov,
    Add,
    Sub,
    Mul,
    Inc,
    Dec,
    Cmp,
    Jump(Cond),
    Push,
    Pop,
    Call,
    Ret,
    Leave,
    /// `p`, dump registers
    Print,
}

impl Opcode {
    /// Number of operands taken.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Mov | Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Cmp => 2,
            Opcode::Inc | Opcode::Dec | Opcode::Push | Opcode::Pop => 1,
            Opcode::Jump(_) | Opcode::Call => 1,
            Opcode::Ret | Opcode::Leave | Opcode::Print => 0,
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mov" => Opcode::Mov,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mul" => Opcode::Mul,
            "inc" => Opcode::Inc,
            "dec" => Opcode::Dec,
            "cmp" => Opcode::Cmp,
            "jmp" => Opcode::Jump(Cond::Always),
            "je" | "jz" => Opcode::Jump(Cond::Zero),
            "jne" | "jnz" => Opcode::Jump(Cond::NotZero),
            "jg" => Opcode::Jump(Cond::Greater),
            "jge" => Opcode::Jump(Cond::GreaterEq),
            "jl" => Opcode::Jump(Cond::Less),
            "jle" => Opcode::Jump(Cond::LessEq),
            "push" => Opcode::Push,
            "pop" => Opcode::Pop,
            "call" => Opcode::Call,
            "ret" => Opcode::Ret,
            "leave" => Opcode::Leave,
            "p" => Opcode::Print,
            _ => return Err(()),
        })
    }
}

/// A decoded instruction line with its operands lexed. Source operands come before
/// destinations, as written.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instr {
    Mov { src: Operand, dst: Operand },
    Add { src: Operand, dst: Operand },
    Sub { src: Operand, dst: Operand },
    Mul { src: Operand, dst: Operand },
    Inc { dst: Operand },
    Dec { dst: Operand },
    /// Flags from `b - a`
    Cmp { a: Operand, b: Operand },
    Jump { cond: Cond, label: String },
    Push { src: Operand },
    Pop { dst: Operand },
    Call { label: String },
    Ret,
    Leave,
    Print,
}

impl Instr {
    /// Split `line` on whitespace, look up the mnemonic, check the operand count and lex each
    /// operand from left to right. Labels are not resolved here.
    pub fn decode(line: &str) -> Result<Self, ExecError> {
        let mut words = line.split_whitespace();
        let mnemonic = words.next().unwrap_or_default();
        let opcode: Opcode = mnemonic
            .parse()
            .map_err(|_| ExecError::InvalidInstruction {
                opcode: mnemonic.to_owned(),
            })?;
        let args: Vec<&str> = words.collect();
        let expected = opcode.arity();
        if args.len() != expected {
            return Err(ExecError::Arity {
                opcode: mnemonic.to_owned(),
                expected,
                found: args.len(),
            });
        }

        let label = args.first().map(|&name| name.to_owned()).unwrap_or_default();
        let mut args = args.into_iter();
        let mut operand = || Operand::parse(args.next().unwrap_or_default());
        Ok(match opcode {
            Opcode::Mov => Instr::Mov {
                src: operand()?,
                dst: operand()?,
            },
            Opcode::Add => Instr::Add {
                src: operand()?,
                dst: operand()?,
            },
            Opcode::Sub => Instr::Sub {
                src: operand()?,
                dst: operand()?,
            },
            Opcode::Mul => Instr::Mul {
                src: operand()?,
                dst: operand()?,
            },
            Opcode::Inc => Instr::Inc { dst: operand()? },
            Opcode::Dec => Instr::Dec { dst: operand()? },
            Opcode::Cmp => Instr::Cmp {
                a: operand()?,
                b: operand()?,
            },
            Opcode::Push => Instr::Push { src: operand()? },
            Opcode::Pop => Instr::Pop { dst: operand()? },
            Opcode::Jump(cond) => Instr::Jump { cond, label },
            Opcode::Call => Instr::Call { label },
            Opcode::Ret => Instr::Ret,
            Opcode::Leave => Instr::Leave,
            Opcode::Print => Instr::Print,
        })
    }

    /// Label referenced by a jump or call.
    pub fn label(&self) -> Option<&str> {
        match self {
            Instr::Jump { label, .. } | Instr::Call { label } => Some(label),
            _ => None,
        }
    }

    /// Operand written to, if any.
    pub fn dst(&self) -> Option<&Operand> {
        match self {
            Instr::Mov { dst, .. }
            | Instr::Add { dst, .. }
            | Instr::Sub { dst, .. }
            | Instr::Mul { dst, .. }
            | Instr::Inc { dst }
            | Instr::Dec { dst }
            | Instr::Pop { dst } => Some(dst),
            _ => None,
        }
    }
}
