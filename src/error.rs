use std::{error::Error, fmt};

use miette::{miette, LabeledSpan, Report, Severity};

use crate::span::Span;

/// Failure of a single instruction. The instruction has no observable effect when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    MalformedOperand {
        token: String,
    },
    UnknownRegister {
        token: String,
    },
    UndefinedLabel {
        label: String,
    },
    InvalidInstruction {
        opcode: String,
    },
    /// `addr` is `None` when computing the address overflowed.
    OutOfBounds {
        token: String,
        addr: Option<i64>,
    },
    NotWritable {
        token: String,
    },
    Arity {
        opcode: String,
        expected: usize,
        found: usize,
    },
    InvalidIp {
        ip: i64,
    },
    Output {
        reason: String,
    },
}

impl ExecError {
    pub(crate) fn malformed(token: &str) -> Self {
        ExecError::MalformedOperand {
            token: token.to_owned(),
        }
    }

    pub(crate) fn out_of_bounds(token: &str, addr: Option<i64>) -> Self {
        ExecError::OutOfBounds {
            token: token.to_owned(),
            addr,
        }
    }

    /// Diagnostic code, used when rendering a report.
    pub fn code(&self) -> &'static str {
        match self {
            ExecError::MalformedOperand { .. } => "operand::malformed",
            ExecError::UnknownRegister { .. } => "operand::register",
            ExecError::UndefinedLabel { .. } => "exec::label",
            ExecError::InvalidInstruction { .. } => "exec::instruction",
            ExecError::OutOfBounds { .. } => "exec::bounds",
            ExecError::NotWritable { .. } => "operand::not_writable",
            ExecError::Arity { .. } => "exec::arity",
            ExecError::InvalidIp { .. } => "exec::ip",
            ExecError::Output { .. } => "exec::output",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            ExecError::MalformedOperand { .. } => {
                "operands look like `$5`, `%a`, `12`, `(%sp)` or `-2(%fp)`"
            }
            ExecError::UnknownRegister { .. } => {
                "registers are %a, %b, %c, %d, %e, %f, %sp, %fp and %ip"
            }
            ExecError::UndefinedLabel { .. } => "define the label on its own line, like `.loop`",
            ExecError::InvalidInstruction { .. } => {
                "check the list of available instructions in the documentation"
            }
            ExecError::OutOfBounds { .. } => "memory addresses start at 0 and end below the memory size",
            ExecError::NotWritable { .. } => "the destination must be a register or memory operand",
            ExecError::Arity { .. } => "check the operands for this instruction",
            ExecError::InvalidIp { .. } => "the instruction pointer was set below zero",
            ExecError::Output { .. } => "standard output could not be written",
        }
    }
}

impl Error for ExecError {}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedOperand { token } => write!(f, "Malformed operand `{}`", token),
            Self::UnknownRegister { token } => write!(f, "Unknown register in `{}`", token),
            Self::UndefinedLabel { label } => write!(f, "Undefined label `{}`", label),
            Self::InvalidInstruction { opcode } => write!(f, "Invalid instruction `{}`", opcode),
            Self::OutOfBounds {
                token,
                addr: Some(addr),
            } => write!(f, "Address {} of `{}` is out of bounds", addr, token),
            Self::OutOfBounds { token, addr: None } => {
                write!(f, "Address of `{}` overflowed", token)
            }
            Self::NotWritable { token } => write!(f, "Cannot write to immediate `{}`", token),
            Self::Arity {
                opcode,
                expected,
                found,
            } => write!(
                f,
                "Wrong operand count for `{}` (expected {}, found {})",
                opcode, expected, found
            ),
            Self::InvalidIp { ip } => write!(f, "Invalid instruction pointer {}", ip),
            Self::Output { reason } => write!(f, "Failed to write output: {}", reason),
        }
    }
}

/// An [`ExecError`] together with the instruction that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Instruction pointer of the faulting instruction
    pub ip: i64,
    /// Empty if `ip` does not point at an instruction
    pub text: String,
    pub span: Option<Span>,
    pub error: ExecError,
}

impl Fault {
    pub fn new(ip: i64, text: impl Into<String>, span: Option<Span>, error: ExecError) -> Self {
        Fault {
            ip,
            text: text.into(),
            span,
            error,
        }
    }

    /// Render with the offending line highlighted in `src`.
    pub fn report(&self, src: &str) -> Report {
        let labels = self
            .span
            .map(|span| LabeledSpan::at(span, format!("instruction {}", self.ip)));
        miette!(
            severity = Severity::Error,
            code = self.error.code(),
            help = self.error.help(),
            labels = labels.into_iter().collect::<Vec<_>>(),
            "{}",
            self
        )
        .with_source_code(src.to_owned())
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "At ip {}: {}", self.ip, self.error)
        } else {
            write!(f, "At ip {} (`{}`): {}", self.ip, self.text, self.error)
        }
    }
}

/// Suspicious source that still loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The later definition replaces the earlier one.
    DuplicateLabel {
        label: String,
        /// 1-based line of the later definition
        line: usize,
        span: Span,
        first: Span,
    },
}

impl LoadWarning {
    pub fn report(&self, src: &str) -> Report {
        match self {
            LoadWarning::DuplicateLabel { span, first, .. } => miette!(
                severity = Severity::Warning,
                code = "load::duplicate_label",
                help = "jumps go to the last definition",
                labels = vec![
                    LabeledSpan::at(*first, "first defined here"),
                    LabeledSpan::at(*span, "redefined here"),
                ],
                "{}",
                self
            )
            .with_source_code(src.to_owned()),
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::DuplicateLabel { label, line, .. } => {
                write!(f, "Duplicate label `{}` on line {}", label, line)
            }
        }
    }
}
