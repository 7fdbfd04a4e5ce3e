// Loading
mod program;
pub use program::{Line, Program, LABEL_MARKER};
mod span;
pub use span::Span;

// Decoding
mod instr;
pub use instr::{Cond, Instr, Opcode};
mod lexer;
pub use lexer::lex_operand;
mod operand;
pub use operand::{Location, Operand, OperandKind};

// Running
mod runtime;
pub use runtime::Runtime;
mod state;
pub use state::{Addr, Flags, Register, State, DEFAULT_MEMORY_SIZE};
mod output;
pub use output::END_OF_PROGRAM;

mod error;
pub use error::{ExecError, Fault, LoadWarning};

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
