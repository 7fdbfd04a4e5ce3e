use std::io::{self, Write};

use colored::Colorize;

use crate::state::{Register, State};

/// Shown by `p` in place of the next instruction once the program has run out.
pub const END_OF_PROGRAM: &str = "no more instructions";

/// Write the `p` dump: every register, then the instruction `ip` points at.
pub fn print_registers(f: &mut impl Write, state: &State, next: Option<&str>) -> io::Result<()> {
    for reg in Register::ALL {
        writeln!(f, "{}: {}", reg.name(), state.reg(reg))?;
    }
    writeln!(f, "next instruction: {}", next.unwrap_or(END_OF_PROGRAM))?;
    f.flush()
}

/// Echo an instruction to stderr before it runs.
pub fn print_trace(ip: i64, text: &str) {
    eprintln!("{:>6} {}", ip.to_string().dimmed(), text.cyan());
}
