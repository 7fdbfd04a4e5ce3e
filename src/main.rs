use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result, WrapErr};

use vcpu::{Program, Runtime, DEFAULT_MEMORY_SIZE};

/// vcpu is a virtual CPU for a small x86-flavoured assembly language.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a program to run, read from standard input if omitted
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program, printing `p` dumps to standard output
    Run {
        /// Program to run, read from standard input if omitted
        path: Option<PathBuf>,
        #[command(flatten)]
        opts: RunOptions,
    },
    /// Check a program for errors without running it
    Check {
        /// Program to check, read from standard input if omitted
        path: Option<PathBuf>,
    },
}

#[derive(clap::Args, Default)]
struct RunOptions {
    /// Number of memory cells, overrides `VCPU_MEMORY` [default: 1000]
    #[arg(short, long)]
    memory: Option<usize>,
    /// Echo each instruction to standard error before it runs, also set by `VCPU_TRACE=1`
    #[arg(short, long)]
    trace: bool,
    /// Report progress on standard error
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    vcpu::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(vcpu::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Run { path, opts }) => run(path.as_deref(), &opts),
        Some(Command::Check { path }) => check(path.as_deref()),
        None => run(args.path.as_deref(), &RunOptions::default()),
    }
}

enum MsgColor {
    Green,
    Red,
}

fn source_message(color: MsgColor, left: &str, path: Option<&Path>) {
    let right = match path {
        Some(path) => format!("target {}", path.display()),
        None => "standard input".to_owned(),
    };
    message(color, left, &right);
}

/// Status lines go to stderr, stdout only carries program output.
fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

fn run(path: Option<&Path>, opts: &RunOptions) -> Result<()> {
    use MsgColor::*;
    if opts.verbose {
        source_message(Green, "Loading", path);
    }
    let src = read_source(path)?;
    let program = Program::parse(&src);
    if opts.verbose {
        for warning in program.warnings() {
            eprintln!("{:?}", warning.report(&src));
        }
    }

    let mem_size = match (opts.memory, vcpu::env::memory_size()) {
        (Some(size), _) => size,
        (None, Some(raw)) => raw
            .trim()
            .parse()
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid `VCPU_MEMORY` value `{raw}`"))?,
        (None, None) => DEFAULT_MEMORY_SIZE,
    };
    let Some(mut runtime) = Runtime::with_memory_size(program, mem_size) else {
        bail!("Memory must hold at least one cell.");
    };
    runtime.set_trace(opts.trace || vcpu::env::is_trace_enabled());

    if opts.verbose {
        let summary = format!(
            "{} instructions on {} memory cells",
            runtime.program().len(),
            mem_size
        );
        message(Green, "Running", &summary);
    }
    if let Err(fault) = runtime.run() {
        message(Red, "Error", &fault.to_string());
        std::process::exit(1);
    }
    if opts.verbose {
        source_message(Green, "Completed", path);
    }
    Ok(())
}

fn check(path: Option<&Path>) -> Result<()> {
    use MsgColor::*;
    source_message(Green, "Checking", path);
    let src = read_source(path)?;
    let program = Program::parse(&src);
    for warning in program.warnings() {
        eprintln!("{:?}", warning.report(&src));
    }

    let faults = program.check();
    if faults.is_empty() {
        message(Green, "Success", "no errors found!");
        return Ok(());
    }
    for fault in &faults {
        eprintln!("{:?}", fault.report(&src));
    }
    bail!(
        "Found {} error{}.",
        faults.len(),
        if faults.len() == 1 { "" } else { "s" }
    )
}

fn read_source(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        let mut src = String::new();
        io::stdin()
            .read_to_string(&mut src)
            .into_diagnostic()
            .wrap_err("Failed to read program from standard input")?;
        return Ok(src);
    };
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))
}
