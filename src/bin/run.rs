use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use norma::labels::LabelIndex;
use norma::loader::{exits, Loader};
use norma::program::{print_program, MAIN};
use norma::trace::{LogTrace, WriteTrace};
use norma::{Halt, Instruction, MacroTable, Machine, Outcome, ParseMode, RunConfig, UnknownOperationPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs a Norma register machine program")]
struct Args {
    /// Program file: register count, initial values, then one instruction per line
    program: PathBuf,
    /// Macro definitions (`NAME:` followed by its instructions)
    #[arg(short, long)]
    macros: Option<PathBuf>,
    /// Stop after this many executed instructions
    #[arg(long)]
    max_steps: Option<u64>,
    /// Maximum macro nesting depth
    #[arg(long)]
    max_depth: Option<usize>,
    /// Skip malformed lines instead of rejecting the file
    #[arg(long)]
    lenient: bool,
    /// Fail on operations that are neither primitives nor loaded macros
    #[arg(long)]
    strict_ops: bool,
    /// Print every executed instruction to stderr
    #[arg(short, long)]
    trace: bool,
    /// Print the parsed program and macros before running
    #[arg(long)]
    dump: bool,
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read '{}'", path.display()))?;
    let lines: Vec<String> = text.lines().map(|line| line.trim_end().to_owned()).collect();
    info!("read {} lines from '{}'", lines.len(), path.display());
    Ok(lines)
}

fn report_warnings(loader: &Loader, path: &Path) {
    for warning in loader.warnings() {
        eprintln!("{}: skipped: {}", path.display(), warning);
    }
}

/// Later definitions of a label are never reached.
fn report_duplicates(name: &str, body: &[Instruction]) {
    let duplicates = LabelIndex::new(body).duplicates();
    if !duplicates.is_empty() {
        println!("Unreachable duplicate labels in '{}': {:?}", name, duplicates);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init()?;

    let mode = if args.lenient { ParseMode::Lenient } else { ParseMode::Strict };

    let mut loader = Loader::with_mode(mode);
    let program = loader
        .load_program(read_lines(&args.program)?)
        .with_context(|| format!("cannot parse '{}'", args.program.display()))?;
    report_warnings(&loader, &args.program);

    let macros = match &args.macros {
        Some(path) => {
            let mut loader = Loader::with_mode(mode);
            let macros = loader
                .load_macros(read_lines(path)?)
                .with_context(|| format!("cannot parse '{}'", path.display()))?;
            report_warnings(&loader, path);
            macros
        }
        None => MacroTable::new(),
    };

    if args.dump {
        print_program(&mut io::stdout(), &program, &macros)?;
        println!("Exit labels: {:?}", exits(&program.instructions));
        report_duplicates(MAIN, &program.instructions);
        for name in macros.names() {
            if let Some(def) = macros.get(name) {
                report_duplicates(name, &def.body);
            }
        }
        println!("Macros loaded: {:?}", macros.names());
    }

    let mut config = RunConfig::default();
    config.max_steps = args.max_steps;
    config.max_depth = args.max_depth;
    if args.strict_ops {
        config = config.with_unknown_operation(UnknownOperationPolicy::Fail);
    }

    let outcome = if args.trace {
        Machine::new(&macros)
            .with_config(config)
            .with_trace(WriteTrace::new(io::stderr()))
            .run(&program)?
    } else {
        Machine::new(&macros)
            .with_config(config)
            .with_trace(LogTrace)
            .run(&program)?
    };
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match &outcome.halt {
        Halt::Unresolved(_) | Halt::Empty => {}
        halt => eprintln!("warning: {}", halt),
    }
    println!("Halted after {} steps ({})", outcome.steps, outcome.halt);
    for (idx, value) in outcome.registers.as_slice().iter().enumerate() {
        println!("  r{}: {}", idx, value);
    }
}
