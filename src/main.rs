use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::process::ExitCode;
use tracing::{error, info};
use vm_debugger::debugger::{
    Debugger, Headless, InteractiveDebugger, StdConsole, TraceDebugger, TraceFormat,
};
use vm_debugger::executor::{Outcome, Vm};
use vm_debugger::parser::{self, Compiled};

#[derive(Parser, Debug)]
#[command(name = "vm-debugger")]
#[command(about = "Run a line-numbered VM program under a debugger")]
struct Args {
    /// Program file, or `-` to read standard input
    input: String,

    /// Which debugger to attach
    #[arg(long, value_enum, default_value_t = Mode::Exit)]
    debugger: Mode,

    /// Pause before this line (repeatable)
    #[arg(short, long = "break", value_name = "LINE")]
    breakpoints: Vec<usize>,

    /// Do not pause at the first instruction
    #[arg(long)]
    no_stop_on_entry: bool,

    /// Record format for `--debugger trace`
    #[arg(long, value_enum, default_value_t = Format::Text)]
    trace_format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Breakpoint/step REPL without `x`
    Interactive,
    /// Breakpoint/step REPL whose `x` stops the program
    Exit,
    /// Log every instruction and never pause
    Trace,
    /// Just run the program
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for TraceFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => TraceFormat::Text,
            Format::Json => TraceFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    vm_debugger::init_logging();
    let args = Args::parse();

    let compiled = match load(&args.input) {
        Ok(compiled) => compiled,
        Err(err) => {
            error!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };

    if args.input == "-" && matches!(args.debugger, Mode::Interactive | Mode::Exit) {
        info!("program was read from stdin; debugger input is already exhausted");
    }

    let debugger: Box<dyn Debugger> = match args.debugger {
        Mode::Interactive => Box::new(
            InteractiveDebugger::non_exitable(StdConsole::stdio())
                .with_stop_on_entry(!args.no_stop_on_entry)
                .with_breakpoints(args.breakpoints.iter().copied()),
        ),
        Mode::Exit => Box::new(
            InteractiveDebugger::new(StdConsole::stdio())
                .with_stop_on_entry(!args.no_stop_on_entry)
                .with_breakpoints(args.breakpoints.iter().copied()),
        ),
        Mode::Trace => Box::new(TraceDebugger::stdout(args.trace_format.into())),
        Mode::Off => Box::new(Headless::stdout()),
    };

    let mut vm = Vm::with_program(compiled, debugger);
    match vm.run() {
        Ok(Outcome::Completed) | Ok(Outcome::Halted) => ExitCode::SUCCESS,
        Err(fault) => {
            error!("{}", fault);
            ExitCode::FAILURE
        }
    }
}

fn load(input: &str) -> anyhow::Result<Compiled> {
    let lines = parser::read_source(input).with_context(|| format!("could not read {}", input))?;
    parser::compile_lines(&lines).with_context(|| format!("could not compile {}", input))
}
