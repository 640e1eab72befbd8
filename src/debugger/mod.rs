mod breakpoints;
mod commands;
mod console;
mod headless;
mod interactive;
mod script;
mod stepping;
mod trace;

pub use breakpoints::Breakpoints;
pub use commands::{parse_command, Command, CommandError, CommandInfo, COMMANDS};
pub use console::{Console, StdConsole};
pub use headless::Headless;
pub use interactive::{DebuggerState, InteractiveDebugger};
pub use script::{ScriptError, ScriptedConsole};
pub use stepping::RunMode;
pub use trace::{TraceDebugger, TraceFormat};

use crate::executor::{Environment, Fault, Halt, Outcome};
use crate::parser::SourceMap;

/// What the engine shows the debugger at an instruction boundary.
#[derive(Debug, Clone, Copy)]
pub struct Hook<'a> {
    pub env: &'a Environment,
    /// `None` for nested instructions, which are never pause points.
    pub line: Option<usize>,
    pub op: &'a str,
    pub source_map: &'a SourceMap,
}

/// Callback interface the engine drives before every instruction.
pub trait Debugger {
    /// A fresh `run()` is starting.
    fn start(&mut self) {}

    /// Called before the instruction executes. `Err(Halt)` stops the run cleanly.
    fn handle(&mut self, hook: &Hook<'_>) -> Result<(), Halt>;

    /// Program output, e.g. from `print`.
    fn message(&mut self, text: &str);

    fn accepts_exit(&self) -> bool {
        false
    }

    /// The run ended, one way or another.
    fn finish(&mut self, _result: &Result<Outcome, Fault>) {}
}

impl<D: Debugger + ?Sized> Debugger for Box<D> {
    fn start(&mut self) {
        (**self).start()
    }

    fn handle(&mut self, hook: &Hook<'_>) -> Result<(), Halt> {
        (**self).handle(hook)
    }

    fn message(&mut self, text: &str) {
        (**self).message(text)
    }

    fn accepts_exit(&self) -> bool {
        (**self).accepts_exit()
    }

    fn finish(&mut self, result: &Result<Outcome, Fault>) {
        (**self).finish(result)
    }
}
