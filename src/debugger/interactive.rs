use super::breakpoints::Breakpoints;
use super::commands::{parse_command, Command, COMMANDS};
use super::console::Console;
use super::stepping::RunMode;
use super::{Debugger, Hook};
use crate::executor::{Fault, Halt, Outcome};

/// Lines shown on each side of the current one by `l`.
const LIST_RADIUS: usize = 2;

/// Where the REPL is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebuggerState {
    Idle,
    Running,
    Paused,
    Exited,
}

/// What a command asks the pause loop to do next.
enum Flow {
    Stay,
    Resume,
}

/// Breakpoint/step REPL. Pauses on the first instruction of a run, on breakpoints,
/// and when the step budget runs out.
pub struct InteractiveDebugger<C> {
    console: C,
    breakpoints: Breakpoints,
    mode: RunMode,
    state: DebuggerState,
    exitable: bool,
    stop_on_entry: bool,
    last_line: Option<usize>,
}

impl<C: Console> InteractiveDebugger<C> {
    /// A debugger whose `x` command halts the run.
    pub fn new(console: C) -> Self {
        Self {
            console,
            breakpoints: Breakpoints::new(),
            mode: RunMode::Step(1),
            state: DebuggerState::Idle,
            exitable: true,
            stop_on_entry: true,
            last_line: None,
        }
    }

    /// A debugger that rejects `x` and leaves it out of the prompt.
    pub fn non_exitable(console: C) -> Self {
        Self {
            exitable: false,
            ..Self::new(console)
        }
    }

    pub fn with_stop_on_entry(mut self, stop_on_entry: bool) -> Self {
        self.stop_on_entry = stop_on_entry;
        self
    }

    pub fn with_breakpoints(mut self, lines: impl IntoIterator<Item = usize>) -> Self {
        for line in lines {
            self.breakpoints.add(line);
        }
        self
    }

    pub fn state(&self) -> DebuggerState {
        self.state
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// `[<line> <letters>] `
    pub fn prompt(&self, line: usize) -> String {
        let exitable = self.accepts_exit();
        let mut letters: Vec<char> = COMMANDS
            .iter()
            .map(|info| info.letter)
            .filter(|letter| exitable || *letter != 'x')
            .collect();
        letters.sort_unstable();
        format!("[{} {}] ", line, letters.into_iter().collect::<String>())
    }

    fn should_pause(&mut self, line: usize) -> bool {
        let stepped = self.mode.tick();
        stepped || self.breakpoints.contains(line)
    }

    fn interact(&mut self, hook: &Hook<'_>, line: usize) -> Result<(), Halt> {
        self.state = DebuggerState::Paused;
        tracing::debug!(line, op = hook.op, "paused");

        loop {
            let prompt = self.prompt(line);
            let Some(input) = self.console.input(&prompt) else {
                return self.end_of_input(line);
            };

            let command = match parse_command(&input) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(err) => {
                    self.console.output(&err.to_string());
                    continue;
                }
            };

            match self.apply(command, hook, line)? {
                Flow::Stay => continue,
                Flow::Resume => {
                    self.state = DebuggerState::Running;
                    return Ok(());
                }
            }
        }
    }

    fn apply(&mut self, command: Command, hook: &Hook<'_>, line: usize) -> Result<Flow, Halt> {
        match command {
            Command::Help => {
                let exitable = self.accepts_exit();
                for info in COMMANDS
                    .iter()
                    .filter(|info| exitable || info.letter != 'x')
                {
                    self.console.output(info.usage);
                }
                Ok(Flow::Stay)
            }
            Command::Continue => {
                self.mode = RunMode::Continue;
                self.console.output("continuing");
                Ok(Flow::Resume)
            }
            Command::Run => {
                self.mode = RunMode::Continue;
                Ok(Flow::Resume)
            }
            Command::Clear(target) => {
                if !self.breakpoints.remove(target) {
                    self.console.output(&format!("no breakpoint at line {}", target));
                }
                Ok(Flow::Stay)
            }
            Command::Stop(target) => {
                self.breakpoints.add(target);
                if !hook.source_map.contains(target) {
                    self.console.output(&format!("line {} has no instruction", target));
                }
                Ok(Flow::Stay)
            }
            Command::Next(count) => {
                self.mode = RunMode::Step(count);
                Ok(Flow::Resume)
            }
            Command::Print(name) => {
                let text = match hook.env.get(&name) {
                    Some(value) => value.to_string(),
                    None => format!("unknown variable name \"{}\"", name),
                };
                self.console.output(&text);
                Ok(Flow::Stay)
            }
            Command::Variables => {
                if hook.env.is_empty() {
                    self.console.output("no variables");
                }
                for (name, value) in hook.env.iter() {
                    self.console.output(&format!("{} = {}", name, value));
                }
                Ok(Flow::Stay)
            }
            Command::List => {
                self.list(hook, line);
                Ok(Flow::Stay)
            }
            Command::Exit if self.accepts_exit() => {
                self.state = DebuggerState::Exited;
                Err(Halt)
            }
            Command::Exit => {
                self.console.output("x[exit] is not available in this debugger");
                Ok(Flow::Stay)
            }
        }
    }

    fn list(&mut self, hook: &Hook<'_>, line: usize) {
        let context = hook.source_map.context(line, LIST_RADIUS);
        if context.is_empty() {
            self.console.output(&format!("=> {}  ({})", line, hook.op));
            return;
        }
        for (n, instr) in context {
            let cursor = if n == line { "=>" } else { "  " };
            let mark = if self.breakpoints.contains(n) { "*" } else { " " };
            self.console.output(&format!("{} {}{} {}", cursor, n, mark, instr));
        }
    }

    fn end_of_input(&mut self, line: usize) -> Result<(), Halt> {
        tracing::warn!(line, "debugger input closed");
        if self.accepts_exit() {
            self.state = DebuggerState::Exited;
            Err(Halt)
        } else {
            self.mode = RunMode::Continue;
            self.breakpoints.clear();
            self.state = DebuggerState::Running;
            Ok(())
        }
    }
}

impl<C: Console> Debugger for InteractiveDebugger<C> {
    fn start(&mut self) {
        self.mode = if self.stop_on_entry {
            RunMode::Step(1)
        } else {
            RunMode::Continue
        };
        self.state = DebuggerState::Idle;
        self.last_line = None;
    }

    fn handle(&mut self, hook: &Hook<'_>) -> Result<(), Halt> {
        let Some(line) = hook.line else {
            return Ok(());
        };
        self.last_line = Some(line);
        if self.state == DebuggerState::Idle {
            self.state = DebuggerState::Running;
        }
        if self.should_pause(line) {
            self.interact(hook, line)
        } else {
            Ok(())
        }
    }

    fn message(&mut self, text: &str) {
        self.console.output(text);
    }

    fn accepts_exit(&self) -> bool {
        self.exitable
    }

    fn finish(&mut self, result: &Result<Outcome, Fault>) {
        self.state = DebuggerState::Exited;
        let status = match (result, self.last_line) {
            (Ok(Outcome::Completed), _) => "program completed".to_string(),
            (Ok(Outcome::Halted), Some(line)) => format!("program halted at line {}", line),
            (Ok(Outcome::Halted), None) => "program halted".to_string(),
            (Err(fault), _) => format!("program failed: {}", fault),
        };
        self.console.status(&status);
    }
}
