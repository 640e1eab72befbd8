/// Run modes for the debugger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Only breakpoints pause.
    Continue,
    /// Pause once this many more instructions have been reached.
    Step(usize),
}

impl RunMode {
    /// Count one instruction against the step budget. True when the budget just ran out.
    pub fn tick(&mut self) -> bool {
        match *self {
            RunMode::Continue => false,
            RunMode::Step(n) if n <= 1 => {
                *self = RunMode::Continue;
                true
            }
            RunMode::Step(n) => {
                *self = RunMode::Step(n - 1);
                false
            }
        }
    }
}
