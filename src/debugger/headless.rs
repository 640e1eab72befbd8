use super::{Debugger, Hook};
use crate::executor::Halt;
use std::io::{self, Stdout, Write};

/// No debugging at all: hooks are ignored, program output is written through.
pub struct Headless<W> {
    out: W,
}

impl Headless<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Headless<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Debugger for Headless<W> {
    fn handle(&mut self, _hook: &Hook<'_>) -> Result<(), Halt> {
        Ok(())
    }

    fn message(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{}", text) {
            tracing::warn!(%err, "failed to write program output");
        }
    }
}
