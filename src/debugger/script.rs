use super::console::Console;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// Text the debugger is expected to produce (prompt or output line).
    Get(String),
    /// Text fed back as the next line of input.
    Send(String),
}

/// A deviation between the scripted session and what the debugger did.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("expected \"{expected}\" got \"{actual}\"")]
    Mismatch { expected: String, actual: String },

    #[error("debugger produced \"{actual}\" while the script was waiting to send \"{pending}\"")]
    UnexpectedOutput { actual: String, pending: String },

    #[error("debugger asked for input while the script expected \"{expected}\"")]
    UnexpectedInput { expected: String },

    #[error("unexpected end of steps at \"{actual}\"")]
    Exhausted { actual: String },

    #[error("{0} step(s) left at end of session")]
    Leftover(usize),
}

/// Deterministic console for driving the REPL from tests.
///
/// Steps are checked strictly in order. The first deviation is recorded and every
/// later `input` returns `None`, which ends the session; `finish` reports it.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    steps: VecDeque<Step>,
    failure: Option<ScriptError>,
    statuses: Vec<String>,
}

impl ScriptedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect the debugger to produce exactly `text` next.
    pub fn get(mut self, text: impl Into<String>) -> Self {
        self.steps.push_back(Step::Get(text.into()));
        self
    }

    /// Answer the next prompt with `text`.
    pub fn send(mut self, text: impl Into<String>) -> Self {
        self.steps.push_back(Step::Send(text.into()));
        self
    }

    /// Status lines seen so far; these are not part of the scripted transcript.
    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    /// Ok when every step was consumed and nothing deviated.
    pub fn finish(self) -> Result<(), ScriptError> {
        if let Some(failure) = self.failure {
            return Err(failure);
        }
        match self.steps.len() {
            0 => Ok(()),
            n => Err(ScriptError::Leftover(n)),
        }
    }

    fn fail(&mut self, error: ScriptError) {
        tracing::debug!(%error, "script deviation");
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    fn from_system(&mut self, actual: &str) -> bool {
        if self.failure.is_some() {
            return false;
        }
        match self.steps.pop_front() {
            Some(Step::Get(expected)) if expected == actual => true,
            Some(Step::Get(expected)) => {
                self.fail(ScriptError::Mismatch {
                    expected,
                    actual: actual.to_string(),
                });
                false
            }
            Some(Step::Send(pending)) => {
                self.fail(ScriptError::UnexpectedOutput {
                    actual: actual.to_string(),
                    pending,
                });
                false
            }
            None => {
                self.fail(ScriptError::Exhausted {
                    actual: actual.to_string(),
                });
                false
            }
        }
    }
}

impl Console for ScriptedConsole {
    fn input(&mut self, prompt: &str) -> Option<String> {
        if !self.from_system(prompt) {
            return None;
        }
        match self.steps.pop_front() {
            Some(Step::Send(text)) => Some(text),
            Some(Step::Get(expected)) => {
                self.fail(ScriptError::UnexpectedInput { expected });
                None
            }
            None => {
                self.fail(ScriptError::Exhausted {
                    actual: prompt.to_string(),
                });
                None
            }
        }
    }

    fn output(&mut self, text: &str) {
        self.from_system(text);
    }

    fn status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_script_in_order() {
        let mut console = ScriptedConsole::new().get("[1 ?] ").send("r").get(">> 0");
        assert_eq!(console.input("[1 ?] ").as_deref(), Some("r"));
        console.output(">> 0");
        console.status("program completed");
        assert_eq!(console.statuses(), ["program completed".to_string()]);
        assert_eq!(console.finish(), Ok(()));
    }

    #[test]
    fn records_first_mismatch() {
        let mut console = ScriptedConsole::new().get(">> 0").get(">> 1");
        console.output(">> 5");
        console.output(">> 1");
        assert_eq!(
            console.finish(),
            Err(ScriptError::Mismatch {
                expected: ">> 0".to_string(),
                actual: ">> 5".to_string(),
            })
        );
    }

    #[test]
    fn input_after_failure_ends_session() {
        let mut console = ScriptedConsole::new().get("[2 ?] ").send("r");
        assert_eq!(console.input("[1 ?] "), None);
        assert_eq!(console.input("[2 ?] "), None);
        assert!(matches!(console.finish(), Err(ScriptError::Mismatch { .. })));
    }

    #[test]
    fn leftover_steps_are_reported() {
        let console = ScriptedConsole::new().get(">> 0");
        assert_eq!(console.finish(), Err(ScriptError::Leftover(1)));
    }
}
