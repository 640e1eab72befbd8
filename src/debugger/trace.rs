use super::{Debugger, Hook};
use crate::executor::{Environment, Fault, Halt, Outcome};
use serde::Serialize;
use std::io::{self, Stdout, Write};

/// Output shape for trace records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceFormat {
    /// `[line] op {env}`
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TraceRecord<'a> {
    Exec {
        line: usize,
        op: &'a str,
        env: &'a Environment,
    },
    Output {
        text: &'a str,
    },
}

/// Observe-only debugger: records every line-numbered instruction and never pauses.
pub struct TraceDebugger<W> {
    out: W,
    format: TraceFormat,
    steps: usize,
}

impl TraceDebugger<Stdout> {
    pub fn stdout(format: TraceFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> TraceDebugger<W> {
    pub fn new(out: W, format: TraceFormat) -> Self {
        Self {
            out,
            format,
            steps: 0,
        }
    }

    /// Number of line-numbered instructions seen so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, record: &TraceRecord<'_>) {
        let line = match (self.format, record) {
            (TraceFormat::Json, record) => match serde_json::to_string(record) {
                Ok(json) => json,
                Err(err) => {
                    tracing::warn!(%err, "failed to encode trace record");
                    return;
                }
            },
            (TraceFormat::Text, TraceRecord::Exec { line, op, env }) => {
                let env = serde_json::to_string(env).unwrap_or_default();
                format!("[{}] {} {}", line, op, env)
            }
            (TraceFormat::Text, TraceRecord::Output { text }) => text.to_string(),
        };
        if let Err(err) = writeln!(self.out, "{}", line) {
            tracing::warn!(%err, "failed to write trace");
        }
    }
}

impl<W: Write> Debugger for TraceDebugger<W> {
    fn start(&mut self) {
        self.steps = 0;
    }

    fn handle(&mut self, hook: &Hook<'_>) -> Result<(), Halt> {
        let Some(line) = hook.line else {
            return Ok(());
        };
        self.steps += 1;
        tracing::trace!(line, op = hook.op, "trace");
        self.write(&TraceRecord::Exec {
            line,
            op: hook.op,
            env: hook.env,
        });
        Ok(())
    }

    fn message(&mut self, text: &str) {
        self.write(&TraceRecord::Output { text });
    }

    fn finish(&mut self, result: &Result<Outcome, Fault>) {
        tracing::debug!(steps = self.steps, ok = result.is_ok(), "trace finished");
    }
}
