use super::environment::Environment;
use super::error::{Fault, Halt, Location, Outcome, Unwind};
use super::ops::Opcode;
use crate::debugger::{Debugger, Hook};
use crate::parser::{Compiled, Instruction, Node, Program, SourceMap};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Prefix for lines produced by `print`.
pub const PRINT_PREFIX: &str = ">>";

/// Fetch-execute engine. Every instruction boundary goes through the attached debugger.
pub struct Vm<D: Debugger> {
    program: Rc<Program>,
    source_map: SourceMap,
    pub(crate) env: Environment,
    ip: usize,
    pub(crate) debugger: D,
}

impl<D: Debugger> Vm<D> {
    /// An engine with an empty program; call [`Vm::initialize`] to load one.
    pub fn new(debugger: D) -> Self {
        Self {
            program: Rc::new(Program::default()),
            source_map: SourceMap::new(),
            env: Environment::new(),
            ip: 0,
            debugger,
        }
    }

    pub fn with_program(compiled: Compiled, debugger: D) -> Self {
        let mut vm = Self::new(debugger);
        vm.initialize(compiled);
        vm
    }

    /// Load `compiled` and reset the environment and instruction pointer.
    pub fn initialize(&mut self, compiled: Compiled) {
        self.program = compiled.program;
        self.source_map = compiled.source_map;
        self.restart();
    }

    /// Reset to the first instruction of the current program with an empty environment.
    pub fn restart(&mut self) {
        self.env.clear();
        self.ip = 0;
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Index of the next top-level instruction to run.
    pub fn position(&self) -> usize {
        self.ip
    }

    pub fn debugger(&self) -> &D {
        &self.debugger
    }

    pub fn debugger_mut(&mut self) -> &mut D {
        &mut self.debugger
    }

    pub fn into_debugger(self) -> D {
        self.debugger
    }

    /// Run top-level instructions until the program ends, a halt is requested, or a handler faults.
    pub fn run(&mut self) -> Result<Outcome, Fault> {
        self.debugger.start();
        let program = Rc::clone(&self.program);

        let result = loop {
            let Some(instr) = program.get(self.ip) else {
                break Ok(Outcome::Completed);
            };
            match self.exec(instr) {
                Ok(_) => self.ip += 1,
                Err(Unwind::Halt(Halt)) => break Ok(Outcome::Halted),
                Err(Unwind::Fault(fault)) => break Err(fault),
            }
        };

        match &result {
            Ok(Outcome::Completed) => info!(instructions = program.len(), "program completed"),
            Ok(Outcome::Halted) => info!(position = self.ip, "program halted by debugger"),
            Err(fault) => warn!(%fault, "program faulted"),
        }
        self.debugger.finish(&result);
        result
    }

    /// Hook, then dispatch one instruction to its handler.
    pub fn exec(&mut self, instr: &Instruction) -> Result<Value, Unwind> {
        self.hook(instr.line, &instr.op)?;
        let opcode: Opcode = instr.op.parse().map_err(|_| Fault::UnknownOpcode {
            op: instr.op.clone(),
            at: Location(instr.line),
        })?;
        trace!(op = %instr.op, line = ?instr.line, "exec");
        let handler = opcode.handler::<D>();
        handler(self, &instr.args, instr.line)
    }

    pub(crate) fn hook(&mut self, line: Option<usize>, op: &str) -> Result<(), Halt> {
        let hook = Hook {
            env: &self.env,
            line,
            op,
            source_map: &self.source_map,
        };
        self.debugger.handle(&hook).map_err(|halt| {
            debug!(?line, op, "halt requested");
            halt
        })
    }

    /// Evaluate an operand that must be an instruction.
    pub(crate) fn eval(
        &mut self,
        op: Opcode,
        node: &Node,
        line: Option<usize>,
    ) -> Result<Value, Unwind> {
        match node {
            Node::Instr(instr) => self.exec(instr),
            Node::Literal(value) => Err(Fault::BadlyFormatted {
                op: op.name(),
                at: Location(line),
                detail: format!("expected an instruction, found {}", value),
            }
            .into()),
        }
    }

    /// Execute a body of nested instructions in order.
    pub(crate) fn run_all(
        &mut self,
        op: Opcode,
        body: &[Node],
        line: Option<usize>,
    ) -> Result<(), Unwind> {
        for node in body {
            self.eval(op, node, line)?;
        }
        Ok(())
    }

    pub(crate) fn message(&mut self, text: &str) {
        self.debugger.message(text);
    }
}
