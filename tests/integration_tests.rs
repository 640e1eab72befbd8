use std::path::PathBuf;
use vm_debugger::debugger::{Debugger, Headless, Hook, TraceDebugger, TraceFormat};
use vm_debugger::executor::{Fault, Halt, Location, Outcome, Vm};
use vm_debugger::parser::{self, Compiled, CompileError};

// Helper to load a fixture from tests/programs
fn load_program(name: &str) -> Compiled {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "programs", name]
        .iter()
        .collect();
    let lines = parser::read_source(path.to_str().expect("utf-8 path"))
        .expect("Could not read test program");
    parser::compile_lines(&lines).expect("Test program should compile")
}

fn compile_json(raw: serde_json::Value) -> Compiled {
    parser::compile(&raw).expect("Program should compile")
}

// Helper to run a program headless and collect its printed lines
fn run_headless(compiled: Compiled) -> (Result<Outcome, Fault>, Vec<String>) {
    let mut vm = Vm::with_program(compiled, Headless::new(Vec::new()));
    let result = vm.run();
    let out = String::from_utf8(vm.into_debugger().into_inner()).expect("utf-8 output");
    (result, out.lines().map(str::to_string).collect())
}

/// Records every hook call and message, optionally halting at one line.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    halt_at: Option<usize>,
    starts: usize,
    finished: Vec<Result<Outcome, Fault>>,
}

impl Debugger for Recorder {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn handle(&mut self, hook: &Hook<'_>) -> Result<(), Halt> {
        match hook.line {
            Some(line) => self.events.push(format!("hook {} {}", line, hook.op)),
            None => self.events.push(format!("hook - {}", hook.op)),
        }
        if hook.line.is_some() && hook.line == self.halt_at {
            return Err(Halt);
        }
        Ok(())
    }

    fn message(&mut self, text: &str) {
        self.events.push(format!("msg {}", text));
    }

    fn finish(&mut self, result: &Result<Outcome, Fault>) {
        self.finished.push(result.clone());
    }
}

#[cfg(test)]
mod compile_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixture_source_map() {
        let compiled = load_program("count-up.json");

        assert_eq!(compiled.program.len(), 3, "Should have 3 top-level instructions");
        assert_eq!(
            compiled.source_map.lines().collect::<Vec<_>>(),
            vec![1, 2, 3, 4],
            "Nested body line should be mapped too"
        );
        for (line, instr) in compiled.source_map.iter() {
            assert_eq!(instr.line, Some(line), "Mapped instruction should carry its own line");
        }
    }

    #[test]
    fn test_duplicate_line_fails() {
        let result = parser::compile(&json!([
            [1, "print", ["num", 0]],
            [2, "print", ["num", 1]],
            [2, "print", ["num", 2]]
        ]));
        assert!(
            matches!(result, Err(CompileError::DuplicateLine { line: 2 })),
            "Two instructions on line 2 should be rejected"
        );
    }

    #[test]
    fn test_malformed_instruction_fails() {
        let result = parser::compile(&json!([[4, ["num", 1]]]));
        assert!(
            matches!(result, Err(CompileError::MalformedInstruction { line: Some(4), .. })),
            "A line-numbered node needs a string opcode"
        );
    }

    #[test]
    fn test_comment_lines_are_skipped() {
        let lines = vec![
            "// leading comment",
            "[",
            "  // inner comment",
            "  [1, \"print\", [\"num\", 0]]",
            "]",
        ];
        let compiled = parser::compile_lines(&lines).expect("Should compile");
        assert_eq!(compiled.source_map.len(), 1);
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_print_zero() {
        let (result, out) = run_headless(load_program("print-0.json"));
        assert_eq!(result, Ok(Outcome::Completed));
        assert_eq!(out, vec![">> 0"]);
    }

    #[test]
    fn test_loop_counts_up() {
        let (result, out) = run_headless(load_program("count-up.json"));
        assert_eq!(result, Ok(Outcome::Completed));
        assert_eq!(out, vec![">> 3"]);
    }

    #[test]
    fn test_array_operations() {
        let (result, out) = run_headless(load_program("arrays.json"));
        assert_eq!(result, Ok(Outcome::Completed));
        assert_eq!(out, vec![">> 4", ">> 25", ">> [10,25,30,40]"]);
    }

    #[test]
    fn test_hook_runs_before_each_instruction() {
        let mut vm = Vm::with_program(load_program("print-0.json"), Recorder::default());
        assert_eq!(vm.run(), Ok(Outcome::Completed));

        let recorder = vm.into_debugger();
        assert_eq!(
            recorder.events,
            vec!["hook 1 print", "hook - num", "msg >> 0"],
            "Hook should fire before the instruction, including nested ones"
        );
        assert_eq!(recorder.starts, 1);
        assert_eq!(recorder.finished, vec![Ok(Outcome::Completed)]);
    }

    #[test]
    fn test_loop_rehooks_each_iteration() {
        let mut vm = Vm::with_program(load_program("count-up.json"), Recorder::default());
        vm.run().expect("Should run");

        let lines: Vec<String> = vm
            .into_debugger()
            .events
            .into_iter()
            .filter(|e| e.starts_with("hook ") && !e.starts_with("hook -"))
            .collect();
        assert_eq!(
            lines,
            vec![
                "hook 1 defV",
                "hook 2 loop",
                "hook 3 setV",
                "hook 2 loop",
                "hook 3 setV",
                "hook 2 loop",
                "hook 3 setV",
                "hook 2 loop",
                "hook 4 print",
            ]
        );
    }

    #[test]
    fn test_halt_stops_cleanly() {
        let recorder = Recorder {
            halt_at: Some(2),
            ..Recorder::default()
        };
        let mut vm = Vm::with_program(load_program("print-3.json"), recorder);

        assert_eq!(vm.run(), Ok(Outcome::Halted), "Halt is not an error");
        assert_eq!(vm.position(), 1, "Should stop on the halted instruction");

        let recorder = vm.into_debugger();
        let messages: Vec<&String> =
            recorder.events.iter().filter(|e| e.starts_with("msg")).collect();
        assert_eq!(messages, vec!["msg >> 0"], "Nothing past the halt point should run");
        assert_eq!(recorder.finished, vec![Ok(Outcome::Halted)]);
    }

    #[test]
    fn test_unknown_opcode_faults_after_hook() {
        let mut vm = Vm::with_program(
            compile_json(json!([[1, "print", ["num", 0]], [2, "jump", 1]])),
            Recorder::default(),
        );
        let result = vm.run();
        assert_eq!(
            result,
            Err(Fault::UnknownOpcode {
                op: "jump".to_string(),
                at: Location(Some(2)),
            })
        );
        let recorder = vm.into_debugger();
        assert_eq!(recorder.events.last().map(String::as_str), Some("hook 2 jump"));
        assert_eq!(recorder.finished.len(), 1);
        assert!(recorder.finished[0].is_err());
    }

    #[test]
    fn test_nested_unknown_opcode_has_no_line() {
        let (result, _) = run_headless(compile_json(json!([[1, "print", ["nope"]]])));
        assert_eq!(
            result,
            Err(Fault::UnknownOpcode {
                op: "nope".to_string(),
                at: Location(None),
            })
        );
    }

    #[test]
    fn test_domain_faults() {
        let (result, _) = run_headless(compile_json(json!([[1, "print", ["getV", "ghost"]]])));
        assert!(matches!(result, Err(Fault::UnknownName { .. })));

        let (result, _) = run_headless(compile_json(json!([
            [1, "defV", "n", ["num", 1]],
            [2, "print", ["len", "n"]]
        ])));
        assert!(matches!(result, Err(Fault::NotArray { .. })));

        let (result, _) = run_headless(compile_json(json!([
            [1, "defA", "xs", ["data", 1]],
            [2, "print", ["getA", "xs", ["num", 5]]]
        ])));
        assert!(matches!(result, Err(Fault::IndexOutOfBounds { .. })));

        let (result, _) = run_headless(compile_json(json!([[1, "print", ["num", 1, 2]]])));
        assert!(matches!(result, Err(Fault::BadlyFormatted { op: "num", .. })));

        let (result, _) = run_headless(compile_json(json!([[1, "setV", "x", ["num", 1]]])));
        assert!(
            matches!(result, Err(Fault::UnknownName { op: "setV", .. })),
            "setV needs an existing binding"
        );
    }

    #[test]
    fn test_fault_message_names_opcode_and_line() {
        let fault = Fault::UnknownOpcode {
            op: "jump".to_string(),
            at: Location(Some(7)),
        };
        assert_eq!(fault.to_string(), "unknown op \"jump\" at line 7");
    }

    #[test]
    fn test_restart_resets_environment() {
        let mut vm = Vm::with_program(load_program("count-up.json"), Headless::new(Vec::new()));
        vm.run().expect("First run");
        assert_eq!(vm.env().get("x"), Some(&json!(3)));

        vm.restart();
        assert!(vm.env().is_empty(), "restart should clear the environment");
        assert_eq!(vm.position(), 0);

        vm.run().expect("Second run");
        let out = String::from_utf8(vm.into_debugger().into_inner()).unwrap();
        assert_eq!(out, ">> 3\n>> 3\n");
    }

    #[test]
    fn test_initialize_loads_new_program() {
        let mut vm = Vm::new(Headless::new(Vec::new()));
        assert_eq!(vm.run(), Ok(Outcome::Completed), "Empty program completes");

        vm.initialize(load_program("print-3.json"));
        assert_eq!(vm.source_map().len(), 3);
        vm.run().expect("Should run");
        let out = String::from_utf8(vm.into_debugger().into_inner()).unwrap();
        assert_eq!(out, ">> 0\n>> 1\n>> 2\n");
    }
}

#[cfg(test)]
mod trace_tests {
    use super::*;

    #[test]
    fn test_text_trace() {
        let mut vm = Vm::with_program(
            load_program("print-0.json"),
            TraceDebugger::new(Vec::new(), TraceFormat::Text),
        );
        vm.run().expect("Should run");
        let trace = vm.into_debugger();
        assert_eq!(trace.steps(), 1, "Nested instructions are not traced");
        let out = String::from_utf8(trace.into_inner()).unwrap();
        assert_eq!(out, "[1] print {}\n>> 0\n");
    }

    #[test]
    fn test_json_trace_records_environment() {
        let mut vm = Vm::with_program(
            load_program("count-up.json"),
            TraceDebugger::new(Vec::new(), TraceFormat::Json),
        );
        vm.run().expect("Should run");
        let out = String::from_utf8(vm.into_debugger().into_inner()).unwrap();
        let records: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("each line is JSON"))
            .collect();

        assert_eq!(records.len(), 10, "9 instruction records and one output");
        assert_eq!(records[0]["kind"], "exec");
        assert_eq!(records[0]["line"], 1);
        assert_eq!(records[0]["op"], "defV");
        assert_eq!(records[1]["env"]["x"], 0);
        assert_eq!(records[8]["op"], "print");
        assert_eq!(records[8]["env"]["x"], 3);
        assert_eq!(records[9]["kind"], "output");
        assert_eq!(records[9]["text"], ">> 3");
    }
}
