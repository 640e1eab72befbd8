use super::environment::Environment;
use super::error::{Fault, Location, Unwind};
use super::vm::{Vm, PRINT_PREFIX};
use crate::debugger::Debugger;
use crate::parser::Node;
use serde_json::Value;
use std::str::FromStr;

/// Handler signature: `(vm, args, line)`.
pub type Handler<D> = fn(&mut Vm<D>, &[Node], Option<usize>) -> Result<Value, Unwind>;

/// Every operation the engine knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Append,
    Data,
    DefA,
    DefV,
    GetA,
    GetV,
    Gt,
    Len,
    Lt,
    Loop,
    Num,
    Print,
    SetA,
    SetV,
    Test,
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::Add,
        Opcode::Append,
        Opcode::Data,
        Opcode::DefA,
        Opcode::DefV,
        Opcode::GetA,
        Opcode::GetV,
        Opcode::Gt,
        Opcode::Len,
        Opcode::Lt,
        Opcode::Loop,
        Opcode::Num,
        Opcode::Print,
        Opcode::SetA,
        Opcode::SetV,
        Opcode::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Append => "append",
            Opcode::Data => "data",
            Opcode::DefA => "defA",
            Opcode::DefV => "defV",
            Opcode::GetA => "getA",
            Opcode::GetV => "getV",
            Opcode::Gt => "gt",
            Opcode::Len => "len",
            Opcode::Lt => "lt",
            Opcode::Loop => "loop",
            Opcode::Num => "num",
            Opcode::Print => "print",
            Opcode::SetA => "setA",
            Opcode::SetV => "setV",
            Opcode::Test => "test",
        }
    }

    /// Dispatch table entry for this opcode.
    pub fn handler<D: Debugger>(self) -> Handler<D> {
        match self {
            Opcode::Add => add,
            Opcode::Append => append,
            Opcode::Data => data,
            Opcode::DefA => def_a,
            Opcode::DefV => def_v,
            Opcode::GetA => get_a,
            Opcode::GetV => get_v,
            Opcode::Gt => gt,
            Opcode::Len => len,
            Opcode::Lt => lt,
            Opcode::Loop => run_loop,
            Opcode::Num => num,
            Opcode::Print => print,
            Opcode::SetA => set_a,
            Opcode::SetV => set_v,
            Opcode::Test => run_test,
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or(())
    }
}

/// Loose truthiness used by `loop` and `test`.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text shown for a printed value: strings bare, everything else as JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn add<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::Add;
    check_op(op, 2, args, line)?;
    let left = vm.eval(op, &args[0], line)?;
    let right = vm.eval(op, &args[1], line)?;
    if let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) {
        if let Some(sum) = l.checked_add(r) {
            return Ok(Value::from(sum));
        }
    }
    let l = number(op, &left, line)?;
    let r = number(op, &right, line)?;
    Ok(Value::from(l + r))
}

fn append<D: Debugger>(
    vm: &mut Vm<D>,
    args: &[Node],
    line: Option<usize>,
) -> Result<Value, Unwind> {
    let op = Opcode::Append;
    check_op(op, 2, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    array_mut(&mut vm.env, op, name, line)?;
    let value = vm.eval(op, &args[1], line)?;
    array_mut(&mut vm.env, op, name, line)?.push(value);
    Ok(Value::Null)
}

fn data<D: Debugger>(_vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let items = args
        .iter()
        .map(|node| match node {
            Node::Literal(value) => Ok(value.clone()),
            Node::Instr(instr) => Err(Fault::BadlyFormatted {
                op: Opcode::Data.name(),
                at: Location(line),
                detail: format!("data holds literals only, found {}", instr),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

fn def_a<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    define(vm, Opcode::DefA, args, line)
}

fn def_v<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    define(vm, Opcode::DefV, args, line)
}

fn define<D: Debugger>(
    vm: &mut Vm<D>,
    op: Opcode,
    args: &[Node],
    line: Option<usize>,
) -> Result<Value, Unwind> {
    check_op(op, 2, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    let value = vm.eval(op, &args[1], line)?;
    vm.env.set(name, value);
    Ok(Value::Null)
}

fn get_a<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::GetA;
    check_op(op, 2, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    array_mut(&mut vm.env, op, name, line)?;
    let index = vm.eval(op, &args[1], line)?;
    let array = array_mut(&mut vm.env, op, name, line)?;
    let i = check_index(array, name, &index, line)?;
    Ok(array[i].clone())
}

fn get_v<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::GetV;
    check_op(op, 1, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    vm.env
        .get(name)
        .cloned()
        .ok_or_else(|| unknown_name(op, name, line).into())
}

fn gt<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    compare(vm, Opcode::Gt, args, line, |l, r| l > r)
}

fn lt<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    compare(vm, Opcode::Lt, args, line, |l, r| l < r)
}

fn compare<D: Debugger>(
    vm: &mut Vm<D>,
    op: Opcode,
    args: &[Node],
    line: Option<usize>,
    cmp: fn(f64, f64) -> bool,
) -> Result<Value, Unwind> {
    check_op(op, 2, args, line)?;
    let left = vm.eval(op, &args[0], line)?;
    let right = vm.eval(op, &args[1], line)?;
    let l = number(op, &left, line)?;
    let r = number(op, &right, line)?;
    Ok(Value::Bool(cmp(l, r)))
}

fn len<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::Len;
    check_op(op, 1, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    let array = array_mut(&mut vm.env, op, name, line)?;
    Ok(Value::from(array.len()))
}

fn run_loop<D: Debugger>(
    vm: &mut Vm<D>,
    args: &[Node],
    line: Option<usize>,
) -> Result<Value, Unwind> {
    let op = Opcode::Loop;
    check_body(op, 1, args, line)?;
    let (condition, body) = (&args[0], &args[1..]);
    let mut first = true;
    loop {
        // exec already hooked the first pass; later passes re-enter at the loop's line
        if !first {
            vm.hook(line, op.name())?;
        }
        first = false;
        if !truthy(&vm.eval(op, condition, line)?) {
            break;
        }
        vm.run_all(op, body, line)?;
    }
    Ok(Value::Null)
}

fn num<D: Debugger>(_vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::Num;
    check_op(op, 1, args, line)?;
    match &args[0] {
        Node::Literal(value @ Value::Number(_)) => Ok(value.clone()),
        other => Err(type_mismatch(op, "a numeric literal", other, line).into()),
    }
}

fn print<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::Print;
    check_op(op, 1, args, line)?;
    let value = vm.eval(op, &args[0], line)?;
    vm.message(&format!("{} {}", PRINT_PREFIX, render(&value)));
    Ok(Value::Null)
}

fn set_a<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::SetA;
    check_op(op, 3, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    array_mut(&mut vm.env, op, name, line)?;
    let index = vm.eval(op, &args[1], line)?;
    check_index(array_mut(&mut vm.env, op, name, line)?, name, &index, line)?;
    let value = vm.eval(op, &args[2], line)?;
    let array = array_mut(&mut vm.env, op, name, line)?;
    let i = check_index(array, name, &index, line)?;
    array[i] = value;
    Ok(Value::Null)
}

fn set_v<D: Debugger>(vm: &mut Vm<D>, args: &[Node], line: Option<usize>) -> Result<Value, Unwind> {
    let op = Opcode::SetV;
    check_op(op, 2, args, line)?;
    let name = name_arg(op, &args[0], line)?;
    if !vm.env.contains(name) {
        return Err(unknown_name(op, name, line).into());
    }
    let value = vm.eval(op, &args[1], line)?;
    vm.env.set(name, value);
    Ok(Value::Null)
}

fn run_test<D: Debugger>(
    vm: &mut Vm<D>,
    args: &[Node],
    line: Option<usize>,
) -> Result<Value, Unwind> {
    let op = Opcode::Test;
    check_body(op, 1, args, line)?;
    let condition = vm.eval(op, &args[0], line)?;
    if truthy(&condition) {
        vm.run_all(op, &args[1..], line)?;
    }
    Ok(Value::Null)
}

fn check_op(op: Opcode, expected: usize, args: &[Node], line: Option<usize>) -> Result<(), Fault> {
    if args.len() == expected {
        return Ok(());
    }
    Err(Fault::BadlyFormatted {
        op: op.name(),
        at: Location(line),
        detail: format!("expected {} argument(s), got {}", expected, args.len()),
    })
}

fn check_body(op: Opcode, minimum: usize, args: &[Node], line: Option<usize>) -> Result<(), Fault> {
    if args.len() >= minimum {
        return Ok(());
    }
    Err(Fault::BadlyFormatted {
        op: op.name(),
        at: Location(line),
        detail: format!("expected at least {} argument(s), got {}", minimum, args.len()),
    })
}

fn name_arg(op: Opcode, node: &Node, line: Option<usize>) -> Result<&str, Fault> {
    match node {
        Node::Literal(Value::String(name)) => Ok(name),
        other => Err(type_mismatch(op, "a variable name", other, line)),
    }
}

fn array_mut<'a>(
    env: &'a mut Environment,
    op: Opcode,
    name: &str,
    line: Option<usize>,
) -> Result<&'a mut Vec<Value>, Fault> {
    match env.get_mut(name) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Fault::NotArray {
            op: op.name(),
            name: name.to_string(),
            at: Location(line),
        }),
        None => Err(unknown_name(op, name, line)),
    }
}

fn check_index(
    array: &[Value],
    name: &str,
    index: &Value,
    line: Option<usize>,
) -> Result<usize, Fault> {
    index
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < array.len())
        .ok_or_else(|| Fault::IndexOutOfBounds {
            name: name.to_string(),
            index: index.to_string(),
            at: Location(line),
        })
}

fn number(op: Opcode, value: &Value, line: Option<usize>) -> Result<f64, Fault> {
    value.as_f64().ok_or_else(|| Fault::TypeMismatch {
        op: op.name(),
        expected: "a number",
        found: value.to_string(),
        at: Location(line),
    })
}

fn unknown_name(op: Opcode, name: &str, line: Option<usize>) -> Fault {
    Fault::UnknownName {
        op: op.name(),
        name: name.to_string(),
        at: Location(line),
    }
}

fn type_mismatch(op: Opcode, expected: &'static str, found: &Node, line: Option<usize>) -> Fault {
    Fault::TypeMismatch {
        op: op.name(),
        expected,
        found: found.to_string(),
        at: Location(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn opcode_names_round_trip() {
        for op in Opcode::ALL {
            assert_eq!(op.name().parse::<Opcode>(), Ok(op));
        }
        assert!("jump".parse::<Opcode>().is_err());
        assert!("Print".parse::<Opcode>().is_err());
    }

    #[test]
    fn truthiness() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(3)));
        assert!(truthy(&json!([])));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!("")));
    }

    #[test]
    fn rendering_leaves_strings_bare() {
        assert_eq!(render(&json!("hi")), "hi");
        assert_eq!(render(&json!(0)), "0");
        assert_eq!(render(&json!([1, 2])), "[1,2]");
        assert_eq!(render(&json!(true)), "true");
    }
}
