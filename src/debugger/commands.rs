use thiserror::Error;

/// One parsed REPL command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Continue,
    Clear(usize),
    List,
    Next(usize),
    Print(String),
    Run,
    Stop(usize),
    Variables,
    Exit,
}

/// Menu entry: the letter shown in the prompt and its usage line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub letter: char,
    pub usage: &'static str,
}

/// Every command letter, in prompt order.
pub const COMMANDS: [CommandInfo; 9] = [
    CommandInfo {
        letter: '?',
        usage: "? - show this help",
    },
    CommandInfo {
        letter: 'c',
        usage: "c - continue to the next breakpoint; c <line> - clear a breakpoint",
    },
    CommandInfo {
        letter: 'l',
        usage: "l - list the current line and its neighbours",
    },
    CommandInfo {
        letter: 'n',
        usage: "n [count] - execute count instructions (default 1), then pause",
    },
    CommandInfo {
        letter: 'p',
        usage: "p <name> - print a variable",
    },
    CommandInfo {
        letter: 'r',
        usage: "r - run until the next breakpoint or the end",
    },
    CommandInfo {
        letter: 's',
        usage: "s <line> - stop at a line (set a breakpoint)",
    },
    CommandInfo {
        letter: 'v',
        usage: "v - show all variables",
    },
    CommandInfo {
        letter: 'x',
        usage: "x - exit the program",
    },
];

/// Recoverable input problems. Printed as usage text; the debugger stays paused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command \"{0}\" (use '?' for help)")]
    Unknown(String),

    #[error("{command} requires {what}")]
    Usage {
        command: &'static str,
        what: &'static str,
    },

    #[error("unbalanced quotes in \"{0}\"")]
    Unbalanced(String),
}

/// Parse one line of input. Blank input yields `None`.
pub fn parse_command(input: &str) -> Result<Option<Command>, CommandError> {
    let tokens = shlex::split(input)
        .ok_or_else(|| CommandError::Unbalanced(input.trim().to_string()))?;
    let Some((cmd, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match cmd.as_str() {
        "?" | "help" => Command::Help,
        "c" | "continue" => match args {
            [] => Command::Continue,
            [line] => Command::Clear(line_number(line).ok_or(CLEAR_USAGE)?),
            _ => return Err(CLEAR_USAGE),
        },
        "clear" => match args {
            [line] => Command::Clear(line_number(line).ok_or(CLEAR_USAGE)?),
            _ => return Err(CLEAR_USAGE),
        },
        "l" | "list" => no_args(args, "l[ist]", Command::List)?,
        "n" | "next" => match args {
            [] => Command::Next(1),
            [count] => Command::Next(line_number(count).ok_or(NEXT_USAGE)?),
            _ => return Err(NEXT_USAGE),
        },
        "p" | "print" => match args {
            [name] => Command::Print(name.clone()),
            _ => {
                return Err(CommandError::Usage {
                    command: "p[rint]",
                    what: "one variable name",
                })
            }
        },
        "r" | "run" => no_args(args, "r[un]", Command::Run)?,
        "s" | "stop" => match args {
            [line] => Command::Stop(line_number(line).ok_or(STOP_USAGE)?),
            _ => return Err(STOP_USAGE),
        },
        "v" | "variables" => no_args(args, "v[ariables]", Command::Variables)?,
        "x" | "exit" => no_args(args, "x[exit]", Command::Exit)?,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

const CLEAR_USAGE: CommandError = CommandError::Usage {
    command: "c[lear]",
    what: "one line number",
};
const NEXT_USAGE: CommandError = CommandError::Usage {
    command: "n[ext]",
    what: "a positive instruction count",
};
const STOP_USAGE: CommandError = CommandError::Usage {
    command: "s[top]",
    what: "one line number",
};

fn no_args(
    args: &[String],
    command: &'static str,
    parsed: Command,
) -> Result<Command, CommandError> {
    if args.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::Usage {
            command,
            what: "no arguments",
        })
    }
}

fn line_number(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|n| *n > 0)
}
