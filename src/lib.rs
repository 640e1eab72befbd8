//! A small teaching virtual machine with an attachable, line-oriented debugger.
//!
//! Programs are nested JSON arrays. [`parser::compile`] normalizes them into an
//! instruction tree plus a line-indexed [`parser::SourceMap`]; [`executor::Vm`]
//! walks that tree and calls a [`debugger::Debugger`] before every instruction.

pub mod debugger;
pub mod executor;
pub mod parser;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr log subscriber. `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
