//! Convenience command builders.
//!
//! Each sends one literal console command through [`Session::execute`] and
//! returns the raw response unit.

use std::path::Path;

use crate::error::SessionResult;
use crate::session::Session;

fn with_args(verb: &str, args: &[&str]) -> String {
    if args.is_empty() {
        verb.to_string()
    } else {
        format!("{verb} {}", args.join(" "))
    }
}

impl Session {
    /// Load `program` as the debug target.
    pub fn file(&mut self, program: &Path) -> SessionResult<String> {
        self.execute(&format!("file {}", program.display()))
    }

    /// Run the target from the start.
    pub fn run(&mut self, args: &[&str]) -> SessionResult<String> {
        self.execute(&with_args("run", args))
    }

    /// Run the target and stop at the beginning of `main`.
    pub fn start(&mut self, args: &[&str]) -> SessionResult<String> {
        self.execute(&with_args("start", args))
    }

    /// Set the arguments used by later `run`/`start` commands.
    pub fn set_args(&mut self, args: &[&str]) -> SessionResult<String> {
        self.execute(&with_args("set args", args))
    }

    /// Write a core file of the stopped target.
    pub fn generate_core_file(&mut self, filename: Option<&str>) -> SessionResult<String> {
        self.execute(&with_args("generate-core-file", filename.as_slice()))
    }

    /// Load a core file.
    pub fn core_file(&mut self, filename: Option<&str>) -> SessionResult<String> {
        self.execute(&with_args("core-file", filename.as_slice()))
    }

    /// Evaluate and print an expression.
    pub fn print(&mut self, expression: &str) -> SessionResult<String> {
        self.execute(&format!("p {expression}"))
    }

    /// Disassemble `target`, or the current function when `None`.
    pub fn disassemble(&mut self, target: Option<&str>) -> SessionResult<String> {
        self.execute(&with_args("disas", target.as_slice()))
    }

    /// Step over `count` source lines.
    pub fn next(&mut self, count: u32) -> SessionResult<String> {
        self.execute(&format!("next {count}"))
    }

    /// Step over `count` instructions.
    pub fn nexti(&mut self, count: u32) -> SessionResult<String> {
        self.execute(&format!("nexti {count}"))
    }

    /// Step into `count` source lines.
    pub fn step(&mut self, count: u32) -> SessionResult<String> {
        self.execute(&format!("step {count}"))
    }

    /// Step into `count` instructions.
    pub fn stepi(&mut self, count: u32) -> SessionResult<String> {
        self.execute(&format!("stepi {count}"))
    }

    /// Resume the target.
    pub fn continue_execution(&mut self) -> SessionResult<String> {
        self.execute("c")
    }

    /// Toggle the debugger's pending-breakpoint mode and mirror it locally.
    pub fn set_pending_breakpoints(&mut self, enabled: bool) -> SessionResult<String> {
        let state = if enabled { "on" } else { "off" };
        let unit = self.execute(&format!("set breakpoint pending {state}"))?;
        self.set_pending_mode(enabled);
        tracing::info!(enabled, "pending breakpoint mode changed");
        Ok(unit)
    }
}
