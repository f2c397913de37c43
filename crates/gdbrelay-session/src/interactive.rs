//! Interactive pass-through.
//!
//! Lines typed by the user are forwarded to the debugger verbatim and every
//! reply is echoed in full. Breakpoint and signal handlers keep firing while
//! the user drives the console.

use std::sync::mpsc::Receiver;

use crate::error::SessionResult;
use crate::session::{Session, Verbosity};

/// Banner shown when pass-through starts.
pub const PASS_THROUGH_BANNER: &str = "[+] Entering GDB, press CTRL+D to return...";

/// One item of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// A line without its terminator.
    Line(String),
    /// The input stream reached end of file.
    Eof,
    /// The user pressed the interrupt key.
    Interrupt,
}

/// Why pass-through returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughExit {
    /// End of input, or the input source went away.
    Eof,
    /// Interrupted by the user.
    Interrupted,
}

impl Session {
    /// Hand the console to the user until end of input or an interrupt.
    ///
    /// Verbosity is raised to full transcript for the duration and restored
    /// afterwards, also when the debugger dies mid-session.
    pub fn interact(&mut self, input: &Receiver<ConsoleInput>) -> SessionResult<PassThroughExit> {
        let saved = self.verbosity();
        self.set_verbosity(Verbosity::Transcript);
        self.interactive = true;
        tracing::info!("entering pass-through");

        let result = self.pass_through(input);

        self.interactive = false;
        self.set_verbosity(saved);
        tracing::info!(?result, "leaving pass-through");
        result
    }

    fn pass_through(&mut self, input: &Receiver<ConsoleInput>) -> SessionResult<PassThroughExit> {
        let banner = format!("{PASS_THROUGH_BANNER}\n{}", self.prompt());
        self.echo(&banner);

        loop {
            match input.recv() {
                Ok(ConsoleInput::Line(line)) => {
                    self.write_line(&line)?;
                    self.read_response()?;
                }
                Ok(ConsoleInput::Interrupt) => {
                    self.echo("\n");
                    return Ok(PassThroughExit::Interrupted);
                }
                Ok(ConsoleInput::Eof) | Err(_) => {
                    self.echo("\n");
                    return Ok(PassThroughExit::Eof);
                }
            }
        }
    }
}
