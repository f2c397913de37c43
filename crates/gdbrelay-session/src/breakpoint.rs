//! Breakpoint control operations.
//!
//! Every operation is a debugger round-trip; nothing about a breakpoint
//! changes locally without one.

use crate::error::SessionResult;
use crate::session::Session;

/// A borrowed handle for controlling one registered breakpoint.
///
/// The handle delegates to the session it borrows and cannot outlive it.
#[derive(Debug)]
pub struct BreakpointControl<'s> {
    session: &'s mut Session,
    id: String,
}

impl<'s> BreakpointControl<'s> {
    pub(crate) fn new(session: &'s mut Session, id: String) -> Self {
        Self { session, id }
    }

    /// Debugger-assigned identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved address, `None` while pending.
    pub fn address(&self) -> Option<&str> {
        self.session
            .get_breakpoint(&self.id)
            .and_then(|bp| bp.address())
    }

    /// Whether `delete` has been sent.
    pub fn is_deleted(&self) -> bool {
        self.session
            .get_breakpoint(&self.id)
            .is_some_and(|bp| bp.is_deleted())
    }

    /// Skip the next `count` crossings. Sends `ignore <id> <count>`.
    pub fn ignore(&mut self, count: u32) -> SessionResult<String> {
        self.session.execute(&format!("ignore {} {count}", self.id))
    }

    /// Sends `enable <id>`.
    pub fn enable(&mut self) -> SessionResult<String> {
        self.session.execute(&format!("enable {}", self.id))
    }

    /// Sends `disable <id>`.
    pub fn disable(&mut self) -> SessionResult<String> {
        self.session.execute(&format!("disable {}", self.id))
    }

    /// Sends `delete <id>`. The registry entry stays, marked deleted, and
    /// no longer receives hits.
    pub fn delete(&mut self) -> SessionResult<String> {
        let unit = self.session.execute(&format!("delete {}", self.id))?;
        self.session.mark_breakpoint_deleted(&self.id);
        Ok(unit)
    }
}
