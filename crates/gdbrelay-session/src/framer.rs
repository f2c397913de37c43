//! Prompt-delimited response framing.
//!
//! The debugger console has no length prefix or end-of-response marker. The
//! only reliable boundary is the prompt it prints before accepting the next
//! command, so a response unit is everything read up to and including the
//! next occurrence of the prompt sentinel.
//!
//! Known limitations:
//! - If the debugged program prints the exact sentinel on the shared
//!   console, framing ends early and later responses are shifted.
//! - [`Framer::read_until_prompt`] decodes lossily, so bytes that are not
//!   UTF-8 (raw payloads echoed by the inferior) come back as U+FFFD. Use
//!   [`Framer::read_raw_until_prompt`] when the exact bytes matter.

use crate::error::{SessionError, SessionResult};
use crate::transport::Transport;

/// The conventional GDB prompt.
pub const DEFAULT_PROMPT: &str = "(gdb) ";

/// Splits console output into response units at the prompt sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framer {
    prompt: String,
}

impl Framer {
    /// Create a framer that stops at `prompt`.
    ///
    /// An empty prompt would end every unit before reading anything, so it
    /// is rejected with [`SessionError::EmptyPrompt`].
    pub fn new(prompt: impl Into<String>) -> SessionResult<Self> {
        let prompt = prompt.into();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        Ok(Self { prompt })
    }

    /// The prompt sentinel, as text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Read one byte at a time until the accumulated output ends with the
    /// prompt. Returns the whole unit, sentinel included.
    ///
    /// Matching is a suffix check per byte, so the sentinel is never
    /// detected in the middle of the unit and no line structure is assumed.
    pub fn read_until_prompt(&self, transport: &mut dyn Transport) -> SessionResult<String> {
        let unit = self.read_raw_until_prompt(transport)?;
        Ok(String::from_utf8_lossy(&unit).into_owned())
    }

    /// Like [`Framer::read_until_prompt`] but returns the bytes verbatim.
    pub fn read_raw_until_prompt(&self, transport: &mut dyn Transport) -> SessionResult<Vec<u8>> {
        let mut unit = Vec::with_capacity(256);
        while !unit.ends_with(self.prompt.as_bytes()) {
            unit.push(transport.read_byte()?);
        }
        Ok(unit)
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}
