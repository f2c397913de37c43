//! The session façade.
//!
//! A [`Session`] owns the debugger console exclusively and runs one command
//! at a time: write the command, frame the reply at the next prompt,
//! classify it, dispatch the resulting events, and hand the raw text back.
//! Sessions are not reentrant and must be driven from a single thread.

use std::collections::VecDeque;
use std::io::Write;

use crate::ack::{first_line, AckParser, BreakpointAck};
use crate::breakpoint::BreakpointControl;
use crate::classify::{Classifier, Event};
use crate::error::{SessionError, SessionResult};
use crate::framer::{Framer, DEFAULT_PROMPT};
use crate::registry::{Breakpoint, BreakpointHandler, Registry, SignalHandler};
use crate::signal::Signal;
use crate::transport::Transport;

/// How much of the transcript is echoed to the session's echo sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Echo nothing.
    #[default]
    Silent,
    /// Echo every response unit.
    Responses,
    /// Echo commands as well as responses.
    Transcript,
}

impl Verbosity {
    /// Map a numeric level (0, 1, 2) to a verbosity. Levels above 2 clamp.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Responses,
            _ => Verbosity::Transcript,
        }
    }

    /// The numeric level.
    pub fn level(self) -> u8 {
        match self {
            Verbosity::Silent => 0,
            Verbosity::Responses => 1,
            Verbosity::Transcript => 2,
        }
    }
}

/// Protocol settings for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Prompt sentinel that ends every response unit.
    pub prompt: String,
    /// Transcript echo level.
    pub verbosity: Verbosity,
    /// Accept pending breakpoints instead of failing.
    pub pending_breakpoints: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            verbosity: Verbosity::Silent,
            pending_breakpoints: true,
        }
    }
}

/// A debugger console driven one command at a time.
pub struct Session {
    transport: Box<dyn Transport>,
    framer: Framer,
    classifier: Classifier,
    acks: AckParser,
    registry: Registry,
    verbosity: Verbosity,
    pending_breakpoints: bool,
    pub(crate) interactive: bool,
    echo: Box<dyn Write>,
    // Events announced while their own handler was running.
    deferred: VecDeque<Event>,
    dispatch_depth: usize,
}

impl Session {
    /// Wrap an already-running debugger console.
    ///
    /// No output is consumed; call [`Session::read_response`] first if the
    /// debugger prints a banner before its first prompt. Fails with
    /// [`SessionError::EmptyPrompt`] when the prompt is empty.
    pub fn new(transport: impl Transport + 'static, options: SessionOptions) -> SessionResult<Self> {
        Ok(Self {
            transport: Box::new(transport),
            framer: Framer::new(options.prompt)?,
            classifier: Classifier::new(),
            acks: AckParser::new(),
            registry: Registry::new(),
            verbosity: options.verbosity,
            pending_breakpoints: options.pending_breakpoints,
            interactive: false,
            echo: Box::new(std::io::stdout()),
            deferred: VecDeque::new(),
            dispatch_depth: 0,
        })
    }

    /// Redirect the transcript echo (stdout by default).
    pub fn with_echo(mut self, sink: impl Write + 'static) -> Self {
        self.echo = Box::new(sink);
        self
    }

    /// The prompt sentinel.
    pub fn prompt(&self) -> &str {
        self.framer.prompt()
    }

    /// Current echo level.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Change the echo level.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// Whether pending breakpoints are accepted.
    pub fn pending_breakpoints(&self) -> bool {
        self.pending_breakpoints
    }

    /// Whether pass-through mode is active.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// The breakpoint registry and signal handler table.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn acks(&self) -> &AckParser {
        &self.acks
    }

    pub(crate) fn set_pending_mode(&mut self, enabled: bool) {
        self.pending_breakpoints = enabled;
    }

    pub(crate) fn mark_breakpoint_deleted(&mut self, id: &str) {
        if !self.registry.mark_deleted(id) {
            tracing::warn!(%id, "deleted breakpoint missing from registry");
        }
    }

    /// Send one command and return its response unit verbatim, prompt
    /// included. Events announced in the response are dispatched to their
    /// handlers before this returns.
    pub fn execute(&mut self, command: &str) -> SessionResult<String> {
        tracing::debug!(command, "sending command");
        if self.verbosity >= Verbosity::Transcript {
            self.echo(&format!("{command}\n"));
        }
        self.write_line(command)?;
        self.read_response()
    }

    /// Write `line` plus a terminator without reading the reply.
    pub(crate) fn write_line(&mut self, line: &str) -> SessionResult<()> {
        self.transport.write(format!("{line}\n").as_bytes())
    }

    /// Frame the next response unit, classify and dispatch it.
    pub fn read_response(&mut self) -> SessionResult<String> {
        let unit = self.framer.read_until_prompt(self.transport.as_mut())?;
        tracing::debug!(bytes = unit.len(), "response unit framed");
        if self.verbosity >= Verbosity::Responses {
            self.echo(&unit);
        }

        let classification = self.classifier.classify(&unit);
        for miss in &classification.misses {
            tracing::debug!(line = %miss.line, reason = ?miss.reason, "classification miss");
        }
        for event in classification.events {
            self.dispatch(event);
        }
        Ok(unit)
    }

    pub(crate) fn echo(&mut self, text: &str) {
        let result = self
            .echo
            .write_all(text.as_bytes())
            .and_then(|()| self.echo.flush());
        if let Err(e) = result {
            tracing::warn!("failed to echo transcript: {e}");
        }
    }

    /// Route one event to its handler. Unknown breakpoints and signals
    /// without a handler are dropped.
    ///
    /// An event whose handler is still running is queued, as is everything
    /// announced after it, and delivered in order once the outermost handler
    /// returns. A handler that resumes onto its own breakpoint therefore sees
    /// every hit exactly once and is never re-entered.
    fn dispatch(&mut self, event: Event) {
        if !self.deferred.is_empty() || self.registry.is_dispatching(&event) {
            tracing::debug!(?event, "deferring event until its handler returns");
            self.deferred.push_back(event);
            return;
        }
        self.deliver(event);
        if self.dispatch_depth == 0 {
            while let Some(event) = self.deferred.pop_front() {
                self.deliver(event);
            }
        }
    }

    fn deliver(&mut self, event: Event) {
        self.dispatch_depth += 1;
        match event {
            Event::BreakpointHit {
                id,
                address,
                context,
            } => match self.registry.take_breakpoint_handler(&id) {
                Some(mut handler) => {
                    tracing::debug!(%id, %address, "dispatching breakpoint hit");
                    handler.on_hit(self, &id, &address, &context);
                    self.registry.restore_breakpoint_handler(&id, handler);
                }
                None => tracing::debug!(%id, %address, "breakpoint hit without handler"),
            },
            Event::SignalTrapped {
                signal,
                address,
                context,
            } => match self.registry.take_signal_handler(signal) {
                Some(mut handler) => {
                    tracing::debug!(%signal, %address, "dispatching signal");
                    handler.on_signal(self, signal, &address, &context);
                    self.registry.restore_signal_handler(signal, handler);
                }
                None => tracing::debug!(%signal, %address, "signal without handler"),
            },
        }
        self.dispatch_depth -= 1;
    }

    /// Set a breakpoint at `location` with no hit handler.
    pub fn set_breakpoint(&mut self, location: &str) -> SessionResult<BreakpointControl<'_>> {
        self.create_breakpoint(location, None)
    }

    /// Set a breakpoint at `location` whose hits are reported to `handler`.
    pub fn set_breakpoint_with(
        &mut self,
        location: &str,
        handler: impl BreakpointHandler + 'static,
    ) -> SessionResult<BreakpointControl<'_>> {
        self.create_breakpoint(location, Some(Box::new(handler)))
    }

    fn create_breakpoint(
        &mut self,
        location: &str,
        handler: Option<Box<dyn BreakpointHandler>>,
    ) -> SessionResult<BreakpointControl<'_>> {
        let unit = self.execute(&format!("b {location}"))?;
        let (id, address) = match self.acks.breakpoint(&unit) {
            Some(BreakpointAck::Resolved { id, address }) => (id, Some(address)),
            Some(BreakpointAck::Pending { id }) if self.pending_breakpoints => (id, None),
            _ => return Err(SessionError::UnresolvedLocation(first_line(&unit))),
        };

        tracing::debug!(%id, ?address, location, "breakpoint registered");
        self.registry
            .insert(Breakpoint::new(id.clone(), address, handler));
        Ok(BreakpointControl::new(self, id))
    }

    /// Look up a breakpoint created through this session.
    pub fn get_breakpoint(&self, id: &str) -> Option<&Breakpoint> {
        self.registry.get(id)
    }

    /// Control handle for a registered breakpoint.
    pub fn breakpoint_mut(&mut self, id: &str) -> Option<BreakpointControl<'_>> {
        self.registry.get(id)?;
        Some(BreakpointControl::new(self, id.to_string()))
    }

    /// Install the handler for `signal`, replacing any previous one.
    pub fn set_signal_handler(&mut self, signal: Signal, handler: impl SignalHandler + 'static) {
        self.registry.set_signal_handler(signal, Box::new(handler));
    }

    /// Remove the handler for `signal`.
    pub fn clear_signal_handler(&mut self, signal: Signal) -> bool {
        self.registry.clear_signal_handler(signal)
    }

    /// Quit the debugger and wait for its console to close.
    pub fn close(mut self) -> SessionResult<()> {
        self.execute("set confirm off")?;
        self.write_line("quit")?;
        loop {
            match self.transport.read_byte() {
                Ok(_) => {}
                Err(SessionError::ProcessTerminated { status }) => {
                    tracing::info!(?status, "debugger exited");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("prompt", &self.framer.prompt())
            .field("registry", &self.registry)
            .field("verbosity", &self.verbosity)
            .field("pending_breakpoints", &self.pending_breakpoints)
            .field("interactive", &self.interactive)
            .finish()
    }
}
