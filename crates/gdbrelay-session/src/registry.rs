//! Breakpoint registry and signal handler table.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::classify::Event;
use crate::session::Session;
use crate::signal::Signal;

/// Receives breakpoint hit notifications.
///
/// Handlers run synchronously inside the `execute` call whose response
/// announced the hit, after framing has finished, so they may issue further
/// commands on the session.
pub trait BreakpointHandler {
    /// Called with the breakpoint id, stop address and location description.
    fn on_hit(&mut self, session: &mut Session, id: &str, address: &str, context: &str);
}

impl<F> BreakpointHandler for F
where
    F: FnMut(&mut Session, &str, &str, &str),
{
    fn on_hit(&mut self, session: &mut Session, id: &str, address: &str, context: &str) {
        self(session, id, address, context)
    }
}

/// Receives signal notifications.
pub trait SignalHandler {
    /// Called with the signal, stop address and location description.
    fn on_signal(&mut self, session: &mut Session, signal: Signal, address: &str, context: &str);
}

impl<F> SignalHandler for F
where
    F: FnMut(&mut Session, Signal, &str, &str),
{
    fn on_signal(&mut self, session: &mut Session, signal: Signal, address: &str, context: &str) {
        self(session, signal, address, context)
    }
}

/// A location-triggered stop point created through the session.
pub struct Breakpoint {
    id: String,
    address: Option<String>,
    handler: Option<Box<dyn BreakpointHandler>>,
    has_handler: bool,
    deleted: bool,
}

impl Breakpoint {
    /// Create a breakpoint record. `address` is `None` while pending.
    pub fn new(
        id: impl Into<String>,
        address: Option<String>,
        handler: Option<Box<dyn BreakpointHandler>>,
    ) -> Self {
        let has_handler = handler.is_some();
        Self {
            id: id.into(),
            address,
            handler,
            has_handler,
            deleted: false,
        }
    }

    /// Debugger-assigned identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved address, or `None` for a pending breakpoint.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Whether the debugger has not yet bound this breakpoint to code.
    pub fn is_pending(&self) -> bool {
        self.address.is_none()
    }

    /// Whether a hit handler was registered.
    pub fn has_handler(&self) -> bool {
        self.has_handler
    }

    /// Whether `delete` has been sent for this breakpoint.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breakpoint")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("has_handler", &self.has_handler)
            .field("deleted", &self.deleted)
            .finish()
    }
}

/// Live breakpoints keyed by id, plus one handler per signal kind.
#[derive(Default)]
pub struct Registry {
    breakpoints: HashMap<String, Breakpoint>,
    signal_handlers: HashMap<Signal, Box<dyn SignalHandler>>,
    // Handlers currently taken out for dispatch.
    breakpoints_in_flight: HashSet<String>,
    signals_in_flight: HashSet<Signal>,
    highest_id: Option<u64>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a breakpoint, keyed by its id.
    ///
    /// The debugger never reuses ids within a session; a repeated or
    /// decreasing id is logged and the new record replaces the old one.
    pub fn insert(&mut self, breakpoint: Breakpoint) {
        if let Ok(number) = breakpoint.id.parse::<u64>() {
            if self.highest_id.is_some_and(|highest| number <= highest) {
                tracing::warn!(
                    id = %breakpoint.id,
                    "debugger reported a breakpoint id that is not newer than the last one"
                );
            }
            self.highest_id = Some(self.highest_id.map_or(number, |h| h.max(number)));
        }
        self.breakpoints.insert(breakpoint.id.clone(), breakpoint);
    }

    /// Look up a breakpoint by id.
    pub fn get(&self, id: &str) -> Option<&Breakpoint> {
        self.breakpoints.get(id)
    }

    /// Number of breakpoints ever registered, deleted ones included.
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Returns `true` when no breakpoint has been registered.
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// All breakpoints ordered by numeric id.
    pub fn breakpoints(&self) -> Vec<&Breakpoint> {
        let mut all: Vec<&Breakpoint> = self.breakpoints.values().collect();
        all.sort_by_key(|bp| (bp.id.parse::<u64>().unwrap_or(u64::MAX), bp.id.clone()));
        all
    }

    /// Mark a breakpoint deleted. Returns `false` when the id is unknown.
    pub fn mark_deleted(&mut self, id: &str) -> bool {
        match self.breakpoints.get_mut(id) {
            Some(bp) => {
                bp.deleted = true;
                true
            }
            None => false,
        }
    }

    /// Install the handler for `signal`, replacing any previous one.
    pub fn set_signal_handler(&mut self, signal: Signal, handler: Box<dyn SignalHandler>) {
        self.signal_handlers.insert(signal, handler);
    }

    /// Remove the handler for `signal`. Returns `true` if one was installed.
    pub fn clear_signal_handler(&mut self, signal: Signal) -> bool {
        let installed = self.signal_handlers.remove(&signal).is_some();
        installed | self.signals_in_flight.remove(&signal)
    }

    /// Whether a handler is installed for `signal`.
    pub fn has_signal_handler(&self, signal: Signal) -> bool {
        self.signal_handlers.contains_key(&signal)
    }

    /// Detach the hit handler of a live breakpoint for the duration of a
    /// call. Deleted or unknown breakpoints yield `None`.
    pub(crate) fn take_breakpoint_handler(
        &mut self,
        id: &str,
    ) -> Option<Box<dyn BreakpointHandler>> {
        let handler = self
            .breakpoints
            .get_mut(id)
            .filter(|bp| !bp.deleted)
            .and_then(|bp| bp.handler.take())?;
        self.breakpoints_in_flight.insert(id.to_string());
        Some(handler)
    }

    pub(crate) fn restore_breakpoint_handler(
        &mut self,
        id: &str,
        handler: Box<dyn BreakpointHandler>,
    ) {
        self.breakpoints_in_flight.remove(id);
        if let Some(bp) = self.breakpoints.get_mut(id) {
            if bp.handler.is_none() {
                bp.handler = Some(handler);
            }
        }
    }

    pub(crate) fn take_signal_handler(&mut self, signal: Signal) -> Option<Box<dyn SignalHandler>> {
        let handler = self.signal_handlers.remove(&signal)?;
        self.signals_in_flight.insert(signal);
        Some(handler)
    }

    /// Put a handler back unless it was cleared or replaced while it was
    /// running.
    pub(crate) fn restore_signal_handler(&mut self, signal: Signal, handler: Box<dyn SignalHandler>) {
        if self.signals_in_flight.remove(&signal) {
            self.signal_handlers.entry(signal).or_insert(handler);
        }
    }
}

impl Registry {
    /// Whether the handler `event` targets is running right now.
    pub(crate) fn is_dispatching(&self, event: &Event) -> bool {
        match event {
            Event::BreakpointHit { id, .. } => self.breakpoints_in_flight.contains(id),
            Event::SignalTrapped { signal, .. } => self.signals_in_flight.contains(signal),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut signals: Vec<&Signal> = self.signal_handlers.keys().collect();
        signals.sort();
        f.debug_struct("Registry")
            .field("breakpoints", &self.breakpoints())
            .field("signal_handlers", &signals)
            .finish()
    }
}
