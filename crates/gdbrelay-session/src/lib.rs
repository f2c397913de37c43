//! gdbrelay-session: GDB console session engine.
//!
//! This crate drives a debugger through its human-oriented text console.
//! It frames replies at the prompt, classifies breakpoint hits and signal
//! reports, and dispatches them to registered handlers while presenting a
//! synchronous command/response interface.

pub mod ack;
pub mod breakpoint;
pub mod classify;
pub mod commands;
pub mod error;
pub mod framer;
pub mod inspect;
pub mod interactive;
pub mod launch;
pub mod registry;
pub mod session;
pub mod signal;
pub mod transport;

// Re-export key types for convenience.
pub use ack::{AckParser, BreakpointAck};
pub use breakpoint::BreakpointControl;
pub use classify::{Classification, ClassificationMiss, Classifier, Event, MissReason};
pub use error::{SessionError, SessionResult};
pub use framer::{Framer, DEFAULT_PROMPT};
pub use inspect::{Register, RegisterSet, StackWord};
pub use interactive::{ConsoleInput, PassThroughExit};
pub use launch::LaunchOptions;
pub use registry::{Breakpoint, BreakpointHandler, Registry, SignalHandler};
pub use session::{Session, SessionOptions, Verbosity};
pub use signal::{Signal, UnknownSignal};
pub use transport::{ProcessTransport, ScriptedTransport, Transport};
