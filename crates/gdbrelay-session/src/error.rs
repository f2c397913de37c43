//! Session error types.

use thiserror::Error;

/// Errors from driving a debugger session.
///
/// Framing failures (`ProcessTerminated`, `Io`) end the session. The
/// remaining variants are local to one command and leave the session usable.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Debugger process failed to start.
    #[error("debugger failed to start: {program}: {source}")]
    SpawnFailed {
        /// The executable that could not be started.
        program: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The debugger process exited or closed its console.
    #[error("debugger process terminated ({})", describe_status(.status))]
    ProcessTerminated {
        /// Exit code, when the process has already been reaped.
        status: Option<i32>,
    },

    /// The prompt sentinel is empty, so no response could ever be framed.
    #[error("prompt sentinel must not be empty")]
    EmptyPrompt,

    /// Any other transport I/O failure.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// A breakpoint location matched neither acknowledgement grammar.
    #[error("breakpoint location could not be resolved: {0}")]
    UnresolvedLocation(String),

    /// Architecture output matched none of the expected grammars.
    #[error("unrecognized architecture output: {0}")]
    UnrecognizedArchitecture(String),
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "exit status unknown".to_string(),
    }
}
