use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose, includes every framed unit.
    Trace,
    /// Commands sent and events dispatched.
    Debug,
    /// Lifecycle messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// How the debugger process is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggerConfig {
    /// Executable name or path.
    #[serde(default = "default_debugger_path")]
    pub path: String,
    /// Arguments passed before anything else.
    #[serde(default = "default_debugger_args")]
    pub args: Vec<String>,
    /// Prompt sentinel the debugger prints.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_debugger_path() -> String {
    "gdb".to_string()
}

fn default_debugger_args() -> Vec<String> {
    vec!["-n".to_string(), "-q".to_string()]
}

fn default_prompt() -> String {
    "(gdb) ".to_string()
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            path: default_debugger_path(),
            args: default_debugger_args(),
            prompt: default_prompt(),
        }
    }
}

/// Session protocol settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Transcript echo level: 0 silent, 1 responses, 2 full transcript.
    #[serde(default)]
    pub verbosity: u8,
    /// Accept breakpoints on locations that are not loaded yet.
    #[serde(default = "default_true")]
    pub pending_breakpoints: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            pending_breakpoints: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log verbosity level.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional path to a log file.
    pub file: Option<PathBuf>,
}

/// Top-level gdbrelay configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Debugger process settings.
    #[serde(default)]
    pub debugger: DebuggerConfig,
    /// Session protocol settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}
