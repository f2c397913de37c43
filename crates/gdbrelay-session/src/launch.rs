//! Debugger process bootstrap.

use std::path::PathBuf;

use crate::error::SessionResult;
use crate::session::{Session, SessionOptions};
use crate::transport::ProcessTransport;

/// Default debugger executable.
pub const DEFAULT_DEBUGGER: &str = "gdb";

/// Arguments that suppress init files and the startup banner.
pub const DEFAULT_DEBUGGER_ARGS: [&str; 2] = ["-n", "-q"];

/// What to spawn and how to drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Debugger executable.
    pub debugger: String,
    /// Arguments passed to the debugger itself.
    pub debugger_args: Vec<String>,
    /// Program to load with `file`.
    pub program: Option<PathBuf>,
    /// Arguments for the program, installed with `set args`.
    pub program_args: Vec<String>,
    /// Protocol settings.
    pub session: SessionOptions,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            debugger: DEFAULT_DEBUGGER.to_string(),
            debugger_args: DEFAULT_DEBUGGER_ARGS.iter().map(|a| a.to_string()).collect(),
            program: None,
            program_args: Vec::new(),
            session: SessionOptions::default(),
        }
    }
}

impl Session {
    /// Spawn the debugger and bring it to its first prompt.
    ///
    /// After the banner, loads the program, installs its arguments and turns
    /// on pending breakpoints, each only when configured.
    pub fn launch(options: LaunchOptions) -> SessionResult<Self> {
        let transport = ProcessTransport::spawn(&options.debugger, &options.debugger_args)?;
        let pending = options.session.pending_breakpoints;
        let mut session = Session::new(transport, options.session)?;
        session.bootstrap(options.program, &options.program_args, pending)?;
        Ok(session)
    }

    fn bootstrap(
        &mut self,
        program: Option<PathBuf>,
        program_args: &[String],
        pending: bool,
    ) -> SessionResult<()> {
        self.read_response()?;
        if let Some(program) = program {
            self.file(&program)?;
        }
        if !program_args.is_empty() {
            let args: Vec<&str> = program_args.iter().map(String::as_str).collect();
            self.set_args(&args)?;
        }
        if pending {
            self.set_pending_breakpoints(true)?;
        }
        tracing::info!(prompt = self.prompt(), pending, "session ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::transport::ScriptedTransport;

    #[test]
    fn launch_options_default_to_quiet_gdb() {
        let options = LaunchOptions::default();
        assert_eq!(options.debugger, "gdb");
        assert_eq!(options.debugger_args, vec!["-n", "-q"]);
        assert!(options.program.is_none());
        assert!(options.session.pending_breakpoints);
    }

    #[test]
    fn bootstrap_sends_setup_commands() {
        let transport = ScriptedTransport::new();
        transport.push_output("(gdb) ");
        for _ in 0..3 {
            transport.queue_reply("(gdb) ");
        }
        let mut session = Session::new(transport.clone(), SessionOptions::default())
            .unwrap()
            .with_echo(std::io::sink());

        session
            .bootstrap(
                Some(PathBuf::from("/tmp/demo")),
                &["AAAA".to_string(), "BBBB".to_string()],
                true,
            )
            .unwrap();

        assert_eq!(
            transport.commands(),
            vec![
                "file /tmp/demo",
                "set args AAAA BBBB",
                "set breakpoint pending on"
            ]
        );
    }

    #[test]
    fn bootstrap_minimal() {
        let transport = ScriptedTransport::new();
        transport.push_output("(gdb) ");
        let mut session = Session::new(transport.clone(), SessionOptions::default())
            .unwrap()
            .with_echo(std::io::sink());

        session.bootstrap(None, &[], false).unwrap();
        assert!(transport.written().is_empty());
    }

    #[test]
    fn launch_missing_debugger_fails_to_spawn() {
        let options = LaunchOptions {
            debugger: "/nonexistent/gdbrelay-gdb".into(),
            ..LaunchOptions::default()
        };
        let err = Session::launch(options).unwrap_err();
        assert!(err.to_string().contains("debugger failed to start"));
    }
}
