//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{bail, Result};
use gdbrelay_config::Config;
use gdbrelay_session::{LaunchOptions, SessionOptions, Verbosity};

pub const USAGE: &str = "usage: gdbrelay [-v|-vv] [--no-pending] [PROGRAM [ARGS...]]";

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cli {
    /// Verbosity from `-v` flags, overriding the config when present.
    pub verbosity: Option<u8>,
    /// `--no-pending` was given.
    pub no_pending: bool,
    /// `-h` / `--help` was given.
    pub help: bool,
    pub program: Option<PathBuf>,
    pub program_args: Vec<String>,
}

impl Cli {
    /// Parse arguments, excluding the executable name.
    ///
    /// Options are only recognised before the program; everything after it
    /// belongs to the program.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Cli::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-v" => cli.verbosity = Some(cli.verbosity.unwrap_or(0).saturating_add(1)),
                "-vv" => cli.verbosity = Some(2),
                "--no-pending" => cli.no_pending = true,
                "-h" | "--help" => cli.help = true,
                "--" => {
                    cli.program = args.next().map(PathBuf::from);
                    cli.program_args = args.collect();
                    break;
                }
                flag if flag.starts_with('-') => bail!("unknown option: {flag}\n{USAGE}"),
                _ => {
                    cli.program = Some(PathBuf::from(arg));
                    cli.program_args = args.collect();
                    break;
                }
            }
        }
        Ok(cli)
    }

    /// Combine the command line with the loaded configuration.
    pub fn launch_options(&self, config: &Config) -> LaunchOptions {
        let level = self.verbosity.unwrap_or(config.session.verbosity);
        LaunchOptions {
            debugger: config.debugger.path.clone(),
            debugger_args: config.debugger.args.clone(),
            program: self.program.clone(),
            program_args: self.program_args.clone(),
            session: SessionOptions {
                prompt: config.debugger.prompt.clone(),
                verbosity: Verbosity::from_level(level),
                pending_breakpoints: config.session.pending_breakpoints && !self.no_pending,
            },
        }
    }
}
