//! Byte transport to the debugger console.
//!
//! The debugger's standard error is merged into the same pipe as its
//! standard output, so diagnostics arrive in order with normal output.
//!
//! The debugger's own exit is what ends the console. A background process it
//! leaves behind may still hold the pipe open, so the reader polls with a
//! timeout and checks the child between waits rather than waiting for EOF.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, ErrorKind, PipeReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::rc::Rc;
#[cfg(unix)]
use std::os::fd::AsFd;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::{SessionError, SessionResult};

/// Trait abstracting the debugger console for testability.
pub trait Transport: std::fmt::Debug {
    /// Write raw command bytes. The caller supplies the line terminator.
    fn write(&mut self, data: &[u8]) -> SessionResult<()>;

    /// Block until one byte of console output is available.
    ///
    /// Fails with [`SessionError::ProcessTerminated`] once the console is
    /// closed instead of blocking forever.
    fn read_byte(&mut self) -> SessionResult<u8>;
}

/// Milliseconds one wait for console output lasts before the child is checked.
#[cfg(unix)]
const EXIT_CHECK_INTERVAL_MS: u16 = 100;

/// A transport backed by a spawned child process.
#[derive(Debug)]
pub struct ProcessTransport {
    child: Child,
    stdin: ChildStdin,
    output: BufReader<PipeReader>,
}

impl ProcessTransport {
    /// Spawn `program` with `args`, piping stdin and merging stderr into
    /// stdout.
    ///
    /// The child runs in its own process group so a terminal interrupt aimed
    /// at the caller does not reach it.
    pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = program.as_ref();
        let spawn_failed = |source: std::io::Error| SessionError::SpawnFailed {
            program: program.to_string_lossy().into_owned(),
            source,
        };

        let (reader, writer) = std::io::pipe().map_err(spawn_failed)?;
        let stderr_writer = writer.try_clone().map_err(spawn_failed)?;

        let mut child = {
            let mut command = Command::new(program);
            command
                .args(args)
                .stdin(Stdio::piped())
                .stdout(writer)
                .stderr(stderr_writer);
            #[cfg(unix)]
            {
                use std::os::unix::process::CommandExt;
                command.process_group(0);
            }
            // `command` owns the parent's copies of the write end; it must be
            // dropped after spawning or the pipe never reports EOF.
            command.spawn().map_err(spawn_failed)?
        };

        let stdin = child.stdin.take().ok_or_else(|| SessionError::SpawnFailed {
            program: program.to_string_lossy().into_owned(),
            source: std::io::Error::other("could not capture stdin"),
        })?;

        tracing::info!(program = %program.to_string_lossy(), pid = child.id(), "debugger spawned");

        Ok(Self {
            child,
            stdin,
            output: BufReader::new(reader),
        })
    }

    fn terminated(&mut self) -> SessionError {
        let status = self
            .child
            .try_wait()
            .ok()
            .flatten()
            .and_then(|status| status.code());
        SessionError::ProcessTerminated { status }
    }

    /// Wait until the pipe is readable or the debugger has exited.
    #[cfg(unix)]
    fn wait_readable(&mut self) -> SessionResult<()> {
        let interval = PollTimeout::from(EXIT_CHECK_INTERVAL_MS);
        loop {
            if self.poll_readable(interval)? {
                return Ok(());
            }
            match self.child.try_wait() {
                Ok(None) => continue,
                Ok(Some(status)) => {
                    // Output written just before exit is still worth reading.
                    if self.poll_readable(PollTimeout::ZERO)? {
                        return Ok(());
                    }
                    tracing::debug!(?status, "debugger exited with the console still open");
                    return Err(SessionError::ProcessTerminated {
                        status: status.code(),
                    });
                }
                Err(e) => return Err(SessionError::Io(e.to_string())),
            }
        }
    }

    /// True once a read would not block: data is pending or every writer
    /// has closed.
    #[cfg(unix)]
    fn poll_readable(&self, timeout: PollTimeout) -> SessionResult<bool> {
        loop {
            let mut fds = [PollFd::new(self.output.get_ref().as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, timeout) {
                Ok(0) => return Ok(false),
                Ok(_) => return Ok(true),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(SessionError::Io(e.to_string())),
            }
        }
    }
}

impl Transport for ProcessTransport {
    fn write(&mut self, data: &[u8]) -> SessionResult<()> {
        let result = self
            .stdin
            .write_all(data)
            .and_then(|()| self.stdin.flush());
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Err(self.terminated()),
            Err(e) => Err(SessionError::Io(e.to_string())),
        }
    }

    fn read_byte(&mut self) -> SessionResult<u8> {
        #[cfg(unix)]
        if self.output.buffer().is_empty() {
            self.wait_readable()?;
        }
        loop {
            let available = match self.output.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SessionError::Io(e.to_string())),
            };
            // An empty read is the only sign of peer closure the pipe gives.
            return match available {
                Some(byte) => {
                    self.output.consume(1);
                    Ok(byte)
                }
                None => Err(self.terminated()),
            };
        }
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

#[derive(Debug, Default)]
struct Script {
    written: Vec<u8>,
    pending: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
}

/// An in-memory transport that replays canned debugger output.
///
/// Each queued reply is released to the reader when the next write arrives,
/// imitating a debugger that answers one command at a time. Clones share
/// the same script, so a test can keep a handle after moving one into a
/// session. Reading with nothing left to release reports
/// [`SessionError::ProcessTerminated`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `data` readable immediately, without waiting for a write.
    pub fn push_output(&self, data: &str) {
        self.script
            .borrow_mut()
            .pending
            .extend(data.as_bytes().iter().copied());
    }

    /// Make raw `data` readable immediately. Unlike [`push_output`] the
    /// bytes need not be UTF-8.
    ///
    /// [`push_output`]: ScriptedTransport::push_output
    pub fn push_bytes(&self, data: &[u8]) {
        self.script.borrow_mut().pending.extend(data.iter().copied());
    }

    /// Queue `data` as the answer to the next unanswered write.
    pub fn queue_reply(&self, data: &str) {
        self.script
            .borrow_mut()
            .replies
            .push_back(data.as_bytes().to_vec());
    }

    /// Everything written so far, decoded lossily.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.script.borrow().written).into_owned()
    }

    /// Written data split into commands, one per line.
    pub fn commands(&self) -> Vec<String> {
        self.written().lines().map(str::to_string).collect()
    }

    /// Bytes released to the reader but not yet consumed.
    pub fn unread(&self) -> usize {
        self.script.borrow().pending.len()
    }
}

impl Transport for ScriptedTransport {
    fn write(&mut self, data: &[u8]) -> SessionResult<()> {
        let mut script = self.script.borrow_mut();
        script.written.extend_from_slice(data);
        if let Some(reply) = script.replies.pop_front() {
            script.pending.extend(reply);
        }
        Ok(())
    }

    fn read_byte(&mut self) -> SessionResult<u8> {
        self.script
            .borrow_mut()
            .pending
            .pop_front()
            .ok_or(SessionError::ProcessTerminated { status: None })
    }
}
