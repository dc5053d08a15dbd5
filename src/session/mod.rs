//! Interactive guestfish sessions.
//!
//! A [`Session`] owns one guestfish child process. Commands go to its stdin
//! one line at a time; a reader thread forwards stdout lines over a channel so
//! the one response the protocol needs can be awaited with a deadline.
//!
//! Per source image the session moves strictly forward:
//!
//! ```text
//! (no session) -> SessionOpen -> DeviceDiscovered -> Prepared -> Emitted -> Closed
//!                      |               |
//!                      +-------+-------+
//!                              v
//!                           Aborted
//! ```
//!
//! Dropping a session that was not closed kills and reaps the child.

pub mod discovery;
pub mod emit;
pub mod prepare;

pub use discovery::discover_root;
pub use emit::{emit, tar_out_command};
pub use prepare::{prepare, DEVICE_BATCH};

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TarballError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SessionOpen,
    DeviceDiscovered,
    Prepared,
    Emitted,
    Closed,
    Aborted,
}

/// One event read from guestfish's stdout.
#[derive(Debug)]
pub enum Response {
    /// A line as read, including its terminator if one was present.
    Line(String),
    Eof,
    Failed(io::Error),
}

pub struct Session {
    binary: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    responses: Receiver<Response>,
    state: SessionState,
}

impl Session {
    /// Spawn `binary` with piped stdin/stdout. stderr is inherited.
    pub fn open(binary: &Path) -> Result<Self> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| TarballError::Spawn {
                binary: binary.to_path_buf(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TarballError::Spawn {
                    binary: binary.to_path_buf(),
                    source: io::Error::other("failed to capture guestfish stdio"),
                });
            }
        };

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_responses(stdout, tx));

        debug!(binary = %binary.display(), pid = child.id(), "guestfish session opened");

        Ok(Self {
            binary: binary.to_path_buf(),
            child,
            stdin: Some(stdin),
            responses: rx,
            state: SessionState::SessionOpen,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Write one command line. No acknowledgement is expected.
    pub fn send(&mut self, command: &str) -> Result<()> {
        debug!(command, "guestfish <");
        let stdin = self.stdin_mut()?;
        writeln!(stdin, "{}", command)?;
        stdin.flush()?;
        Ok(())
    }

    /// Write a block of newline-terminated commands as a single write.
    pub fn send_batch(&mut self, batch: &str) -> Result<()> {
        for command in batch.lines() {
            debug!(command, "guestfish <");
        }
        let stdin = self.stdin_mut()?;
        stdin.write_all(batch.as_bytes())?;
        stdin.flush()?;
        Ok(())
    }

    /// Block until guestfish produces a line or its stdout ends.
    pub fn read_line(&self) -> Response {
        self.responses.recv().unwrap_or(Response::Eof)
    }

    /// Wait at most `timeout` for the next response.
    ///
    /// Returns `None` when the timer wins. The pending read is left to the
    /// reader thread; whatever it produces later is never consumed.
    pub fn read_line_within(&self, timeout: Duration) -> Option<Response> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Response::Eof),
        }
    }

    /// Close stdin, wait for guestfish to exit and check its status.
    pub fn close(mut self) -> Result<()> {
        self.expect_state(SessionState::Emitted, "close")?;
        drop(self.stdin.take());
        let status = self.child.wait()?;
        self.state = SessionState::Closed;
        debug!(%status, "guestfish session closed");
        if !status.success() {
            return Err(TarballError::ToolFailed { status });
        }
        Ok(())
    }

    /// Tear the session down and hand `err` back for propagation.
    pub(crate) fn abort(&mut self, err: TarballError) -> TarballError {
        self.terminate();
        err
    }

    pub(crate) fn expect_state(&self, expected: SessionState, action: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(TarballError::OutOfOrder {
                action,
                state: self.state,
            });
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "guestfish session state");
        self.state = next;
    }

    fn stdin_mut(&mut self) -> Result<&mut ChildStdin> {
        self.stdin.as_mut().ok_or_else(|| {
            TarballError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "guestfish stdin already closed",
            ))
        })
    }

    fn terminate(&mut self) {
        if matches!(self.state, SessionState::Closed | SessionState::Aborted) {
            return;
        }
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
        debug!(from = ?self.state, "guestfish session aborted");
        self.state = SessionState::Aborted;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn forward_responses(stdout: ChildStdout, tx: Sender<Response>) {
    let mut reader = BufReader::new(stdout);
    loop {
        let mut line = String::new();
        let response = match reader.read_line(&mut line) {
            Ok(0) => Response::Eof,
            Ok(_) => Response::Line(line),
            Err(e) => Response::Failed(e),
        };
        let more = matches!(response, Response::Line(_));
        if tx.send(response).is_err() || !more {
            break;
        }
    }
}

/// Quote a guestfish argument when it would otherwise split or be misparsed.
pub fn quote_arg(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | '#'));
    if !needs_quotes {
        return arg.to_string();
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
