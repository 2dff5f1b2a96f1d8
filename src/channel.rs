//! Line-based text channel to one player program.
//!
//! A [`PlayerChannel`] owns the player's process. Lines go in through the
//! child's stdin and come back from its stdout; stderr is drained into the
//! log at debug level so a chatty player cannot block on a full pipe.
//!
//! ## Lifecycle
//!
//! `NotStarted` → [`start`](PlayerChannel::start) → `Running` →
//! [`stop`](PlayerChannel::stop) → `Stopped`. Stopping again is a no-op.
//!
//! Stopping runs in this order:
//! 1. Close the child's stdin so it sees end of input.
//! 2. Close stdout. A [`LineReader`] blocked in a read keeps the stream open
//!    until that read returns; the stream is closed when the last reader
//!    handle lets go of it.
//! 3. Give the child [`STOP_GRACE`] to exit, then ask it to terminate
//!    (SIGTERM on Unix), give it [`TERM_GRACE`], then kill it.
//! 4. Reap the child, then wait up to [`STOP_GRACE`] for the stderr drain to
//!    reach end of stream. A descendant still holding stderr keeps the drain
//!    alive until it exits.
//!
//! ## Operation log
//!
//! With [`with_log`](PlayerChannel::with_log) every line written (`>>`) and
//! read (`<<`) is appended to a file with a UTC timestamp. Failing to open or
//! write the log is reported once and otherwise ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};

use crate::config::PlayerCommand;
use crate::constants::{STOP_GRACE, STOP_POLL, TERM_GRACE};
use crate::error::RefereeError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelState {
    NotStarted,
    Running,
    Stopped,
}

/// Timestamped record of every line exchanged with one player.
struct OpLog {
    file: Option<File>,
}

impl OpLog {
    fn open(path: &Path) -> Self {
        match File::create(path) {
            Ok(file) => Self { file: Some(file) },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot open player log, continuing without it");
                Self { file: None }
            }
        }
    }

    fn record(&mut self, direction: &str, line: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        if let Err(e) = writeln!(file, "{stamp} {direction} {line}").and_then(|()| file.flush()) {
            tracing::warn!(error = %e, "player log write failed, disabling log");
            self.file = None;
        }
    }
}

type SharedLog = Arc<Mutex<OpLog>>;

fn log_line(log: &Option<SharedLog>, direction: &str, line: &str) {
    if let Some(log) = log {
        log.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(direction, line);
    }
}

/// Cloneable handle for reading lines from a player's stdout.
///
/// Handed to the timeout worker so the read can run off the referee's
/// thread. Reads are serialized through a mutex. `None` once the stream has
/// been closed.
#[derive(Clone)]
pub struct LineReader {
    player: Arc<str>,
    stdout: Arc<Mutex<Option<BufReader<ChildStdout>>>>,
    log: Option<SharedLog>,
}

impl LineReader {
    /// Block for one line. Returns it trimmed, or empty once the stream is
    /// closed or broken.
    pub fn read_line(&self) -> String {
        let mut stdout = self.stdout.lock().unwrap_or_else(PoisonError::into_inner);
        let mut line = String::new();
        let result = match stdout.as_mut() {
            Some(stream) => stream.read_line(&mut line),
            None => return String::new(),
        };

        match result {
            Ok(0) => {
                tracing::debug!(player = %self.player, "stdout closed");
                stdout.take();
                return String::new();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(player = %self.player, error = %e, "read failed");
                stdout.take();
                return String::new();
            }
        }
        drop(stdout);

        let line = line.trim().to_string();
        log_line(&self.log, "<<", &line);
        line
    }

    /// Close the stream unless a read is in progress. Every handle sees the
    /// stream as closed afterwards.
    fn close(&self) -> bool {
        match self.stdout.try_lock() {
            Ok(mut stdout) => stdout.take().is_some(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take().is_some(),
            Err(TryLockError::WouldBlock) => false,
        }
    }
}

/// One player program and the pipes to it.
pub struct PlayerChannel {
    name: String,
    command: PlayerCommand,
    log_path: Option<PathBuf>,
    state: ChannelState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader: Option<LineReader>,
    stderr_drain: Option<JoinHandle<()>>,
    log: Option<SharedLog>,
    exit_status: Option<ExitStatus>,
}

impl PlayerChannel {
    pub fn new(name: impl Into<String>, command: PlayerCommand) -> Self {
        Self {
            name: name.into(),
            command,
            log_path: None,
            state: ChannelState::NotStarted,
            child: None,
            stdin: None,
            reader: None,
            stderr_drain: None,
            log: None,
            exit_status: None,
        }
    }

    /// Record every exchanged line to `path` once started.
    pub fn with_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &PlayerCommand {
        &self.command
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Exit status collected by [`stop`](Self::stop).
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Launch the program with all three standard streams piped.
    ///
    /// Only a channel that has never been started is launched; otherwise
    /// this does nothing.
    pub fn start(&mut self) -> Result<(), RefereeError> {
        if self.state != ChannelState::NotStarted {
            return Ok(());
        }

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RefereeError::Launch {
                player: self.name.clone(),
                program: self.command.to_string(),
                source,
            })?;

        self.log = self
            .log_path
            .as_deref()
            .map(|path| Arc::new(Mutex::new(OpLog::open(path))));
        self.stdin = child.stdin.take();
        self.reader = child.stdout.take().map(|stdout| LineReader {
            player: Arc::from(self.name.as_str()),
            stdout: Arc::new(Mutex::new(Some(BufReader::new(stdout)))),
            log: self.log.clone(),
        });
        self.stderr_drain = child
            .stderr
            .take()
            .and_then(|stderr| drain_stderr(&self.name, stderr));

        tracing::info!(player = %self.name, command = %self.command, pid = child.id(), "player started");
        self.child = Some(child);
        self.state = ChannelState::Running;
        Ok(())
    }

    /// Send one line, newline-terminated and flushed immediately.
    pub fn write(&mut self, line: &str) -> io::Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} is not running", self.name),
            ));
        };
        log_line(&self.log, ">>", line);
        writeln!(stdin, "{line}")?;
        stdin.flush()
    }

    /// Block for one line of output, trimmed. Empty if the stream is closed
    /// or the channel is not running.
    pub fn read(&self) -> String {
        self.reader
            .as_ref()
            .map(LineReader::read_line)
            .unwrap_or_default()
    }

    /// Handle for reading on another thread, while running.
    pub fn reader(&self) -> Option<LineReader> {
        self.reader.clone()
    }

    /// Close the pipes and make sure the process is gone. Idempotent.
    pub fn stop(&mut self) {
        if self.state == ChannelState::Stopped {
            return;
        }
        self.state = ChannelState::Stopped;

        drop(self.stdin.take());
        if let Some(reader) = self.reader.take() {
            if !reader.close() {
                tracing::debug!(player = %self.name, "read in progress, stdout closes when it returns");
            }
        }

        let Some(mut child) = self.child.take() else {
            return;
        };
        let status = match self.wait_for_exit(&mut child, STOP_GRACE) {
            Some(status) => Some(status),
            None => {
                tracing::debug!(player = %self.name, "player did not exit, terminating");
                if let Err(e) = terminate(&child) {
                    tracing::warn!(player = %self.name, error = %e, "cannot terminate player");
                }
                match self.wait_for_exit(&mut child, TERM_GRACE) {
                    Some(status) => Some(status),
                    None => {
                        tracing::debug!(player = %self.name, "player ignored termination, killing");
                        kill(&mut child)
                    }
                }
            }
        };
        tracing::info!(player = %self.name, ?status, "player stopped");
        self.exit_status = status;

        if let Some(drain) = self.stderr_drain.take() {
            let deadline = Instant::now() + STOP_GRACE;
            while !drain.is_finished() && Instant::now() < deadline {
                thread::sleep(STOP_POLL);
            }
            if drain.is_finished() {
                let _ = drain.join();
            } else {
                tracing::debug!(player = %self.name, "stderr still held open by a descendant");
            }
        }
    }

    /// Poll for the child's exit for up to `grace`.
    fn wait_for_exit(&self, child: &mut Child, grace: Duration) -> Option<ExitStatus> {
        let deadline = Instant::now() + grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) if Instant::now() < deadline => thread::sleep(STOP_POLL),
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(player = %self.name, error = %e, "cannot poll player");
                    return None;
                }
            }
        }
    }
}

impl Drop for PlayerChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ask the child to exit. The child has not been reaped yet, so its pid is
/// still its own.
#[cfg(unix)]
fn terminate(child: &Child) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = i32::try_from(child.id())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    kill(Pid::from_raw(pid), Signal::SIGTERM)?;
    Ok(())
}

/// No portable termination request; the kill that follows ends the child.
#[cfg(not(unix))]
fn terminate(_child: &Child) -> io::Result<()> {
    Ok(())
}

fn kill(child: &mut Child) -> Option<ExitStatus> {
    // Fails only if the child has already exited, which wait() reports.
    let _ = child.kill();
    child.wait().ok()
}

fn drain_stderr(player: &str, stderr: ChildStderr) -> Option<JoinHandle<()>> {
    let player = player.to_string();
    let spawned = thread::Builder::new()
        .name(format!("{player}-stderr"))
        .spawn(move || {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => tracing::debug!(player = %player, "stderr: {line}"),
                    Err(_) => break,
                }
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "cannot drain player stderr");
            None
        }
    }
}
