//! Deadline-bounded move reads.
//!
//! The blocking read runs on a short-lived worker thread while the referee
//! waits on a channel for at most the deadline. A read that misses the
//! deadline is abandoned, not cancelled: the worker keeps blocking until the
//! player's stdout closes, which happens once the caller stops the player.

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::channel::PlayerChannel;
use crate::constants::TIMEOUT_GRACE;

/// Result of waiting for a move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveRead {
    /// The line read, empty if the player's output closed.
    Line(String),
    TimedOut,
}

/// Bounds how long the referee waits for the player to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeoutGate {
    deadline: Duration,
}

impl TimeoutGate {
    /// Gate for a per-move budget; the fixed grace margin is added here.
    pub fn new(move_timeout: Duration) -> Self {
        Self {
            deadline: move_timeout + TIMEOUT_GRACE,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Read one move from `channel`, giving up after the deadline.
    ///
    /// A channel that is not running reads as an empty line.
    pub fn read_move(&self, channel: &PlayerChannel) -> io::Result<MoveRead> {
        match channel.reader() {
            Some(reader) => self.run(move || reader.read_line()),
            None => Ok(MoveRead::Line(String::new())),
        }
    }

    /// Run `read` on a worker thread and wait for it up to the deadline.
    ///
    /// Fails only if the worker thread cannot be spawned. A worker that
    /// panics reads as an empty line.
    pub fn run<F>(&self, read: F) -> io::Result<MoveRead>
    where
        F: FnOnce() -> String + Send + 'static,
    {
        // Capacity 1 so an abandoned worker never blocks on send.
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("move-reader".into())
            .spawn(move || {
                let _ = tx.send(read());
            })?;

        match rx.recv_timeout(self.deadline) {
            Ok(line) => Ok(MoveRead::Line(line)),
            Err(RecvTimeoutError::Timeout) => Ok(MoveRead::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Ok(MoveRead::Line(String::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_deadline_includes_grace() {
        let gate = TimeoutGate::new(Duration::from_secs(2));
        assert_eq!(gate.deadline(), Duration::from_millis(2500));
    }

    #[test]
    fn test_fast_read_returns_line() {
        let gate = TimeoutGate::new(Duration::from_secs(1));
        let read = gate.run(|| "h1 d2 r0".to_string()).unwrap();
        assert_eq!(read, MoveRead::Line("h1 d2 r0".into()));
    }

    #[test]
    fn test_slow_read_times_out() {
        let gate = TimeoutGate::new(Duration::from_millis(100));
        let started = Instant::now();
        let read = gate
            .run(|| {
                thread::sleep(Duration::from_secs(3));
                "too late".to_string()
            })
            .unwrap();
        assert_eq!(read, MoveRead::TimedOut);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(600));
        assert!(waited < Duration::from_secs(3));
    }

    #[test]
    fn test_panicking_read_is_empty_line() {
        let gate = TimeoutGate::new(Duration::from_secs(1));
        let read = gate.run(|| panic!("reader blew up")).unwrap();
        assert_eq!(read, MoveRead::Line(String::new()));
    }

    #[test]
    fn test_stopped_channel_reads_empty() {
        use crate::config::PlayerCommand;

        let gate = TimeoutGate::new(Duration::from_secs(1));
        let channel = PlayerChannel::new("idle", PlayerCommand::new("cat", Vec::<String>::new()));
        assert_eq!(gate.read_move(&channel).unwrap(), MoveRead::Line(String::new()));
    }
}
