//! Runs the pipeline on a worker thread under a wall-clock deadline.
//!
//! The worker is never cancelled: on timeout it is simply abandoned and the
//! caller is expected to exit the process. Rust does not wait for detached
//! threads when `main` returns, so an abandoned worker cannot hold the
//! process open.

use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};

use tracing::{debug, error};

use crate::foundation::error::{Goes16Error, Goes16Result};

pub const WORKER_THREAD_NAME: &str = "goes16-background-main";

/// Deadline for one run; `None` waits forever.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<Duration>);

impl Deadline {
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn after(limit: Duration) -> Self {
        if limit.is_zero() {
            Self(None)
        } else {
            Self(Some(limit))
        }
    }

    /// `0` disables the deadline.
    pub fn from_minutes(minutes: u64) -> Self {
        Self::after(Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn limit(self) -> Option<Duration> {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Running,
    Completed,
    TimedOut,
}

#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    TimedOut(Duration),
}

impl<T> Outcome<T> {
    pub fn state(&self) -> WatchState {
        match self {
            Self::Completed(_) => WatchState::Completed,
            Self::TimedOut(_) => WatchState::TimedOut,
        }
    }

    pub fn into_result(self) -> Goes16Result<T> {
        match self {
            Self::Completed(v) => Ok(v),
            Self::TimedOut(limit) => Err(Goes16Error::Timeout(limit)),
        }
    }
}

#[derive(Debug)]
pub struct Watchdog {
    deadline: Deadline,
    state: WatchState,
}

impl Watchdog {
    pub fn new(deadline: Deadline) -> Self {
        Self {
            deadline,
            state: WatchState::Idle,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Runs `job` on a named worker thread and waits for it up to the deadline.
    ///
    /// A worker that panics is reported as an error, never as a timeout.
    pub fn run<T, F>(&mut self, job: F) -> Goes16Result<Outcome<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<T>(1);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let value = job();
                // The supervisor may have given up already.
                let _ = tx.send(value);
            })
            .map_err(|e| anyhow::Error::new(e).context("spawn pipeline worker"))?;
        self.state = WatchState::Running;
        debug!(deadline = ?self.deadline.limit(), "pipeline worker started");

        let received = match self.deadline.limit() {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(limit) => rx.recv_timeout(limit),
        };

        match received {
            Ok(value) => {
                self.state = WatchState::Completed;
                let _ = handle.join();
                Ok(Outcome::Completed(value))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.state = WatchState::TimedOut;
                let limit = self.deadline.limit().unwrap_or_default();
                error!("Timeout! Pipeline still running after {}s.", limit.as_secs());
                drop(handle);
                Ok(Outcome::TimedOut(limit))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.state = WatchState::Completed;
                let _ = handle.join();
                Err(Goes16Error::Other(anyhow::anyhow!(
                    "pipeline worker terminated without a result"
                )))
            }
        }
    }
}
