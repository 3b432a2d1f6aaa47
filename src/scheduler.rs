//! Single-worker periodic scheduler
//!
//! A [`Ticker`] owns one named thread that runs a [`PeriodicTask`] with a
//! fixed delay between ticks, starting immediately. Ticks never overlap: a
//! slow tick pushes the next one back rather than running beside it.
//!
//! The owner talks to the worker only through commands. Stopping is
//! fire-and-forget; the worker exits as soon as it sees the command, and
//! an in-flight tick is allowed to finish.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{EffectsError, Result};

/// Work executed on every tick of a [`Ticker`]
pub trait PeriodicTask: Send + 'static {
    /// Run one tick. Returning `Break` ends the worker.
    fn tick(&mut self) -> ControlFlow<()>;

    /// Drop any cached state so the next tick starts fresh.
    fn resync(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Resync,
    Stop,
}

/// Handle to a running periodic worker
#[derive(Debug)]
pub struct Ticker {
    commands: Sender<Command>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl Ticker {
    /// Start `task` on a new thread named `name`, first tick immediately.
    pub fn spawn<T: PeriodicTask>(name: &str, period: Duration, task: T) -> Result<Self> {
        let (commands, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(task, period, &receiver))
            .map_err(EffectsError::SchedulerSpawn)?;

        tracing::debug!("[SCHEDULER] started '{}' every {:?}", name, period);
        Ok(Self {
            commands,
            handle: Some(handle),
            period,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ask the task to drop its cached state before the next tick.
    pub fn resync(&self) {
        // A send error means the worker already exited.
        let _ = self.commands.send(Command::Resync);
    }

    /// Ask the worker to exit without waiting for it.
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Check if the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// Stop the worker and wait for it to exit.
    pub fn join(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("[SCHEDULER] worker panicked before shutdown");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<T: PeriodicTask>(mut task: T, period: Duration, commands: &mpsc::Receiver<Command>) {
    let mut next_tick = Instant::now();
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match commands.recv_timeout(wait) {
            Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Command::Resync) => task.resync(),
            Err(RecvTimeoutError::Timeout) => {
                if task.tick().is_break() {
                    break;
                }
                next_tick = Instant::now() + period;
            }
        }
    }
    tracing::debug!("[SCHEDULER] worker exited");
}
