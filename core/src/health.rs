//! Windowed health counting
//!
//! The design of the buckets follows the leaky bucket window from Netflix
//! Hystrix: a fixed ring of one-second buckets where each bucket ages out on
//! its own instead of the whole window shifting at once. Decay is lazy, a
//! stale bucket is zeroed the next time it is written and skipped when
//! summarised, so no background sweep is needed.
//!
//! All reads and writes go through a single event loop thread reachable only
//! by message passing. Callers on any number of threads hand requests to the
//! loop over a rendezvous channel; the loop applies them one at a time, which
//! gives a total order without a mutex.

use crate::clock::{Clock, SystemClock};
use crate::errors::{ConfigError, CounterClosed};
use crossbeam_channel::{Receiver, Sender, bounded, select};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Largest window a counter can store
pub const MAX_SECONDS_TO_STORE: i32 = 60;

/// Point-in-time view of the counter
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HealthSummary {
    pub failures: u64,
    pub successes: u64,
    pub total: u64,
    /// `failures / total * 100`, or `0.0` when nothing was recorded
    pub error_percentage: f64,
    /// Most recent failure ever recorded, even if older than the window
    pub last_failure: Option<Instant>,
    /// Most recent success ever recorded, even if older than the window
    pub last_success: Option<Instant>,
}

/// One second of statistics
#[derive(Debug, Clone, Copy, Default)]
struct HealthBucket {
    successes: u64,
    failures: u64,
    last_write: Option<Instant>,
    /// Second (relative to the counter origin) the counts belong to
    second: u64,
}

impl HealthBucket {
    fn is_live(&self, now: Instant, window: Duration) -> bool {
        matches!(self.last_write, Some(at) if now.saturating_duration_since(at) <= window)
    }

    fn reset(&mut self, second: u64) {
        self.successes = 0;
        self.failures = 0;
        self.second = second;
    }
}

enum Command {
    Success,
    Failure,
    Summary(Sender<HealthSummary>),
}

/// Handle to a running health counter
///
/// Dropping the handle stops the event loop.
#[derive(Debug)]
pub struct HealthCounter {
    commands: Sender<Command>,
    cancel: Sender<()>,
    cancelled: AtomicBool,
    window: Duration,
}

impl HealthCounter {
    /// Start a counter that keeps the last `number_of_seconds_to_store` seconds
    pub fn new(number_of_seconds_to_store: i32) -> Result<Self, ConfigError> {
        Self::with_clock(number_of_seconds_to_store, SystemClock)
    }

    /// Start a counter reading time from `clock`
    pub fn with_clock<C: Clock>(
        number_of_seconds_to_store: i32,
        clock: C,
    ) -> Result<Self, ConfigError> {
        if number_of_seconds_to_store <= 0 || number_of_seconds_to_store > MAX_SECONDS_TO_STORE {
            return Err(ConfigError::WindowOutOfBounds(number_of_seconds_to_store));
        }

        let buckets = number_of_seconds_to_store as usize;
        let window = Duration::from_secs(buckets as u64);

        // Zero capacity: a send completes only once the loop takes it
        let (commands, command_rx) = bounded(0);
        let (cancel, cancel_rx) = bounded(1);

        let origin = clock.now();
        let worker = CounterLoop {
            clock,
            origin,
            window,
            buckets: vec![HealthBucket::default(); buckets],
            last_failure: None,
            last_success: None,
        };

        thread::Builder::new()
            .name("health-counter".to_string())
            .spawn(move || worker.run(command_rx, cancel_rx))?;

        Ok(Self {
            commands,
            cancel,
            cancelled: AtomicBool::new(false),
            window,
        })
    }

    /// Record a successful operation in the current second
    pub fn record_success(&self) -> Result<(), CounterClosed> {
        self.send(Command::Success)
    }

    /// Record a failed operation in the current second
    pub fn record_failure(&self) -> Result<(), CounterClosed> {
        self.send(Command::Failure)
    }

    /// Aggregate every bucket still inside the window
    pub fn summary(&self) -> Result<HealthSummary, CounterClosed> {
        let (reply, response) = bounded(1);
        self.send(Command::Summary(reply))?;
        response.recv().map_err(|_| CounterClosed)
    }

    /// Stop the event loop for good
    ///
    /// Later requests through this handle fail with [`CounterClosed`].
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            let _ = self.cancel.try_send(());
        }
    }

    /// True once [`cancel`](Self::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Width of the sliding window
    pub fn window(&self) -> Duration {
        self.window
    }

    fn send(&self, command: Command) -> Result<(), CounterClosed> {
        if self.is_cancelled() {
            return Err(CounterClosed);
        }
        self.commands.send(command).map_err(|_| CounterClosed)
    }
}

impl Drop for HealthCounter {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// State owned by the event loop thread
struct CounterLoop<C> {
    clock: C,
    origin: Instant,
    window: Duration,
    buckets: Vec<HealthBucket>,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
}

impl<C: Clock> CounterLoop<C> {
    fn run(mut self, commands: Receiver<Command>, cancel: Receiver<()>) {
        tracing::debug!(
            window_secs = self.window.as_secs(),
            "health counter loop started"
        );

        loop {
            let command = select! {
                recv(commands) -> command => command.ok(),
                recv(cancel) -> _ => None,
            };

            // None: cancelled, or every handle is gone
            match command {
                Some(Command::Success) => self.record_success(),
                Some(Command::Failure) => self.record_failure(),
                Some(Command::Summary(reply)) => {
                    let _ = reply.send(self.summary());
                }
                None => break,
            }
        }

        tracing::debug!("health counter loop stopped");
    }

    /// Select the bucket for the current second, zeroing it if it holds
    /// anything but this second's counts
    fn bucket(&mut self, now: Instant) -> &mut HealthBucket {
        let second = now.saturating_duration_since(self.origin).as_secs();
        let index = (second % self.buckets.len() as u64) as usize;
        let window = self.window;

        let bucket = &mut self.buckets[index];
        if !bucket.is_live(now, window) || bucket.second != second {
            bucket.reset(second);
        }
        bucket.last_write = Some(now);

        tracing::trace!(index, second, "health bucket write");
        bucket
    }

    fn record_success(&mut self) {
        let now = self.clock.now();
        self.bucket(now).successes += 1;
        self.last_success = Some(now);
    }

    fn record_failure(&mut self) {
        let now = self.clock.now();
        self.bucket(now).failures += 1;
        self.last_failure = Some(now);
    }

    fn summary(&self) -> HealthSummary {
        let now = self.clock.now();
        let mut sum = HealthSummary {
            last_failure: self.last_failure,
            last_success: self.last_success,
            ..HealthSummary::default()
        };

        for bucket in self.buckets.iter().filter(|b| b.is_live(now, self.window)) {
            sum.successes += bucket.successes;
            sum.failures += bucket.failures;
        }

        sum.total = sum.successes + sum.failures;
        if sum.total > 0 {
            sum.error_percentage = sum.failures as f64 / sum.total as f64 * 100.0;
        }
        sum
    }
}
