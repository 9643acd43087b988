//! Circuit breaker state machine
//!
//! The breaker holds a two-value state in an atomic and hands every outcome
//! to its [`HealthCounter`]. After each recorded outcome, and whenever an
//! admission check finds the circuit open, the windowed summary is compared
//! against [`Options`] and the state is moved with a compare-and-swap. There
//! is no half-open phase: the circuit closes as soon as the window no longer
//! justifies keeping it open.

use crate::callbacks::Callbacks;
use crate::errors::{CallError, ConfigError, CounterClosed};
use crate::health::{HealthCounter, HealthSummary};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;

/// Breaker configuration, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// The circuit opens when the windowed error percentage is >= this value
    pub errors_percentage: f64,

    /// Below this many calls in the window the circuit stays closed
    pub minimum_number_of_requests: u64,

    /// Width of the window in seconds (1..=60), also the number of buckets
    pub number_of_seconds_to_store: i32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            errors_percentage: 50.0,
            minimum_number_of_requests: 20,
            number_of_seconds_to_store: 10,
        }
    }
}

impl Options {
    /// State the admission policy calls for, given a window summary
    pub fn target_state(&self, summary: &HealthSummary) -> State {
        if summary.total < self.minimum_number_of_requests {
            State::Closed
        } else if summary.error_percentage >= self.errors_percentage {
            State::Open
        } else {
            State::Closed
        }
    }
}

/// Circuit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    Closed = 0,
    Open = 1,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Closed => "Closed",
            State::Open => "Open",
        }
    }

    fn from_u8(value: u8) -> Self {
        if value == State::Open as u8 {
            State::Open
        } else {
            State::Closed
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Success,
    Failure,
}

/// Circuit breaker handle
///
/// Clones share the same state and counter. The breaker is `Send + Sync`
/// and every method takes `&self`.
#[derive(Clone, Debug)]
pub struct Breaker {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    name: String,
    state: AtomicU8,
    health: HealthCounter,
    options: Options,
    callbacks: Callbacks,
    notify: Sender<State>,
    changes: Receiver<State>,
}

impl Breaker {
    /// Create a breaker with the given options (use builder() for more)
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        Self::builder("breaker").options(options).build()
    }

    /// Create a new breaker builder
    pub fn builder(name: impl Into<String>) -> crate::builder::BreakerBuilder {
        crate::builder::BreakerBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: String,
        options: Options,
        health: HealthCounter,
        callbacks: Callbacks,
    ) -> Self {
        // Zero capacity: a notification is only delivered to a waiting receiver
        let (notify, changes) = bounded(0);

        Self {
            inner: Arc::new(Inner {
                name,
                state: AtomicU8::new(State::Closed as u8),
                health,
                options,
                callbacks,
                notify,
                changes,
            }),
        }
    }

    /// Execute a fallible operation with circuit breaker protection
    ///
    /// While the circuit is open the policy is re-evaluated first; if it
    /// still says open, the operation is not run and [`CallError::Open`] is
    /// returned. Otherwise the operation runs on the calling thread and its
    /// result is handed back unchanged, its error wrapped in
    /// [`CallError::Execution`]. The outcome is recorded on a background
    /// thread, so any state change it causes happens after this returns.
    pub fn call<T, E, F>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if self.state() == State::Open && self.inner.update() == State::Open {
            return Err(CallError::Open {
                circuit: self.inner.name.clone(),
            });
        }

        match operation() {
            Ok(value) => {
                self.dispatch(Outcome::Success);
                Ok(value)
            }
            Err(e) => {
                self.dispatch(Outcome::Failure);
                Err(CallError::Execution(e))
            }
        }
    }

    /// Windowed statistics
    pub fn health(&self) -> Result<HealthSummary, CounterClosed> {
        self.inner.health.summary()
    }

    /// Last committed state
    pub fn state(&self) -> State {
        self.inner.state()
    }

    pub fn is_open(&self) -> bool {
        self.state() == State::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state() == State::Closed
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Stop the health counter. The breaker must not be used afterwards.
    pub fn cancel(&self) {
        self.inner.health.cancel();
    }

    /// Stream of state transitions
    ///
    /// Notification is advisory, not authoritative: a transition is only
    /// delivered to a receiver already blocked waiting for it, and dropped
    /// otherwise. Poll [`state`](Self::state) for ground truth.
    pub fn changes(&self) -> Receiver<State> {
        self.inner.changes.clone()
    }

    fn dispatch(&self, outcome: Outcome) {
        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("breaker-recorder".to_string())
            .spawn(move || inner.record(outcome));

        if let Err(err) = spawned {
            tracing::warn!(
                circuit = %self.inner.name,
                ?outcome,
                error = %err,
                "could not start outcome recorder, outcome dropped"
            );
        }
    }
}

impl Inner {
    fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    fn record(&self, outcome: Outcome) {
        let recorded = match outcome {
            Outcome::Success => self.health.record_success(),
            Outcome::Failure => self.health.record_failure(),
        };

        if recorded.is_err() {
            tracing::debug!(circuit = %self.name, ?outcome, "health counter closed, outcome discarded");
            return;
        }
        self.update();
    }

    /// Re-evaluate the policy and move the state if needed; returns the
    /// state in effect afterwards
    fn update(&self) -> State {
        let current = self.state();
        let Ok(summary) = self.health.summary() else {
            return current;
        };

        let target = self.options.target_state(&summary);
        if target == current {
            return current;
        }

        // A lost race means another thread already moved the state; no retry
        match self.state.compare_exchange(
            current as u8,
            target as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.publish(target, &summary);
                target
            }
            Err(actual) => State::from_u8(actual),
        }
    }

    fn publish(&self, state: State, summary: &HealthSummary) {
        match state {
            State::Open => tracing::warn!(
                circuit = %self.name,
                error_percentage = summary.error_percentage,
                total = summary.total,
                "circuit opened"
            ),
            State::Closed => tracing::info!(
                circuit = %self.name,
                error_percentage = summary.error_percentage,
                total = summary.total,
                "circuit closed"
            ),
        }

        if self.notify.try_send(state).is_err() {
            tracing::debug!(circuit = %self.name, %state, "no observer waiting, notification dropped");
        }
        self.callbacks.trigger(&self.name, state);
    }
}
