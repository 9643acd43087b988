//! Builder API for ergonomic breaker configuration

use crate::{
    callbacks::Callbacks,
    circuit::{Breaker, Options},
    clock::{Clock, SystemClock},
    errors::ConfigError,
    health::HealthCounter,
};
use std::sync::Arc;

/// Builder for creating breakers with fluent API
pub struct BreakerBuilder {
    name: String,
    options: Options,
    clock: Arc<dyn Clock>,
    callbacks: Callbacks,
}

impl BreakerBuilder {
    /// Create a new builder for a breaker with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::default(),
            clock: Arc::new(SystemClock),
            callbacks: Callbacks::new(),
        }
    }

    /// Replace all options at once
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Set the error percentage (0-100) at which the circuit opens
    pub fn errors_percentage(mut self, percentage: f64) -> Self {
        self.options.errors_percentage = percentage;
        self
    }

    /// Set the call volume below which the circuit never opens
    pub fn minimum_number_of_requests(mut self, requests: u64) -> Self {
        self.options.minimum_number_of_requests = requests;
        self
    }

    /// Set the window width in seconds (validated on build)
    pub fn number_of_seconds_to_store(mut self, seconds: i32) -> Self {
        self.options.number_of_seconds_to_store = seconds;
        self
    }

    /// Read time from a custom clock instead of the system monotonic clock
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Set callback for when circuit opens
    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_open = Some(Arc::new(f));
        self
    }

    /// Set callback for when circuit closes
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callbacks.on_close = Some(Arc::new(f));
        self
    }

    /// Build the breaker, starting its health counter
    pub fn build(self) -> Result<Breaker, ConfigError> {
        let health =
            HealthCounter::with_clock(self.options.number_of_seconds_to_store, self.clock)?;
        Ok(Breaker::from_parts(self.name, self.options, health, self.callbacks))
    }
}

impl std::fmt::Debug for BreakerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerBuilder")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("clock", &self.clock)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
