//! LeakyBreaker - circuit breaker driven by a windowed error rate
//!
//! This crate provides:
//! - A health counter keeping per-second success/failure buckets over a
//!   sliding window of 1 to 60 seconds, serialized through one event loop
//! - A lock-free Closed/Open state machine that opens once the windowed error
//!   percentage crosses a threshold and closes as soon as it falls back
//! - Best-effort state change notifications and transition callbacks
//!
//! # Example
//!
//! ```rust
//! use leaky_breaker::{Breaker, CallError, Options};
//!
//! let breaker = Breaker::new(Options {
//!     errors_percentage: 50.0,
//!     minimum_number_of_requests: 20,
//!     number_of_seconds_to_store: 10,
//! })
//! .unwrap();
//!
//! // Execute with circuit protection
//! match breaker.call(|| Ok::<_, String>("success")) {
//!     Ok(value) => println!("got {}", value),
//!     Err(CallError::Open { circuit }) => println!("{} is open, skipping", circuit),
//!     Err(CallError::Execution(e)) => println!("call failed: {}", e),
//! }
//!
//! // Check circuit state
//! if breaker.is_open() {
//!     println!("Circuit is open");
//! }
//!
//! breaker.cancel();
//! ```

pub mod builder;
pub mod callbacks;
pub mod circuit;
pub mod clock;
pub mod errors;
pub mod health;

pub use builder::BreakerBuilder;
pub use circuit::{Breaker, Options, State};
pub use clock::{Clock, MockClock, SystemClock};
pub use errors::{CallError, ConfigError, CounterClosed};
pub use health::{HealthCounter, HealthSummary, MAX_SECONDS_TO_STORE};
