//! Hooks fired on breaker state transitions

use crate::circuit::State;
use std::sync::Arc;

pub type TransitionFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Callbacks run by whichever thread wins a state transition
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_open: Option<TransitionFn>,
    pub on_close: Option<TransitionFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the hook registered for entering `state`
    pub fn trigger(&self, circuit: &str, state: State) {
        let callback = match state {
            State::Open => &self.on_open,
            State::Closed => &self.on_close,
        };
        if let Some(callback) = callback {
            callback(circuit);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
