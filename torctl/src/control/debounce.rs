//! Suppression of repeated identical signals.
//!
//! The control port treats the same signal delivered twice within ten seconds
//! as redundant, so a repeat inside the window is answered locally with
//! success instead of being sent. The extra 500ms covers scheduling jitter.

use std::time::Duration;
use tokio::time::Instant;

use super::signal::Signal;

/// Window within which a repeated identical signal is suppressed
pub const SIGNAL_DEBOUNCE_WINDOW: Duration = Duration::from_millis(10_500);

/// Last signal that actually reached the peer
#[derive(Debug, Clone, Default)]
pub struct SignalDebounce {
    last: Option<(Signal, Instant)>,
}

impl SignalDebounce {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `signal` repeats the last dispatched one inside the window.
    pub fn should_suppress(&self, signal: Signal, now: Instant) -> bool {
        match self.last {
            Some((last, at)) => {
                last == signal && now.saturating_duration_since(at) < SIGNAL_DEBOUNCE_WINDOW
            }
            None => false,
        }
    }

    /// Record a successful dispatch. Never call this for suppressed or failed sends.
    pub fn record(&mut self, signal: Signal, now: Instant) {
        self.last = Some((signal, now));
    }

    pub fn last_signal(&self) -> Option<Signal> {
        self.last.map(|(signal, _)| signal)
    }

    pub fn last_sent_at(&self) -> Option<Instant> {
        self.last.map(|(_, at)| at)
    }
}
