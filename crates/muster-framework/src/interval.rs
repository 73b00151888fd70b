//! Interval trigger scheduling.
//!
//! The engine does not own a timer. Something outside calls
//! [`Engine::tick`](crate::Engine::tick) on a fixed cadence; this module
//! decides which interval handlers are due on each tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::descriptor::{HandlerDescriptor, HandlerId};
use crate::trigger::Trigger;

/// Last-fired bookkeeping for interval handlers.
///
/// Ticks are ignored until [`mark_ready`](Self::mark_ready) has been called
/// once. A handler that never fired is due on the first tick after that.
#[derive(Debug, Default)]
pub struct IntervalScheduler {
    ready: AtomicBool,
    last_fired: Mutex<HashMap<HandlerId, Instant>>,
}

impl IntervalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the readiness latch. Returns `true` the first time only.
    pub fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// When `handler` last fired, if ever.
    pub fn last_fired(&self, handler: HandlerId) -> Option<Instant> {
        self.last_fired.lock().get(&handler).copied()
    }

    /// Returns the handlers due at `now` and records `now` as their last
    /// fire time.
    ///
    /// Recording happens before the handlers run and under one lock, so a
    /// slow handler or a concurrent tick never fires a handler twice in one
    /// period.
    pub fn take_due(
        &self,
        handlers: &[Arc<HandlerDescriptor>],
        now: Instant,
    ) -> Vec<Arc<HandlerDescriptor>> {
        if !self.is_ready() {
            trace!("Scheduler not ready, ignoring tick");
            return Vec::new();
        }

        let mut last_fired = self.last_fired.lock();
        handlers
            .iter()
            .filter(|handler| {
                let Trigger::Interval(every) = handler.trigger() else {
                    return false;
                };
                let due = match last_fired.get(&handler.id()) {
                    None => true,
                    Some(last) => now.saturating_duration_since(*last) >= *every,
                };
                if due {
                    last_fired.insert(handler.id(), now);
                }
                due
            })
            .cloned()
            .collect()
    }

    /// Forgets every fire time. The readiness latch stays as it is.
    pub fn reset(&self) {
        self.last_fired.lock().clear();
    }
}
