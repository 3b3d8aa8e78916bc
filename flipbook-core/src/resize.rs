//! Debounced viewport observation.
//!
//! Resize and orientation events arrive in bursts. The observer keeps only
//! the latest size and releases it once no new event has arrived for the
//! debounce period.

use crate::layout::ViewportSize;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResizeObserver {
    debounce: Duration,
    /// Latest size and when it was seen
    pending: Option<(ViewportSize, Instant)>,
    last_released: Option<ViewportSize>,
    attached: bool,
}

impl ResizeObserver {
    pub fn with_debounce(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            last_released: None,
            attached: true,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records a resize or orientation event. Ignored once detached.
    pub fn observe(&mut self, size: ViewportSize, now: Instant) -> bool {
        if !self.attached {
            return false;
        }
        self.pending = Some((size, now));
        true
    }

    /// Returns the settled size once the debounce period has passed.
    ///
    /// A size equal to the last one released is swallowed.
    pub fn poll(&mut self, now: Instant) -> Option<ViewportSize> {
        let (size, seen) = self.pending?;
        if now.saturating_duration_since(seen) < self.debounce {
            return None;
        }
        self.pending = None;
        self.release(size)
    }

    /// Releases the pending size immediately, e.g. on mount.
    pub fn flush(&mut self) -> Option<ViewportSize> {
        let (size, _) = self.pending.take()?;
        self.release(size)
    }

    /// Stops observing. Pending events are dropped.
    pub fn detach(&mut self) {
        if self.attached {
            debug!("resize observer detached");
        }
        self.attached = false;
        self.pending = None;
    }

    fn release(&mut self, size: ViewportSize) -> Option<ViewportSize> {
        if self.last_released == Some(size) {
            return None;
        }
        self.last_released = Some(size);
        Some(size)
    }
}
