//! Page-flip navigation.
//!
//! Owns the current page index. A navigation request starts a flip
//! animation and the new index is committed only when the animation
//! completes, either by the clock in [`FlipMachine::advance`] or by an
//! external completion callback.

use crate::layout::DeviceClass;
use crate::spread::{next_spread_index, prev_spread_index};
use crate::transform::InputLock;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipAnimation {
    pub from: u32,
    pub to: u32,
    pub direction: FlipDirection,
    pub started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipStatus {
    Idle,
    Animating(FlipAnimation),
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Started(FlipAnimation),
    /// Target equals the current index after clamping
    Unchanged,
    /// Another flip is still animating
    Busy,
    /// Rejected because the surface is zoomed in
    Locked,
    /// The document has no pages
    Empty,
}

impl FlipOutcome {
    pub fn started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Pointer input on the book itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlipGesture {
    CornerClick(Side),
    /// Horizontal drag distance in pixels, positive to the right
    Drag { dx: f32 },
}

/// Button-style navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStep {
    Next,
    Prev,
    NextSpread,
    PrevSpread,
    First,
    Last,
    /// Jump to a 0-based index, clamped into the document
    Index(i64),
}

#[derive(Debug, Clone)]
pub struct FlipMachine {
    page_count: u32,
    current: u32,
    status: FlipStatus,
    duration: Duration,
    navigation_while_zoomed: bool,
    drag_threshold: f32,
}

impl FlipMachine {
    pub fn new(page_count: u32, duration: Duration) -> Self {
        Self {
            page_count,
            current: 0,
            status: FlipStatus::Idle,
            duration,
            navigation_while_zoomed: true,
            drag_threshold: 40.0,
        }
    }

    pub fn with_navigation_while_zoomed(mut self, enabled: bool) -> Self {
        self.navigation_while_zoomed = enabled;
        self
    }

    pub fn with_drag_threshold(mut self, threshold: f32) -> Self {
        self.drag_threshold = threshold.abs();
        self
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Committed 0-based index. Does not change while a flip is animating.
    pub fn current_index(&self) -> u32 {
        self.current
    }

    pub fn status(&self) -> FlipStatus {
        self.status
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.status, FlipStatus::Animating(_))
    }

    /// Starts a flip to `target`, clamped into the document.
    pub fn go_to(&mut self, target: i64, now: Instant) -> FlipOutcome {
        if self.page_count == 0 {
            return FlipOutcome::Empty;
        }
        if self.is_animating() {
            return FlipOutcome::Busy;
        }

        let last = i64::from(self.page_count - 1);
        let to = target.clamp(0, last) as u32;
        if to == self.current {
            return FlipOutcome::Unchanged;
        }

        let animation = FlipAnimation {
            from: self.current,
            to,
            direction: if to > self.current {
                FlipDirection::Forward
            } else {
                FlipDirection::Backward
            },
            started_at: now,
        };
        debug!(from = animation.from, to, "flip started");
        self.status = FlipStatus::Animating(animation);
        FlipOutcome::Started(animation)
    }

    pub fn next(&mut self, now: Instant) -> FlipOutcome {
        self.go_to(i64::from(self.current) + 1, now)
    }

    pub fn prev(&mut self, now: Instant) -> FlipOutcome {
        self.go_to(i64::from(self.current) - 1, now)
    }

    pub fn next_spread(&mut self, device: DeviceClass, now: Instant) -> FlipOutcome {
        match next_spread_index(self.current, self.page_count, device) {
            Some(index) => self.go_to(i64::from(index), now),
            None => FlipOutcome::Empty,
        }
    }

    pub fn prev_spread(&mut self, device: DeviceClass, now: Instant) -> FlipOutcome {
        match prev_spread_index(self.current, self.page_count, device) {
            Some(index) => self.go_to(i64::from(index), now),
            None => FlipOutcome::Empty,
        }
    }

    /// Navigation from toolbar buttons. Honors the zoomed-navigation setting.
    pub fn button(
        &mut self,
        step: NavStep,
        lock: InputLock,
        device: DeviceClass,
        now: Instant,
    ) -> FlipOutcome {
        if lock.is_locked() && !self.navigation_while_zoomed {
            return FlipOutcome::Locked;
        }
        match step {
            NavStep::Next => self.next(now),
            NavStep::Prev => self.prev(now),
            NavStep::NextSpread => self.next_spread(device, now),
            NavStep::PrevSpread => self.prev_spread(device, now),
            NavStep::First => self.go_to(0, now),
            NavStep::Last => self.go_to(i64::MAX, now),
            NavStep::Index(target) => self.go_to(target, now),
        }
    }

    /// Pointer input on the book. Always rejected while zoomed or animating.
    pub fn gesture(
        &mut self,
        gesture: FlipGesture,
        lock: InputLock,
        device: DeviceClass,
        now: Instant,
    ) -> FlipOutcome {
        if lock.is_locked() {
            debug!(?gesture, "flip gesture rejected while zoomed");
            return FlipOutcome::Locked;
        }
        if self.is_animating() {
            return FlipOutcome::Busy;
        }

        let direction = match gesture {
            FlipGesture::CornerClick(Side::Right) => FlipDirection::Forward,
            FlipGesture::CornerClick(Side::Left) => FlipDirection::Backward,
            FlipGesture::Drag { dx } if dx.abs() >= self.drag_threshold => {
                if dx < 0.0 {
                    FlipDirection::Forward
                } else {
                    FlipDirection::Backward
                }
            }
            FlipGesture::Drag { .. } => return FlipOutcome::Unchanged,
        };

        match direction {
            FlipDirection::Forward => self.next_spread(device, now),
            FlipDirection::Backward => self.prev_spread(device, now),
        }
    }

    /// Commits the running flip once its duration has elapsed.
    ///
    /// Returns the newly committed index.
    pub fn advance(&mut self, now: Instant) -> Option<u32> {
        match self.status {
            FlipStatus::Animating(animation)
                if now.saturating_duration_since(animation.started_at) >= self.duration =>
            {
                self.commit(animation)
            }
            _ => None,
        }
    }

    /// Completion callback from an external animation driver.
    pub fn finish_animation(&mut self) -> Option<u32> {
        match self.status {
            FlipStatus::Animating(animation) => self.commit(animation),
            FlipStatus::Idle => None,
        }
    }

    /// Drops a running animation without committing it.
    pub fn cancel(&mut self) {
        if let FlipStatus::Animating(animation) = self.status {
            debug!(to = animation.to, "flip discarded");
        }
        self.status = FlipStatus::Idle;
    }

    fn commit(&mut self, animation: FlipAnimation) -> Option<u32> {
        self.current = animation.to;
        self.status = FlipStatus::Idle;
        debug!(index = self.current, "flip committed");
        Some(self.current)
    }
}
