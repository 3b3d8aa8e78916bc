//! Zoom and pan state for the page surface.
//!
//! The controller is the only writer of [`TransformState`]. Every change
//! publishes a [`ZoomReadout`] to subscribers, and the flip input gate is
//! derived from the same state through [`TransformState::lock`].

use crate::config::ViewerConfig;
use tokio::sync::watch;
use tracing::debug;

/// Current zoom factor and pan offset.
///
/// The transform is `translate(pan) * scale` anchored at the top-left corner
/// of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    lock_epsilon: f32,
}

impl TransformState {
    fn identity(lock_epsilon: f32) -> Self {
        Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            lock_epsilon,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.scale > 1.0 + self.lock_epsilon
    }

    /// The flip input gate for this transform.
    pub fn lock(&self) -> InputLock {
        InputLock {
            locked: self.is_locked(),
        }
    }
}

/// Whether flip gestures are currently blocked by zoom.
///
/// Only obtainable from a [`TransformState`], so the gate is never derived
/// anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLock {
    locked: bool,
}

impl InputLock {
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

/// What a zoom display needs to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomReadout {
    pub scale: f32,
    pub percent: u32,
    pub locked: bool,
}

impl From<&TransformState> for ZoomReadout {
    fn from(state: &TransformState) -> Self {
        Self {
            scale: state.scale,
            percent: (state.scale * 100.0).round() as u32,
            locked: state.is_locked(),
        }
    }
}

#[derive(Debug)]
pub struct TransformController {
    state: TransformState,
    max_scale: f32,
    zoom_step: f32,
    wheel_step: f32,
    /// Size of the transformed surface, used to bound panning
    bounds: (f32, f32),
    readout: watch::Sender<ZoomReadout>,
}

impl TransformController {
    pub const MIN_SCALE: f32 = 1.0;

    pub fn new(config: &ViewerConfig) -> Self {
        let state = TransformState::identity(config.lock_epsilon);
        let (readout, _) = watch::channel(ZoomReadout::from(&state));
        Self {
            state,
            max_scale: config.max_scale.max(Self::MIN_SCALE),
            zoom_step: config.zoom_step,
            wheel_step: config.wheel_step,
            bounds: (0.0, 0.0),
            readout,
        }
    }

    pub fn state(&self) -> TransformState {
        self.state
    }

    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    pub fn pan_position(&self) -> (f32, f32) {
        (self.state.pan_x, self.state.pan_y)
    }

    pub fn lock(&self) -> InputLock {
        self.state.lock()
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    /// Receives a readout after every change.
    pub fn subscribe(&self) -> watch::Receiver<ZoomReadout> {
        self.readout.subscribe()
    }

    /// Updates the surface size panning is bounded by.
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.bounds = (width.max(0.0), height.max(0.0));
        let (pan_x, pan_y) = self.clamp_pan(self.state.pan_x, self.state.pan_y, self.state.scale);
        self.state.pan_x = pan_x;
        self.state.pan_y = pan_y;
        self.publish();
    }

    pub fn zoom_in(&mut self) {
        let target = self.state.scale * (1.0 + self.zoom_step);
        self.zoom_around(target, self.center());
    }

    pub fn zoom_out(&mut self) {
        let target = self.state.scale / (1.0 + self.zoom_step);
        self.zoom_around(target, self.center());
    }

    pub fn reset(&mut self) {
        self.state = TransformState::identity(self.state.lock_epsilon);
        debug!("transform reset");
        self.publish();
    }

    /// Wheel zoom around the cursor. Negative `delta_y` (wheel up) zooms in.
    pub fn wheel(&mut self, delta_y: f32, focal: (f32, f32)) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let factor = if delta_y < 0.0 {
            1.0 + self.wheel_step
        } else {
            1.0 - self.wheel_step
        };
        self.zoom_around(self.state.scale * factor, focal);
    }

    /// Pinch gesture update, `factor` relative to the current scale.
    pub fn pinch(&mut self, factor: f32, focal: (f32, f32)) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        self.zoom_around(self.state.scale * factor, focal);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.zoom_around(scale, self.center());
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let (pan_x, pan_y) =
            self.clamp_pan(self.state.pan_x + dx, self.state.pan_y + dy, self.state.scale);
        self.state.pan_x = pan_x;
        self.state.pan_y = pan_y;
        self.publish();
    }

    /// Scales to `target` keeping the surface point under `focal` in place.
    fn zoom_around(&mut self, target: f32, focal: (f32, f32)) {
        if target.is_nan() {
            return;
        }
        let old = self.state.scale;
        let scale = target.clamp(Self::MIN_SCALE, self.max_scale);
        let ratio = scale / old;

        let pan_x = focal.0 - (focal.0 - self.state.pan_x) * ratio;
        let pan_y = focal.1 - (focal.1 - self.state.pan_y) * ratio;
        let (pan_x, pan_y) = self.clamp_pan(pan_x, pan_y, scale);

        let was_locked = self.state.is_locked();
        self.state.scale = scale;
        self.state.pan_x = pan_x;
        self.state.pan_y = pan_y;

        if was_locked != self.state.is_locked() {
            debug!(scale, locked = self.state.is_locked(), "flip lock changed");
        }
        self.publish();
    }

    /// The scaled surface must always cover the viewport.
    fn clamp_pan(&self, pan_x: f32, pan_y: f32, scale: f32) -> (f32, f32) {
        let (width, height) = self.bounds;
        let min_x = width * (1.0 - scale);
        let min_y = height * (1.0 - scale);
        (pan_x.clamp(min_x, 0.0), pan_y.clamp(min_y, 0.0))
    }

    fn center(&self) -> (f32, f32) {
        (self.bounds.0 / 2.0, self.bounds.1 / 2.0)
    }

    fn publish(&self) {
        self.readout.send_replace(ZoomReadout::from(&self.state));
    }
}
