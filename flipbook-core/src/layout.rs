//! Responsive page sizing.
//!
//! Maps the container size and device class to the pixel size of one page.
//! Layouts are recomputed wholesale on every resize, never patched.

use crate::config::ViewerConfig;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// One page per view
    Mobile,
    /// Two-page spreads after the cover
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerLayout {
    pub page_width: u32,
    pub page_height: f32,
    pub device_class: DeviceClass,
}

/// Size of the viewer's container and of the window it lives in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub container_width: f32,
    pub viewport_height: f32,
}

impl ViewportSize {
    pub fn new(container_width: f32, viewport_height: f32) -> Self {
        Self {
            container_width,
            viewport_height,
        }
    }

    fn is_usable(&self) -> bool {
        self.container_width.is_finite()
            && self.viewport_height.is_finite()
            && self.container_width > 0.0
            && self.viewport_height > 0.0
    }
}

/// Page sizing parameters, taken from [`ViewerConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub aspect_ratio: f32,
    pub mobile_breakpoint: f32,
    pub mobile_margin: f32,
    pub desktop_margin: f32,
    pub reserved_chrome_height: f32,
    pub min_page_width: f32,
    pub max_page_width: f32,
}

impl From<&ViewerConfig> for LayoutParams {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            aspect_ratio: config.aspect_ratio,
            mobile_breakpoint: config.mobile_breakpoint,
            mobile_margin: config.mobile_margin,
            desktop_margin: config.desktop_margin,
            reserved_chrome_height: config.reserved_chrome_height,
            min_page_width: config.min_page_width,
            max_page_width: config.max_page_width,
        }
    }
}

impl LayoutParams {
    pub fn device_class(&self, container_width: f32) -> DeviceClass {
        if container_width < self.mobile_breakpoint {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn available_height(&self, viewport_height: f32) -> f32 {
        viewport_height - self.reserved_chrome_height
    }

    /// Computes the page layout for a viewport.
    ///
    /// Returns `None` for degenerate sizes (zero, negative or non-finite).
    pub fn compute(&self, size: ViewportSize) -> Option<ViewerLayout> {
        if !size.is_usable() {
            return None;
        }

        let device_class = self.device_class(size.container_width);
        let mut width = match device_class {
            DeviceClass::Mobile => size.container_width - self.mobile_margin,
            DeviceClass::Desktop => size.container_width / 2.0 - self.desktop_margin,
        };

        let available_height = self.available_height(size.viewport_height);
        if width * self.aspect_ratio > available_height {
            width = available_height / self.aspect_ratio;
        }

        let page_width = width
            .max(self.min_page_width)
            .min(self.max_page_width)
            .floor() as u32;

        Some(ViewerLayout {
            page_width,
            page_height: page_width as f32 * self.aspect_ratio,
            device_class,
        })
    }
}

/// Holds the last valid layout and replaces it on every usable resize.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    params: LayoutParams,
    current: Option<ViewerLayout>,
}

impl LayoutEngine {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params,
            current: None,
        }
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn current(&self) -> Option<ViewerLayout> {
        self.current
    }

    /// Recomputes the layout. Degenerate sizes are ignored and the previous
    /// layout is kept.
    pub fn apply(&mut self, size: ViewportSize) -> Option<ViewerLayout> {
        match self.params.compute(size) {
            Some(layout) => {
                if self.current != Some(layout) {
                    debug!(
                        width = layout.page_width,
                        height = layout.page_height,
                        device = ?layout.device_class,
                        "layout recomputed"
                    );
                }
                self.current = Some(layout);
            }
            None => {
                warn!(
                    container_width = size.container_width,
                    viewport_height = size.viewport_height,
                    "ignoring degenerate viewport size"
                );
            }
        }
        self.current
    }
}
