//! Viewer configuration.
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it overrides. Configuration can be loaded from JSON or built in code
//! with the `with_*` setters.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Image encoding used for exported pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub(crate) fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Page height divided by page width
    pub aspect_ratio: f32,
    /// Container widths below this use the single-page mobile layout
    pub mobile_breakpoint: f32,
    pub mobile_margin: f32,
    pub desktop_margin: f32,
    /// Vertical space kept free for navigation and zoom controls
    pub reserved_chrome_height: f32,
    pub min_page_width: f32,
    pub max_page_width: f32,
    pub flip_duration_ms: u64,
    pub max_scale: f32,
    pub zoom_step: f32,
    pub wheel_step: f32,
    pub lock_epsilon: f32,
    /// Whether prev/next buttons keep working while zoomed in
    pub navigation_while_zoomed: bool,
    pub resize_debounce_ms: u64,
    pub export_stagger_ms: u64,
    pub export_format: ExportFormat,
    /// Horizontal drag distance, in pixels, that counts as a flip
    pub drag_flip_threshold: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.42,
            mobile_breakpoint: 768.0,
            mobile_margin: 10.0,
            desktop_margin: 30.0,
            reserved_chrome_height: 190.0,
            min_page_width: 200.0,
            max_page_width: 1000.0,
            flip_duration_ms: 800,
            max_scale: 5.0,
            zoom_step: 0.5,
            wheel_step: 0.1,
            lock_epsilon: 0.001,
            navigation_while_zoomed: true,
            resize_debounce_ms: 150,
            export_stagger_ms: 500,
            export_format: ExportFormat::Png,
            drag_flip_threshold: 40.0,
        }
    }
}

impl ViewerConfig {
    /// Parses a JSON configuration and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "aspect_ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.min_page_width <= 0.0 || self.min_page_width > self.max_page_width {
            return Err(ConfigError::Invalid(format!(
                "page width range [{}, {}] is empty",
                self.min_page_width, self.max_page_width
            )));
        }
        if self.max_scale.is_nan() || self.max_scale < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "max_scale must be at least 1, got {}",
                self.max_scale
            )));
        }
        if self.zoom_step <= 0.0 || self.wheel_step <= 0.0 || self.wheel_step >= 1.0 {
            return Err(ConfigError::Invalid(
                "zoom_step must be positive and wheel_step must lie in (0, 1)".to_string(),
            ));
        }
        if self.lock_epsilon < 0.0 {
            return Err(ConfigError::Invalid("lock_epsilon cannot be negative".to_string()));
        }
        Ok(())
    }

    pub fn flip_duration(&self) -> Duration {
        Duration::from_millis(self.flip_duration_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn export_stagger(&self) -> Duration {
        Duration::from_millis(self.export_stagger_ms)
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: f32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_margins(mut self, mobile: f32, desktop: f32) -> Self {
        self.mobile_margin = mobile;
        self.desktop_margin = desktop;
        self
    }

    pub fn with_reserved_chrome_height(mut self, height: f32) -> Self {
        self.reserved_chrome_height = height;
        self
    }

    pub fn with_flip_duration_ms(mut self, ms: u64) -> Self {
        self.flip_duration_ms = ms;
        self
    }

    pub fn with_max_scale(mut self, max_scale: f32) -> Self {
        self.max_scale = max_scale;
        self
    }

    pub fn with_navigation_while_zoomed(mut self, enabled: bool) -> Self {
        self.navigation_while_zoomed = enabled;
        self
    }

    pub fn with_resize_debounce_ms(mut self, ms: u64) -> Self {
        self.resize_debounce_ms = ms;
        self
    }

    pub fn with_export_stagger_ms(mut self, ms: u64) -> Self {
        self.export_stagger_ms = ms;
        self
    }

    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }
}
