//! Flipbook Core
//!
//! Paginated document viewer engine. Lays out pages for the current
//! viewport, flips between them with animation, zooms and pans the page
//! surface, and exports rendered pages as images.
//!
//! Documents and page rasters come from the host through the
//! [`DocumentSource`] and [`Rasterizer`] traits.

pub mod config;
pub mod error;
pub mod export;
pub mod flip;
pub mod host;
pub mod layout;
pub mod raster;
pub mod resize;
pub mod source;
pub mod spread;
pub mod transform;
pub mod viewer;

pub use config::{ExportFormat, ViewerConfig};
pub use error::{ConfigError, ExportError, HostError, LoadError, RenderError};
pub use export::{CaptureChoice, CaptureRequest, ExportArtifact, Exporter, SpreadSelection};
pub use flip::{FlipDirection, FlipGesture, FlipMachine, FlipOutcome, FlipStatus, NavStep, Side};
pub use host::{Host, NoHost, ShareRequest};
pub use layout::{DeviceClass, LayoutEngine, LayoutParams, ViewerLayout, ViewportSize};
pub use raster::{PageSurface, RasterAdapter, RasterHandle, Rasterizer};
pub use resize::ResizeObserver;
pub use source::{Document, DocumentInfo, DocumentSource, SourceRef};
pub use spread::{spread_for, VisibleSpread};
pub use transform::{InputLock, TransformController, TransformState, ZoomReadout};
pub use viewer::{DownloadLink, PageReadout, ShareOutcome, TickReport, Viewer};
