//! The viewer: one document, one viewport, one set of states.
//!
//! `Viewer` owns the layout, navigation, transform and export state of a
//! single viewing session and routes host input between them. Nothing is
//! shared between viewers.

use crate::config::ViewerConfig;
use crate::error::{ExportError, HostError, LoadError, RenderError};
use crate::export::{CaptureChoice, CaptureRequest, ExportArtifact, Exporter, SpreadSelection};
use crate::flip::{FlipGesture, FlipMachine, FlipOutcome, FlipStatus, NavStep};
use crate::host::{Host, ShareRequest};
use crate::layout::{DeviceClass, LayoutEngine, LayoutParams, ViewerLayout, ViewportSize};
use crate::raster::{PageSurface, RasterAdapter, RasterHandle, Rasterizer};
use crate::resize::ResizeObserver;
use crate::source::{Document, DocumentSource, SourceRef};
use crate::spread::{spread_for, VisibleSpread};
use crate::transform::{InputLock, TransformController, TransformState, ZoomReadout};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Page position for display, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReadout {
    pub current: u32,
    pub total: u32,
}

/// What changed during a [`Viewer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    pub layout: Option<ViewerLayout>,
    pub committed: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// The host could not share, the link was copied instead
    CopiedLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub file_name: String,
}

pub struct Viewer<R> {
    document: Document,
    config: ViewerConfig,
    layout: LayoutEngine,
    resize: ResizeObserver,
    flip: FlipMachine,
    transform: TransformController,
    rasters: Arc<RasterAdapter<R>>,
    exporter: Exporter,
    pages: watch::Sender<PageReadout>,
}

impl<R: Rasterizer> Viewer<R> {
    /// Loads the document and mounts the viewer at `viewport`.
    ///
    /// `config` is expected to be validated already (see
    /// [`ViewerConfig::validate`]). A load failure is terminal.
    pub async fn open<S: DocumentSource>(
        source: &S,
        document_id: impl Into<String>,
        reference: SourceRef,
        rasterizer: R,
        config: ViewerConfig,
        viewport: ViewportSize,
    ) -> Result<Self, LoadError> {
        let document_id = document_id.into();
        let info = source.load(&reference).await.map_err(|err| {
            error!(document = %document_id, source = %reference, error = %err, "failed to load document");
            err
        })?;
        let document = Document::new(document_id, reference, info);
        info!(
            document = document.id(),
            pages = document.page_count(),
            "document loaded"
        );

        let flip = FlipMachine::new(document.page_count(), config.flip_duration())
            .with_navigation_while_zoomed(config.navigation_while_zoomed)
            .with_drag_threshold(config.drag_flip_threshold);
        let exporter = Exporter::new(
            document.id(),
            config.export_format,
            config.export_stagger(),
        );
        let (pages, _) = watch::channel(PageReadout {
            current: 1u32.min(document.page_count()),
            total: document.page_count(),
        });

        let mut viewer = Self {
            rasters: Arc::new(RasterAdapter::new(rasterizer, document.page_count())),
            layout: LayoutEngine::new(LayoutParams::from(&config)),
            resize: ResizeObserver::with_debounce(config.resize_debounce()),
            transform: TransformController::new(&config),
            flip,
            exporter,
            pages,
            document,
            config,
        };

        viewer.resize.observe(viewport, Instant::now());
        if let Some(size) = viewer.resize.flush() {
            viewer.apply_size(size);
        }
        Ok(viewer)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn layout(&self) -> Option<ViewerLayout> {
        self.layout.current()
    }

    pub fn device_class(&self) -> DeviceClass {
        self.layout
            .current()
            .map(|layout| layout.device_class)
            .unwrap_or(DeviceClass::Desktop)
    }

    pub fn current_index(&self) -> u32 {
        self.flip.current_index()
    }

    pub fn flip_status(&self) -> FlipStatus {
        self.flip.status()
    }

    pub fn page_readout(&self) -> PageReadout {
        *self.pages.borrow()
    }

    pub fn subscribe_pages(&self) -> watch::Receiver<PageReadout> {
        self.pages.subscribe()
    }

    pub fn subscribe_zoom(&self) -> watch::Receiver<ZoomReadout> {
        self.transform.subscribe()
    }

    pub fn transform(&self) -> TransformState {
        self.transform.state()
    }

    pub fn input_lock(&self) -> InputLock {
        self.transform.lock()
    }

    pub fn visible_spread(&self) -> Option<VisibleSpread> {
        spread_for(
            self.flip.current_index(),
            self.document.page_count(),
            self.device_class(),
        )
    }

    /// Records a resize or orientation change. Applied on a later
    /// [`tick`](Self::tick) once the viewport settles.
    pub fn resize(&mut self, viewport: ViewportSize, now: Instant) {
        self.resize.observe(viewport, now);
    }

    /// Drives debounced layout updates and the flip animation clock.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let layout = self
            .resize
            .poll(now)
            .and_then(|size| self.apply_size(size));
        let committed = self.flip.advance(now);
        if committed.is_some() {
            self.publish_page();
        }
        TickReport { layout, committed }
    }

    /// Completion callback for an externally driven flip animation.
    pub fn finish_flip(&mut self) -> Option<u32> {
        let committed = self.flip.finish_animation();
        if committed.is_some() {
            self.publish_page();
        }
        committed
    }

    /// Toolbar navigation.
    pub fn navigate(&mut self, step: NavStep, now: Instant) -> FlipOutcome {
        let device = self.device_class();
        self.flip.button(step, self.transform.lock(), device, now)
    }

    /// Jumps to a 1-based page number.
    pub fn go_to_page(&mut self, page_number: i64, now: Instant) -> FlipOutcome {
        self.navigate(NavStep::Index(page_number.saturating_sub(1)), now)
    }

    /// Pointer input on the book.
    pub fn flip_gesture(&mut self, gesture: FlipGesture, now: Instant) -> FlipOutcome {
        let device = self.device_class();
        self.flip.gesture(gesture, self.transform.lock(), device, now)
    }

    pub fn zoom_in(&mut self) {
        self.transform.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.transform.zoom_out();
    }

    pub fn reset_zoom(&mut self) {
        self.transform.reset();
    }

    pub fn wheel(&mut self, delta_y: f32, focal: (f32, f32)) {
        self.transform.wheel(delta_y, focal);
    }

    pub fn pinch(&mut self, factor: f32, focal: (f32, f32)) {
        self.transform.pinch(factor, focal);
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.transform.pan(dx, dy);
    }

    /// Shared handle to the raster registry, for background rendering.
    pub fn rasters(&self) -> Arc<RasterAdapter<R>> {
        Arc::clone(&self.rasters)
    }

    /// Every page at the current page width: visible pages first, then the
    /// rest by distance from the current spread.
    pub fn render_plan(&self) -> Vec<(u32, u32)> {
        let Some(layout) = self.layout.current() else {
            return Vec::new();
        };
        let Some(spread) = self.visible_spread() else {
            return Vec::new();
        };

        let visible = spread.pages();
        let distance = |page: u32| {
            visible
                .iter()
                .map(|&shown| shown.abs_diff(page))
                .min()
                .unwrap_or(u32::MAX)
        };
        let mut rest: Vec<u32> = (1..=self.document.page_count())
            .filter(|page| !visible.contains(page))
            .collect();
        rest.sort_by_key(|&page| (distance(page), page));

        visible
            .into_iter()
            .chain(rest)
            .map(|page| (page, layout.page_width))
            .collect()
    }

    /// Renders the visible pages. Failures stay scoped to their page.
    pub async fn render_visible(&self) -> Vec<Result<RasterHandle, RenderError>> {
        let Some(layout) = self.layout.current() else {
            return Vec::new();
        };
        let Some(spread) = self.visible_spread() else {
            return Vec::new();
        };

        let mut results = Vec::new();
        for page in spread.pages() {
            results.push(self.rasters.ensure_rendered(page, layout.page_width).await);
        }
        results
    }

    /// What to draw for a page. A failed page gets a placeholder.
    pub fn page_view(&self, page_number: u32) -> PageSurface {
        self.rasters.surface(page_number)
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    pub fn capture_current(&self) -> Result<CaptureRequest, ExportError> {
        let spread = self
            .visible_spread()
            .ok_or_else(|| ExportError::Unavailable("document has no pages".to_string()))?;
        self.exporter.capture_current(spread, &self.rasters)
    }

    /// Resolves a spread selection. The selection must still match the
    /// visible spread.
    pub fn capture_selection(
        &self,
        selection: &SpreadSelection,
        choice: CaptureChoice,
    ) -> Result<Vec<ExportArtifact>, ExportError> {
        match self.visible_spread() {
            Some(VisibleSpread::Pair { left, .. }) if left == selection.left => {
                self.exporter
                    .capture_selection(selection, choice, &self.rasters)
            }
            _ => {
                warn!(left = selection.left, "spread selection no longer visible");
                Err(ExportError::NotVisible(selection.left))
            }
        }
    }

    pub fn share_request(&self) -> ShareRequest {
        let title = self.document.title().to_string();
        ShareRequest {
            text: format!(
                "Read the digital edition of {title}. I'm on page {}.",
                self.page_readout().current
            ),
            url: self.document.source().to_string(),
            title,
        }
    }

    /// Shares the current page, falling back to copying the link.
    pub fn share<H: Host>(&self, host: &mut H) -> Result<ShareOutcome, HostError> {
        let request = self.share_request();
        match host.share(&request) {
            Ok(()) => Ok(ShareOutcome::Shared),
            Err(err) => {
                debug!(error = %err, "share unavailable, copying link");
                host.copy_to_clipboard(&request.url)?;
                Ok(ShareOutcome::CopiedLink)
            }
        }
    }

    pub fn toggle_fullscreen<H: Host>(&self, host: &mut H) -> Result<bool, HostError> {
        host.toggle_fullscreen()
    }

    /// Link to the full document.
    pub fn download_link(&self) -> DownloadLink {
        DownloadLink {
            url: self.document.source().to_string(),
            file_name: format!("{}.pdf", self.document.id()),
        }
    }

    /// Tears the viewer down. Returns how many raster handles were released.
    pub fn close(mut self) -> usize {
        self.resize.detach();
        self.flip.cancel();
        let released = self.rasters.release_all();
        debug!(document = self.document.id(), released, "viewer closed");
        released
    }

    fn apply_size(&mut self, size: ViewportSize) -> Option<ViewerLayout> {
        let previous = self.layout.current();
        let layout = self.layout.apply(size)?;
        if previous == Some(layout) {
            return None;
        }

        if previous.is_some_and(|old| old.device_class != layout.device_class) {
            debug!(device = ?layout.device_class, "device class changed, resetting zoom");
            self.transform.reset();
        }
        let spread_pages = match layout.device_class {
            DeviceClass::Mobile => 1.0,
            DeviceClass::Desktop => 2.0,
        };
        self.transform
            .set_bounds(layout.page_width as f32 * spread_pages, layout.page_height);
        Some(layout)
    }

    fn publish_page(&self) {
        self.pages.send_replace(PageReadout {
            current: self.flip.current_index() + 1,
            total: self.document.page_count(),
        });
    }
}
