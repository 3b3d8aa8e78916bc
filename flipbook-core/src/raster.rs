//! Page rasterization registry.
//!
//! Wraps the external [`Rasterizer`] and keeps one surface per page at the
//! most recently requested width. Concurrent requests for the same page and
//! width share a single render, and a failure only affects its own page.

use crate::error::RenderError;
use image::RgbaImage;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Renders one page of a document at a pixel width.
pub trait Rasterizer: Send + Sync {
    fn render(
        &self,
        page_number: u32,
        width: u32,
    ) -> impl Future<Output = Result<RgbaImage, RenderError>> + Send;
}

impl<R: Rasterizer> Rasterizer for Arc<R> {
    fn render(
        &self,
        page_number: u32,
        width: u32,
    ) -> impl Future<Output = Result<RgbaImage, RenderError>> + Send {
        self.as_ref().render(page_number, width)
    }
}

/// A rendered page. Cheap to clone, the pixels are shared.
#[derive(Debug, Clone)]
pub struct RasterHandle {
    page_number: u32,
    width: u32,
    image: Arc<RgbaImage>,
}

impl RasterHandle {
    pub fn new(page_number: u32, width: u32, image: RgbaImage) -> Self {
        Self {
            page_number,
            width,
            image: Arc::new(image),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Width the page was requested at.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl PartialEq for RasterHandle {
    fn eq(&self, other: &Self) -> bool {
        self.page_number == other.page_number
            && self.width == other.width
            && Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Display state of one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSurface {
    Ready(RasterHandle),
    /// Not requested yet, or still rendering
    Pending,
    /// Rendering failed, show a placeholder
    Failed(RenderError),
}

type RenderResult = Result<RasterHandle, RenderError>;

#[derive(Debug)]
struct Slot {
    width: u32,
    /// Outcome of the render shared by every request for this width
    cell: Arc<OnceCell<RenderResult>>,
}

impl Slot {
    fn new(width: u32) -> Self {
        Self {
            width,
            cell: Arc::new(OnceCell::new()),
        }
    }

    fn has_failed(&self) -> bool {
        matches!(self.cell.get(), Some(Err(_)))
    }
}

pub struct RasterAdapter<R> {
    rasterizer: R,
    page_count: u32,
    slots: Mutex<HashMap<u32, Slot>>,
}

impl<R: Rasterizer> RasterAdapter<R> {
    pub fn new(rasterizer: R, page_count: u32) -> Self {
        Self {
            rasterizer,
            page_count,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Makes sure `page_number` is rendered at `width`.
    ///
    /// Safe to call repeatedly: a finished render is returned from the
    /// registry and an in-flight one is awaited instead of started again,
    /// so every waiter sees the same success or failure. A new width
    /// replaces the page's previous surface, and a request arriving after
    /// a failed render starts a fresh attempt.
    pub async fn ensure_rendered(
        &self,
        page_number: u32,
        width: u32,
    ) -> Result<RasterHandle, RenderError> {
        if page_number == 0 || page_number > self.page_count {
            return Err(RenderError::new(
                page_number,
                format!("page out of range 1..={}", self.page_count),
            ));
        }
        if width == 0 {
            return Err(RenderError::new(page_number, "zero render width"));
        }

        let cell = {
            let mut slots = self.slots();
            let slot = slots
                .entry(page_number)
                .or_insert_with(|| Slot::new(width));
            if slot.width != width {
                debug!(page_number, old = slot.width, new = width, "surface invalidated");
                *slot = Slot::new(width);
            } else if slot.has_failed() {
                debug!(page_number, width, "retrying failed page");
                *slot = Slot::new(width);
            }
            Arc::clone(&slot.cell)
        };

        cell.get_or_init(|| async {
            debug!(page_number, width, "rendering page");
            match self.rasterizer.render(page_number, width).await {
                Ok(image) => Ok(RasterHandle::new(page_number, width, image)),
                Err(err) => {
                    warn!(page_number, width, error = %err, "page render failed");
                    Err(err)
                }
            }
        })
        .await
        .clone()
    }

    /// Finished surface for a page, if any.
    pub fn handle(&self, page_number: u32) -> Option<RasterHandle> {
        self.slots()
            .get(&page_number)
            .and_then(|slot| slot.cell.get())
            .and_then(|result| result.as_ref().ok().cloned())
    }

    pub fn surface(&self, page_number: u32) -> PageSurface {
        let slots = self.slots();
        match slots.get(&page_number) {
            Some(slot) => match slot.cell.get() {
                Some(Ok(handle)) => PageSurface::Ready(handle.clone()),
                Some(Err(err)) => PageSurface::Failed(err.clone()),
                None => PageSurface::Pending,
            },
            None => PageSurface::Pending,
        }
    }

    /// Width a page was last requested at.
    pub fn requested_width(&self, page_number: u32) -> Option<u32> {
        self.slots().get(&page_number).map(|slot| slot.width)
    }

    pub fn rendered_count(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot.cell.get(), Some(Ok(_))))
            .count()
    }

    /// Drops every surface, returning how many were held.
    pub fn release_all(&self) -> usize {
        let mut slots = self.slots();
        let released = slots.len();
        slots.clear();
        released
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<u32, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
