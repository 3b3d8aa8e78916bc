//! Page image export.
//!
//! A single visible page is captured straight away. A desktop spread is
//! never resolved silently: the caller gets a [`SpreadSelection`] and picks
//! the left page, the right page or both.

use crate::config::ExportFormat;
use crate::error::ExportError;
use crate::host::Host;
use crate::raster::{PageSurface, RasterAdapter, RasterHandle, Rasterizer};
use crate::spread::VisibleSpread;
use image::DynamicImage;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureChoice {
    Left,
    Right,
    Both,
}

/// The two sides of a visible spread, offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadSelection {
    pub left: u32,
    pub right: Option<u32>,
}

impl SpreadSelection {
    /// `Right` and `Both` are only offered when the right page exists.
    pub fn options(&self) -> Vec<CaptureChoice> {
        match self.right {
            Some(_) => vec![CaptureChoice::Left, CaptureChoice::Right, CaptureChoice::Both],
            None => vec![CaptureChoice::Left],
        }
    }

    pub fn pages(&self, choice: CaptureChoice) -> Result<Vec<u32>, ExportError> {
        match (choice, self.right) {
            (CaptureChoice::Left, _) => Ok(vec![self.left]),
            (CaptureChoice::Right, Some(right)) => Ok(vec![right]),
            (CaptureChoice::Both, Some(right)) => Ok(vec![self.left, right]),
            (_, None) => Err(ExportError::NotVisible(self.left + 1)),
        }
    }
}

/// An encoded page image ready for the download sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub page_number: u32,
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRequest {
    Captured(ExportArtifact),
    NeedsSelection(SpreadSelection),
}

#[derive(Debug, Clone)]
pub struct Exporter {
    document_id: String,
    format: ExportFormat,
    stagger: Duration,
}

impl Exporter {
    pub fn new(document_id: impl Into<String>, format: ExportFormat, stagger: Duration) -> Self {
        Self {
            document_id: document_id.into(),
            format,
            stagger,
        }
    }

    /// `<document-id>-page-<n>.<ext>`
    pub fn file_name(&self, page_number: u32) -> String {
        format!(
            "{}-page-{}.{}",
            self.document_id,
            page_number,
            self.format.extension()
        )
    }

    /// Captures what is on screen, or asks which side of a spread to take.
    pub fn capture_current<R: Rasterizer>(
        &self,
        spread: VisibleSpread,
        rasters: &RasterAdapter<R>,
    ) -> Result<CaptureRequest, ExportError> {
        match spread {
            VisibleSpread::Single(page) => {
                self.capture_page(page, rasters).map(CaptureRequest::Captured)
            }
            VisibleSpread::Pair { left, right } => {
                debug!(left, ?right, "spread visible, asking for a side");
                Ok(CaptureRequest::NeedsSelection(SpreadSelection { left, right }))
            }
        }
    }

    /// Captures the chosen side(s) of a spread.
    ///
    /// All requested pages must be rendered; nothing is produced otherwise.
    pub fn capture_selection<R: Rasterizer>(
        &self,
        selection: &SpreadSelection,
        choice: CaptureChoice,
        rasters: &RasterAdapter<R>,
    ) -> Result<Vec<ExportArtifact>, ExportError> {
        selection
            .pages(choice)?
            .into_iter()
            .map(|page| self.capture_page(page, rasters))
            .collect()
    }

    pub fn capture_page<R: Rasterizer>(
        &self,
        page_number: u32,
        rasters: &RasterAdapter<R>,
    ) -> Result<ExportArtifact, ExportError> {
        let handle = match rasters.surface(page_number) {
            PageSurface::Ready(handle) => handle,
            PageSurface::Pending => {
                warn!(page_number, "export requested before page was rendered");
                return Err(ExportError::NotRendered(page_number));
            }
            PageSurface::Failed(_) => return Err(ExportError::RenderFailed(page_number)),
        };
        self.encode(&handle)
    }

    pub fn encode(&self, handle: &RasterHandle) -> Result<ExportArtifact, ExportError> {
        let page_number = handle.page_number();
        let mut bytes = Cursor::new(Vec::new());
        let written = match self.format {
            ExportFormat::Png => handle.image().write_to(&mut bytes, self.format.image_format()),
            // JPEG has no alpha channel
            ExportFormat::Jpeg => DynamicImage::ImageRgba8(handle.image().clone())
                .into_rgb8()
                .write_to(&mut bytes, self.format.image_format()),
        };
        written.map_err(|err| ExportError::Encode {
            page_number,
            reason: err.to_string(),
        })?;

        Ok(ExportArtifact {
            page_number,
            file_name: self.file_name(page_number),
            format: self.format,
            bytes: bytes.into_inner(),
        })
    }

    /// Saves artifacts through the host's download sink, pausing between
    /// consecutive files.
    pub async fn deliver<H: Host>(
        &self,
        artifacts: &[ExportArtifact],
        host: &mut H,
    ) -> Result<(), ExportError> {
        for (i, artifact) in artifacts.iter().enumerate() {
            if i > 0 && !self.stagger.is_zero() {
                tokio::time::sleep(self.stagger).await;
            }
            host.save_file(&artifact.file_name, &artifact.bytes)
                .map_err(|err| ExportError::Unavailable(err.to_string()))?;
            debug!(file = %artifact.file_name, "page exported");
        }
        Ok(())
    }
}
