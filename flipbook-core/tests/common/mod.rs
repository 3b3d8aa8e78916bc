#![allow(dead_code)]

use flipbook_core::{
    DocumentInfo, DocumentSource, Host, HostError, LoadError, Rasterizer, RenderError,
    ShareRequest, SourceRef,
};
use image::{Rgba, RgbaImage};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct FakeSource {
    pub result: Result<DocumentInfo, LoadError>,
}

impl FakeSource {
    pub fn pages(page_count: u32) -> Self {
        Self {
            result: Ok(DocumentInfo {
                page_count,
                title: Some("Morning Edition".to_string()),
            }),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(LoadError::Unreachable("connection refused".to_string())),
        }
    }
}

impl DocumentSource for FakeSource {
    async fn load(&self, _reference: &SourceRef) -> Result<DocumentInfo, LoadError> {
        self.result.clone()
    }
}

/// Renders solid pages and counts how often it is asked to.
#[derive(Default)]
pub struct FakeRasterizer {
    pub calls: AtomicUsize,
    pub failing: HashSet<u32>,
}

impl FakeRasterizer {
    pub fn failing_on(pages: &[u32]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: pages.iter().copied().collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Rasterizer for FakeRasterizer {
    async fn render(&self, page_number: u32, width: u32) -> Result<RgbaImage, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent callers a chance to pile up on the same key
        tokio::task::yield_now().await;
        if self.failing.contains(&page_number) {
            return Err(RenderError::new(page_number, "malformed content stream"));
        }
        let shade = (page_number * 20 % 255) as u8;
        Ok(RgbaImage::from_pixel(width, width * 3 / 2, Rgba([shade, shade, shade, 255])))
    }
}

/// Host that records what it was asked to do.
#[derive(Default)]
pub struct RecordingHost {
    pub can_share: bool,
    pub shared: Vec<ShareRequest>,
    pub clipboard: Option<String>,
    pub saved: Vec<(String, usize)>,
}

impl Host for RecordingHost {
    fn share(&mut self, request: &ShareRequest) -> Result<(), HostError> {
        if !self.can_share {
            return Err(HostError::Unsupported("share"));
        }
        self.shared.push(request.clone());
        Ok(())
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }

    fn save_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), HostError> {
        self.saved.push((file_name.to_string(), bytes.len()));
        Ok(())
    }
}
