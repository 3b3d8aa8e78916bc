use flipbook_core::{DocumentInfo, DocumentSource, LoadError, Rasterizer, RenderError, SourceRef};
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A document stored as one image per page in a directory.
///
/// Pages are ordered by file name, so `page-001.png`, `page-002.png`, ...
/// keeps the expected order.
#[derive(Debug, Default)]
pub struct PageDirectory {
    pages: OnceLock<Vec<PathBuf>>,
}

impl PageDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
        let entries = std::fs::read_dir(root)
            .map_err(|e| LoadError::Unreachable(format!("{}: {}", root.display(), e)))?;

        let mut pages: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(LoadError::Unparseable(format!(
                "no page images in {}",
                root.display()
            )));
        }
        Ok(pages)
    }

    fn page_path(&self, page_number: u32) -> Result<PathBuf, RenderError> {
        let pages = self
            .pages
            .get()
            .ok_or_else(|| RenderError::new(page_number, "document not loaded"))?;
        (page_number as usize)
            .checked_sub(1)
            .and_then(|index| pages.get(index))
            .cloned()
            .ok_or_else(|| RenderError::new(page_number, "page index out of bounds"))
    }
}

impl DocumentSource for PageDirectory {
    async fn load(&self, reference: &SourceRef) -> Result<DocumentInfo, LoadError> {
        let root = PathBuf::from(reference.as_str());
        let title = root
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);

        let scanned = Self::scan(&root)?;
        debug!(root = %root.display(), pages = scanned.len(), "scanned page directory");
        if self.pages.set(scanned).is_err() {
            debug!("directory already loaded, keeping the first scan");
        }
        let page_count = self.pages.get().map_or(0, Vec::len) as u32;

        Ok(DocumentInfo { page_count, title })
    }
}

impl Rasterizer for PageDirectory {
    async fn render(&self, page_number: u32, width: u32) -> Result<RgbaImage, RenderError> {
        let path = self.page_path(page_number)?;

        tokio::task::spawn_blocking(move || render_page(&path, page_number, width))
            .await
            .map_err(|e| RenderError::new(page_number, format!("render task failed: {e}")))?
    }
}

/// Decodes a page image and scales it to `width`, keeping its aspect ratio.
fn render_page(path: &Path, page_number: u32, width: u32) -> Result<RgbaImage, RenderError> {
    let source = image::open(path)
        .map_err(|e| RenderError::new(page_number, format!("{}: {}", path.display(), e)))?;

    let height = (u64::from(source.height()) * u64::from(width) / u64::from(source.width().max(1)))
        .max(1) as u32;
    Ok(source.resize_exact(width, height, FilterType::Triangle).into_rgba8())
}
