use flipbook_core::{Host, HostError, ShareRequest};
use std::path::PathBuf;
use tracing::info;

/// Host backed by the terminal and a download directory.
///
/// There is no native share sheet, so sharing falls back to the clipboard,
/// which here is standard output.
#[derive(Debug)]
pub struct TerminalHost {
    download_dir: PathBuf,
    fullscreen: bool,
    saved: Vec<PathBuf>,
}

impl TerminalHost {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            fullscreen: false,
            saved: Vec::new(),
        }
    }

    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl Host for TerminalHost {
    fn toggle_fullscreen(&mut self) -> Result<bool, HostError> {
        self.fullscreen = !self.fullscreen;
        Ok(self.fullscreen)
    }

    fn copy_to_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        println!("{text}");
        Ok(())
    }

    fn save_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), HostError> {
        let failed = |e: std::io::Error| HostError::Failed {
            action: "download",
            reason: e.to_string(),
        };

        std::fs::create_dir_all(&self.download_dir).map_err(failed)?;
        let path = self.download_dir.join(file_name);
        std::fs::write(&path, bytes).map_err(failed)?;
        info!(path = %path.display(), size = bytes.len(), "saved file");
        self.saved.push(path);
        Ok(())
    }
}
