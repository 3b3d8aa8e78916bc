//! Capabilities provided by the embedding application.
//!
//! Every capability is optional. The default implementations report
//! [`HostError::Unsupported`] and callers fall back where a fallback exists.

use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

pub trait Host {
    /// Toggles fullscreen on the viewer's root. Returns whether the viewer
    /// is now fullscreen.
    fn toggle_fullscreen(&mut self) -> Result<bool, HostError> {
        Err(HostError::Unsupported("fullscreen"))
    }

    fn share(&mut self, _request: &ShareRequest) -> Result<(), HostError> {
        Err(HostError::Unsupported("share"))
    }

    fn copy_to_clipboard(&mut self, _text: &str) -> Result<(), HostError> {
        Err(HostError::Unsupported("clipboard"))
    }

    /// Hands a file to the host's download sink.
    fn save_file(&mut self, _file_name: &str, _bytes: &[u8]) -> Result<(), HostError> {
        Err(HostError::Unsupported("download"))
    }
}

/// A host with no capabilities at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl Host for NoHost {}
