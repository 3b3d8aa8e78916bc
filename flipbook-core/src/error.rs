use thiserror::Error;

/// The document source could not produce a document. Terminal for the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("document source unreachable: {0}")]
    Unreachable(String),

    #[error("document could not be parsed: {0}")]
    Unparseable(String),
}

/// A single page failed to rasterize.
///
/// Scoped to one page: siblings keep rendering and stay interactive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to render page {page_number}: {reason}")]
pub struct RenderError {
    pub page_number: u32,
    pub reason: String,
}

impl RenderError {
    pub fn new(page_number: u32, reason: impl Into<String>) -> Self {
        Self {
            page_number,
            reason: reason.into(),
        }
    }
}

/// Capture could not be produced. Non-fatal, the export may be retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("page {0} is still loading, wait until it is fully rendered")]
    NotRendered(u32),

    #[error("page {0} could not be rendered and cannot be exported")]
    RenderFailed(u32),

    #[error("page {0} is not part of the visible spread")]
    NotVisible(u32),

    #[error("failed to encode page {page_number}: {reason}")]
    Encode { page_number: u32, reason: String },

    #[error("capture unavailable: {0}")]
    Unavailable(String),
}

/// A host capability failed or does not exist on this host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),

    #[error("{action} failed: {reason}")]
    Failed { action: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
