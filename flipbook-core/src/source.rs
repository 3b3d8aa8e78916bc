use crate::error::LoadError;
use std::fmt;
use std::future::Future;

/// Opaque reference to a document's bytes, usually a URL or a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a source reports about a loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub title: Option<String>,
}

/// Resolves a [`SourceRef`] into a document.
pub trait DocumentSource: Send + Sync {
    fn load(
        &self,
        reference: &SourceRef,
    ) -> impl Future<Output = Result<DocumentInfo, LoadError>> + Send;
}

/// A loaded document. Immutable for the whole viewing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    source: SourceRef,
    page_count: u32,
    title: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, source: SourceRef, info: DocumentInfo) -> Self {
        Self {
            id: id.into(),
            source,
            page_count: info.page_count,
            title: info.title,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Title for display, falling back to the document id.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}
