//! Error types for the structure-inference library.
//!
//! This module defines all error types that can occur while locating a table of
//! contents, resolving the page offset and extracting chapter content.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during structure inference.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No table of contents region was detected, or the structured TOC is empty
    #[error("Table of contents not found: {0}")]
    TocNotFound(String),

    /// The logical-to-physical page offset could not be corroborated
    #[error("Page offset unresolved: {0}")]
    PageOffsetUnresolved(String),

    /// Requested chapter is absent from the structured TOC
    #[error("Chapter {0} not found in table of contents")]
    ChapterNotFound(String),

    /// Lower-level failure while pulling or splitting chapter content
    #[error("Failed to extract chapter {chapter}: {source}")]
    ContentExtractionFailed {
        /// Chapter number that was being extracted
        chapter: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Page index outside the document
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested physical page index
        index: usize,
        /// Number of pages in the document
        count: usize,
    },

    /// A page exists but its text could not be read
    #[error("Page {index} unreadable: {reason}")]
    PageUnreadable {
        /// Physical page index
        index: usize,
        /// Reason reported by the document collaborator
        reason: String,
    },

    /// Configuration value outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Token counting failed
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// An external collaborator (TOC structuring, question generation) failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap this error as a content-extraction failure for `chapter`.
    ///
    /// Errors that already carry chapter context are returned unchanged.
    pub fn in_chapter(self, chapter: &str) -> Error {
        match self {
            err @ Error::ContentExtractionFailed { .. } => err,
            other => Error::ContentExtractionFailed {
                chapter: chapter.to_string(),
                source: Box::new(other),
            },
        }
    }
}
