// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # TOC Oxide
//!
//! Structure inference for book-length documents: find the table of contents,
//! map printed page numbers to physical pages, and pull chapter sections sized
//! for a language model.
//!
//! ## Core Features
//!
//! - **TOC Location**: 4 cascading strategies (page-number columns, fixed columns,
//!   numeric density, label scan) behind one shared validator
//! - **Offset Resolution**: printed-page to physical-page offset corroborated by
//!   chapter titles in page headers and footers
//! - **Section Extraction**: TOC-driven section boundaries, batched page reads with
//!   cooperative pacing, token-budget splitting
//! - **Question Allotment**: per-section question counts weighted by text length
//! - **Memoization**: resolved structures cached by content fingerprint
//!
//! ## Architecture
//! - **Document-agnostic**: anything implementing [`PageSource`] can be analysed;
//!   [`PageIndex`] holds a pre-extracted document in memory
//! - **Pluggable Design**: trait-based strategies, token counters, pacers, caches
//!   and external collaborators
//!
//! ## Quick Start
//!
//! ```ignore
//! use toc_oxide::{BookAnalyzer, AnalyzerConfig, PageIndex, TocStructure};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = PageIndex::from_json_file("book.json")?;
//!
//! // The structurer turns raw TOC text into entries, e.g. with a language model
//! let structurer = |text: &str| -> toc_oxide::Result<TocStructure> {
//!     TocStructure::from_json_str(&call_model(text)?)
//! };
//! let analyzer = BookAnalyzer::new(AnalyzerConfig::default(), Box::new(structurer))?;
//!
//! let resolved = analyzer.analyze(&doc)?;
//! let (sections, distribution) = analyzer.extract(&doc, &resolved, "1")?;
//! for (key, text) in &sections {
//!     println!("{}: {} chars, {} questions", key, text.len(), distribution[key]);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Page access
pub mod document;

// Table of contents
pub mod toc;

// Offset resolution
pub mod offset;

// Section extraction
pub mod extract;

// Resource pacing
pub mod pacing;

// Structure memoization
pub mod cache;

// Orchestration
pub mod pipeline;

// Re-exports
pub use cache::{
    fingerprint_bytes, fingerprint_pages, JsonDirCache, MemoryCache, ResolvedStructure,
    StructureCache,
};
pub use config::{
    AnalyzerConfig, ExtractionConfig, LocatorConfig, OffsetConfig, PacingConfig, TocTerms,
};
pub use document::{Page, PageIndex, PageSource, Word};
pub use error::{Error, Result};
pub use extract::{
    ApproxTokenCounter, ExtractedSections, QuestionDistribution, SectionExtractor, TokenCounter,
};
pub use offset::{OffsetResolver, PageOffset};
pub use pacing::{NoopPacer, Pacer, SystemLoadPacer};
pub use pipeline::{
    extract_chapter, locate_toc_pages, resolve_page_offset, BookAnalyzer, ChapterQuestions,
    QuestionAnswer, QuestionGenerator, TocStructurer,
};
pub use toc::{toc_text, TocEntry, TocLocator, TocStructure};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting word positions never panics on a NaN coordinate.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
