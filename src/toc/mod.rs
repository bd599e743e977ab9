//! Table of contents: detection and the structured entry list.
//!
//! Detection ([`TocLocator`]) finds the physical pages holding the TOC. Turning the
//! raw text of those pages into a [`TocStructure`] is the job of an external
//! structuring collaborator; the types here are what it hands back.
//!
//! Entries form an implicit tree through their dotted numbers ("1" owns "1.1",
//! which owns "1.1.2"). No parent pointers are stored; membership is derived by
//! prefix matching at lookup time.

pub mod locator;
pub mod patterns;
pub mod strategy;

pub use locator::{toc_text, TocLocator};
pub use strategy::{
    ColumnarStrategy, EnhancedColumnStrategy, NumericDensityStrategy, SimpleStrategy, TocStrategy,
};

use serde::{Deserialize, Serialize};

/// Level of a chapter entry.
pub const CHAPTER_LEVEL: u32 = 0;
/// Level of a section entry.
pub const SECTION_LEVEL: u32 = 1;

/// One line of a structured table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Hierarchy depth: 0 = chapter, 1 = section, 2+ = subsection
    pub level: u32,
    /// Dotted number, e.g. "1" or "1.1"
    pub number: String,
    /// Entry title
    pub title: String,
    /// Printed (logical) page number as it appears in the TOC
    pub page: u32,
}

impl TocEntry {
    /// Create a new entry.
    pub fn new(level: u32, number: impl Into<String>, title: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            number: number.into(),
            title: title.into(),
            page,
        }
    }

    /// Whether this is a chapter-level entry.
    pub fn is_chapter(&self) -> bool {
        self.level == CHAPTER_LEVEL
    }

    /// Whether this is a section-level entry belonging to chapter `chapter`.
    pub fn is_section_of(&self, chapter: &str) -> bool {
        self.level == SECTION_LEVEL
            && self
                .number
                .strip_prefix(chapter)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Ordered list of TOC entries, as produced by the structuring collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocStructure {
    /// Entries in TOC order
    pub entries: Vec<TocEntry>,
}

impl TocStructure {
    /// Create a structure from its entries.
    pub fn new(entries: Vec<TocEntry>) -> Self {
        Self { entries }
    }

    /// Parse the collaborator's JSON form: `{"entries": [...]}`.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the structure has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chapter-level entries in TOC order.
    pub fn chapters(&self) -> impl Iterator<Item = &TocEntry> {
        self.entries.iter().filter(|e| e.is_chapter())
    }

    /// The chapter numbered `number`.
    pub fn chapter(&self, number: &str) -> Option<&TocEntry> {
        self.chapters().find(|e| e.number == number)
    }

    /// Section-level entries of chapter `number`, in TOC order.
    pub fn sections_of<'a>(&'a self, number: &'a str) -> impl Iterator<Item = &'a TocEntry> + 'a {
        self.entries.iter().filter(move |e| e.is_section_of(number))
    }

    /// The chapter that follows `chapter` in the book: the chapter entry with the
    /// smallest printed page after it.
    pub fn next_chapter(&self, chapter: &TocEntry) -> Option<&TocEntry> {
        self.chapters()
            .filter(|e| e.page > chapter.page)
            .min_by_key(|e| e.page)
    }
}
