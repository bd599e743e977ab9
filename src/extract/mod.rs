//! Chapter content extraction.
//!
//! Turns one chapter of a resolved TOC into section texts that each fit a token
//! budget, and allots a number of questions to every section.
//!
//! # Section boundaries
//!
//! Each section starts at its printed page plus the document offset and ends where
//! the next section starts. The last section of a chapter ends where the next
//! chapter starts, or after a fixed number of pages when the chapter is the last
//! one in the TOC. A chapter without sections is extracted as one section keyed
//! by the chapter number. No range reaches past the end of the document.

pub mod distribution;
pub mod splitter;
pub mod tokens;

pub use distribution::distribute_questions;
pub use splitter::split_by_budget;
#[cfg(feature = "hf-tokenizer")]
pub use tokens::HfTokenCounter;
pub use tokens::{ApproxTokenCounter, TokenCounter};

use std::time::Instant;

use indexmap::IndexMap;

use crate::config::ExtractionConfig;
use crate::document::PageSource;
use crate::error::{Error, Result};
use crate::offset::PageOffset;
use crate::pacing::{NoopPacer, Pacer};
use crate::toc::{TocEntry, TocStructure};

/// Section number → section text, in extraction order.
pub type ExtractedSections = IndexMap<String, String>;

/// Section number → number of questions, in extraction order.
pub type QuestionDistribution = IndexMap<String, u32>;

/// Physical page range of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRange {
    /// Section number, or the chapter number for a chapter without sections
    pub key: String,
    /// First physical page
    pub start: usize,
    /// One past the last physical page
    pub end: usize,
}

impl SectionRange {
    /// Number of pages covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range covers no page.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extracts chapter sections from a document.
pub struct SectionExtractor {
    config: ExtractionConfig,
    counter: Box<dyn TokenCounter>,
    pacer: Box<dyn Pacer>,
}

impl std::fmt::Debug for SectionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionExtractor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SectionExtractor {
    /// Create an extractor with approximate token counts and no pacing.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            counter: Box::new(ApproxTokenCounter::default()),
            pacer: Box::new(NoopPacer),
        })
    }

    /// Use `counter` for token budgets.
    pub fn with_token_counter(mut self, counter: Box<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Consult `pacer` before every batch of pages.
    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Extraction settings.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract `chapter` and allot `total_questions` over its sections.
    ///
    /// Sections over `max_tokens` are split into parts keyed `"{section}.{part}"`
    /// (1-based). Sections without readable text are left out.
    pub fn extract(
        &self,
        source: &dyn PageSource,
        structure: &TocStructure,
        offset: PageOffset,
        chapter: &str,
        max_tokens: usize,
        total_questions: u32,
    ) -> Result<(ExtractedSections, QuestionDistribution)> {
        let entry = structure
            .chapter(chapter)
            .ok_or_else(|| Error::ChapterNotFound(chapter.to_string()))?;

        self.extract_chapter(source, structure, entry, offset, max_tokens, total_questions)
            .map_err(|e| e.in_chapter(chapter))
    }

    fn extract_chapter(
        &self,
        source: &dyn PageSource,
        structure: &TocStructure,
        chapter: &TocEntry,
        offset: PageOffset,
        max_tokens: usize,
        total_questions: u32,
    ) -> Result<(ExtractedSections, QuestionDistribution)> {
        let ranges = self.section_ranges(structure, chapter, offset, source.page_count())?;

        let mut sections = ExtractedSections::new();
        for range in &ranges {
            let started = Instant::now();
            let text = self.section_text(source, range);
            if text.is_empty() {
                log::warn!(
                    "Section {} (pages {}..{}) has no readable text, skipping",
                    range.key,
                    range.start,
                    range.end
                );
                continue;
            }

            let tokens = self.counter.count(&text)?;
            if tokens > max_tokens {
                let parts = split_by_budget(&text, max_tokens, self.counter.as_ref())?;
                log::debug!(
                    "Section {} has {} tokens, split into {} parts",
                    range.key,
                    tokens,
                    parts.len()
                );
                for (i, part) in parts.into_iter().enumerate() {
                    sections.insert(format!("{}.{}", range.key, i + 1), part);
                }
            } else {
                sections.insert(range.key.clone(), text);
            }
            log::debug!(
                "Extracted section {} ({} pages) in {:?}",
                range.key,
                range.len(),
                started.elapsed()
            );
        }

        let distribution = distribute_questions(&sections, total_questions);
        log::info!(
            "Chapter {}: {} sections, {} questions",
            chapter.number,
            sections.len(),
            distribution.values().sum::<u32>()
        );
        Ok((sections, distribution))
    }

    /// Physical page ranges of the sections of `chapter`.
    pub fn section_ranges(
        &self,
        structure: &TocStructure,
        chapter: &TocEntry,
        offset: PageOffset,
        page_count: usize,
    ) -> Result<Vec<SectionRange>> {
        let sections: Vec<&TocEntry> = structure.sections_of(&chapter.number).collect();
        let entries = if sections.is_empty() {
            vec![chapter]
        } else {
            sections
        };

        let chapter_end = match structure.next_chapter(chapter) {
            Some(next) => Some(physical_page(next, offset)?),
            None => None,
        };

        let mut ranges = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let start = physical_page(entry, offset)?;
            let end = match entries.get(i + 1) {
                Some(next) => physical_page(next, offset)?,
                None => chapter_end.unwrap_or(start + self.config.max_pages_per_section),
            };
            ranges.push(SectionRange {
                key: entry.number.clone(),
                start: start.min(page_count),
                end: end.min(page_count),
            });
        }
        Ok(ranges)
    }

    /// Normalised text of the pages in `range`, read in batches.
    fn section_text(&self, source: &dyn PageSource, range: &SectionRange) -> String {
        let pages: Vec<usize> = (range.start..range.end).collect();
        let mut texts = Vec::with_capacity(pages.len());

        for batch in pages.chunks(self.config.batch_size) {
            self.pacer.wait_until_available();
            for &index in batch {
                match source.page_text(index) {
                    Ok(text) => {
                        let text = normalize_whitespace(&text);
                        if !text.is_empty() {
                            texts.push(text);
                        }
                    },
                    Err(e) => log::warn!("Skipping unreadable page {}: {}", index, e),
                }
            }
        }
        texts.join(&self.config.page_separator)
    }
}

/// Physical index of an entry's printed page.
fn physical_page(entry: &TocEntry, offset: PageOffset) -> Result<usize> {
    let index = PageOffset::from(entry.page) + offset;
    usize::try_from(index).map_err(|_| {
        Error::PageOffsetUnresolved(format!(
            "entry {} at printed page {} maps before the first page (offset {})",
            entry.number, entry.page, offset
        ))
    })
}

/// Collapse runs of spaces within lines and drop blank lines.
fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
