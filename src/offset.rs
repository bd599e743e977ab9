//! Printed-page to physical-page offset resolution.
//!
//! Books number their body pages independently of the physical page index: front
//! matter, covers and blank leaves push the printed "page 1" some way into the
//! file. The offset is recovered by finding the first chapter (or its first
//! section) on a physical page whose header or footer shows the printed page
//! number from the TOC and whose text carries the entry's title.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::OffsetConfig;
use crate::document::PageSource;
use crate::error::{Error, Result};
use crate::toc::{TocEntry, TocStructure};

lazy_static! {
    /// Maximal runs of ASCII digits, wherever they sit in a word ("p12", "12th")
    static ref RE_NUMBER: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// `physical_index = printed_page + offset` for the body of the book.
pub type PageOffset = i64;

/// Resolves the page offset of a document from its TOC structure.
#[derive(Debug, Clone, Default)]
pub struct OffsetResolver {
    config: OffsetConfig,
}

impl OffsetResolver {
    /// Create a resolver with the given settings.
    pub fn new(config: OffsetConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Resolve the offset by scanning the pages after `last_toc_page`.
    ///
    /// A match of the first chapter wins over a match of its first section,
    /// wherever in the window either one occurs.
    pub fn resolve(
        &self,
        source: &dyn PageSource,
        structure: &TocStructure,
        last_toc_page: usize,
    ) -> Result<PageOffset> {
        if structure.is_empty() {
            return Err(Error::PageOffsetUnresolved("TOC structure is empty".into()));
        }
        let chapter = structure.chapters().next().ok_or_else(|| {
            Error::PageOffsetUnresolved("TOC structure has no chapter entries".into())
        })?;
        let section = structure.sections_of(&chapter.number).next();
        log::debug!(
            "Resolving offset from chapter {} (page {}){}",
            chapter.number,
            chapter.page,
            section.map_or(String::new(), |s| format!(" and section {} (page {})", s.number, s.page))
        );

        let first = last_toc_page + 1;
        let last = (first + self.config.search_window).min(source.page_count());
        let mut section_offset = None;

        for index in first..last {
            let text = match source.page_text(index) {
                Ok(text) => text,
                Err(e) => {
                    log::debug!("Skipping page {} during offset search: {}", index, e);
                    continue;
                },
            };
            let numbers = self.edge_numbers(&text);

            if let Some(offset) = corroborate(chapter, index, &numbers, &text) {
                log::info!("Page offset {} from chapter {} on page {}", offset, chapter.number, index);
                return Ok(offset);
            }
            if section_offset.is_none() {
                if let Some(entry) = section {
                    section_offset = corroborate(entry, index, &numbers, &text);
                    if let Some(offset) = section_offset {
                        log::debug!("Section {} suggests offset {} on page {}", entry.number, offset, index);
                    }
                }
            }
        }

        match section_offset {
            Some(offset) => {
                log::info!("Page offset {} from section match", offset);
                Ok(offset)
            },
            None => Err(Error::PageOffsetUnresolved(format!(
                "no page in {}..{} shows chapter {} at printed page {}",
                first, last, chapter.number, chapter.page
            ))),
        }
    }

    /// Printed page number candidates from the first and last lines of `text`.
    fn edge_numbers(&self, text: &str) -> Vec<u32> {
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let edge = self.config.edge_lines;
        let head = lines.len().min(edge);
        let tail_start = lines.len().saturating_sub(edge).max(head);

        lines[..head]
            .iter()
            .chain(lines[tail_start..].iter())
            .flat_map(|line| RE_NUMBER.find_iter(line))
            .filter(|m| m.as_str().len() <= self.config.max_number_digits)
            .filter_map(|m| m.as_str().parse().ok())
            .collect()
    }
}

fn corroborate(entry: &TocEntry, index: usize, numbers: &[u32], text: &str) -> Option<PageOffset> {
    if numbers.contains(&entry.page) && title_matches(&entry.title, text) {
        Some(index as PageOffset - PageOffset::from(entry.page))
    } else {
        None
    }
}

/// Whitespace-normalised substring match, falling back to every title word
/// appearing somewhere on the page.
fn title_matches(title: &str, text: &str) -> bool {
    let title = normalize(title);
    if title.is_empty() {
        return false;
    }
    let text = normalize(text);
    text.contains(&title) || title.split(' ').all(|word| text.contains(word))
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
