//! Token-level TOC heuristics.
//!
//! A TOC entry shows up in the positioned word stream as a heading-like token
//! ("Chapter", "1.2", "Appendix", "IV.") followed, a little further right on the
//! page, by a bare page number. Everything here works on single words; no line
//! reconstruction is needed.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::TocTerms;
use crate::document::{PageView, Word};
use crate::error::{Error, Result};

lazy_static! {
    /// Heading keywords, numbered headings ("3.", "3.1") and roman numerals ("iv."),
    /// matched against the lowercased token
    static ref RE_KEYWORD_HEADING: Regex = Regex::new(
        r"^(chapter|part|section|unit|summary|conclusion|introduction|appendix|\d+\.|[ivxlcdm]+\.)"
    )
    .unwrap();

    /// Dotted section numbers ("1.1", "10.4")
    static ref RE_SECTION_NUMBER: Regex = Regex::new(r"^\d+\.\d+").unwrap();

    /// Lettered appendix headings ("A.", "B.2"), matched against the original token
    static ref RE_LETTERED: Regex = Regex::new(r"^[A-Z]\.(\d+(\.\d+)*)?$").unwrap();

    /// Headings in non-Latin scripts
    static ref RE_NON_LATIN: Regex = Regex::new(r"^[\p{Cyrillic}\p{Greek}\p{Han}]").unwrap();

    /// Narrow set used by the columnar strategy: chapter keyword or "N."
    static ref RE_BASIC_HEADING: Regex = Regex::new(r"^(chapter|\d+\.)").unwrap();
}

/// Which heading vocabulary to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSet {
    /// Keywords, numbered and dotted headings, roman numerals, lettered appendices,
    /// non-Latin headings
    Full,
    /// Chapter keyword and "N." numbering only
    Basic,
}

/// Whether `token` looks like the start of a TOC heading.
pub fn is_heading(token: &str, set: PatternSet) -> bool {
    let lower = token.to_lowercase();
    match set {
        PatternSet::Basic => RE_BASIC_HEADING.is_match(&lower),
        PatternSet::Full => {
            RE_KEYWORD_HEADING.is_match(&lower)
                || RE_SECTION_NUMBER.is_match(&lower)
                || RE_LETTERED.is_match(token)
                || RE_NON_LATIN.is_match(token)
        },
    }
}

/// The heading → page number test.
///
/// A heading qualifies when one of the next `lookahead` tokens (stray "." leader
/// tokens skipped) is a bare number whose left edge lies more than `min_gap`
/// points right of the heading's left edge.
#[derive(Debug, Clone, Copy)]
pub struct EntryRule {
    /// Heading vocabulary
    pub patterns: PatternSet,
    /// Minimum horizontal gap in points
    pub min_gap: f32,
    /// Tokens inspected after the heading
    pub lookahead: usize,
}

impl EntryRule {
    /// Number of qualifying headings among `words`.
    pub fn count_entries(&self, words: &[Word]) -> usize {
        (0..words.len().saturating_sub(1))
            .filter(|&j| self.qualifies(words, j))
            .count()
    }

    /// Whether at least one heading among `words` qualifies.
    pub fn has_entry(&self, words: &[Word]) -> bool {
        (0..words.len().saturating_sub(1)).any(|j| self.qualifies(words, j))
    }

    fn qualifies(&self, words: &[Word], j: usize) -> bool {
        let heading = &words[j];
        if !is_heading(&heading.text, self.patterns) {
            return false;
        }
        words[j + 1..]
            .iter()
            .filter(|w| w.text != ".")
            .take(self.lookahead)
            .any(|w| w.is_page_number() && w.x0 - heading.x0 > self.min_gap)
    }
}

/// Compiled whole-word matchers for the start, end and skip term sets.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    start: Option<Regex>,
    end: Option<Regex>,
    skip: Option<Regex>,
}

impl TermMatcher {
    /// Compile the term sets.
    pub fn new(terms: &TocTerms) -> Result<Self> {
        Ok(Self {
            start: compile_terms(&terms.start)?,
            end: compile_terms(&terms.end)?,
            skip: compile_terms(&terms.skip)?,
        })
    }

    /// Whether `text` carries a TOC label.
    pub fn has_start(&self, text: &str) -> bool {
        matches(&self.start, text)
    }

    /// Whether `text` carries a back-matter heading that closes the TOC.
    pub fn has_end(&self, text: &str) -> bool {
        matches(&self.end, text)
    }

    /// Whether `text` carries a secondary listing label.
    pub fn has_skip(&self, text: &str) -> bool {
        matches(&self.skip, text)
    }

    /// Whether `page` is labelled as a TOC and not as a secondary listing.
    pub fn is_labelled_toc(&self, page: &PageView) -> bool {
        !self.has_skip(&page.lower_text) && self.has_start(&page.lower_text)
    }
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// One alternation per set; multi-word terms tolerate any run of whitespace
/// (labels broken across lines).
fn compile_terms(terms: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| Error::InvalidConfig(format!("bad TOC term set: {e}")))
}
