//! Read-only page access.
//!
//! The structure-inference core never opens a PDF itself. A document-loading
//! collaborator hands it something implementing [`PageSource`]: an ordered list of
//! pages, each exposing plain text and positioned words. [`PageIndex`] is the
//! in-memory implementation, loadable from a JSON dump of a pre-extracted document.

use std::cell::OnceCell;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::safe_float_cmp;

/// Vertical distance (points) within which words share a line.
const LINE_TOLERANCE: f32 = 2.0;

/// A positioned word on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Word text
    pub text: String,
    /// Left edge x-coordinate
    pub x0: f32,
    /// Top edge y-coordinate (grows downward)
    pub top: f32,
    /// Bottom edge y-coordinate
    pub bottom: f32,
}

impl Word {
    /// Create a new word.
    pub fn new(text: impl Into<String>, x0: f32, top: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            bottom,
        }
    }

    /// Whether the word is a bare run of ASCII digits (a printed page number).
    pub fn is_page_number(&self) -> bool {
        !self.text.is_empty() && self.text.bytes().all(|b| b.is_ascii_digit())
    }

    /// Whether any character of the word is a digit.
    pub fn has_digit(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_digit())
    }
}

/// One physical page: extractable text plus positioned words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Plain text, lines separated by `\n`
    #[serde(default)]
    pub text: String,
    /// Words in reading order
    #[serde(default)]
    pub words: Vec<Word>,
}

impl Page {
    /// Create a page from explicit text and words.
    pub fn new(text: impl Into<String>, words: Vec<Word>) -> Self {
        Self {
            text: text.into(),
            words,
        }
    }

    /// Build a page whose text is reconstructed from its words.
    ///
    /// Words are grouped into lines by their top edge and each line is read
    /// left to right.
    pub fn from_words(words: Vec<Word>) -> Self {
        let text = lines_from_words(&words).join("\n");
        Self { text, words }
    }
}

/// Group words into text lines, top to bottom.
fn lines_from_words(words: &[Word]) -> Vec<String> {
    if words.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| safe_float_cmp(a.top, b.top).then(safe_float_cmp(a.x0, b.x0)));

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut current = vec![sorted[0]];
    for word in sorted.into_iter().skip(1) {
        if (word.top - current[0].top).abs() <= LINE_TOLERANCE {
            current.push(word);
        } else {
            lines.push(std::mem::replace(&mut current, vec![word]));
        }
    }
    lines.push(current);

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| safe_float_cmp(a.x0, b.x0));
            line.iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Ordered, read-only access to the pages of a document.
pub trait PageSource {
    /// Number of physical pages.
    fn page_count(&self) -> usize;

    /// Page width in points, used for width-relative thresholds.
    fn page_width(&self) -> f32;

    /// Plain text of page `index` (0-based).
    fn page_text(&self, index: usize) -> Result<String>;

    /// Positioned words of page `index` (0-based).
    fn page_words(&self, index: usize) -> Result<Vec<Word>>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_width(&self) -> f32 {
        (**self).page_width()
    }

    fn page_text(&self, index: usize) -> Result<String> {
        (**self).page_text(index)
    }

    fn page_words(&self, index: usize) -> Result<Vec<Word>> {
        (**self).page_words(index)
    }
}

/// In-memory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageIndex {
    width: f32,
    pages: Vec<Page>,
}

impl PageIndex {
    /// Create a document from its page width and pages.
    pub fn new(width: f32, pages: Vec<Page>) -> Self {
        Self { width, pages }
    }

    /// Load a document dump: `{"width": 612.0, "pages": [{"text": "...", "words": [...]}]}`.
    ///
    /// Pages that carry words but no text get their text rebuilt from the words.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut index: PageIndex = serde_json::from_str(json)?;
        if !(index.width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "page width must be positive, got {}",
                index.width
            )));
        }
        for page in &mut index.pages {
            if page.text.trim().is_empty() && !page.words.is_empty() {
                page.text = lines_from_words(&page.words).join("\n");
            }
        }
        log::debug!("Loaded document dump with {} pages", index.pages.len());
        Ok(index)
    }

    /// Read a document dump from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// All pages.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    fn page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or(Error::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }
}

impl PageSource for PageIndex {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_width(&self) -> f32 {
        self.width
    }

    fn page_text(&self, index: usize) -> Result<String> {
        Ok(self.page(index)?.text.clone())
    }

    fn page_words(&self, index: usize) -> Result<Vec<Word>> {
        Ok(self.page(index)?.words.clone())
    }
}

/// Snapshot of one page prepared for TOC heuristics.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    /// Physical page index
    pub index: usize,
    /// Lowercased page text
    pub lower_text: String,
    /// Positioned words
    pub words: Vec<Word>,
}

impl PageView {
    /// Read page `index`; unreadable pages become empty views.
    pub fn load(source: &dyn PageSource, index: usize) -> Self {
        let lower_text = match source.page_text(index) {
            Ok(text) => text.to_lowercase(),
            Err(e) => {
                log::debug!("Page {} text unavailable for TOC scan: {}", index, e);
                String::new()
            },
        };
        let words = match source.page_words(index) {
            Ok(words) => words,
            Err(e) => {
                log::debug!("Page {} words unavailable for TOC scan: {}", index, e);
                Vec::new()
            },
        };
        Self {
            index,
            lower_text,
            words,
        }
    }

    /// Left edges of all digit-only words.
    pub fn number_positions(&self) -> Vec<f32> {
        self.words
            .iter()
            .filter(|w| w.is_page_number())
            .map(|w| w.x0)
            .collect()
    }

    /// Count of digit-only words.
    pub fn number_count(&self) -> usize {
        self.words.iter().filter(|w| w.is_page_number()).count()
    }

    /// Fraction of words containing a digit, ignoring stray `.` and `,` tokens.
    pub fn numeric_density(&self) -> f32 {
        if self.words.is_empty() {
            return 0.0;
        }
        let numeric = self
            .words
            .iter()
            .filter(|w| w.text != "." && w.text != "," && w.has_digit())
            .count();
        numeric as f32 / self.words.len() as f32
    }
}

/// Lazily filled page snapshots for one scan.
///
/// Each page is read at most once no matter how many strategies inspect it.
pub struct PageCache<'a> {
    source: &'a dyn PageSource,
    views: Vec<OnceCell<PageView>>,
}

impl<'a> PageCache<'a> {
    /// Create a cache over `source`.
    pub fn new(source: &'a dyn PageSource) -> Self {
        let views = (0..source.page_count()).map(|_| OnceCell::new()).collect();
        Self { source, views }
    }

    /// Number of pages in the document.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether the document has no pages.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Page width of the underlying document.
    pub fn page_width(&self) -> f32 {
        self.source.page_width()
    }

    /// Snapshot of page `index`, or `None` past the end of the document.
    pub fn get(&self, index: usize) -> Option<&PageView> {
        let cell = self.views.get(index)?;
        Some(cell.get_or_init(|| PageView::load(self.source, index)))
    }
}
