//! Configuration for structure inference.
//!
//! Every heuristic threshold used by the locator, the offset resolver and the
//! section extractor lives here with its reference default. Term sets are plain
//! values handed to the locator at construction time.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Term sets that steer TOC detection.
///
/// All terms are matched case-insensitively as whole words against page text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TocTerms {
    /// Labels that announce a table of contents. Includes truncated OCR variants.
    pub start: Vec<String>,
    /// Headings that typically follow the TOC (back matter listed last).
    pub end: Vec<String>,
    /// Labels of secondary, abbreviated listings that must not be taken for the TOC.
    pub skip: Vec<String>,
}

impl Default for TocTerms {
    fn default() -> Self {
        Self {
            start: to_strings(&[
                "content",
                "contents",
                "ontent",
                "ontents",
                "table of contents",
                "table of chapters",
                "chapter index",
                "chapter list",
            ]),
            end: to_strings(&[
                "index",
                "answer key",
                "glossary",
                "appendix",
                "exercise solutions",
                "references",
                "credits",
            ]),
            skip: to_strings(&["brief contents", "contents at a glance"]),
        }
    }
}

impl TocTerms {
    /// Replace the start terms.
    pub fn with_start<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the end terms.
    pub fn with_end<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.end = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the skip terms.
    pub fn with_skip<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = terms.into_iter().map(Into::into).collect();
        self
    }
}

fn to_strings(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

/// TOC locator thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Term sets (start/end/skip).
    pub terms: TocTerms,
    /// Pages scanned by the existence probe (default: 20)
    pub probe_pages: usize,
    /// Non-period tokens inspected after a heading for its page number (default: 10)
    pub entry_lookahead: usize,
    /// Minimum heading-to-number gap as a fraction of page width (default: 0.15)
    pub min_gap_ratio: f32,
    /// Column clustering tolerance as a fraction of page width (default: 0.05)
    pub column_tolerance_ratio: f32,
    /// Heading entries a TOC page must show (default: 2)
    pub min_entries_per_page: usize,
    /// Digit-only tokens a TOC page must show (default: 5)
    pub min_numbers_per_page: usize,
    /// Page cap for the enhanced column strategy (default: 30)
    pub enhanced_max_pages: usize,
    /// Page cap for the columnar strategy (default: 40)
    pub columnar_max_pages: usize,
    /// Absolute heading-to-number gap for the columnar strategy, in points (default: 100)
    pub columnar_min_gap: f32,
    /// Absolute column tolerance for the columnar strategy, in points (default: 20)
    pub columnar_tolerance: f32,
    /// Page cap for the numeric density strategy (default: 30)
    pub density_max_pages: usize,
    /// Digit-token fraction needed to open a TOC (default: 0.08)
    pub density_start: f32,
    /// Density under which a collapse counts as the end of the TOC (default: 0.10)
    pub density_floor: f32,
    /// Relative drop against the previous page that counts as a collapse (default: 0.5)
    pub density_drop_ratio: f32,
    /// Line spacing variance under which a page reads as prose (default: 5.0)
    pub spacing_variance_limit: f32,
    /// Density under which uniform spacing ends the TOC (default: 0.15)
    pub spacing_density_limit: f32,
    /// Page cap for the simple fallback strategy (default: 20)
    pub simple_max_pages: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            terms: TocTerms::default(),
            probe_pages: 20,
            entry_lookahead: 10,
            min_gap_ratio: 0.15,
            column_tolerance_ratio: 0.05,
            min_entries_per_page: 2,
            min_numbers_per_page: 5,
            enhanced_max_pages: 30,
            columnar_max_pages: 40,
            columnar_min_gap: 100.0,
            columnar_tolerance: 20.0,
            density_max_pages: 30,
            density_start: 0.08,
            density_floor: 0.10,
            density_drop_ratio: 0.5,
            spacing_variance_limit: 5.0,
            spacing_density_limit: 0.15,
            simple_max_pages: 20,
        }
    }
}

impl LocatorConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the term sets.
    pub fn with_terms(mut self, terms: TocTerms) -> Self {
        self.terms = terms;
        self
    }

    /// Set the existence probe window.
    pub fn with_probe_pages(mut self, pages: usize) -> Self {
        self.probe_pages = pages;
        self
    }

    /// Set the minimum heading-to-number gap ratio.
    pub fn with_min_gap_ratio(mut self, ratio: f32) -> Self {
        self.min_gap_ratio = ratio;
        self
    }

    /// Set the column tolerance ratio.
    pub fn with_column_tolerance_ratio(mut self, ratio: f32) -> Self {
        self.column_tolerance_ratio = ratio;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.probe_pages == 0 {
            return Err(Error::InvalidConfig("probe_pages must be positive".into()));
        }
        if self.entry_lookahead == 0 {
            return Err(Error::InvalidConfig("entry_lookahead must be positive".into()));
        }
        for (name, value) in [
            ("min_gap_ratio", self.min_gap_ratio),
            ("column_tolerance_ratio", self.column_tolerance_ratio),
            ("density_start", self.density_start),
            ("density_floor", self.density_floor),
            ("density_drop_ratio", self.density_drop_ratio),
            ("spacing_density_limit", self.spacing_density_limit),
        ] {
            check_ratio(name, value)?;
        }
        Ok(())
    }
}

/// Offset resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetConfig {
    /// Pages searched after the last TOC page (default: 50)
    pub search_window: usize,
    /// Leading and trailing lines inspected for a printed page number (default: 3)
    pub edge_lines: usize,
    /// Longest digit run accepted as a page number (default: 4)
    pub max_number_digits: usize,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            search_window: 50,
            edge_lines: 3,
            max_number_digits: 4,
        }
    }
}

impl OffsetConfig {
    /// Set the search window.
    pub fn with_search_window(mut self, pages: usize) -> Self {
        self.search_window = pages;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.search_window == 0 || self.edge_lines == 0 || self.max_number_digits == 0 {
            return Err(Error::InvalidConfig(
                "offset search_window, edge_lines and max_number_digits must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Section extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Pages pulled per batch between pacing checks (default: 3)
    pub batch_size: usize,
    /// Upper bound on pages for a last chapter with no successor (default: 50)
    pub max_pages_per_section: usize,
    /// Default token budget per section (default: 75 000)
    pub max_tokens: usize,
    /// Default number of questions per chapter (default: 15)
    pub total_questions: u32,
    /// Separator placed between page texts of a section (default: newline)
    pub page_separator: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_pages_per_section: 50,
            max_tokens: 75_000,
            total_questions: 15,
            page_separator: "\n".to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Set the batch size.
    pub fn with_batch_size(mut self, pages: usize) -> Self {
        self.batch_size = pages;
        self
    }

    /// Set the page cap for a trailing chapter.
    pub fn with_max_pages_per_section(mut self, pages: usize) -> Self {
        self.max_pages_per_section = pages;
        self
    }

    /// Set the default token budget.
    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Set the default question total.
    pub fn with_total_questions(mut self, total: u32) -> Self {
        self.total_questions = total;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        if self.max_pages_per_section == 0 {
            return Err(Error::InvalidConfig("max_pages_per_section must be positive".into()));
        }
        if self.max_tokens == 0 {
            return Err(Error::InvalidConfig("max_tokens must be positive".into()));
        }
        Ok(())
    }
}

/// Resource pacing thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Poll host load between extraction batches (default: false)
    pub enabled: bool,
    /// CPU usage percentage above which work pauses (default: 70)
    pub cpu_threshold: f32,
    /// Memory usage percentage above which work pauses (default: 80)
    pub memory_threshold: f32,
    /// Sleep between load checks, in milliseconds (default: 2000)
    pub check_interval_ms: u64,
    /// Give up waiting after this many milliseconds; `None` waits indefinitely
    pub max_wait_ms: Option<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cpu_threshold: 70.0,
            memory_threshold: 80.0,
            check_interval_ms: 2_000,
            max_wait_ms: None,
        }
    }
}

impl PacingConfig {
    /// Turn load-based pacing on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sleep between load checks.
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Upper bound on a single wait.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_ms.map(Duration::from_millis)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cpu_threshold", self.cpu_threshold),
            ("memory_threshold", self.memory_threshold),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be in (0, 100], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Complete analyzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// TOC locator thresholds
    pub locator: LocatorConfig,
    /// Offset resolver settings
    pub offset: OffsetConfig,
    /// Section extraction settings
    pub extraction: ExtractionConfig,
    /// Resource pacing thresholds
    pub pacing: PacingConfig,
}

impl AnalyzerConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AnalyzerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set locator thresholds.
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    /// Set offset resolver settings.
    pub fn with_offset(mut self, offset: OffsetConfig) -> Self {
        self.offset = offset;
        self
    }

    /// Set extraction settings.
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Set pacing thresholds.
    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    /// Check every value is inside its valid range.
    pub fn validate(&self) -> Result<()> {
        self.locator.validate()?;
        self.offset.validate()?;
        self.extraction.validate()?;
        self.pacing.validate()
    }
}

fn check_ratio(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be in (0, 1], got {value}")))
    }
}
