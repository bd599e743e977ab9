//! TOC detection strategies.
//!
//! Each strategy proposes a run of physical pages it believes holds the table of
//! contents. The [`TocLocator`](crate::toc::TocLocator) tries them in priority order
//! and applies one shared validator to every proposal.
//!
//! # Available Strategies
//!
//! - [`EnhancedColumnStrategy`]: page-number columns with width-relative tolerances
//! - [`ColumnarStrategy`]: the same idea with fixed point tolerances
//! - [`NumericDensityStrategy`]: share of numeric tokens and line spacing
//! - [`SimpleStrategy`]: label and end-term scan, last resort

mod columnar;
mod density;
mod enhanced;
mod simple;

pub use columnar::ColumnarStrategy;
pub use density::NumericDensityStrategy;
pub use enhanced::EnhancedColumnStrategy;
pub use simple::SimpleStrategy;

use std::collections::BTreeMap;

use crate::config::LocatorConfig;
use crate::document::{PageCache, PageView};
use crate::toc::patterns::{EntryRule, PatternSet, TermMatcher};
use crate::utils::safe_float_cmp;

/// Trait for proposing the TOC page run of a document.
pub trait TocStrategy: Send + Sync {
    /// Candidate TOC pages, ascending. Empty when the strategy finds nothing.
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<usize>;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Everything a strategy may look at.
pub struct DetectionContext<'a> {
    /// Page snapshots, read on first use
    pub pages: &'a PageCache<'a>,
    /// Locator thresholds
    pub config: &'a LocatorConfig,
    /// Compiled term sets
    pub terms: &'a TermMatcher,
}

impl DetectionContext<'_> {
    /// Page width of the document.
    pub fn page_width(&self) -> f32 {
        self.pages.page_width()
    }

    /// Full heading vocabulary with the width-relative gap.
    pub fn relative_rule(&self) -> EntryRule {
        EntryRule {
            patterns: PatternSet::Full,
            min_gap: self.page_width() * self.config.min_gap_ratio,
            lookahead: self.config.entry_lookahead,
        }
    }

    /// Pages eligible as the first TOC page.
    pub fn start_window(&self) -> usize {
        self.config.probe_pages.min(self.pages.len())
    }

    /// First page in the start window that is labelled as a TOC and passes `accept`.
    pub fn find_start<F>(&self, accept: F) -> Option<usize>
    where
        F: Fn(&PageView) -> bool,
    {
        (0..self.start_window()).find(|&i| {
            self.pages.get(i).is_some_and(|page| {
                !page.words.is_empty() && self.terms.is_labelled_toc(page) && accept(page)
            })
        })
    }
}

/// The default cascade, most specific first.
pub fn default_strategies() -> Vec<Box<dyn TocStrategy>> {
    vec![
        Box::new(EnhancedColumnStrategy),
        Box::new(ColumnarStrategy),
        Box::new(NumericDensityStrategy),
        Box::new(SimpleStrategy),
    ]
}

/// Parameters of a page-number column scan.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnScan {
    pub rule: EntryRule,
    pub tolerance: f32,
    pub min_entries: usize,
    pub min_numbers: usize,
    pub max_pages: usize,
}

impl ColumnScan {
    /// Walk forward from the TOC start while pages keep the column layout.
    pub fn run(&self, ctx: &DetectionContext<'_>) -> Vec<usize> {
        let pages = ctx.pages;
        let Some(start) = ctx.find_start(|page| self.rule.has_entry(&page.words)) else {
            return Vec::new();
        };
        let anchors = match pages.get(start) {
            Some(page) => column_anchors(&page.number_positions(), self.tolerance),
            None => return Vec::new(),
        };
        log::debug!("Column scan from page {}: anchors {:?}", start, anchors);

        let mut toc = vec![start];
        let end = (start + self.max_pages).min(pages.len());
        for i in start + 1..end {
            let Some(page) = pages.get(i) else { break };
            if page.words.is_empty() {
                continue;
            }

            if !anchors.is_empty() {
                let positions = page.number_positions();
                if !positions.is_empty() && !fits_columns(&positions, &anchors, self.tolerance) {
                    let next_fits = pages.get(i + 1).is_some_and(|next| {
                        fits_columns(&next.number_positions(), &anchors, self.tolerance)
                    });
                    if !next_fits {
                        log::debug!("Page {} leaves the page-number columns", i);
                        break;
                    }
                }
            }

            if self.passes(page) {
                toc.push(i);
                continue;
            }

            // A sparse page ends the TOC only if the following page confirms it.
            match pages.get(i + 1) {
                Some(next) if ctx.terms.has_end(&next.lower_text) => {
                    toc.push(i);
                    toc.push(i + 1);
                    break;
                },
                Some(next) if self.passes(next) => toc.push(i),
                _ => break,
            }
        }
        toc
    }

    fn passes(&self, page: &PageView) -> bool {
        self.rule.count_entries(&page.words) >= self.min_entries
            && page.number_count() >= self.min_numbers
    }
}

/// Cluster x-positions into columns; each column with at least two members is
/// represented by its most frequent (rounded) position.
pub(crate) fn column_anchors(positions: &[f32], tolerance: f32) -> Vec<f32> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| safe_float_cmp(*a, *b));

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for x in sorted {
        match clusters.last_mut() {
            Some(cluster) if cluster.last().is_some_and(|last| (x - last).abs() < tolerance) => {
                cluster.push(x)
            },
            _ => clusters.push(vec![x]),
        }
    }

    clusters
        .into_iter()
        .filter(|cluster| cluster.len() > 1)
        .map(|cluster| mode(&cluster))
        .collect()
}

fn mode(values: &[f32]) -> f32 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.round() as i64).or_insert(0) += 1;
    }
    // Ties resolve to the leftmost position.
    let mut best = (0_i64, 0_usize);
    for (&key, &count) in &counts {
        if count > best.1 {
            best = (key, count);
        }
    }
    best.0 as f32
}

/// Whether any position falls within `tolerance` of an anchor.
pub(crate) fn fits_columns(positions: &[f32], anchors: &[f32], tolerance: f32) -> bool {
    positions
        .iter()
        .any(|x| anchors.iter().any(|a| (x - a).abs() <= tolerance))
}
