//! Last-resort label and end-term scan.

use super::{DetectionContext, TocStrategy};
use crate::document::Word;

/// Minimal start/stop heuristic.
///
/// The TOC starts on the first labelled page that lists a "1" (or "Chapter 1")
/// followed within a few tokens by a bare number, and runs until a page carrying a
/// back-matter heading, which is included. Gives up 20 pages after the start.
pub struct SimpleStrategy;

impl TocStrategy for SimpleStrategy {
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<usize> {
        let lookahead = ctx.config.entry_lookahead.saturating_sub(1);
        let Some(start) = ctx.find_start(|page| lists_first_entry(&page.words, lookahead)) else {
            return Vec::new();
        };

        let mut toc = Vec::new();
        let end = (start + ctx.config.simple_max_pages).min(ctx.pages.len());
        for i in start..end {
            let Some(page) = ctx.pages.get(i) else { break };
            toc.push(i);
            if ctx.terms.has_end(&page.lower_text) {
                break;
            }
        }
        toc
    }

    fn name(&self) -> &'static str {
        "SimpleStrategy"
    }
}

/// Whether `words` contain "1" or "Chapter 1" followed by a bare number within
/// `lookahead` tokens.
fn lists_first_entry(words: &[Word], lookahead: usize) -> bool {
    words.iter().enumerate().any(|(j, word)| {
        let after = if word.text == "1" {
            j + 1
        } else if word.text.eq_ignore_ascii_case("chapter")
            && words.get(j + 1).is_some_and(|w| w.text == "1")
        {
            j + 2
        } else {
            return false;
        };
        words
            .iter()
            .skip(after)
            .take(lookahead)
            .any(Word::is_page_number)
    })
}
