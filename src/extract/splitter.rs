//! Token-budget splitting.
//!
//! Text is cut along line breaks first. A single line that is over budget on its
//! own is cut between words, and a single word between characters.

use super::tokens::TokenCounter;
use crate::error::{Error, Result};

/// Split `text` into consecutive parts of at most `max_tokens` tokens each.
///
/// Lines are accumulated greedily: a part grows until the next line would push it
/// over budget. Blank lines are dropped. Text within budget comes back as a single
/// part.
///
/// Counters need not be additive, so parts are always measured whole. The length
/// of each part is found by doubling and then bisecting the number of units it
/// takes, which relies only on a longer text never counting fewer tokens.
pub fn split_by_budget(
    text: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> Result<Vec<String>> {
    if max_tokens == 0 {
        return Err(Error::InvalidConfig("max_tokens must be positive".into()));
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    pack(&lines, "\n", max_tokens, counter, &|line: &str| {
        let words: Vec<&str> = line.split_whitespace().collect();
        pack(&words, " ", max_tokens, counter, &|word: &str| split_chars(word, max_tokens, counter))
    })
}

/// A single character that is over budget still forms its own chunk.
fn split_chars(word: &str, max_tokens: usize, counter: &dyn TokenCounter) -> Result<Vec<String>> {
    let chars: Vec<&str> = word
        .char_indices()
        .map(|(i, ch)| &word[i..i + ch.len_utf8()])
        .collect();
    pack(&chars, "", max_tokens, counter, &|ch: &str| Ok(vec![ch.to_string()]))
}

/// Greedily pack `units` joined by `sep` into parts within budget.
///
/// A unit over budget on its own goes through `oversized`; all of its pieces but
/// the last become parts, and the last one opens the next part.
fn pack(
    units: &[&str],
    sep: &str,
    max_tokens: usize,
    counter: &dyn TokenCounter,
    oversized: &dyn Fn(&str) -> Result<Vec<String>>,
) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut next = 0;
    while next < units.len() {
        let unit = units[next];
        next += 1;
        let head = if counter.count(unit)? <= max_tokens {
            unit.to_string()
        } else {
            let mut pieces = oversized(unit)?;
            let last = pieces.pop().unwrap_or_default();
            parts.extend(pieces);
            last
        };

        let rest = &units[next..];
        let fits = |k: usize| -> Result<bool> {
            Ok(counter.count(&join(&head, &rest[..k], sep))? <= max_tokens)
        };

        // `fit` units are known to fit, `miss` units known not to
        let mut fit = 0;
        let mut miss = None;
        let mut step = 1;
        while fit < rest.len() {
            let k = (fit + step).min(rest.len());
            if fits(k)? {
                fit = k;
                step *= 2;
            } else {
                miss = Some(k);
                break;
            }
        }
        if let Some(mut miss) = miss {
            while miss - fit > 1 {
                let mid = fit + (miss - fit) / 2;
                if fits(mid)? {
                    fit = mid;
                } else {
                    miss = mid;
                }
            }
        }

        let part = join(&head, &rest[..fit], sep);
        next += fit;
        if !part.is_empty() {
            parts.push(part);
        }
    }
    Ok(parts)
}

fn join(head: &str, units: &[&str], sep: &str) -> String {
    let len = head.len() + units.iter().map(|u| u.len() + sep.len()).sum::<usize>();
    let mut out = String::with_capacity(len);
    out.push_str(head);
    for unit in units {
        out.push_str(sep);
        out.push_str(unit);
    }
    out
}
