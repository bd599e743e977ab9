//! Question allotment across extracted sections.

use super::{ExtractedSections, QuestionDistribution};

/// Spread `total` questions over `sections`, weighted by text length.
///
/// Every section gets one question up front and the rest in proportion to its
/// character count; truncation leftovers go one at a time to the longest
/// sections. When there are more sections than questions, each section gets
/// `total / sections` instead, which may be zero.
pub fn distribute_questions(sections: &ExtractedSections, total: u32) -> QuestionDistribution {
    let mut distribution = QuestionDistribution::new();
    if sections.is_empty() {
        return distribution;
    }

    let count = sections.len() as u64;
    let total = u64::from(total);
    if count > total {
        let each = (total / count) as u32;
        for key in sections.keys() {
            distribution.insert(key.clone(), each);
        }
        return distribution;
    }

    let lengths: Vec<u64> = sections.values().map(|text| text.chars().count() as u64).collect();
    let total_chars: u64 = lengths.iter().sum();
    let remaining = total - count;

    let mut allotted = 0u64;
    for (key, &len) in sections.keys().zip(&lengths) {
        let share = if total_chars == 0 {
            0
        } else {
            len * remaining / total_chars
        };
        allotted += share;
        distribution.insert(key.clone(), 1 + share as u32);
    }

    let mut by_length: Vec<usize> = (0..lengths.len()).collect();
    by_length.sort_by(|&a, &b| lengths[b].cmp(&lengths[a]));

    let leftover = remaining - allotted;
    for &i in by_length.iter().cycle().take(leftover as usize) {
        if let Some((_, value)) = distribution.get_index_mut(i) {
            *value += 1;
        }
    }
    distribution
}
