use core::fmt;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::Height;

/// Errors returned when a sequence cannot bound a range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GapError {
    /// Fewer than two distinct heights were supplied.
    #[error("need at least 2 distinct heights to detect gaps, got {distinct}")]
    InsufficientData { distinct: usize },
}

/// The open interval `(after, before)` of heights missing between two
/// known, non-adjacent heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub after: Height,
    pub before: Height,
}

impl Gap {
    /// Missing heights, i.e. every integer strictly between the bounds.
    pub fn heights(&self) -> RangeInclusive<Height> {
        (self.after + 1)..=(self.before - 1)
    }

    pub fn len(&self) -> u64 {
        self.before - self.after - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.after + 1;
        let last = self.before - 1;
        if first == last {
            write!(f, "{first}")
        } else {
            write!(f, "{first}..={last}")
        }
    }
}

/// Result of a single scan over a set of known heights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapReport {
    /// Lowest known height.
    pub low: Height,
    /// Highest known height.
    pub high: Height,
    /// Number of distinct known heights.
    pub distinct: usize,
    /// Gaps in ascending order.
    pub gaps: Vec<Gap>,
}

impl GapReport {
    pub fn is_contiguous(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn missing_count(&self) -> u64 {
        self.gaps.iter().map(Gap::len).sum()
    }

    /// Flattened missing heights in ascending order.
    pub fn missing(&self) -> impl Iterator<Item = Height> + '_ {
        self.gaps.iter().flat_map(Gap::heights)
    }

    /// The lowest `limit` missing heights. Gaps can be arbitrarily wide, so
    /// anything that gets stored or sent should go through this.
    pub fn missing_up_to(&self, limit: usize) -> Vec<Height> {
        self.missing().take(limit).collect()
    }

    /// Compact rendering for logs, e.g. `5..=6, 9..=10`.
    pub fn describe_gaps(&self) -> String {
        self.gaps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sorts ascending and drops duplicates.
pub fn sorted_distinct<I>(heights: I) -> Vec<Height>
where
    I: IntoIterator<Item = Height>,
{
    let mut sorted: Vec<Height> = heights.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Computes the gaps between adjacent heights of an ascending, duplicate-free slice.
fn gaps_in(sorted: &[Height]) -> Vec<Gap> {
    sorted
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + 1)
        .map(|pair| Gap {
            after: pair[0],
            before: pair[1],
        })
        .collect()
}

/// Scans `heights` (any order, duplicates allowed) for gaps.
pub fn detect<I>(heights: I) -> Result<GapReport, GapError>
where
    I: IntoIterator<Item = Height>,
{
    let sorted = sorted_distinct(heights);
    let (low, high) = match (sorted.first(), sorted.last()) {
        (Some(&low), Some(&high)) if sorted.len() >= 2 => (low, high),
        _ => {
            return Err(GapError::InsufficientData {
                distinct: sorted.len(),
            });
        }
    };

    Ok(GapReport {
        low,
        high,
        distinct: sorted.len(),
        gaps: gaps_in(&sorted),
    })
}

/// Flat list of missing heights; empty when fewer than two distinct heights are known.
pub fn missing_heights<I>(heights: I) -> Vec<Height>
where
    I: IntoIterator<Item = Height>,
{
    match detect(heights) {
        Ok(report) => report.missing().collect(),
        Err(GapError::InsufficientData { .. }) => Vec::new(),
    }
}
