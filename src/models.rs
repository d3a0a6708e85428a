//! Core data models for listing comparison.
//!
//! This module contains the extracted record, match candidate and report
//! types produced by a comparison run, plus run statistics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::matcher::MatchStrategy;

// ============================================================================
// Listing Models
// ============================================================================

/// Which seller's list a title came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Structured signals pulled out of one raw listing title.
///
/// Absent attributes are empty strings. Every field is derived from `raw`,
/// so a record can be rebuilt at any time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub raw: String,
    pub normalized: String,
    pub artist: String,
    pub album: String,
    pub color: String,
    pub variant: String,
    pub edition: String,
    pub keywords: BTreeSet<String>,
    // Compact comparison keys (cleaned, whitespace-free)
    pub artist_key: String,
    pub album_key: String,
}

impl ExtractedRecord {
    pub fn has_artist(&self) -> bool {
        !self.artist_key.is_empty()
    }

    pub fn has_color(&self) -> bool {
        !self.color.is_empty()
    }
}

/// An extracted record tagged with its origin list and input position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub side: Side,
    pub index: usize,
    pub record: ExtractedRecord,
}

impl Listing {
    pub fn title(&self) -> &str {
        &self.record.raw
    }
}

// ============================================================================
// Confidence
// ============================================================================

/// Ordinal label for a similarity score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceTier {
    Low,
    /// >= 0.6
    Fair,
    /// >= 0.7
    Medium,
    /// >= 0.8
    High,
    /// >= 0.9
    VeryHigh,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceTier::VeryHigh
        } else if score >= 0.8 {
            ConfidenceTier::High
        } else if score >= 0.7 {
            ConfidenceTier::Medium
        } else if score >= 0.6 {
            ConfidenceTier::Fair
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceTier::VeryHigh => "very-high",
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Fair => "fair",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Report Models
// ============================================================================

/// Two listings judged to be the same release.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub left: Listing,
    pub right: Listing,
    pub score: f64,
    pub tier: ConfidenceTier,
}

impl MatchCandidate {
    pub fn new(left: Listing, right: Listing, score: f64) -> Self {
        Self {
            left,
            right,
            score,
            tier: ConfidenceTier::from_score(score),
        }
    }
}

/// Result of one comparison run.
///
/// ## Key Invariant
///
/// Every input listing appears in exactly one of `matched` (at most once
/// per side), `left_only` or `right_only`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub strategy: MatchStrategy,
    pub threshold: f64,
    pub matched: Vec<MatchCandidate>,
    pub left_only: Vec<Listing>,
    pub right_only: Vec<Listing>,
}

impl MatchReport {
    /// Check the partition invariant against the input list sizes.
    pub fn is_partition(&self, left_len: usize, right_len: usize) -> bool {
        let mut left_seen = vec![false; left_len];
        let mut right_seen = vec![false; right_len];

        let left_indices = self
            .matched
            .iter()
            .map(|m| &m.left)
            .chain(self.left_only.iter());
        for listing in left_indices {
            if listing.side != Side::Left || listing.index >= left_len || left_seen[listing.index] {
                return false;
            }
            left_seen[listing.index] = true;
        }

        let right_indices = self
            .matched
            .iter()
            .map(|m| &m.right)
            .chain(self.right_only.iter());
        for listing in right_indices {
            if listing.side != Side::Right
                || listing.index >= right_len
                || right_seen[listing.index]
            {
                return false;
            }
            right_seen[listing.index] = true;
        }

        left_seen.iter().all(|&s| s) && right_seen.iter().all(|&s| s)
    }

    pub fn left_total(&self) -> usize {
        self.matched.len() + self.left_only.len()
    }

    pub fn right_total(&self) -> usize {
        self.matched.len() + self.right_only.len()
    }

    /// Matches whose score reaches `min_score`, best first.
    pub fn confident_matches(&self, min_score: f64) -> Vec<&MatchCandidate> {
        let mut result: Vec<&MatchCandidate> =
            self.matched.iter().filter(|m| m.score >= min_score).collect();
        result.sort_by(|a, b| b.score.total_cmp(&a.score));
        result
    }

    pub fn stats(&self) -> MatchStats {
        let mut stats = MatchStats {
            left_total: self.left_total(),
            right_total: self.right_total(),
            matched: self.matched.len(),
            left_only: self.left_only.len(),
            right_only: self.right_only.len(),
            ..MatchStats::default()
        };
        for candidate in &self.matched {
            stats.record_tier(candidate.tier);
        }
        stats
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run counts for logging and the `--stats` file.
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub left_total: usize,
    pub right_total: usize,
    pub matched: usize,
    pub left_only: usize,
    pub right_only: usize,

    // Confidence distribution of matched pairs
    pub tier_very_high: usize,
    pub tier_high: usize,
    pub tier_medium: usize,
    pub tier_fair: usize,
    pub tier_low: usize,

    pub elapsed_seconds: f64,
}

impl MatchStats {
    /// Share of left listings that found a partner, as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.left_total == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.left_total as f64
        }
    }

    pub fn record_tier(&mut self, tier: ConfidenceTier) {
        match tier {
            ConfidenceTier::VeryHigh => self.tier_very_high += 1,
            ConfidenceTier::High => self.tier_high += 1,
            ConfidenceTier::Medium => self.tier_medium += 1,
            ConfidenceTier::Fair => self.tier_fair += 1,
            ConfidenceTier::Low => self.tier_low += 1,
        }
    }

    /// Log stats as a pretty JSON block
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(side: Side, index: usize) -> Listing {
        Listing {
            side,
            index,
            record: ExtractedRecord {
                raw: format!("{:?} {}", side, index),
                ..ExtractedRecord::default()
            },
        }
    }

    fn report(
        matched: Vec<(usize, usize)>,
        left_only: Vec<usize>,
        right_only: Vec<usize>,
    ) -> MatchReport {
        MatchReport {
            strategy: MatchStrategy::FirstFit,
            threshold: 0.5,
            matched: matched
                .into_iter()
                .map(|(l, r)| MatchCandidate::new(listing(Side::Left, l), listing(Side::Right, r), 0.95))
                .collect(),
            left_only: left_only.into_iter().map(|i| listing(Side::Left, i)).collect(),
            right_only: right_only.into_iter().map(|i| listing(Side::Right, i)).collect(),
        }
    }

    #[test]
    fn test_tier_bands() {
        assert_eq!(ConfidenceTier::from_score(1.0), ConfidenceTier::VeryHigh);
        assert_eq!(ConfidenceTier::from_score(0.9), ConfidenceTier::VeryHigh);
        assert_eq!(ConfidenceTier::from_score(0.85), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_score(0.7), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_score(0.65), ConfidenceTier::Fair);
        assert_eq!(ConfidenceTier::from_score(0.1), ConfidenceTier::Low);
        assert!(ConfidenceTier::VeryHigh > ConfidenceTier::High);
    }

    #[test]
    fn test_tier_serializes_kebab_case() {
        let json = serde_json::to_string(&ConfidenceTier::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
        assert_eq!(ConfidenceTier::VeryHigh.to_string(), "very-high");
    }

    #[test]
    fn test_partition_valid() {
        let r = report(vec![(0, 1)], vec![1], vec![0]);
        assert!(r.is_partition(2, 2));
        assert_eq!(r.left_total(), 2);
        assert_eq!(r.right_total(), 2);
    }

    #[test]
    fn test_partition_rejects_reused_right() {
        let r = report(vec![(0, 0), (1, 0)], vec![], vec![]);
        assert!(!r.is_partition(2, 1));
    }

    #[test]
    fn test_partition_rejects_missing_listing() {
        let r = report(vec![(0, 0)], vec![], vec![]);
        assert!(!r.is_partition(2, 1));
    }

    #[test]
    fn test_stats_counts_tiers() {
        let r = report(vec![(0, 0), (1, 1)], vec![2], vec![]);
        let stats = r.stats();
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.left_only, 1);
        assert_eq!(stats.tier_very_high, 2);
        assert!((stats.match_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_stats_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        report(vec![(0, 0)], vec![], vec![]).stats().write_to_file(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"matched\": 1"));
    }
}
