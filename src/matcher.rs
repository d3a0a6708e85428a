//! Pairing of two listing lists into a match report.
//!
//! The pairwise verdict matrix is computed in parallel with rayon; the
//! assignment over it is sequential:
//! - `FirstFit`: each left listing, in input order, takes the first
//!   unconsumed right listing judged the same release. Order dependent and
//!   not globally optimal, which is the documented default.
//! - `Optimal`: maximum-weight bipartite assignment (Kuhn-Munkres) over the
//!   same eligible pairs.

use pathfinding::kuhn_munkres::kuhn_munkres;
use pathfinding::matrix::Matrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::{validate_threshold, Result};
use crate::extract::Extractor;
use crate::models::{ExtractedRecord, Listing, MatchCandidate, MatchReport, Side};
use crate::scoring::{Scorer, DEFAULT_THRESHOLD};

/// Scores are scaled to integers for the assignment solver.
const SCORE_SCALE: f64 = 1_000_000.0;

// ============================================================================
// Options
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    #[default]
    FirstFit,
    Optimal,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::FirstFit => f.write_str("first-fit"),
            MatchStrategy::Optimal => f.write_str("optimal"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub threshold: f64,
    pub strategy: MatchStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            strategy: MatchStrategy::default(),
        }
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Extracts, scores and pairs two title lists. Holds no per-run state.
#[derive(Clone, Debug)]
pub struct AlbumMatcher {
    extractor: Extractor,
    scorer: Scorer,
    options: MatchOptions,
}

/// Verdict matrix: `verdicts[i][j]` is the score when left `i` and right `j`
/// are the same release.
type Verdicts = Vec<Vec<Option<f64>>>;

impl AlbumMatcher {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        validate_threshold(config.matching.threshold)?;
        Ok(Self {
            extractor: Extractor::new(&config.vocabulary)?,
            scorer: Scorer::new(config.scoring.clone())?,
            options: config.matching.clone(),
        })
    }

    /// Replace the run options, validating the threshold.
    pub fn with_options(mut self, options: MatchOptions) -> Result<Self> {
        validate_threshold(options.threshold)?;
        self.options = options;
        Ok(self)
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn extract(&self, title: &str) -> ExtractedRecord {
        self.extractor.extract(title)
    }

    pub fn extract_side<S: AsRef<str> + Sync>(&self, titles: &[S], side: Side) -> Vec<Listing> {
        titles
            .par_iter()
            .enumerate()
            .map(|(index, title)| Listing {
                side,
                index,
                record: self.extractor.extract(title.as_ref()),
            })
            .collect()
    }

    /// Same-release check with the configured threshold.
    pub fn is_same_album(&self, a: &ExtractedRecord, b: &ExtractedRecord) -> bool {
        self.scorer.judge(a, b, self.options.threshold).is_some()
    }

    /// Whether `record` is the same release as any of `candidates`.
    pub fn matches_any(&self, record: &ExtractedRecord, candidates: &[Listing]) -> bool {
        candidates
            .par_iter()
            .any(|c| self.is_same_album(record, &c.record))
    }

    /// Compare two title lists and partition them.
    pub fn match_titles<S: AsRef<str> + Sync>(&self, left: &[S], right: &[S]) -> MatchReport {
        let left = self.extract_side(left, Side::Left);
        let right = self.extract_side(right, Side::Right);
        self.match_listings(left, right)
    }

    /// Partition already extracted listings.
    pub fn match_listings(&self, left: Vec<Listing>, right: Vec<Listing>) -> MatchReport {
        let MatchOptions {
            threshold,
            strategy,
        } = self.options;
        tracing::info!(
            "Matching {} left vs {} right listings ({}, threshold {:.2})",
            left.len(),
            right.len(),
            strategy,
            threshold
        );

        let verdicts = self.verdicts(&left, &right);
        let pairs = match strategy {
            MatchStrategy::FirstFit => first_fit(&verdicts, right.len()),
            MatchStrategy::Optimal => optimal(&verdicts, left.len(), right.len()),
        };

        let report = build_report(left, right, pairs, strategy, threshold);
        tracing::info!(
            "Matched {} pairs, {} left-only, {} right-only",
            report.matched.len(),
            report.left_only.len(),
            report.right_only.len()
        );
        report
    }

    fn verdicts(&self, left: &[Listing], right: &[Listing]) -> Verdicts {
        let threshold = self.options.threshold;
        left.par_iter()
            .map(|l| {
                right
                    .iter()
                    .map(|r| self.scorer.judge(&l.record, &r.record, threshold))
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// Assignment
// ============================================================================

/// Greedy pairing in input order. Consumption is by right index, so
/// repeated titles stay independent listings.
fn first_fit(verdicts: &Verdicts, right_len: usize) -> Vec<(usize, usize, f64)> {
    let mut consumed = vec![false; right_len];
    let mut pairs = Vec::new();
    for (i, row) in verdicts.iter().enumerate() {
        let hit = row
            .iter()
            .enumerate()
            .find_map(|(j, v)| v.filter(|_| !consumed[j]).map(|score| (j, score)));
        if let Some((j, score)) = hit {
            consumed[j] = true;
            pairs.push((i, j, score));
        }
    }
    pairs
}

/// Maximum-weight assignment over eligible pairs. Ineligible cells weigh 0
/// and eligible ones at least 1, so dropping zero-weight assignments leaves
/// a matching of eligible pairs only.
fn optimal(verdicts: &Verdicts, left_len: usize, right_len: usize) -> Vec<(usize, usize, f64)> {
    let n = left_len.max(right_len);
    if left_len == 0 || right_len == 0 {
        return Vec::new();
    }

    let mut weights = Matrix::new(n, n, 0i64);
    for (i, row) in verdicts.iter().enumerate() {
        for (j, verdict) in row.iter().enumerate() {
            if let Some(score) = verdict {
                weights[(i, j)] = (score * SCORE_SCALE).round() as i64 + 1;
            }
        }
    }

    let (_, assignment) = kuhn_munkres(&weights);
    assignment
        .into_iter()
        .enumerate()
        .filter(|&(i, j)| i < left_len && j < right_len)
        .filter_map(|(i, j)| verdicts[i][j].map(|score| (i, j, score)))
        .collect()
}

fn build_report(
    left: Vec<Listing>,
    right: Vec<Listing>,
    pairs: Vec<(usize, usize, f64)>,
    strategy: MatchStrategy,
    threshold: f64,
) -> MatchReport {
    let mut left: Vec<Option<Listing>> = left.into_iter().map(Some).collect();
    let mut right: Vec<Option<Listing>> = right.into_iter().map(Some).collect();

    let mut matched = Vec::with_capacity(pairs.len());
    for (i, j, score) in pairs {
        if let (Some(l), Some(r)) = (left[i].take(), right[j].take()) {
            tracing::debug!("Matched [{}] {:?} <-> [{}] {:?} ({:.3})", i, l.title(), j, r.title(), score);
            matched.push(MatchCandidate::new(l, r, score));
        }
    }
    matched.sort_by_key(|m| m.left.index);

    MatchReport {
        strategy,
        threshold,
        matched,
        left_only: left.into_iter().flatten().collect(),
        right_only: right.into_iter().flatten().collect(),
    }
}

// ============================================================================
// Tests
// ============================================================================
