//! Similarity scoring between extracted listing records.
//!
//! The score is a weighted sum of boolean signals plus a scaled keyword
//! overlap, bounded to [0, 1]. Two records whose explicit pressing colors
//! differ are different releases no matter what else agrees; that override
//! short-circuits every other signal.

use serde::{Deserialize, Serialize};

use crate::error::{validate_threshold, MatchError, Result};
use crate::models::ExtractedRecord;

// ============================================================================
// Score Thresholds
// ============================================================================

/// Default acceptance threshold for `is_same_album`
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Score returned when both records carry different explicit colors
pub const DISTINCT_COLOR_SCORE: f64 = 0.1;

/// Album containment only counts once the shorter key exceeds this many chars
pub const FUZZY_LENGTH_GATE: usize = 10;

/// Keywords of this length or shorter never count as overlap
const MIN_KEYWORD_CHARS: usize = 2;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Configuration
// ============================================================================

/// Signal weights. Must be non-negative and sum to 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub artist_exact: f64,
    pub artist_fuzzy: f64,
    pub album_exact: f64,
    pub album_fuzzy: f64,
    pub keywords: f64,
    pub variant: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            artist_exact: 0.35,
            artist_fuzzy: 0.15,
            album_exact: 0.25,
            album_fuzzy: 0.10,
            keywords: 0.05,
            variant: 0.10,
        }
    }
}

impl Weights {
    fn as_array(&self) -> [f64; 6] {
        [
            self.artist_exact,
            self.artist_fuzzy,
            self.album_exact,
            self.album_fuzzy,
            self.keywords,
            self.variant,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.sum();
        let all_valid = self.as_array().iter().all(|w| w.is_finite() && *w >= 0.0);
        if !all_valid || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::InvalidWeights { sum });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub distinct_color_score: f64,
    pub fuzzy_length_gate: usize,
    pub default_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            distinct_color_score: DISTINCT_COLOR_SCORE,
            fuzzy_length_gate: FUZZY_LENGTH_GATE,
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

// ============================================================================
// Score Breakdown
// ============================================================================

/// Which signals fired for one pair, and the resulting score.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub colors_conflict: bool,
    pub artist_exact: bool,
    pub artist_fuzzy: bool,
    pub album_exact: bool,
    pub album_fuzzy: bool,
    /// Share of the keyword union that is a shared, non-trivial keyword
    pub keyword_overlap: f64,
    pub variant_agreement: bool,
    pub score: f64,
}

// ============================================================================
// Scorer
// ============================================================================

/// Pure pairwise scorer. Holds only validated configuration.
///
/// Artist signals need at least one named artist; when neither record has
/// one, artist credit follows the album overlap.
#[derive(Clone, Debug)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.weights.validate()?;
        validate_threshold(config.default_threshold)?;
        let penalty = config.distinct_color_score;
        if !(0.0..config.default_threshold).contains(&penalty) {
            return Err(MatchError::InvalidColorPenalty {
                score: penalty,
                threshold: config.default_threshold,
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn default_threshold(&self) -> f64 {
        self.config.default_threshold
    }

    /// Both records name an explicit color and the colors differ.
    pub fn colors_conflict(&self, a: &ExtractedRecord, b: &ExtractedRecord) -> bool {
        a.has_color() && b.has_color() && a.color != b.color
    }

    /// Album keys equal, or the shorter one is long enough to trust containment.
    fn albums_overlap(&self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }
        let (shorter, longer) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        shorter.chars().count() > self.config.fuzzy_length_gate && longer.contains(shorter)
    }

    pub fn breakdown(&self, a: &ExtractedRecord, b: &ExtractedRecord) -> ScoreBreakdown {
        // ═══════════════════════════════════════════════════════════════════
        // STEP 1: Color override
        // ═══════════════════════════════════════════════════════════════════
        if self.colors_conflict(a, b) {
            return ScoreBreakdown {
                colors_conflict: true,
                score: self.config.distinct_color_score,
                ..ScoreBreakdown::default()
            };
        }

        // ═══════════════════════════════════════════════════════════════════
        // STEP 2: Artist and album signals
        // ═══════════════════════════════════════════════════════════════════
        let album_exact = !a.album_key.is_empty() && a.album_key == b.album_key;
        let album_fuzzy = self.albums_overlap(&a.album_key, &b.album_key);
        // Two absent artists only agree once the albums do
        let artist_exact = if a.has_artist() || b.has_artist() {
            a.artist_key == b.artist_key
        } else {
            album_fuzzy
        };
        let artist_fuzzy = artist_exact
            || (a.has_artist()
                && b.has_artist()
                && (a.artist_key.contains(&b.artist_key) || b.artist_key.contains(&a.artist_key)));

        // ═══════════════════════════════════════════════════════════════════
        // STEP 3: Keyword overlap and variant agreement
        // ═══════════════════════════════════════════════════════════════════
        let keyword_overlap = keyword_overlap(a, b);
        // A one-sided color is not agreement
        let variant_agreement = a.color == b.color;

        let w = &self.config.weights;
        let mut score = 0.0;
        if artist_exact {
            score += w.artist_exact;
        }
        if artist_fuzzy {
            score += w.artist_fuzzy;
        }
        if album_exact {
            score += w.album_exact;
        }
        if album_fuzzy {
            score += w.album_fuzzy;
        }
        score += w.keywords * keyword_overlap;
        if variant_agreement {
            score += w.variant;
        }

        ScoreBreakdown {
            colors_conflict: false,
            artist_exact,
            artist_fuzzy,
            album_exact,
            album_fuzzy,
            keyword_overlap,
            variant_agreement,
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Similarity in [0, 1]. Pure and deterministic.
    pub fn score(&self, a: &ExtractedRecord, b: &ExtractedRecord) -> f64 {
        self.breakdown(a, b).score
    }

    /// Same-release decision at an explicit threshold.
    pub fn is_same_album(
        &self,
        a: &ExtractedRecord,
        b: &ExtractedRecord,
        threshold: f64,
    ) -> Result<bool> {
        let threshold = validate_threshold(threshold)?;
        Ok(self.judge(a, b, threshold).is_some())
    }

    /// Verdict for an already validated threshold: the score when the pair is
    /// the same release, `None` otherwise.
    pub(crate) fn judge(
        &self,
        a: &ExtractedRecord,
        b: &ExtractedRecord,
        threshold: f64,
    ) -> Option<f64> {
        let breakdown = self.breakdown(a, b);
        if breakdown.colors_conflict {
            return None;
        }
        if !a.has_artist() && !b.has_artist() {
            // Nothing but the album to go on
            return self
                .albums_overlap(&a.album_key, &b.album_key)
                .then_some(breakdown.score);
        }
        (breakdown.score >= threshold).then_some(breakdown.score)
    }
}

/// `|shared keywords longer than two chars| / |keyword union|`
pub fn keyword_overlap(a: &ExtractedRecord, b: &ExtractedRecord) -> f64 {
    let union = a.keywords.union(&b.keywords).count();
    if union == 0 {
        return 0.0;
    }
    let shared = a
        .keywords
        .intersection(&b.keywords)
        .filter(|k| k.chars().count() > MIN_KEYWORD_CHARS)
        .count();
    shared as f64 / union as f64
}

// ============================================================================
// Tests
// ============================================================================
