//! Title normalization shared by the extractor and the scorer.
//!
//! CRITICAL: `normalize` must stay idempotent. Any new cleanup step has to
//! be part of the fixpoint loop in `Normalizer::clean`.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::vocabulary::{strip_all, token_regexes, Anchor, Vocabulary};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Cleaned titles shorter than this (in chars) are considered over-stripped;
/// `normalize` returns the input unchanged instead.
pub const MIN_NORMALIZED_CHARS: usize = 5;

/// Upper bound on cleanup passes. Real titles converge in two or three.
const MAX_CLEAN_PASSES: usize = 16;

/// Punctuation and bracket characters replaced by spaces.
/// Hyphens and dots are kept: they occur inside names ("Jay-Z", "o.s.t.").
const STRIP_CHARS: &[char] = &[
    '·', '•', ':', '：', ',', '，', '、', '"', '“', '”', '\'', '‘', '’', '「', '」', '『', '』',
    '【', '】', '《', '》', '（', '）', '(', ')', '[', ']', '!', '！', '?', '？', '/', '|', '~',
    '～', '★', '☆',
];

static DEFAULT_NORMALIZER: Lazy<Normalizer> =
    Lazy::new(|| Normalizer::new(&Vocabulary::default()).unwrap());

// ============================================================================
// NORMALIZER
// ============================================================================

/// Deterministic text cleanup driven by the vocabulary's noise tokens.
#[derive(Clone, Debug)]
pub struct Normalizer {
    noise_tokens: Vec<Regex>,
    min_chars: usize,
}

impl Normalizer {
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        Ok(Self {
            noise_tokens: token_regexes(&vocabulary.noise_tokens, Anchor::Anywhere)?,
            min_chars: MIN_NORMALIZED_CHARS,
        })
    }

    /// One cleanup pass: NFKC fold, lowercase, punctuation to spaces,
    /// noise token removal, whitespace collapse.
    fn pass(&self, input: &str) -> String {
        let folded: String = input.nfkc().collect::<String>().to_lowercase();
        let mut result: String = folded
            .chars()
            .map(|c| if STRIP_CHARS.contains(&c) { ' ' } else { c })
            .collect();
        for token in &self.noise_tokens {
            result = strip_all(&result, token);
        }
        collapse_whitespace(&result)
    }

    /// Full cleanup, repeated until a fixpoint. Multi-word noise only lines
    /// up once whitespace is collapsed ("brand  new"), hence the loop.
    pub fn clean(&self, title: &str) -> String {
        let mut current = self.pass(title);
        for _ in 0..MAX_CLEAN_PASSES {
            let next = self.pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Cleaned title, or the input unchanged when cleanup leaves fewer than
    /// `MIN_NORMALIZED_CHARS` characters.
    pub fn normalize(&self, title: &str) -> String {
        let cleaned = self.clean(title);
        if cleaned.chars().count() < self.min_chars {
            title.to_string()
        } else {
            cleaned
        }
    }

    /// Whitespace-free comparison key.
    pub fn compact(&self, text: &str) -> String {
        self.clean(text).split_whitespace().collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize with the built-in vocabulary.
pub fn normalize(title: &str) -> String {
    DEFAULT_NORMALIZER.normalize(title)
}

// ============================================================================
// TESTS
// ============================================================================
