//! Album identity matching for vinyl marketplace listings.
//!
//! Decides which free-text listing titles from two sellers denote the same
//! release, despite inconsistent wording, ordering and variant markers.

pub mod analysis;
pub mod config;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod safety;
pub mod scoring;
pub mod vocabulary;

pub use config::EngineConfig;
pub use error::{MatchError, Result};
pub use extract::Extractor;
pub use matcher::{AlbumMatcher, MatchOptions, MatchStrategy};
pub use models::{ConfidenceTier, ExtractedRecord, Listing, MatchCandidate, MatchReport, Side};
pub use normalize::normalize;
pub use scoring::Scorer;
pub use vocabulary::Vocabulary;

/// Compare two title lists with the built-in vocabulary and defaults.
pub fn compare<S: AsRef<str> + Sync>(left: &[S], right: &[S]) -> Result<MatchReport> {
    let matcher = AlbumMatcher::new(&EngineConfig::default())?;
    Ok(matcher.match_titles(left, right))
}
