//! Snapshot analysis across scrapes of a seller's listings.
//!
//! Answers two questions with the same-release judgment the matcher uses:
//! which previously listed records are gone (`delisted`), and which records
//! one seller now carries after another seller dropped them (`transfers`).
//! Both are membership checks: unlike matching, nothing is consumed.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::matcher::AlbumMatcher;
use crate::models::{Listing, Side};
use crate::normalize::Normalizer;

// ============================================================================
// Snapshots
// ============================================================================

/// One scrape of a seller's listing titles.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerSnapshot {
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub scraped_at: Option<String>,
    /// Listing count reported by the scraper; may differ from `albums.len()`
    #[serde(default, alias = "total_for_sale")]
    pub total: usize,
    pub albums: Vec<String>,
}

impl SellerSnapshot {
    pub fn new(seller: &str, albums: Vec<String>) -> Self {
        Self {
            seller: seller.to_string(),
            scraped_at: None,
            total: albums.len(),
            albums,
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let mut snapshot: SellerSnapshot = serde_json::from_str(content)?;
        if snapshot.total == 0 {
            snapshot.total = snapshot.albums.len();
        }
        Ok(snapshot)
    }

    /// Plain text: one title per line, blank lines ignored.
    pub fn from_lines(seller: &str, content: &str) -> Self {
        let albums = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(seller, albums)
    }

    /// Load a `.json` snapshot, or any other file as plain text. The seller
    /// defaults to the file stem when the snapshot does not name one.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut snapshot = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_lines(stem, &content)
        };
        if snapshot.seller.is_empty() {
            snapshot.seller = stem.to_string();
        }
        tracing::info!(
            "Loaded {} titles for '{}' from {}",
            snapshot.albums.len(),
            snapshot.seller,
            path.display()
        );
        Ok(snapshot)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Titles selected by one snapshot comparison.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotDiff {
    pub kind: String,
    /// Number of listings examined
    pub considered: usize,
    pub listings: Vec<Listing>,
}

impl SnapshotDiff {
    pub fn titles(&self) -> Vec<&str> {
        self.listings.iter().map(|l| l.title()).collect()
    }
}

/// Previous listings with no same-release counterpart in `current`.
pub fn delisted<S: AsRef<str> + Sync>(
    matcher: &AlbumMatcher,
    previous: &[S],
    current: &[S],
) -> SnapshotDiff {
    let previous = matcher.extract_side(previous, Side::Left);
    let current = matcher.extract_side(current, Side::Right);
    let considered = previous.len();

    let listings: Vec<Listing> = previous
        .into_par_iter()
        .filter(|p| !matcher.matches_any(&p.record, &current))
        .collect();

    tracing::info!("{} of {} previous listings are delisted", listings.len(), considered);
    SnapshotDiff {
        kind: "delisted".to_string(),
        considered,
        listings,
    }
}

/// Destination listings that the source carried previously but no longer
/// carries.
pub fn transfers<S: AsRef<str> + Sync>(
    matcher: &AlbumMatcher,
    source_previous: &[S],
    source_current: &[S],
    destination: &[S],
) -> SnapshotDiff {
    let destination = matcher.extract_side(destination, Side::Left);
    let previous = matcher.extract_side(source_previous, Side::Right);
    let current = matcher.extract_side(source_current, Side::Right);
    let considered = destination.len();

    let listings: Vec<Listing> = destination
        .into_par_iter()
        .filter(|d| {
            matcher.matches_any(&d.record, &previous) && !matcher.matches_any(&d.record, &current)
        })
        .collect();

    tracing::info!(
        "{} of {} destination listings came from the source",
        listings.len(),
        considered
    );
    SnapshotDiff {
        kind: "transfers".to_string(),
        considered,
        listings,
    }
}

/// Drop titles whose normalized form was already seen, keeping the first.
pub fn distinct_titles<S: AsRef<str>>(normalizer: &Normalizer, titles: &[S]) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut result = Vec::with_capacity(titles.len());
    for title in titles {
        let title = title.as_ref();
        if seen.insert(normalizer.normalize(title)) {
            result.push(title.to_string());
        }
    }
    if result.len() < titles.len() {
        tracing::debug!("Dropped {} repeated titles", titles.len() - result.len());
    }
    result
}
