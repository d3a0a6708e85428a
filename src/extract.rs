//! Attribute extraction from raw listing titles.
//!
//! A title goes through four stages:
//! 1. Rule scan for color / variant / edition labels (on the raw title)
//! 2. Leading annotation, storefront and prefix removal, then suffix removal
//! 3. Artist / album split on the first separator that yields two parts
//! 4. Capitalized-word fallback when no separator applies
//!
//! Extraction never fails. The worst case is an empty artist and the trimmed
//! raw title as album.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::ExtractedRecord;
use crate::normalize::Normalizer;
use crate::vocabulary::{
    compile_pattern, strip_all, strip_leading, strip_trailing, token_regexes, Anchor, RuleTable,
    Vocabulary,
};

// ============================================================================
// Regex Patterns
// ============================================================================

/// Stock annotations sellers put in front of the title: "【现货】", "[RSD]".
static LEADING_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:【[^】]*】|\[[^\]]*\])").unwrap());

/// Anniversary markers inside brackets: "(50周年纪念版)", "【20周年】".
static ANNIVERSARY_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[(\[（【][^)\]）】]*?\d+周年[^)\]）】]*?[)\]）】]\s*").unwrap());

/// Artist/album guesses for titles without a separator, tried in order.
static FALLBACK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "PinkFloyd" style CamelCase run
        Regex::new(r"^([A-Z][a-z]+)([A-Z][a-z]+(?:[A-Z][a-z]+)*)").unwrap(),
        // "Pink Floyd The Wall": capitalized words, then a capitalized remainder
        Regex::new(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+([A-Z][a-z].+)").unwrap(),
    ]
});

static LATIN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+").unwrap());

static CJK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{4e00}-\u{9fa5}]{2,}").unwrap());

/// Punctuation left dangling once a leading annotation is removed.
const LEADING_JUNK: &[char] = &['-', '–', '—', ':', '：', '|', '/', '·', '•', ',', '，', '、', '~'];

/// Bound on leading-annotation removal rounds.
const MAX_LEADING_ROUNDS: usize = 8;

// ============================================================================
// Extractor
// ============================================================================

/// Pulls structured attributes out of raw titles using a fixed vocabulary.
#[derive(Clone, Debug)]
pub struct Extractor {
    normalizer: Normalizer,
    colors: RuleTable,
    variants: RuleTable,
    editions: RuleTable,
    /// Storefront names and stock prefixes, both removed from the start
    leading: Vec<Regex>,
    suffixes: Vec<Regex>,
    separators: Vec<Regex>,
    artist_prefixes: Vec<Regex>,
    artist_suffixes: Vec<Regex>,
    album_qualifiers: Vec<Regex>,
}

impl Extractor {
    /// Build an extractor, compiling every vocabulary table once.
    pub fn new(vocabulary: &Vocabulary) -> Result<Self> {
        let separators = vocabulary
            .separators
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<Result<Vec<_>>>()?;

        let mut leading = token_regexes(&vocabulary.storefront_names, Anchor::Start)?;
        leading.extend(token_regexes(&vocabulary.prefixes, Anchor::Start)?);

        Ok(Self {
            normalizer: Normalizer::new(vocabulary)?,
            colors: RuleTable::new(&vocabulary.colors)?,
            variants: RuleTable::new(&vocabulary.variants)?,
            editions: RuleTable::new(&vocabulary.editions)?,
            leading,
            suffixes: token_regexes(&vocabulary.suffixes, Anchor::Anywhere)?,
            separators,
            artist_prefixes: token_regexes(&vocabulary.artist_prefixes, Anchor::Start)?,
            artist_suffixes: token_regexes(&vocabulary.artist_suffixes, Anchor::End)?,
            album_qualifiers: token_regexes(&vocabulary.album_qualifiers, Anchor::End)?,
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Extract every attribute of one title.
    pub fn extract(&self, title: &str) -> ExtractedRecord {
        let label = |table: &RuleTable| table.first_match(title).unwrap_or("").to_string();
        let color = label(&self.colors);
        let variant = label(&self.variants);
        let edition = label(&self.editions);

        let cleaned = self.strip_decorations(title);
        let (artist, album) = if cleaned.is_empty() {
            (String::new(), title.trim().to_string())
        } else {
            self.split_artist_album(&cleaned)
        };

        let keywords = extract_keywords(&artist, &album);
        let artist_key = self.comparison_key(&artist);
        let album_key = self.comparison_key(&album);

        ExtractedRecord {
            raw: title.to_string(),
            normalized: self.normalizer.normalize(title),
            artist,
            album,
            color,
            variant,
            edition,
            keywords,
            artist_key,
            album_key,
        }
    }

    /// Compact key, or the whitespace-free lowercase text when cleanup would
    /// leave nothing ("LP", "!!!"), so such titles still equal themselves.
    fn comparison_key(&self, text: &str) -> String {
        let key = self.normalizer.compact(text);
        if key.is_empty() {
            text.to_lowercase().split_whitespace().collect()
        } else {
            key
        }
    }

    /// Remove leading annotations and prefixes, then suffixes anywhere.
    fn strip_decorations(&self, title: &str) -> String {
        let mut rest = title.trim_start_matches(|c: char| c.is_whitespace() || LEADING_JUNK.contains(&c));

        for _ in 0..MAX_LEADING_ROUNDS {
            let next = if let Some(m) = LEADING_BRACKET.find(rest) {
                Some(&rest[m.end()..])
            } else {
                self.leading
                    .iter()
                    .find_map(|prefix| strip_leading(rest, prefix))
            };
            match next {
                Some(next) => {
                    rest = next
                        .trim_start_matches(|c: char| c.is_whitespace() || LEADING_JUNK.contains(&c));
                }
                None => break,
            }
        }

        let mut cleaned = rest.to_string();
        for suffix in &self.suffixes {
            cleaned = strip_all(&cleaned, suffix);
        }
        cleaned.trim().to_string()
    }

    /// Split a cleaned title into (artist, album).
    fn split_artist_album(&self, cleaned: &str) -> (String, String) {
        for separator in &self.separators {
            let parts: Vec<&str> = separator
                .split(cleaned)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 2 {
                continue;
            }
            let artist = self.clean_artist(parts[0]);
            if artist.is_empty() {
                break;
            }
            return (artist, self.clean_album(&parts[1..].join(" ")));
        }

        fallback_split(cleaned)
    }

    fn clean_artist(&self, artist: &str) -> String {
        let mut current = artist.trim();
        for prefix in &self.artist_prefixes {
            if let Some(rest) = strip_leading(current, prefix) {
                current = rest.trim();
            }
        }
        for suffix in &self.artist_suffixes {
            if let Some(head) = strip_trailing(current, suffix) {
                current = head.trim();
            }
        }
        current.to_string()
    }

    fn clean_album(&self, album: &str) -> String {
        let without_anniversary = ANNIVERSARY_BRACKET.replace_all(album, " ");
        let mut current = without_anniversary.trim();
        // Qualifiers stack ("Soundtrack Deluxe"), so peel until none applies
        loop {
            let peeled = self
                .album_qualifiers
                .iter()
                .find_map(|q| strip_trailing(current, q));
            match peeled {
                Some(head) => current = head.trim(),
                None => break,
            }
        }
        if current.is_empty() {
            // Album was nothing but a qualifier: keep the original wording
            album.trim().to_string()
        } else {
            current.to_string()
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn fallback_split(cleaned: &str) -> (String, String) {
    for pattern in FALLBACK_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(cleaned) {
            let artist = caps.get(1).map_or("", |m| m.as_str()).trim();
            let album = caps.get(2).map_or("", |m| m.as_str()).trim();
            return (artist.to_string(), album.to_string());
        }
    }
    (String::new(), cleaned.to_string())
}

/// Lowercase Latin words plus CJK runs of two or more characters.
pub fn extract_keywords(artist: &str, album: &str) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();
    for text in [artist, album] {
        for word in LATIN_WORD.find_iter(text) {
            keywords.insert(word.as_str().to_lowercase());
        }
        for run in CJK_RUN.find_iter(text) {
            keywords.insert(run.as_str().to_string());
        }
    }
    keywords
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;

    fn extractor() -> Extractor {
        Extractor::new(&Vocabulary::default()).unwrap()
    }

    #[test]
    fn test_extract_dash_separated() {
        let r = extractor().extract("Pink Floyd - The Wall 2LP 黑胶");
        assert_eq!(r.artist, "Pink Floyd");
        assert_eq!(r.album, "The Wall");
        assert_eq!(r.variant, "double LP");
        assert_eq!(r.artist_key, "pinkfloyd");
        assert_eq!(r.album_key, "thewall");
    }

    #[test]
    fn test_extract_strips_storefront_name() {
        let ex = extractor();
        let left = ex.extract("音乐大同 - Abbey Road 黑胶");
        let right = ex.extract("梦的采摘员 Abbey Road LP");
        assert_eq!(left.artist, "Abbey");
        assert_eq!(left.album, "Road");
        assert_eq!(left.artist_key, right.artist_key);
        assert_eq!(left.album_key, right.album_key);
    }

    #[test]
    fn test_extract_colors_by_label() {
        let ex = extractor();
        assert_eq!(ex.extract("Abbey Road 红胶").color, "red");
        assert_eq!(ex.extract("Abbey Road 蓝胶").color, "blue");
        assert_eq!(ex.extract("Abbey Road 粉红胶").color, "pink");
        assert_eq!(ex.extract("Abbey Road 黑胶").color, "");
    }

    #[test]
    fn test_extract_leading_annotations() {
        let r = extractor().extract("【现货】预定 Miles Davis - Kind of Blue");
        assert_eq!(r.artist, "Miles Davis");
        assert_eq!(r.album, "Kind of Blue");
    }

    #[test]
    fn test_extract_artist_label_prefix() {
        let r = extractor().extract("艺术家：周杰伦 - 范特西");
        assert_eq!(r.artist, "周杰伦");
        assert_eq!(r.album, "范特西");
    }

    #[test]
    fn test_extract_album_qualifiers_trimmed() {
        let ex = extractor();
        let r = ex.extract("Daft Punk - Random Access Memories (10周年纪念版) Deluxe");
        assert_eq!(r.album, "Random Access Memories");
        assert_eq!(r.edition, "deluxe");
        let ost = ex.extract("久石让 - 千与千寻 原声");
        assert_eq!(ost.album, "千与千寻");
    }

    #[test]
    fn test_extract_fallback_camel_case() {
        let r = extractor().extract("PinkFloyd");
        assert_eq!(r.artist, "Pink");
        assert_eq!(r.album, "Floyd");
    }

    #[test]
    fn test_extract_no_pattern_uses_whole_title() {
        let r = extractor().extract("范特西 黑胶");
        assert_eq!(r.artist, "");
        assert_eq!(r.album, "范特西");
        assert!(r.keywords.contains("范特西"));
    }

    #[test]
    fn test_extract_empty_after_cleaning_uses_raw() {
        let r = extractor().extract("  黑胶  ");
        assert_eq!(r.artist, "");
        assert_eq!(r.album, "黑胶");
    }

    #[test]
    fn test_extract_empty_title() {
        let r = extractor().extract("");
        assert_eq!(r.artist, "");
        assert_eq!(r.album, "");
        assert!(r.keywords.is_empty());
    }

    #[test]
    fn test_noise_only_titles_keep_a_key() {
        let ex = extractor();
        assert_eq!(ex.extract("LP").album_key, "lp");
        assert_eq!(ex.extract("CD").album_key, "cd");
        assert_eq!(ex.extract("!!!").album_key, "!!!");
        assert_eq!(ex.extract("限量版 黑胶").album_key, "限量版黑胶");
        assert_eq!(ex.extract("").album_key, "");
    }

    #[test]
    fn test_keywords() {
        let k = extract_keywords("Jay Chou", "范特西 Fantasy 我");
        let expected: BTreeSet<String> = ["jay", "chou", "fantasy", "范特西"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(k, expected);
    }

    #[test]
    fn test_invalid_separator_rejected() {
        let vocab = Vocabulary {
            separators: vec!["(unclosed".to_string()],
            ..Vocabulary::default()
        };
        assert!(matches!(
            Extractor::new(&vocab),
            Err(MatchError::InvalidPattern { .. })
        ));
    }
}
