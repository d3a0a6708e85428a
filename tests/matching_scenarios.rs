//! End-to-end matching scenarios through the public API.

use vinyl_match::scoring::{ScoringConfig, DEFAULT_THRESHOLD};
use vinyl_match::{
    compare, normalize, AlbumMatcher, ConfidenceTier, EngineConfig, Extractor, MatchOptions,
    MatchStrategy, Scorer, Vocabulary,
};

fn scorer() -> Scorer {
    Scorer::new(ScoringConfig::default()).unwrap()
}

fn extractor() -> Extractor {
    Extractor::new(&Vocabulary::default()).unwrap()
}

#[test]
fn test_storefront_names_do_not_block_a_match() {
    let report = compare(&["音乐大同 - Abbey Road 黑胶"], &["梦的采摘员 Abbey Road LP"]).unwrap();
    assert_eq!(report.matched.len(), 1);
    assert!(report.matched[0].score > 0.7);
    assert!(report.left_only.is_empty());
    assert!(report.right_only.is_empty());
}

#[test]
fn test_different_pressing_colors_never_match() {
    let report = compare(&["Abbey Road 红胶"], &["Abbey Road 蓝胶"]).unwrap();
    assert!(report.matched.is_empty());
    assert_eq!(report.left_only.len(), 1);
    assert_eq!(report.right_only.len(), 1);
}

#[test]
fn test_distinct_colors_score_below_default_threshold() {
    let ex = extractor();
    let scorer = scorer();
    let colors = ["红胶", "蓝胶", "透明胶", "粉红胶", "彩胶", "画胶"];
    for a in colors {
        for b in colors {
            if a == b {
                continue;
            }
            let left = ex.extract(&format!("Pink Floyd - The Wall {}", a));
            let right = ex.extract(&format!("Pink Floyd - The Wall {}", b));
            assert!(scorer.score(&left, &right) < DEFAULT_THRESHOLD, "{} vs {}", a, b);
        }
    }
}

#[test]
fn test_different_artist_scores_below_same_artist() {
    let ex = extractor();
    let scorer = scorer();
    let base = ex.extract("Artist A - Album X");
    let other_artist = ex.extract("Artist B - Album X");
    let same_artist = ex.extract("Artist A - Album X 黑胶");
    assert!(scorer.score(&base, &other_artist) < scorer.score(&base, &same_artist));
}

#[test]
fn test_short_titles_never_match_on_containment_alone() {
    let report = compare(&["范特西"], &["范特西 周年纪念 精装"]).unwrap();
    assert!(report.matched.is_empty());
}

#[test]
fn test_self_match_pairs_every_title_at_very_high() {
    let titles = [
        "Pink Floyd - The Wall 2LP",
        "Miles Davis - Kind of Blue 180g",
        "周杰伦 - 范特西 彩胶",
        "【现货】Radiohead - OK Computer",
        "音乐大同 - Abbey Road 黑胶",
        "the dark side of the moon",
        // titles made only of format or noise words
        "LP",
        "CD",
        "!!!",
        "黑胶唱片",
        "限量版 黑胶",
    ];
    for strategy in [MatchStrategy::FirstFit, MatchStrategy::Optimal] {
        let matcher = AlbumMatcher::new(&EngineConfig::default())
            .unwrap()
            .with_options(MatchOptions {
                threshold: DEFAULT_THRESHOLD,
                strategy,
            })
            .unwrap();
        let report = matcher.match_titles(&titles, &titles);
        assert_eq!(report.matched.len(), titles.len());
        assert!(report.is_partition(titles.len(), titles.len()));
        for m in &report.matched {
            assert_eq!(m.left.index, m.right.index);
            assert_eq!(m.tier, ConfidenceTier::VeryHigh);
        }
    }
}

#[test]
fn test_right_listings_are_used_at_most_once() {
    let left = ["Abbey Road 黑胶", "Abbey Road LP", "Abbey Road 唱片"];
    let right = ["Abbey Road"];
    let report = compare(&left, &right).unwrap();
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.left_only.len(), 2);
    assert!(report.is_partition(3, 1));
}

#[test]
fn test_score_is_deterministic() {
    let ex = extractor();
    let scorer = scorer();
    let a = ex.extract("周杰伦 - 范特西 彩胶");
    let b = ex.extract("Jay Chou 周杰伦 - 范特西");
    let first = scorer.score(&a, &b);
    for _ in 0..10 {
        assert_eq!(scorer.score(&a, &b), first);
    }
}

#[test]
fn test_normalize_is_idempotent_on_listing_titles() {
    for title in [
        "",
        "音乐大同 - Abbey Road 黑胶",
        "【预定】Brand New  Sealed LP Kind of Blue",
        "ＰＩＮＫ　ＦＬＯＹＤ ＬＰ",
    ] {
        let once = normalize(title);
        assert_eq!(normalize(&once), once);
    }
}

#[test]
fn test_invalid_threshold_is_reported_not_clamped() {
    let ex = extractor();
    let r = ex.extract("Pink Floyd - The Wall");
    assert!(scorer().is_same_album(&r, &r, 1.2).is_err());
    assert!(scorer().is_same_album(&r, &r, f64::NAN).is_err());
}
