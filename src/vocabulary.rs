//! Vocabulary tables for listing titles.
//!
//! Every ordered table here is a list of `(pattern, label)` rules evaluated
//! first-match-wins. Order is significant: a pattern that is a substring of
//! another must come after it ("粉红胶" before "红胶", generic "彩胶" after
//! every specific color).
//!
//! Matching is case-insensitive. Patterns that start or end with an ASCII
//! letter/digit only match at ASCII word boundaries, so "lp" never fires
//! inside "help" while CJK patterns still match anywhere.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

// ============================================================================
// TOKEN PATTERNS
// ============================================================================

/// Where a vocabulary token may occur in the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Anywhere,
    Start,
    End,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Regex source for one literal token: case-insensitive, with an ASCII word
/// boundary on each Latin-edged side.
pub fn token_pattern(token: &str, anchor: Anchor) -> String {
    let escaped = regex::escape(token);
    let lead = if token.starts_with(is_word_char) { r"(?-u:\b)" } else { "" };
    let trail = if token.ends_with(is_word_char) { r"(?-u:\b)" } else { "" };
    match anchor {
        Anchor::Anywhere => format!("(?i){}{}{}", lead, escaped, trail),
        Anchor::Start => format!("(?i)^{}{}", escaped, trail),
        Anchor::End => format!("(?i){}{}$", lead, escaped),
    }
}

pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| MatchError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

pub fn token_regex(token: &str, anchor: Anchor) -> Result<Regex> {
    compile_pattern(&token_pattern(token, anchor))
}

/// Compile a word list in order, skipping blank entries.
pub fn token_regexes(words: &[String], anchor: Anchor) -> Result<Vec<Regex>> {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| token_regex(w, anchor))
        .collect()
}

/// Replace every occurrence with a single space.
pub fn strip_all(text: &str, token: &Regex) -> String {
    token.replace_all(text, " ").into_owned()
}

/// Remainder after a `Start`-anchored token, if the text begins with it.
pub fn strip_leading<'a>(text: &'a str, token: &Regex) -> Option<&'a str> {
    token.find(text).map(|m| &text[m.end()..])
}

/// Head before an `End`-anchored token, if the text ends with it.
pub fn strip_trailing<'a>(text: &'a str, token: &Regex) -> Option<&'a str> {
    token.find(text).map(|m| &text[..m.start()])
}

// ============================================================================
// RULES
// ============================================================================

/// One entry of an ordered dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub label: String,
}

impl Rule {
    pub fn new(pattern: &str, label: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }
}

/// Ordered rules, each compiled once.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    entries: Vec<(Regex, String)>,
}

impl RuleTable {
    pub fn new(rules: &[Rule]) -> Result<Self> {
        let entries = rules
            .iter()
            .filter(|r| !r.pattern.trim().is_empty())
            .map(|r| Ok((token_regex(r.pattern.trim(), Anchor::Anywhere)?, r.label.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Label of the first rule whose pattern occurs in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.is_match(text))
            .map(|(_, label)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// VOCABULARY
// ============================================================================

/// All vocabulary tables used by the normalizer and extractor.
///
/// Immutable configuration: build it (or deserialize it from TOML) once and
/// hand it to the components at construction time. Missing TOML fields fall
/// back to the built-in tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Pressing colors, specific before generic.
    pub colors: Vec<Rule>,
    /// Format / edition-size markers.
    pub variants: Vec<Rule>,
    /// Release edition markers.
    pub editions: Vec<Rule>,
    /// Shop names sellers stamp onto their own titles.
    pub storefront_names: Vec<String>,
    /// Stock/condition annotations stripped from the start of a title.
    pub prefixes: Vec<String>,
    /// Format/material/edition words stripped anywhere in a title.
    pub suffixes: Vec<String>,
    /// Artist/album separator regexes, tried in order.
    pub separators: Vec<String>,
    pub artist_prefixes: Vec<String>,
    pub artist_suffixes: Vec<String>,
    /// Trailing version/soundtrack qualifiers trimmed from album names.
    pub album_qualifiers: Vec<String>,
    /// Marketing/condition/format noise removed by the normalizer.
    pub noise_tokens: Vec<String>,
}

fn rules(pairs: &[(&str, &str)]) -> Vec<Rule> {
    pairs.iter().map(|(p, l)| Rule::new(p, l)).collect()
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            colors: rules(&[
                // Compound colors first: they contain plainer color tokens
                ("米色透明", "beige clear"),
                ("奶白色胶", "milky white"),
                ("珍珠白胶", "pearl white"),
                ("珍珠白", "pearl white"),
                ("象牙白胶", "ivory"),
                ("奶油色胶", "cream"),
                ("奶油色", "cream"),
                ("可乐瓶色", "coke bottle"),
                ("黑冰胶", "black ice"),
                ("黑冰", "black ice"),
                ("水晶胶", "crystal"),
                ("透明胶", "clear"),
                ("粉红胶", "pink"),
                ("粉胶", "pink"),
                ("红胶", "red"),
                ("海蓝胶", "sea blue"),
                ("海蓝", "sea blue"),
                ("天蓝胶", "sky blue"),
                ("天蓝", "sky blue"),
                ("蓝胶", "blue"),
                ("黄胶", "yellow"),
                ("绿胶", "green"),
                ("紫胶", "purple"),
                ("白胶", "white"),
                ("金胶", "gold"),
                ("银胶", "silver"),
                ("橙胶", "orange"),
                ("灰胶", "grey"),
                ("爆花彩胶", "splatter"),
                ("爆花胶", "splatter"),
                ("喷溅", "splatter"),
                ("夜光胶", "glow"),
                ("旋转画胶", "picture disc"),
                ("立体画胶", "picture disc"),
                ("动态画胶", "picture disc"),
                ("限量画胶", "picture disc"),
                ("动画胶", "picture disc"),
                ("画胶", "picture disc"),
                ("米色", "beige"),
                ("透明", "clear"),
                ("clear vinyl", "clear"),
                ("red vinyl", "red"),
                ("blue vinyl", "blue"),
                ("white vinyl", "white"),
                ("picture disc", "picture disc"),
                ("splatter", "splatter"),
                // Generic colored-vinyl markers must stay last
                ("彩胶", "colored"),
                ("colored vinyl", "colored"),
                ("colour vinyl", "colored"),
            ]),
            variants: rules(&[
                ("双黑胶", "double LP"),
                ("双彩胶", "double LP"),
                ("双lp", "double LP"),
                ("三黑胶", "triple LP"),
                ("三彩胶", "triple LP"),
                ("3lp", "triple LP"),
                ("2lp", "double LP"),
                ("1lp", "single LP"),
                ("十二吋", "12 inch"),
                ("十吋", "10 inch"),
                ("七吋", "7 inch"),
                ("限量版", "limited"),
                ("限定版", "limited"),
                ("limited edition", "limited"),
                ("编号版", "numbered"),
                ("独立编号", "numbered"),
                ("带编号", "numbered"),
                ("record store day", "RSD"),
                ("rsd", "RSD"),
            ]),
            editions: rules(&[
                ("精选集", "compilation"),
                ("双专辑", "double album"),
                ("豪华版", "deluxe"),
                ("deluxe", "deluxe"),
                ("周年", "anniversary"),
                ("anniversary", "anniversary"),
            ]),
            storefront_names: words(&["音乐大同", "梦的采摘员"]),
            prefixes: words(&[
                "rsd预定", "现货", "预定", "预售", "rsd", "特价", "已绝版", "带编号", "独立编号",
                "包顺丰", "签名版", "全新未拆", "在途", "in stock", "pre-order", "preorder",
            ]),
            suffixes: words(&[
                "双黑胶", "三黑胶", "黑胶", "唱片", "新专辑", "专辑", "3lp", "2lp", "1lp", "lp",
                "vinyl", "180g", "180克", "爆花彩胶", "彩胶", "透明胶", "粉红胶", "红胶", "蓝胶",
                "黄胶", "绿胶", "紫胶", "白胶", "金胶", "银胶", "橙胶", "灰胶", "水晶胶", "限量版",
                "限量", "限定版", "限定", "编号版", "带独立编号", "日版", "台版", "港版", "欧版",
                "美版", "全新未拆", "全新", "未拆", "二手", "99新", "95新", "米色透明", "透明",
                "米色", "可乐瓶色", "奶油色", "动态画胶", "动画胶", "画胶", "爆花胶", "夜光胶",
                "十二吋", "十吋", "七吋", "附海报", "附签名卡", "含签名", "带海报",
            ]),
            separators: words(&[
                r"\s+-\s+",
                r"\s*–\s*",
                r"\s*—\s*",
                r"\s*:\s*",
                r"\s*：\s*",
                r"(?i)\s+(?:feat\.?|ft\.|featuring|feature)\s+",
            ]),
            artist_prefixes: words(&["艺术家:", "艺术家：", "artist:", "artist：", "by "]),
            artist_suffixes: words(&["演唱"]),
            album_qualifiers: words(&[
                "deluxe", "expanded", "remastered", "reissue", "version", "o.s.t.", "ost",
                "电影原声", "原声", "soundtrack",
            ]),
            noise_tokens: words(&[
                "新专辑", "黑胶", "唱片", "专辑", "限量版", "限量", "带独立编号", "带编", "日版",
                "台版", "港版", "欧版", "美版", "cd", "3lp", "2lp", "1lp", "lp", "vinyl", "彩胶",
                "紫胶", "红胶", "黄胶", "绿胶", "金胶", "灰胶", "蓝胶", "白胶", "透明胶", "动画胶",
                "电影原声", "买家评价", "预定", "现货", "粉丝更优惠", "2人小刀价", "人气第",
                "热销第", "24小时内发布", "48小时内发布", "72小时内发布", "一周内发布",
                "limited edition", "limited", "brand new", "sealed", "pre-order", "preorder",
                "in stock",
            ]),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn anywhere(token: &str) -> Regex {
        token_regex(token, Anchor::Anywhere).unwrap()
    }

    #[test]
    fn test_latin_token_respects_word_boundaries() {
        assert!(anywhere("lp").is_match("abbey road lp"));
        assert!(!anywhere("lp").is_match("help!"));
        assert!(!anywhere("lp").is_match("2lp"));
        assert!(anywhere("2lp").is_match("abbey road 2lp"));
        assert!(anywhere("lp").is_match("Abbey Road LP黑胶"));
    }

    #[test]
    fn test_cjk_token_matches_anywhere() {
        assert!(anywhere("黑胶").is_match("AbbeyRoad黑胶唱片"));
        assert!(anywhere("黑胶").is_match("Help黑胶"));
    }

    #[test]
    fn test_token_match_is_case_insensitive() {
        assert!(anywhere("lp").is_match("Abbey Road LP"));
        assert!(anywhere("rsd").is_match("RSD 2024"));
    }

    #[test]
    fn test_token_metacharacters_are_literal() {
        assert!(anywhere("o.s.t.").is_match("千与千寻 O.S.T."));
        assert!(!anywhere("o.s.t.").is_match("oxsxtx"));
    }

    #[test]
    fn test_strip_all_keeps_case_of_rest() {
        assert_eq!(strip_all("Abbey Road LP", &anywhere("lp")), "Abbey Road  ");
        assert_eq!(strip_all("Help LP lp", &anywhere("lp")), "Help    ");
    }

    #[test]
    fn test_strip_leading_and_trailing() {
        let start = |t: &str| token_regex(t, Anchor::Start).unwrap();
        let end = |t: &str| token_regex(t, Anchor::End).unwrap();
        assert_eq!(strip_leading("现货 Abbey Road", &start("现货")), Some(" Abbey Road"));
        assert_eq!(strip_leading("Abbey 现货", &start("现货")), None);
        assert_eq!(strip_leading("RSDX", &start("rsd")), None);
        assert_eq!(strip_trailing("Abbey Road Deluxe", &end("deluxe")), Some("Abbey Road "));
        assert_eq!(strip_trailing("Abbey Road", &end("deluxe")), None);
        assert_eq!(strip_trailing("Nodeluxe", &end("deluxe")), None);
    }

    #[test]
    fn test_blank_words_skipped() {
        let words = vec!["  ".to_string(), "lp".to_string()];
        assert_eq!(token_regexes(&words, Anchor::Anywhere).unwrap().len(), 1);
    }

    #[test]
    fn test_first_match_wins_in_table_order() {
        let table = RuleTable::new(&Vocabulary::default().colors).unwrap();
        assert_eq!(table.first_match("Abbey Road 粉红胶"), Some("pink"));
        assert_eq!(table.first_match("Abbey Road 红胶"), Some("red"));
        assert_eq!(table.first_match("Abbey Road 爆花彩胶"), Some("splatter"));
        assert_eq!(table.first_match("Abbey Road 彩胶"), Some("colored"));
        assert_eq!(table.first_match("Abbey Road 黑胶"), None);
    }

    #[test]
    fn test_specific_color_not_masked_by_generic() {
        // Generic marker appears earlier in the text but later in the table
        let table = RuleTable::new(&Vocabulary::default().colors).unwrap();
        assert_eq!(table.first_match("彩胶 天蓝胶 Abbey Road"), Some("sky blue"));
    }

    #[test]
    fn test_blank_rules_are_ignored() {
        let table = RuleTable::new(&[Rule::new("  ", "blank"), Rule::new("红胶", "red")]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.first_match("随便什么"), None);
    }

    #[test]
    fn test_vocabulary_roundtrips_through_toml_defaults() {
        let parsed: Vocabulary = toml::from_str("storefront_names = [\"Shop\"]").unwrap();
        assert_eq!(parsed.storefront_names, vec!["Shop".to_string()]);
        assert_eq!(parsed.colors, Vocabulary::default().colors);
    }
}
