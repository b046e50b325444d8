//! Keyword extraction from plain post text.
//!
//! Pipeline per text: tokenize (ASCII alphanumeric runs or Hangul syllable
//! runs) → lowercase → strip one Korean particle/ending → drop stopwords →
//! count → rank by count (ties keep first-seen order) → keep tokens seen at
//! least [`MIN_KEYWORD_FREQUENCY`] times → truncate to [`MAX_KEYWORDS`].
//!
//! The suffix and stopword tables are process-wide and read-only.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::defaults::{MAX_KEYWORDS, MIN_KEYWORD_FREQUENCY, MIN_STEM_CHARS, MIN_TOKEN_CHARS};
use crate::models::KeywordCandidate;

/// Maximal runs of ASCII alphanumerics or of Hangul syllables, never mixed.
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9]+|[가-힣]+").expect("valid regex"));

/// Korean particles and verb endings, longest first.
///
/// Equal-length suffixes keep their table order.
static KOREAN_SUFFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut suffixes: Vec<&'static str> = vec![
        "은", "는", "이", "가", "을", "를", "에", "에서", "으로", "로", "과", "와", "도", "만",
        "랑", "이랑", "하고", "께", "까지", "부터", "보다", "조차", "마저", "이나", "나",
        "이다", "였다", "되다", "있다", "없다", "싶다", "했", "하고", "했어", "있어야", "어야",
        "싶어", "했는데", "겠", "ㄴ다", "다", "자", "요", "고", "지", "게", "니까", "는데",
    ];
    suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
    suffixes
});

/// General Korean stopwords.
static GENERAL_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    include_str!("stopwords/ko.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
});

/// Stopwords curated for blog posts: frequent verbs, fragments left behind
/// by suffix stripping, and numbers that show up in dates and prices.
static DOMAIN_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "있다", "되다", "싶다", "하다", "내", "더", "그냥", "는", "글들", "보고", "있어야", "있었",
        "하고", "그리", "있는", "것이", "같은", "한다", "않는", "내가", "하지", "만든", "아닌",
        "이유", "만들", "것도", "있고", "필요", "쓰고", "쓰는", "하는", "나는", "글을", "기능",
        "되었", "싶은", "그릴", "것을", "어떻", "모든", "것은", "해도", "앱을", "그걸", "추상적인",
        "존재하", "시작할", "서로", "보여주", "대한", "했다", "있게", "때는", "없다", "안다", "물에",
        "인생의", "때우", "시에", "일어났", "30", "들리", "넣고", "사용해", "된다", "시간이라",
        "페이", "15", "만들었", "제작했습니", "들어갈", "가는", "가기", "도착했", "없는", "라는",
        "없었", "가서", "먹을", "알게", "22", "158", "157",
    ]
    .into_iter()
    .collect()
});

/// Tuning knobs for [`KeywordExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordConfig {
    /// Maximum number of keywords returned.
    pub max_keywords: usize,
    /// Minimum occurrence count for a keyword.
    pub min_frequency: usize,
    /// Leave a token unstripped when it equals the stripped stem of another
    /// token in the same text (e.g. `고양이` next to `고양이는`).
    pub protect_attested_stems: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            max_keywords: MAX_KEYWORDS,
            min_frequency: MIN_KEYWORD_FREQUENCY,
            protect_attested_stems: true,
        }
    }
}

impl KeywordConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keywords(mut self, n: usize) -> Self {
        self.max_keywords = n;
        self
    }

    pub fn with_min_frequency(mut self, n: usize) -> Self {
        self.min_frequency = n;
        self
    }

    pub fn with_protect_attested_stems(mut self, enabled: bool) -> Self {
        self.protect_attested_stems = enabled;
        self
    }
}

/// Split text into lowercase tokens of at least [`MIN_TOKEN_CHARS`] characters.
///
/// ```
/// use solmi_core::keywords::tokenize;
///
/// assert_eq!(tokenize("Rust는 fast해요 a"), vec!["rust", "fast", "해요"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Remove the longest matching Korean suffix, keeping at least
/// [`MIN_STEM_CHARS`] characters. At most one suffix is removed.
pub fn strip_suffix(token: &str) -> &str {
    let token_chars = token.chars().count();
    for suffix in KOREAN_SUFFIXES.iter() {
        if token.ends_with(suffix) && token_chars >= suffix.chars().count() + MIN_STEM_CHARS {
            return &token[..token.len() - suffix.len()];
        }
    }
    token
}

/// Whether a normalized token is a general or domain stopword.
pub fn is_stopword(token: &str) -> bool {
    GENERAL_STOPWORDS.contains(token) || DOMAIN_STOPWORDS.contains(token)
}

/// Extracts ranked keywords from plain text.
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    config: KeywordConfig,
}

impl KeywordExtractor {
    pub fn new(config: KeywordConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KeywordConfig {
        &self.config
    }

    /// Count normalized, non-stopword tokens in first-seen order.
    pub fn candidates(&self, text: &str) -> Vec<KeywordCandidate> {
        let tokens = tokenize(text);

        let attested: HashSet<&str> = if self.config.protect_attested_stems {
            tokens
                .iter()
                .filter_map(|t| {
                    let stem = strip_suffix(t);
                    (stem != t.as_str()).then_some(stem)
                })
                .collect()
        } else {
            HashSet::new()
        };

        let mut candidates: Vec<KeywordCandidate> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for raw in &tokens {
            let token = if attested.contains(raw.as_str()) {
                raw.as_str()
            } else {
                strip_suffix(raw)
            };

            if token.is_empty() || is_stopword(token) {
                trace!(raw = %raw, token, "Dropping token");
                continue;
            }

            match positions.get(token) {
                Some(&idx) => candidates[idx].count += 1,
                None => {
                    positions.insert(token.to_string(), candidates.len());
                    candidates.push(KeywordCandidate {
                        token: token.to_string(),
                        count: 1,
                    });
                }
            }
        }

        debug!(
            token_count = tokens.len(),
            distinct = candidates.len(),
            "Counted keyword candidates"
        );
        candidates
    }

    /// Extract at most `max_keywords` keywords, most frequent first.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut candidates = self.candidates(text);
        // Stable: equal counts keep first-seen order.
        candidates.sort_by(|a, b| b.count.cmp(&a.count));

        candidates
            .into_iter()
            .filter(|c| c.count >= self.config.min_frequency)
            .filter(|c| !c.token.is_empty())
            .take(self.config.max_keywords)
            .map(|c| c.token)
            .collect()
    }
}

/// Extract keywords with the default configuration.
///
/// ```
/// use solmi_core::keywords::extract_keywords;
///
/// let keywords = extract_keywords("rust rust rust tokio tokio tokio serde");
/// assert_eq!(keywords, vec!["rust", "tokio"]);
/// ```
pub fn extract_keywords(text: &str) -> Vec<String> {
    KeywordExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_ascii_alnum_token(t: &str) -> bool {
        t.chars().all(|c| c.is_ascii_alphanumeric())
    }

    fn is_hangul_token(t: &str) -> bool {
        t.chars().all(|c| ('가'..='힣').contains(&c))
    }

    // -------------------------------------------------------------------------
    // Tokenizer
    // -------------------------------------------------------------------------

    #[test]
    fn test_tokenize_splits_scripts_apart() {
        assert_eq!(tokenize("abc가나다def"), vec!["abc", "가나다", "def"]);
    }

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(tokenize("a b 가 cd 나다"), vec!["cd", "나다"]);
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("Rust RUST rust"), vec!["rust", "rust", "rust"]);
    }

    #[test]
    fn test_tokenize_ignores_other_scripts_and_jamo() {
        assert_eq!(tokenize("日本語 ㅋㅋㅋ café über"), vec!["caf", "ber"]);
    }

    #[test]
    fn test_tokens_are_single_class_and_long_enough() {
        let text = "Hello, 세상! x86_64 빌드는 3번 실패했다. ok?? 가a나b다";
        for token in tokenize(text) {
            assert!(token.chars().count() >= 2, "short token {token:?}");
            assert!(
                is_ascii_alnum_token(&token) ^ is_hangul_token(&token),
                "mixed token {token:?}"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Suffix stripping
    // -------------------------------------------------------------------------

    #[test]
    fn test_strip_suffix_prefers_longest_match() {
        assert_eq!(strip_suffix("서울에서"), "서울");
        assert_eq!(strip_suffix("학교까지"), "학교");
    }

    #[test]
    fn test_strip_suffix_keeps_two_character_stem() {
        assert_eq!(strip_suffix("책을"), "책을");
        assert_eq!(strip_suffix("사과를"), "사과");
    }

    #[test]
    fn test_strip_suffix_removes_only_one_suffix() {
        // "이는" is not a suffix, so only "는" goes.
        assert_eq!(strip_suffix("고양이는"), "고양이");
    }

    #[test]
    fn test_strip_suffix_leaves_ascii_alone() {
        assert_eq!(strip_suffix("tokio"), "tokio");
    }

    #[test]
    fn test_suffix_table_is_sorted_longest_first() {
        let lengths: Vec<usize> = KOREAN_SUFFIXES.iter().map(|s| s.chars().count()).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
    }

    // -------------------------------------------------------------------------
    // Stopwords
    // -------------------------------------------------------------------------

    #[test]
    fn test_stopword_tables() {
        assert!(is_stopword("그리고"));
        assert!(is_stopword("기능"));
        assert!(is_stopword("158"));
        assert!(!is_stopword("여행"));
        assert!(!GENERAL_STOPWORDS.iter().any(|w| w.starts_with('#')));
    }

    // -------------------------------------------------------------------------
    // Extraction
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_cat_sentence() {
        let keywords = extract_keywords("고양이는 고양이를 좋아하는 고양이 고양이");
        assert!(keywords.contains(&"고양이".to_string()));
    }

    #[test]
    fn test_extract_without_stem_protection_strips_bare_nouns() {
        let extractor =
            KeywordExtractor::new(KeywordConfig::default().with_protect_attested_stems(false));
        let candidates = extractor.candidates("고양이는 고양이를 좋아하는 고양이 고양이");
        let count = |t: &str| candidates.iter().find(|c| c.token == t).map(|c| c.count);
        assert_eq!(count("고양이"), Some(2));
        assert_eq!(count("고양"), Some(2));
        assert!(extractor
            .extract("고양이는 고양이를 좋아하는 고양이 고양이")
            .is_empty());
    }

    #[test]
    fn test_stem_protection_keeps_tokens_matching_another_stem() {
        // "고양이는" strips to "고양이", so the bare "고양이" tokens stay whole.
        let text = "고양이 고양이 고양이는";
        assert_eq!(extract_keywords(text), vec!["고양이"]);

        let literal =
            KeywordExtractor::new(KeywordConfig::default().with_protect_attested_stems(false));
        assert!(literal.extract(text).is_empty());
    }

    #[test]
    fn test_extract_requires_minimum_frequency() {
        let keywords = extract_keywords("rust rust tokio tokio tokio");
        assert_eq!(keywords, vec!["tokio"]);
    }

    #[test]
    fn test_extract_ranks_by_count() {
        let keywords = extract_keywords("mango mango mango kiwi kiwi kiwi kiwi");
        assert_eq!(keywords, vec!["kiwi", "mango"]);
    }

    #[test]
    fn test_extract_ties_keep_first_seen_order() {
        assert_eq!(
            extract_keywords("rust go rust go rust go"),
            vec!["rust", "go"]
        );
        assert_eq!(
            extract_keywords("go rust go rust go rust"),
            vec!["go", "rust"]
        );
    }

    #[test]
    fn test_extract_numeric_tokens_keep_first_seen_order() {
        assert_eq!(
            extract_keywords("zebra 2024 zebra 2024 zebra 2024"),
            vec!["zebra", "2024"]
        );
    }

    #[test]
    fn test_extract_is_bounded() {
        let words = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "theta"];
        let text = words.repeat(3).join(" ");
        let keywords = extract_keywords(&text);
        assert_eq!(keywords, words[..6].to_vec());
    }

    #[test]
    fn test_extract_filters_stopwords() {
        let keywords = extract_keywords("기능 기능 기능 여행 여행 여행 그리고 그리고 그리고");
        assert_eq!(keywords, vec!["여행"]);
    }

    #[test]
    fn test_extract_counts_after_normalization() {
        // 여행을 / 여행은 / 여행 all normalize to 여행.
        let keywords = extract_keywords("여행을 떠났다. 여행은 즐겁다. 다시 여행");
        assert_eq!(keywords, vec!["여행"]);
    }

    #[test]
    fn test_extract_only_short_tokens_and_stopwords_is_empty() {
        assert!(extract_keywords("a b c 가 나 그리고 그리고 그리고 기능 기능 기능").is_empty());
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_keywords("").is_empty());
    }

    #[test]
    fn test_extract_respects_config() {
        let extractor = KeywordExtractor::new(
            KeywordConfig::new()
                .with_max_keywords(1)
                .with_min_frequency(2),
        );
        assert_eq!(extractor.extract("rust rust tokio tokio"), vec!["rust"]);
        assert_eq!(extractor.config().max_keywords, 1);
    }

    #[test]
    fn test_extract_output_meets_frequency_floor() {
        let text = "서버 서버 서버 서버 클라이언트 클라이언트 db db db cache";
        let extractor = KeywordExtractor::default();
        let candidates = extractor.candidates(text);
        for keyword in extractor.extract(text) {
            let count = candidates
                .iter()
                .find(|c| c.token == keyword)
                .map(|c| c.count)
                .unwrap_or(0);
            assert!(count >= MIN_KEYWORD_FREQUENCY);
        }
    }
}
