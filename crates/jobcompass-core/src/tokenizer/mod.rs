//! Japanese Tokenizer (C2): `str -> Vec<String>` surface tokens.
//!
//! The preferred backend is a morphological analyzer; this crate ships the
//! fallback splitter the spec requires to always be available, behind the
//! same trait so a MeCab/Unidic-backed implementation can be dropped in
//! without touching callers (§4.2, open-question resolution in DESIGN.md).

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// `str -> Vec<String>` surface tokenization, deterministic and idempotent.
pub trait SurfaceTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

lazy_static! {
    static ref SPLIT_RE: Regex =
        Regex::new(r"[\s　、。，．,.!！?？「」『』（）()【】\[\]/／:：;；\-—ー~~]+").unwrap();

    static ref STOPWORDS: HashSet<&'static str> = [
        // particles
        "の", "に", "は", "を", "た", "が", "で", "て", "と", "し", "れ", "さ", "ある", "いる",
        "も", "する", "から", "な", "こと", "として", "い", "や", "れる", "など", "なっ", "ない",
        "この", "ため", "その", "あっ", "よう", "また", "もの", "という", "あり", "まで", "られ",
        "なる", "へ", "か", "だ", "これ", "によって", "により", "おり", "より", "による", "ず",
        "なり", "られる", "において", "ば", "なかっ", "なく", "しかし", "について", "せ", "だっ",
        "その後", "できる", "それ", "う", "ので", "なお", "のみ", "でき", "き", "つ", "における",
        "および", "いう", "さらに", "でも", "ら", "たり", "その他", "に関する", "たち", "ます",
        "ました", "ません", "です", "でした", "ございます",
    ].into_iter().collect();
}

/// Folds fullwidth ASCII to halfwidth and lowercases (shared with C1's
/// normalization, reused here for tokenizer input normalization).
fn normalize(text: &str) -> String {
    crate::company::normalize::fold_fullwidth_ascii(text).to_lowercase()
}

/// Pure-Rust fallback tokenizer: regex-based splitting plus stopword and
/// single-char-symbol filtering. Always available; used when no
/// morphological analyzer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackTokenizer;

impl SurfaceTokenizer for FallbackTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let normalized = normalize(text);
        SPLIT_RE
            .split(&normalized)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| s.chars().count() > 1 || s.chars().next().is_some_and(|c| c.is_alphanumeric()))
            .filter(|s| !STOPWORDS.contains(s))
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(FallbackTokenizer.tokenize("").is_empty());
        assert!(FallbackTokenizer.tokenize("   ").is_empty());
    }

    #[test]
    fn collapses_whitespace_runs() {
        let a = FallbackTokenizer.tokenize("新卒   採用");
        let b = FallbackTokenizer.tokenize("新卒 採用");
        assert_eq!(a, b);
    }

    #[test]
    fn folds_fullwidth_and_lowercases() {
        let tokens = FallbackTokenizer.tokenize("ＡＢＣ　recruit");
        assert!(tokens.contains(&"abc".to_string()));
    }

    #[test]
    fn drops_single_char_symbol_tokens() {
        let tokens = FallbackTokenizer.tokenize("a ー b");
        assert!(!tokens.iter().any(|t| t == "ー"));
    }

    #[test]
    fn filters_common_stopwords() {
        let tokens = FallbackTokenizer.tokenize("これは新卒採用です");
        assert!(!tokens.contains(&"これ".to_string()));
    }

    #[test]
    fn idempotent_over_whitespace() {
        let once = FallbackTokenizer.tokenize("新卒 採用 情報");
        let twice = FallbackTokenizer.tokenize(&once.join(" "));
        assert_eq!(once, twice);
    }
}
