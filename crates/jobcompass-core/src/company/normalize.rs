//! Name normalization and domain-hint extraction (§4.1 "Normalization").

use lazy_static::lazy_static;
use regex::Regex;

/// Corporate suffixes stripped before using a name as a lookup key.
const CORPORATE_SUFFIXES: &[&str] = &[
    "株式会社",
    "(株)",
    "㈱",
    "有限会社",
    "(有)",
    "合同会社",
    "ホールディングス",
    "ホールディング",
    "グループ",
    "Holdings",
    "Holding",
    "Group",
    "Inc.",
    "Inc",
    "Ltd.",
    "Ltd",
    "Co.,Ltd.",
    "Co., Ltd.",
    "Corporation",
    "Corp.",
    "Corp",
    "LLC",
];

lazy_static! {
    static ref FULLWIDTH_ASCII: Regex = Regex::new(r"[\u{FF01}-\u{FF5E}]").unwrap();
    static ref ASCII_FRAGMENT: Regex = Regex::new(r"[A-Za-z][A-Za-z0-9]{2,}").unwrap();
}

/// Folds fullwidth ASCII (U+FF01..U+FF5E) down to halfwidth.
pub fn fold_fullwidth_ascii(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            let code = c as u32;
            if (0xFF01..=0xFF5E).contains(&code) {
                char::from_u32(code - 0xFEE0).unwrap_or(c)
            } else if c == '\u{3000}' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Strips corporate suffixes and normalizes width/case to produce a stable
/// lookup key for the company mapping.
pub fn normalize_for_lookup(name: &str) -> String {
    let mut normalized = fold_fullwidth_ascii(name).to_lowercase();
    for suffix in CORPORATE_SUFFIXES {
        let suffix_lower = suffix.to_lowercase();
        normalized = normalized.replace(&suffix_lower, "");
    }
    normalized.trim().to_string()
}

/// Extracts ASCII fragments (≥3 chars) from a company name as a
/// name-derived fallback hint when the name is unknown to the registry
/// (§4.1 "Failure semantics").
pub fn extract_domain_hints(name: &str) -> Vec<String> {
    let folded = fold_fullwidth_ascii(name);
    ASCII_FRAGMENT
        .find_iter(&folded)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_kabushiki_gaisha() {
        assert_eq!(normalize_for_lookup("三井物産株式会社"), "三井物産");
    }

    #[test]
    fn folds_fullwidth_and_lowercases() {
        assert_eq!(normalize_for_lookup("ＡＢＣ Holdings"), "abc");
    }

    #[test]
    fn extracts_ascii_hint_from_mixed_name() {
        let hints = extract_domain_hints("三菱商事 MC Corporation");
        assert!(hints.contains(&"corporation".to_string()));
    }
}
