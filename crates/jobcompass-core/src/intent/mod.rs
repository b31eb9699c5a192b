//! Intent profiles (C6): the single source of truth for per-content-type
//! keyword and URL-pattern vocabulary. Consumed by the content classifier
//! (C5), the web search scorer (C7), and boost-profile selection (C9).

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

/// Keyword/URL vocabulary for one content type.
#[derive(Debug, Clone)]
pub struct IntentProfile {
    pub content_type: &'static str,
    pub strong_keywords: &'static [&'static str],
    pub weak_keywords: &'static [&'static str],
    pub url_patterns: &'static [&'static str],
    pub exclude_keywords: &'static [&'static str],
}

/// Tokens that are deliberately excluded from every profile because they are
/// ambiguous on their own; handled by [`AmbiguousRule`]s instead.
pub const AMBIGUOUS_TOKENS: &[&str] = &["news", "ニュース", "message", "メッセージ", "career", "キャリア"];

/// A context-dependent override rule for one ambiguous token family.
#[derive(Debug, Clone)]
pub struct AmbiguousRule {
    pub tokens: &'static [&'static str],
    /// Context tokens that, co-occurring with `tokens`, resolve the label.
    /// For `news`, two disjoint context sets map to two different labels.
    pub context_intents: &'static [(&'static [&'static str], &'static str)],
    /// Label used when no context token matches (only `news` has one; the
    /// others require a match or fall through to the caller's default).
    pub fallback_intent: Option<&'static str>,
}

lazy_static! {
    pub static ref AMBIGUOUS_RULES: HashMap<&'static str, AmbiguousRule> = {
        let mut m = HashMap::new();
        m.insert(
            "message",
            AmbiguousRule {
                tokens: &["message", "メッセージ"],
                context_intents: &[(
                    &["ceo", "社長", "代表", "president", "top message", "トップメッセージ", "代表挨拶", "社長挨拶"],
                    "ceo_message",
                )],
                fallback_intent: None,
            },
        );
        m.insert(
            "news",
            AmbiguousRule {
                tokens: &["news", "ニュース"],
                context_intents: &[
                    (&["press", "release", "media", "プレス", "リリース", "報道"], "press_release"),
                    (&["ir", "investor", "financial", "results", "決算", "投資家", "有価証券"], "ir_materials"),
                ],
                fallback_intent: Some("corporate_site"),
            },
        );
        m.insert(
            "career",
            AmbiguousRule {
                tokens: &["career", "キャリア"],
                context_intents: &[(
                    &["recruit", "採用", "募集", "job", "opening", "求人", "entry"],
                    "midcareer_recruitment",
                )],
                fallback_intent: None,
            },
        );
        m
    };
}

macro_rules! profile {
    ($content_type:expr, strong: $strong:expr, weak: $weak:expr, url: $url:expr, exclude: $exclude:expr $(,)?) => {
        IntentProfile {
            content_type: $content_type,
            strong_keywords: $strong,
            weak_keywords: $weak,
            url_patterns: $url,
            exclude_keywords: $exclude,
        }
    };
}

lazy_static! {
    pub static ref INTENT_PROFILES: HashMap<&'static str, IntentProfile> = {
        let mut m = HashMap::new();
        m.insert(
            "new_grad_recruitment",
            profile!(
                "new_grad_recruitment",
                strong: &[
                    "新卒", "新卒採用", "新卒向け", "新卒向け採用", "新卒採用情報", "新卒募集",
                    "卒業予定", "25卒", "26卒", "27卒", "28卒", "graduate recruitment", "campus",
                    "early career", "freshers",
                ],
                weak: &["intern", "internship"],
                url: &[
                    "newgrad", "shinsotsu", "graduate-recruit", "new-graduate", "campus",
                    "early-career", "fresh", "recruit", "recruitment", "saiyo", "entry", "mypage",
                ],
                exclude: &["中途", "キャリア採用", "experienced", "mid-career", "ir", "csr"],
            ),
        );
        m.insert(
            "midcareer_recruitment",
            profile!(
                "midcareer_recruitment",
                strong: &[
                    "中途", "中途採用", "中途募集", "キャリア採用", "経験者採用", "経験者",
                    "即戦力", "professional", "experienced hire", "job openings",
                ],
                weak: &["experienced", "professional"],
                url: &[
                    "mid-career", "midcareer", "experienced", "experienced-hire", "professional",
                    "job", "jobs", "join", "opportunities",
                ],
                exclude: &["新卒", "新卒採用", "graduate", "intern"],
            ),
        );
        m.insert(
            "corporate_site",
            profile!(
                "corporate_site",
                strong: &[
                    "会社概要", "企業情報", "事業内容", "事業紹介", "沿革", "会社案内", "企業理念",
                    "ビジョン", "ミッション", "corporate", "about us",
                ],
                weak: &["ニュース", "お知らせ", "トピックス"],
                url: &[
                    "company", "about", "overview", "profile", "business", "corporate",
                    "company-info", "about-us", "philosophy", "vision", "topics",
                ],
                exclude: &["採用", "recruit", "ir", "csr", "サステナ"],
            ),
        );
        m.insert(
            "ir_materials",
            profile!(
                "ir_materials",
                strong: &[
                    "ir", "投資家情報", "有価証券報告書", "決算短信", "決算説明会", "決算説明会資料",
                    "統合報告書", "統合報告", "financial results", "earnings", "annual report",
                    "securities report", "form 20-f",
                ],
                weak: &["決算", "株主", "財務", "investor relations"],
                url: &[
                    "ir", "investor", "investors", "investor-relations", "ir-library",
                    "financial-results", "results", "earnings", "annual-report",
                ],
                exclude: &[
                    "採用", "recruit", "csr", "サステナ", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m.insert(
            "ceo_message",
            profile!(
                "ceo_message",
                strong: &[
                    "社長メッセージ", "社長挨拶", "代表メッセージ", "代表挨拶", "ceo message",
                    "president message", "message from ceo", "top message",
                ],
                weak: &["社長", "代表", "ceo", "挨拶"],
                url: &["message", "ceo", "top-message", "leadership", "president", "message-from-ceo"],
                exclude: &[
                    "採用", "recruit", "ir", "csr", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m.insert(
            "employee_interviews",
            profile!(
                "employee_interviews",
                strong: &[
                    "社員インタビュー", "社員紹介", "社員の声", "社員ブログ", "社員座談会",
                    "クロストーク", "座談会", "働き方", "カルチャー", "culture", "employee",
                    "staff", "team", "people", "interview", "story",
                ],
                weak: &["社員", "インタビュー", "働く"],
                url: &[
                    "interview", "people", "voice", "blog", "stories", "culture", "employee",
                    "voices", "staff", "story",
                ],
                exclude: &[
                    "ir", "csr", "決算", "有価証券", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m.insert(
            "press_release",
            profile!(
                "press_release",
                strong: &[
                    "プレスリリース", "ニュースリリース", "報道発表", "報道資料", "news release",
                    "media release", "press release",
                ],
                weak: &["リリース", "報道"],
                url: &["press", "press-release", "newsrelease", "release", "newsroom", "pressroom", "media", "pr"],
                exclude: &[
                    "採用", "recruit", "ir", "csr", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m.insert(
            "csr_sustainability",
            profile!(
                "csr_sustainability",
                strong: &[
                    "csr", "サステナビリティ", "esg", "サステナビリティレポート", "tcfd", "sdgs",
                    "esg report", "responsible", "responsibility", "非財務",
                ],
                weak: &["社会貢献", "環境", "持続可能"],
                url: &[
                    "csr", "sustainability", "esg", "sdgs", "responsibility",
                    "sustainability-report", "environment", "society", "tcfd",
                ],
                exclude: &[
                    "採用", "recruit", "ir", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m.insert(
            "midterm_plan",
            profile!(
                "midterm_plan",
                strong: &[
                    "中期経営計画", "中期計画", "中期経営方針", "中期ビジョン", "中計",
                    "medium-term plan", "mid-term plan", "management plan",
                ],
                weak: &["経営計画", "事業計画", "経営戦略", "strategy"],
                url: &["midterm", "medium-term", "medium_term", "management-plan", "mtbp", "strategy", "plan"],
                exclude: &[
                    "採用", "recruit", "csr", "faq", "よくある質問", "ヘルプ", "サポート",
                    "お問い合わせ", "店舗", "支店", "キャンペーン", "ローン", "シミュレーション",
                ],
            ),
        );
        m
    };
}

pub fn get_intent_profile(content_type: &str) -> Option<&'static IntentProfile> {
    INTENT_PROFILES.get(content_type)
}

pub fn all_intent_profiles() -> &'static HashMap<&'static str, IntentProfile> {
    &INTENT_PROFILES
}

/// Tagged query intent used to select a content-type boost profile (§4.9
/// step 8, §9 "Boost profile selection by keyword presence → tagged-intent
/// router").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    EsReview,
    Deadline,
    Culture,
    Business,
}

/// Classifies a free-form query into one of the four built-in boost
/// profiles by keyword-set matching, in priority order (first match wins).
pub fn classify_query_intent(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();
    let deadline_tokens: HashSet<&str> = ["締切", "締め切り", "deadline", "応募期限", "提出期限"].into();
    let culture_tokens: HashSet<&str> =
        ["社風", "カルチャー", "culture", "働き方", "職場の雰囲気", "社員の声"].into();
    let business_tokens: HashSet<&str> =
        ["事業内容", "ビジネスモデル", "business model", "事業戦略", "強み"].into();

    if deadline_tokens.iter().any(|t| lower.contains(t)) {
        QueryIntent::Deadline
    } else if culture_tokens.iter().any(|t| lower.contains(t)) {
        QueryIntent::Culture
    } else if business_tokens.iter().any(|t| lower.contains(t)) {
        QueryIntent::Business
    } else {
        QueryIntent::EsReview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_table_has_all_nine_types() {
        for ct in crate::content_types::CONTENT_TYPES_NEW {
            assert!(get_intent_profile(ct).is_some(), "missing profile for {ct}");
        }
    }

    #[test]
    fn ambiguous_tokens_are_not_duplicated_in_any_profile() {
        for profile in INTENT_PROFILES.values() {
            for tok in AMBIGUOUS_TOKENS {
                assert!(!profile.strong_keywords.contains(tok));
            }
        }
    }

    #[test]
    fn deadline_query_routes_to_deadline_intent() {
        assert_eq!(classify_query_intent("締切はいつですか"), QueryIntent::Deadline);
    }

    #[test]
    fn default_intent_is_es_review() {
        assert_eq!(classify_query_intent("自己PRについて教えてください"), QueryIntent::EsReview);
    }
}
