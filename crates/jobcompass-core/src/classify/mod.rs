//! Content Classifier (C5): rule-first / LLM-fallback labelling of an
//! ingested chunk into one of the nine content types (§4.5).

use crate::content_types::CONTENT_TYPES_NEW;
use crate::intent::{all_intent_profiles, AMBIGUOUS_RULES};
use crate::llm::Gateway;
use crate::config::Feature;
use std::collections::HashMap;
use std::sync::Mutex;

/// Input to one classification (§4.5 "per chunk").
#[derive(Debug, Clone)]
pub struct ClassifyInput {
    pub source_url: String,
    pub heading: String,
    pub text: String,
    pub source_channel: Option<String>,
}

impl ClassifyInput {
    fn memo_key(&self) -> String {
        let text_prefix: String = self.text.chars().take(80).collect();
        format!("{}|{}|{}", self.source_url, self.heading, text_prefix)
    }

    fn haystack(&self) -> String {
        format!("{} {} {}", self.heading, self.text, self.source_url).to_lowercase()
    }
}

fn rule_matches(input: &ClassifyInput) -> Vec<&'static str> {
    let haystack = input.haystack();
    let url_lower = input.source_url.to_lowercase();

    all_intent_profiles()
        .values()
        .filter(|profile| {
            let url_hit = profile.url_patterns.iter().any(|p| url_lower.contains(p));
            let text_hit = profile
                .strong_keywords
                .iter()
                .chain(profile.weak_keywords.iter())
                .any(|k| haystack.contains(&k.to_lowercase()));
            let excluded = profile.exclude_keywords.iter().any(|k| haystack.contains(&k.to_lowercase()));
            (url_hit || text_hit) && !excluded
        })
        .map(|profile| profile.content_type)
        .collect()
}

/// Applies the ambiguity override rules (§4.5 "Ambiguity rules") to a
/// haystack that contains an ambiguous token, resolving it via
/// co-occurring context tokens.
fn resolve_ambiguous_tokens(haystack: &str) -> Option<&'static str> {
    for rule in AMBIGUOUS_RULES.values() {
        if !rule.tokens.iter().any(|t| haystack.contains(t)) {
            continue;
        }
        for (context_tokens, label) in rule.context_intents {
            if context_tokens.iter().any(|t| haystack.contains(t)) {
                return Some(label);
            }
        }
        if let Some(fallback) = rule.fallback_intent {
            return Some(fallback);
        }
    }
    None
}

/// Rule-first / LLM-fallback classifier with a per-batch memoization cache
/// (§4.5 "Batch classify_chunks memoizes").
pub struct Classifier {
    gateway: std::sync::Arc<Gateway>,
}

impl Classifier {
    pub fn new(gateway: std::sync::Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Classifies one chunk. Never fails: every path ends in one of the
    /// nine labels (I9).
    pub async fn classify(&self, input: &ClassifyInput) -> &'static str {
        let matches = rule_matches(input);
        if matches.len() == 1 {
            return matches[0];
        }

        // Ambiguity rules override step 2's single-match decision only when
        // that decision itself is ambiguous (zero or multiple rule hits),
        // not a clean single match (§4.5 "Ambiguity rules").
        let haystack = input.haystack();
        if let Some(label) = resolve_ambiguous_tokens(&haystack) {
            return label;
        }

        match matches.len() {
            0 => match &input.source_channel {
                Some(channel) => normalize_to_label(channel),
                None => self.classify_via_llm(input).await,
            },
            _ => self.classify_via_llm(input).await,
        }
    }

    async fn classify_via_llm(&self, input: &ClassifyInput) -> &'static str {
        let system = format!(
            "Classify this content chunk into exactly one of these labels: {}. \
             Output JSON: {{\"label\": \"...\"}}",
            CONTENT_TYPES_NEW.join(", ")
        );
        let user = format!(
            "URL: {}\nHeading: {}\nText: {}",
            input.source_url,
            input.heading,
            input.text.chars().take(1000).collect::<String>()
        );

        let response = self.gateway.call_llm_with_error(&system, &user, Feature::Classify, true).await;
        if let Some(label) = response.data.as_ref().and_then(|v| v["label"].as_str()) {
            if let Some(canonical) = CONTENT_TYPES_NEW.iter().find(|&&ct| ct == label) {
                return canonical;
            }
        }

        // second attempt: stricter retry handled inside the gateway already;
        // here we only have the fallback-chain's final result, so fall
        // through to the source_channel-or-corporate_site default (§4.5 step 5).
        match &input.source_channel {
            Some(channel) => normalize_to_label(channel),
            None => "corporate_site",
        }
    }

    /// Batch classification with memoization by `source_url|heading|text[:80]`
    /// within this one call (§4.5).
    pub async fn classify_chunks(&self, inputs: Vec<ClassifyInput>) -> Vec<&'static str> {
        let memo: Mutex<HashMap<String, &'static str>> = Mutex::new(HashMap::new());
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let key = input.memo_key();
            if let Some(cached) = memo.lock().expect("classifier memo lock poisoned").get(&key) {
                results.push(*cached);
                continue;
            }
            let label = self.classify(&input).await;
            memo.lock().expect("classifier memo lock poisoned").insert(key, label);
            results.push(label);
        }
        results
    }
}

fn normalize_to_label(channel: &str) -> &'static str {
    CONTENT_TYPES_NEW.iter().find(|&&ct| ct == channel).copied().unwrap_or("corporate_site")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(url: &str, heading: &str, text: &str) -> ClassifyInput {
        ClassifyInput { source_url: url.into(), heading: heading.into(), text: text.into(), source_channel: None }
    }

    #[test]
    fn single_match_resolves_directly() {
        let matches = rule_matches(&input("https://example.com/recruit/newgrad", "新卒採用情報", "新卒募集のお知らせ"));
        assert!(matches.contains(&"new_grad_recruitment"));
    }

    #[test]
    fn ambiguous_message_resolves_to_ceo_message_with_context() {
        let haystack = "社長メッセージ 代表挨拶です".to_lowercase();
        assert_eq!(resolve_ambiguous_tokens(&haystack), Some("ceo_message"));
    }

    #[test]
    fn ambiguous_news_without_context_falls_back_to_corporate_site() {
        let haystack = "ニュース一覧ページです".to_lowercase();
        assert_eq!(resolve_ambiguous_tokens(&haystack), Some("corporate_site"));
    }

    #[test]
    fn ambiguous_news_with_ir_context_resolves_to_ir_materials() {
        let haystack = "ニュース 決算発表のお知らせ".to_lowercase();
        assert_eq!(resolve_ambiguous_tokens(&haystack), Some("ir_materials"));
    }

    #[test]
    fn exclude_keywords_suppress_a_profile_match() {
        let matches = rule_matches(&input("https://example.com/ir/results", "決算短信", "有価証券報告書のご案内"));
        assert!(!matches.contains(&"new_grad_recruitment"));
    }

    #[tokio::test]
    async fn clean_single_match_is_not_overridden_by_an_incidental_ambiguous_token() {
        let gateway = std::sync::Arc::new(Gateway::new(crate::config::Config::default()));
        let classifier = Classifier::new(gateway);
        let result = classifier
            .classify(&input(
                "https://example.com/sustainability/report",
                "サステナビリティレポート",
                "当社のサステナビリティへの取り組みをご紹介します。関連ニュースはこちら。",
            ))
            .await;
        assert_eq!(result, "csr_sustainability");
    }
}
