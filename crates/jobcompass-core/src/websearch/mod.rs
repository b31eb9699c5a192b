//! Domain-Aware Web Search Scorer (C7): scores a `(url, title, snippet)`
//! search result against a target company and desired content type (§4.7).

use crate::company::{denylist, matching, normalize, Registry};
use crate::intent::get_intent_profile;
use lazy_static::lazy_static;
use regex::Regex;

/// A single web search hit to be scored.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Mode flags controlling how strictly a result must match (§4.7 Input).
#[derive(Debug, Clone, Default)]
pub struct ScoreMode {
    pub strict_company_match: bool,
    pub allow_aggregators: bool,
    pub allow_snippet_match: bool,
}

/// Per-factor score breakdown, kept alongside the total for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub company_name: f64,
    pub domain_pattern: f64,
    pub tld_quality: f64,
    pub content_type_match: f64,
    pub year_alignment: f64,
    pub penalties: f64,
    pub preferred_domain: f64,
}

impl ScoreBreakdown {
    fn sum(&self) -> f64 {
        self.company_name
            + self.domain_pattern
            + self.tld_quality
            + self.content_type_match
            + self.year_alignment
            + self.penalties
            + self.preferred_domain
    }
}

/// The coarse source category driving the confidence cap (§4.7 confidence
/// mapping "depends on source_type").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Official,
    Parent,
    Subsidiary,
    JobSite,
    Blog,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub total: f64,
    pub breakdown: ScoreBreakdown,
    pub source_type: SourceType,
    pub confidence: Confidence,
}

lazy_static! {
    static ref YEAR_GRAD_RE: Regex = Regex::new(r"(\d{4})\s*(?:年|卒|新卒)").unwrap();
}

const LOW_TRUST_TLDS: &[&str] = &["xyz", "info", "biz", "site", "test", "top", "work", "click"];
const RECRUITMENT_SUBDOMAINS: &[&str] = &["recruit.", "career.", "careers.", "saiyo.", "entry."];

fn tld_of(domain: &str) -> String {
    domain.rsplit('.').next().unwrap_or("").to_string()
}

fn has_recruitment_subdomain(domain: &str) -> bool {
    RECRUITMENT_SUBDOMAINS.iter().any(|p| domain.starts_with(p) || domain.contains(&format!(".{p}")))
}

fn extract_graduation_year(text: &str) -> Option<u32> {
    YEAR_GRAD_RE.captures(text).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

/// Scores one result, or returns `None` if it is excluded outright (hard
/// excludes, or strict mode with no company evidence at all).
pub fn score_result(
    registry: &Registry,
    result: &SearchResult,
    company_name: &str,
    content_type: &str,
    preferred_domain: Option<&str>,
    target_graduation_year: Option<u32>,
    mode: &ScoreMode,
) -> Option<ScoredResult> {
    let domain = matching::extract_domain(&result.url);
    if domain.is_empty() {
        return None;
    }

    if !mode.allow_aggregators && denylist::is_aggregator(&domain) {
        return None;
    }

    let identity = registry.resolve(company_name, &result.url);
    let normalized_name = normalize::normalize_for_lookup(company_name);
    let title_lower = result.title.to_lowercase();
    let snippet_lower = result.snippet.to_lowercase();

    let mut breakdown = ScoreBreakdown::default();

    // Factor 2: company-name presence.
    let name_in_title = !normalized_name.is_empty() && title_lower.contains(&normalized_name);
    let name_in_snippet = !normalized_name.is_empty() && snippet_lower.contains(&normalized_name);
    if name_in_title {
        breakdown.company_name += 3.0;
    } else if name_in_snippet {
        breakdown.company_name += 2.0;
    }

    let has_company_match = name_in_title || name_in_snippet;
    if mode.strict_company_match
        && !has_company_match
        && !identity.is_official
        && !(identity.is_parent && registry.is_parent_domain_allowed(company_name, content_type))
    {
        return None;
    }

    // Factor 3: domain patterns.
    if identity.is_official {
        breakdown.domain_pattern += 4.0;
    } else {
        let hints = normalize::extract_domain_hints(company_name);
        if hints.iter().any(|h| domain.contains(h.as_str())) {
            breakdown.domain_pattern += 3.0;
        }
    }
    if has_recruitment_subdomain(&domain) {
        breakdown.domain_pattern += 3.0;
    }

    // Factor 4: TLD quality.
    let tld = tld_of(&domain);
    if domain.ends_with(".co.jp") {
        breakdown.tld_quality += 2.0;
    } else if tld == "jp" {
        breakdown.tld_quality += 1.5;
    } else if tld == "com" {
        breakdown.tld_quality += 1.0;
    } else if tld == "net" {
        breakdown.tld_quality += 0.5;
    } else if LOW_TRUST_TLDS.contains(&tld.as_str()) {
        breakdown.tld_quality -= 1.0;
    }

    // Factor 5: content-type-specific matches via the intent profile.
    if let Some(profile) = get_intent_profile(content_type) {
        let url_lower = result.url.to_lowercase();
        if profile.url_patterns.iter().any(|p| url_lower.contains(p)) {
            breakdown.content_type_match += 2.5;
        }
        let keyword_hit = |haystack: &str| {
            profile
                .strong_keywords
                .iter()
                .chain(profile.weak_keywords.iter())
                .any(|k| haystack.contains(&k.to_lowercase()))
        };
        if keyword_hit(&title_lower) {
            breakdown.content_type_match += 2.0;
        } else if mode.allow_snippet_match && keyword_hit(&snippet_lower) {
            breakdown.content_type_match += 1.0;
        }

        let conflicting_type_hit = crate::content_types::CONTENT_TYPES_NEW
            .iter()
            .filter(|&&other| other != content_type)
            .filter_map(|&other| get_intent_profile(other))
            .any(|other_profile| other_profile.url_patterns.iter().any(|p| url_lower.contains(p)));
        if conflicting_type_hit {
            breakdown.content_type_match -= 2.0;
        }
    }

    // Factor 6: year alignment, recruitment content types only.
    let is_recruitment = content_type == "new_grad_recruitment" || content_type == "midcareer_recruitment";
    if is_recruitment {
        let combined = format!("{} {}", result.title, result.snippet);
        if let (Some(target), Some(found)) = (target_graduation_year, extract_graduation_year(&combined)) {
            if found != target {
                breakdown.year_alignment -= 2.0;
            }
        }
    }

    // Factor 7: penalties.
    let is_blog = denylist::is_blog_platform(&domain);
    let own_blog = is_blog && identity.is_official;
    if is_blog {
        breakdown.penalties -= if own_blog { 1.0 } else { 5.0 };
    }
    if denylist::is_aggregator(&domain) {
        breakdown.penalties -= if has_company_match { 2.0 } else { 3.0 };
    }
    if denylist::has_personal_site_pattern(&result.url) {
        breakdown.penalties -= 3.0;
    }

    // Factor 9: preferred domain adjustment.
    if let Some(preferred) = preferred_domain {
        let preferred_lower = preferred.to_lowercase();
        if domain == preferred_lower || domain.ends_with(&format!(".{preferred_lower}")) {
            breakdown.preferred_domain += 3.0;
        } else {
            breakdown.preferred_domain -= 1.0;
        }
    }

    let mut total = breakdown.sum();

    // Factor 8: relationship adjustments, applied as a multiplier on the
    // pre-adjustment total (excluding the multiplier's own undoing of
    // preferred-domain and penalty factors would be arbitrary, so the
    // whole additive sum is scaled, per §4.7 step 8).
    if identity.is_parent && !registry.is_parent_domain_allowed(company_name, content_type) {
        total *= 0.5;
    } else if identity.is_subsidiary {
        total *= 0.3;
    }

    let source_type = if identity.is_official {
        SourceType::Official
    } else if identity.is_parent {
        SourceType::Parent
    } else if identity.is_subsidiary {
        SourceType::Subsidiary
    } else if denylist::is_aggregator(&domain) {
        SourceType::JobSite
    } else if is_blog {
        SourceType::Blog
    } else {
        SourceType::Other
    };

    let year_mismatched = is_recruitment && breakdown.year_alignment < 0.0;
    let confidence = confidence_for(source_type, year_mismatched, total);

    Some(ScoredResult { total, breakdown, source_type, confidence })
}

fn confidence_for(source_type: SourceType, year_mismatched: bool, total: f64) -> Confidence {
    let capped_medium = matches!(
        source_type,
        SourceType::JobSite | SourceType::Parent | SourceType::Subsidiary | SourceType::Blog | SourceType::Other
    ) || (source_type == SourceType::Official && year_mismatched);

    let raw = if total >= 6.0 {
        Confidence::High
    } else if total >= 3.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    if capped_medium && raw == Confidence::High {
        Confidence::Medium
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::mapping::CompanyEntry;

    fn registry_with(name: &str, domain: &str) -> Registry {
        let mut mapping = crate::company::mapping::CompanyMapping::empty();
        mapping.entries.insert(
            name.to_string(),
            CompanyEntry { domains: vec![domain.to_string()], parent: None, allow_parent_domains_for: vec![] },
        );
        Registry::from_mapping(mapping)
    }

    #[test]
    fn official_domain_with_company_name_scores_high() {
        let registry = registry_with("サンプル商事", "sample-trading");
        let result = SearchResult {
            url: "https://www.sample-trading.co.jp/recruit/".into(),
            title: "サンプル商事 新卒採用情報".into(),
            snippet: "2027年卒向けの新卒採用情報です".into(),
        };
        let scored = score_result(
            &registry,
            &result,
            "サンプル商事",
            "new_grad_recruitment",
            None,
            Some(2027),
            &ScoreMode::default(),
        )
        .unwrap();
        assert_eq!(scored.source_type, SourceType::Official);
        assert_eq!(scored.confidence, Confidence::High);
    }

    #[test]
    fn aggregator_is_excluded_unless_allowed() {
        let registry = registry_with("サンプル商事", "sample-trading");
        let result = SearchResult {
            url: "https://www.indeed.com/jobs?q=sample".into(),
            title: "サンプル商事 求人".into(),
            snippet: "".into(),
        };
        let mode = ScoreMode::default();
        assert!(score_result(&registry, &result, "サンプル商事", "new_grad_recruitment", None, None, &mode).is_none());
    }

    #[test]
    fn strict_mode_excludes_unmatched_unofficial_result() {
        let registry = registry_with("サンプル商事", "sample-trading");
        let result = SearchResult {
            url: "https://unrelated-blog.example.com/post".into(),
            title: "何かの記事".into(),
            snippet: "関係のない内容です".into(),
        };
        let mode = ScoreMode { strict_company_match: true, ..Default::default() };
        assert!(score_result(&registry, &result, "サンプル商事", "corporate_site", None, None, &mode).is_none());
    }

    #[test]
    fn year_mismatch_caps_official_confidence_at_medium() {
        let registry = registry_with("サンプル商事", "sample-trading");
        let result = SearchResult {
            url: "https://www.sample-trading.co.jp/recruit/".into(),
            title: "サンプル商事 新卒採用情報".into(),
            snippet: "2026年卒向けの新卒採用情報です".into(),
        };
        let scored = score_result(
            &registry,
            &result,
            "サンプル商事",
            "new_grad_recruitment",
            None,
            Some(2027),
            &ScoreMode::default(),
        )
        .unwrap();
        assert_ne!(scored.confidence, Confidence::High);
    }
}
