//! Segment-aware domain pattern matching and the subsidiary/parent/conflict
//! detection algorithms built on it (§4.1).

use super::mapping::{CompanyMapping, RECRUITMENT_SUFFIXES};
use std::collections::HashSet;

/// A pattern `p` matches a domain `d` iff, after lowercasing both and
/// splitting `d` on `.`: some segment equals `p`, starts with `p + "-"`, or
/// ends with `"-" + p`. Multi-segment patterns additionally match any
/// contiguous run of segments equal to the pattern's own segments (I3).
pub fn domain_pattern_matches(domain: &str, pattern: &str) -> bool {
    let domain = domain.to_lowercase();
    let pattern = pattern.to_lowercase();
    let domain_segments: Vec<&str> = domain.split('.').collect();
    let pattern_segments: Vec<&str> = pattern.split('.').collect();

    if pattern_segments.len() > 1 {
        return domain_segments
            .windows(pattern_segments.len())
            .any(|window| window == pattern_segments.as_slice());
    }

    let prefix = format!("{pattern}-");
    let suffix = format!("-{pattern}");
    domain_segments
        .iter()
        .any(|seg| *seg == pattern || seg.starts_with(&prefix) || seg.ends_with(&suffix))
}

/// Extracts the registrable domain (host, minus scheme/path/port) from a URL.
pub fn extract_domain(url: &str) -> String {
    let without_scheme = url.split("://").nth(1).unwrap_or(url);
    let host = without_scheme.split(['/', '?', '#']).next().unwrap_or(without_scheme);
    host.split(':').next().unwrap_or(host).to_lowercase()
}

/// Result of resolving `(company_name, url)` (§4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolution {
    pub is_official: bool,
    pub is_parent: bool,
    pub is_subsidiary: bool,
    pub subsidiary_label: Option<String>,
    pub is_sibling: bool,
    pub sibling_label: Option<String>,
    pub conflicting_companies: Vec<String>,
}

/// Does any of the target company's own patterns match the URL's domain?
pub fn is_official_domain(mapping: &CompanyMapping, company_name: &str, url: &str) -> bool {
    let domain = extract_domain(url);
    match mapping.get(company_name) {
        Some(entry) => entry.domains.iter().any(|p| domain_pattern_matches(&domain, p)),
        None => false,
    }
}

/// Tier-1 + tier-2 subsidiary detection (§4.1 "Subsidiary detection").
/// Returns `(is_subsidiary, label)` where `label` names the registered
/// subsidiary or describes the unregistered wildcard match.
pub fn is_subsidiary_domain(
    mapping: &CompanyMapping,
    parent_name: &str,
    url: &str,
) -> (bool, Option<String>) {
    let domain = extract_domain(url);

    // I4: a domain matching the target's own pattern is never its subsidiary.
    if is_official_domain(mapping, parent_name, url) {
        return (false, None);
    }

    // Tier 1: registered subsidiaries.
    for (sub_name, sub_entry) in mapping.subsidiaries_of(parent_name) {
        if sub_entry.domains.iter().any(|p| domain_pattern_matches(&domain, p)) {
            return (true, Some(sub_name.clone()));
        }
    }

    // Tier 2: wildcard `parent_pattern-X` segments.
    let Some(parent_entry) = mapping.get(parent_name) else {
        return (false, None);
    };

    let sibling_patterns: HashSet<String> = mapping
        .siblings_of(parent_name)
        .into_iter()
        .flat_map(|(_, entry)| entry.domains.iter().cloned())
        .map(|p| p.to_lowercase())
        .collect();

    for segment in domain.split('.') {
        for parent_pattern in &parent_entry.domains {
            let parent_pattern_lower = parent_pattern.to_lowercase();
            let prefix = format!("{parent_pattern_lower}-");
            if let Some(suffix) = segment.strip_prefix(&prefix) {
                if RECRUITMENT_SUFFIXES.contains(&suffix) {
                    continue;
                }
                if sibling_patterns.contains(segment) {
                    continue;
                }
                if parent_entry.domains.iter().any(|p| p.to_lowercase() == segment) {
                    continue;
                }
                return (true, Some(format!("unregistered:{segment}")));
            }
        }
    }

    (false, None)
}

/// Parent detection for subsidiary queries (§4.1 "Parent detection").
/// The URL is a parent site iff it matches one of the parent's patterns and
/// does not match any pattern unique to the child.
pub fn is_parent_domain(mapping: &CompanyMapping, child_name: &str, url: &str) -> bool {
    let domain = extract_domain(url);

    let Some(child_entry) = mapping.get(child_name) else {
        return false;
    };
    let Some(parent_name) = child_entry.parent.clone() else {
        return false;
    };
    let Some(parent_entry) = mapping.get(&parent_name) else {
        return false;
    };

    let parent_patterns: HashSet<String> =
        parent_entry.domains.iter().map(|p| p.to_lowercase()).collect();
    let child_unique_patterns: HashSet<String> = child_entry
        .domains
        .iter()
        .map(|p| p.to_lowercase())
        .filter(|p| !parent_patterns.contains(p))
        .collect();

    // I4: never the parent of a domain that is the child's own.
    if child_unique_patterns.iter().any(|p| domain_pattern_matches(&domain, p)) {
        return false;
    }

    parent_patterns.iter().any(|p| domain_pattern_matches(&domain, p))
}

/// Is this content type allowed to be attributed to the parent's domain for
/// `company_name` (§3 `allow_parent_domains_for`)?
pub fn is_parent_domain_allowed(mapping: &CompanyMapping, company_name: &str, content_type: &str) -> bool {
    mapping
        .get(company_name)
        .map(|entry| entry.allow_parent_domains_for.iter().any(|ct| ct == content_type))
        .unwrap_or(false)
}

/// Collects segments and hyphen-split tokens from a URL's domain, looks
/// each up in the reverse pattern index, and returns companies other than
/// the target and its parent (§4.1 "Conflict detection").
pub fn conflicting_companies(
    mapping: &CompanyMapping,
    company_name: &str,
    url: &str,
) -> Vec<String> {
    let domain = extract_domain(url);
    let parent = mapping.get(company_name).and_then(|e| e.parent.clone());
    let index = mapping.pattern_index();

    let mut tokens: HashSet<String> = HashSet::new();
    for segment in domain.split('.') {
        tokens.insert(segment.to_string());
        for part in segment.split('-') {
            tokens.insert(part.to_string());
        }
    }

    let mut conflicts: HashSet<String> = HashSet::new();
    for token in &tokens {
        if let Some(companies) = index.get(token) {
            for c in companies {
                if c != company_name && Some(c.as_str()) != parent.as_deref() {
                    conflicts.insert(c.clone());
                }
            }
        }
    }

    let mut result: Vec<String> = conflicts.into_iter().collect();
    result.sort();
    result
}

/// Full identity resolution combining official/parent/subsidiary/sibling/
/// conflict detection (§4.1 responsibility statement).
pub fn resolve_identity(mapping: &CompanyMapping, company_name: &str, url: &str) -> IdentityResolution {
    let is_official = is_official_domain(mapping, company_name, url);
    let is_parent = !is_official && is_parent_domain(mapping, company_name, url);
    let (is_subsidiary, subsidiary_label) = if is_official {
        (false, None)
    } else {
        is_subsidiary_domain(mapping, company_name, url)
    };

    let domain = extract_domain(url);
    let (is_sibling, sibling_label) = if is_official || is_subsidiary {
        (false, None)
    } else {
        mapping
            .siblings_of(company_name)
            .into_iter()
            .find(|(_, entry)| entry.domains.iter().any(|p| domain_pattern_matches(&domain, p)))
            .map(|(name, _)| (true, Some(name.clone())))
            .unwrap_or((false, None))
    };

    let conflicting = if is_official || is_parent || is_subsidiary || is_sibling {
        Vec::new()
    } else {
        conflicting_companies(mapping, company_name, url)
    };

    IdentityResolution {
        is_official,
        is_parent,
        is_subsidiary,
        subsidiary_label,
        is_sibling,
        sibling_label,
        conflicting_companies: conflicting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::mapping::CompanyEntry;
    use std::collections::HashMap as Map;

    fn mapping_with(entries: Vec<(&str, CompanyEntry)>) -> CompanyMapping {
        CompanyMapping {
            entries: entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            short_domain_allowlist: Map::new(),
        }
    }

    #[test]
    fn segment_exact_match() {
        assert!(domain_pattern_matches("www.mec.co.jp", "mec"));
    }

    #[test]
    fn segment_substring_does_not_match() {
        assert!(!domain_pattern_matches("mecyes.co.jp", "mec"));
    }

    #[test]
    fn hyphen_prefixed_subdomain_matches() {
        assert!(domain_pattern_matches("career-mc.mitsubishicorp.com", "mitsubishicorp"));
    }

    #[test]
    fn multi_segment_pattern_matches_contiguous_run() {
        assert!(domain_pattern_matches("bk.mufg.jp", "bk.mufg"));
    }

    #[test]
    fn subsidiary_registered_pattern_wins_tier_one() {
        let mapping = mapping_with(vec![
            ("NTTデータ", CompanyEntry { domains: vec!["nttdata".into()], parent: None, allow_parent_domains_for: vec![] }),
            ("NTTデータMSE", CompanyEntry { domains: vec!["nttdata-mse".into()], parent: Some("NTTデータ".into()), allow_parent_domains_for: vec![] }),
        ]);
        let (is_sub, label) = is_subsidiary_domain(&mapping, "NTTデータ", "https://www.nttdata-mse.com/");
        assert!(is_sub);
        assert_eq!(label.as_deref(), Some("NTTデータMSE"));
    }

    #[test]
    fn subsidiary_wildcard_unregistered() {
        let mapping = mapping_with(vec![(
            "NTTデータ",
            CompanyEntry { domains: vec!["nttdata".into()], parent: None, allow_parent_domains_for: vec![] },
        )]);
        let (is_sub, label) = is_subsidiary_domain(&mapping, "NTTデータ", "https://www.nttdata-sbc.co.jp/");
        assert!(is_sub);
        assert!(label.unwrap().contains("nttdata-sbc"));
    }

    #[test]
    fn subsidiary_wildcard_excludes_recruitment_suffix() {
        let mapping = mapping_with(vec![(
            "NTTデータ",
            CompanyEntry { domains: vec!["nttdata".into()], parent: None, allow_parent_domains_for: vec![] },
        )]);
        let (is_sub, _) = is_subsidiary_domain(&mapping, "NTTデータ", "https://nttdata-recruit.jp/");
        assert!(!is_sub);
    }

    #[test]
    fn own_domain_is_never_subsidiary_of_self() {
        let mapping = mapping_with(vec![(
            "NTTデータ",
            CompanyEntry { domains: vec!["nttdata".into()], parent: None, allow_parent_domains_for: vec![] },
        )]);
        let (is_sub, label) = is_subsidiary_domain(&mapping, "NTTデータ", "https://www.nttdata.com/");
        assert!(!is_sub);
        assert!(label.is_none());
    }

    #[test]
    fn parent_domain_true_for_parent_pattern() {
        let mapping = mapping_with(vec![
            ("三井物産", CompanyEntry { domains: vec!["mitsui".into()], parent: None, allow_parent_domains_for: vec![] }),
            ("三井物産スチール", CompanyEntry { domains: vec!["mitsui-steel".into()], parent: Some("三井物産".into()), allow_parent_domains_for: vec![] }),
        ]);
        assert!(is_parent_domain(&mapping, "三井物産スチール", "https://career.mitsui.com/"));
    }

    #[test]
    fn parent_domain_excludes_childs_own_unique_pattern() {
        let mapping = mapping_with(vec![
            ("三井物産", CompanyEntry { domains: vec!["mitsui".into()], parent: None, allow_parent_domains_for: vec![] }),
            ("三井物産スチール", CompanyEntry { domains: vec!["mitsui-steel".into()], parent: Some("三井物産".into()), allow_parent_domains_for: vec![] }),
        ]);
        assert!(!is_parent_domain(&mapping, "三井物産スチール", "https://www.mitsui-steel.com/"));
    }

    proptest::proptest! {
        // I3: gluing an arbitrary non-empty suffix directly onto a pattern,
        // with no `.` or `-` boundary, must never produce a match — a
        // segment-boundary matcher is never fooled by mere string containment.
        #[test]
        fn pattern_never_matches_as_a_bare_substring(
            pattern in "[a-z]{3,10}",
            glued_suffix in "[a-z0-9]{1,8}",
        ) {
            let domain = format!("{pattern}{glued_suffix}.co.jp");
            proptest::prop_assert!(!domain_pattern_matches(&domain, &pattern));
        }

        // Conversely, a `-`-joined segment built from the pattern always matches.
        #[test]
        fn hyphen_joined_segment_always_matches(
            pattern in "[a-z]{3,10}",
            joined_suffix in "[a-z0-9]{1,8}",
        ) {
            let domain = format!("{pattern}-{joined_suffix}.co.jp");
            proptest::prop_assert!(domain_pattern_matches(&domain, &pattern));
        }
    }
}
