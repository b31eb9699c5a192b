//! Company mapping file loading (§6 "Company mapping file").

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Generic domain terms excluded from the reverse pattern index even when a
/// company lists them (§3 "generic terms ... are excluded from this index").
pub const GENERIC_DOMAIN_PATTERNS: &[&str] = &[
    "recruit", "career", "careers", "jobs", "job", "saiyo", "entry", "about", "company",
    "corporate", "www", "com", "co", "jp", "net", "org", "info",
];

/// Recruitment-suffix tokens that disqualify a wildcard `parent-X` segment
/// from being treated as an unregistered subsidiary (§4.1 tier 2).
pub const RECRUITMENT_SUFFIXES: &[&str] =
    &["recruit", "saiyo", "career", "careers", "entry", "job", "jobs", "mypage"];

/// One company's entry in the mapping file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompanyEntry {
    pub domains: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub allow_parent_domains_for: Vec<String>,
}

/// Accepts the legacy bare-array shape (`["domain1", "domain2"]`) in
/// addition to the structured object shape (§6 "Both object and bare-array
/// value shapes MUST be accepted").
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawCompanyEntry {
    Structured {
        domains: Vec<String>,
        #[serde(default)]
        parent: Option<String>,
        #[serde(default)]
        allow_parent_domains_for: Vec<String>,
    },
    BareArray(Vec<String>),
}

impl From<RawCompanyEntry> for CompanyEntry {
    fn from(raw: RawCompanyEntry) -> Self {
        match raw {
            RawCompanyEntry::Structured { domains, parent, allow_parent_domains_for } => {
                CompanyEntry { domains, parent, allow_parent_domains_for }
            }
            RawCompanyEntry::BareArray(domains) => {
                CompanyEntry { domains, parent: None, allow_parent_domains_for: Vec::new() }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMappingFile {
    #[serde(default)]
    mappings: HashMap<String, RawCompanyEntry>,
    #[serde(default)]
    short_domain_allowlist: HashMap<String, Vec<String>>,
}

/// The fully loaded, process-cached company mapping (§3 "Company Mapping").
#[derive(Debug, Clone, Default)]
pub struct CompanyMapping {
    pub entries: HashMap<String, CompanyEntry>,
    /// Patterns under three characters explicitly authorized per company.
    pub short_domain_allowlist: HashMap<String, HashSet<String>>,
}

impl CompanyMapping {
    /// Loads from a JSON file. A missing or corrupt file degrades to an
    /// empty mapping rather than propagating an error — callers fall back
    /// to name-derived heuristics (§4.1 "Failure semantics").
    pub fn load(path: &Path) -> CompanyMapping {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<RawMappingFile>(&content) {
                Ok(raw) => Self::from_raw(raw),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "corrupt company mapping file, using empty mapping");
                    CompanyMapping::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "company mapping file missing, using empty mapping");
                CompanyMapping::default()
            }
        }
    }

    pub fn empty() -> CompanyMapping {
        CompanyMapping::default()
    }

    fn from_raw(raw: RawMappingFile) -> CompanyMapping {
        let entries = raw
            .mappings
            .into_iter()
            // Keys starting with `_` are documentation-only (§6).
            .filter(|(name, _)| !name.starts_with('_'))
            .map(|(name, entry)| (name, CompanyEntry::from(entry)))
            .collect();

        let short_domain_allowlist = raw
            .short_domain_allowlist
            .into_iter()
            .map(|(name, patterns)| (name, patterns.into_iter().collect()))
            .collect();

        CompanyMapping { entries, short_domain_allowlist }
    }

    pub fn get(&self, company_name: &str) -> Option<&CompanyEntry> {
        self.entries.get(company_name)
    }

    /// Patterns shorter than 3 chars that are allowlisted for this company.
    pub fn short_allowlist_for(&self, company_name: &str) -> HashSet<String> {
        self.short_domain_allowlist.get(company_name).cloned().unwrap_or_default()
    }

    /// Registered subsidiaries of `parent_name`: companies whose own entry
    /// declares `parent == parent_name`.
    pub fn subsidiaries_of(&self, parent_name: &str) -> Vec<(&String, &CompanyEntry)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.parent.as_deref() == Some(parent_name))
            .collect()
    }

    /// Siblings of `company_name`: other declared subsidiaries sharing the
    /// same parent.
    pub fn siblings_of(&self, company_name: &str) -> Vec<(&String, &CompanyEntry)> {
        let Some(parent) = self.entries.get(company_name).and_then(|e| e.parent.as_deref()) else {
            return Vec::new();
        };
        self.subsidiaries_of(parent)
            .into_iter()
            .filter(|(name, _)| name.as_str() != company_name)
            .collect()
    }

    /// Builds the reverse pattern → claiming-companies index, excluding
    /// generic terms, enforcing the ≥3-char-or-allowlisted invariant (§3).
    pub fn pattern_index(&self) -> HashMap<String, HashSet<String>> {
        let mut index: HashMap<String, HashSet<String>> = HashMap::new();
        for (name, entry) in &self.entries {
            let allowlist = self.short_allowlist_for(name);
            for pattern in &entry.domains {
                let pattern_lower = pattern.to_lowercase();
                if GENERIC_DOMAIN_PATTERNS.contains(&pattern_lower.as_str()) {
                    continue;
                }
                if pattern_lower.len() < 3 && !allowlist.contains(&pattern_lower) {
                    tracing::warn!(company = %name, pattern = %pattern, "dropping short unallowlisted domain pattern");
                    continue;
                }
                index.entry(pattern_lower).or_default().insert(name.clone());
            }
        }
        index
    }

    pub fn load_or_empty(path: Option<&std::path::PathBuf>) -> CompanyMapping {
        match path {
            Some(p) => CompanyMapping::load(p),
            None => CompanyMapping::empty(),
        }
    }
}

/// Thin wrapper error for explicit "mapping file missing" surfacing where a
/// caller wants to distinguish that from "loaded but empty".
pub fn require_mapping_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CoreError::MappingMissing(path.display().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_array_shape() {
        let json = r#"{"mappings": {"三井物産": ["mitsui"]}}"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        assert_eq!(mapping.get("三井物産").unwrap().domains, vec!["mitsui".to_string()]);
    }

    #[test]
    fn accepts_structured_shape_with_parent() {
        let json = r#"{"mappings": {"NTTデータMSE": {"domains": ["nttdata-mse"], "parent": "NTTデータ"}}}"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        assert_eq!(mapping.get("NTTデータMSE").unwrap().parent.as_deref(), Some("NTTデータ"));
    }

    #[test]
    fn documentation_only_keys_are_skipped() {
        let json = r#"{"mappings": {"_comment": ["ignored"], "三井物産": ["mitsui"]}}"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        assert!(mapping.get("_comment").is_none());
        assert!(mapping.get("三井物産").is_some());
    }

    #[test]
    fn pattern_index_excludes_generic_terms() {
        let json = r#"{"mappings": {"Acme": ["acme", "career"]}}"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        let index = mapping.pattern_index();
        assert!(index.contains_key("acme"));
        assert!(!index.contains_key("career"));
    }

    #[test]
    fn pattern_index_drops_short_unallowlisted_pattern() {
        let json = r#"{"mappings": {"Acme": ["hp"]}}"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        assert!(mapping.pattern_index().is_empty());
    }

    #[test]
    fn short_domain_allowlist_authorizes_pattern() {
        let json = r#"{
            "mappings": {"Acme": ["hp"]},
            "short_domain_allowlist": {"Acme": ["hp"]}
        }"#;
        let raw: RawMappingFile = serde_json::from_str(json).unwrap();
        let mapping = CompanyMapping::from_raw(raw);
        assert!(mapping.pattern_index().contains_key("hp"));
    }
}
