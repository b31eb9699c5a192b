//! Company Identity Registry (C1): resolves `(company_name, url)` to an
//! official/parent/subsidiary/sibling/conflict relation from a structured
//! domain-pattern mapping (§4.1).

pub mod denylist;
pub mod mapping;
pub mod matching;
pub mod normalize;

use crate::error::Result;
use mapping::CompanyMapping;
use matching::IdentityResolution;
use std::path::PathBuf;
use std::sync::RwLock;

/// Process-wide, explicitly reloadable handle over the company mapping
/// (§9 "Global caches ... → dependency-injected services"; §5 "Shared
/// state lifecycle").
pub struct Registry {
    mapping_path: Option<PathBuf>,
    mapping: RwLock<CompanyMapping>,
}

impl Registry {
    /// Builds a registry directly from an in-memory mapping, bypassing disk
    /// loading (used by callers that already hold a mapping, and by tests).
    pub fn from_mapping(mapping: CompanyMapping) -> Self {
        Self { mapping_path: None, mapping: RwLock::new(mapping) }
    }

    /// Loads the mapping once at construction; a missing or corrupt file
    /// degrades to an empty mapping rather than failing construction.
    pub fn new(mapping_path: Option<PathBuf>) -> Self {
        let mapping = CompanyMapping::load_or_empty(mapping_path.as_ref());
        Self { mapping_path, mapping: RwLock::new(mapping) }
    }

    /// Explicit reload, invalidating the cached mapping (§3 "Lifecycle").
    pub fn reload(&self) {
        let mapping = CompanyMapping::load_or_empty(self.mapping_path.as_ref());
        *self.mapping.write().expect("registry lock poisoned") = mapping;
    }

    /// Resolves the identity relation of `url` against `company_name`.
    /// Unknown company names fall back to name-derived ASCII hints rather
    /// than erroring (§4.1 "Failure semantics").
    pub fn resolve(&self, company_name: &str, url: &str) -> IdentityResolution {
        let mapping = self.mapping.read().expect("registry lock poisoned");
        if mapping.get(company_name).is_some() {
            matching::resolve_identity(&mapping, company_name, url)
        } else {
            self.resolve_from_name_hints(company_name, url)
        }
    }

    fn resolve_from_name_hints(&self, company_name: &str, url: &str) -> IdentityResolution {
        let hints = normalize::extract_domain_hints(company_name);
        let domain = matching::extract_domain(url);
        let is_official = hints.iter().any(|h| domain.contains(h.as_str()));
        IdentityResolution {
            is_official,
            is_parent: false,
            is_subsidiary: false,
            subsidiary_label: None,
            is_sibling: false,
            sibling_label: None,
            conflicting_companies: Vec::new(),
        }
    }

    pub fn is_parent_domain_allowed(&self, company_name: &str, content_type: &str) -> bool {
        let mapping = self.mapping.read().expect("registry lock poisoned");
        matching::is_parent_domain_allowed(&mapping, company_name, content_type)
    }

    /// Companies whose domain patterns match the URL's domain, directly
    /// (without a named target) — used by web-search scoring to discover
    /// which companies a result might belong to.
    pub fn candidates_for_domain(&self, url: &str) -> Vec<String> {
        let mapping = self.mapping.read().expect("registry lock poisoned");
        let domain = matching::extract_domain(url);
        mapping
            .entries
            .iter()
            .filter(|(_, entry)| entry.domains.iter().any(|p| matching::domain_pattern_matches(&domain, p)))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

pub fn registry_from_config(config: &crate::config::Config) -> Result<Registry> {
    Ok(Registry::new(config.company_mapping_path.clone()))
}
