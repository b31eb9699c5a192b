//! Keyword Index (C3): a pure in-memory BM25 index persisted per company.
//!
//! Grounded on the Python `bm25_store.py` persistence-cache pattern (load on
//! first use, keep resident, explicit invalidate) rather than the teacher's
//! SQLite FTS5 schema, since the spec's unit of storage is one index per
//! `company_id`, lazily materialized and explicitly deletable (§6).

use crate::content_types::{expand_content_type_filter, matches_allowed_types};
use crate::error::Result;
use crate::tokenizer::{FallbackTokenizer, SurfaceTokenizer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// One indexed unit of text (§4.3 "Keyword Index").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BM25Document {
    pub id: String,
    pub content_type: String,
    #[serde(default)]
    pub secondary_content_types: Vec<String>,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedIndex {
    documents: Vec<BM25Document>,
}

/// A single company's BM25 index: documents plus the inverted postings list
/// built from them. Rebuilt on every document addition since whole-mapping
/// replace (§4.4) is the dominant write pattern, not incremental append.
#[derive(Debug, Default)]
pub struct BM25Index {
    documents: Vec<BM25Document>,
    doc_tokens: Vec<Vec<String>>,
    postings: HashMap<String, Vec<usize>>,
    avg_doc_len: f64,
}

impl BM25Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, document: BM25Document) {
        self.add_documents(vec![document]);
    }

    pub fn add_documents(&mut self, documents: Vec<BM25Document>) {
        let tokenizer = FallbackTokenizer;
        for doc in documents {
            let tokens = tokenizer.tokenize(&doc.text);
            let idx = self.documents.len();
            for token in &tokens {
                self.postings.entry(token.clone()).or_default().push(idx);
            }
            self.doc_tokens.push(tokens);
            self.documents.push(doc);
        }
        self.recompute_avg_len();
    }

    fn recompute_avg_len(&mut self) {
        if self.doc_tokens.is_empty() {
            self.avg_doc_len = 0.0;
            return;
        }
        let total: usize = self.doc_tokens.iter().map(|t| t.len()).sum();
        self.avg_doc_len = total as f64 / self.doc_tokens.len() as f64;
    }

    pub fn get_document(&self, id: &str) -> Option<&BM25Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.doc_tokens.clear();
        self.postings.clear();
        self.avg_doc_len = 0.0;
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Okapi BM25 search, optionally restricted to an expanded content-type
    /// allow-set (I2). Returns `(document, score)` pairs sorted descending.
    pub fn search(&self, query: &str, k: usize, content_types: Option<&[String]>) -> Vec<(BM25Document, f64)> {
        if self.documents.is_empty() {
            return Vec::new();
        }
        let tokenizer = FallbackTokenizer;
        let query_tokens = tokenizer.tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let allowed = content_types.map(|types| expand_content_type_filter(types));
        let n = self.documents.len() as f64;
        let mut scores = vec![0.0f64; self.documents.len()];

        for term in &query_tokens {
            let Some(postings) = self.postings.get(term) else { continue };
            let df = postings.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            for &doc_idx in postings {
                let doc_len = self.doc_tokens[doc_idx].len() as f64;
                let term_freq = self.doc_tokens[doc_idx].iter().filter(|t| *t == term).count() as f64;
                let denom = term_freq + K1 * (1.0 - B + B * doc_len / self.avg_doc_len.max(1.0));
                scores[doc_idx] += idf * (term_freq * (K1 + 1.0)) / denom.max(1e-9);
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, s)| *s > 0.0)
            .filter(|(idx, _)| match &allowed {
                Some(allowed) => {
                    let doc = &self.documents[*idx];
                    matches_allowed_types(&doc.content_type, &doc.secondary_content_types, allowed)
                }
                None => true,
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| (self.documents[idx].clone(), score))
            .collect()
    }

    fn to_persisted(&self) -> PersistedIndex {
        PersistedIndex { documents: self.documents.clone() }
    }

    fn from_persisted(persisted: PersistedIndex) -> Self {
        let mut index = BM25Index::new();
        index.add_documents(persisted.documents);
        index
    }
}

/// Per-`company_id` BM25 index store with file persistence and an
/// in-process cache so repeated queries against the same company avoid
/// re-reading and re-tokenizing from disk (§4.3 "Lifecycle").
pub struct KeywordStore {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Arc<RwLock<BM25Index>>>>,
}

impl KeywordStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, cache: RwLock::new(HashMap::new()) }
    }

    fn path_for(&self, company_id: &str) -> PathBuf {
        self.dir.join(format!("{company_id}.json"))
    }

    pub fn exists(&self, company_id: &str) -> bool {
        self.cache.read().expect("keyword store lock poisoned").contains_key(company_id)
            || self.path_for(company_id).exists()
    }

    /// Returns the resident index for `company_id`, loading it from disk
    /// (or creating an empty one) on first access.
    pub fn index_for(&self, company_id: &str) -> Result<Arc<RwLock<BM25Index>>> {
        if let Some(existing) = self.cache.read().expect("keyword store lock poisoned").get(company_id) {
            return Ok(existing.clone());
        }
        let loaded = self.load_from_disk(company_id)?;
        let handle = Arc::new(RwLock::new(loaded));
        self.cache
            .write()
            .expect("keyword store lock poisoned")
            .insert(company_id.to_string(), handle.clone());
        Ok(handle)
    }

    fn load_from_disk(&self, company_id: &str) -> Result<BM25Index> {
        let path = self.path_for(company_id);
        if !path.exists() {
            return Ok(BM25Index::new());
        }
        let content = std::fs::read_to_string(&path)?;
        let persisted: PersistedIndex = serde_json::from_str(&content)?;
        Ok(BM25Index::from_persisted(persisted))
    }

    pub fn save(&self, company_id: &str) -> Result<()> {
        let handle = self.index_for(company_id)?;
        let persisted = handle.read().expect("keyword store lock poisoned").to_persisted();
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(&persisted)?;
        std::fs::write(self.path_for(company_id), content)?;
        Ok(())
    }

    pub fn delete(&self, company_id: &str) -> Result<()> {
        self.cache.write().expect("keyword store lock poisoned").remove(company_id);
        let path = self.path_for(company_id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn clear_index_cache(&self) {
        self.cache.write().expect("keyword store lock poisoned").clear();
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub fn keyword_store_from_config(config: &crate::config::Config) -> KeywordStore {
    KeywordStore::new(config.bm25_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str, content_type: &str) -> BM25Document {
        BM25Document {
            id: id.to_string(),
            content_type: content_type.to_string(),
            secondary_content_types: Vec::new(),
            text: text.to_string(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn ranks_exact_term_match_above_unrelated_document() {
        let mut index = BM25Index::new();
        index.add_documents(vec![
            doc("1", "新卒採用 エンジニア 募集", "new_grad_recruitment"),
            doc("2", "IR決算情報 株主還元", "ir_materials"),
        ]);
        let results = index.search("新卒採用", 5, None);
        assert_eq!(results[0].0.id, "1");
    }

    #[test]
    fn content_type_filter_excludes_non_matching_documents() {
        let mut index = BM25Index::new();
        index.add_documents(vec![
            doc("1", "新卒採用情報です", "new_grad_recruitment"),
            doc("2", "新卒採用関連のIR情報", "ir_materials"),
        ]);
        let results = index.search("新卒採用", 5, Some(&["ir_materials".to_string()]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "2");
    }

    #[test]
    fn content_type_filter_admits_match_via_secondary_type() {
        let mut index = BM25Index::new();
        let mut secondary_doc = doc("1", "新卒採用情報です", "corporate_site");
        secondary_doc.secondary_content_types = vec!["new_grad_recruitment".to_string()];
        index.add_documents(vec![secondary_doc, doc("2", "新卒採用とは無関係のIR情報", "ir_materials")]);

        let results = index.search("新卒採用", 5, Some(&["new_grad_recruitment".to_string()]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "1");
    }

    #[test]
    fn empty_index_returns_no_results() {
        let index = BM25Index::new();
        assert!(index.search("query", 5, None).is_empty());
    }

    #[test]
    fn save_and_load_round_trips_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KeywordStore::new(tmp.path().to_path_buf());
        {
            let handle = store.index_for("acme").unwrap();
            handle.write().unwrap().add_document(doc("1", "新卒採用情報", "new_grad_recruitment"));
        }
        store.save("acme").unwrap();
        store.clear_index_cache();
        let handle = store.index_for("acme").unwrap();
        assert_eq!(handle.read().unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_cache_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = KeywordStore::new(tmp.path().to_path_buf());
        store.index_for("acme").unwrap();
        store.save("acme").unwrap();
        store.delete("acme").unwrap();
        assert!(!store.exists("acme"));
    }
}
