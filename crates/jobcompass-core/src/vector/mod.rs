//! Vector Store Adapter (C4): company-scoped embedding storage with
//! filtered ANN search. Stores embeddings as BLOBs and computes cosine
//! similarity in Rust (grounded on the teacher's `db/vectors.rs` BLOB
//! pattern; ANN here means "exact nearest neighbor over the company's own
//! rows", not an approximate index, since a single company's chunk count
//! is small enough that exact search is the pragmatic choice).

use crate::content_types::{expand_content_type_filter, matches_allowed_types};
use crate::error::{CoreError, Result};
use crate::llm::Embedder;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

const MIN_CHUNK_CHARS: usize = 10;

/// A chunk of text offered for ingest, before storage (§6 "Chunk metadata contract").
#[derive(Debug, Clone)]
pub struct IngestChunk {
    pub text: String,
    pub chunk_type: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub secondary_content_types: Vec<String>,
}

/// A chunk as returned from a search, with distance and optionally its
/// own embedding (for MMR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub content_type: String,
    pub secondary_content_types: Vec<String>,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

fn is_primitive(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::String(_) | serde_json::Value::Number(_) | serde_json::Value::Bool(_))
}

/// Company-scoped persistent vector store (§4.4).
pub struct VectorStore {
    conn: Mutex<Connection>,
}

impl VectorStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("company_chunks.sqlite");
        let conn = Connection::open(path).map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS company_chunks (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                company_name TEXT NOT NULL,
                source_url TEXT NOT NULL,
                content_type TEXT NOT NULL,
                secondary_content_types TEXT NOT NULL DEFAULT '[]',
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        conn.execute("CREATE INDEX IF NOT EXISTS idx_company_chunks_company ON company_chunks(company_id)", [])
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an in-memory store, useful for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        conn.execute(
            "CREATE TABLE company_chunks (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                company_name TEXT NOT NULL,
                source_url TEXT NOT NULL,
                content_type TEXT NOT NULL,
                secondary_content_types TEXT NOT NULL DEFAULT '[]',
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Deletes all existing rows for `company_id`, then embeds and inserts
    /// `chunks`, atomically from the caller's perspective (§4.4).
    pub async fn store_company_info(
        &self,
        company_id: &str,
        company_name: &str,
        chunks: Vec<IngestChunk>,
        source_url: &str,
        embedder: &dyn Embedder,
    ) -> Result<bool> {
        let filtered: Vec<(usize, IngestChunk)> = chunks
            .into_iter()
            .enumerate()
            .filter(|(_, c)| c.text.trim().chars().count() >= MIN_CHUNK_CHARS)
            .collect();

        if filtered.is_empty() {
            tracing::warn!(company_id, "no valid content chunks to store");
            return Ok(false);
        }

        let texts: Vec<String> = filtered.iter().map(|(_, c)| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != filtered.len() {
            return Err(CoreError::VectorStoreUnavailable("embedding count mismatch".into()));
        }

        let mut conn = self.conn.lock().expect("vector store lock poisoned");
        let tx = conn.transaction().map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        tx.execute("DELETE FROM company_chunks WHERE company_id = ?1", params![company_id])
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;

        let mut stored = 0usize;
        for ((idx, chunk), embedding) in filtered.into_iter().zip(embeddings) {
            if embedding.is_empty() {
                continue;
            }
            let id = format!("{company_id}_{idx}");
            let mut metadata = chunk.metadata.clone();
            let secondary_from_metadata: Vec<String> = metadata
                .remove("secondary_content_types")
                .and_then(|v| v.as_array().cloned())
                .map(|arr| arr.into_iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            metadata.retain(|_, v| is_primitive(v));
            metadata.insert("company_id".into(), serde_json::Value::String(company_id.to_string()));
            metadata.insert("company_name".into(), serde_json::Value::String(company_name.to_string()));
            metadata.insert("source_url".into(), serde_json::Value::String(source_url.to_string()));
            metadata.insert("chunk_type".into(), serde_json::Value::String(chunk.chunk_type.clone()));
            metadata.insert("chunk_index".into(), serde_json::Value::Number(idx.into()));

            let mut secondary_content_types = chunk.secondary_content_types.clone();
            secondary_content_types.extend(secondary_from_metadata);
            secondary_content_types.sort();
            secondary_content_types.dedup();

            let metadata_json = serde_json::to_string(&metadata)?;
            let secondary_json = serde_json::to_string(&secondary_content_types)?;
            let embedding_bytes = embedding_to_bytes(&embedding);

            tx.execute(
                "INSERT OR REPLACE INTO company_chunks
                 (id, company_id, company_name, source_url, content_type, secondary_content_types, chunk_index, text, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    company_id,
                    company_name,
                    source_url,
                    chunk.chunk_type,
                    secondary_json,
                    idx as i64,
                    chunk.text,
                    metadata_json,
                    embedding_bytes
                ],
            )
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
            stored += 1;
        }

        tx.commit().map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        tracing::info!(company_id, stored, "stored company chunks");
        Ok(stored > 0)
    }

    /// Embeds `query`, then ANN-searches within `company_id`'s rows,
    /// optionally filtered by an expanded content-type set (§4.4).
    pub async fn search_company_context_by_type(
        &self,
        company_id: &str,
        query: &str,
        n_results: usize,
        content_types: Option<&[String]>,
        include_embeddings: bool,
        embedder: &dyn Embedder,
    ) -> Result<Vec<RetrievedChunk>> {
        let query_embedding = embedder.embed(query).await?;
        self.search_by_embedding(company_id, &query_embedding, n_results, content_types, include_embeddings)
    }

    /// Same as `search_company_context_by_type` but takes a precomputed
    /// query embedding (used by the orchestrator's multi-query fan-out to
    /// avoid re-embedding the same query text).
    pub fn search_by_embedding(
        &self,
        company_id: &str,
        query_embedding: &[f32],
        n_results: usize,
        content_types: Option<&[String]>,
        include_embeddings: bool,
    ) -> Result<Vec<RetrievedChunk>> {
        let conn = self.conn.lock().expect("vector store lock poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT id, text, metadata, content_type, secondary_content_types, embedding \
                 FROM company_chunks WHERE company_id = ?1",
            )
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;

        let allowed = content_types.map(|types| expand_content_type_filter(types));

        let rows = stmt
            .query_map(params![company_id], |row| {
                let id: String = row.get(0)?;
                let text: String = row.get(1)?;
                let metadata_json: String = row.get(2)?;
                let content_type: String = row.get(3)?;
                let secondary_json: String = row.get(4)?;
                let embedding_bytes: Vec<u8> = row.get(5)?;
                Ok((id, text, metadata_json, content_type, secondary_json, embedding_bytes))
            })
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, text, metadata_json, content_type, secondary_json, embedding_bytes) =
                row.map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
            let secondary_content_types: Vec<String> = serde_json::from_str(&secondary_json).unwrap_or_default();

            if let Some(allowed) = &allowed {
                if !matches_allowed_types(&content_type, &secondary_content_types, allowed) {
                    continue;
                }
            }

            let embedding = bytes_to_embedding(&embedding_bytes);
            let similarity = cosine_similarity(query_embedding, &embedding);
            let distance = 1.0 - similarity;
            let metadata: HashMap<String, serde_json::Value> = serde_json::from_str(&metadata_json)?;

            scored.push(RetrievedChunk {
                id,
                text,
                metadata,
                content_type,
                secondary_content_types,
                distance,
                embedding: include_embeddings.then_some(embedding),
            });
        }

        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n_results);
        Ok(scored)
    }

    pub fn has_company_rag(&self, company_id: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("vector store lock poisoned");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM company_chunks WHERE company_id = ?1", params![company_id], |r| r.get(0))
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        Ok(count > 0)
    }

    pub fn delete_company_rag(&self, company_id: &str) -> Result<()> {
        let conn = self.conn.lock().expect("vector store lock poisoned");
        conn.execute("DELETE FROM company_chunks WHERE company_id = ?1", params![company_id])
            .map_err(|e| CoreError::VectorStoreUnavailable(e.to_string()))?;
        Ok(())
    }
}

pub fn vector_store_from_config(config: &crate::config::Config) -> Result<VectorStore> {
    VectorStore::open(&config.vector_dir())
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_roundtrips_through_bytes() {
        let original = vec![1.0f32, -2.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&original)), original);
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn empty_store_returns_no_rows_for_unknown_company() {
        let store = VectorStore::open_in_memory().unwrap();
        let results = store.search_by_embedding("acme", &[1.0, 0.0], 5, None, false).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn has_company_rag_false_when_absent() {
        let store = VectorStore::open_in_memory().unwrap();
        assert!(!store.has_company_rag("acme").unwrap());
    }

    #[test]
    fn content_type_filter_admits_legacy_primary_and_secondary_match() {
        let store = VectorStore::open_in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO company_chunks
             (id, company_id, company_name, source_url, content_type, secondary_content_types, chunk_index, text, metadata, embedding)
             VALUES
             ('1', 'acme', 'Acme', 'https://acme.example/', 'corporate_ir', '[]', 0, 'legacy ir chunk', '{}', ?1),
             ('2', 'acme', 'Acme', 'https://acme.example/', 'corporate_site', '[\"csr_sustainability\"]', 1, 'secondary csr chunk', '{}', ?1),
             ('3', 'acme', 'Acme', 'https://acme.example/', 'employee_interviews', '[]', 2, 'unrelated chunk', '{}', ?1)",
            params![embedding_to_bytes(&[1.0, 0.0])],
        )
        .unwrap();
        drop(conn);

        let ir_results = store
            .search_by_embedding("acme", &[1.0, 0.0], 10, Some(&["ir_materials".to_string()]), false)
            .unwrap();
        assert_eq!(ir_results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["1"]);

        let csr_results = store
            .search_by_embedding("acme", &[1.0, 0.0], 10, Some(&["csr_sustainability".to_string()]), false)
            .unwrap();
        assert_eq!(csr_results.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["2"]);
    }
}
