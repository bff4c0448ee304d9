
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::{
    ArtisanMetadata, DistanceMetric, IndexInfo, IndexMatch, IndexQuery, StoredVector, VectorIndex,
    sort_matches,
};
use crate::{MatchError, Result};

struct MemoryTable {
    dimensions: usize,
    metric: DistanceMetric,
    rows: BTreeMap<String, (Vec<f32>, ArtisanMetadata)>,
}

/// Exact brute-force index kept in process memory
#[derive(Default)]
pub struct InMemoryIndex {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl InMemoryIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(index: &str) -> MatchError {
        MatchError::Index(format!("index not found: {index}"))
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn create_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        if dimensions == 0 {
            return Err(MatchError::InvalidInput(
                "index dimensions must be greater than 0".to_string(),
            ));
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = tables.get(name) {
            if existing.dimensions != dimensions || existing.metric != metric {
                return Err(MatchError::Index(format!(
                    "index {name} already exists with {} dimensions ({})",
                    existing.dimensions, existing.metric
                )));
            }
            return Ok(());
        }

        debug!("Creating in-memory index {} ({} dims, {})", name, dimensions, metric);
        tables.insert(
            name.to_string(),
            MemoryTable {
                dimensions,
                metric,
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut infos: Vec<IndexInfo> = tables
            .iter()
            .map(|(name, table)| IndexInfo {
                name: name.clone(),
                dimensions: table.dimensions,
                metric: table.metric,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn upsert(
        &self,
        index: &str,
        id: &str,
        vector: &[f32],
        metadata: &ArtisanMetadata,
    ) -> Result<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get_mut(index).ok_or_else(|| Self::missing(index))?;

        if vector.len() != table.dimensions {
            return Err(MatchError::DimensionMismatch {
                expected: table.dimensions,
                actual: vector.len(),
            });
        }

        table
            .rows
            .insert(id.to_string(), (vector.to_vec(), metadata.clone()));
        Ok(())
    }

    async fn query(&self, index: &str, query: &IndexQuery) -> Result<Vec<IndexMatch>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get(index).ok_or_else(|| Self::missing(index))?;

        if query.vector.len() != table.dimensions {
            return Err(MatchError::DimensionMismatch {
                expected: table.dimensions,
                actual: query.vector.len(),
            });
        }

        let mut matches = Vec::new();
        for (id, (vector, metadata)) in &table.rows {
            if !query.filter.allows_id(id) || !query.filter.matches(metadata) {
                continue;
            }
            let score = table.metric.score(&query.vector, vector)?;
            matches.push(IndexMatch {
                id: id.clone(),
                score,
                vector: query.include_values.then(|| vector.clone()),
                metadata: query.include_metadata.then(|| metadata.clone()),
            });
        }

        sort_matches(&mut matches);
        matches.truncate(query.top_k);
        Ok(matches)
    }

    async fn fetch(&self, index: &str, id: &str) -> Result<Option<StoredVector>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(table.rows.get(id).map(|(vector, metadata)| StoredVector {
            id: id.to_string(),
            vector: vector.clone(),
            metadata: metadata.clone(),
        }))
    }

    async fn count(&self, index: &str) -> Result<usize> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(table.rows.len())
    }

    async fn delete(&self, index: &str, id: &str) -> Result<bool> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get_mut(index).ok_or_else(|| Self::missing(index))?;
        Ok(table.rows.remove(id).is_some())
    }

    async fn list_ids(&self, index: &str) -> Result<Vec<String>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get(index).ok_or_else(|| Self::missing(index))?;
        Ok(table.rows.keys().cloned().collect())
    }
}
