// LanceDB vector index
// Persists composite vectors and their metadata, one table per index


use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arrow::array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use tracing::{debug, error, info, warn};

use super::index::{
    ArtisanMetadata, DistanceMetric, IndexFilter, IndexInfo, IndexMatch, IndexQuery, StoredVector,
    VectorIndex, sort_matches,
};
use crate::profile::ExperienceLevel;
use crate::{MatchError, Result};

const METRIC_METADATA_KEY: &str = "distance_metric";

/// Vector index backed by an embedded LanceDB directory
pub struct LanceIndex {
    connection: Connection,
    path: PathBuf,
    default_metric: DistanceMetric,
    metrics: Mutex<HashMap<String, DistanceMetric>>,
}

fn db_error(context: &str, e: impl std::fmt::Display) -> MatchError {
    MatchError::Index(format!("{context}: {e}"))
}

impl LanceIndex {
    /// Opens (or creates) the LanceDB directory at `path`
    #[inline]
    pub async fn open<P: AsRef<Path>>(path: P, default_metric: DistanceMetric) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Initializing LanceDB at path: {}", path.display());

        std::fs::create_dir_all(&path).map_err(|e| {
            MatchError::Index(format!("Failed to create vector database directory: {e}"))
        })?;

        let uri = format!("file://{}", path.display());

        let connection = match lancedb::connect(&uri).execute().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to connect to LanceDB: {}", e);

                let error_msg = e.to_string().to_lowercase();
                if error_msg.contains("corrupt") || error_msg.contains("malformed") {
                    warn!("Vector database corruption detected, attempting recovery");
                    Self::attempt_corruption_recovery(&path)?;

                    lancedb::connect(&uri)
                        .execute()
                        .await
                        .map_err(|e| db_error("Failed to connect to LanceDB after recovery", e))?
                } else {
                    return Err(db_error("Failed to connect to LanceDB", e));
                }
            }
        };

        info!("Vector index opened at {}", path.display());
        Ok(Self {
            connection,
            path,
            default_metric,
            metrics: Mutex::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_schema(dimensions: usize, metric: DistanceMetric) -> Result<Arc<Schema>> {
        let dims = i32::try_from(dimensions)
            .map_err(|_| MatchError::InvalidInput(format!("dimension too large: {dimensions}")))?;

        let fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dims,
                ),
                false,
            ),
            Field::new("name", DataType::Utf8, false),
            Field::new("profession", DataType::Utf8, true),
            Field::new("experience_level", DataType::Utf8, true),
            Field::new("rating", DataType::Float32, true),
            Field::new("verified", DataType::Boolean, false),
            Field::new("content_hash", DataType::Utf8, false),
            Field::new("model_version", DataType::Utf8, false),
        ];

        let metadata = HashMap::from([(METRIC_METADATA_KEY.to_string(), metric.to_string())]);
        Ok(Arc::new(Schema::new_with_metadata(fields, metadata)))
    }

    async fn open_table(&self, index: &str) -> Result<Table> {
        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| db_error("Failed to list tables", e))?;

        if !names.iter().any(|n| n == index) {
            return Err(MatchError::Index(format!("index not found: {index}")));
        }

        self.connection
            .open_table(index)
            .execute()
            .await
            .map_err(|e| db_error("Failed to open table", e))
    }

    async fn table_info(&self, index: &str, table: &Table) -> Result<IndexInfo> {
        let schema = table
            .schema()
            .await
            .map_err(|e| db_error("Failed to get table schema", e))?;

        let dimensions = schema
            .fields()
            .iter()
            .find(|f| f.name() == "vector")
            .and_then(|f| match f.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                MatchError::Index(format!("table {index} has no fixed-size vector column"))
            })?;

        let known = self
            .metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .copied();

        let metric = known
            .or_else(|| {
                schema
                    .metadata()
                    .get(METRIC_METADATA_KEY)
                    .and_then(|m| parse_metric(m))
            })
            .unwrap_or(self.default_metric);

        Ok(IndexInfo {
            name: index.to_string(),
            dimensions,
            metric,
        })
    }

    fn create_record_batch(
        dimensions: usize,
        metric: DistanceMetric,
        id: &str,
        vector: &[f32],
        metadata: &ArtisanMetadata,
    ) -> Result<RecordBatch> {
        let schema = Self::create_schema(dimensions, metric)?;
        let dims = i32::try_from(dimensions)
            .map_err(|_| MatchError::InvalidInput(format!("dimension too large: {dimensions}")))?;

        let values_array = Float32Array::from(vector.to_vec());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::try_new(field, dims, Arc::new(values_array), None)
            .map_err(|e| db_error("Failed to create vector array", e))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![id])),
            Arc::new(vector_array),
            Arc::new(StringArray::from(vec![metadata.name.as_str()])),
            Arc::new(StringArray::from(vec![metadata.profession.as_deref()])),
            Arc::new(StringArray::from(vec![
                metadata.experience_level.map(ExperienceLevel::as_str),
            ])),
            Arc::new(Float32Array::from(vec![metadata.rating])),
            Arc::new(BooleanArray::from(vec![metadata.verified])),
            Arc::new(StringArray::from(vec![metadata.content_hash.as_str()])),
            Arc::new(StringArray::from(vec![metadata.model_version.as_str()])),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| db_error("Failed to create record batch", e))
    }

    async fn collect_batches(
        mut stream: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<RecordBatch>> {
        let mut batches = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| db_error("Failed to read result stream", e))?
        {
            batches.push(batch);
        }
        Ok(batches)
    }

    fn attempt_corruption_recovery(db_path: &Path) -> Result<()> {
        warn!(
            "Attempting vector database recovery at {}",
            db_path.display()
        );

        if db_path.exists() {
            let backup_path = db_path.with_extension("corrupted_backup");
            if let Err(e) = std::fs::rename(db_path, &backup_path) {
                error!("Failed to back up corrupted vector database: {}", e);
                std::fs::remove_dir_all(db_path)
                    .map_err(|e| db_error("Failed to remove corrupted database", e))?;
            } else {
                info!("Corrupted database backed up to {}", backup_path.display());
            }
        }

        std::fs::create_dir_all(db_path)
            .map_err(|e| db_error("Failed to recreate vector database directory", e))?;
        Ok(())
    }
}

fn parse_metric(value: &str) -> Option<DistanceMetric> {
    match value {
        "cosine" => Some(DistanceMetric::Cosine),
        "euclidean" => Some(DistanceMetric::Euclidean),
        "dot" => Some(DistanceMetric::Dot),
        _ => None,
    }
}

fn distance_type(metric: DistanceMetric) -> DistanceType {
    match metric {
        DistanceMetric::Cosine => DistanceType::Cosine,
        DistanceMetric::Euclidean => DistanceType::L2,
        DistanceMetric::Dot => DistanceType::Dot,
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders an index filter as a LanceDB SQL predicate
pub(crate) fn filter_predicate(filter: &IndexFilter) -> Option<String> {
    let mut clauses = Vec::new();

    if filter.verified_only {
        clauses.push("verified = true".to_string());
    }

    if let Some(min_rating) = filter.min_rating {
        clauses.push(format!("rating >= {min_rating}"));
    }

    if !filter.experience_levels.is_empty() {
        let levels = filter
            .experience_levels
            .iter()
            .map(|level| quote(level.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("experience_level IN ({levels})"));
    }

    if !filter.artisan_ids.is_empty() {
        let ids = filter
            .artisan_ids
            .iter()
            .map(|id| quote(id))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("id IN ({ids})"));
    }

    (!clauses.is_empty()).then(|| clauses.join(" AND "))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| MatchError::Index(format!("Missing {name} column")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| MatchError::Index(format!("Invalid {name} column type")))
}

fn optional_string(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn parse_metadata(batch: &RecordBatch, row: usize) -> Result<ArtisanMetadata> {
    let names = string_column(batch, "name")?;
    let professions = string_column(batch, "profession")?;
    let levels = string_column(batch, "experience_level")?;
    let hashes = string_column(batch, "content_hash")?;
    let versions = string_column(batch, "model_version")?;

    let ratings = batch
        .column_by_name("rating")
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
        .ok_or_else(|| MatchError::Index("Missing rating column".to_string()))?;
    let verified = batch
        .column_by_name("verified")
        .and_then(|col| col.as_any().downcast_ref::<BooleanArray>())
        .ok_or_else(|| MatchError::Index("Missing verified column".to_string()))?;

    Ok(ArtisanMetadata {
        name: names.value(row).to_string(),
        profession: optional_string(professions, row),
        experience_level: optional_string(levels, row).and_then(|l| l.parse().ok()),
        rating: (!ratings.is_null(row)).then(|| ratings.value(row)),
        verified: verified.value(row),
        content_hash: hashes.value(row).to_string(),
        model_version: versions.value(row).to_string(),
    })
}

fn parse_vector(batch: &RecordBatch, row: usize) -> Result<Vec<f32>> {
    let list = batch
        .column_by_name("vector")
        .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| MatchError::Index("Missing vector column".to_string()))?;
    let values = list.value(row);
    let floats = values
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| MatchError::Index("Invalid vector item type".to_string()))?;
    Ok(floats.values().to_vec())
}

#[async_trait]
impl VectorIndex for LanceIndex {
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

        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| db_error("Failed to list tables", e))?;

        if names.iter().any(|n| n == name) {
            let table = self.open_table(name).await?;
            let info = self.table_info(name, &table).await?;
            if info.dimensions != dimensions {
                return Err(MatchError::Index(format!(
                    "index {name} already exists with {} dimensions",
                    info.dimensions
                )));
            }
            self.metrics
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_string(), info.metric);
            return Ok(());
        }

        info!(
            "Creating vector table {} ({} dimensions, {})",
            name, dimensions, metric
        );
        let schema = Self::create_schema(dimensions, metric)?;
        self.connection
            .create_empty_table(name, schema)
            .execute()
            .await
            .map_err(|e| db_error("Failed to create table", e))?;

        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), metric);
        Ok(())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>> {
        let mut names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| db_error("Failed to list tables", e))?;
        names.sort();

        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            let table = self.open_table(&name).await?;
            infos.push(self.table_info(&name, &table).await?);
        }
        Ok(infos)
    }

    async fn upsert(
        &self,
        index: &str,
        id: &str,
        vector: &[f32],
        metadata: &ArtisanMetadata,
    ) -> Result<()> {
        let table = self.open_table(index).await?;
        let info = self.table_info(index, &table).await?;

        if vector.len() != info.dimensions {
            return Err(MatchError::DimensionMismatch {
                expected: info.dimensions,
                actual: vector.len(),
            });
        }

        let batch = Self::create_record_batch(info.dimensions, info.metric, id, vector, metadata)?;

        table
            .delete(&format!("id = {}", quote(id)))
            .await
            .map_err(|e| db_error("Failed to remove previous vector", e))?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| db_error("Failed to insert vector", e))?;

        debug!("Upserted vector {} into {}", id, index);
        Ok(())
    }

    async fn query(&self, index: &str, query: &IndexQuery) -> Result<Vec<IndexMatch>> {
        let table = self.open_table(index).await?;
        let info = self.table_info(index, &table).await?;

        if query.vector.len() != info.dimensions {
            return Err(MatchError::DimensionMismatch {
                expected: info.dimensions,
                actual: query.vector.len(),
            });
        }

        if query.top_k == 0 {
            return Ok(Vec::new());
        }

        let mut search = table
            .vector_search(query.vector.clone())
            .map_err(|e| db_error("Failed to create vector search", e))?
            .column("vector")
            .distance_type(distance_type(info.metric))
            .limit(query.top_k);

        if let Some(predicate) = filter_predicate(&query.filter) {
            search = search.only_if(predicate);
        }

        let stream = search
            .execute()
            .await
            .map_err(|e| db_error("Failed to execute search", e))?;
        let batches = Self::collect_batches(stream).await?;

        let mut matches = Vec::new();
        for batch in &batches {
            let ids = string_column(batch, "id")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for row in 0..batch.num_rows() {
                let distance = distances
                    .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });
                matches.push(IndexMatch {
                    id: ids.value(row).to_string(),
                    score: info.metric.score_from_distance(distance),
                    vector: if query.include_values {
                        Some(parse_vector(batch, row)?)
                    } else {
                        None
                    },
                    metadata: if query.include_metadata {
                        Some(parse_metadata(batch, row)?)
                    } else {
                        None
                    },
                });
            }
        }

        sort_matches(&mut matches);
        matches.truncate(query.top_k);
        debug!("Index {} returned {} matches", index, matches.len());
        Ok(matches)
    }

    async fn fetch(&self, index: &str, id: &str) -> Result<Option<StoredVector>> {
        let table = self.open_table(index).await?;
        let stream = table
            .query()
            .only_if(format!("id = {}", quote(id)))
            .limit(1)
            .execute()
            .await
            .map_err(|e| db_error("Failed to fetch vector", e))?;
        let batches = Self::collect_batches(stream).await?;

        for batch in &batches {
            if batch.num_rows() > 0 {
                return Ok(Some(StoredVector {
                    id: id.to_string(),
                    vector: parse_vector(batch, 0)?,
                    metadata: parse_metadata(batch, 0)?,
                }));
            }
        }
        Ok(None)
    }

    async fn count(&self, index: &str) -> Result<usize> {
        let table = self.open_table(index).await?;
        table
            .count_rows(None)
            .await
            .map_err(|e| db_error("Failed to count rows", e))
    }

    async fn delete(&self, index: &str, id: &str) -> Result<bool> {
        let table = self.open_table(index).await?;
        let predicate = format!("id = {}", quote(id));
        let existing = table
            .count_rows(Some(predicate.clone()))
            .await
            .map_err(|e| db_error("Failed to count rows", e))?;

        if existing == 0 {
            return Ok(false);
        }

        table
            .delete(&predicate)
            .await
            .map_err(|e| db_error("Failed to delete vector", e))?;
        Ok(true)
    }

    async fn list_ids(&self, index: &str) -> Result<Vec<String>> {
        let table = self.open_table(index).await?;
        let stream = table
            .query()
            .select(Select::Columns(vec!["id".to_string()]))
            .execute()
            .await
            .map_err(|e| db_error("Failed to list vector ids", e))?;
        let batches = Self::collect_batches(stream).await?;

        let mut ids = Vec::new();
        for batch in &batches {
            let column = string_column(batch, "id")?;
            ids.extend((0..batch.num_rows()).map(|row| column.value(row).to_string()));
        }
        ids.sort();
        Ok(ids)
    }

    async fn optimize(&self, index: &str) -> Result<()> {
        debug!("Optimizing vector table {}", index);
        let table = self.open_table(index).await?;
        table
            .optimize(lancedb::table::OptimizeAction::All)
            .await
            .map_err(|e| db_error("Failed to optimize table", e))?;
        info!("Vector table {} optimized", index);
        Ok(())
    }
}
