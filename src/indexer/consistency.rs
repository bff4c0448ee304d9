// Index consistency validation module
// Cross-checks the SQLite embedding ledger against the vector index


use std::collections::BTreeSet;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::database::VectorIndex;
use crate::database::sqlite::Database;

/// Result of comparing ledger entries with stored vectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Number of ledger entries in SQLite
    pub ledger_entries: usize,
    /// Number of vectors in the index
    pub index_vectors: usize,
    /// Artisans the ledger records as indexed that have no vector
    pub missing_in_index: Vec<String>,
    /// Vectors with no ledger entry
    pub orphaned_in_index: Vec<String>,
    pub is_consistent: bool,
}

impl ConsistencyReport {
    #[inline]
    pub fn summary(&self) -> String {
        if self.is_consistent {
            format!(
                "Index is consistent: {} ledger entries, {} vectors",
                self.ledger_entries, self.index_vectors
            )
        } else {
            format!(
                "Index inconsistencies found: {} missing from the index, {} orphaned vectors",
                self.missing_in_index.len(),
                self.orphaned_in_index.len()
            )
        }
    }

    #[inline]
    pub fn total_issues(&self) -> usize {
        self.missing_in_index.len() + self.orphaned_in_index.len()
    }
}

pub struct ConsistencyValidator<'a> {
    database: &'a Database,
    index: &'a dyn VectorIndex,
    index_name: &'a str,
}

impl<'a> ConsistencyValidator<'a> {
    #[inline]
    pub fn new(database: &'a Database, index: &'a dyn VectorIndex, index_name: &'a str) -> Self {
        Self {
            database,
            index,
            index_name,
        }
    }

    #[inline]
    pub async fn validate_consistency(&self) -> Result<ConsistencyReport> {
        info!("Validating index {} against the embedding ledger", self.index_name);

        let ledger: BTreeSet<String> = self
            .database
            .list_ledger_entries()
            .await?
            .into_iter()
            .map(|entry| entry.artisan_id)
            .collect();
        debug!("Found {} ledger entries", ledger.len());

        let vectors: BTreeSet<String> = self
            .index
            .list_ids(self.index_name)
            .await
            .with_context(|| format!("Failed to list vectors in {}", self.index_name))?
            .into_iter()
            .collect();
        debug!("Found {} vectors", vectors.len());

        let missing_in_index: Vec<String> = ledger.difference(&vectors).cloned().collect();
        let orphaned_in_index: Vec<String> = vectors.difference(&ledger).cloned().collect();
        let is_consistent = missing_in_index.is_empty() && orphaned_in_index.is_empty();

        let report = ConsistencyReport {
            ledger_entries: ledger.len(),
            index_vectors: vectors.len(),
            missing_in_index,
            orphaned_in_index,
            is_consistent,
        };

        if report.is_consistent {
            info!("Index consistency validation passed");
        } else {
            warn!("{}", report.summary());
        }

        Ok(report)
    }

    /// Deletes vectors that have no ledger entry; returns how many went away
    #[inline]
    pub async fn cleanup_orphaned_vectors(&self, artisan_ids: &[String]) -> Result<usize> {
        if artisan_ids.is_empty() {
            return Ok(0);
        }

        info!("Removing {} orphaned vectors", artisan_ids.len());

        let mut removed = 0;
        for artisan_id in artisan_ids {
            match self.index.delete(self.index_name, artisan_id).await {
                Ok(true) => {
                    removed += 1;
                    debug!("Removed orphaned vector: {}", artisan_id);
                }
                Ok(false) => {
                    warn!("Orphaned vector not found for deletion: {}", artisan_id);
                }
                Err(e) => {
                    error!("Failed to delete orphaned vector {}: {}", artisan_id, e);
                }
            }
        }

        Ok(removed)
    }

    /// Drops ledger entries whose vector is gone so the next run re-indexes them
    #[inline]
    pub async fn forget_missing_vectors(&self, artisan_ids: &[String]) -> Result<usize> {
        let mut forgotten = 0;
        for artisan_id in artisan_ids {
            if self.database.delete_ledger_entry(artisan_id).await? {
                forgotten += 1;
            }
        }
        Ok(forgotten)
    }
}
