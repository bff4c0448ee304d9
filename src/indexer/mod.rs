// Indexer module
// Keeps the vector index in step with the stored artisan profiles

pub mod consistency;


use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::database::VectorIndex;
use crate::database::sqlite::{Database, NewLedgerEntry};
use crate::fusion::ArtisanEmbedding;
use crate::profile::ArtisanProfile;
use crate::service::MatchService;

pub use consistency::{ConsistencyReport, ConsistencyValidator};

const DEFAULT_BATCH_SIZE: usize = 16;

/// Statistics about one indexing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexingStats {
    pub profiles_seen: usize,
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IndexingStats {
    #[inline]
    pub fn processed(&self) -> usize {
        self.indexed + self.skipped + self.failed
    }
}

/// Embeds stored profiles and writes them to the index
///
/// Profiles whose ledger entry matches their content hash and the current
/// model version are skipped unless indexing is forced. The vector is
/// written before the ledger entry, so a crash in between only causes a
/// redundant re-index.
pub struct ArtisanIndexer {
    service: Arc<MatchService>,
    database: Database,
    batch_size: usize,
}

impl ArtisanIndexer {
    #[inline]
    pub fn new(service: Arc<MatchService>, database: Database) -> Self {
        Self {
            service,
            database,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Stores the profiles, then indexes those that changed
    #[inline]
    pub async fn import_and_index(
        &self,
        profiles: &[ArtisanProfile],
        force: bool,
    ) -> Result<IndexingStats> {
        for profile in profiles {
            self.database
                .store_profile(profile)
                .await
                .with_context(|| format!("Failed to store profile {}", profile.id))?;
        }
        self.index_profiles(profiles, force, |_| {}).await
    }

    /// Indexes every profile in the local store
    #[inline]
    pub async fn index_all<F>(&self, force: bool, on_progress: F) -> Result<IndexingStats>
    where
        F: FnMut(&IndexingStats),
    {
        let profiles = self.database.list_profiles().await?;
        info!("Indexing {} stored profiles", profiles.len());
        self.index_profiles(&profiles, force, on_progress).await
    }

    /// Indexes already-stored profiles in batches
    ///
    /// A batch that fails as a whole is retried one profile at a time so a
    /// single bad profile does not block the rest.
    #[inline]
    pub async fn index_profiles<F>(
        &self,
        profiles: &[ArtisanProfile],
        force: bool,
        mut on_progress: F,
    ) -> Result<IndexingStats>
    where
        F: FnMut(&IndexingStats),
    {
        let model_version = self.service.fusion().client().model_version();
        let mut stats = IndexingStats {
            profiles_seen: profiles.len(),
            ..IndexingStats::default()
        };

        let mut pending = Vec::with_capacity(profiles.len());
        for profile in profiles {
            if !force && self.is_current(profile, &model_version).await? {
                debug!("Skipping unchanged profile {}", profile.id);
                stats.skipped += 1;
            } else {
                pending.push(profile.clone());
            }
        }
        on_progress(&stats);

        for batch in pending.chunks(self.batch_size) {
            match self.service.generate_batch_artisan_embeddings(batch).await {
                Ok(embeddings) => {
                    for (profile, embedding) in batch.iter().zip(&embeddings) {
                        self.write(profile, embedding, &mut stats).await;
                    }
                }
                Err(e) => {
                    warn!(
                        "Batch of {} profiles failed ({}), retrying individually",
                        batch.len(),
                        e
                    );
                    for profile in batch {
                        match self.service.generate_artisan_embedding(profile).await {
                            Ok(embedding) => self.write(profile, &embedding, &mut stats).await,
                            Err(e) => {
                                error!("Failed to embed profile {}: {}", profile.id, e);
                                stats.failed += 1;
                            }
                        }
                    }
                }
            }
            on_progress(&stats);
        }

        if stats.indexed > 0 {
            self.optimize_stores().await;
        }

        info!(
            "Indexing finished: {} indexed, {} skipped, {} failed",
            stats.indexed, stats.skipped, stats.failed
        );
        Ok(stats)
    }

    /// Compacts the vector table and the profile store after writes
    async fn optimize_stores(&self) {
        if let Err(e) = self
            .service
            .index()
            .optimize(self.service.index_name())
            .await
        {
            warn!("Failed to optimize vector index: {}", e);
        }

        if let Err(e) = self.database.optimize().await {
            warn!("Failed to optimize profile database: {:#}", e);
        }
    }

    async fn is_current(&self, profile: &ArtisanProfile, model_version: &str) -> Result<bool> {
        Ok(self
            .database
            .get_ledger_entry(&profile.id)
            .await?
            .is_some_and(|entry| entry.is_current(&profile.content_hash(), model_version)))
    }

    async fn write(
        &self,
        profile: &ArtisanProfile,
        embedding: &ArtisanEmbedding,
        stats: &mut IndexingStats,
    ) {
        match self.record(profile, embedding).await {
            Ok(()) => stats.indexed += 1,
            Err(e) => {
                error!("Failed to index profile {}: {:#}", profile.id, e);
                stats.failed += 1;
            }
        }
    }

    async fn record(&self, profile: &ArtisanProfile, embedding: &ArtisanEmbedding) -> Result<()> {
        self.service
            .store_embedding(profile, embedding)
            .await
            .context("Failed to write vector")?;

        self.database
            .record_embedding(&NewLedgerEntry {
                artisan_id: embedding.artisan_id.clone(),
                content_hash: embedding.content_hash.clone(),
                model_version: embedding.model_version.clone(),
                confidence: f64::from(embedding.confidence),
                dimensions: i64::try_from(embedding.composite_vector.len()).unwrap_or(i64::MAX),
                generated_at: embedding.generated_at,
            })
            .await?;
        Ok(())
    }

    #[inline]
    pub async fn validate_consistency(&self) -> Result<ConsistencyReport> {
        ConsistencyValidator::new(
            &self.database,
            self.service.index().as_ref(),
            self.service.index_name(),
        )
        .validate_consistency()
        .await
    }

    /// Removes orphaned vectors and re-indexes artisans whose vector is missing
    #[inline]
    pub async fn cleanup_inconsistencies(&self, report: &ConsistencyReport) -> Result<usize> {
        if report.is_consistent {
            info!("Index is consistent, no cleanup needed");
            return Ok(0);
        }

        let validator = ConsistencyValidator::new(
            &self.database,
            self.service.index().as_ref(),
            self.service.index_name(),
        );

        let removed = validator
            .cleanup_orphaned_vectors(&report.orphaned_in_index)
            .await?;
        validator
            .forget_missing_vectors(&report.missing_in_index)
            .await?;

        let mut missing = Vec::with_capacity(report.missing_in_index.len());
        for artisan_id in &report.missing_in_index {
            match self.database.get_profile(artisan_id).await? {
                Some(profile) => missing.push(profile),
                None => warn!("No stored profile for missing vector {}", artisan_id),
            }
        }
        let reindexed = self.index_profiles(&missing, true, |_| {}).await?;

        info!(
            "Removed {} orphaned vectors and re-indexed {} artisans",
            removed, reindexed.indexed
        );
        Ok(removed + reindexed.indexed)
    }
}
