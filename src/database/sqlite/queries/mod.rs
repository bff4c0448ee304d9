
use super::models::*;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::profile::ArtisanProfile;

pub struct ArtisanQueries;

impl ArtisanQueries {
    /// Inserts or replaces a profile, keeping its original import time
    #[inline]
    pub async fn upsert(pool: &SqlitePool, profile: &ArtisanProfile) -> Result<ArtisanRecord> {
        let now = Utc::now();
        let profile_json =
            serde_json::to_string(profile).context("Failed to serialize artisan profile")?;
        let content_hash = profile.content_hash();

        sqlx::query(
            r#"
            INSERT INTO artisans (id, name, profile_json, content_hash, imported_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                profile_json = excluded.profile_json,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile_json)
        .bind(&content_hash)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to store artisan {}", profile.id))?;

        Self::get_by_id(pool, &profile.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve stored artisan {}", profile.id))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ArtisanRecord>> {
        let record = sqlx::query_as::<_, ArtisanRecord>(
            r#"
            SELECT id, name, profile_json, content_hash, imported_at, updated_at
            FROM artisans WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get artisan by id")?;

        Ok(record)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ArtisanRecord>> {
        let records = sqlx::query_as::<_, ArtisanRecord>(
            r#"
            SELECT id, name, profile_json, content_hash, imported_at, updated_at
            FROM artisans ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list artisans")?;

        Ok(records)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM artisans")
            .fetch_one(pool)
            .await
            .context("Failed to count artisans")
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artisans WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete artisan")?;

        debug!("Deleted artisan {} ({} rows)", id, result.rows_affected());
        Ok(result.rows_affected() > 0)
    }

    /// Profiles with no ledger entry or whose ledger hash no longer matches
    #[inline]
    pub async fn list_stale(pool: &SqlitePool, model_version: &str) -> Result<Vec<ArtisanRecord>> {
        let records = sqlx::query_as::<_, ArtisanRecord>(
            r#"
            SELECT a.id, a.name, a.profile_json, a.content_hash, a.imported_at, a.updated_at
            FROM artisans a
            LEFT JOIN artisan_embeddings e ON e.artisan_id = a.id
            WHERE e.artisan_id IS NULL
               OR e.content_hash != a.content_hash
               OR e.model_version != ?
            ORDER BY a.id ASC
            "#,
        )
        .bind(model_version)
        .fetch_all(pool)
        .await
        .context("Failed to list stale artisans")?;

        Ok(records)
    }
}

pub struct LedgerQueries;

impl LedgerQueries {
    #[inline]
    pub async fn upsert(pool: &SqlitePool, entry: &NewLedgerEntry) -> Result<EmbeddingLedgerEntry> {
        sqlx::query(
            r#"
            INSERT INTO artisan_embeddings
                (artisan_id, content_hash, model_version, confidence, dimensions, generated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(artisan_id) DO UPDATE SET
                content_hash = excluded.content_hash,
                model_version = excluded.model_version,
                confidence = excluded.confidence,
                dimensions = excluded.dimensions,
                generated_at = excluded.generated_at
            "#,
        )
        .bind(&entry.artisan_id)
        .bind(&entry.content_hash)
        .bind(&entry.model_version)
        .bind(entry.confidence)
        .bind(entry.dimensions)
        .bind(entry.generated_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to record embedding for {}", entry.artisan_id))?;

        Self::get(pool, &entry.artisan_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve ledger entry {}", entry.artisan_id))
    }

    #[inline]
    pub async fn get(pool: &SqlitePool, artisan_id: &str) -> Result<Option<EmbeddingLedgerEntry>> {
        let entry = sqlx::query_as::<_, EmbeddingLedgerEntry>(
            r#"
            SELECT artisan_id, content_hash, model_version, confidence, dimensions, generated_at
            FROM artisan_embeddings WHERE artisan_id = ?
            "#,
        )
        .bind(artisan_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get ledger entry")?;

        Ok(entry)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<EmbeddingLedgerEntry>> {
        let entries = sqlx::query_as::<_, EmbeddingLedgerEntry>(
            r#"
            SELECT artisan_id, content_hash, model_version, confidence, dimensions, generated_at
            FROM artisan_embeddings ORDER BY artisan_id ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list ledger entries")?;

        Ok(entries)
    }

    #[inline]
    pub async fn delete(pool: &SqlitePool, artisan_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artisan_embeddings WHERE artisan_id = ?")
            .bind(artisan_id)
            .execute(pool)
            .await
            .context("Failed to delete ledger entry")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM artisan_embeddings")
            .fetch_one(pool)
            .await
            .context("Failed to count ledger entries")
    }
}
