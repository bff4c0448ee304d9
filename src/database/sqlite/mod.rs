use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{
    ArtisanRecord, EmbeddingLedgerEntry, NewLedgerEntry, StoreStatistics,
};
use crate::database::sqlite::queries::{ArtisanQueries, LedgerQueries};
use crate::profile::ArtisanProfile;


pub mod models;
pub mod queries;

pub use models::*;
pub use queries::*;

pub type DbPool = Pool<Sqlite>;

fn decode(record: &ArtisanRecord) -> Result<ArtisanProfile> {
    record
        .profile()
        .with_context(|| format!("Stored profile {} is not valid JSON", record.id))
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_url: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    #[inline]
    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("artisans.db");

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(&db_path).await
    }

    // Profile operations
    #[inline]
    pub async fn store_profile(&self, profile: &ArtisanProfile) -> Result<ArtisanRecord> {
        ArtisanQueries::upsert(&self.pool, profile).await
    }

    #[inline]
    pub async fn get_profile(&self, id: &str) -> Result<Option<ArtisanProfile>> {
        ArtisanQueries::get_by_id(&self.pool, id)
            .await?
            .map(|record| decode(&record))
            .transpose()
    }

    #[inline]
    pub async fn list_profiles(&self) -> Result<Vec<ArtisanProfile>> {
        ArtisanQueries::list_all(&self.pool)
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    #[inline]
    pub async fn list_stale_profiles(&self, model_version: &str) -> Result<Vec<ArtisanProfile>> {
        ArtisanQueries::list_stale(&self.pool, model_version)
            .await?
            .iter()
            .map(decode)
            .collect()
    }

    #[inline]
    pub async fn delete_profile(&self, id: &str) -> Result<bool> {
        ArtisanQueries::delete(&self.pool, id).await
    }

    // Embedding ledger operations
    #[inline]
    pub async fn record_embedding(&self, entry: &NewLedgerEntry) -> Result<EmbeddingLedgerEntry> {
        LedgerQueries::upsert(&self.pool, entry).await
    }

    #[inline]
    pub async fn get_ledger_entry(&self, artisan_id: &str) -> Result<Option<EmbeddingLedgerEntry>> {
        LedgerQueries::get(&self.pool, artisan_id).await
    }

    #[inline]
    pub async fn list_ledger_entries(&self) -> Result<Vec<EmbeddingLedgerEntry>> {
        LedgerQueries::list_all(&self.pool).await
    }

    #[inline]
    pub async fn delete_ledger_entry(&self, artisan_id: &str) -> Result<bool> {
        LedgerQueries::delete(&self.pool, artisan_id).await
    }

    #[inline]
    pub async fn statistics(&self, model_version: &str) -> Result<StoreStatistics> {
        let artisans = ArtisanQueries::count(&self.pool).await?;
        let embedded = LedgerQueries::count(&self.pool).await?;
        let stale = ArtisanQueries::list_stale(&self.pool, model_version)
            .await?
            .len();

        Ok(StoreStatistics {
            artisans,
            embedded,
            stale: i64::try_from(stale).unwrap_or(i64::MAX),
        })
    }

    /// Optimize database performance by running VACUUM and ANALYZE
    #[inline]
    pub async fn optimize(&self) -> Result<()> {
        info!("Optimizing database performance");

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .context("Failed to vacuum database")?;

        sqlx::query("ANALYZE")
            .execute(&self.pool)
            .await
            .context("Failed to analyze database")?;

        debug!("Database optimization completed");
        Ok(())
    }
}
