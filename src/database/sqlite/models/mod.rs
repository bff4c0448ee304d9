#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::profile::ArtisanProfile;

/// Stored profile row; the profile itself is kept as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArtisanRecord {
    pub id: String,
    pub name: String,
    pub profile_json: String,
    pub content_hash: String,
    pub imported_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArtisanRecord {
    #[inline]
    pub fn profile(&self) -> serde_json::Result<ArtisanProfile> {
        serde_json::from_str(&self.profile_json)
    }
}

/// Ledger row recording which profile version was last written to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EmbeddingLedgerEntry {
    pub artisan_id: String,
    pub content_hash: String,
    pub model_version: String,
    pub confidence: f64,
    pub dimensions: i64,
    pub generated_at: DateTime<Utc>,
}

impl EmbeddingLedgerEntry {
    /// Whether the indexed vector was produced from this exact profile and model
    #[inline]
    pub fn is_current(&self, content_hash: &str, model_version: &str) -> bool {
        self.content_hash == content_hash && self.model_version == model_version
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub artisan_id: String,
    pub content_hash: String,
    pub model_version: String,
    pub confidence: f64,
    pub dimensions: i64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreStatistics {
    pub artisans: i64,
    pub embedded: i64,
    pub stale: i64,
}
