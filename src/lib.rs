use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding provider error ({provider}): {message}")]
    EmbeddingProvider { provider: String, message: String },

    #[error("Embedding provider misconfigured: {0}")]
    ProviderMisconfigured(String),

    #[error("No stored vector for artisan: {artisan_id}")]
    VectorNotFound { artisan_id: String },

    #[error("Invalid embedding for artisan {artisan_id}: {reason}")]
    InvalidEmbedding { artisan_id: String, reason: String },

    #[error("Timed out after {elapsed:?}: {operation}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod cache;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod enrichment;
pub mod fusion;
pub mod indexer;
pub mod profile;
pub mod query;
pub mod search;
pub mod service;
pub mod vector;
