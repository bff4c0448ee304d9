use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::sqlite::Database;
use crate::embeddings::build_provider;
use crate::indexer::ArtisanIndexer;
use crate::profile::{ArtisanProfile, ExperienceLevel};
use crate::search::{
    Interaction, InteractionKind, SearchFilters, SearchOptions, SearchResponse,
    SimilaritySearchResult,
};
use crate::service::MatchService;

/// Arguments of the `search` command
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub threshold: Option<f32>,
    pub verified: bool,
    pub min_rating: Option<f32>,
    pub levels: Vec<ExperienceLevel>,
    pub hybrid: bool,
    pub explain: bool,
    pub json: bool,
}

impl SearchRequest {
    fn filters(&self) -> SearchFilters {
        SearchFilters {
            experience_levels: self.levels.clone(),
            min_rating: self.min_rating,
            verified_only: self.verified,
            artisan_ids: Vec::new(),
        }
    }

    fn options(&self) -> SearchOptions {
        SearchOptions {
            explain: self.explain,
            // Leave the configured default alone unless the flag is given
            hybrid: self.hybrid.then_some(true),
            ..SearchOptions::default()
        }
    }
}

/// One line of a recommendation history file; `weight` defaults by kind
#[derive(Debug, Deserialize)]
struct InteractionRecord {
    artisan_id: String,
    kind: InteractionKind,
    weight: Option<f32>,
}

impl From<InteractionRecord> for Interaction {
    fn from(record: InteractionRecord) -> Self {
        let mut interaction = Interaction::new(record.artisan_id, record.kind);
        if let Some(weight) = record.weight {
            interaction.weight = weight;
        }
        interaction
    }
}

async fn open_service(config: &Config) -> Result<Arc<MatchService>> {
    let service = MatchService::from_config(config)
        .await
        .context("Failed to initialize matching service")?;
    Ok(Arc::new(service))
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(config.get_base_dir())
        .await
        .context("Failed to initialize database")
}

/// Reads a JSON array of profiles and stores them locally
#[inline]
pub async fn import_profiles(path: &Path) -> Result<Vec<ArtisanProfile>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let profiles: Vec<ArtisanProfile> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of artisan profiles", path.display()))?;

    let config = Config::load_default()?;
    let database = open_database(&config).await?;

    let mut stored = 0;
    for profile in &profiles {
        if profile.id.trim().is_empty() {
            warn!("Skipping profile without an id ({})", profile.name);
            continue;
        }
        database
            .store_profile(profile)
            .await
            .with_context(|| format!("Failed to store profile {}", profile.id))?;
        stored += 1;
    }

    info!("Imported {} profiles from {}", stored, path.display());
    println!("Imported {} of {} profiles", stored, profiles.len());
    Ok(profiles)
}

/// Embeds and indexes the stored profiles that changed since the last run
#[inline]
pub async fn index_profiles(force: bool) -> Result<()> {
    let config = Config::load_default()?;
    let service = open_service(&config).await?;
    let database = open_database(&config).await?;
    let total = database.list_profiles().await?.len();

    if total == 0 {
        println!("No profiles have been imported yet.");
        println!("Use 'artisan-match import <file.json>' to add some.");
        return Ok(());
    }

    let indexer = ArtisanIndexer::new(Arc::clone(&service), database)
        .with_batch_size(config.provider.batch_size as usize);

    let bar = if console::user_attended_stderr() {
        ProgressBar::new(total as u64).with_style(
            ProgressStyle::with_template("{bar:40} [{pos}/{len}] Indexing artisans {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        )
    } else {
        ProgressBar::hidden()
    };

    let stats = indexer
        .index_all(force, |stats| {
            bar.set_position(stats.processed() as u64);
            if stats.failed > 0 {
                bar.set_message(format!("({} failed)", stats.failed));
            }
        })
        .await?;
    bar.finish_and_clear();

    println!("Indexing complete!");
    println!("  Indexed: {}", stats.indexed);
    println!("  Unchanged: {}", stats.skipped);
    println!("  Failed: {}", stats.failed);
    Ok(())
}

/// Runs a free-text search and prints the matches
#[inline]
pub async fn search_artisans(request: &SearchRequest) -> Result<()> {
    let config = Config::load_default()?;
    let service = open_service(&config).await?;

    let found = service
        .search_text(
            &request.query,
            request.top_k,
            request.threshold,
            &request.filters(),
            &request.options(),
        )
        .await?;

    if request.json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    println!(
        "Query: \"{}\" ({} query, confidence {:.2})",
        found.query.cleaned, found.query.query_type, found.query.confidence
    );
    if found.query.expanded != found.query.cleaned {
        println!("Expanded: {}", found.query.expanded);
    }
    println!();
    print_response(&found.response);
    Ok(())
}

#[inline]
pub async fn similar_artisans(artisan_id: &str, top_k: Option<usize>, json: bool) -> Result<()> {
    let config = Config::load_default()?;
    let service = open_service(&config).await?;

    let response = service
        .find_similar_artisans(
            artisan_id,
            top_k,
            &SearchFilters::default(),
            &SearchOptions::default(),
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("Artisans similar to {artisan_id}:");
        println!();
        print_response(&response);
    }
    Ok(())
}

/// Recommends artisans from a JSON interaction history
#[inline]
pub async fn recommend_artisans(history: &Path, top_k: Option<usize>, json: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(history)
        .await
        .with_context(|| format!("Failed to read {}", history.display()))?;
    let records: Vec<InteractionRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of interactions", history.display()))?;
    let interactions: Vec<Interaction> = records.into_iter().map(Interaction::from).collect();

    let config = Config::load_default()?;
    let service = open_service(&config).await?;

    let response = service
        .get_recommendations(
            &interactions,
            top_k,
            &SearchFilters::default(),
            &SearchOptions::default(),
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!(
            "Recommendations from {} interactions:",
            interactions.len()
        );
        println!();
        print_response(&response);
    }
    Ok(())
}

fn print_response(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("No matching artisans found.");
        return;
    }

    for result in &response.results {
        print_result(result);
    }

    let metrics = &response.metrics;
    println!(
        "{} results in {}ms{}{}",
        metrics.returned,
        metrics.latency.as_millis(),
        if metrics.cache_hit { " (cached)" } else { "" },
        if metrics.hybrid { " (hybrid ranking)" } else { "" }
    );
}

fn print_result(result: &SimilaritySearchResult) {
    let name = result
        .metadata
        .as_ref()
        .map_or(result.artisan_id.as_str(), |m| m.name.as_str());
    println!(
        "{:>3}. {} ({}) similarity {:.3}",
        result.rank, name, result.artisan_id, result.similarity
    );

    if let Some(metadata) = &result.metadata {
        let mut details = Vec::new();
        if let Some(profession) = &metadata.profession {
            details.push(profession.clone());
        }
        if let Some(level) = metadata.experience_level {
            details.push(level.to_string());
        }
        if let Some(rating) = metadata.rating {
            details.push(format!("{rating:.1}★"));
        }
        if metadata.verified {
            details.push("verified".to_string());
        }
        if !details.is_empty() {
            println!("     {}", details.join(" · "));
        }
    }

    if let Some(explanation) = &result.explanation {
        println!(
            "     {} confidence: {}",
            explanation.level,
            explanation.reasons.join("; ")
        );
    }
}

/// Show the health of every component
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load_default().unwrap_or_default();

    println!("📊 Artisan Match Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Database Status:");
    let database = match open_database(&config).await {
        Ok(db) => {
            println!("   ✅ SQLite: Connected");
            Some(db)
        }
        Err(e) => {
            println!("   ❌ SQLite: Failed to connect - {e:#}");
            None
        }
    };

    println!("🤖 Embedding Provider Status:");
    let model_version = match build_provider(&config.provider).await {
        Ok(provider) => {
            let version = crate::embeddings::model_version(provider.as_ref());
            println!("   ✅ Provider: {} ({})", provider.name(), version);
            println!("   🔢 Dimensions: {}", provider.dimension());
            if provider.name() != config.provider.kind.to_string() {
                println!("   ⚠️  Configured {} provider was unavailable", config.provider.kind);
            }
            Some(version)
        }
        Err(e) => {
            println!("   ❌ Provider: {e}");
            None
        }
    };

    println!("🔍 Vector Index Status:");
    let service = match MatchService::from_config(&config).await {
        Ok(service) => {
            match service.index().count(service.index_name()).await {
                Ok(count) => println!(
                    "   ✅ Index {}: {} vectors ({:?} backend)",
                    service.index_name(),
                    count,
                    config.index.backend
                ),
                Err(e) => println!("   ⚠️  Index {}: {}", service.index_name(), e),
            }
            Some(Arc::new(service))
        }
        Err(e) => {
            println!("   ❌ Index: Failed to open - {e}");
            None
        }
    };

    if let (Some(database), Some(version)) = (database, model_version) {
        println!();
        println!("📚 Profiles:");
        match database.statistics(&version).await {
            Ok(stats) => {
                println!("   Imported: {}", stats.artisans);
                println!("   Indexed: {}", stats.embedded);
                println!("   Needing (re)index: {}", stats.stale);
            }
            Err(e) => println!("   ❌ Statistics unavailable - {e:#}"),
        }

        if let Some(service) = service {
            println!();
            println!("🧮 Consistency:");
            let indexer = ArtisanIndexer::new(service, database);
            match indexer.validate_consistency().await {
                Ok(report) => println!("   {}", report.summary()),
                Err(e) => println!("   ❌ Validation failed - {e:#}"),
            }
        }
    }

    Ok(())
}
