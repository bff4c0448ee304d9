use std::path::PathBuf;

use anyhow::Result;
use artisan_match::commands::{
    SearchRequest, import_profiles, index_profiles, recommend_artisans, search_artisans,
    show_status, similar_artisans,
};
use artisan_match::config::{run_interactive_config, show_config};
use artisan_match::profile::ExperienceLevel;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "artisan-match")]
#[command(about = "Semantic matching of buyers to artisans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding provider, caches and search
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Import artisan profiles from a JSON file and index them
    Import {
        /// Path to a JSON array of profiles
        file: PathBuf,
        /// Store the profiles without indexing them
        #[arg(long)]
        no_index: bool,
    },
    /// Embed and index stored profiles that changed
    Index {
        /// Re-index every profile even if unchanged
        #[arg(long)]
        force: bool,
    },
    /// Search artisans with a free-text query
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Minimum raw similarity
        #[arg(long)]
        threshold: Option<f32>,
        /// Only verified artisans
        #[arg(long)]
        verified: bool,
        #[arg(long)]
        min_rating: Option<f32>,
        /// Experience levels to keep; repeat for several
        #[arg(long = "level")]
        levels: Vec<ExperienceLevel>,
        /// Boost verified and highly rated artisans
        #[arg(long)]
        hybrid: bool,
        /// Explain each match
        #[arg(long)]
        explain: bool,
        #[arg(long)]
        json: bool,
    },
    /// Find artisans similar to an indexed artisan
    Similar {
        artisan_id: String,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Recommend artisans from a JSON interaction history
    Recommend {
        history: PathBuf,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show status of the provider, stores and index
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Import { file, no_index } => {
            import_profiles(&file).await?;
            if !no_index {
                index_profiles(false).await?;
            }
        }
        Commands::Index { force } => {
            index_profiles(force).await?;
        }
        Commands::Search {
            query,
            top_k,
            threshold,
            verified,
            min_rating,
            levels,
            hybrid,
            explain,
            json,
        } => {
            let request = SearchRequest {
                query,
                top_k,
                threshold,
                verified,
                min_rating,
                levels,
                hybrid,
                explain,
                json,
            };
            search_artisans(&request).await?;
        }
        Commands::Similar {
            artisan_id,
            top_k,
            json,
        } => {
            similar_artisans(&artisan_id, top_k, json).await?;
        }
        Commands::Recommend {
            history,
            top_k,
            json,
        } => {
            recommend_artisans(&history, top_k, json).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
