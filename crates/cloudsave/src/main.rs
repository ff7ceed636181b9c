mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use cloudsave::config::DEFAULT_CONFIG_FILE;
use cloudsave::model::PLAYER_RECORD_KEY;

// ============================================================================
// CLI Types
// ============================================================================

/// Cloudsave - save player records and files for an anonymously signed-in player
#[derive(Parser, Debug)]
#[command(version = cloudsave::build_info::VERSION, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and print the player id
    Whoami,

    /// Save the built-in sample record (player_name, level, xp, gold)
    SaveSample,

    /// Save KEY=VALUE pairs in one request (VALUE is JSON, or a plain string)
    Save {
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// Load and print keys (defaults to player_name, level, xp)
    Load {
        #[arg(value_name = "KEY")]
        keys: Vec<String>,
    },

    /// Save a player record read from a JSON file
    SavePlayer {
        /// JSON file holding the player record
        #[arg(short, long)]
        file: PathBuf,

        /// Record key to save under
        #[arg(short, long, default_value = PLAYER_RECORD_KEY)]
        key: String,
    },

    /// Load a player record and print it as JSON
    LoadPlayer {
        /// Record key to load
        #[arg(short, long, default_value = PLAYER_RECORD_KEY)]
        key: String,
    },

    /// Upload a file as a blob
    Upload {
        /// File to upload
        path: PathBuf,

        /// Blob key (defaults to the file name)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// List stored blob keys
    List,

    /// Download a blob to a file
    Download {
        /// Blob key
        key: String,

        /// Output path (defaults to the key's file name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    debug!(version = %cloudsave::build_info::version_string(), "Starting");

    let config = cli.config.as_str();
    match cli.command {
        Commands::Whoami => commands::whoami(config).await,
        Commands::SaveSample => commands::records::save_sample(config).await,
        Commands::Save { assignments } => commands::records::save(config, &assignments).await,
        Commands::Load { keys } => commands::records::load(config, &keys).await,
        Commands::SavePlayer { file, key } => {
            commands::records::save_player(config, &key, &file).await
        }
        Commands::LoadPlayer { key } => commands::records::load_player(config, &key).await,
        Commands::Upload { path, key } => {
            commands::blobs::upload(config, &path, key.as_deref()).await
        }
        Commands::List => commands::blobs::list(config).await,
        Commands::Download { key, out } => {
            commands::blobs::download(config, &key, out.as_deref()).await
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
