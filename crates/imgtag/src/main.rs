//! imgtag CLI - Batch image tagging with a pretrained multi-label classifier.
//!
//! imgtag walks a folder of images, classifies each one against a fixed tag
//! vocabulary, and writes the selected tags to a companion `.txt` file next
//! to the image.
//!
//! # Usage
//!
//! ```bash
//! # Tag a folder of images
//! imgtag tag ./photos/
//!
//! # Adaptive general thresholding, with a prefix tag
//! imgtag tag ./photos/ --general-mcut --prepend masterpiece
//!
//! # View configuration
//! imgtag config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// imgtag - Batch image tagging with a pretrained multi-label classifier.
#[derive(Parser, Debug)]
#[command(name = "imgtag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tag images and write companion tag files
    Tag(cli::tag::TagArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go to eprintln.
    let config = match imgtag_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `imgtag config path`."
            );
            imgtag_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("imgtag v{}", imgtag_core::VERSION);

    match cli.command {
        Commands::Tag(args) => cli::tag::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
