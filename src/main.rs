//! CLI entry point for mf2-export

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mf2-export")]
#[command(version)]
#[command(about = "Export blog posts as microformats2 h-entry JSON", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one microformats2 JSON file per post
    #[command(alias = "e")]
    Export,

    /// List posts with their slugs and output paths
    List,

    /// Delete the JSON output directory
    Clean,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mf2_export=debug,info"
    } else {
        "mf2_export=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    match cli.command {
        Commands::Export => {
            let site = mf2_export::Site::new(&base_dir)?;
            tracing::info!("Exporting posts from {:?}", site.posts_dir);
            let report = site.export()?;
            println!(
                "Exported {} posts to {}",
                report.written,
                site.json_dir.display()
            );
        }

        Commands::List => {
            let site = mf2_export::Site::new(&base_dir)?;
            mf2_export::commands::list::run(&site)?;
        }

        Commands::Clean => {
            let site = mf2_export::Site::new(&base_dir)?;
            tracing::info!("Cleaning {:?}", site.json_dir);
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("mf2-export version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
