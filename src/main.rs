// src/main.rs

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use terark_get::catalog::DEFAULT_CATALOG_ROOT;
use terark_get::prompt::ConsolePrompter;
use terark_get::session::{self, InstallOptions};
use tracing::info;

#[derive(Parser)]
#[command(name = "terark-get")]
#[command(author, version, about = "Interactive online installer for prebuilt TerarkDB packages", long_about = None)]
struct Cli {
    /// Release catalog root URL
    #[arg(long, default_value = DEFAULT_CATALOG_ROOT)]
    catalog_url: String,

    /// Release version to install (skips the version prompt)
    #[arg(long)]
    release: Option<String>,

    /// Install path (skips the install path prompt)
    #[arg(long)]
    install_path: Option<PathBuf>,

    /// Replace an existing installation without asking
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let options = InstallOptions {
        catalog_url: cli.catalog_url,
        release: cli.release,
        install_path: cli.install_path,
        force: cli.force,
    };

    let mut prompter = ConsolePrompter::new();
    match session::run(&options, &mut prompter)? {
        Some(target) => {
            info!("installation finished at {}", target.display());
            println!("Finished installation");
            Ok(())
        }
        None => {
            println!("Installation aborted, nothing was changed.");
            Ok(())
        }
    }
}
