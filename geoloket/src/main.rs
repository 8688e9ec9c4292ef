//! Point d'entrée CLI pour geoloket

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use geoloket::Config;
use registers::GeoPoint;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Bâtiments BAG, bedrijven OpenKVK et mesures depuis la ligne de commande
#[derive(Parser)]
#[command(name = "geoloket")]
#[command(author, version)]
#[command(about = "Look up BAG buildings and OpenKVK companies, measure distances and areas")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Fichier de configuration JSON (les variables d'environnement priment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = Config::resolve(cli.config.as_deref())?;
    debug!(bag = %config.bag.url, kvk = %config.kvk.base_url, "Configuration loaded");

    match cli.command {
        Commands::Lookup { lat, lon } => {
            cli::cmd_lookup(&config, GeoPoint::new(lat, lon)).await?;
        }
        Commands::Measure { mode, points } => {
            cli::cmd_measure(&config, mode.into(), &points)?;
        }
        Commands::Suggest { query } => {
            cli::cmd_suggest(&config, &query).await?;
        }
        Commands::Locate { query, index } => {
            cli::cmd_locate(&config, &query, index).await?;
        }
        Commands::Radius { lat, lon, radius } => {
            cli::cmd_radius(&config, GeoPoint::new(lat, lon), radius).await?;
        }
        Commands::Geocode { query, lookup } => {
            cli::cmd_geocode(&config, &query, lookup).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
