//! Définition et implémentation des commandes CLI
//!
//! Chaque commande construit une vue en mémoire centrée sur la zone
//! concernée et passe par la même façade [`Viewer`] que la carte.

use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use geoloket::map::Viewport;
use geoloket::measure::MeasureMode;
use geoloket::present::ConsolePresenter;
use geoloket::viewer::{ClickResult, Viewer};
use geoloket::{Config, LookupOutcome};
use registers::{BagClient, CompanyRecord, GeoPoint, KvkClient, LocatieClient};
use tracing::info;

type CliViewer = Viewer<Viewport, ConsolePresenter, BagClient, KvkClient, LocatieClient>;

#[derive(Subcommand)]
pub enum Commands {
    /// Look up the building and its companies at a location
    Lookup {
        /// Latitude (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Measure a distance or an area from a list of points
    Measure {
        /// Measurement type
        #[arg(long, value_enum, default_value_t = MeasureKind::Distance)]
        mode: MeasureKind,

        /// Points as "lat,lon", in drawing order
        #[arg(required = true, value_parser = parse_point, allow_hyphen_values = true)]
        points: Vec<GeoPoint>,
    },

    /// Suggest companies by name or KVK number
    Suggest {
        /// Search text (at least 3 characters)
        query: String,
    },

    /// Locate a company from the suggestions and look up its building
    Locate {
        /// Search text
        query: String,

        /// Index of the suggestion to locate
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// List companies within a radius around a location
    Radius {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Radius in meters
        #[arg(long, short, default_value_t = 500)]
        radius: u32,
    },

    /// Search an address and show its coordinates
    Geocode {
        /// Address text
        query: String,

        /// Look up the building at the first match
        #[arg(long)]
        lookup: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MeasureKind {
    Distance,
    Area,
}

impl From<MeasureKind> for MeasureMode {
    fn from(kind: MeasureKind) -> Self {
        match kind {
            MeasureKind::Distance => MeasureMode::Distance,
            MeasureKind::Area => MeasureMode::Area,
        }
    }
}

/// Parse un point `"lat,lon"`
pub fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{s}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude: {lat}"))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude: {lon}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("coordinates out of range: {lat},{lon}"));
    }
    Ok(GeoPoint::new(lat, lon))
}

fn build_viewer(config: &Config, center: GeoPoint) -> Result<CliViewer> {
    let bag = BagClient::new(config.bag.clone(), &config.http)
        .context("Failed to create BAG WMS client")?;
    let kvk = KvkClient::new(config.kvk.clone(), &config.http)
        .context("Failed to create OpenKVK client")?;
    let locatie = LocatieClient::new(config.locatie.clone(), &config.http)
        .context("Failed to create Locatieserver client")?;

    let view = &config.viewport;
    let map = Viewport::centered(center, view.span_deg, view.width, view.height);
    Ok(Viewer::new(map, ConsolePresenter, bag, kvk, locatie))
}

/// Exécute la commande lookup
pub async fn cmd_lookup(config: &Config, point: GeoPoint) -> Result<()> {
    let viewer = build_viewer(config, point)?;
    match viewer.handle_click(point).await {
        ClickResult::Lookup(LookupOutcome::Failed(message)) => bail!("Lookup failed: {message}"),
        ClickResult::Lookup(outcome) => {
            info!(%point, found = matches!(outcome, LookupOutcome::Found { .. }), "Lookup done");
            Ok(())
        }
        other => bail!("Unexpected click result: {other:?}"),
    }
}

/// Exécute la commande measure
pub fn cmd_measure(config: &Config, mode: MeasureMode, points: &[GeoPoint]) -> Result<()> {
    let center = points.first().copied().unwrap_or(config.viewport.center);
    let viewer = build_viewer(config, center)?;

    viewer.start_measuring(mode);
    let mut last = None;
    for point in points {
        last = viewer.append_measurement_point(*point);
    }

    let measurement = last.context("Measurement did not start")?;
    println!("\n{} ({} points)", measurement.text(), points.len());
    viewer.stop_measuring();
    Ok(())
}

/// Exécute la commande suggest
pub async fn cmd_suggest(config: &Config, query: &str) -> Result<()> {
    let viewer = build_viewer(config, config.viewport.center)?;
    let suggestions = viewer.suggest_companies(query).await;
    for (i, s) in suggestions.iter().enumerate() {
        println!(
            "[{i}] {} | KVK {} | {} | establishment {}",
            s.name, s.kvk_number, s.postcode, s.establishment_number
        );
    }
    Ok(())
}

/// Exécute la commande locate
pub async fn cmd_locate(config: &Config, query: &str, index: usize) -> Result<()> {
    let viewer = build_viewer(config, config.viewport.center)?;
    let suggestions = viewer.suggest_companies(query).await;
    let suggestion = suggestions
        .get(index)
        .with_context(|| format!("No suggestion #{index} for \"{query}\""))?;

    let located = viewer
        .locate_company(suggestion)
        .await
        .with_context(|| format!("Could not locate {}", suggestion.name))?;
    println!(
        "{} (KVK {}) at {} [{:?}]",
        located.company.name, located.company.kvk_number, located.point, located.source
    );

    viewer.lookup_at_point(located.point).await;
    Ok(())
}

/// Exécute la commande radius
pub async fn cmd_radius(config: &Config, center: GeoPoint, radius_m: u32) -> Result<()> {
    let viewer = build_viewer(config, center)?;
    viewer.set_click_mode(geoloket::viewer::ClickMode::PlaceRadiusCenter);
    viewer.handle_click(center).await;

    let companies = viewer
        .search_radius(radius_m)
        .await
        .context("Radius search failed")?;
    print_companies(&companies);
    viewer.reset_radius();
    Ok(())
}

/// Exécute la commande geocode
pub async fn cmd_geocode(config: &Config, query: &str, lookup: bool) -> Result<()> {
    let viewer = build_viewer(config, config.viewport.center)?;
    let matches = viewer.search_addresses(query).await;
    for m in &matches {
        println!("{} [{}]", m.label, m.id);
    }

    let Some(first) = matches.first() else {
        return Ok(());
    };
    let found = viewer
        .select_address(&first.id)
        .await
        .with_context(|| format!("No coordinates for {}", first.label))?;
    let point = found.point.context("Address has no centroid")?;
    println!("{} -> {}", found.label, point);

    if lookup {
        viewer.lookup_at_point(point).await;
    }
    Ok(())
}

fn print_companies(companies: &[CompanyRecord]) {
    for c in companies {
        let location = c
            .location
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} [{}] KVK {} | {} | {}",
            c.name,
            c.status_label(),
            c.kvk_number,
            c.address_label(),
            location
        );
    }
}
