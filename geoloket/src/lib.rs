//! # geoloket
//!
//! Viewer BAG/OpenKVK : pand et bedrijven sous un clic, mesures à main
//! levée, recherche par rayon, par nom de bedrijf et par adresse.
//!
//! ## Features
//!
//! - Pipeline de recherche au clic, une seule requête en vol à la fois
//! - Mesure de distance (haversine) et d'aire (approximation planaire)
//! - Carte et affichage abstraits ([`map::MapSurface`], [`present::Presenter`])
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # Pand et bedrijven au Dam
//! geoloket lookup --lat 52.37310 --lon 4.89320
//!
//! # Distance le long d'un tracé
//! geoloket measure 52.3731,4.8932 52.3745,4.8960 52.3760,4.9001
//!
//! # Bedrijven dans un rayon de 250 m
//! geoloket radius --lat 52.3731 --lon 4.8932 --radius 250
//! ```

pub mod config;
pub mod locate;
pub mod lookup;
pub mod map;
pub mod measure;
pub mod present;
pub mod radius;
pub mod viewer;

pub use config::Config;
pub use lookup::{LookupOutcome, LookupPipeline};
pub use measure::{MeasureMode, MeasureState, Measurement, MeasurementEngine};
pub use viewer::{ClickMode, ClickResult, Viewer};
