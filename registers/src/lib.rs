//! # registers
//!
//! Clients des registres ouverts néerlandais utilisés par le viewer :
//! BAG (panden, via le WMS PDOK), OpenKVK (bedrijven, via overheid.io)
//! et le Locatieserver PDOK (géocodage).
//!
//! ## Features
//!
//! - Types explicites par forme de réponse, valeurs par défaut remplies au parsing
//! - Détection des pages HTML renvoyées à la place du JSON
//! - Clients `reqwest` asynchrones avec retry sur erreurs transitoires
//! - Traits [`BuildingRegistry`], [`CompanyRegistry`], [`Geocoder`] pour
//!   brancher des doublures dans les tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use registers::{CompanyRegistry, HttpConfig, KvkClient, KvkConfig};
//!
//! let client = KvkClient::new(KvkConfig::default(), &HttpConfig::default())?;
//! for company in client.companies_in_building("0363100012345678").await? {
//!     println!("{} ({})", company.name, company.kvk_number);
//! }
//! ```

pub mod client;
pub mod error;
pub mod parser;
pub mod registry;
pub mod types;

pub use client::{BagClient, BagConfig, HttpConfig, KvkClient, KvkConfig, LocatieClient, LocatieConfig};
pub use error::{ErrorKind, RegistryError};
pub use registry::{BuildingRegistry, CompanyRegistry, Geocoder};
pub use types::{
    Activity, Address, AddressMatch, Bounds, BuildingRecord, CompanyRecord, CompanySuggestion,
    FeatureInfoQuery, GeoPoint, UNKNOWN,
};
