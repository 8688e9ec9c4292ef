//! Types de données pour le crate registers

use std::fmt;

use geo::{Coord, Geometry, Point};
use serde::{Deserialize, Serialize};

/// Valeur affichée quand un registre omet un champ
pub const UNKNOWN: &str = "Unknown";

/// Point géographique WGS84 (degrés)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude en degrés
    pub lat: f64,
    /// Longitude en degrés
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convertit en point `geo` (x = longitude, y = latitude)
    pub fn to_point(self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

impl From<Coord> for GeoPoint {
    fn from(c: Coord) -> Self {
        Self { lat: c.y, lon: c.x }
    }
}

impl From<GeoPoint> for Coord {
    fn from(p: GeoPoint) -> Self {
        Coord { x: p.lon, y: p.lat }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// Emprise géographique WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Emprise centrée sur un point, avec une demi-étendue en degrés
    pub fn around(center: GeoPoint, half_lat: f64, half_lon: f64) -> Self {
        Self::new(
            center.lat - half_lat,
            center.lon - half_lon,
            center.lat + half_lat,
            center.lon + half_lon,
        )
    }

    /// Emprise minimale contenant tous les points (None si vide)
    pub fn from_points<I: IntoIterator<Item = GeoPoint>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first.lat, first.lon, first.lat, first.lon);
        for p in iter {
            bounds.south = bounds.south.min(p.lat);
            bounds.north = bounds.north.max(p.lat);
            bounds.west = bounds.west.min(p.lon);
            bounds.east = bounds.east.max(p.lon);
        }
        Some(bounds)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }

    /// BBOX WMS 1.3.0 en EPSG:4326 (ordre des axes lat/lon)
    pub fn to_wms_bbox(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

/// Requête GetFeatureInfo : emprise de la vue, taille en pixels, pixel cliqué
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureInfoQuery {
    pub bounds: Bounds,
    pub width: u32,
    pub height: u32,
    /// Colonne du pixel cliqué
    pub i: u32,
    /// Ligne du pixel cliqué
    pub j: u32,
}

/// Pand BAG trouvé à un point
#[derive(Debug, Clone)]
pub struct BuildingRecord {
    /// Identifiant du pand (clé vers les bedrijven OpenKVK)
    pub id: Option<String>,

    /// Année de construction
    pub construction_year: Option<i32>,

    /// Gebruiksdoel
    pub usage: Option<String>,

    /// Surface en m²
    pub surface_area: Option<f64>,

    /// Emprise du bâtiment si le registre la fournit
    pub geometry: Option<Geometry>,

    /// Libellé d'affichage
    pub label: String,

    /// Attributs affichables (libellé, valeur), ordre d'affichage
    pub attributes: Vec<(String, String)>,
}

/// Adresse de visite d'un bedrijf
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub postcode: String,
    pub city: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            self.street, self.house_number, self.postcode, self.city
        )
    }
}

/// Activité SBI d'un bedrijf
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub code: String,
    pub description: String,
    /// Activité principale
    pub main: bool,
}

/// Bedrijf inscrit au registre OpenKVK
#[derive(Debug, Clone, Serialize)]
pub struct CompanyRecord {
    pub name: String,
    pub kvk_number: String,
    pub establishment_number: String,
    pub legal_form: String,
    pub activity: String,
    pub active: bool,
    pub registration_type: String,
    pub address: Option<Address>,
    pub location: Option<GeoPoint>,
    pub trade_names: Vec<String>,
    pub activities: Vec<Activity>,
    pub sbi_codes: Vec<String>,
    /// Pand auquel le bedrijf est rattaché
    pub building_id: Option<String>,
    /// Lien relatif vers la fiche complète
    pub detail_link: Option<String>,
}

impl CompanyRecord {
    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Inactive"
        }
    }

    pub fn address_label(&self) -> String {
        match &self.address {
            Some(address) => address.to_string(),
            None => UNKNOWN.to_string(),
        }
    }
}

/// Résultat léger de l'API suggest OpenKVK
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySuggestion {
    pub kvk_number: String,
    pub name: String,
    pub postcode: String,
    pub establishment_number: String,
    /// Lien relatif vers la fiche complète
    pub link: Option<String>,
}

/// Adresse trouvée par le Locatieserver PDOK
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressMatch {
    pub id: String,
    pub label: String,
    /// Centroïde, présent uniquement après un lookup
    pub point: Option<GeoPoint>,
}
