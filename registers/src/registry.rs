//! Contrats des registres consommés par les pipelines
//!
//! Les clients HTTP de [`crate::client`] les implémentent ; les tests des
//! pipelines les remplacent par des doublures.

use std::future::Future;

use crate::error::Result;
use crate::types::{
    AddressMatch, BuildingRecord, CompanyRecord, CompanySuggestion, FeatureInfoQuery, GeoPoint,
};

/// Registre des bâtiments interrogé via une interface raster (GetFeatureInfo)
pub trait BuildingRegistry {
    /// Panden sous le pixel cliqué, dans l'ordre du registre
    fn feature_info(
        &self,
        query: &FeatureInfoQuery,
    ) -> impl Future<Output = Result<Vec<BuildingRecord>>> + Send;
}

/// Registre des bedrijven
pub trait CompanyRegistry {
    /// Tous les bedrijven dont le `pand_id` vaut `building_id`
    fn companies_in_building(
        &self,
        building_id: &str,
    ) -> impl Future<Output = Result<Vec<CompanyRecord>>> + Send;

    /// Suggestions texte libre (longueur minimale et nombre maximal bornés)
    fn suggest(&self, query: &str)
        -> impl Future<Output = Result<Vec<CompanySuggestion>>> + Send;

    /// Bedrijven dans un rayon (mètres) autour d'un point
    fn within_radius(
        &self,
        center: GeoPoint,
        radius_m: u32,
    ) -> impl Future<Output = Result<Vec<CompanyRecord>>> + Send;

    /// Fiche complète depuis un lien relatif
    fn details(&self, link: &str) -> impl Future<Output = Result<CompanyRecord>> + Send;
}

/// Géocodeur d'adresses
pub trait Geocoder {
    /// Adresses correspondant à une saisie libre (sans coordonnées)
    fn suggest_addresses(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<AddressMatch>>> + Send;

    /// Détail d'une adresse, avec son centroïde
    fn lookup_address(&self, id: &str) -> impl Future<Output = Result<Option<AddressMatch>>> + Send;
}
