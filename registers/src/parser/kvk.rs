//! Parser des réponses OpenKVK (overheid.io)
//!
//! Quatre formes de réponse :
//! - liste filtrée par `pand_id` (`_embedded.bedrijf[]`, fiches abrégées)
//! - fiche complète d'un bedrijf
//! - suggestions (tableau de résultats légers)
//! - recherche par rayon (FeatureCollection GeoJSON)

use geojson::FeatureCollection;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{decode, text_or_unknown, value_f64, value_text};
use crate::error::Result;
use crate::types::{Activity, Address, CompanyRecord, CompanySuggestion, GeoPoint, UNKNOWN};

/// Nom du service dans les erreurs et les logs
pub const SERVICE: &str = "OpenKVK";

/// Fiche abrégée renvoyée par le filtre `pand_id`
#[derive(Debug, Clone)]
pub struct CompanyStub {
    /// Données brutes de la fiche abrégée
    pub raw: Map<String, Value>,
    /// Lien relatif vers la fiche complète
    pub link: Option<String>,
}

impl CompanyStub {
    /// Bedrijf construit depuis les seules données abrégées
    pub fn to_record(&self) -> CompanyRecord {
        company_from_map(&self.raw)
    }
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default, rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Deserialize)]
struct Embedded {
    #[serde(default)]
    bedrijf: Vec<Map<String, Value>>,
}

/// Parse la liste des bedrijven d'un pand
pub fn parse_company_list(body: &str) -> Result<Vec<CompanyStub>> {
    let response: ListResponse = decode(SERVICE, body)?;
    let stubs = response
        .embedded
        .map(|e| e.bedrijf)
        .unwrap_or_default()
        .into_iter()
        .map(|raw| CompanyStub {
            link: self_link(&raw),
            raw,
        })
        .collect();
    Ok(stubs)
}

/// Parse une fiche complète
pub fn parse_company(body: &str) -> Result<CompanyRecord> {
    let raw: Map<String, Value> = decode(SERVICE, body)?;
    Ok(company_from_map(&raw))
}

/// Parse les suggestions, limitées à `max_results`
///
/// Un corps JSON qui n'est pas une liste (objet d'erreur de l'API) vaut
/// « aucune suggestion ».
pub fn parse_suggestions(body: &str, max_results: usize) -> Result<Vec<CompanySuggestion>> {
    let Value::Array(items) = decode::<Value>(SERVICE, body)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .take(max_results)
        .map(|item| CompanySuggestion {
            kvk_number: text_or_unknown(item.get("kvknummer")),
            name: text_or_unknown(item.get("naam")),
            postcode: text_or_unknown(item.get("postcode")),
            establishment_number: text_or_unknown(item.get("vestigingsnummer")),
            link: item.get("link").and_then(value_text),
        })
        .collect())
}

/// Parse le résultat d'une recherche par rayon
///
/// La position de chaque bedrijf vient de la géométrie du point, à défaut
/// du champ `locatie`.
pub fn parse_radius(body: &str) -> Result<Vec<CompanyRecord>> {
    let collection: FeatureCollection = decode(SERVICE, body)?;
    let empty = Map::new();

    Ok(collection
        .features
        .iter()
        .map(|feature| {
            let mut company = company_from_map(feature.properties.as_ref().unwrap_or(&empty));
            if let Some(point) = feature.geometry.as_ref().and_then(|g| point_of(&g.value)) {
                company.location = Some(point);
            }
            company
        })
        .collect())
}

/// Construit un bedrijf en remplaçant chaque champ absent par [`UNKNOWN`]
pub fn company_from_map(raw: &Map<String, Value>) -> CompanyRecord {
    let trade_names = string_list(raw.get("huidigeHandelsNamen"));

    let name = raw
        .get("naam")
        .and_then(value_text)
        .or_else(|| trade_names.first().cloned())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let legal_form = raw
        .get("rechtsvormOmschrijving")
        .and_then(value_text)
        .or_else(|| raw.get("rechtsvormCode").and_then(value_text))
        .unwrap_or_else(|| UNKNOWN.to_string());

    // Seul un `false` explicite rend le bedrijf inactif
    let active = !matches!(raw.get("actief"), Some(Value::Bool(false)));

    CompanyRecord {
        name,
        kvk_number: text_or_unknown(raw.get("kvknummer").or_else(|| raw.get("kvkNummer"))),
        establishment_number: text_or_unknown(raw.get("vestigingsnummer")),
        legal_form,
        activity: text_or_unknown(raw.get("activiteitomschrijving")),
        active,
        registration_type: text_or_unknown(raw.get("inschrijvingstype")),
        address: raw.get("bezoeklocatie").and_then(address_of),
        location: raw.get("locatie").and_then(location_of),
        trade_names,
        activities: activities_of(raw.get("activiteiten")),
        sbi_codes: string_list(raw.get("sbi")),
        building_id: raw.get("pand_id").and_then(value_text),
        detail_link: self_link(raw),
    }
}

fn self_link(raw: &Map<String, Value>) -> Option<String> {
    raw.get("_links")
        .and_then(|l| l.get("self"))
        .and_then(|s| s.get("href"))
        .and_then(value_text)
}

fn address_of(value: &Value) -> Option<Address> {
    let obj = value.as_object()?;
    Some(Address {
        street: text_or_unknown(obj.get("straat")),
        house_number: text_or_unknown(obj.get("huisnummer")),
        postcode: text_or_unknown(obj.get("postcode")),
        city: text_or_unknown(obj.get("plaats")),
    })
}

fn location_of(value: &Value) -> Option<GeoPoint> {
    let lat = value.get("lat").and_then(value_f64)?;
    let lon = value.get("lon").and_then(value_f64)?;
    Some(GeoPoint::new(lat, lon))
}

fn point_of(value: &geojson::Value) -> Option<GeoPoint> {
    match value {
        geojson::Value::Point(coords) if coords.len() >= 2 => {
            Some(GeoPoint::new(coords[1], coords[0]))
        }
        _ => None,
    }
}

fn activities_of(value: Option<&Value>) -> Vec<Activity> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            Some(Activity {
                code: text_or_unknown(obj.get("code").or_else(|| obj.get("sbiCode"))),
                description: text_or_unknown(
                    obj.get("omschrijving")
                        .or_else(|| obj.get("sbiOmschrijving")),
                ),
                main: match obj.get("hoofdactiviteit") {
                    Some(Value::Bool(b)) => *b,
                    Some(Value::String(s)) => s == "true" || s.eq_ignore_ascii_case("ja"),
                    _ => false,
                },
            })
        })
        .collect()
}

/// Liste de chaînes ; les objets sont réduits à leur description ou code
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => obj
                .get("omschrijving")
                .or_else(|| obj.get("naam"))
                .or_else(|| obj.get("code"))
                .and_then(value_text),
            other => value_text(other),
        })
        .collect()
}
