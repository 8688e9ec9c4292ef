//! Parser des réponses GetFeatureInfo du WMS BAG (couche `pand`)

use geo::Geometry;
use geojson::{Feature, FeatureCollection};
use serde_json::{Map, Value};

use super::{decode, value_f64, value_text};
use crate::error::Result;
use crate::types::BuildingRecord;

/// Nom du service dans les erreurs et les logs
pub const SERVICE: &str = "BAG WMS";

/// Champs BAG connus, dans l'ordre d'affichage, avec leur libellé
const FIELD_LABELS: &[(&str, &str)] = &[
    ("aantal_verblijfsobjecten", "Number of units"),
    ("bouwjaar", "Construction year"),
    ("oorspronkelijkbouwjaar", "Original construction year"),
    ("gebruiksdoel", "Usage"),
    ("identificatie", "Identification"),
    ("pandidentificatie", "Building ID"),
    ("oppervlakte_max", "Max. surface (m²)"),
    ("oppervlakte_min", "Min. surface (m²)"),
    ("oppervlakte", "Surface (m²)"),
    ("rdf_seealso", "BAG link"),
    ("status", "Status"),
    ("pandstatus", "Building status"),
    ("voorkomenidentificatie", "Occurrence ID"),
    ("documentdatum", "Document date"),
    ("functie", "Function"),
];

/// Parse une réponse GetFeatureInfo en liste de panden
///
/// L'ordre du registre est conservé : le premier élément est le pand
/// retenu pour le clic.
pub fn parse_feature_info(body: &str) -> Result<Vec<BuildingRecord>> {
    let collection: FeatureCollection = decode(SERVICE, body)?;
    Ok(collection.features.iter().map(building_from_feature).collect())
}

/// Construit un pand depuis une feature GeoJSON
pub fn building_from_feature(feature: &Feature) -> BuildingRecord {
    let empty = Map::new();
    let props = feature.properties.as_ref().unwrap_or(&empty);

    let id = first_text(props, &["identificatie", "pandidentificatie"]);
    let construction_year = first_value(props, &["bouwjaar", "oorspronkelijkbouwjaar"])
        .and_then(value_f64)
        .map(|y| y as i32);
    let usage = props.get("gebruiksdoel").and_then(value_text);
    let surface_area = first_value(props, &["oppervlakte_max", "oppervlakte"]).and_then(value_f64);

    let geometry = feature
        .geometry
        .as_ref()
        .and_then(|g| Geometry::<f64>::try_from(g.value.clone()).ok());

    let label = match &id {
        Some(id) => format!("Building {id}"),
        None => "Building without identification".to_string(),
    };

    BuildingRecord {
        id,
        construction_year,
        usage,
        surface_area,
        geometry,
        label,
        attributes: attributes(props),
    }
}

/// Attributs affichables : champs connus d'abord, puis le reste par nom
fn attributes(props: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();

    for (key, label) in FIELD_LABELS {
        if let Some(value) = props.get(*key).and_then(value_text) {
            out.push((label.to_string(), value));
        }
    }

    for (key, value) in props {
        if FIELD_LABELS.iter().any(|(k, _)| k == key) {
            continue;
        }
        if let Some(value) = value_text(value) {
            out.push((key.clone(), value));
        }
    }

    out
}

fn first_value<'a>(props: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| props.get(*k))
        .find(|v| value_text(v).is_some())
}

fn first_text(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_value(props, keys).and_then(value_text)
}
