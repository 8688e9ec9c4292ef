//! Parser des réponses du Locatieserver PDOK (suggest / lookup)

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{decode, text_or_unknown, value_text};
use crate::error::Result;
use crate::types::{AddressMatch, GeoPoint};

/// Nom du service dans les erreurs et les logs
pub const SERVICE: &str = "PDOK Locatieserver";

#[derive(Deserialize)]
struct SolrResponse {
    #[serde(default)]
    response: Option<SolrDocs>,
}

#[derive(Deserialize)]
struct SolrDocs {
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
}

/// Parse une réponse suggest ou lookup en adresses
///
/// Le centroïde n'est présent que dans les réponses lookup.
pub fn parse_docs(body: &str) -> Result<Vec<AddressMatch>> {
    let response: SolrResponse = decode(SERVICE, body)?;
    Ok(response
        .response
        .map(|r| r.docs)
        .unwrap_or_default()
        .iter()
        .map(|doc| AddressMatch {
            id: text_or_unknown(doc.get("id")),
            label: text_or_unknown(doc.get("weergavenaam")),
            point: doc
                .get("centroide_ll")
                .and_then(value_text)
                .and_then(|wkt| parse_wkt_point(&wkt)),
        })
        .collect())
}

/// Parse un point WKT `POINT(lon lat)` en [`GeoPoint`]
pub fn parse_wkt_point(wkt: &str) -> Option<GeoPoint> {
    static POINT: OnceLock<Regex> = OnceLock::new();
    let re = POINT.get_or_init(|| {
        Regex::new(r"^\s*POINT\s*\(\s*(-?[0-9.]+(?:[eE][-+]?[0-9]+)?)\s+(-?[0-9.]+(?:[eE][-+]?[0-9]+)?)\s*\)\s*$")
            .expect("valid WKT point regex")
    });

    let caps = re.captures(wkt)?;
    let lon: f64 = caps[1].parse().ok()?;
    let lat: f64 = caps[2].parse().ok()?;
    Some(GeoPoint::new(lat, lon))
}
