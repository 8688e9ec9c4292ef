//! Recherche de bedrijven par nom et d'adresses, jusqu'à une position

use registers::{
    AddressMatch, CompanyRecord, CompanyRegistry, CompanySuggestion, GeoPoint, Geocoder,
    RegistryError, UNKNOWN,
};
use tracing::{debug, info};

/// Origine de la position d'un bedrijf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Coordonnées inscrites au registre
    Registered,
    /// Adresse de visite géocodée
    Geocoded,
}

/// Bedrijf positionné sur la carte
#[derive(Debug, Clone)]
pub struct LocatedCompany {
    pub company: CompanyRecord,
    pub point: GeoPoint,
    pub source: LocationSource,
}

/// Suggestions de bedrijven pour une saisie libre
pub async fn suggest_companies<R: CompanyRegistry>(
    registry: &R,
    query: &str,
) -> Result<Vec<CompanySuggestion>, RegistryError> {
    registry.suggest(query).await
}

/// Fiche complète d'une suggestion et sa position
///
/// Sans coordonnées au registre, l'adresse de visite est géocodée.
/// `None` quand aucune position n'a pu être déterminée.
pub async fn locate_company<R, G>(
    registry: &R,
    geocoder: &G,
    suggestion: &CompanySuggestion,
) -> Result<Option<LocatedCompany>, RegistryError>
where
    R: CompanyRegistry,
    G: Geocoder,
{
    let link = suggestion
        .link
        .as_deref()
        .ok_or_else(|| RegistryError::rejected("This company has no detail record"))?;
    let company = registry.details(link).await?;

    if let Some(point) = company.location {
        return Ok(Some(LocatedCompany {
            company,
            point,
            source: LocationSource::Registered,
        }));
    }

    let Some(query) = geocode_query(&company) else {
        debug!(kvk = %company.kvk_number, "No location nor usable address");
        return Ok(None);
    };

    let Some(first) = geocoder.suggest_addresses(&query).await?.into_iter().next() else {
        info!(query = %query, "Visiting address not found by geocoder");
        return Ok(None);
    };

    let point = match first.point {
        Some(point) => Some(point),
        None => geocoder.lookup_address(&first.id).await?.and_then(|m| m.point),
    };

    Ok(point.map(|point| LocatedCompany {
        company,
        point,
        source: LocationSource::Geocoded,
    }))
}

/// Saisie géocodable `"straat nr, plaats"` ; None sans rue ni ville
pub fn geocode_query(company: &CompanyRecord) -> Option<String> {
    let address = company.address.as_ref()?;
    if address.street == UNKNOWN || address.city == UNKNOWN {
        return None;
    }
    let number = if address.house_number == UNKNOWN {
        ""
    } else {
        address.house_number.as_str()
    };
    let street = format!("{} {}", address.street, number);
    Some(format!("{}, {}", street.trim_end(), address.city))
}

/// Adresses correspondant à une saisie
pub async fn search_addresses<G: Geocoder>(
    geocoder: &G,
    query: &str,
) -> Result<Vec<AddressMatch>, RegistryError> {
    geocoder.suggest_addresses(query).await
}

/// Centroïde d'une adresse choisie parmi les suggestions
pub async fn resolve_address<G: Geocoder>(
    geocoder: &G,
    id: &str,
) -> Result<Option<AddressMatch>, RegistryError> {
    let found = geocoder.lookup_address(id).await?;
    Ok(found.filter(|m| m.point.is_some()))
}
