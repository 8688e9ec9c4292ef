//! Pipeline de recherche au clic : pand BAG puis bedrijven OpenKVK
//!
//! Étapes, strictement séquentielles :
//! 1. GetFeatureInfo sur la vue courante (emprise, taille, pixel cliqué)
//! 2. Premier pand renvoyé (l'ordre du registre fait foi)
//! 3. Bedrijven par identifiant de pand
//!
//! Chaque étape a son propre mode d'échec et se termine toujours par une
//! section affichable : le panneau ne reste jamais en chargement. La liste
//! de bedrijven est retirée dès le début de chaque recherche.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use geo::Geometry;
use registers::{
    Bounds, BuildingRecord, BuildingRegistry, CompanyRegistry, FeatureInfoQuery, GeoPoint,
};
use tracing::{debug, info, warn};

use crate::map::{MapSurface, ShapeHandle, ShapeStyle};
use crate::present::{BuildingSection, CompanySection, Presenter, StatusLevel};

/// Résultat d'une recherche au clic
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// Une recherche était déjà en cours, clic ignoré
    Ignored,
    /// Aucun pand sous le clic
    NotFound,
    Found {
        building: BuildingRecord,
        companies: CompanySection,
    },
    /// Échec de la requête bâtiment
    Failed(String),
}

/// Garde de ré-entrance : libère le drapeau au drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Pipeline de recherche, propriétaire du surlignage courant
pub struct LookupPipeline<B, C> {
    buildings: B,
    companies: C,
    in_flight: AtomicBool,
    highlight: Mutex<Vec<ShapeHandle>>,
}

impl<B, C> LookupPipeline<B, C>
where
    B: BuildingRegistry,
    C: CompanyRegistry,
{
    pub fn new(buildings: B, companies: C) -> Self {
        Self {
            buildings,
            companies,
            in_flight: AtomicBool::new(false),
            highlight: Mutex::new(Vec::new()),
        }
    }

    pub fn company_registry(&self) -> &C {
        &self.companies
    }

    /// Vrai si une recherche est en cours
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Recherche le pand et ses bedrijven au point cliqué
    ///
    /// Un appel pendant qu'une recherche est en cours est ignoré, sans
    /// appel réseau.
    pub async fn lookup_at_point<M, P>(&self, map: &M, view: &P, point: GeoPoint) -> LookupOutcome
    where
        M: MapSurface,
        P: Presenter,
    {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!(%point, "Lookup already in progress, click ignored");
            return LookupOutcome::Ignored;
        };

        view.status(StatusLevel::Info, "Fetching building information...");
        view.companies(&CompanySection::Loading);
        self.clear_highlight(map);

        let query = feature_info_query(map, point);
        debug!(?query, "BAG GetFeatureInfo");

        let building = match self.buildings.feature_info(&query).await {
            Ok(buildings) => match buildings.into_iter().next() {
                Some(building) => building,
                None => {
                    info!(%point, "No building at clicked location");
                    view.building(&BuildingSection::NotFound);
                    view.companies(&CompanySection::NoBuilding);
                    view.status(StatusLevel::Info, "No building found at this location");
                    self.set_highlight(vec![
                        map.draw_marker(point, Some("No building found here"))
                    ]);
                    return LookupOutcome::NotFound;
                }
            },
            Err(e) => {
                warn!(%point, error = %e, "Building lookup failed");
                let message = e.user_message();
                view.building(&BuildingSection::Error(message.clone()));
                view.companies(&CompanySection::NoBuilding);
                view.status(StatusLevel::Error, "Error fetching building information");
                return LookupOutcome::Failed(message);
            }
        };

        view.building(&BuildingSection::Found(building.clone()));
        self.set_highlight(highlight_building(map, point, &building));

        let companies = self.company_section(&building, view).await;
        view.companies(&companies);

        LookupOutcome::Found {
            building,
            companies,
        }
    }

    /// Étape bedrijven, ignorée quand le pand n'a pas d'identifiant
    async fn company_section<P: Presenter>(
        &self,
        building: &BuildingRecord,
        view: &P,
    ) -> CompanySection {
        let Some(building_id) = building.id.clone() else {
            info!("Building has no identifier, company lookup skipped");
            view.status(StatusLevel::Info, "No building identifier for company lookup");
            return CompanySection::NoIdentifier;
        };

        view.status(StatusLevel::Info, "Fetching company information...");
        match self.companies.companies_in_building(&building_id).await {
            Ok(companies) if companies.is_empty() => {
                view.status(StatusLevel::Info, "No companies found in this building");
                CompanySection::Empty { building_id }
            }
            Ok(companies) => {
                info!(building_id = %building_id, count = companies.len(), "Companies found");
                view.status(
                    StatusLevel::Success,
                    &format!("{} companies found in this building", companies.len()),
                );
                CompanySection::Companies {
                    building_id,
                    companies,
                }
            }
            Err(e) => {
                warn!(building_id = %building_id, error = %e, "Company lookup failed");
                view.status(StatusLevel::Error, "Error fetching company information");
                CompanySection::Error(e.user_message())
            }
        }
    }

    /// Retire le surlignage (fermeture du panneau)
    pub fn clear_highlight<M: MapSurface>(&self, map: &M) {
        let handles = std::mem::take(&mut *self.lock_highlight());
        for handle in handles {
            map.remove_shape(handle);
        }
    }

    fn set_highlight(&self, handles: Vec<ShapeHandle>) {
        *self.lock_highlight() = handles;
    }

    fn lock_highlight(&self) -> std::sync::MutexGuard<'_, Vec<ShapeHandle>> {
        self.highlight.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Construit la requête GetFeatureInfo depuis la vue courante
pub fn feature_info_query<M: MapSurface>(map: &M, point: GeoPoint) -> FeatureInfoQuery {
    let (x, y) = map.pixel_for_point(point);
    let (width, height) = map.viewport_size();
    FeatureInfoQuery {
        bounds: map.viewport_bounds(),
        width,
        height,
        i: to_pixel(x, width),
        j: to_pixel(y, height),
    }
}

fn to_pixel(value: f64, max: u32) -> u32 {
    value.round().clamp(0.0, f64::from(max)) as u32
}

/// Contour extérieur du pand, s'il a une géométrie surfacique
pub fn footprint(geometry: &Geometry) -> Option<Vec<GeoPoint>> {
    let polygon = match geometry {
        Geometry::Polygon(p) => p,
        Geometry::MultiPolygon(mp) => mp.0.first()?,
        _ => return None,
    };
    let ring: Vec<GeoPoint> = polygon.exterior().coords().map(|c| GeoPoint::from(*c)).collect();
    (ring.len() >= 3).then_some(ring)
}

/// Dessine l'emprise du pand (si connue) et un marqueur au clic
fn highlight_building<M: MapSurface>(
    map: &M,
    point: GeoPoint,
    building: &BuildingRecord,
) -> Vec<ShapeHandle> {
    let mut handles = Vec::new();

    if let Some(ring) = building.geometry.as_ref().and_then(footprint) {
        handles.push(map.draw_polygon(&ring, &ShapeStyle::HIGHLIGHT));
        if let Some(bounds) = Bounds::from_points(ring.iter().copied()) {
            map.fit_to(bounds);
        }
    }

    handles.push(map.draw_marker(point, Some(&building.label)));
    handles
}
