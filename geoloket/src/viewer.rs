//! Façade unique appelée par les interfaces (carte, CLI)
//!
//! Route les clics vers le bon composant et convertit toutes les erreurs
//! des registres en messages de statut, journalisés avec `tracing`.

use std::sync::Mutex;

use registers::{
    AddressMatch, Bounds, BuildingRegistry, CompanyRecord, CompanyRegistry, CompanySuggestion,
    GeoPoint, Geocoder, RegistryError,
};
use tracing::{debug, info, warn};

use crate::locate::{self, LocatedCompany, LocationSource};
use crate::lookup::{LookupOutcome, LookupPipeline};
use crate::map::{MapSurface, ShapeHandle};
use crate::measure::{MeasureMode, MeasureState, Measurement, MeasurementEngine};
use crate::present::{Presenter, StatusLevel};
use crate::radius::RadiusSearch;

/// Demi-étendue (degrés) de la vue après sélection d'un résultat de recherche
pub const FOCUS_HALF_SPAN_DEG: f64 = 0.001;

/// Effet d'un clic simple sur la carte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickMode {
    /// Recherche du pand sous le clic
    #[default]
    Inspect,
    /// Placement du centre de recherche par rayon
    PlaceRadiusCenter,
}

/// Résultat d'un clic routé par [`Viewer::handle_click`]
#[derive(Debug, Clone)]
pub enum ClickResult {
    RadiusCenter(GeoPoint),
    Measured(Option<Measurement>),
    Lookup(LookupOutcome),
}

/// Viewer : carte, panneau d'information et registres
pub struct Viewer<M, P, B, C, G> {
    map: M,
    view: P,
    lookup: LookupPipeline<B, C>,
    geocoder: G,
    measure: MeasurementEngine,
    radius: RadiusSearch,
    click_mode: Mutex<ClickMode>,
    search_marker: Mutex<Option<ShapeHandle>>,
}

impl<M, P, B, C, G> Viewer<M, P, B, C, G>
where
    M: MapSurface,
    P: Presenter,
    B: BuildingRegistry,
    C: CompanyRegistry,
    G: Geocoder,
{
    pub fn new(map: M, view: P, buildings: B, companies: C, geocoder: G) -> Self {
        Self {
            map,
            view,
            lookup: LookupPipeline::new(buildings, companies),
            geocoder,
            measure: MeasurementEngine::new(),
            radius: RadiusSearch::new(),
            click_mode: Mutex::new(ClickMode::default()),
            search_marker: Mutex::new(None),
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn presenter(&self) -> &P {
        &self.view
    }

    fn companies(&self) -> &C {
        self.lookup.company_registry()
    }

    fn report(&self, context: &str, error: &RegistryError) {
        warn!(kind = ?error.kind(), error = %error, "{context}");
        self.view.status(StatusLevel::Error, &error.user_message());
    }

    // --- clics -----------------------------------------------------------

    /// Clic sur la carte
    ///
    /// Placement de centre, puis mesure en cours, sinon recherche du pand.
    pub async fn handle_click(&self, point: GeoPoint) -> ClickResult {
        if self.click_mode() == ClickMode::PlaceRadiusCenter {
            self.radius.set_center(&self.map, point);
            self.set_click_mode(ClickMode::Inspect);
            self.view
                .status(StatusLevel::Info, "Search center set, choose a radius");
            return ClickResult::RadiusCenter(point);
        }

        if self.measure.is_active() {
            debug!(%point, "Measuring, lookup skipped");
            return ClickResult::Measured(self.append_measurement_point(point));
        }

        ClickResult::Lookup(self.lookup_at_point(point).await)
    }

    pub async fn lookup_at_point(&self, point: GeoPoint) -> LookupOutcome {
        self.lookup.lookup_at_point(&self.map, &self.view, point).await
    }

    pub fn click_mode(&self) -> ClickMode {
        *self.click_mode.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_click_mode(&self, mode: ClickMode) {
        *self.click_mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
    }

    /// Ferme le panneau d'information et retire le surlignage
    pub fn close_info(&self) {
        self.lookup.clear_highlight(&self.map);
        self.clear_search_marker();
    }

    // --- mesure ----------------------------------------------------------

    pub fn measure_state(&self) -> MeasureState {
        self.measure.state()
    }

    pub fn start_measuring(&self, mode: MeasureMode) -> MeasureState {
        let state = self.measure.start(&self.map, mode);
        match state {
            MeasureState::Idle => self.view.measurement(None),
            _ => {
                self.view.measurement(self.measure.result_text().as_deref());
                self.view
                    .status(StatusLevel::Info, "Click on the map to add measurement points");
            }
        }
        state
    }

    pub fn append_measurement_point(&self, point: GeoPoint) -> Option<Measurement> {
        let measurement = self.measure.append_point(&self.map, point)?;
        self.view.measurement(Some(&measurement.text()));
        Some(measurement)
    }

    pub fn stop_measuring(&self) {
        self.measure.stop(&self.map);
        self.view.measurement(None);
    }

    /// Touche Échap
    pub fn cancel_measuring(&self) {
        self.measure.cancel(&self.map);
        self.view.measurement(None);
    }

    // --- rayon -----------------------------------------------------------

    /// Bedrijven autour du centre choisi ; None en cas d'erreur (signalée)
    pub async fn search_radius(&self, radius_m: u32) -> Option<Vec<CompanyRecord>> {
        match self.radius.search(self.companies(), &self.map, radius_m).await {
            Ok(companies) => {
                let level = if companies.is_empty() {
                    StatusLevel::Info
                } else {
                    StatusLevel::Success
                };
                self.view.status(
                    level,
                    &format!("{} companies within {} m", companies.len(), radius_m),
                );
                Some(companies)
            }
            Err(e) => {
                self.report("Radius search failed", &e);
                None
            }
        }
    }

    pub fn reset_radius(&self) {
        self.radius.reset(&self.map);
        self.set_click_mode(ClickMode::Inspect);
    }

    // --- recherche -------------------------------------------------------

    pub async fn suggest_companies(&self, query: &str) -> Vec<CompanySuggestion> {
        match locate::suggest_companies(self.companies(), query).await {
            Ok(suggestions) => {
                if suggestions.is_empty() {
                    self.view.status(StatusLevel::Info, "No companies found");
                }
                suggestions
            }
            Err(e) => {
                self.report("Company search failed", &e);
                Vec::new()
            }
        }
    }

    /// Positionne un bedrijf choisi parmi les suggestions et y centre la vue
    pub async fn locate_company(&self, suggestion: &CompanySuggestion) -> Option<LocatedCompany> {
        match locate::locate_company(self.companies(), &self.geocoder, suggestion).await {
            Ok(Some(located)) => {
                if located.source == LocationSource::Geocoded {
                    debug!(kvk = %located.company.kvk_number, "Location from geocoded address");
                }
                let popup = format!(
                    "{} (KVK {})",
                    located.company.name, located.company.kvk_number
                );
                self.focus(located.point, &popup);
                info!(kvk = %located.company.kvk_number, point = %located.point, "Company located");
                Some(located)
            }
            Ok(None) => {
                self.view
                    .status(StatusLevel::Info, "No location available for this company");
                None
            }
            Err(e) => {
                self.report("Company details failed", &e);
                None
            }
        }
    }

    pub async fn search_addresses(&self, query: &str) -> Vec<AddressMatch> {
        match locate::search_addresses(&self.geocoder, query).await {
            Ok(matches) => {
                if matches.is_empty() {
                    self.view.status(StatusLevel::Info, "No addresses found");
                }
                matches
            }
            Err(e) => {
                self.report("Address search failed", &e);
                Vec::new()
            }
        }
    }

    /// Centre la vue sur une adresse choisie parmi les suggestions
    pub async fn select_address(&self, id: &str) -> Option<AddressMatch> {
        match locate::resolve_address(&self.geocoder, id).await {
            Ok(Some(found)) => {
                if let Some(point) = found.point {
                    self.focus(point, &found.label);
                }
                Some(found)
            }
            Ok(None) => {
                self.view
                    .status(StatusLevel::Info, "No coordinates found for this address");
                None
            }
            Err(e) => {
                self.report("Address lookup failed", &e);
                None
            }
        }
    }

    fn focus(&self, point: GeoPoint, popup: &str) {
        self.clear_search_marker();
        let marker = self.map.draw_marker(point, Some(popup));
        *self.search_marker.lock().unwrap_or_else(|e| e.into_inner()) = Some(marker);
        self.map.fit_to(Bounds::around(
            point,
            FOCUS_HALF_SPAN_DEG,
            FOCUS_HALF_SPAN_DEG,
        ));
    }

    fn clear_search_marker(&self) {
        let marker = self
            .search_marker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(marker) = marker {
            self.map.remove_shape(marker);
        }
    }
}
