//! Tests des pipelines avec des registres simulés
//!
//! Aucun appel réseau : les doublures comptent leurs appels et renvoient
//! des réponses passées par les vrais parseurs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use geoloket::map::{DrawnShape, MapSurface, Viewport};
use geoloket::present::{BuildingSection, CompanySection, Presenter, StatusLevel};
use geoloket::{ClickMode, ClickResult, LookupOutcome, LookupPipeline, MeasureMode, Viewer};
use registers::error::Result;
use registers::parser::bag::parse_feature_info;
use registers::parser::kvk::parse_company;
use registers::{
    AddressMatch, BuildingRecord, BuildingRegistry, CompanyRecord, CompanyRegistry,
    CompanySuggestion, FeatureInfoQuery, GeoPoint, Geocoder, RegistryError, UNKNOWN,
};

const DAM: GeoPoint = GeoPoint {
    lat: 52.37317,
    lon: 4.89162,
};

const PALEIS: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[4.8912, 52.3729], [4.8921, 52.3729], [4.8921, 52.3735], [4.8912, 52.3735], [4.8912, 52.3729]]]
        },
        "properties": {
            "identificatie": "0363100012168052",
            "bouwjaar": 1655,
            "gebruiksdoel": "bijeenkomstfunctie",
            "oppervlakte_max": 11000
        }
    }]
}"#;

const NO_IDENTIFIER: &str = r#"{
    "type": "FeatureCollection",
    "features": [{"type": "Feature", "geometry": null, "properties": {"bouwjaar": 1900}}]
}"#;

const EMPTY: &str = r#"{"type": "FeatureCollection", "features": []}"#;

// --- doublures ---------------------------------------------------------------

struct MockBuildings {
    body: &'static str,
    calls: Arc<AtomicUsize>,
}

impl MockBuildings {
    fn new(body: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                body,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl BuildingRegistry for MockBuildings {
    async fn feature_info(&self, _query: &FeatureInfoQuery) -> Result<Vec<BuildingRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // laisse un autre clic s'exécuter pendant la requête
        tokio::task::yield_now().await;
        parse_feature_info(self.body)
    }
}

/// Renvoie les réponses dans l'ordre, une par recherche
struct SequenceBuildings {
    bodies: Mutex<Vec<&'static str>>,
}

impl SequenceBuildings {
    fn new(bodies: &[&'static str]) -> Self {
        Self {
            bodies: Mutex::new(bodies.iter().rev().copied().collect()),
        }
    }
}

impl BuildingRegistry for SequenceBuildings {
    async fn feature_info(&self, _query: &FeatureInfoQuery) -> Result<Vec<BuildingRecord>> {
        let body = self.bodies.lock().unwrap().pop().unwrap_or(EMPTY);
        tokio::task::yield_now().await;
        parse_feature_info(body)
    }
}

#[derive(Default)]
struct MockCompanies {
    in_building: Vec<CompanyRecord>,
    fail: bool,
    details: Option<CompanyRecord>,
    radius: Vec<CompanyRecord>,
    building_calls: Arc<AtomicUsize>,
    radius_calls: Arc<AtomicUsize>,
}

impl CompanyRegistry for MockCompanies {
    async fn companies_in_building(&self, _building_id: &str) -> Result<Vec<CompanyRecord>> {
        self.building_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RegistryError::Status {
                service: "OpenKVK",
                status: 503,
            });
        }
        Ok(self.in_building.clone())
    }

    async fn suggest(&self, query: &str) -> Result<Vec<CompanySuggestion>> {
        if query.len() < 3 {
            return Err(RegistryError::rejected("Query must be at least 3 characters"));
        }
        Ok(vec![suggestion()])
    }

    async fn within_radius(&self, _center: GeoPoint, _radius_m: u32) -> Result<Vec<CompanyRecord>> {
        self.radius_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.radius.clone())
    }

    async fn details(&self, _link: &str) -> Result<CompanyRecord> {
        self.details
            .clone()
            .ok_or_else(|| RegistryError::malformed("OpenKVK", "no detail"))
    }
}

#[derive(Default)]
struct MockGeocoder {
    matches: Vec<AddressMatch>,
    lookup: Option<AddressMatch>,
}

impl Geocoder for MockGeocoder {
    async fn suggest_addresses(&self, _query: &str) -> Result<Vec<AddressMatch>> {
        Ok(self.matches.clone())
    }

    async fn lookup_address(&self, _id: &str) -> Result<Option<AddressMatch>> {
        Ok(self.lookup.clone())
    }
}

#[derive(Default)]
struct RecordingPresenter {
    statuses: Mutex<Vec<(StatusLevel, String)>>,
    buildings: Mutex<Vec<BuildingSection>>,
    companies: Mutex<Vec<CompanySection>>,
    measurements: Mutex<Vec<Option<String>>>,
}

impl RecordingPresenter {
    fn last_building(&self) -> Option<BuildingSection> {
        self.buildings.lock().unwrap().last().cloned()
    }

    fn last_companies(&self) -> Option<CompanySection> {
        self.companies.lock().unwrap().last().cloned()
    }

    fn has_error(&self) -> bool {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .any(|(level, _)| *level == StatusLevel::Error)
    }
}

impl Presenter for RecordingPresenter {
    fn status(&self, level: StatusLevel, message: &str) {
        self.statuses.lock().unwrap().push((level, message.to_string()));
    }

    fn building(&self, section: &BuildingSection) {
        self.buildings.lock().unwrap().push(section.clone());
    }

    fn companies(&self, section: &CompanySection) {
        self.companies.lock().unwrap().push(section.clone());
    }

    fn measurement(&self, text: Option<&str>) {
        self.measurements
            .lock()
            .unwrap()
            .push(text.map(str::to_string));
    }
}

fn company(json: &str) -> CompanyRecord {
    parse_company(json).unwrap()
}

fn suggestion() -> CompanySuggestion {
    CompanySuggestion {
        kvk_number: "33000001".into(),
        name: "Café 't Smalle".into(),
        postcode: "1015RL".into(),
        establishment_number: "000000000001".into(),
        link: Some("/v3/openkvk/hoofdvestiging-33000001".into()),
    }
}

fn map() -> Viewport {
    Viewport::centered(DAM, 0.002, 800, 600)
}

// --- pipeline de recherche ---------------------------------------------------

#[tokio::test]
async fn test_lookup_found_with_companies() {
    let (buildings, building_calls) = MockBuildings::new(PALEIS);
    let companies = MockCompanies {
        in_building: vec![company(r#"{"naam": "Stichting Koninklijk Paleis", "kvknummer": "41200000"}"#)],
        ..Default::default()
    };
    let company_calls = companies.building_calls.clone();
    let pipeline = LookupPipeline::new(buildings, companies);
    let map = map();
    let view = RecordingPresenter::default();

    let outcome = pipeline.lookup_at_point(&map, &view, DAM).await;

    let LookupOutcome::Found { building, companies } = outcome else {
        panic!("expected a building, got {outcome:?}");
    };
    assert_eq!(building.id.as_deref(), Some("0363100012168052"));
    assert_eq!(building.construction_year, Some(1655));
    assert_eq!(building_calls.load(Ordering::SeqCst), 1);
    assert_eq!(company_calls.load(Ordering::SeqCst), 1);

    match companies {
        CompanySection::Companies {
            building_id,
            companies,
        } => {
            assert_eq!(building_id, "0363100012168052");
            assert_eq!(companies[0].name, "Stichting Koninklijk Paleis");
        }
        other => panic!("unexpected section {other:?}"),
    }

    assert!(matches!(view.last_building(), Some(BuildingSection::Found(_))));
    assert!(matches!(
        view.last_companies(),
        Some(CompanySection::Companies { .. })
    ));

    // emprise + marqueur, vue cadrée sur le pand
    let shapes = map.shapes();
    assert_eq!(shapes.len(), 2);
    assert!(matches!(shapes[0], DrawnShape::Polygon { .. }));
    assert!(map.viewport_bounds().contains(GeoPoint::new(52.3732, 4.8916)));
}

#[tokio::test]
async fn test_no_identifier_skips_company_lookup() {
    let (buildings, _) = MockBuildings::new(NO_IDENTIFIER);
    let companies = MockCompanies::default();
    let company_calls = companies.building_calls.clone();
    let pipeline = LookupPipeline::new(buildings, companies);
    let view = RecordingPresenter::default();

    let outcome = pipeline.lookup_at_point(&map(), &view, DAM).await;

    assert!(matches!(
        outcome,
        LookupOutcome::Found {
            companies: CompanySection::NoIdentifier,
            ..
        }
    ));
    assert_eq!(company_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        view.last_companies(),
        Some(CompanySection::NoIdentifier)
    ));
}

#[tokio::test]
async fn test_no_building_found() {
    let (buildings, _) = MockBuildings::new(EMPTY);
    let companies = MockCompanies::default();
    let company_calls = companies.building_calls.clone();
    let pipeline = LookupPipeline::new(buildings, companies);
    let map = map();
    let view = RecordingPresenter::default();

    let outcome = pipeline.lookup_at_point(&map, &view, DAM).await;

    assert!(matches!(outcome, LookupOutcome::NotFound));
    assert!(matches!(view.last_building(), Some(BuildingSection::NotFound)));
    assert!(matches!(
        view.last_companies(),
        Some(CompanySection::NoBuilding)
    ));
    assert_eq!(company_calls.load(Ordering::SeqCst), 0);
    assert_eq!(map.shape_count(), 1);
    assert!(!view.has_error());
}

#[tokio::test]
async fn test_html_response_reported_as_unexpected_format() {
    let (buildings, _) = MockBuildings::new("<html><body>Service Unavailable</body></html>");
    let pipeline = LookupPipeline::new(buildings, MockCompanies::default());
    let view = RecordingPresenter::default();

    let outcome = pipeline.lookup_at_point(&map(), &view, DAM).await;

    let LookupOutcome::Failed(message) = outcome else {
        panic!("expected a failure");
    };
    assert!(message.contains("server returned unexpected format"));
    match view.last_building() {
        Some(BuildingSection::Error(msg)) => assert_eq!(msg, message),
        other => panic!("unexpected section {other:?}"),
    }
    assert!(view.has_error());
}

#[tokio::test]
async fn test_previous_companies_cleared_on_next_lookup() {
    let buildings = SequenceBuildings::new(&[
        PALEIS,
        EMPTY,
        PALEIS,
        "<html><body>Service Unavailable</body></html>",
    ]);
    let companies = MockCompanies {
        in_building: vec![company(r#"{"naam": "Old Co", "kvknummer": "41200000"}"#)],
        ..Default::default()
    };
    let pipeline = LookupPipeline::new(buildings, companies);
    let map = map();
    let view = RecordingPresenter::default();

    pipeline.lookup_at_point(&map, &view, DAM).await;
    {
        let sections = view.companies.lock().unwrap();
        assert!(matches!(sections[0], CompanySection::Loading));
        assert!(matches!(sections[1], CompanySection::Companies { .. }));
    }

    let outcome = pipeline.lookup_at_point(&map, &view, DAM).await;
    assert!(matches!(outcome, LookupOutcome::NotFound));
    assert!(matches!(
        view.last_companies(),
        Some(CompanySection::NoBuilding)
    ));

    pipeline.lookup_at_point(&map, &view, DAM).await;
    let outcome = pipeline.lookup_at_point(&map, &view, DAM).await;
    assert!(matches!(outcome, LookupOutcome::Failed(_)));
    assert!(matches!(view.last_building(), Some(BuildingSection::Error(_))));
    assert!(matches!(
        view.last_companies(),
        Some(CompanySection::NoBuilding)
    ));
}

#[tokio::test]
async fn test_company_failure_keeps_building() {
    let (buildings, _) = MockBuildings::new(PALEIS);
    let companies = MockCompanies {
        fail: true,
        ..Default::default()
    };
    let pipeline = LookupPipeline::new(buildings, companies);
    let view = RecordingPresenter::default();

    let outcome = pipeline.lookup_at_point(&map(), &view, DAM).await;

    assert!(matches!(
        outcome,
        LookupOutcome::Found {
            companies: CompanySection::Error(_),
            ..
        }
    ));
    assert!(matches!(view.last_building(), Some(BuildingSection::Found(_))));
}

#[tokio::test]
async fn test_concurrent_click_is_ignored() {
    let (buildings, building_calls) = MockBuildings::new(PALEIS);
    let pipeline = LookupPipeline::new(buildings, MockCompanies::default());
    let map = map();
    let view = RecordingPresenter::default();

    let (first, second) = tokio::join!(
        pipeline.lookup_at_point(&map, &view, DAM),
        pipeline.lookup_at_point(&map, &view, GeoPoint::new(52.3735, 4.8920)),
    );

    assert!(matches!(first, LookupOutcome::Found { .. }));
    assert!(matches!(second, LookupOutcome::Ignored));
    assert_eq!(building_calls.load(Ordering::SeqCst), 1);
    assert!(!pipeline.is_busy());

    // le verrou est relâché après la recherche
    pipeline.lookup_at_point(&map, &view, DAM).await;
    assert_eq!(building_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_company_fields_use_placeholder() {
    let (buildings, _) = MockBuildings::new(PALEIS);
    let companies = MockCompanies {
        in_building: vec![company("{}")],
        ..Default::default()
    };
    let pipeline = LookupPipeline::new(buildings, companies);
    let view = RecordingPresenter::default();

    pipeline.lookup_at_point(&map(), &view, DAM).await;

    let section = view.last_companies().unwrap();
    let c = &section.companies()[0];
    assert_eq!(c.name, UNKNOWN);
    assert_eq!(c.kvk_number, UNKNOWN);
    assert_eq!(c.legal_form, UNKNOWN);
    assert_eq!(c.address_label(), UNKNOWN);
}

#[tokio::test]
async fn test_close_panel_clears_highlight() {
    let (buildings, _) = MockBuildings::new(PALEIS);
    let pipeline = LookupPipeline::new(buildings, MockCompanies::default());
    let map = map();
    let view = RecordingPresenter::default();

    pipeline.lookup_at_point(&map, &view, DAM).await;
    assert!(map.shape_count() > 0);

    pipeline.clear_highlight(&map);
    assert_eq!(map.shape_count(), 0);
}

// --- façade ------------------------------------------------------------------

type TestViewer = Viewer<Viewport, RecordingPresenter, MockBuildings, MockCompanies, MockGeocoder>;

fn viewer(companies: MockCompanies, geocoder: MockGeocoder) -> (TestViewer, Arc<AtomicUsize>) {
    let (buildings, calls) = MockBuildings::new(PALEIS);
    (
        Viewer::new(map(), RecordingPresenter::default(), buildings, companies, geocoder),
        calls,
    )
}

#[tokio::test]
async fn test_click_while_measuring_appends_point() {
    let (viewer, building_calls) = viewer(MockCompanies::default(), MockGeocoder::default());

    viewer.start_measuring(MeasureMode::Distance);
    let first = viewer.handle_click(DAM).await;
    let second = viewer.handle_click(GeoPoint::new(52.3741, 4.8916)).await;

    assert!(matches!(first, ClickResult::Measured(Some(_))));
    let ClickResult::Measured(Some(measurement)) = second else {
        panic!("expected a measurement");
    };
    assert!(measurement.value() > 100.0 && measurement.value() < 120.0);
    assert_eq!(building_calls.load(Ordering::SeqCst), 0);

    viewer.cancel_measuring();
    assert_eq!(viewer.map().shape_count(), 0);
    let last = viewer.presenter().measurements.lock().unwrap().last().cloned();
    assert_eq!(last, Some(None));

    // hors mesure, le clic lance la recherche
    assert!(matches!(
        viewer.handle_click(DAM).await,
        ClickResult::Lookup(LookupOutcome::Found { .. })
    ));
    assert_eq!(building_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_radius_requires_center() {
    let companies = MockCompanies {
        radius: vec![company(
            r#"{"naam": "Hotel Krasnapolsky", "kvknummer": "33000002", "locatie": {"lat": 52.3725, "lon": 4.8937}}"#,
        )],
        ..Default::default()
    };
    let radius_calls = companies.radius_calls.clone();
    let (viewer, building_calls) = viewer(companies, MockGeocoder::default());

    assert!(viewer.search_radius(250).await.is_none());
    assert_eq!(radius_calls.load(Ordering::SeqCst), 0);
    assert!(viewer.presenter().has_error());

    viewer.set_click_mode(ClickMode::PlaceRadiusCenter);
    assert!(matches!(
        viewer.handle_click(DAM).await,
        ClickResult::RadiusCenter(_)
    ));
    assert_eq!(viewer.click_mode(), ClickMode::Inspect);
    assert_eq!(building_calls.load(Ordering::SeqCst), 0);

    let found = viewer.search_radius(250).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(radius_calls.load(Ordering::SeqCst), 1);
    // centre, cercle, un résultat
    assert_eq!(viewer.map().shape_count(), 3);

    viewer.reset_radius();
    assert_eq!(viewer.map().shape_count(), 0);
}

#[tokio::test]
async fn test_locate_company_falls_back_to_geocoding() {
    let point = GeoPoint::new(52.3779, 4.8833);
    let companies = MockCompanies {
        details: Some(company(
            r#"{"naam": "Café 't Smalle", "kvknummer": "33000001",
                "bezoeklocatie": {"straat": "Egelantiersgracht", "huisnummer": 12, "postcode": "1015RL", "plaats": "Amsterdam"}}"#,
        )),
        ..Default::default()
    };
    let geocoder = MockGeocoder {
        matches: vec![AddressMatch {
            id: "adr-1".into(),
            label: "Egelantiersgracht 12, 1015RL Amsterdam".into(),
            point: None,
        }],
        lookup: Some(AddressMatch {
            id: "adr-1".into(),
            label: "Egelantiersgracht 12, 1015RL Amsterdam".into(),
            point: Some(point),
        }),
    };
    let (viewer, _) = viewer(companies, geocoder);

    let located = viewer.locate_company(&suggestion()).await.unwrap();
    assert_eq!(located.point, point);
    assert_eq!(located.source, geoloket::locate::LocationSource::Geocoded);
    assert!(viewer.map().viewport_bounds().contains(point));
    assert_eq!(viewer.map().shape_count(), 1);

    // nouvelle sélection : le marqueur précédent est remplacé
    viewer.select_address("adr-1").await.unwrap();
    assert_eq!(viewer.map().shape_count(), 1);

    viewer.close_info();
    assert_eq!(viewer.map().shape_count(), 0);
}

#[tokio::test]
async fn test_short_company_query_reported() {
    let (viewer, _) = viewer(MockCompanies::default(), MockGeocoder::default());

    assert!(viewer.suggest_companies("ab").await.is_empty());
    assert!(viewer.presenter().has_error());
    assert_eq!(viewer.suggest_companies("smalle").await.len(), 1);
}
