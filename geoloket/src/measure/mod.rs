//! Mesure à main levée : distance (polyligne) ou aire (polygone)
//!
//! Une seule session à la fois. Toutes les formes dessinées par une
//! session lui appartiennent et sont retirées à l'arrêt.

pub mod calc;

use std::sync::Mutex;

use registers::GeoPoint;
use tracing::{debug, info};

use crate::map::{MapSurface, ShapeHandle, ShapeStyle};

pub use calc::{format_area, format_distance, path_length, planar_area, METERS_PER_DEGREE};

/// Type de mesure demandé
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    Distance,
    Area,
}

/// État de l'outil de mesure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureState {
    Idle,
    MeasuringDistance,
    MeasuringArea,
}

impl From<MeasureMode> for MeasureState {
    fn from(mode: MeasureMode) -> Self {
        match mode {
            MeasureMode::Distance => Self::MeasuringDistance,
            MeasureMode::Area => Self::MeasuringArea,
        }
    }
}

/// Résultat courant d'une mesure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Mètres
    Distance(f64),
    /// Mètres carrés
    Area(f64),
}

impl Measurement {
    pub fn value(&self) -> f64 {
        match self {
            Self::Distance(v) | Self::Area(v) => *v,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Distance(m) => format_distance(*m),
            Self::Area(m2) => format_area(*m2),
        }
    }
}

/// Session de mesure active
#[derive(Debug)]
pub struct MeasurementSession {
    pub mode: MeasureMode,
    pub points: Vec<GeoPoint>,
    line: Option<ShapeHandle>,
    polygon: Option<ShapeHandle>,
    markers: Vec<ShapeHandle>,
}

impl MeasurementSession {
    fn new(mode: MeasureMode) -> Self {
        Self {
            mode,
            points: Vec::new(),
            line: None,
            polygon: None,
            markers: Vec::new(),
        }
    }

    fn measure(&self) -> Measurement {
        match self.mode {
            MeasureMode::Distance => Measurement::Distance(path_length(&self.points)),
            MeasureMode::Area => Measurement::Area(planar_area(&self.points)),
        }
    }

    fn remove_shapes<M: MapSurface>(self, map: &M) {
        for handle in self.line.into_iter().chain(self.polygon).chain(self.markers) {
            map.remove_shape(handle);
        }
    }
}

/// Moteur de mesure
#[derive(Debug, Default)]
pub struct MeasurementEngine {
    session: Mutex<Option<MeasurementSession>>,
}

impl MeasurementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<MeasurementSession>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> MeasureState {
        self.lock()
            .as_ref()
            .map_or(MeasureState::Idle, |s| s.mode.into())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Démarre une mesure
    ///
    /// Relancer le mode déjà actif l'arrête (bascule). Un autre mode
    /// remplace la session en cours.
    pub fn start<M: MapSurface>(&self, map: &M, mode: MeasureMode) -> MeasureState {
        let mut session = self.lock();

        if let Some(previous) = session.take() {
            let same = previous.mode == mode;
            previous.remove_shapes(map);
            if same {
                debug!(?mode, "Measurement toggled off");
                return MeasureState::Idle;
            }
        }

        info!(?mode, "Measurement started");
        *session = Some(MeasurementSession::new(mode));
        mode.into()
    }

    /// Ajoute un sommet et recalcule ; None hors mesure
    pub fn append_point<M: MapSurface>(&self, map: &M, point: GeoPoint) -> Option<Measurement> {
        let mut guard = self.lock();
        let session = guard.as_mut()?;

        session.points.push(point);
        session.markers.push(map.draw_marker(point, None));

        match session.mode {
            MeasureMode::Distance if session.points.len() >= 2 => {
                if let Some(line) = session.line.take() {
                    map.remove_shape(line);
                }
                session.line = Some(map.draw_polyline(&session.points, &ShapeStyle::MEASURE));
            }
            MeasureMode::Area if session.points.len() >= 3 => {
                if let Some(polygon) = session.polygon.take() {
                    map.remove_shape(polygon);
                }
                session.polygon = Some(map.draw_polygon(&session.points, &ShapeStyle::MEASURE));
            }
            _ => {}
        }

        let measurement = session.measure();
        debug!(points = session.points.len(), value = measurement.value(), "Measurement updated");
        Some(measurement)
    }

    /// Arrête la mesure et retire ses formes ; sans effet si inactive
    pub fn stop<M: MapSurface>(&self, map: &M) {
        if let Some(session) = self.lock().take() {
            debug!(mode = ?session.mode, points = session.points.len(), "Measurement stopped");
            session.remove_shapes(map);
        }
    }

    /// Annulation (touche Échap) : identique à l'arrêt
    pub fn cancel<M: MapSurface>(&self, map: &M) {
        self.stop(map);
    }

    pub fn points(&self) -> Vec<GeoPoint> {
        self.lock()
            .as_ref()
            .map(|s| s.points.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<Measurement> {
        self.lock().as_ref().map(MeasurementSession::measure)
    }

    /// Texte affiché, None hors mesure
    pub fn result_text(&self) -> Option<String> {
        self.current().map(|m| m.text())
    }
}
