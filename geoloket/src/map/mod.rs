//! Surface de carte consommée par les pipelines
//!
//! La carte réelle (navigateur, moteur de rendu) implémente [`MapSurface`].
//! [`Viewport`] en est une implémentation en mémoire, utilisée par la CLI
//! et les tests.

mod viewport;

pub use viewport::{DrawnShape, Viewport};

use registers::{Bounds, GeoPoint};

/// Référence opaque vers une forme dessinée, pour la retirer plus tard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub u64);

/// Style de tracé
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStyle {
    pub color: &'static str,
    pub weight: f32,
    pub fill_opacity: f32,
}

impl ShapeStyle {
    /// Emprise du pand sélectionné
    pub const HIGHLIGHT: Self = Self {
        color: "#ff7800",
        weight: 5.0,
        fill_opacity: 0.2,
    };

    /// Lignes et polygones de mesure
    pub const MEASURE: Self = Self {
        color: "#76bc94",
        weight: 3.0,
        fill_opacity: 0.3,
    };

    /// Cercle de recherche par rayon
    pub const RADIUS: Self = Self {
        color: "#ff8800",
        weight: 2.0,
        fill_opacity: 0.0,
    };
}

/// Primitives de carte utilisées par les pipelines
///
/// Les méthodes prennent `&self` : une carte est partagée entre les
/// gestionnaires d'événements, chaque composant ne retire que ses formes.
pub trait MapSurface {
    /// Pixel (x, y) du point dans la vue courante
    fn pixel_for_point(&self, point: GeoPoint) -> (f64, f64);

    /// Emprise WGS84 de la vue courante
    fn viewport_bounds(&self) -> Bounds;

    /// Taille de la vue en pixels (largeur, hauteur)
    fn viewport_size(&self) -> (u32, u32);

    fn draw_marker(&self, point: GeoPoint, popup: Option<&str>) -> ShapeHandle;

    fn draw_polyline(&self, points: &[GeoPoint], style: &ShapeStyle) -> ShapeHandle;

    fn draw_polygon(&self, points: &[GeoPoint], style: &ShapeStyle) -> ShapeHandle;

    fn draw_circle(&self, center: GeoPoint, radius_m: f64, style: &ShapeStyle) -> ShapeHandle;

    /// Retire une forme ; sans effet si elle n'existe plus
    fn remove_shape(&self, handle: ShapeHandle);

    /// Cadre la vue sur une emprise
    fn fit_to(&self, bounds: Bounds);
}
