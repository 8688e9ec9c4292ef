//! Carte en mémoire : projection linéaire EPSG:4326 et registre des formes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use registers::{Bounds, GeoPoint};
use tracing::trace;

use super::{MapSurface, ShapeHandle, ShapeStyle};

/// Forme dessinée sur un [`Viewport`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnShape {
    Marker {
        point: GeoPoint,
        popup: Option<String>,
    },
    Polyline {
        points: Vec<GeoPoint>,
        style: ShapeStyle,
    },
    Polygon {
        points: Vec<GeoPoint>,
        style: ShapeStyle,
    },
    Circle {
        center: GeoPoint,
        radius_m: f64,
        style: ShapeStyle,
    },
}

/// Vue de carte sans rendu
///
/// Les coordonnées pixel suivent une projection linéaire de l'emprise
/// WGS84, identique à celle attendue par un GetFeatureInfo en EPSG:4326.
#[derive(Debug)]
pub struct Viewport {
    bounds: Mutex<Bounds>,
    width: u32,
    height: u32,
    next_id: AtomicU64,
    shapes: Mutex<Vec<(ShapeHandle, DrawnShape)>>,
}

impl Viewport {
    pub fn new(bounds: Bounds, width: u32, height: u32) -> Self {
        Self {
            bounds: Mutex::new(bounds),
            width: width.max(1),
            height: height.max(1),
            next_id: AtomicU64::new(1),
            shapes: Mutex::new(Vec::new()),
        }
    }

    /// Vue centrée sur un point, emprise de `span_deg` degrés en latitude
    ///
    /// L'étendue en longitude suit le ratio de la vue.
    pub fn centered(center: GeoPoint, span_deg: f64, width: u32, height: u32) -> Self {
        let half_lat = span_deg / 2.0;
        let half_lon = half_lat * f64::from(width.max(1)) / f64::from(height.max(1));
        Self::new(Bounds::around(center, half_lat, half_lon), width, height)
    }

    /// Formes actuellement dessinées, dans l'ordre de tracé
    pub fn shapes(&self) -> Vec<DrawnShape> {
        self.lock_shapes().iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn shape_count(&self) -> usize {
        self.lock_shapes().len()
    }

    fn lock_shapes(&self) -> std::sync::MutexGuard<'_, Vec<(ShapeHandle, DrawnShape)>> {
        self.shapes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add(&self, shape: DrawnShape) -> ShapeHandle {
        let handle = ShapeHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(handle = handle.0, ?shape, "Shape drawn");
        self.lock_shapes().push((handle, shape));
        handle
    }
}

impl MapSurface for Viewport {
    fn pixel_for_point(&self, point: GeoPoint) -> (f64, f64) {
        let b = self.viewport_bounds();
        let x = (point.lon - b.west) / (b.east - b.west) * f64::from(self.width);
        let y = (b.north - point.lat) / (b.north - b.south) * f64::from(self.height);
        (x, y)
    }

    fn viewport_bounds(&self) -> Bounds {
        *self.bounds.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_marker(&self, point: GeoPoint, popup: Option<&str>) -> ShapeHandle {
        self.add(DrawnShape::Marker {
            point,
            popup: popup.map(str::to_string),
        })
    }

    fn draw_polyline(&self, points: &[GeoPoint], style: &ShapeStyle) -> ShapeHandle {
        self.add(DrawnShape::Polyline {
            points: points.to_vec(),
            style: *style,
        })
    }

    fn draw_polygon(&self, points: &[GeoPoint], style: &ShapeStyle) -> ShapeHandle {
        self.add(DrawnShape::Polygon {
            points: points.to_vec(),
            style: *style,
        })
    }

    fn draw_circle(&self, center: GeoPoint, radius_m: f64, style: &ShapeStyle) -> ShapeHandle {
        self.add(DrawnShape::Circle {
            center,
            radius_m,
            style: *style,
        })
    }

    fn remove_shape(&self, handle: ShapeHandle) {
        self.lock_shapes().retain(|(h, _)| *h != handle);
    }

    fn fit_to(&self, bounds: Bounds) {
        // Conserve le ratio de la vue autour du centre demandé
        let center = bounds.center();
        let half_lat = ((bounds.north - bounds.south) / 2.0).max(1e-6);
        let half_lon = ((bounds.east - bounds.west) / 2.0).max(1e-6);
        let ratio = f64::from(self.width) / f64::from(self.height);
        let (half_lat, half_lon) = if half_lon / half_lat > ratio {
            (half_lon / ratio, half_lon)
        } else {
            (half_lat, half_lat * ratio)
        };
        *self.bounds.lock().unwrap_or_else(|e| e.into_inner()) =
            Bounds::around(center, half_lat, half_lon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_for_point() {
        let view = Viewport::new(Bounds::new(52.0, 4.0, 53.0, 6.0), 800, 400);
        assert_eq!(view.pixel_for_point(GeoPoint::new(53.0, 4.0)), (0.0, 0.0));
        assert_eq!(view.pixel_for_point(GeoPoint::new(52.5, 5.0)), (400.0, 200.0));
        assert_eq!(view.pixel_for_point(GeoPoint::new(52.0, 6.0)), (800.0, 400.0));
    }

    #[test]
    fn test_centered_keeps_ratio() {
        let view = Viewport::centered(GeoPoint::new(52.0, 5.0), 0.01, 800, 400);
        let b = view.viewport_bounds();
        assert!(((b.north - b.south) - 0.01).abs() < 1e-12);
        assert!(((b.east - b.west) - 0.02).abs() < 1e-12);
        let (x, y) = view.pixel_for_point(GeoPoint::new(52.0, 5.0));
        assert!((x - 400.0).abs() < 1e-6 && (y - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_draw_and_remove() {
        let view = Viewport::centered(GeoPoint::new(52.0, 5.0), 0.01, 100, 100);
        let a = view.draw_marker(GeoPoint::new(52.0, 5.0), Some("a"));
        let b = view.draw_circle(GeoPoint::new(52.0, 5.0), 100.0, &ShapeStyle::RADIUS);
        assert_ne!(a, b);
        assert_eq!(view.shape_count(), 2);

        view.remove_shape(a);
        view.remove_shape(a);
        assert_eq!(view.shape_count(), 1);
        assert!(matches!(view.shapes()[0], DrawnShape::Circle { .. }));
    }

    #[test]
    fn test_fit_to() {
        let view = Viewport::centered(GeoPoint::new(52.0, 5.0), 1.0, 200, 100);
        view.fit_to(Bounds::new(51.0, 4.0, 51.1, 4.1));
        let b = view.viewport_bounds();
        assert!(b.south <= 51.0 + 1e-9 && b.north >= 51.1 - 1e-9);
        assert!(b.west < 4.0 && b.east > 4.1);
        assert!(((b.east - b.west) / (b.north - b.south) - 2.0).abs() < 1e-9);
    }
}
