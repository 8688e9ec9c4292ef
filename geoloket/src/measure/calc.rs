//! Calculs de mesure : longueur de tracé, aire approchée, formatage

use geo::HaversineDistance;
use registers::GeoPoint;

/// Mètres par degré à l'équateur (approximation équirectangulaire)
pub const METERS_PER_DEGREE: f64 = 111_319.9;

/// Longueur du tracé en mètres (haversine entre points consécutifs)
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].to_point().haversine_distance(&w[1].to_point()))
        .sum()
}

/// Aire en m² d'un polygone, formule du lacet sur (lat, lon)
///
/// Les degrés sont convertis à l'échelle équatoriale puis corrigés par
/// cos(lat) du premier sommet. Approximation valable pour des emprises
/// de quelques kilomètres ; l'erreur croît avec l'étendue en latitude.
pub fn planar_area(points: &[GeoPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.lat * b.lon - b.lat * a.lon
        })
        .sum();

    let scale = METERS_PER_DEGREE * METERS_PER_DEGREE;
    twice.abs() / 2.0 * scale * points[0].lat.to_radians().cos()
}

/// `"850 m"` sous 1 km, `"1.25 km"` au-delà
///
/// Le seuil porte sur la valeur arrondie : jamais de `"1000 m"`.
pub fn format_distance(meters: f64) -> String {
    if meters.round() < 1000.0 {
        format!("{:.0} m", meters)
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// `"420 m²"` sous 1 ha, `"2.50 ha"` au-delà
pub fn format_area(square_meters: f64) -> String {
    if square_meters.round() < 10_000.0 {
        format!("{:.0} m²", square_meters)
    } else {
        format!("{:.2} ha", square_meters / 10_000.0)
    }
}
