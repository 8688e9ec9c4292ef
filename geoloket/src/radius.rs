//! Recherche de bedrijven dans un rayon autour d'un point choisi

use std::sync::Mutex;

use registers::{CompanyRecord, CompanyRegistry, GeoPoint, RegistryError};
use tracing::{debug, info};

use crate::map::{MapSurface, ShapeHandle, ShapeStyle};

#[derive(Debug, Default)]
struct RadiusState {
    center: Option<GeoPoint>,
    center_marker: Option<ShapeHandle>,
    circle: Option<ShapeHandle>,
    results: Vec<ShapeHandle>,
}

impl RadiusState {
    fn clear_results<M: MapSurface>(&mut self, map: &M) {
        for handle in self.circle.take().into_iter().chain(self.results.drain(..)) {
            map.remove_shape(handle);
        }
    }
}

/// Recherche par rayon ; propriétaire du centre, du cercle et des résultats
#[derive(Debug, Default)]
pub struct RadiusSearch {
    state: Mutex<RadiusState>,
}

impl RadiusSearch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RadiusState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn center(&self) -> Option<GeoPoint> {
        self.lock().center
    }

    /// Place le centre, remplace le précédent et efface les résultats
    pub fn set_center<M: MapSurface>(&self, map: &M, point: GeoPoint) {
        let mut state = self.lock();
        state.clear_results(map);
        if let Some(marker) = state.center_marker.take() {
            map.remove_shape(marker);
        }
        state.center = Some(point);
        state.center_marker = Some(map.draw_marker(point, Some("Search center")));
        debug!(%point, "Radius center set");
    }

    /// Bedrijven dans `radius_m` mètres autour du centre
    ///
    /// Refusé sans centre ou avec un rayon nul, sans appel réseau.
    pub async fn search<R, M>(
        &self,
        registry: &R,
        map: &M,
        radius_m: u32,
    ) -> Result<Vec<CompanyRecord>, RegistryError>
    where
        R: CompanyRegistry,
        M: MapSurface,
    {
        let center = self
            .center()
            .ok_or_else(|| RegistryError::rejected("Select a center point on the map first"))?;
        if radius_m == 0 {
            return Err(RegistryError::rejected("Radius must be greater than zero"));
        }

        {
            let mut state = self.lock();
            state.clear_results(map);
            state.circle = Some(map.draw_circle(center, f64::from(radius_m), &ShapeStyle::RADIUS));
        }

        let companies = registry.within_radius(center, radius_m).await?;
        info!(%center, radius_m, count = companies.len(), "Radius search completed");

        let markers: Vec<ShapeHandle> = companies
            .iter()
            .filter_map(|c| {
                c.location
                    .map(|p| map.draw_marker(p, Some(&format!("{} ({})", c.name, c.kvk_number))))
            })
            .collect();
        self.lock().results.extend(markers);

        Ok(companies)
    }

    /// Retire toutes les formes et oublie le centre
    pub fn reset<M: MapSurface>(&self, map: &M) {
        let mut state = self.lock();
        state.clear_results(map);
        if let Some(marker) = state.center_marker.take() {
            map.remove_shape(marker);
        }
        state.center = None;
    }
}
