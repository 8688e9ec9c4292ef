//! Configuration du viewer

use std::path::Path;

use anyhow::{Context, Result};
use registers::{BagConfig, GeoPoint, HttpConfig, KvkConfig, LocatieConfig};
use serde::{Deserialize, Serialize};

/// Configuration principale
///
/// Toutes les sections sont optionnelles dans le fichier JSON ; les
/// variables d'environnement l'emportent sur le fichier.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bag: BagConfig,
    pub kvk: KvkConfig,
    pub locatie: LocatieConfig,
    pub http: HttpConfig,
    pub viewport: ViewportConfig,
}

/// Vue de carte utilisée par la CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Centre initial (centre des Pays-Bas)
    pub center: GeoPoint,
    /// Étendue en latitude (degrés) de la vue autour d'un clic
    pub span_deg: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(52.1326, 5.2913),
            span_deg: 0.002,
            width: 800,
            height: 600,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Configuration par défaut surchargée par l'environnement
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Fichier optionnel, puis variables d'environnement
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::from_env());
        };
        let mut config = Self::load(path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.bag.apply_env();
        self.kvk.apply_env();
        self.locatie.apply_env();
        self.http.apply_env();
    }
}
