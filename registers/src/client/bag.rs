//! Client WMS BAG (PDOK), requêtes GetFeatureInfo sur la couche `pand`

use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{HttpClient, HttpConfig};
use crate::error::{RegistryError, Result};
use crate::parser::bag::{parse_feature_info, SERVICE};
use crate::registry::BuildingRegistry;
use crate::types::{BuildingRecord, FeatureInfoQuery};

/// Configuration du WMS BAG
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BagConfig {
    /// URL du service WMS
    pub url: String,
    /// Couche interrogée
    pub layer: String,
    /// Nombre maximal de features renvoyées
    pub feature_count: u32,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            url: "https://service.pdok.nl/lv/bag/wms/v2_0".into(),
            layer: "pand".into(),
            feature_count: 5,
        }
    }
}

impl BagConfig {
    /// Surcharge depuis les variables d'environnement
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("BAG_WMS_URL") {
            self.url = url;
        }
    }
}

/// Client GetFeatureInfo
#[derive(Debug, Clone)]
pub struct BagClient {
    http: HttpClient,
    base: Url,
    config: BagConfig,
}

impl BagClient {
    pub fn new(config: BagConfig, http: &HttpConfig) -> Result<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", config.url)))?;
        Ok(Self {
            http: HttpClient::new(http, HeaderMap::new())?,
            base,
            config,
        })
    }

    /// URL GetFeatureInfo (WMS 1.3.0, EPSG:4326)
    pub fn feature_info_url(&self, query: &FeatureInfoQuery) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("QUERY_LAYERS", &self.config.layer)
            .append_pair("INFO_FORMAT", "application/json")
            .append_pair("REQUEST", "GetFeatureInfo")
            .append_pair("SERVICE", "WMS")
            .append_pair("VERSION", "1.3.0")
            .append_pair("FORMAT", "image/png")
            .append_pair("STYLES", "")
            .append_pair("TRANSPARENT", "true")
            .append_pair("LAYERS", &self.config.layer)
            .append_pair("FEATURE_COUNT", &self.config.feature_count.to_string())
            .append_pair("I", &query.i.to_string())
            .append_pair("J", &query.j.to_string())
            .append_pair("WIDTH", &query.width.to_string())
            .append_pair("HEIGHT", &query.height.to_string())
            .append_pair("CRS", "EPSG:4326")
            .append_pair("BBOX", &query.bounds.to_wms_bbox());
        url
    }
}

impl BuildingRegistry for BagClient {
    async fn feature_info(&self, query: &FeatureInfoQuery) -> Result<Vec<BuildingRecord>> {
        let body = self.http.get_text(SERVICE, self.feature_info_url(query)).await?;
        let buildings = parse_feature_info(&body)?;
        debug!(count = buildings.len(), "BAG features received");
        Ok(buildings)
    }
}
