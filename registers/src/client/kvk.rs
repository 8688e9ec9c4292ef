//! Client OpenKVK (api.overheid.io)
//!
//! Chaque appel est facturé : la clé API part en paramètre et en en-tête,
//! les suggestions sont bornées en longueur de saisie et en nombre.

use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::http::{env_parse, HttpClient, HttpConfig};
use crate::error::{RegistryError, Result};
use crate::parser::kvk::{
    parse_company, parse_company_list, parse_radius, parse_suggestions, CompanyStub, SERVICE,
};
use crate::registry::CompanyRegistry;
use crate::types::{CompanyRecord, CompanySuggestion, GeoPoint};

const API_KEY_PARAM: &str = "ovio-api-key";

/// Champs demandés à la recherche par rayon
const RADIUS_FIELDS: &[&str] = &[
    "rechtsvormCode",
    "vestigingsnummer",
    "kvkNummer",
    "activiteiten.omschrijving",
    "activiteiten.code",
    "activiteiten.hoofdactiviteit",
    "vestiging",
    "kvknummer",
    "pand_id",
    "updated_at",
    "actief",
    "rechtsvormOmschrijving",
    "activiteitomschrijving",
    "website",
    "vbo_id",
    "locatie.lon",
    "locatie.lat",
    "huidigeHandelsNamen",
    "naam",
    "bezoeklocatie.plaats",
    "bezoeklocatie.straat",
    "bezoeklocatie.huisnummer",
    "bezoeklocatie.postcode",
    "bezoeklocatie.land",
    "non_mailing_indicatie",
    "subdossiernummer",
    "postlocatie",
    "sbi",
    "inschrijvingstype",
    "_links.self.href",
];

/// Configuration OpenKVK
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KvkConfig {
    /// Racine de l'API overheid.io
    pub base_url: String,
    /// Clé API (paramètre `ovio-api-key` et en-tête du même nom)
    pub api_key: String,
    /// Nombre maximal de suggestions renvoyées
    pub max_search_results: usize,
    /// Longueur minimale d'une saisie avant appel
    pub min_search_length: usize,
    /// Fiches complètes récupérées en parallèle pour un pand
    pub detail_concurrency: usize,
}

impl Default for KvkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.overheid.io".into(),
            api_key: String::new(),
            max_search_results: 5,
            min_search_length: 3,
            detail_concurrency: 4,
        }
    }
}

impl KvkConfig {
    /// Surcharge depuis les variables d'environnement
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OVIO_API_KEY") {
            self.api_key = key;
        }
        if let Ok(url) = std::env::var("OPENKVK_BASE_URL") {
            self.base_url = url;
        }
        if let Some(v) = env_parse("KVK_MAX_RESULTS") {
            self.max_search_results = v;
        }
        if let Some(v) = env_parse("KVK_MIN_QUERY_LENGTH") {
            self.min_search_length = v;
        }
    }
}

/// Client OpenKVK
#[derive(Debug, Clone)]
pub struct KvkClient {
    http: HttpClient,
    root: Url,
    config: KvkConfig,
}

impl KvkClient {
    pub fn new(config: KvkConfig, http: &HttpConfig) -> Result<Self> {
        let root = Url::parse(&config.base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| RegistryError::InvalidUrl("API key is not a valid header value".into()))?;
        headers.insert(API_KEY_PARAM, key);

        if config.api_key.is_empty() {
            warn!("No OpenKVK API key configured (OVIO_API_KEY), requests will be refused");
        }

        Ok(Self {
            http: HttpClient::new(http, headers)?,
            root,
            config,
        })
    }

    pub fn config(&self) -> &KvkConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.root
            .join(path)
            .map_err(|e| RegistryError::InvalidUrl(format!("{path}: {e}")))
    }

    fn with_key(&self, mut url: Url) -> Url {
        url.query_pairs_mut()
            .append_pair(API_KEY_PARAM, &self.config.api_key);
        url
    }

    /// URL de la liste filtrée par pand
    pub fn building_url(&self, building_id: &str) -> Result<Url> {
        let mut url = self.endpoint("/v3/openkvk")?;
        url.query_pairs_mut()
            .append_pair("filters[pand_id]", building_id);
        Ok(self.with_key(url))
    }

    /// URL suggest, la saisie devient un segment de chemin encodé
    pub fn suggest_url(&self, query: &str) -> Result<Url> {
        let mut url = self.endpoint("/v3/suggest/openkvk")?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.config.base_url.clone()))?
            .push(query);
        Ok(self.with_key(url))
    }

    /// URL de recherche par rayon avec projection des champs
    pub fn radius_url(&self, center: GeoPoint, radius_m: u32) -> Result<Url> {
        let mut url = self.endpoint("/v3/geo/openkvk/radius")?;
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidUrl(self.config.base_url.clone()))?
            .push(&center.lat.to_string())
            .push(&center.lon.to_string())
            .push(&radius_m.to_string());
        {
            let mut pairs = url.query_pairs_mut();
            for field in RADIUS_FIELDS {
                pairs.append_pair("fields[]", field);
            }
        }
        Ok(self.with_key(url))
    }

    /// URL d'une fiche complète ; le lien doit rester sur l'hôte de l'API
    pub fn detail_url(&self, link: &str) -> Result<Url> {
        let url = self.endpoint(link)?;
        if url.host_str() != self.root.host_str() {
            return Err(RegistryError::InvalidUrl(format!(
                "detail link points outside the API: {link}"
            )));
        }
        Ok(self.with_key(url))
    }

    /// Résout une fiche abrégée : fiche complète si un lien existe
    async fn resolve_stub(&self, stub: CompanyStub, building_id: &str) -> CompanyRecord {
        let mut company = match &stub.link {
            Some(link) => match self.details(link).await {
                Ok(company) => company,
                Err(e) => {
                    warn!(link = %link, error = %e, "Company details unavailable, using summary");
                    stub.to_record()
                }
            },
            None => stub.to_record(),
        };
        if company.building_id.is_none() {
            company.building_id = Some(building_id.to_string());
        }
        company
    }
}

impl CompanyRegistry for KvkClient {
    async fn companies_in_building(&self, building_id: &str) -> Result<Vec<CompanyRecord>> {
        let body = self
            .http
            .get_text(SERVICE, self.building_url(building_id)?)
            .await?;
        let stubs = parse_company_list(&body)?;

        if stubs.is_empty() {
            debug!(building_id, "No companies registered in building");
            return Ok(Vec::new());
        }

        let companies: Vec<CompanyRecord> = stream::iter(stubs)
            .map(|stub| self.resolve_stub(stub, building_id))
            .buffered(self.config.detail_concurrency.max(1))
            .collect()
            .await;

        info!(building_id, count = companies.len(), "Companies resolved");
        Ok(companies)
    }

    async fn suggest(&self, query: &str) -> Result<Vec<CompanySuggestion>> {
        let query = query.trim();
        if query.chars().count() < self.config.min_search_length {
            return Err(RegistryError::rejected(format!(
                "Query must be at least {} characters",
                self.config.min_search_length
            )));
        }

        let body = self.http.get_text(SERVICE, self.suggest_url(query)?).await?;
        let suggestions = parse_suggestions(&body, self.config.max_search_results)?;
        debug!(
            query,
            count = suggestions.len(),
            max = self.config.max_search_results,
            "Suggestions received"
        );
        Ok(suggestions)
    }

    async fn within_radius(&self, center: GeoPoint, radius_m: u32) -> Result<Vec<CompanyRecord>> {
        let body = self
            .http
            .get_text(SERVICE, self.radius_url(center, radius_m)?)
            .await?;
        parse_radius(&body)
    }

    async fn details(&self, link: &str) -> Result<CompanyRecord> {
        let body = self.http.get_text(SERVICE, self.detail_url(link)?).await?;
        parse_company(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn client() -> KvkClient {
        let config = KvkConfig {
            api_key: "test-key".into(),
            ..Default::default()
        };
        KvkClient::new(config, &HttpConfig::default()).unwrap()
    }

    fn param(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn test_building_url() {
        let url = client().building_url("0363100012345678").unwrap();
        assert_eq!(url.path(), "/v3/openkvk");
        assert_eq!(
            param(&url, "filters[pand_id]").as_deref(),
            Some("0363100012345678")
        );
        assert_eq!(param(&url, API_KEY_PARAM).as_deref(), Some("test-key"));
    }

    #[test]
    fn test_suggest_url_encodes_query() {
        let url = client().suggest_url("bakker & zn").unwrap();
        assert_eq!(url.path(), "/v3/suggest/openkvk/bakker%20&%20zn");
        assert_eq!(param(&url, API_KEY_PARAM).as_deref(), Some("test-key"));
    }

    #[test]
    fn test_radius_url() {
        let url = client()
            .radius_url(GeoPoint::new(52.09, 5.12), 500)
            .unwrap();
        assert_eq!(url.path(), "/v3/geo/openkvk/radius/52.09/5.12/500");
        let fields = url.query_pairs().filter(|(k, _)| k == "fields[]").count();
        assert_eq!(fields, RADIUS_FIELDS.len());
    }

    #[test]
    fn test_detail_url_stays_on_api_host() {
        let c = client();
        let url = c.detail_url("/v3/openkvk/hoofdvestiging-12345678").unwrap();
        assert_eq!(url.host_str(), Some("api.overheid.io"));
        assert!(c.detail_url("https://evil.example.com/steal").is_err());
    }

    #[tokio::test]
    async fn test_short_query_rejected_without_network() {
        let err = client().suggest("ab").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputRejected);

        let err = client().suggest("  a  ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputRejected);
    }
}
