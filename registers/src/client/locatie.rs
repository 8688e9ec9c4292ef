//! Client du Locatieserver PDOK (géocodage d'adresses)

use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::http::{HttpClient, HttpConfig};
use crate::error::{RegistryError, Result};
use crate::parser::locatie::{parse_docs, SERVICE};
use crate::registry::Geocoder;
use crate::types::AddressMatch;

/// Configuration du Locatieserver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatieConfig {
    /// Racine de l'API search v3_1
    pub base_url: String,
    /// Nombre de suggestions demandées
    pub rows: u32,
}

impl Default for LocatieConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pdok.nl/bzk/locatieserver/search/v3_1/".into(),
            rows: 10,
        }
    }
}

impl LocatieConfig {
    /// Surcharge depuis les variables d'environnement
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LOCATIESERVER_URL") {
            self.base_url = url;
        }
    }
}

/// Client suggest / lookup
#[derive(Debug, Clone)]
pub struct LocatieClient {
    http: HttpClient,
    root: Url,
    config: LocatieConfig,
}

impl LocatieClient {
    pub fn new(config: LocatieConfig, http: &HttpConfig) -> Result<Self> {
        // Le slash final garde le dernier segment lors des `join`
        let base = if config.base_url.ends_with('/') {
            config.base_url.clone()
        } else {
            format!("{}/", config.base_url)
        };
        let root = Url::parse(&base)
            .map_err(|e| RegistryError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        Ok(Self {
            http: HttpClient::new(http, HeaderMap::new())?,
            root,
            config,
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.root
            .join(name)
            .map_err(|e| RegistryError::InvalidUrl(format!("{name}: {e}")))
    }

    pub fn suggest_url(&self, query: &str) -> Result<Url> {
        let mut url = self.endpoint("suggest")?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("fq", "type:adres")
            .append_pair("rows", &self.config.rows.to_string());
        Ok(url)
    }

    pub fn lookup_url(&self, id: &str) -> Result<Url> {
        let mut url = self.endpoint("lookup")?;
        url.query_pairs_mut().append_pair("id", id);
        Ok(url)
    }
}

impl Geocoder for LocatieClient {
    async fn suggest_addresses(&self, query: &str) -> Result<Vec<AddressMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RegistryError::rejected("Enter an address to search"));
        }
        let body = self.http.get_text(SERVICE, self.suggest_url(query)?).await?;
        parse_docs(&body)
    }

    async fn lookup_address(&self, id: &str) -> Result<Option<AddressMatch>> {
        let body = self.http.get_text(SERVICE, self.lookup_url(id)?).await?;
        Ok(parse_docs(&body)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let client = LocatieClient::new(
            LocatieConfig {
                base_url: "https://api.pdok.nl/bzk/locatieserver/search/v3_1".into(),
                rows: 10,
            },
            &HttpConfig::default(),
        )
        .unwrap();

        let url = client.suggest_url("Damrak 1 Amsterdam").unwrap();
        assert_eq!(url.path(), "/bzk/locatieserver/search/v3_1/suggest");
        assert!(url.query().unwrap().contains("fq=type%3Aadres"));
        assert!(url.query().unwrap().contains("rows=10"));

        let url = client.lookup_url("adr-123").unwrap();
        assert_eq!(url.path(), "/bzk/locatieserver/search/v3_1/lookup");
        assert_eq!(url.query(), Some("id=adr-123"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let client = LocatieClient::new(LocatieConfig::default(), &HttpConfig::default()).unwrap();
        assert!(client.suggest_addresses("   ").await.is_err());
    }
}
