//! Client HTTP partagé avec retry sur erreurs transitoires

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};

/// Options du client HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout par requête (secondes)
    pub timeout_secs: u64,
    /// Nombre de retries sur timeout / erreur de connexion
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 2,
        }
    }
}

impl HttpConfig {
    /// Surcharge depuis les variables d'environnement
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("HTTP_TIMEOUT_SECS") {
            self.timeout_secs = v;
        }
        if let Some(v) = env_parse("HTTP_MAX_RETRIES") {
            self.max_retries = v;
        }
    }
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Client HTTP GET renvoyant le corps texte des réponses en succès
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Crée un client HTTP
    pub fn new(config: &HttpConfig, default_headers: HeaderMap) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| RegistryError::http("HTTP client", e))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
        })
    }

    /// GET JSON : renvoie le corps brut, à passer aux parsers
    pub async fn get_text(&self, service: &'static str, url: Url) -> Result<String> {
        debug!(service, url = %redact(&url), "GET");

        let request = self.client.get(url).header(ACCEPT, "application/json");
        let response = self
            .execute_with_retry(request)
            .await
            .map_err(|e| RegistryError::http(service, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                service,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RegistryError::http(service, e))
    }

    /// Exécute une requête avec backoff exponentiel
    async fn execute_with_retry(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<Response, reqwest::Error> {
        let mut attempt = 0;

        loop {
            let Some(cloned) = request.try_clone() else {
                return request.send().await;
            };

            match cloned.send().await {
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_timeout() || e.is_connect()) && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                    warn!(attempt, error = %e, "Transient HTTP error, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// URL sans la clé API, pour les logs
pub(crate) fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "ovio-api-key")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean.to_string()
}
