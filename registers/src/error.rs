//! Types d'erreurs pour le crate registers

use thiserror::Error;

/// Catégorie d'erreur, utilisée par la couche de présentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Échec réseau ou réponse HTTP non-succès
    Network,
    /// Réponse illisible (HTML à la place du JSON, JSON invalide)
    Malformed,
    /// Entrée refusée côté client, aucun appel réseau
    InputRejected,
}

/// Erreurs pouvant survenir lors d'un appel à un registre
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Erreur de transport (connexion, timeout, TLS)
    #[error("HTTP error from {service}: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Réponse HTTP avec un statut non-succès
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    /// Réponse qui ne peut pas être interprétée
    #[error("{service} returned an unexpected format: {reason}")]
    MalformedResponse {
        service: &'static str,
        reason: String,
    },

    /// Requête refusée avant tout appel réseau
    #[error("Input rejected: {0}")]
    InputRejected(String),

    /// URL de requête invalide (configuration)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl RegistryError {
    /// Crée une erreur de transport avec contexte
    pub fn http(service: &'static str, source: reqwest::Error) -> Self {
        Self::Http { service, source }
    }

    /// Crée une erreur de réponse malformée
    pub fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service,
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'entrée refusée
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::InputRejected(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { .. } | Self::Status { .. } | Self::InvalidUrl(_) => ErrorKind::Network,
            Self::MalformedResponse { .. } => ErrorKind::Malformed,
            Self::InputRejected(_) => ErrorKind::InputRejected,
        }
    }

    /// Message lisible destiné à l'utilisateur final
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { service, .. } => format!("Could not reach {service}"),
            Self::Status { service, status } => {
                format!("{service} request failed (HTTP {status})")
            }
            Self::MalformedResponse { service, .. } => {
                format!("{service}: server returned unexpected format")
            }
            Self::InputRejected(reason) => reason.clone(),
            Self::InvalidUrl(_) => "Registry is misconfigured".to_string(),
        }
    }
}

/// Alias de résultat pour les appels aux registres
pub type Result<T> = std::result::Result<T, RegistryError>;
