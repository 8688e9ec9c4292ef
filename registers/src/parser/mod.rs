//! Parsers des réponses des registres
//!
//! Une fonction de parsing par forme de réponse. Les champs optionnels
//! absents sont remplacés par [`UNKNOWN`](crate::types::UNKNOWN) ici,
//! jamais au moment de l'affichage.

pub mod bag;
pub mod kvk;
pub mod locatie;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RegistryError, Result};
use crate::types::UNKNOWN;

/// Vérifie que le corps ressemble à du JSON avant de le parser
///
/// Les services renvoient parfois une page d'erreur HTML avec un statut 200.
pub fn sniff_json<'a>(service: &'static str, body: &'a str) -> Result<&'a str> {
    let trimmed = body.trim_start();
    if trimmed.is_empty() {
        return Err(RegistryError::malformed(service, "empty response body"));
    }
    if trimmed.starts_with('<') {
        return Err(RegistryError::malformed(
            service,
            "HTML returned where JSON was expected",
        ));
    }
    Ok(trimmed)
}

/// Décode un corps JSON après vérification du contenu
pub fn decode<T: DeserializeOwned>(service: &'static str, body: &str) -> Result<T> {
    let json = sniff_json(service, body)?;
    serde_json::from_str(json).map_err(|e| RegistryError::malformed(service, e.to_string()))
}

/// Texte d'une valeur JSON scalaire (None si null ou vide)
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Nombre depuis une valeur JSON (accepte les chaînes numériques)
pub(crate) fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Texte ou valeur par défaut
pub(crate) fn text_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(value_text)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_sniff_html() {
        let err = sniff_json("BAG WMS", "  <html><body>Error</body></html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_sniff_empty() {
        assert!(sniff_json("BAG WMS", "   \n").is_err());
        assert_eq!(sniff_json("BAG WMS", "\n{}").unwrap(), "{}");
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode::<Value>("OpenKVK", "{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("  abc ")), Some("abc".to_string()));
        assert_eq!(value_text(&json!("")), None);
        assert_eq!(value_text(&json!(null)), None);
        assert_eq!(value_text(&json!(1930)), Some("1930".to_string()));
        assert_eq!(value_text(&json!([])), None);
    }

    #[test]
    fn test_value_f64() {
        assert_eq!(value_f64(&json!("52.37")), Some(52.37));
        assert_eq!(value_f64(&json!(4.89)), Some(4.89));
        assert_eq!(value_f64(&json!("n/a")), None);
    }
}
