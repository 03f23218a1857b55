//! Lenient deserializers for backend JSON.
//!
//! The commerce backend omits fields, sends `null` for empty collections,
//! and occasionally serializes numbers as strings. These helpers let a
//! single malformed field degrade to a default instead of failing the whole
//! document.

use serde::{Deserialize, Deserializer};

/// Treat `null` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a JSON number or a numeric string; anything else is `None`.
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|a| a.is_finite()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::lenient_amount")]
        amount: Option<f64>,
        #[serde(default, deserialize_with = "super::null_as_default")]
        tags: Vec<String>,
    }

    #[test]
    fn test_lenient_amount_accepts_numbers_and_strings() {
        let p: Probe = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(p.amount, Some(12.5));
        let p: Probe = serde_json::from_str(r#"{"amount": "7"}"#).unwrap();
        assert_eq!(p.amount, Some(7.0));
    }

    #[test]
    fn test_lenient_amount_degrades_to_none() {
        let p: Probe = serde_json::from_str(r#"{"amount": {"oops": 1}}"#).unwrap();
        assert_eq!(p.amount, None);
        let p: Probe = serde_json::from_str(r#"{"amount": "n/a"}"#).unwrap();
        assert_eq!(p.amount, None);
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.amount, None);
    }

    #[test]
    fn test_null_collection_is_empty() {
        let p: Probe = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(p.tags.is_empty());
    }
}
