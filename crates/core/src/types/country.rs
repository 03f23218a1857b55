//! Storefront country codes.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    #[error("country code must be exactly two letters")]
    Length,
    #[error("country code must contain only ASCII letters")]
    NotAlphabetic,
}

/// An ISO 3166-1 alpha-2 country code, stored lowercase.
///
/// Every storefront URL starts with one, and it is echoed back into redirect
/// targets, so nothing but two ASCII letters is accepted.
///
/// ```
/// use lather_core::CountryCode;
///
/// let code = CountryCode::parse("DK").unwrap();
/// assert_eq!(code.as_str(), "dk");
///
/// assert!(CountryCode::parse("usa").is_err());
/// assert!(CountryCode::parse("//").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse and lowercase a country code.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly two ASCII letters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        if s.len() != 2 {
            return Err(CountryCodeError::Length);
        }
        if !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(CountryCodeError::NotAlphabetic);
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        assert_eq!(CountryCode::parse("US").unwrap().as_str(), "us");
        assert_eq!("Fr".parse::<CountryCode>().unwrap().to_string(), "fr");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(CountryCode::parse(""), Err(CountryCodeError::Length));
        assert_eq!(CountryCode::parse("usa"), Err(CountryCodeError::Length));
        assert_eq!(
            CountryCode::parse("//evil.example"),
            Err(CountryCodeError::Length)
        );
    }

    #[test]
    fn test_parse_rejects_non_letters() {
        assert_eq!(CountryCode::parse("//"), Err(CountryCodeError::NotAlphabetic));
        assert_eq!(CountryCode::parse("u\n"), Err(CountryCodeError::NotAlphabetic));
        assert_eq!(CountryCode::parse("1a"), Err(CountryCodeError::NotAlphabetic));
        // Two bytes, one char.
        assert_eq!(CountryCode::parse("é"), Err(CountryCodeError::NotAlphabetic));
    }

    #[test]
    fn test_deserialize_validates() {
        let code: CountryCode = serde_json::from_str(r#""DE""#).unwrap();
        assert_eq!(code.as_str(), "de");
        assert!(serde_json::from_str::<CountryCode>(r#""d/""#).is_err());
    }
}
