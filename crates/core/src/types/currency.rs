//! ISO 4217 currency codes, display symbols, and minor-unit exponents.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Display symbols for the currencies the shop prices in.
///
/// Anything missing from this table is displayed as its uppercased code.
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("JPY", "¥"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("TTD", "TT$"),
    ("JMD", "J$"),
    ("BBD", "Bds$"),
    ("XCD", "EC$"),
    ("BZD", "BZ$"),
    ("GYD", "G$"),
    ("SRD", "Sr$"),
    ("CNY", "¥"),
    ("INR", "₹"),
    ("KRW", "₩"),
    ("BRL", "R$"),
    ("MXN", "Mex$"),
    ("CHF", "CHF"),
    ("SEK", "kr"),
    ("NOK", "kr"),
    ("DKK", "kr"),
    ("PLN", "zł"),
    ("CZK", "Kč"),
    ("HUF", "Ft"),
    ("RUB", "₽"),
    ("TRY", "₺"),
    ("ZAR", "R"),
    ("SGD", "S$"),
    ("HKD", "HK$"),
    ("NZD", "NZ$"),
    ("THB", "฿"),
    ("MYR", "RM"),
    ("PHP", "₱"),
    ("IDR", "Rp"),
    ("VND", "₫"),
];

/// Currencies whose symbol is written after the amount (`"12.00 kr"`).
const SYMBOL_AFTER: &[&str] = &["SEK", "NOK", "DKK", "PLN", "CZK", "HUF"];

/// Currencies without a minor unit.
const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

/// Currencies with three decimal places.
const THREE_DECIMAL: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// The input string is empty.
    #[error("currency code cannot be empty")]
    Empty,
    /// The input is not three ASCII letters.
    #[error("currency code must be three ASCII letters (got {0:?})")]
    Malformed(String),
}

/// A validated, uppercase ISO 4217 currency code.
///
/// The commerce backend sends codes in lowercase (`"usd"`); parsing
/// normalizes them so lookups are case-insensitive.
///
/// ```
/// use lather_core::CurrencyCode;
///
/// let code = CurrencyCode::parse("usd").unwrap();
/// assert_eq!(code.as_str(), "USD");
/// assert_eq!(code.symbol(), "$");
/// assert!(CurrencyCode::parse("dollars").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a currency code, accepting any letter case.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or is not exactly three ASCII
    /// letters after trimming.
    pub fn parse(s: &str) -> Result<Self, CurrencyError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CurrencyError::Empty);
        }
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyError::Malformed(s.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the uppercase code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol from the fixed table, or the code itself.
    #[must_use]
    pub fn symbol(&self) -> &str {
        CURRENCY_SYMBOLS
            .iter()
            .find(|(code, _)| *code == self.0)
            .map_or(self.0.as_str(), |(_, symbol)| symbol)
    }

    /// Whether the symbol-table formatters put the symbol after the amount.
    #[must_use]
    pub fn symbol_after(&self) -> bool {
        SYMBOL_AFTER.contains(&self.0.as_str())
    }

    /// Number of fractional digits in the currency's minor unit.
    #[must_use]
    pub fn minor_unit_digits(&self) -> u32 {
        let code = self.0.as_str();
        if ZERO_DECIMAL.contains(&code) {
            0
        } else if THREE_DECIMAL.contains(&code) {
            3
        } else {
            2
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Symbol for a raw currency code string.
///
/// Unknown codes (including malformed ones) fall back to the uppercased input.
#[must_use]
pub fn currency_symbol(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    CURRENCY_SYMBOLS
        .iter()
        .find(|(known, _)| *known == upper)
        .map_or(upper, |(_, symbol)| (*symbol).to_string())
}

/// Whether a raw currency code places its symbol after the amount.
#[must_use]
pub fn symbol_after(code: &str) -> bool {
    let upper = code.trim().to_ascii_uppercase();
    SYMBOL_AFTER.contains(&upper.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let code = CurrencyCode::parse(" eur ").unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert_eq!(code.to_string(), "EUR");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(CurrencyCode::parse(""), Err(CurrencyError::Empty));
        assert!(matches!(
            CurrencyCode::parse("US"),
            Err(CurrencyError::Malformed(_))
        ));
        assert!(matches!(
            CurrencyCode::parse("U$D"),
            Err(CurrencyError::Malformed(_))
        ));
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(CurrencyCode::parse("gbp").unwrap().symbol(), "£");
        assert_eq!(CurrencyCode::parse("TTD").unwrap().symbol(), "TT$");
        assert_eq!(CurrencyCode::parse("ISK").unwrap().symbol(), "ISK");
    }

    #[test]
    fn test_raw_symbol_fallback() {
        assert_eq!(currency_symbol("usd"), "$");
        assert_eq!(currency_symbol("xyz"), "XYZ");
        assert_eq!(currency_symbol(""), "");
    }

    #[test]
    fn test_symbol_after() {
        assert!(symbol_after("sek"));
        assert!(symbol_after("HUF"));
        assert!(!symbol_after("USD"));
        assert!(!CurrencyCode::parse("eur").unwrap().symbol_after());
    }

    #[test]
    fn test_minor_unit_digits() {
        assert_eq!(CurrencyCode::parse("JPY").unwrap().minor_unit_digits(), 0);
        assert_eq!(CurrencyCode::parse("KWD").unwrap().minor_unit_digits(), 3);
        assert_eq!(CurrencyCode::parse("USD").unwrap().minor_unit_digits(), 2);
    }

    #[test]
    fn test_serde_uses_parsed_form() {
        let code: CurrencyCode = serde_json::from_str("\"usd\"").unwrap();
        assert_eq!(code.as_str(), "USD");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"USD\"");
        assert!(serde_json::from_str::<CurrencyCode>("\"dollars\"").is_err());
    }
}
