//! Currency-aware money formatting.
//!
//! Amounts arrive from the commerce backend as plain JSON numbers, and the
//! unit of those numbers (minor vs. major) is not self-describing. Callers
//! pin the unit with [`AmountUnit`]; the heuristic policy exists because
//! some product views were written against backends that sent cents.
//!
//! All functions here are total: any input, including `None`, `NaN`,
//! infinities, negative amounts, and empty or garbage currency codes,
//! produces a string.

use core::fmt;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::currency::{CurrencyCode, currency_symbol, symbol_after};
use super::locale::{EN_US, NBSP, NumberLocale, SymbolPosition, group_digits};

/// Currency used by the symbol-table formatters when none is given.
const FALLBACK_CURRENCY: &str = "USD";

/// The unit raw backend amounts are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    /// Amounts are already in the display unit (dollars).
    #[default]
    Major,
    /// Amounts are in the minor unit (cents).
    Minor,
    /// Amounts `>= 1000` are cents, smaller amounts are dollars.
    Heuristic,
}

impl AmountUnit {
    /// Amounts at or above this value are treated as minor units by
    /// [`AmountUnit::Heuristic`].
    pub const HEURISTIC_THRESHOLD: f64 = 1000.0;

    /// Convert a raw amount into the major unit.
    #[must_use]
    pub fn to_major(self, amount: f64) -> f64 {
        match self {
            Self::Major => amount,
            Self::Minor => amount / 100.0,
            Self::Heuristic if amount >= Self::HEURISTIC_THRESHOLD => amount / 100.0,
            Self::Heuristic => amount,
        }
    }

    fn normalize(self, amount: Amount) -> Amount {
        let threshold = Decimal::from(1000);
        match amount {
            Amount::Exact(value) => Amount::Exact(match self {
                Self::Major => value,
                Self::Minor => value / Decimal::ONE_HUNDRED,
                Self::Heuristic if value >= threshold => value / Decimal::ONE_HUNDRED,
                Self::Heuristic => value,
            }),
            Amount::Approx(value) => Amount::Approx(self.to_major(value)),
        }
    }
}

/// A finite amount, kept exact when it fits in a [`Decimal`].
///
/// Values beyond `Decimal`'s range (about 7.9e28) are still rendered, from
/// the `f64`, rather than collapsing to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Amount {
    Exact(Decimal),
    Approx(f64),
}

impl Amount {
    /// Missing and non-finite amounts are zero.
    fn from_f64(amount: Option<f64>) -> Self {
        match finite(amount) {
            None => Self::Exact(Decimal::ZERO),
            Some(value) => Decimal::from_f64(value).map_or(Self::Approx(value), Self::Exact),
        }
    }
}

impl fmt::Display for AmountUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

impl std::str::FromStr for AmountUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" | "cents" => Ok(Self::Minor),
            "heuristic" | "auto" => Ok(Self::Heuristic),
            other => Err(format!("invalid amount unit: {other}")),
        }
    }
}

/// Formats amounts for one locale under one amount-unit policy.
///
/// Cheap to copy; the storefront builds one from configuration and hands it
/// to every view conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyFormatter {
    locale: &'static NumberLocale,
    unit: AmountUnit,
}

impl Default for MoneyFormatter {
    fn default() -> Self {
        Self {
            locale: &EN_US,
            unit: AmountUnit::Major,
        }
    }
}

impl MoneyFormatter {
    /// Create a formatter for a locale tag (unknown tags use `en-US`).
    #[must_use]
    pub fn new(locale: &str, unit: AmountUnit) -> Self {
        Self {
            locale: NumberLocale::lookup(locale),
            unit,
        }
    }

    /// Format a raw backend amount, normalizing it with the unit policy first.
    #[must_use]
    pub fn format(&self, amount: Option<f64>, currency_code: &str) -> String {
        let major = finite(amount).map(|a| self.unit.to_major(a));
        format_with_locale(major, currency_code, self.locale)
    }

    /// Format with the `>= 1000 is cents` heuristic regardless of the policy.
    #[must_use]
    pub fn format_heuristic(&self, amount: Option<f64>, currency_code: &str) -> String {
        format_heuristic(amount, currency_code)
    }
}

/// Locale-aware currency formatting of a major-unit amount.
///
/// - `None`/`NaN`/infinite amounts format as zero in the currency, or `"0"`
///   when the currency code is empty or invalid.
/// - Without a valid currency code the amount is rendered as a plain number.
/// - Fraction digits follow the currency's minor unit (`JPY` has none).
///
/// ```
/// use lather_core::format_money;
///
/// assert_eq!(format_money(Some(1234.5), "usd", "en-US"), "$1,234.50");
/// assert_eq!(format_money(Some(f64::NAN), "USD", "en-US"), "$0.00");
/// assert_eq!(format_money(Some(100.0), "", "en-US"), "100");
/// ```
#[must_use]
pub fn format_money(amount: Option<f64>, currency_code: &str, locale: &str) -> String {
    format_with_locale(finite(amount), currency_code, NumberLocale::lookup(locale))
}

fn format_with_locale(amount: Option<f64>, currency_code: &str, locale: &NumberLocale) -> String {
    let Ok(code) = CurrencyCode::parse(currency_code) else {
        return amount.map_or_else(|| "0".to_string(), plain_number);
    };

    let (negative, body) = render_number(
        Amount::from_f64(amount),
        code.minor_unit_digits(),
        locale.group,
        locale.decimal,
    );
    let sign = if negative { "-" } else { "" };
    let symbol = code.symbol();

    match locale.symbol_position {
        SymbolPosition::Prefix => {
            // Alphabetic symbols ("CHF") always need a gap before the digits.
            let spaced = locale.symbol_spaced
                || symbol.chars().last().is_some_and(char::is_alphabetic);
            if spaced {
                format!("{sign}{symbol}{NBSP}{body}")
            } else {
                format!("{sign}{symbol}{body}")
            }
        }
        SymbolPosition::Suffix => format!("{sign}{body}{NBSP}{symbol}"),
    }
}

/// Format a raw amount, guessing its unit from its magnitude.
///
/// Amounts `>= 1000` are divided by 100; smaller amounts are taken as-is.
/// Output always has two fraction digits, `en-US` grouping, and a symbol from
/// the fixed table placed before the amount (or after it, separated by a
/// space, for the Nordic and Central European currencies). An empty currency
/// code is treated as `USD`.
///
/// ```
/// use lather_core::format_heuristic;
///
/// assert_eq!(format_heuristic(Some(5000.0), "USD"), "$50.00");
/// assert_eq!(format_heuristic(Some(25.99), "USD"), "$25.99");
/// assert_eq!(format_heuristic(Some(12000.0), "sek"), "120.00 kr");
/// ```
#[must_use]
pub fn format_heuristic(amount: Option<f64>, currency_code: &str) -> String {
    let raw = Amount::from_f64(amount);
    symbol_table_format(AmountUnit::Heuristic.normalize(raw), currency_code, 2)
}

/// Format a raw amount that is known to be in minor units.
#[must_use]
pub fn format_minor_units(amount: Option<f64>, currency_code: &str) -> String {
    let raw = Amount::from_f64(amount);
    symbol_table_format(AmountUnit::Minor.normalize(raw), currency_code, 2)
}

/// Re-render an already formatted price with the symbol for `currency_code`.
///
/// The numeric value is extracted by dropping everything except digits, `.`
/// and `-`. Whole numbers lose their decimals. Text that does not contain a
/// parseable number comes back unchanged, as does any input when either
/// argument is empty.
#[must_use]
pub fn reformat_price_string(price: &str, currency_code: &str) -> String {
    if price.is_empty() || currency_code.trim().is_empty() {
        return price.to_string();
    }

    let numeric: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let Some(value) = numeric.parse::<f64>().ok().filter(|v| v.is_finite()) else {
        return price.to_string();
    };

    let digits = if value.fract() == 0.0 { 0 } else { 2 };
    symbol_table_format(Amount::from_f64(Some(value)), currency_code, digits)
}

fn symbol_table_format(value: Amount, currency_code: &str, digits: u32) -> String {
    let code = if currency_code.trim().is_empty() {
        FALLBACK_CURRENCY
    } else {
        currency_code
    };

    let (negative, body) = render_number(value, digits, EN_US.group, EN_US.decimal);
    let sign = if negative { "-" } else { "" };
    let symbol = currency_symbol(code);

    if symbol_after(code) {
        format!("{sign}{body} {symbol}")
    } else {
        format!("{sign}{symbol}{body}")
    }
}

/// Round half away from zero to `digits` places and lay out the absolute
/// value with the given separators. Returns whether the rounded value is
/// negative.
fn render_number(value: Amount, digits: u32, group: char, decimal: char) -> (bool, String) {
    let (negative, text) = match value {
        Amount::Exact(value) => {
            let mut rounded =
                value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            let negative = rounded.is_sign_negative() && !rounded.is_zero();
            rounded = rounded.abs();
            rounded.rescale(digits);
            (negative, rounded.to_string())
        }
        Amount::Approx(value) => {
            let precision = usize::try_from(digits).unwrap_or(2);
            (value < 0.0, format!("{:.precision$}", value.abs()))
        }
    };

    let (integer, fraction) = text
        .split_once('.')
        .map_or((text.as_str(), None), |(i, f)| (i, Some(f)));

    let mut out = group_digits(integer, group);
    if let Some(fraction) = fraction {
        out.push(decimal);
        out.push_str(fraction);
    }
    (negative, out)
}

fn plain_number(amount: f64) -> String {
    if amount == 0.0 {
        "0".to_string()
    } else {
        format!("{amount}")
    }
}

fn finite(amount: Option<f64>) -> Option<f64> {
    amount.filter(|a| a.is_finite())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_en_us() {
        assert_eq!(format_money(Some(1234.5), "usd", "en-US"), "$1,234.50");
        assert_eq!(format_money(Some(0.5), "USD", "en-US"), "$0.50");
        assert_eq!(format_money(Some(1_000_000.0), "gbp", "en-US"), "£1,000,000.00");
    }

    #[test]
    fn test_format_money_missing_amount_is_zero() {
        assert_eq!(format_money(None, "USD", "en-US"), "$0.00");
        assert_eq!(format_money(Some(f64::NAN), "USD", "en-US"), "$0.00");
        assert_eq!(format_money(Some(f64::INFINITY), "EUR", "en-US"), "€0.00");
        assert!(!format_money(Some(f64::NAN), "USD", "en-US").contains("NaN"));
    }

    #[test]
    fn test_format_money_without_currency_is_plain() {
        assert_eq!(format_money(Some(100.0), "", "en-US"), "100");
        assert_eq!(format_money(Some(25.5), "", "en-US"), "25.5");
        assert_eq!(format_money(None, "", "en-US"), "0");
        assert_eq!(format_money(Some(f64::NAN), "", "en-US"), "0");
    }

    #[test]
    fn test_format_money_invalid_currency_is_plain() {
        assert_eq!(format_money(Some(42.0), "dollars", "en-US"), "42");
        assert_eq!(format_money(None, "$$", "en-US"), "0");
    }

    #[test]
    fn test_format_money_negative() {
        assert_eq!(format_money(Some(-5.0), "USD", "en-US"), "-$5.00");
        assert_eq!(format_money(Some(-0.001), "USD", "en-US"), "$0.00");
    }

    #[test]
    fn test_format_money_minor_unit_digits() {
        assert_eq!(format_money(Some(1234.5), "JPY", "en-US"), "¥1,235");
        assert_eq!(format_money(Some(1.2346), "KWD", "en-US"), "KWD\u{a0}1.235");
    }

    #[test]
    fn test_format_money_alphabetic_symbol_is_spaced() {
        assert_eq!(format_money(Some(10.0), "CHF", "en-US"), "CHF\u{a0}10.00");
        assert_eq!(format_money(Some(10.0), "XYZ", "en-US"), "XYZ\u{a0}10.00");
    }

    #[test]
    fn test_format_money_other_locales() {
        assert_eq!(
            format_money(Some(1234.56), "EUR", "de-DE"),
            "1.234,56\u{a0}€"
        );
        assert_eq!(
            format_money(Some(1234.56), "SEK", "sv-SE"),
            "1\u{a0}234,56\u{a0}kr"
        );
        assert_eq!(
            format_money(Some(1234.56), "EUR", "nl-NL"),
            "€\u{a0}1.234,56"
        );
        assert_eq!(format_money(Some(1234.56), "USD", "xx"), "$1,234.56");
    }

    #[test]
    fn test_heuristic_divides_large_amounts() {
        assert_eq!(format_heuristic(Some(5000.0), "USD"), "$50.00");
        assert_eq!(format_heuristic(Some(1000.0), "usd"), "$10.00");
        assert_eq!(format_heuristic(Some(250_000.0), "USD"), "$2,500.00");
    }

    #[test]
    fn test_heuristic_keeps_small_amounts() {
        assert_eq!(format_heuristic(Some(25.99), "USD"), "$25.99");
        assert_eq!(format_heuristic(Some(999.0), "EUR"), "€999.00");
    }

    #[test]
    fn test_heuristic_symbol_placement_and_fallbacks() {
        assert_eq!(format_heuristic(Some(12000.0), "sek"), "120.00 kr");
        assert_eq!(format_heuristic(Some(50.0), "TTD"), "TT$50.00");
        assert_eq!(format_heuristic(Some(50.0), "abc"), "ABC50.00");
        assert_eq!(format_heuristic(None, ""), "$0.00");
        assert_eq!(format_heuristic(Some(f64::NAN), "GBP"), "£0.00");
        assert_eq!(format_heuristic(Some(-20.0), "USD"), "-$20.00");
    }

    #[test]
    fn test_format_minor_units() {
        assert_eq!(format_minor_units(Some(1999.0), "usd"), "$19.99");
        assert_eq!(format_minor_units(Some(50.0), "usd"), "$0.50");
        assert_eq!(format_minor_units(Some(250_000.0), "PLN"), "2,500.00 zł");
    }

    #[test]
    fn test_reformat_price_string() {
        assert_eq!(reformat_price_string("$1,234.50", "EUR"), "€1,234.50");
        assert_eq!(reformat_price_string("$12", "SEK"), "12 kr");
        assert_eq!(reformat_price_string("12.00 USD", "GBP"), "£12");
        assert_eq!(reformat_price_string("free", "USD"), "free");
        assert_eq!(reformat_price_string("", "USD"), "");
        assert_eq!(reformat_price_string("$5.00", ""), "$5.00");
    }

    #[test]
    fn test_amounts_beyond_decimal_range_are_not_zeroed() {
        let huge = format_money(Some(1e29), "USD", "en-US");
        assert!(huge.starts_with("$99,999,999,999,999,991,"), "{huge}");
        assert!(huge.ends_with(".00"));

        let huge = format_heuristic(Some(1e30), "USD");
        assert!(huge.starts_with('$') && huge.len() > 30, "{huge}");
        assert_ne!(huge, "$0.00");

        assert!(format_minor_units(Some(-1e31), "usd").starts_with("-$"));
        let reformatted = reformat_price_string("$100000000000000000000000000000", "EUR");
        assert!(reformatted.starts_with("€99,999,999,"), "{reformatted}");
    }

    #[test]
    fn test_amount_unit_to_major() {
        assert!((AmountUnit::Major.to_major(5000.0) - 5000.0).abs() < f64::EPSILON);
        assert!((AmountUnit::Minor.to_major(25.0) - 0.25).abs() < f64::EPSILON);
        assert!((AmountUnit::Heuristic.to_major(5000.0) - 50.0).abs() < f64::EPSILON);
        assert!((AmountUnit::Heuristic.to_major(25.99) - 25.99).abs() < f64::EPSILON);
    }

    #[test]
    fn test_amount_unit_parse() {
        assert_eq!("major".parse::<AmountUnit>().unwrap(), AmountUnit::Major);
        assert_eq!("Cents".parse::<AmountUnit>().unwrap(), AmountUnit::Minor);
        assert_eq!("auto".parse::<AmountUnit>().unwrap(), AmountUnit::Heuristic);
        assert!("pennies".parse::<AmountUnit>().is_err());
        assert_eq!(AmountUnit::Heuristic.to_string(), "heuristic");
    }

    #[test]
    fn test_formatter_applies_unit() {
        let formatter = MoneyFormatter::new("en-US", AmountUnit::Minor);
        assert_eq!(formatter.format(Some(2500.0), "usd"), "$25.00");
        assert_eq!(formatter.format(None, "usd"), "$0.00");

        let formatter = MoneyFormatter::default();
        assert_eq!(formatter.format(Some(2500.0), "usd"), "$2,500.00");
        assert_eq!(formatter.format_heuristic(Some(2500.0), "usd"), "$25.00");

        let unknown = MoneyFormatter::new("xx-XX", AmountUnit::Major);
        assert_eq!(unknown.format(Some(1234.5), "usd"), "$1,234.50");
    }
}
