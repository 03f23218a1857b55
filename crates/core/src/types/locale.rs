//! Number formatting conventions for the locales the storefront renders in.

/// No-break space, used between amount and symbol.
pub const NBSP: char = '\u{a0}';

/// Narrow no-break space, the French grouping separator.
pub const NNBSP: char = '\u{202f}';

/// Where a currency symbol sits relative to the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolPosition {
    /// `$12.00`
    Prefix,
    /// `12,00 €`
    Suffix,
}

/// Separators and symbol placement for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    /// BCP 47 tag, e.g. `en-US`.
    pub tag: &'static str,
    /// Thousands separator.
    pub group: char,
    /// Decimal separator.
    pub decimal: char,
    /// Symbol placement.
    pub symbol_position: SymbolPosition,
    /// Whether a no-break space separates symbol and amount.
    pub symbol_spaced: bool,
}

const fn locale(
    tag: &'static str,
    group: char,
    decimal: char,
    symbol_position: SymbolPosition,
    symbol_spaced: bool,
) -> NumberLocale {
    NumberLocale {
        tag,
        group,
        decimal,
        symbol_position,
        symbol_spaced,
    }
}

/// The default locale.
pub const EN_US: NumberLocale = locale("en-US", ',', '.', SymbolPosition::Prefix, false);

const LOCALES: &[NumberLocale] = &[
    EN_US,
    locale("en-GB", ',', '.', SymbolPosition::Prefix, false),
    locale("en-CA", ',', '.', SymbolPosition::Prefix, false),
    locale("en-AU", ',', '.', SymbolPosition::Prefix, false),
    locale("en-TT", ',', '.', SymbolPosition::Prefix, false),
    locale("de-DE", '.', ',', SymbolPosition::Suffix, true),
    locale("fr-FR", NNBSP, ',', SymbolPosition::Suffix, true),
    locale("es-ES", '.', ',', SymbolPosition::Suffix, true),
    locale("it-IT", '.', ',', SymbolPosition::Suffix, true),
    locale("nl-NL", '.', ',', SymbolPosition::Prefix, true),
    locale("sv-SE", NBSP, ',', SymbolPosition::Suffix, true),
    locale("da-DK", '.', ',', SymbolPosition::Suffix, true),
    locale("nb-NO", NBSP, ',', SymbolPosition::Suffix, true),
    locale("pl-PL", NBSP, ',', SymbolPosition::Suffix, true),
    locale("ja-JP", ',', '.', SymbolPosition::Prefix, false),
];

impl NumberLocale {
    /// Look up a locale by tag.
    ///
    /// Matching is case-insensitive and accepts `_` in place of `-`. A bare
    /// language (`"de"`) or an unlisted region (`"de-AT"`) resolves to the
    /// first listed locale with that language. Anything else is `en-US`.
    #[must_use]
    pub fn lookup(tag: &str) -> &'static Self {
        let normalized = tag.trim().replace('_', "-");

        if let Some(exact) = LOCALES
            .iter()
            .find(|l| l.tag.eq_ignore_ascii_case(&normalized))
        {
            return exact;
        }

        let language = normalized.split('-').next().unwrap_or_default();
        LOCALES
            .iter()
            .find(|l| {
                l.tag
                    .split('-')
                    .next()
                    .is_some_and(|lang| !language.is_empty() && lang.eq_ignore_ascii_case(language))
            })
            .unwrap_or(&EN_US)
    }

    /// Insert group separators into a string of ASCII digits.
    #[must_use]
    pub fn group_digits(&self, digits: &str) -> String {
        group_digits(digits, self.group)
    }
}

/// Insert `separator` every three digits from the right.
#[must_use]
pub fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3 * separator.len_utf8());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
