//! Commerce regions and country-code lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::de::null_as_default;
use super::id::RegionId;

/// Country used when a requested country has no region of its own.
pub const FALLBACK_COUNTRY: &str = "us";

/// A country attached to a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code.
    #[serde(default)]
    pub iso_2: Option<String>,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A group of countries sharing currency, tax, and shipping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Backend region ID.
    pub id: RegionId,
    /// Display name (e.g. "North America").
    #[serde(default)]
    pub name: String,
    /// Currency code as sent by the backend (usually lowercase).
    #[serde(default)]
    pub currency_code: String,
    /// Countries in this region.
    #[serde(default, deserialize_with = "null_as_default")]
    pub countries: Vec<Country>,
}

impl Region {
    /// Lowercased country codes served by this region.
    pub fn country_codes(&self) -> impl Iterator<Item = String> + '_ {
        self.countries
            .iter()
            .filter_map(|c| c.iso_2.as_deref())
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_ascii_lowercase)
    }

    /// Whether this region serves `country_code` (case-insensitive).
    #[must_use]
    pub fn serves(&self, country_code: &str) -> bool {
        let wanted = country_code.trim().to_ascii_lowercase();
        self.country_codes().any(|code| code == wanted)
    }
}

/// A country-code index over a fetched region list.
///
/// Built in one pass; when two regions claim the same country the later one
/// in the list wins.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    by_country: HashMap<String, Region>,
    regions: Vec<Region>,
}

impl RegionIndex {
    /// Index a region list by country code.
    #[must_use]
    pub fn build(regions: Vec<Region>) -> Self {
        let mut by_country = HashMap::new();
        for region in &regions {
            for code in region.country_codes() {
                by_country.insert(code, region.clone());
            }
        }
        Self {
            by_country,
            regions,
        }
    }

    /// Exact lookup by country code, without fallback.
    #[must_use]
    pub fn get(&self, country_code: &str) -> Option<&Region> {
        self.by_country
            .get(&country_code.trim().to_ascii_lowercase())
    }

    /// Lookup with fallback.
    ///
    /// Tries the requested country, then the region serving
    /// [`FALLBACK_COUNTRY`], then the first region in the fetched list.
    /// Returns `None` only when the index holds no regions.
    #[must_use]
    pub fn resolve(&self, country_code: &str) -> Option<&Region> {
        self.get(country_code)
            .or_else(|| self.get(FALLBACK_COUNTRY))
            .or_else(|| self.regions.first())
    }

    /// Regions in backend order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Number of indexed country codes.
    #[must_use]
    pub fn country_count(&self) -> usize {
        self.by_country.len()
    }

    /// Whether the index holds no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn region(id: &str, currency: &str, countries: &[&str]) -> Region {
        Region {
            id: RegionId::new(id),
            name: id.to_uppercase(),
            currency_code: currency.to_string(),
            countries: countries
                .iter()
                .map(|c| Country {
                    iso_2: Some((*c).to_string()),
                    display_name: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_resolve_exact_case_insensitive() {
        let index = RegionIndex::build(vec![
            region("reg_na", "usd", &["us", "ca"]),
            region("reg_eu", "eur", &["DE", "fr"]),
        ]);
        assert_eq!(index.resolve("CA").unwrap().id.as_str(), "reg_na");
        assert_eq!(index.resolve("de").unwrap().id.as_str(), "reg_eu");
        assert_eq!(index.country_count(), 4);
    }

    #[test]
    fn test_resolve_falls_back_to_us() {
        let index = RegionIndex::build(vec![
            region("reg_eu", "eur", &["de"]),
            region("reg_na", "usd", &["us"]),
        ]);
        assert_eq!(index.resolve("jp").unwrap().id.as_str(), "reg_na");
        assert!(index.get("jp").is_none());
    }

    #[test]
    fn test_resolve_falls_back_to_first() {
        let index = RegionIndex::build(vec![
            region("reg_eu", "eur", &["de"]),
            region("reg_uk", "gbp", &["gb"]),
        ]);
        assert_eq!(index.resolve("jp").unwrap().id.as_str(), "reg_eu");
        assert_eq!(index.resolve("").unwrap().id.as_str(), "reg_eu");
    }

    #[test]
    fn test_resolve_empty_is_none() {
        let index = RegionIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.resolve("us").is_none());
    }

    #[test]
    fn test_last_region_wins_duplicate_country() {
        let index = RegionIndex::build(vec![
            region("reg_a", "usd", &["us"]),
            region("reg_b", "usd", &["us"]),
        ]);
        assert_eq!(index.resolve("us").unwrap().id.as_str(), "reg_b");
    }

    #[test]
    fn test_region_deserializes_null_countries() {
        let json = r#"{"id": "reg_1", "name": "Nowhere", "currency_code": "usd", "countries": null}"#;
        let region: Region = serde_json::from_str(json).unwrap();
        assert!(region.countries.is_empty());
        assert!(!region.serves("us"));
    }

    #[test]
    fn test_region_skips_countries_without_code() {
        let json = r#"{"id": "reg_1", "countries": [{"iso_2": null}, {"iso_2": "TT"}]}"#;
        let region: Region = serde_json::from_str(json).unwrap();
        assert_eq!(region.country_codes().collect::<Vec<_>>(), vec!["tt"]);
        assert!(region.serves("tt"));
    }
}
