//! City directory: startup-loaded city list with substring search and
//! nearest-neighbor lookup
//!
//! The dataset is small (low thousands of records), so both search and
//! nearest-neighbor scans are linear over the whole list.

use std::path::Path;

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::TaqsError;

/// Nearest-city matches further than this are discarded, so remote points
/// are never labeled with a misleading far-away city name.
const NEAREST_MAX_KM: f64 = 100.0;

/// Maximum number of search results returned
const SEARCH_LIMIT: usize = 10;

/// One named location from the static dataset
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityRecord {
    pub name_en: String,
    pub name_ar: String,
    /// `[latitude, longitude]` of the city center
    pub center: [f64; 2],
}

impl CityRecord {
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.center[0]
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.center[1]
    }
}

/// In-memory, read-only directory of cities
pub struct CityDirectory {
    cities: Vec<CityRecord>,
}

impl CityDirectory {
    /// Load the directory from a JSON dataset file
    ///
    /// An unreadable or malformed dataset degrades to an empty directory;
    /// dependent lookups then return "no match" instead of failing.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let cities = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<CityRecord>>(&contents) {
                Ok(cities) => cities,
                Err(e) => {
                    warn!("Could not parse city dataset {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Could not read city dataset {}: {}", path.display(), e);
                Vec::new()
            }
        };

        debug!("Loaded {} cities from {}", cities.len(), path.display());
        Self { cities }
    }

    /// Build a directory from records already in memory
    #[must_use]
    pub fn from_records(cities: Vec<CityRecord>) -> Self {
        Self { cities }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Substring search over English and Arabic names
    ///
    /// Results keep dataset order (no relevance ranking) and are capped
    /// at 10.
    pub fn search(&self, query: &str) -> Result<Vec<&CityRecord>, TaqsError> {
        let trimmed = query.trim();
        let len = trimmed.chars().count();
        if len < 2 {
            return Err(TaqsError::QueryTooShort);
        }
        if len > 64 {
            return Err(TaqsError::QueryTooLong);
        }

        let needle = normalize_name(trimmed);
        let matches = self
            .cities
            .iter()
            .filter(|city| {
                normalize_name(&city.name_en).contains(&needle)
                    || normalize_name(&city.name_ar).contains(&needle)
            })
            .take(SEARCH_LIMIT)
            .collect();

        Ok(matches)
    }

    /// Find the city center closest to a point by great-circle distance
    ///
    /// Returns the record and its distance in kilometers, or `None` when
    /// the directory is empty or no city lies within 100 km. Exact ties
    /// resolve to the first city in dataset order.
    #[must_use]
    pub fn find_nearest(&self, latitude: f64, longitude: f64) -> Option<(&CityRecord, f64)> {
        let mut best: Option<(&CityRecord, f64)> = None;
        for city in &self.cities {
            let from = HaversineLocation {
                latitude,
                longitude,
            };
            let to = HaversineLocation {
                latitude: city.latitude(),
                longitude: city.longitude(),
            };
            let km = distance(from, to, Units::Kilometers);
            if best.is_none_or(|(_, best_km)| km < best_km) {
                best = Some((city, km));
            }
        }

        best.filter(|(_, km)| *km < NEAREST_MAX_KM)
    }
}

/// Normalize a name for matching: lowercase and strip diacritics
///
/// Handles Latin combining marks and Arabic harakat/tatweel, and folds
/// hamza-carrying alef forms onto bare alef so vocalized and plain
/// spellings compare equal.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            // combining diacritical marks (Latin)
            '\u{0300}'..='\u{036f}' => None,
            // Arabic harakat, superscript alef and Quranic annotation marks
            '\u{0610}'..='\u{061a}' | '\u{064b}'..='\u{065f}' | '\u{0670}' => None,
            // tatweel
            '\u{0640}' => None,
            'أ' | 'إ' | 'آ' => Some('ا'),
            _ => Some(c),
        })
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_directory() -> CityDirectory {
        CityDirectory::from_records(vec![
            CityRecord {
                name_en: "Riyadh".to_string(),
                name_ar: "الرياض".to_string(),
                center: [24.7136, 46.6753],
            },
            CityRecord {
                name_en: "Jeddah".to_string(),
                name_ar: "جدة".to_string(),
                center: [21.4858, 39.1925],
            },
            CityRecord {
                name_en: "Diriyah".to_string(),
                name_ar: "الدرعية".to_string(),
                center: [24.7373, 46.5756],
            },
        ])
    }

    #[test]
    fn test_search_matches_english_substring() {
        let directory = test_directory();
        let results = directory.search("riy").unwrap();
        assert!(results.iter().any(|c| c.name_en == "Riyadh"));
        // "Diriyah" contains "riy" too; "Jeddah" must not match
        assert!(results.iter().any(|c| c.name_en == "Diriyah"));
        assert!(!results.iter().any(|c| c.name_en == "Jeddah"));
    }

    #[test]
    fn test_search_matches_arabic_with_diacritics() {
        let directory = test_directory();
        // Vocalized spelling of الرياض
        let results = directory.search("الرِّياض").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name_en, "Riyadh");
    }

    #[test]
    fn test_search_preserves_dataset_order() {
        let directory = test_directory();
        let results = directory.search("ah").unwrap();
        let names: Vec<&str> = results.iter().map(|c| c.name_en.as_str()).collect();
        assert_eq!(names, vec!["Jeddah", "Diriyah"]);
    }

    #[test]
    fn test_search_rejects_short_and_long_queries() {
        let directory = test_directory();
        assert!(matches!(
            directory.search("r").unwrap_err(),
            TaqsError::QueryTooShort
        ));
        assert!(matches!(
            directory.search("  a  ").unwrap_err(),
            TaqsError::QueryTooShort
        ));
        let long = "x".repeat(65);
        assert!(matches!(
            directory.search(&long).unwrap_err(),
            TaqsError::QueryTooLong
        ));
    }

    #[test]
    fn test_search_caps_results_at_ten() {
        let cities = (0..15)
            .map(|i| CityRecord {
                name_en: format!("Testville {i}"),
                name_ar: String::new(),
                center: [20.0, 40.0],
            })
            .collect();
        let directory = CityDirectory::from_records(cities);
        let results = directory.search("testville").unwrap();
        assert_eq!(results.len(), 10);
    }

    #[test]
    fn test_find_nearest_picks_minimum_distance() {
        let directory = test_directory();
        let (city, km) = directory.find_nearest(24.7, 46.7).unwrap();
        assert_eq!(city.name_en, "Riyadh");
        assert!(km < 5.0);
    }

    #[test]
    fn test_find_nearest_rejects_far_points() {
        let directory = test_directory();
        // Gulf of Guinea: nowhere near any listed city
        assert!(directory.find_nearest(0.0, 0.0).is_none());
    }

    #[test]
    fn test_find_nearest_tie_breaks_by_dataset_order() {
        let directory = CityDirectory::from_records(vec![
            CityRecord {
                name_en: "First".to_string(),
                name_ar: String::new(),
                center: [24.0, 46.0],
            },
            CityRecord {
                name_en: "Second".to_string(),
                name_ar: String::new(),
                center: [24.0, 46.0],
            },
        ]);
        let (city, _) = directory.find_nearest(24.0, 46.0).unwrap();
        assert_eq!(city.name_en, "First");
    }

    #[test]
    fn test_empty_directory_degrades() {
        let directory = CityDirectory::from_records(Vec::new());
        assert!(directory.is_empty());
        assert!(directory.find_nearest(24.7, 46.7).is_none());
        assert!(directory.search("riyadh").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file_yields_empty_directory() {
        let directory = CityDirectory::load("does/not/exist.json");
        assert!(directory.is_empty());
    }
}
