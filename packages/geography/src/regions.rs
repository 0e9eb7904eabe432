//! Region table loading and suburb-to-region resolution.
//!
//! The table is a text export with one region per line:
//!
//! ```text
//! MELBOURNE : ['Carlton', 'Docklands', 'East Melbourne']
//! ```
//!
//! Names in the list are single- or double-quoted. Lines that do not match
//! (page footers, blank lines) are skipped.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use property_map_geography_models::RegionMap;
use regex::Regex;

use crate::GeoError;

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"'([^']*)'|"([^"]*)""#).expect("valid regex"));

/// Reads a region table file.
///
/// # Errors
///
/// Returns [`GeoError::Io`] if the file cannot be read.
pub fn load(path: &Path) -> Result<RegionMap, GeoError> {
    let text = std::fs::read_to_string(path)?;
    let map = parse(&text);
    log::info!("Loaded {} regions from {}", map.len(), path.display());
    Ok(map)
}

/// Parses region table text.
#[must_use]
pub fn parse(text: &str) -> RegionMap {
    let mut map = RegionMap::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((region, list)) = line.split_once(" : ") else {
            log::debug!("Skipping region table line {}: {line:?}", line_no + 1);
            continue;
        };
        let list = list.trim();
        if !(list.starts_with('[') && list.ends_with(']')) {
            log::debug!("Skipping region table line {}: no suburb list", line_no + 1);
            continue;
        }

        let suburbs: Vec<String> = QUOTED_RE
            .captures_iter(list)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .collect();
        map.insert(region.trim(), suburbs);
    }

    map
}

/// Resolves an upper-case suburb name to its region.
///
/// When a suburb appears under more than one region, the region loaded
/// first wins.
#[derive(Debug, Clone, Default)]
pub struct RegionResolver {
    by_suburb: BTreeMap<String, String>,
}

impl RegionResolver {
    /// Builds the resolver from a region map.
    #[must_use]
    pub fn new(map: &RegionMap) -> Self {
        let mut by_suburb = BTreeMap::new();
        for (region, suburbs) in map.iter() {
            for suburb in suburbs {
                if let Some(existing) = by_suburb.get(suburb) {
                    if existing != region {
                        log::warn!(
                            "Suburb {suburb} listed under both {existing} and {region}; keeping {existing}"
                        );
                    }
                    continue;
                }
                by_suburb.insert(suburb.clone(), region.to_string());
            }
        }
        Self { by_suburb }
    }

    /// Returns the region containing `suburb`. Matching is exact.
    #[must_use]
    pub fn resolve(&self, suburb: &str) -> Option<&str> {
        self.by_suburb.get(suburb).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
MELBOURNE : ['Carlton', 'Docklands']
MORELAND : ['Brunswick', \"O'Connor Heights\", 'Carlton']

Page 3 of 3
";

    #[test]
    fn parses_lines_and_skips_noise() {
        let map = parse(TABLE);
        assert_eq!(map.len(), 2);
        let (region, suburbs) = map.iter().nth(1).unwrap();
        assert_eq!(region, "MORELAND");
        assert_eq!(suburbs, ["BRUNSWICK", "O'CONNOR HEIGHTS", "CARLTON"]);
    }

    #[test]
    fn resolves_upper_case_suburbs() {
        let resolver = RegionResolver::new(&parse(TABLE));
        assert_eq!(resolver.resolve("DOCKLANDS"), Some("MELBOURNE"));
        assert_eq!(resolver.resolve("O'CONNOR HEIGHTS"), Some("MORELAND"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let resolver = RegionResolver::new(&parse(TABLE));
        assert_eq!(resolver.resolve("Docklands"), None);
    }

    #[test]
    fn first_region_wins_for_duplicate_suburb() {
        let resolver = RegionResolver::new(&parse(TABLE));
        assert_eq!(resolver.resolve("CARLTON"), Some("MELBOURNE"));
    }

    #[test]
    fn unknown_suburb_is_unresolved() {
        let resolver = RegionResolver::new(&parse(TABLE));
        assert_eq!(resolver.resolve("ATLANTIS"), None);
    }
}
