#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Suburb boundary and region lookup types.
//!
//! These are loaded once at pipeline start and shared read-only by every
//! enrichment step.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A closed ring of `(lng, lat)` vertices.
pub type Ring = Vec<(f64, f64)>;

/// A named suburb with its polygon parts, in source order.
///
/// Each part is an outer ring. Holes are not represented; the boundary
/// source does not carry any that matter at suburb scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuburbBoundary {
    /// Suburb name as it appears in the boundary source.
    pub name: String,
    /// Polygon parts. Never empty for a loaded boundary.
    pub parts: Vec<Ring>,
}

/// Which polygon parts of a multi-part suburb participate in containment.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RingMode {
    /// Only the first part is tested. Points inside later parts (islands,
    /// exclaves) are unresolved.
    #[default]
    FirstRing,
    /// Every part is tested.
    AllRings,
}

/// Region name to member suburbs, in load order.
///
/// Suburb names are upper-cased on insert so lookups can match the
/// boundary source's upper-case names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionMap {
    entries: Vec<(String, Vec<String>)>,
}

impl RegionMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a region. Suburb names are upper-cased.
    pub fn insert(&mut self, region: impl Into<String>, suburbs: impl IntoIterator<Item = String>) {
        let suburbs = suburbs.into_iter().map(|s| s.trim().to_uppercase()).collect();
        self.entries.push((region.into(), suburbs));
    }

    /// Iterates regions in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(region, suburbs)| (region.as_str(), suburbs.as_slice()))
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no regions are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ring_mode_parses_kebab_case() {
        assert_eq!(RingMode::from_str("all-rings").unwrap(), RingMode::AllRings);
        assert_eq!(RingMode::FirstRing.to_string(), "first-ring");
        assert_eq!(RingMode::default(), RingMode::FirstRing);
    }

    #[test]
    fn region_map_uppercases_suburbs_and_keeps_order() {
        let mut map = RegionMap::new();
        map.insert("Melbourne", vec!["Carlton ".to_string(), "Docklands".to_string()]);
        map.insert("Yarra", vec!["Fitzroy".to_string()]);
        let regions: Vec<&str> = map.iter().map(|(r, _)| r).collect();
        assert_eq!(regions, vec!["Melbourne", "Yarra"]);
        assert_eq!(map.iter().next().unwrap().1, ["CARLTON", "DOCKLANDS"]);
        assert_eq!(map.len(), 2);
    }
}
