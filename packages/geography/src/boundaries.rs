//! Suburb boundary loading from `GeoJSON`.
//!
//! Each feature in the collection becomes one [`SuburbBoundary`] in file
//! order. `Polygon` features contribute one part, `MultiPolygon` features
//! one part per member polygon. Only outer rings are kept.

use std::path::Path;

use geojson::{Feature, GeoJson, Value};
use property_map_geography_models::{Ring, SuburbBoundary};

use crate::GeoError;

/// Reads boundaries from a `GeoJSON` file.
///
/// `name_property` is the feature property holding the suburb name.
///
/// # Errors
///
/// Returns [`GeoError`] if the file cannot be read or is not a
/// `FeatureCollection`.
pub fn load(path: &Path, name_property: &str) -> Result<Vec<SuburbBoundary>, GeoError> {
    let text = std::fs::read_to_string(path)?;
    let boundaries = parse(&text, name_property)?;
    log::info!(
        "Loaded {} suburb boundaries from {}",
        boundaries.len(),
        path.display()
    );
    Ok(boundaries)
}

/// Parses boundaries from `GeoJSON` text.
///
/// Features without a name or without a polygonal geometry are skipped
/// with a warning.
///
/// # Errors
///
/// Returns [`GeoError`] if the text is not valid `GeoJSON` or is not a
/// `FeatureCollection`.
pub fn parse(text: &str, name_property: &str) -> Result<Vec<SuburbBoundary>, GeoError> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::Conversion {
            message: "expected a GeoJSON FeatureCollection".to_string(),
        });
    };

    let mut boundaries = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.iter().enumerate() {
        let Some(name) = feature_name(feature, name_property) else {
            log::warn!("Skipping boundary feature {index}: no '{name_property}' property");
            continue;
        };
        let parts = feature_parts(feature);
        if parts.is_empty() {
            log::warn!("Skipping boundary '{name}': no polygon geometry");
            continue;
        }
        boundaries.push(SuburbBoundary { name, parts });
    }

    Ok(boundaries)
}

fn feature_name(feature: &Feature, name_property: &str) -> Option<String> {
    feature
        .property(name_property)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn feature_parts(feature: &Feature) -> Vec<Ring> {
    let Some(geometry) = &feature.geometry else {
        return Vec::new();
    };
    match &geometry.value {
        Value::Polygon(rings) => rings
            .first()
            .map(Vec::as_slice)
            .map(to_ring)
            .into_iter()
            .collect(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first().map(Vec::as_slice).map(to_ring))
            .collect(),
        _ => Vec::new(),
    }
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}
