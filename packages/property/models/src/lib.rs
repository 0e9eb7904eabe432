#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical property types shared across the property-map workspace.
//!
//! A [`Property`] is the merged, coerced form of a record read from one of
//! the raw sources. Enrichment never mutates it; instead it produces an
//! [`EnrichedProperty`] whose derived columns are `Option`s. `None` means the
//! join could not be resolved and is rendered as [`NOT_AVAILABLE`] only at
//! the output boundary (see [`PropertyRow`]).

use serde::{Deserialize, Serialize, Serializer};

/// Marker written to output cells whose value could not be resolved.
pub const NOT_AVAILABLE: &str = "not available";

/// Number of decimal places coordinates are rounded to at merge time.
pub const COORDINATE_PRECISION: i32 = 7;

/// A loosely-typed field as it appears in a raw source.
///
/// The JSON source carries numbers, the XML source carries text. Both are
/// coerced into the canonical types by the record merger. A `null` or absent
/// value is [`RawField::Missing`] and fails coercion for its row only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    /// An integral JSON number.
    Int(i64),
    /// A non-integral JSON number.
    Float(f64),
    /// Text, e.g. the contents of an XML tag.
    Text(String),
    /// `null`, or a field the record does not carry.
    #[default]
    Missing,
}

/// Converts an integral float to `i64`, rejecting anything out of range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let in_range = (i64::MIN as f64..i64::MAX as f64).contains(&value);
    (in_range && value.fract() == 0.0).then_some(value as i64)
}

impl RawField {
    /// Coerces the field to an integer identifier.
    ///
    /// Integral floats (`42.0`) are accepted; anything with a fractional
    /// part, or outside the `i64` range, is not.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => integral(*v),
            Self::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            Self::Missing => None,
        }
    }

    /// Coerces the field to a finite float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            Self::Missing => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Coerces the field to trimmed text. Numbers are rendered as written.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Missing => None,
        }
    }
}

impl From<Option<String>> for RawField {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

impl std::fmt::Display for RawField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Missing => f.write_str("missing"),
        }
    }
}

/// A property record as read from a source, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPropertyRecord {
    /// Source identifier.
    #[serde(default)]
    pub property_id: RawField,
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: RawField,
    /// Longitude in degrees.
    #[serde(default)]
    pub lng: RawField,
    /// Street address.
    #[serde(default)]
    pub addr_street: RawField,
}

/// A merged residential property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Identifier. Not guaranteed unique across the merged table.
    pub property_id: i64,
    /// Latitude in degrees, rounded to [`COORDINATE_PRECISION`] places.
    pub latitude: f64,
    /// Longitude in degrees, rounded to [`COORDINATE_PRECISION`] places.
    pub longitude: f64,
    /// Street address.
    pub address: String,
}

/// The closest transit stop to a property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestStop {
    /// Stop identifier from the transit feed.
    pub stop_id: u64,
    /// Great-circle distance in kilometres, rounded to 3 places.
    pub distance_km: f64,
}

/// Case-count figures derived from a region's cumulative series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFigures {
    /// New cases on the point date.
    pub point_count: i64,
    /// Rounded daily average over the 14 days before the anchor date.
    pub fortnight_avg: i64,
    /// Rounded daily average over the 30 days before the anchor date.
    pub month_avg: i64,
    /// Rounded daily average over the 60 days before the anchor date.
    pub two_month_avg: i64,
}

/// A property with every derived column attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProperty {
    /// The merged property.
    pub property: Property,
    /// Name of the containing suburb boundary.
    pub suburb: Option<String>,
    /// Administrative region containing the suburb.
    pub region: Option<String>,
    /// Closest transit stop.
    pub nearest_stop: Option<NearestStop>,
    /// Average direct-journey minutes from the nearest stop to the
    /// destination stop.
    pub direct_journey_minutes: Option<i64>,
    /// Case figures for the region.
    pub cases: Option<CaseFigures>,
}

impl EnrichedProperty {
    /// `1` when a direct journey exists, `0` otherwise.
    #[must_use]
    pub const fn direct_journey_flag(&self) -> u8 {
        if self.direct_journey_minutes.is_some() {
            1
        } else {
            0
        }
    }

    /// Flattens the enriched property into an output row.
    #[must_use]
    pub fn to_row(&self) -> PropertyRow {
        let cases = self.cases;
        PropertyRow {
            property_id: self.property.property_id,
            lat: self.property.latitude,
            lng: self.property.longitude,
            addr_street: self.property.address.clone(),
            suburb: self.suburb.clone(),
            region: self.region.clone(),
            nearest_stop_id: self.nearest_stop.map(|s| s.stop_id),
            nearest_stop_distance_km: self.nearest_stop.map(|s| s.distance_km),
            direct_journey_minutes: self.direct_journey_minutes,
            direct_journey_flag: self.direct_journey_flag(),
            point_cases: cases.map(|c| c.point_count),
            fortnight_avg_cases: cases.map(|c| c.fortnight_avg),
            month_avg_cases: cases.map(|c| c.month_avg),
            two_month_avg_cases: cases.map(|c| c.two_month_avg),
        }
    }
}

/// Flat output row. Unresolved cells serialize as [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRow {
    /// Source identifier.
    pub property_id: i64,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Street address.
    pub addr_street: String,
    /// Containing suburb.
    #[serde(serialize_with = "or_not_available")]
    pub suburb: Option<String>,
    /// Region of the suburb.
    #[serde(serialize_with = "or_not_available")]
    pub region: Option<String>,
    /// Closest transit stop.
    #[serde(serialize_with = "or_not_available")]
    pub nearest_stop_id: Option<u64>,
    /// Distance to the closest stop in kilometres.
    #[serde(serialize_with = "or_not_available")]
    pub nearest_stop_distance_km: Option<f64>,
    /// Average direct-journey minutes to the destination stop.
    #[serde(serialize_with = "or_not_available")]
    pub direct_journey_minutes: Option<i64>,
    /// `1` if a direct journey exists.
    pub direct_journey_flag: u8,
    /// New cases on the point date.
    #[serde(serialize_with = "or_not_available")]
    pub point_cases: Option<i64>,
    /// Daily average over the fortnight window.
    #[serde(serialize_with = "or_not_available")]
    pub fortnight_avg_cases: Option<i64>,
    /// Daily average over the month window.
    #[serde(serialize_with = "or_not_available")]
    pub month_avg_cases: Option<i64>,
    /// Daily average over the two-month window.
    #[serde(serialize_with = "or_not_available")]
    pub two_month_avg_cases: Option<i64>,
}

/// Serializes `Some(v)` as `v` and `None` as [`NOT_AVAILABLE`].
///
/// # Errors
///
/// Propagates any error from the underlying serializer.
#[allow(clippy::ref_option)]
pub fn or_not_available<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

/// Rounds `value` to `places` decimal places (half away from zero).
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;
    // Normalize -0.0 so identical rows compare equal bit-for-bit.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Returns `true` if the pair is a finite, in-range geographic coordinate.
#[must_use]
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
