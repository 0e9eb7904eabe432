//! Per-property derivation.
//!
//! Every derived column is a pure function of the property and the lookup
//! tables, which are built once and only read here.

use property_map_cases::CaseTable;
use property_map_geography::RegionResolver;
use property_map_property_models::{EnrichedProperty, NearestStop, Property};
use property_map_spatial::{NearestStopFinder, SuburbResolver};
use property_map_transit::JourneyTimes;

/// The spatial lookups: suburb polygon, region table and stop set.
pub struct SpatialLookup {
    pub suburbs: SuburbResolver,
    pub regions: RegionResolver,
    pub stops: NearestStopFinder,
}

/// Columns that depend only on a property's position.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub suburb: Option<String>,
    pub region: Option<String>,
    pub nearest_stop: Option<NearestStop>,
}

impl SpatialLookup {
    /// Resolves suburb, region and nearest stop for a property.
    #[must_use]
    pub fn locate(&self, property: &Property) -> Location {
        let suburb = self
            .suburbs
            .resolve(property.latitude, property.longitude)
            .map(str::to_string);
        let region = suburb
            .as_deref()
            .and_then(|s| self.regions.resolve(s))
            .map(str::to_string);
        let nearest_stop = self.stops.nearest(property.latitude, property.longitude);

        Location {
            suburb,
            region,
            nearest_stop,
        }
    }
}

/// Attaches every derived column to a property.
pub struct PropertyEnricher<'a> {
    spatial: &'a SpatialLookup,
    journeys: &'a JourneyTimes,
    cases: &'a CaseTable,
}

impl<'a> PropertyEnricher<'a> {
    #[must_use]
    pub const fn new(
        spatial: &'a SpatialLookup,
        journeys: &'a JourneyTimes,
        cases: &'a CaseTable,
    ) -> Self {
        Self {
            spatial,
            journeys,
            cases,
        }
    }

    /// Derives every column for `property`.
    #[must_use]
    pub fn enrich(&self, property: &Property) -> EnrichedProperty {
        self.enrich_located(property, self.spatial.locate(property))
    }

    /// Completes a property whose location was already resolved.
    #[must_use]
    pub fn enrich_located(&self, property: &Property, location: Location) -> EnrichedProperty {
        let direct_journey_minutes = location
            .nearest_stop
            .and_then(|stop| self.journeys.minutes(stop.stop_id));
        let cases = location.region.as_deref().and_then(|r| self.cases.get(r));

        EnrichedProperty {
            property: property.clone(),
            suburb: location.suburb,
            region: location.region,
            nearest_stop: location.nearest_stop,
            direct_journey_minutes,
            cases,
        }
    }
}
