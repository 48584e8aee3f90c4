//! Implements the `Maps` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without calling Google Maps.

use crate::api::{
    AddressComponent, DistanceMatrix, GeocodeResult, Maps, MatrixElement, MatrixRow, Route,
    TextValue,
};
use crate::Result;
use anyhow::bail;
use std::collections::HashMap;
use std::time::Duration;

/// A destination known to the `TestMaps` provider.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Place {
    pub(crate) locality: Option<String>,
    pub(crate) postcode: String,
    pub(crate) distance_meters: f64,
    pub(crate) duration_seconds: f64,
}

impl Place {
    pub(crate) fn new(locality: &str, postcode: &str, km: f64, minutes: f64) -> Self {
        Self {
            locality: Some(locality.to_string()),
            postcode: postcode.to_string(),
            distance_meters: (km * 1000.0).round(),
            duration_seconds: (minutes * 60.0).round(),
        }
    }

    fn formatted_address(&self) -> String {
        match &self.locality {
            Some(locality) => format!("{locality} VIC {}, Australia", self.postcode),
            None => format!("VIC {}, Australia", self.postcode),
        }
    }
}

/// An implementation of the `Maps` trait that does not use the network. A destination matches a
/// place when it contains the place's key, ignoring case. By default it is seeded with suburbs
/// around the Thomastown warehouse.
pub(crate) struct TestMaps {
    places: Vec<(String, Place)>,
    delays: HashMap<String, Duration>,
    fail_routes: bool,
    fail_geocodes: bool,
}

impl TestMaps {
    /// Create a new `TestMaps` that knows about `places`, matched in order.
    pub(crate) fn new(places: Vec<(String, Place)>) -> Self {
        Self {
            places,
            delays: HashMap::new(),
            fail_routes: false,
            fail_geocodes: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_place(mut self, key: &str, place: Place) -> Self {
        self.places.insert(0, (key.to_lowercase(), place));
        self
    }

    /// Every request whose destination contains `key` waits for `delay` before answering.
    #[cfg(test)]
    pub(crate) fn with_delay(mut self, key: &str, delay: Duration) -> Self {
        self.delays.insert(key.to_lowercase(), delay);
        self
    }

    #[cfg(test)]
    pub(crate) fn failing_routes(mut self) -> Self {
        self.fail_routes = true;
        self
    }

    #[cfg(test)]
    pub(crate) fn failing_geocodes(mut self) -> Self {
        self.fail_geocodes = true;
        self
    }

    fn find(&self, address: &str) -> Option<&Place> {
        let address = address.to_lowercase();
        self.places
            .iter()
            .find(|(key, _)| address.contains(key.as_str()))
            .map(|(_, place)| place)
    }

    async fn delay(&self, address: &str) {
        let address = address.to_lowercase();
        let delay = self
            .delays
            .iter()
            .filter(|(key, _)| address.contains(key.as_str()))
            .map(|(_, delay)| *delay)
            .max();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl Maps for TestMaps {
    async fn route(&self, origin: &str, destination: &str) -> Result<Route> {
        self.delay(destination).await;
        if self.fail_routes {
            bail!("directions request failed due to UNKNOWN_ERROR");
        }
        let Some(place) = self.find(destination) else {
            bail!("directions request failed due to NOT_FOUND");
        };
        Ok(Route {
            start_address: origin.to_string(),
            end_address: place.formatted_address(),
            distance: distance(place.distance_meters),
            duration: duration(place.duration_seconds),
            summary: "Test Rd".to_string(),
            polyline: String::new(),
        })
    }

    async fn distance_matrix(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<DistanceMatrix> {
        for d in destinations {
            self.delay(d).await;
        }
        if self.fail_routes {
            bail!("distancematrix request failed due to UNKNOWN_ERROR");
        }
        let elements: Vec<MatrixElement> = destinations
            .iter()
            .map(|d| match self.find(d) {
                Some(place) => MatrixElement {
                    status: "OK".to_string(),
                    distance: Some(distance(place.distance_meters)),
                    duration: Some(duration(place.duration_seconds)),
                },
                None => MatrixElement {
                    status: "NOT_FOUND".to_string(),
                    distance: None,
                    duration: None,
                },
            })
            .collect();
        Ok(DistanceMatrix {
            origin_addresses: origins.iter().map(|o| o.to_string()).collect(),
            destination_addresses: destinations.iter().map(|d| d.to_string()).collect(),
            rows: origins
                .iter()
                .map(|_| MatrixRow {
                    elements: elements.clone(),
                })
                .collect(),
        })
    }

    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>> {
        self.delay(address).await;
        if self.fail_geocodes {
            bail!("geocode request failed due to UNKNOWN_ERROR");
        }
        let Some(place) = self.find(address) else {
            bail!("geocode request failed due to ZERO_RESULTS");
        };
        let mut components = Vec::new();
        if let Some(locality) = &place.locality {
            components.push(component(locality, &["locality", "political"]));
        }
        components.push(component("Victoria", &["administrative_area_level_1"]));
        components.push(component(&place.postcode, &["postal_code"]));
        Ok(vec![GeocodeResult {
            formatted_address: place.formatted_address(),
            address_components: components,
        }])
    }
}

impl Default for TestMaps {
    /// Seeds the provider with suburbs around the Thomastown warehouse.
    fn default() -> Self {
        Self::new(default_places())
    }
}

fn distance(meters: f64) -> TextValue {
    TextValue {
        text: format!("{:.1} km", meters / 1000.0),
        value: meters,
    }
}

fn duration(seconds: f64) -> TextValue {
    TextValue {
        text: format!("{} mins", (seconds / 60.0).round()),
        value: seconds,
    }
}

fn component(name: &str, types: &[&str]) -> AddressComponent {
    AddressComponent {
        long_name: name.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
    }
}

/// Seed places: key, locality, postcode, driving km, driving minutes.
const PLACES: &[(&str, &str, &str, f64, f64)] = &[
    ("thomastown", "Thomastown", "3074", 1.2, 3.0),
    ("reservoir", "Reservoir", "3073", 4.1, 8.0),
    ("epping", "Epping", "3076", 6.2, 9.0),
    ("roxburgh park", "Roxburgh Park", "3064", 13.9, 15.0),
    ("melbourne", "Melbourne", "3000", 15.6, 24.0),
    ("mernda", "Mernda", "3754", 17.4, 19.0),
    ("craigieburn", "Craigieburn", "3064", 17.8, 16.0),
    ("doreen", "Doreen", "3754", 19.5, 22.0),
    ("sunbury", "Sunbury", "3429", 36.0, 33.0),
    ("geelong", "Geelong", "3220", 95.0, 70.0),
    ("ballarat", "Ballarat", "3350", 125.0, 95.0),
    ("bendigo", "Bendigo", "3550", 160.0, 110.0),
];

fn default_places() -> Vec<(String, Place)> {
    PLACES
        .iter()
        .map(|(key, locality, postcode, km, minutes)| {
            (
                key.to_string(),
                Place::new(locality, postcode, *km, *minutes),
            )
        })
        .collect()
}
