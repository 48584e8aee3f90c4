//! The mapping provider: driving routes, distance matrices and geocoding.
//!
//! `Maps` is the low-level provider interface with a Google Maps implementation and an in-memory
//! implementation for testing. `DistanceResolver` builds the operations the quoter needs on top of
//! it.

mod google_maps;
mod maps_test_client;
mod resolver;

use crate::{Config, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub(crate) use google_maps::GoogleMaps;
#[cfg(test)]
pub(crate) use maps_test_client::Place;
pub(crate) use maps_test_client::TestMaps;
pub(crate) use resolver::DistanceResolver;

/// When this environment variable is set and non-empty the in-memory provider is used.
const TEST_MODE_ENV: &str = "DELIVERY_QUOTE_IN_TEST_MODE";

/// Selects which `Maps` implementation backs the program.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Call the Google Maps web services.
    #[default]
    Google,
    /// Use seeded in-memory data and never touch the network.
    Test,
}

impl Mode {
    /// Returns `Mode::Test` if `DELIVERY_QUOTE_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Google`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// A distance or duration as reported by the provider: a display string and a number of meters or
/// seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct TextValue {
    pub(crate) text: String,
    pub(crate) value: f64,
}

/// The first leg of the recommended driving route.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Route {
    pub(crate) start_address: String,
    pub(crate) end_address: String,
    pub(crate) distance: TextValue,
    pub(crate) duration: TextValue,
    pub(crate) summary: String,
    pub(crate) polyline: String,
}

/// Distances between every origin and every destination. `rows[i][j]` is the element for
/// `origins[i]` to `destinations[j]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct DistanceMatrix {
    #[serde(default)]
    pub(crate) origin_addresses: Vec<String>,
    #[serde(default)]
    pub(crate) destination_addresses: Vec<String>,
    #[serde(default)]
    pub(crate) rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct MatrixRow {
    pub(crate) elements: Vec<MatrixElement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct MatrixElement {
    pub(crate) status: String,
    pub(crate) distance: Option<TextValue>,
    pub(crate) duration: Option<TextValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct GeocodeResult {
    #[serde(default)]
    pub(crate) formatted_address: String,
    pub(crate) address_components: Vec<AddressComponent>,
}

/// One part of a structured address, e.g. `{"long_name": "Mernda", "types": ["locality"]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct AddressComponent {
    pub(crate) long_name: String,
    #[serde(default)]
    pub(crate) types: Vec<String>,
}

impl AddressComponent {
    pub(crate) fn is(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// The mapping provider. All requests use driving directions and metric units.
#[async_trait::async_trait]
pub(crate) trait Maps: Send + Sync {
    /// Computes the recommended driving route from `origin` to `destination`.
    async fn route(&self, origin: &str, destination: &str) -> Result<Route>;

    /// Computes driving distances from each of `origins` to each of `destinations`.
    async fn distance_matrix(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<DistanceMatrix>;

    /// Geocodes `address` into structured address components.
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>>;
}

/// Creates the `Maps` implementation for `mode`.
pub(crate) async fn maps(config: &Config, mode: Mode) -> Result<Arc<dyn Maps>> {
    debug!("Using the {mode:?} mapping provider");
    Ok(match mode {
        Mode::Google => Arc::new(GoogleMaps::new(
            config.api_key().await?,
            config.region().clone(),
            config.request_timeout(),
        )?),
        Mode::Test => Arc::new(TestMaps::default()),
    })
}
