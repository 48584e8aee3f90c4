//! Turns raw provider responses into the distance, route and suburb that a quote needs.

use crate::api::{Maps, Route};
use crate::model::RouteSummary;
use crate::{DistanceSource, Result};
use anyhow::{bail, Context};
use std::sync::Arc;
use tracing::{debug, trace};

/// The address component type that names a suburb.
const LOCALITY: &str = "locality";

/// Wraps a dynamically-dispatched `Maps` provider.
#[derive(Clone)]
pub(crate) struct DistanceResolver {
    maps: Arc<dyn Maps>,
    source: DistanceSource,
}

impl DistanceResolver {
    pub(crate) fn new(maps: Arc<dyn Maps>, source: DistanceSource) -> Self {
        Self { maps, source }
    }

    /// Computes the driving route from `origin` to `destination`.
    pub(crate) async fn route(&self, origin: &str, destination: &str) -> Result<RouteSummary> {
        let route = self.maps.route(origin, destination).await?;
        debug!(
            "Distance from {} to {} is {} and will take approximately {}",
            route.start_address, route.end_address, route.distance.text, route.duration.text
        );
        Ok(summarize(route))
    }

    /// The driving distance in meters used for pricing. With `DistanceSource::Route` this is the
    /// length of `route`, which must have succeeded. With `DistanceSource::Matrix` a separate
    /// distance-matrix request is made.
    pub(crate) async fn distance(
        &self,
        origin: &str,
        destination: &str,
        route: Option<&RouteSummary>,
    ) -> Result<f64> {
        match self.source {
            DistanceSource::Route => route
                .map(|r| r.distance_meters)
                .context("No route is available to measure the distance"),
            DistanceSource::Matrix => self.matrix_distance(origin, destination).await,
        }
    }

    async fn matrix_distance(&self, origin: &str, destination: &str) -> Result<f64> {
        let matrix = self
            .maps
            .distance_matrix(&[origin], &[destination])
            .await
            .context("Error with distance matrix request")?;
        trace!(
            "Distance matrix from {:?} to {:?}",
            matrix.origin_addresses,
            matrix.destination_addresses
        );
        let element = matrix
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .context("The distance matrix has no elements")?;
        if element.status != "OK" {
            bail!("Distance matrix element failed due to {}", element.status);
        }
        if let Some(duration) = &element.duration {
            debug!("Distance matrix duration is {}", duration.text);
        }
        element
            .distance
            .as_ref()
            .map(|d| d.value)
            .context("The distance matrix element has no distance")
    }

    /// Geocodes `address` and returns its locality, upper-cased. Returns an empty string if the
    /// address has no locality component.
    pub(crate) async fn resolve_suburb(&self, address: &str) -> Result<String> {
        let results = self
            .maps
            .geocode(address)
            .await
            .context("Geocode was not successful")?;
        let first = results
            .first()
            .context("Geocode returned no results")?;
        trace!("Geocoded '{address}' to '{}'", first.formatted_address);
        let suburb = first
            .address_components
            .iter()
            .find(|c| c.is(LOCALITY))
            .map(|c| c.long_name.to_uppercase())
            .unwrap_or_default();
        Ok(suburb)
    }
}

fn summarize(route: Route) -> RouteSummary {
    RouteSummary {
        start_address: route.start_address,
        end_address: route.end_address,
        distance_meters: route.distance.value,
        distance_text: route.distance.text,
        duration_text: route.duration.text,
        summary: route.summary,
        polyline: route.polyline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Place, TestMaps};

    fn resolver(maps: TestMaps, source: DistanceSource) -> DistanceResolver {
        DistanceResolver::new(Arc::new(maps), source)
    }

    #[tokio::test]
    async fn test_route_distance() {
        let r = resolver(TestMaps::default(), DistanceSource::Route);
        let route = r.route("Warehouse", "1 High St, Epping VIC").await.unwrap();
        assert_eq!(route.distance_meters, 6_200.0);
        let d = r
            .distance("Warehouse", "1 High St, Epping VIC", Some(&route))
            .await
            .unwrap();
        assert_eq!(d, 6_200.0);
        assert!(r.distance("Warehouse", "Epping", None).await.is_err());
    }

    #[tokio::test]
    async fn test_matrix_distance() {
        let r = resolver(TestMaps::default(), DistanceSource::Matrix);
        let d = r.distance("Warehouse", "Sunbury VIC", None).await.unwrap();
        assert_eq!(d, 36_000.0);
        assert!(r.distance("Warehouse", "Perth WA", None).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_suburb() {
        let maps = TestMaps::default().with_place(
            "nowhere road",
            Place {
                locality: None,
                postcode: "3999".to_string(),
                distance_meters: 1_000.0,
                duration_seconds: 60.0,
            },
        );
        let r = resolver(maps, DistanceSource::Route);
        assert_eq!(r.resolve_suburb("12 Main St, mernda").await.unwrap(), "MERNDA");
        assert_eq!(
            r.resolve_suburb("4 Mernda Court, Epping VIC").await.unwrap(),
            "EPPING"
        );
        assert_eq!(r.resolve_suburb("1 Nowhere Road").await.unwrap(), "");
        assert!(r.resolve_suburb("Perth WA").await.is_err());
    }
}
