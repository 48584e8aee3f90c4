//! Implements the `Maps` trait using the Google Maps web services.
//!
//! See https://developers.google.com/maps/documentation/directions/get-directions,
//! https://developers.google.com/maps/documentation/distance-matrix and
//! https://developers.google.com/maps/documentation/geocoding.

use crate::api::{DistanceMatrix, GeocodeResult, Maps, Route, TextValue};
use crate::{Region, Result};
use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;
use url::Url;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/";
const DIRECTIONS: &str = "directions";
const DISTANCE_MATRIX: &str = "distancematrix";
const GEOCODE: &str = "geocode";
const STATUS_OK: &str = "OK";

/// Implements the `Maps` trait with HTTP requests to the Google Maps JSON APIs.
pub(crate) struct GoogleMaps {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    region: Region,
}

impl GoogleMaps {
    pub(crate) fn new(api_key: String, region: Region, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Unable to create the HTTP client")?;
        let base = Url::parse(BASE_URL).context("Invalid Google Maps base URL")?;
        Ok(Self {
            client,
            base,
            api_key,
            region,
        })
    }

    /// Builds the request URL for `service` with `params` and the API key.
    fn url(&self, service: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(&format!("{service}/json"))
            .with_context(|| format!("Unable to build the {service} URL"))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    /// The parameters that restrict results to the configured region.
    fn region_params(&self) -> Vec<(&'static str, String)> {
        vec![("region", self.region.country.to_lowercase())]
    }

    async fn get<T>(&self, service: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        trace!("{service} request with {params:?}");
        let url = self.url(service, params)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send {service} request"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {service} response"))?;
        if !status.is_success() {
            bail!("Google Maps {service} request failed with HTTP status {status}: {body}");
        }
        decode(service, &body)
    }
}

/// Every Google Maps response carries a `status` and, when it is not `OK`, usually an
/// `error_message`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

/// Parses a response `body` and checks its status.
fn decode<T>(service: &str, body: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let envelope: Envelope<T> = serde_json::from_str(body)
        .with_context(|| format!("Failed to parse the {service} response"))?;
    if envelope.status != STATUS_OK {
        match envelope.error_message {
            Some(message) => bail!(
                "{service} request failed due to {}: {message}",
                envelope.status
            ),
            None => bail!("{service} request failed due to {}", envelope.status),
        }
    }
    envelope
        .body
        .with_context(|| format!("The {service} response has no body"))
}

#[derive(Debug, Deserialize)]
struct DirectionsBody {
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    summary: String,
    legs: Vec<DirectionsLeg>,
    overview_polyline: Option<Polyline>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeBody {
    results: Vec<GeocodeResult>,
}

impl TryFrom<DirectionsBody> for Route {
    type Error = crate::Error;

    /// Takes the first leg of the first route, which is the provider's recommended route.
    fn try_from(body: DirectionsBody) -> Result<Self> {
        let route = body
            .routes
            .into_iter()
            .next()
            .context("The directions response has no routes")?;
        let leg = route
            .legs
            .into_iter()
            .next()
            .context("The directions route has no legs")?;
        Ok(Route {
            start_address: leg.start_address,
            end_address: leg.end_address,
            distance: leg.distance,
            duration: leg.duration,
            summary: route.summary,
            polyline: route.overview_polyline.map(|p| p.points).unwrap_or_default(),
        })
    }
}

#[async_trait::async_trait]
impl Maps for GoogleMaps {
    async fn route(&self, origin: &str, destination: &str) -> Result<Route> {
        let mut params = vec![
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("mode", "driving".to_string()),
            ("alternatives", "false".to_string()),
            ("units", "metric".to_string()),
        ];
        params.extend(self.region_params());
        let body: DirectionsBody = self.get(DIRECTIONS, &params).await?;
        Route::try_from(body)
    }

    async fn distance_matrix(
        &self,
        origins: &[&str],
        destinations: &[&str],
    ) -> Result<DistanceMatrix> {
        let mut params = vec![
            ("origins", origins.join("|")),
            ("destinations", destinations.join("|")),
            ("mode", "driving".to_string()),
            ("units", "metric".to_string()),
        ];
        params.extend(self.region_params());
        self.get(DISTANCE_MATRIX, &params).await
    }

    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>> {
        let sw = self.region.south_west;
        let ne = self.region.north_east;
        let mut params = vec![
            ("address", address.to_string()),
            ("components", format!("country:{}", self.region.country)),
            (
                "bounds",
                format!("{},{}|{},{}", sw.lat, sw.lng, ne.lat, ne.lng),
            ),
        ];
        params.extend(self.region_params());
        let body: GeocodeBody = self.get(GEOCODE, &params).await?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTIONS_OK: &str = r#"{
        "geocoded_waypoints": [],
        "routes": [{
            "summary": "Plenty Rd",
            "legs": [{
                "distance": {"text": "17.4 km", "value": 17432},
                "duration": {"text": "19 mins", "value": 1140},
                "start_address": "308-320 Settlement Rd, Thomastown VIC 3074, Australia",
                "end_address": "Mernda VIC 3754, Australia",
                "steps": []
            }],
            "overview_polyline": {"points": "abc~d"}
        }],
        "status": "OK"
    }"#;

    const GEOCODE_OK: &str = r#"{
        "results": [{
            "formatted_address": "12 Main St, Mernda VIC 3754, Australia",
            "address_components": [
                {"long_name": "12", "short_name": "12", "types": ["street_number"]},
                {"long_name": "Main Street", "short_name": "Main St", "types": ["route"]},
                {"long_name": "Mernda", "short_name": "Mernda", "types": ["locality", "political"]},
                {"long_name": "Victoria", "short_name": "VIC",
                 "types": ["administrative_area_level_1", "political"]}
            ]
        }],
        "status": "OK"
    }"#;

    const MATRIX_OK: &str = r#"{
        "origin_addresses": ["308-320 Settlement Rd, Thomastown VIC 3074, Australia"],
        "destination_addresses": ["Epping VIC 3076, Australia", "Nowhere"],
        "rows": [{"elements": [
            {"status": "OK", "distance": {"text": "6.2 km", "value": 6200},
             "duration": {"text": "9 mins", "value": 540}},
            {"status": "NOT_FOUND"}
        ]}],
        "status": "OK"
    }"#;

    fn google() -> GoogleMaps {
        GoogleMaps::new(
            "secret-key".to_string(),
            Region::default(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_directions() {
        let body: DirectionsBody = decode(DIRECTIONS, DIRECTIONS_OK).unwrap();
        let route = Route::try_from(body).unwrap();
        assert_eq!(route.distance.value, 17432.0);
        assert_eq!(route.duration.text, "19 mins");
        assert_eq!(route.summary, "Plenty Rd");
        assert_eq!(route.polyline, "abc~d");
        assert_eq!(route.end_address, "Mernda VIC 3754, Australia");
    }

    #[test]
    fn test_decode_directions_no_routes() {
        let body: DirectionsBody =
            decode(DIRECTIONS, r#"{"routes": [], "status": "OK"}"#).unwrap();
        assert!(Route::try_from(body).is_err());
    }

    #[test]
    fn test_decode_error_status() {
        let err = decode::<DirectionsBody>(
            DIRECTIONS,
            r#"{"routes": [], "status": "REQUEST_DENIED", "error_message": "bad key"}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "directions request failed due to REQUEST_DENIED: bad key"
        );

        let err = decode::<GeocodeBody>(GEOCODE, r#"{"results": [], "status": "ZERO_RESULTS"}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "geocode request failed due to ZERO_RESULTS");

        assert!(decode::<GeocodeBody>(GEOCODE, "<html>").is_err());
    }

    #[test]
    fn test_decode_geocode() {
        let body: GeocodeBody = decode(GEOCODE, GEOCODE_OK).unwrap();
        let locality = body.results[0]
            .address_components
            .iter()
            .find(|c| c.is("locality"))
            .unwrap();
        assert_eq!(locality.long_name, "Mernda");
    }

    #[test]
    fn test_decode_matrix() {
        let matrix: DistanceMatrix = decode(DISTANCE_MATRIX, MATRIX_OK).unwrap();
        let elements = &matrix.rows[0].elements;
        assert_eq!(elements[0].distance.as_ref().unwrap().value, 6200.0);
        assert_eq!(elements[1].status, "NOT_FOUND");
        assert!(elements[1].distance.is_none());
    }

    #[test]
    fn test_url() {
        let maps = google();
        let url = maps
            .url(
                GEOCODE,
                &[("address", "12 Main St, Mernda VIC".to_string())],
            )
            .unwrap();
        assert_eq!(url.path(), "/maps/api/geocode/json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("address".to_string(), "12 Main St, Mernda VIC".to_string()),
                ("key".to_string(), "secret-key".to_string()),
            ]
        );
    }
}
