//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{DistanceResolver, TestMaps};
use crate::model::{parse_table, DeliveryDayTable};
use crate::{Config, DistanceSource, FixedPriceMatch, Quoter};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

pub(crate) const ORIGIN: &str = "308-320 Settlement Rd, Thomastown VIC 3074";

/// The delivery-day table used by tests.
pub(crate) const DAYS: &str = r#"{
    "MERNDA": {"Monday": true, "Tuesday": false, "Wednesday": false, "Thursday": true,
               "Friday": false, "Saturday": false, "Sunday": false},
    "CRAIGIEBURN": {"Tuesday": true, "Thursday": true},
    "SUNBURY": {"Tuesday": true},
    "EPPING": {"Monday": true, "Wednesday": true, "Friday": true}
}"#;

/// Test environment that sets up a quote home directory with a Config and a delivery-day file.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a quote home whose config points at a relative `Suburb.json`.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("delivery-quote");
        let config = Config::create(&root, "Suburb.json", None, None)
            .await
            .unwrap();
        tokio::fs::write(config.root().join("Suburb.json"), DAYS)
            .await
            .unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Creates a quote home whose config reads the delivery days from `suburb_data` and gives up
    /// on HTTP requests after `request_timeout_secs`.
    pub(crate) async fn with_suburb_data(suburb_data: &str, request_timeout_secs: u64) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("delivery-quote");
        let config = Config::create(&root, suburb_data, None, None)
            .await
            .unwrap();
        let json = serde_json::json!({
            "app_name": "delivery-quote",
            "config_version": 1,
            "suburb_data": suburb_data,
            "request_timeout_secs": request_timeout_secs,
        });
        tokio::fs::write(config.config_path(), json.to_string())
            .await
            .unwrap();
        let config = Config::load(&root).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    pub(crate) fn suburb_data_path(&self) -> PathBuf {
        self.config.root().join("Suburb.json")
    }
}

/// A `Quoter` backed by `maps` with the test delivery-day table already loaded.
pub(crate) fn quoter_with(
    maps: TestMaps,
    matching: FixedPriceMatch,
    source: DistanceSource,
) -> Quoter {
    Quoter::new(
        ORIGIN,
        DistanceResolver::new(Arc::new(maps), source),
        matching,
        DeliveryDayTable::loaded(parse_table(DAYS).unwrap()),
    )
}

/// A `Quoter` with the default fixed-price matching and distance source.
pub(crate) fn quoter(maps: TestMaps) -> Quoter {
    quoter_with(maps, FixedPriceMatch::default(), DistanceSource::default())
}

/// Serves `body` with `status` to every connection on a local port and returns its URL.
pub(crate) async fn http_server(status: u16, body: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\n\
                Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    Url::parse(&format!("http://127.0.0.1:{port}/Suburb.json")).unwrap()
}

/// Accepts connections on a local port but never answers them. Returns its URL.
pub(crate) async fn silent_http_server() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    Url::parse(&format!("http://127.0.0.1:{port}/Suburb.json")).unwrap()
}
