//! Configuration file handling.
//!
//! The configuration file is stored at `$QUOTE_HOME/config.json` and contains the warehouse
//! origin, the location of the delivery-day data, the region that geocoding is restricted to, and
//! the path to the Google Maps API key.

use crate::model::DataSource;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "delivery-quote";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const API_KEY: &str = "api_key";
const CONFIG_JSON: &str = "config.json";
const DEFAULT_ORIGIN: &str = "308-320 Settlement Rd, Thomastown VIC 3074";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The environment variable that, when set, takes precedence over the API key file.
pub(crate) const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Which provider operation supplies the distance used for pricing.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    /// The length of the first leg of the driving route.
    #[default]
    Route,
    /// The first element of a one-by-one distance matrix.
    Matrix,
}

serde_plain::derive_display_from_serialize!(DistanceSource);
serde_plain::derive_fromstr_from_deserialize!(DistanceSource);

/// How an address is matched against the fixed-price suburbs.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedPriceMatch {
    /// The typed address contains the suburb name. Applied before the provider responds.
    #[default]
    Substring,
    /// The geocoded locality equals the suburb name.
    Locality,
}

serde_plain::derive_display_from_serialize!(FixedPriceMatch);
serde_plain::derive_fromstr_from_deserialize!(FixedPriceMatch);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// The area that geocoding is restricted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// ISO 3166-1 country code.
    pub country: String,
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Default for Region {
    /// The state of Victoria, Australia.
    fn default() -> Self {
        Self {
            country: "AU".to_string(),
            south_west: LatLng {
                lat: -39.224089,
                lng: 140.961681,
            },
            north_east: LatLng {
                lat: -33.981281,
                lng: 150.014707,
            },
        }
    }
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$QUOTE_HOME` and from there it loads `$QUOTE_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the data directory, its secrets subdirectory and:
    /// - Creates an initial `config.json` file using `suburb_data` and `origin`
    /// - Copies `api_key_file`, if given, into its default location in the data dir.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of data directory, e.g. `$HOME/delivery-quote`
    /// - `suburb_data` - A path or URL to the delivery-day JSON. Relative paths are relative to
    ///   `dir`.
    /// - `origin` - The warehouse address. Defaults to the Thomastown warehouse.
    /// - `api_key_file` - A file holding the Google Maps API key.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(
        dir: impl Into<PathBuf>,
        suburb_data: &str,
        origin: Option<&str>,
        api_key_file: Option<&Path>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the quote home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        if let Some(api_key_file) = api_key_file {
            utils::copy(api_key_file, secrets.join(API_KEY)).await?;
        }

        let config_file = ConfigFile {
            suburb_data: suburb_data.to_string(),
            origin: origin.unwrap_or(DEFAULT_ORIGIN).to_string(),
            ..ConfigFile::default()
        };
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `quote_home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(quote_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = quote_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The quote home directory is missing, run 'quote init' to create it")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The warehouse address that every route starts from.
    pub fn origin(&self) -> &str {
        &self.config_file.origin
    }

    /// Where the delivery-day table is loaded from.
    pub fn suburb_data(&self) -> DataSource {
        DataSource::parse(&self.config_file.suburb_data, &self.root)
    }

    pub fn distance_source(&self) -> DistanceSource {
        self.config_file.distance_source
    }

    pub fn fixed_price_match(&self) -> FixedPriceMatch {
        self.config_file.fixed_price_match
    }

    pub fn region(&self) -> &Region {
        &self.config_file.region
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }

    /// Returns the stored `api_key_path` if it is absolute, otherwise resolves the relative path.
    pub fn api_key_path(&self) -> PathBuf {
        let p = self.config_file.api_key_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// The Google Maps API key, from `GOOGLE_MAPS_API_KEY` if set, otherwise from the key file.
    pub async fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }
        let path = self.api_key_path();
        let key = utils::read(&path).await.with_context(|| {
            format!("No API key found: set {API_KEY_ENV} or pass --api-key-file to 'quote init'")
        })?;
        let key = key.trim();
        if key.is_empty() {
            bail!("The API key file '{}' is empty", path.display())
        }
        Ok(key.to_string())
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "delivery-quote",
///   "config_version": 1,
///   "origin": "308-320 Settlement Rd, Thomastown VIC 3074",
///   "suburb_data": "Suburb.json",
///   "api_key_path": ".secrets/api_key",
///   "distance_source": "route",
///   "fixed_price_match": "substring",
///   "region": {
///     "country": "AU",
///     "south_west": { "lat": -39.224089, "lng": 140.961681 },
///     "north_east": { "lat": -33.981281, "lng": 150.014707 }
///   },
///   "request_timeout_secs": 30
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "delivery-quote"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The warehouse address
    #[serde(default = "default_origin")]
    origin: String,

    /// Path (relative to config.json or absolute) or URL of the delivery-day JSON
    suburb_data: String,

    /// Path to the Google Maps API key file (optional, relative to config.json or absolute)
    /// Defaults to $QUOTE_HOME/.secrets/api_key if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key_path: Option<PathBuf>,

    #[serde(default)]
    distance_source: DistanceSource,

    #[serde(default)]
    fixed_price_match: FixedPriceMatch,

    #[serde(default)]
    region: Region,

    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            origin: default_origin(),
            suburb_data: String::new(),
            api_key_path: None,
            distance_source: DistanceSource::default(),
            fixed_price_match: FixedPriceMatch::default(),
            region: Region::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the API key path. If None, defaults to .secrets/api_key
    fn api_key_path(&self) -> PathBuf {
        self.api_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("quote_home");
        let key_file = dir.path().join("key.txt");
        utils::write(&key_file, "  abc123\n").await.unwrap();

        let config = Config::create(&home_dir, "Suburb.json", None, Some(&key_file))
            .await
            .unwrap();

        assert_eq!(DEFAULT_ORIGIN, config.origin());
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(
            config.suburb_data(),
            DataSource::File(config.root().join("Suburb.json"))
        );
        let found = utils::read(&config.api_key_path()).await.unwrap();
        assert_eq!("  abc123\n", found);

        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(loaded.origin(), config.origin());
        assert_eq!(loaded.distance_source(), DistanceSource::Route);
        assert_eq!(loaded.fixed_price_match(), FixedPriceMatch::Substring);
        assert_eq!(loaded.region(), &Region::default());
        assert_eq!(loaded.request_timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_config_create_with_origin() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(
            dir.path(),
            "https://example.com/Suburb.json",
            Some("1 Warehouse Way, Epping VIC"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(config.origin(), "1 Warehouse Way, Epping VIC");
        assert!(matches!(config.suburb_data(), DataSource::Url(_)));
    }

    #[tokio::test]
    async fn test_config_load_missing() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "delivery-quote",
            "config_version": 1,
            "suburb_data": "data/Suburb.json",
            "distance_source": "matrix",
            "fixed_price_match": "locality"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.distance_source, DistanceSource::Matrix);
        assert_eq!(config.fixed_price_match, FixedPriceMatch::Locality);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.api_key_path(), PathBuf::from(SECRETS).join(API_KEY));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "tiller",
            "config_version": 1,
            "suburb_data": "Suburb.json"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("config.json");
        let original = ConfigFile {
            suburb_data: "https://example.com/Suburb.json".to_string(),
            api_key_path: Some(PathBuf::from("/etc/maps_key")),
            distance_source: DistanceSource::Matrix,
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        let read = ConfigFile::load(&path).await.unwrap();
        assert_eq!(original, read);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("api_key_path"));
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(DistanceSource::Matrix.to_string(), "matrix");
        assert_eq!(
            "locality".parse::<FixedPriceMatch>().unwrap(),
            FixedPriceMatch::Locality
        );
    }
}
