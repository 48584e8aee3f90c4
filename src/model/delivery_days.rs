//! The days of the week on which each suburb receives deliveries.
//!
//! The table is read once from a JSON file or URL when the program starts. The load runs in the
//! background and quotes requested before it finishes simply have no delivery-day information.
//!
//! Example data:
//! ```json
//! {
//!   "MERNDA": { "Monday": true, "Tuesday": false, "Wednesday": true },
//!   "THOMASTOWN": { "Monday": true, "Friday": true }
//! }
//! ```

use crate::{utils, Result};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

/// A day of the week, serialized as its English name, e.g. `Monday`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

serde_plain::derive_display_from_serialize!(Weekday);
serde_plain::derive_fromstr_from_deserialize!(Weekday);

/// Whether delivery is available on each day of the week for one suburb. Days missing from the
/// record are not available.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryDays(BTreeMap<Weekday, bool>);

impl DeliveryDays {
    pub fn new(days: impl IntoIterator<Item = (Weekday, bool)>) -> Self {
        Self(days.into_iter().collect())
    }

    pub fn is_available(&self, day: Weekday) -> bool {
        self.0.get(&day).copied().unwrap_or(false)
    }

    /// The available days, Monday first.
    pub fn available(&self) -> Vec<Weekday> {
        self.0
            .iter()
            .filter(|(_, available)| **available)
            .map(|(day, _)| *day)
            .collect()
    }
}

/// Where the delivery-day data is read from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Url(Url),
}

impl DataSource {
    /// Interprets `s` as an `http` or `https` URL, or otherwise as a file path. Relative paths are
    /// resolved against `root`.
    pub fn parse(s: &str, root: &Path) -> Self {
        if let Ok(url) = Url::parse(s) {
            if matches!(url.scheme(), "http" | "https") {
                return DataSource::Url(url);
            }
        }
        let path = PathBuf::from(s);
        if path.is_absolute() {
            DataSource::File(path)
        } else {
            DataSource::File(root.join(path))
        }
    }

    /// Reads and parses the whole table. An HTTP request that takes longer than `timeout` fails.
    pub async fn load(&self, timeout: Duration) -> Result<HashMap<String, DeliveryDays>> {
        let content = match self {
            DataSource::File(path) => utils::read(path).await?,
            DataSource::Url(url) => fetch(url, timeout).await?,
        };
        parse_table(&content).with_context(|| format!("Unable to parse delivery days from {self}"))
    }
}

impl Display for DataSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{url}"),
        }
    }
}

async fn fetch(url: &Url, timeout: Duration) -> Result<String> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if is_loopback(url) {
        builder = builder.no_proxy();
    }
    let client = builder
        .build()
        .context("Unable to create the HTTP client")?;
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to request delivery days from {url}"))?;
    let status = response.status();
    ensure!(
        status.is_success(),
        "Request for delivery days from {url} failed with status {status}"
    );
    response
        .text()
        .await
        .with_context(|| format!("Failed to read delivery days response from {url}"))
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// The key a suburb is stored and looked up under.
fn suburb_key(suburb: &str) -> String {
    suburb.trim().to_uppercase()
}

/// Parses the JSON table and upper-cases its suburb keys.
///
/// A suburb whose record cannot be parsed is skipped with a warning. When two suburbs have the
/// same key after upper-casing, the one whose original name sorts first is kept.
pub fn parse_table(json: &str) -> Result<HashMap<String, DeliveryDays>> {
    let raw: HashMap<String, serde_json::Value> =
        serde_json::from_str(json).context("Delivery days JSON is malformed")?;
    let mut records: Vec<(String, serde_json::Value)> = raw.into_iter().collect();
    records.sort_by(|a, b| a.0.cmp(&b.0));

    let mut table = HashMap::with_capacity(records.len());
    for (suburb, record) in records {
        let days = match DeliveryDays::deserialize(record) {
            Ok(days) => days,
            Err(e) => {
                warn!("Skipping the delivery days for '{suburb}': {e}");
                continue;
            }
        };
        let key = suburb_key(&suburb);
        if table.contains_key(&key) {
            warn!("Ignoring the delivery days for '{suburb}', {key} is already listed");
            continue;
        }
        table.insert(key, days);
    }
    Ok(table)
}

/// The result of looking up a suburb in the `DeliveryDayTable`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Lookup {
    /// The table has not finished loading.
    NotLoaded,
    /// The table failed to load.
    Unavailable,
    /// The table is loaded but does not have the suburb.
    Absent,
    Found(DeliveryDays),
}

#[derive(Debug, Clone)]
enum TableState {
    Loading,
    Loaded(Arc<HashMap<String, DeliveryDays>>),
    Failed,
}

/// A process-wide, read-only view of the delivery-day data. Cloning is cheap and every clone sees
/// the same snapshot once it has loaded.
#[derive(Debug, Clone)]
pub struct DeliveryDayTable {
    state: watch::Receiver<TableState>,
}

impl DeliveryDayTable {
    /// Starts loading `source` in the background and returns immediately. Must be called from
    /// within a tokio runtime. An HTTP source that takes longer than `timeout` fails to load.
    pub fn spawn_load(source: DataSource, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(TableState::Loading);
        tokio::spawn(async move {
            debug!("Loading delivery days from {source}");
            let state = match source.load(timeout).await {
                Ok(table) => {
                    info!("Loaded delivery days for {} suburbs", table.len());
                    TableState::Loaded(Arc::new(table))
                }
                Err(e) => {
                    warn!("Error loading delivery days data from {source}: {e:#}");
                    TableState::Failed
                }
            };
            tx.send_replace(state);
        });
        Self { state: rx }
    }

    /// A table that has already loaded `table`.
    pub fn loaded(table: HashMap<String, DeliveryDays>) -> Self {
        let table = table
            .into_iter()
            .map(|(suburb, days)| (suburb_key(&suburb), days))
            .collect();
        Self::with_state(TableState::Loaded(Arc::new(table)))
    }

    /// A table that will never finish loading.
    pub fn not_loaded() -> Self {
        Self::with_state(TableState::Loading)
    }

    /// A table whose load failed.
    pub fn failed() -> Self {
        Self::with_state(TableState::Failed)
    }

    fn with_state(state: TableState) -> Self {
        let (_, rx) = watch::channel(state);
        Self { state: rx }
    }

    /// Waits until the load has either succeeded or failed.
    pub async fn settled(&self) {
        let mut rx = self.state.clone();
        if rx
            .wait_for(|s| !matches!(s, TableState::Loading))
            .await
            .is_err()
        {
            debug!("The delivery days loader stopped before it finished");
        }
    }

    /// Waits at most `limit` for the load to succeed or fail. Returns false if it is still
    /// loading.
    pub async fn settled_within(&self, limit: Duration) -> bool {
        if tokio::time::timeout(limit, self.settled()).await.is_err() {
            warn!("The delivery days did not load within {}s", limit.as_secs_f64());
            return false;
        }
        true
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.borrow(), TableState::Loaded(_))
    }

    /// Looks up `suburb`, which is upper-cased before matching.
    pub fn lookup(&self, suburb: &str) -> Lookup {
        match &*self.state.borrow() {
            TableState::Loading => Lookup::NotLoaded,
            TableState::Failed => Lookup::Unavailable,
            TableState::Loaded(table) => match table.get(&suburb_key(suburb)) {
                Some(days) => Lookup::Found(days.clone()),
                None => Lookup::Absent,
            },
        }
    }
}
