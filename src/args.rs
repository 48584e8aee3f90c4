//! These structs provide the CLI interface for the quote CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// quote: A command-line tool for quoting delivery prices.
///
/// The price of a delivery is based on the driving distance from the warehouse to the customer's
/// address, as measured by Google Maps. A handful of suburbs have a flat price. Each quote also
/// shows the days of the week on which the customer's suburb receives deliveries.
///
/// You will need a Google Maps API key with the Directions, Distance Matrix and Geocoding APIs
/// enabled, and a JSON file listing the delivery days for each suburb. Run `quote init` first.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. You need to get a few things ready beforehand.
    ///
    /// - Decide what directory you want to store the configuration in and pass this as
    ///   --quote-home. By default, it will be $HOME/delivery-quote.
    ///
    /// - Get the delivery days JSON file and pass its path or URL as --suburb-data. A relative
    ///   path is resolved against the quote home directory.
    ///
    /// - Save your Google Maps API key to a file and pass it as --api-key-file. Alternatively, set
    ///   GOOGLE_MAPS_API_KEY whenever you run the program.
    Init(InitArgs),
    /// Quote a delivery to an address.
    Address(AddressArgs),
    /// Show the price for a driving distance without contacting Google Maps.
    Price(PriceArgs),
    /// Show the delivery days for a suburb.
    Days(DaysArgs),
    /// Read addresses from stdin, one per line, and quote each of them.
    ///
    /// A new address supersedes any quote that is still in progress, whose result is discarded.
    Session(SessionArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration is held. Defaults to ~/delivery-quote
    #[arg(long, env = "QUOTE_HOME", default_value_t = default_quote_home())]
    quote_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, quote_home: PathBuf) -> Self {
        Self {
            log_level,
            quote_home: quote_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn quote_home(&self) -> &DisplayPath {
        &self.quote_home
    }
}

/// Args for the `quote init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path or http(s) URL of the delivery days JSON file.
    #[arg(long)]
    suburb_data: String,

    /// The warehouse address that deliveries start from.
    #[arg(long)]
    origin: Option<String>,

    /// A file containing your Google Maps API key. It will be copied into the secrets directory.
    #[arg(long)]
    api_key_file: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(
        suburb_data: impl Into<String>,
        origin: Option<String>,
        api_key_file: Option<PathBuf>,
    ) -> Self {
        Self {
            suburb_data: suburb_data.into(),
            origin,
            api_key_file,
        }
    }

    pub fn suburb_data(&self) -> &str {
        &self.suburb_data
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn api_key_file(&self) -> Option<&Path> {
        self.api_key_file.as_deref()
    }
}

/// Args for the `quote address` command.
#[derive(Debug, Parser, Clone)]
pub struct AddressArgs {
    /// The customer's address, e.g. 123 Example St, Craigieburn VIC 3064
    #[arg(required = true, num_args = 1..)]
    address: Vec<String>,
}

impl AddressArgs {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: vec![address.into()],
        }
    }

    /// The address words joined with spaces.
    pub fn address(&self) -> String {
        self.address.join(" ")
    }
}

/// Args for the `quote price` command.
#[derive(Debug, Parser, Clone)]
pub struct PriceArgs {
    /// The driving distance in kilometers.
    #[arg(allow_negative_numbers = true)]
    distance_km: f64,
}

impl PriceArgs {
    pub fn new(distance_km: f64) -> Self {
        Self { distance_km }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }
}

/// Args for the `quote days` command.
#[derive(Debug, Parser, Clone)]
pub struct DaysArgs {
    /// The suburb name, in any case.
    #[arg(required = true, num_args = 1..)]
    suburb: Vec<String>,
}

impl DaysArgs {
    pub fn new(suburb: impl Into<String>) -> Self {
        Self {
            suburb: vec![suburb.into()],
        }
    }

    pub fn suburb(&self) -> String {
        self.suburb.join(" ")
    }
}

/// Args for the `quote session` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SessionArgs {}

fn default_quote_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("delivery-quote"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --quote-home or QUOTE_HOME instead of relying on the default \
                quote home directory.",
            );
            PathBuf::from("delivery-quote")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let args = Args::parse_from([
            "quote",
            "--quote-home",
            "/tmp/q",
            "address",
            "123",
            "Example",
            "St,",
            "Craigieburn",
        ]);
        assert_eq!(args.common().quote_home().path(), Path::new("/tmp/q"));
        match args.command() {
            Command::Address(a) => assert_eq!(a.address(), "123 Example St, Craigieburn"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_price_and_log_level() {
        let args = Args::parse_from(["quote", "--log-level", "debug", "price", "15.5"]);
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Price(p) => assert_eq!(p.distance_km(), 15.5),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["quote", "price", "-3"]).is_ok());
    }

    #[test]
    fn test_parse_init() {
        let args = Args::parse_from([
            "quote",
            "init",
            "--suburb-data",
            "Suburb.json",
            "--api-key-file",
            "/tmp/key",
        ]);
        match args.command() {
            Command::Init(i) => {
                assert_eq!(i.suburb_data(), "Suburb.json");
                assert_eq!(i.api_key_file(), Some(Path::new("/tmp/key")));
                assert_eq!(i.origin(), None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Args::try_parse_from(["quote", "init"]).is_err());
    }
}
