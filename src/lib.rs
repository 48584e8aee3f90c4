//! Quotes delivery prices from a fixed warehouse origin to a customer address.
//!
//! The price is derived from the driving distance reported by a mapping provider, overridden by a
//! small table of fixed-price suburbs, and annotated with the days on which the customer's suburb
//! receives deliveries.

mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
mod quoter;
mod utils;

#[cfg(test)]
mod test;

pub use api::Mode;
pub use config::{Config, DistanceSource, FixedPriceMatch, LatLng, Region};
pub use error::Error;
pub use error::Result;
pub use quoter::{Quoter, Submission};
