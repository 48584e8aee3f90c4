//! Converts a driving distance into a delivery price.
//!
//! Distances up to 105 km are priced by a staircase of tiers. Beyond that, the price is the top
//! tier plus a per-kilometer charge, rounded up to the next multiple of ten dollars.

use crate::Result;
use anyhow::{bail, Context};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Distances above this many kilometers are priced per kilometer.
const LONG_DISTANCE_KM: u32 = 105;

/// The price of a delivery of exactly `LONG_DISTANCE_KM`.
const LONG_DISTANCE_BASE: u32 = 310;

/// Dollars charged for each kilometer beyond `LONG_DISTANCE_KM` (2.50).
const PER_KM_BEYOND: Decimal = Decimal::from_parts(250, 0, 0, false, 2);

/// Long distance prices are rounded up to a multiple of this many dollars.
const ROUND_TO: u32 = 10;

/// Attached to every long-distance quote.
pub const LONG_DISTANCE_ADVISORY: &str = "Please give us a call to confirm a specific day for \
    delivery.\n\nThe below day is just an estimate.";

/// One step of the pricing staircase. A distance is in this tier if it is less than or equal to
/// `max_km` and greater than the `max_km` of the previous tier.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Tier {
    pub max_km: u32,
    pub price: u32,
}

const fn tier(max_km: u32, price: u32) -> Tier {
    Tier { max_km, price }
}

/// The pricing staircase, ascending in both distance and price.
pub const TIERS: &[Tier] = &[
    tier(5, 70),
    tier(10, 80),
    tier(15, 90),
    tier(20, 100),
    tier(25, 110),
    tier(35, 120),
    tier(45, 130),
    tier(55, 140),
    tier(65, 160),
    tier(75, 190),
    tier(85, 230),
    tier(95, 270),
    tier(LONG_DISTANCE_KM, LONG_DISTANCE_BASE),
];

/// Where a quoted price came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// The address is in a suburb with a flat delivery price.
    FixedSuburb { suburb: String },
    /// The price was derived from the driving distance.
    Distance { meters: f64 },
}

/// A delivery price in whole dollars, excluding GST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    price: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisory: Option<String>,
    basis: PriceBasis,
}

impl PriceQuote {
    /// A flat price for a fixed-price suburb.
    pub fn fixed(suburb: impl Into<String>, price: u32) -> Self {
        Self {
            price,
            advisory: None,
            basis: PriceBasis::FixedSuburb {
                suburb: suburb.into(),
            },
        }
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn basis(&self) -> &PriceBasis {
        &self.basis
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.basis, PriceBasis::FixedSuburb { .. })
    }
}

impl Display for PriceQuote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Calculated Delivery Price: ${} plus GST", self.price)?;
        if let Some(advisory) = self.advisory() {
            write!(f, "\n\n{advisory}")?;
        }
        Ok(())
    }
}

/// Prices a delivery of `distance_meters`.
///
/// A distance of zero falls into the first tier. Negative, NaN and infinite distances are errors.
///
/// # Examples
/// ```
/// # use delivery_quote::model::price_for;
/// assert_eq!(price_for(5_000.0).unwrap().price(), 70);
/// assert_eq!(price_for(5_001.0).unwrap().price(), 80);
/// assert_eq!(price_for(150_000.0).unwrap().price(), 430);
/// ```
pub fn price_for(distance_meters: f64) -> Result<PriceQuote> {
    if !distance_meters.is_finite() || distance_meters < 0.0 {
        bail!("Cannot price a delivery distance of {distance_meters} meters");
    }
    let basis = PriceBasis::Distance {
        meters: distance_meters,
    };

    // Bounds are compared in meters, where every bound is exactly representable.
    if distance_meters > bound_meters(LONG_DISTANCE_KM) {
        let meters = Decimal::from_f64_retain(distance_meters)
            .with_context(|| format!("Unable to represent {distance_meters} meters as a decimal"))?;
        let km = meters / Decimal::ONE_THOUSAND;
        let extra = (km - Decimal::from(LONG_DISTANCE_KM)) * PER_KM_BEYOND;
        let raw = Decimal::from(LONG_DISTANCE_BASE) + extra;
        let rounded = (raw / Decimal::from(ROUND_TO)).ceil() * Decimal::from(ROUND_TO);
        let price = rounded
            .to_u32()
            .with_context(|| format!("The price {rounded} for {km} km is out of range"))?;
        return Ok(PriceQuote {
            price,
            advisory: Some(LONG_DISTANCE_ADVISORY.to_string()),
            basis,
        });
    }

    let tier = TIERS
        .iter()
        .find(|t| distance_meters <= bound_meters(t.max_km))
        .with_context(|| format!("No price tier covers {distance_meters} meters"))?;
    Ok(PriceQuote {
        price: tier.price,
        advisory: None,
        basis,
    })
}

fn bound_meters(km: u32) -> f64 {
    f64::from(km) * 1000.0
}
