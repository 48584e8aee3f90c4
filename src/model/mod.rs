//! Types that represent the pricing rules and the quote itself.
mod delivery_days;
mod fixed_price;
mod price;
mod quote;

pub use delivery_days::{
    parse_table, DataSource, DeliveryDayTable, DeliveryDays, Lookup, Weekday,
};
pub use fixed_price::{FixedPrice, FixedPriceTable};
pub use price::{price_for, PriceBasis, PriceQuote, Tier, LONG_DISTANCE_ADVISORY, TIERS};
pub use quote::{Quote, RouteSummary, SuburbDays};
