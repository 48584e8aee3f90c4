use crate::args::PriceArgs;
use crate::commands::Out;
use crate::model::{price_for, PriceQuote};
use crate::Result;

/// Handles the `quote price` command, which prices a distance in kilometers without contacting
/// the mapping provider.
pub fn price(args: &PriceArgs) -> Result<Out<PriceQuote>> {
    let quote = price_for(args.distance_km() * 1000.0)?;
    Ok(Out::new(quote.to_string(), quote))
}
