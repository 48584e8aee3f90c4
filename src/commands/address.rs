use crate::args::AddressArgs;
use crate::commands::Out;
use crate::model::Quote;
use crate::{Config, Mode, Quoter, Result};
use anyhow::Context;

/// Handles the `quote address` command.
///
/// The delivery-day table is given up to the request timeout to finish loading before the address
/// is submitted, so that a one-off quote has the delivery days when they are available.
pub async fn address(config: &Config, mode: Mode, args: &AddressArgs) -> Result<Out<Quote>> {
    let quoter = Quoter::from_config(config, mode).await?;
    quoter
        .delivery_days()
        .settled_within(config.request_timeout())
        .await;
    quote_address(&quoter, &args.address()).await
}

pub(super) async fn quote_address(quoter: &Quoter, address: &str) -> Result<Out<Quote>> {
    let quote = quoter
        .submit(address)
        .await
        .context("The quote was superseded by another request")?;
    Ok(quote_out(address, quote))
}

/// Renders `quote` followed by its route.
pub(super) fn quote_out(address: &str, quote: Quote) -> Out<Quote> {
    if quote.is_empty() {
        return Out::new(format!("No quote could be calculated for '{address}'"), quote);
    }
    let mut message = quote.to_string();
    if let Some(route) = &quote.route {
        message.push_str(&format!("\n\n{route}"));
    }
    Out::new(message, quote)
}
