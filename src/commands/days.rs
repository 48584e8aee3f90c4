use crate::args::DaysArgs;
use crate::commands::Out;
use crate::model::{DeliveryDayTable, Lookup, SuburbDays};
use crate::{Config, Result};
use anyhow::bail;

/// Handles the `quote days` command. Waits for the delivery-day table to load and looks up the
/// suburb.
pub async fn days(config: &Config, args: &DaysArgs) -> Result<Out<SuburbDays>> {
    let source = config.suburb_data();
    let table = DeliveryDayTable::spawn_load(source.clone(), config.request_timeout());
    if !table.settled_within(config.request_timeout()).await {
        bail!("Timed out loading the delivery days from {source}");
    }
    let suburb = args.suburb().trim().to_uppercase();
    let lookup = table.lookup(&suburb);
    if lookup == Lookup::Unavailable {
        bail!("Unable to load the delivery days from {source}");
    }
    let days = SuburbDays::from_lookup(suburb, lookup);
    Ok(Out::new(days.to_string(), days))
}
