use crate::args::InitArgs;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its secrets subdirectory and:
/// - Creates an initial `config.json` file pointing at the delivery-day data
/// - Copies the API key file, if one was given, into its default location in the data dir.
///
/// # Arguments
/// - `quote_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/delivery-quote`
/// - `args` - The suburb data location, warehouse origin and API key file.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(quote_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        quote_home,
        args.suburb_data(),
        args.origin(),
        args.api_key_file(),
    )
    .await
    .context("Unable to create the data directory and config")?;
    Ok(format!(
        "Successfully created the quote directory and config at {}",
        config.config_path().display()
    )
    .into())
}
