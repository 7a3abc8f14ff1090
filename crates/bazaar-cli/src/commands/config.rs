use std::path::Path;

use bazaar_core::config::ClientConfig;
use bazaar_core::util::normalize_text_option;

use crate::commands::common::AppContext;
use crate::error::CliError;

/// `config init` works from the file alone, so a broken environment can
/// still be fixed through it.
pub fn run_config_init(
    config_path: &Path,
    pocketbase_url: Option<String>,
    cloud_sync: Option<bool>,
    db_path: Option<String>,
) -> Result<(), CliError> {
    let existing = ClientConfig::load_from_path(config_path).map_err(CliError::Config)?;
    let updated = apply_init(existing, pocketbase_url, cloud_sync, db_path);
    updated
        .save_to_path(config_path)
        .map_err(CliError::Config)?;

    println!("Saved config to {}", config_path.display());
    println!("  pocketbase_url = {}", updated.pocketbase_url);
    println!("  cloud_sync = {}", updated.cloud_sync);
    Ok(())
}

pub fn run_config_show(ctx: &AppContext, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
        return Ok(());
    }
    println!("config_path = {}", ctx.config_path.display());
    println!("pocketbase_url = {}", ctx.config.pocketbase_url);
    println!("cloud_sync = {}", ctx.config.cloud_sync);
    println!("db_path = {}", ctx.db_path.display());
    match ctx.auth.session() {
        Some(session) => println!("signed_in_as = {}", session.record.display_name()),
        None => println!("signed_in_as = (anonymous)"),
    }
    Ok(())
}

/// Merge explicit `config init` flags over the stored config; blank flags
/// keep the stored value.
pub fn apply_init(
    mut config: ClientConfig,
    pocketbase_url: Option<String>,
    cloud_sync: Option<bool>,
    db_path: Option<String>,
) -> ClientConfig {
    if let Some(url) = normalize_text_option(pocketbase_url) {
        config.pocketbase_url = url;
    }
    if let Some(enabled) = cloud_sync {
        config.cloud_sync = enabled;
    }
    if let Some(path) = normalize_text_option(db_path) {
        config.db_path = Some(path);
    }
    config
}
