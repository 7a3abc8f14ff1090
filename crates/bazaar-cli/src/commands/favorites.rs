use bazaar_core::auth::IdentityResolver;
use bazaar_core::favorites::SyncReport;

use crate::cli::FavoriteCommands;
use crate::commands::bazaars::print_bazaars;
use crate::commands::common::{normalize_bazaar_id, AppContext};
use crate::error::CliError;

pub async fn run_favorites(command: FavoriteCommands, ctx: &AppContext) -> Result<(), CliError> {
    let favorites = ctx.favorites().await?;
    match command {
        FavoriteCommands::Add { id } => {
            let id = normalize_bazaar_id(&id)?;
            favorites.add_to_favorites(&id).await?;
            println!("Saved {id}");
        }
        FavoriteCommands::Remove { id } => {
            let id = normalize_bazaar_id(&id)?;
            favorites.remove_from_favorites(&id).await?;
            println!("Removed {id}");
        }
        FavoriteCommands::List { details, json } => {
            let ids = favorites.get_favorite_ids().await?;
            if details {
                print_bazaars(&ctx.bazaars().get_bazaars_by_ids(&ids).await, json)?;
            } else if json {
                println!("{}", serde_json::to_string_pretty(&ids)?);
            } else if ids.is_empty() {
                println!("No favorites yet.");
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
        FavoriteCommands::Count => println!("{}", favorites.get_favorite_count().await?),
        FavoriteCommands::Check { id } => {
            let id = normalize_bazaar_id(&id)?;
            let label = if favorites.is_favorite(&id).await {
                "favorite"
            } else {
                "not a favorite"
            };
            println!("{id}: {label}");
        }
        FavoriteCommands::Sync => {
            if !ctx.auth.is_authenticated() {
                return Err(CliError::SignInRequired("sync favorites"));
            }
            let uploaded = favorites.sync_local_favorites_to_cloud().await?;
            println!("{}", describe_report("Uploaded", &uploaded));
            let pulled = favorites.sync_favorites_from_cloud().await?;
            println!("{}", describe_report("Pulled", &pulled));
        }
        FavoriteCommands::Clear { yes } => {
            if !yes {
                return Err(CliError::Rejected(
                    "This deletes every favorite stored on this device. Re-run with --yes to confirm."
                        .to_string(),
                ));
            }
            let removed = favorites.clear_all_data().await?;
            println!("Removed {removed} favorite(s)");
        }
    }
    Ok(())
}

pub fn describe_report(verb: &str, report: &SyncReport) -> String {
    if report.failed == 0 {
        format!("{verb} {} favorite(s)", report.succeeded)
    } else {
        format!(
            "{verb} {}/{} favorite(s), {} failed",
            report.succeeded, report.attempted, report.failed
        )
    }
}
