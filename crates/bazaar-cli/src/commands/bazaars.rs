use bazaar_core::api::BazaarFilter;
use bazaar_core::auth::IdentityResolver;
use bazaar_core::models::BazaarSubmission;
use bazaar_core::{Bazaar, FoodType};

use crate::cli::{BazaarCommands, SubmitArgs};
use crate::commands::common::{
    format_bazaar_detail, format_bazaar_lines, normalize_bazaar_id, normalize_search_query,
    parse_food_types, AppContext,
};
use crate::error::CliError;

pub async fn run_bazaars(command: BazaarCommands, ctx: &AppContext) -> Result<(), CliError> {
    let api = ctx.bazaars();
    match command {
        BazaarCommands::List { json } => print_bazaars(&api.get_all_bazaars().await, json),
        BazaarCommands::Search { query, json } => {
            let query = normalize_search_query(&query)?;
            print_bazaars(&api.search_bazaars(&query).await, json)
        }
        BazaarCommands::Filter {
            food_types,
            min_rating,
            open_only,
            json,
        } => {
            let criteria = BazaarFilter {
                food_types: parse_food_types(&food_types)?,
                min_rating,
                open_only,
            };
            print_bazaars(&api.filter_bazaars(&criteria).await, json)
        }
        BazaarCommands::Show { id, json } => {
            let id = normalize_bazaar_id(&id)?;
            let bazaar = api
                .get_bazaar_by_id(&id)
                .await
                .ok_or(CliError::BazaarNotFound(id))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bazaar)?);
            } else {
                for line in format_bazaar_detail(&bazaar) {
                    println!("{line}");
                }
            }
            Ok(())
        }
        BazaarCommands::ByIds { ids, json } => {
            let ids = ids
                .iter()
                .map(|id| normalize_bazaar_id(id))
                .collect::<Result<Vec<_>, _>>()?;
            print_bazaars(&api.get_bazaars_by_ids(&ids).await, json)
        }
        BazaarCommands::Submit(args) => {
            let user_id = ctx
                .auth
                .current_user_id()
                .ok_or(CliError::SignInRequired("submit a bazaar"))?;
            let submission = submission_from_args(args)?;
            let created = api
                .submit_bazaar(&submission, &user_id)
                .await
                .ok_or_else(|| {
                    CliError::Rejected("Bazaar submission was not accepted; see the log for details".to_string())
                })?;
            println!("Submitted {} ({}) for review", created.name, created.id);
            Ok(())
        }
        BazaarCommands::FoodTypes => {
            for food in FoodType::ALL {
                println!("{:<14}  {}", food.slug(), food.label());
            }
            Ok(())
        }
    }
}

pub fn print_bazaars(bazaars: &[Bazaar], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(bazaars)?);
    } else if bazaars.is_empty() {
        println!("No bazaars found.");
    } else {
        for line in format_bazaar_lines(bazaars) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Build the form and check it locally, so bad input never reaches the backend
pub fn submission_from_args(args: SubmitArgs) -> Result<BazaarSubmission, CliError> {
    let submission = BazaarSubmission {
        name: args.name,
        description: args.description,
        address: args.address,
        district: args.district,
        state: args.state,
        lat: args.lat,
        lng: args.lng,
        start_time: args.start,
        end_time: args.end,
        stall_count: args.stall_count,
        food_types: parse_food_types(&args.food_types)?,
    };
    submission.validate()?;
    Ok(submission)
}
