use std::path::{Path, PathBuf};
use std::sync::Arc;

use bazaar_core::api::{BazaarApi, ReportApi};
use bazaar_core::auth::{AuthStore, PocketBaseAuth};
use bazaar_core::config::ClientConfig;
use bazaar_core::favorites::FavoritesService;
use bazaar_core::models::{format_date, Report};
use bazaar_core::pocketbase::PocketBaseClient;
use bazaar_core::services::DatabaseService;
use bazaar_core::{Bazaar, FoodType};

use crate::auth::KeyringSessionStore;
use crate::error::CliError;

const APP_DIR: &str = "bazaar";
const CONFIG_FILE_NAME: &str = "cli-config.json";
const DB_FILE_NAME: &str = "bazaar.db";

pub type Favorites = FavoritesService<DatabaseService, PocketBaseClient, AuthStore>;

/// Everything a command needs, resolved once from flags, config and env
pub struct AppContext {
    pub config: ClientConfig,
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub auth: AuthStore,
    pub client: PocketBaseClient,
}

impl AppContext {
    pub fn load(
        cli_config_path: Option<PathBuf>,
        cli_db_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config_path = match cli_config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let config = ClientConfig::load_from_path(&config_path)
            .and_then(ClientConfig::with_env_overrides)
            .map_err(CliError::Config)?;
        let db_path = resolve_db_path(cli_db_path, &config)?;

        let auth = AuthStore::with_persistence(Arc::new(KeyringSessionStore::for_backend(
            &config.pocketbase_url,
        )));
        if let Err(error) = auth.restore() {
            tracing::warn!("Could not restore stored session: {}", error);
        }
        let client = PocketBaseClient::new(&config.pocketbase_url, auth.clone())?;

        Ok(Self {
            config,
            config_path,
            db_path,
            auth,
            client,
        })
    }

    pub async fn favorites(&self) -> Result<Favorites, CliError> {
        let db = open_database(&self.db_path).await?;
        Ok(FavoritesService::new(
            db,
            self.client.clone(),
            self.auth.clone(),
            self.config.cloud_sync,
        ))
    }

    pub fn bazaars(&self) -> BazaarApi<PocketBaseClient> {
        BazaarApi::new(self.client.clone())
    }

    pub fn reports(&self) -> ReportApi<PocketBaseClient> {
        ReportApi::new(self.client.clone())
    }

    pub fn auth_client(&self) -> PocketBaseAuth {
        PocketBaseAuth::new(self.client.clone())
    }
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".to_string()))
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join(DB_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// `--db-path`, then the config (including `BAZAAR_DB_PATH`), then the
/// platform data directory.
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &ClientConfig,
) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| config.db_path()) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub async fn open_database(path: &Path) -> Result<DatabaseService, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(DatabaseService::open_path(path).await?)
}

pub fn normalize_search_query(parts: &[String]) -> Result<String, CliError> {
    let query = parts.join(" ");
    let query = query.trim();
    if query.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(query.to_string())
    }
}

pub fn normalize_bazaar_id(raw: &str) -> Result<String, CliError> {
    let id = raw.trim();
    if id.is_empty() {
        Err(CliError::EmptyBazaarId)
    } else {
        Ok(id.to_string())
    }
}

pub fn parse_food_types(slugs: &[String]) -> Result<Vec<FoodType>, CliError> {
    slugs
        .iter()
        .map(|slug| {
            slug.parse::<FoodType>()
                .map_err(|_| CliError::UnknownFoodType(slug.trim().to_string()))
        })
        .collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

fn open_label(bazaar: &Bazaar) -> &'static str {
    if bazaar.is_open {
        "open"
    } else {
        "closed"
    }
}

fn location(bazaar: &Bazaar) -> String {
    [bazaar.district.trim(), bazaar.state.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_bazaar_lines(bazaars: &[Bazaar]) -> Vec<String> {
    bazaars
        .iter()
        .map(|bazaar| {
            let name = truncate(&bazaar.name, 32);
            format!(
                "{:<15}  {name:<32}  {:>3.1}  {:<6}  {}",
                bazaar.id,
                bazaar.rating,
                open_label(bazaar),
                location(bazaar)
            )
        })
        .collect()
}

pub fn format_bazaar_detail(bazaar: &Bazaar) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", bazaar.name, bazaar.id),
        format!("  {}", bazaar.address),
        format!("  {}", location(bazaar)),
        format!(
            "  Hours {}-{} ({}), {} stalls",
            bazaar.operating_hours.start,
            bazaar.operating_hours.end,
            open_label(bazaar),
            bazaar.stall_count
        ),
        format!(
            "  Rating {:.1} from {} review(s)",
            bazaar.rating, bazaar.review_count
        ),
    ];
    if !bazaar.food_types.is_empty() {
        let foods = bazaar
            .food_types
            .iter()
            .map(|food| food.slug())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  Food: {foods}"));
    }
    if !bazaar.description.trim().is_empty() {
        lines.push(format!("  {}", truncate(&bazaar.description, 160)));
    }
    for review in &bazaar.reviews {
        lines.push(format!(
            "  - {} {:.1} {}: {}",
            review.created_at,
            review.rating,
            review.user_name,
            truncate(&review.comment, 80)
        ));
    }
    lines
}

pub fn format_report_lines(reports: &[Report]) -> Vec<String> {
    reports
        .iter()
        .map(|report| {
            format!(
                "{:<15}  {:<10}  {:<9}  bazaar={}  {}",
                report.id,
                format_date(&report.created_at),
                report.status.as_str(),
                report.bazaar_id,
                truncate(&format!("{} {}", report.reason, report.details), 60)
            )
        })
        .collect()
}
