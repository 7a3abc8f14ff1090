use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Find, save and submit Ramadan bazaars from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local favorites database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the CLI config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse and submit bazaars
    #[command(alias = "b")]
    Bazaars {
        #[command(subcommand)]
        command: BazaarCommands,
    },
    /// Manage favorite bazaars
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        command: FavoriteCommands,
    },
    /// Sign in, register or sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Report problems with a listing and moderate reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Show or update the CLI config
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum BazaarCommands {
    /// List every approved bazaar
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search by name, address or district
    Search {
        /// Search query
        query: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Filter by food, rating and opening hours
    Filter {
        /// Food type slug, repeatable (e.g. --food-type satay)
        #[arg(long = "food-type", value_name = "SLUG")]
        food_types: Vec<String>,
        /// Minimum average rating
        #[arg(long, value_name = "RATING")]
        min_rating: Option<f64>,
        /// Only bazaars open right now
        #[arg(long)]
        open_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one bazaar with its reviews
    Show {
        /// Bazaar ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch several bazaars by ID
    ByIds {
        /// Bazaar IDs
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit a new bazaar for review
    Submit(SubmitArgs),
    /// List known food types
    FoodTypes,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub district: String,
    #[arg(long)]
    pub state: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub lat: String,
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub lng: String,
    /// Opening time, HH:MM
    #[arg(long, default_value = "15:00")]
    pub start: String,
    /// Closing time, HH:MM
    #[arg(long, default_value = "19:00")]
    pub end: String,
    #[arg(long, default_value = "")]
    pub stall_count: String,
    /// Food type slug, repeatable
    #[arg(long = "food-type", value_name = "SLUG", required = true)]
    pub food_types: Vec<String>,
}

#[derive(Subcommand)]
pub enum FavoriteCommands {
    /// Save a bazaar
    Add {
        /// Bazaar ID
        id: String,
    },
    /// Forget a bazaar
    Remove {
        /// Bazaar ID
        id: String,
    },
    /// List favorites of the current identity
    List {
        /// Fetch full bazaar details
        #[arg(long)]
        details: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Number of favorites of the current identity
    Count,
    /// Check whether a bazaar is a favorite
    Check {
        /// Bazaar ID
        id: String,
    },
    /// Upload local favorites, then pull remote ones
    Sync,
    /// Delete every favorite stored on this device
    Clear {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email or username
    Login {
        /// Email or username
        #[arg(long, value_name = "IDENTITY")]
        identity: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Repeat the password
        #[arg(long, value_name = "PASSWORD")]
        confirm: String,
    },
    /// Show who is signed in
    Status,
    /// Refresh the session token
    Refresh,
    /// Sign out and forget the stored session
    Logout,
    /// List enabled OAuth2 providers
    Methods,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReportStatusArg {
    Pending,
    Resolved,
    Dismissed,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Report a problem with a bazaar
    Create {
        /// Bazaar ID
        bazaar_id: String,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "")]
        details: String,
    },
    /// List reports
    List {
        /// Only reports about this bazaar
        #[arg(long, value_name = "ID")]
        bazaar: Option<String>,
        /// Only reports in this state
        #[arg(long, value_enum)]
        status: Option<ReportStatusArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a report resolved
    Resolve {
        /// Report ID
        id: String,
    },
    /// Dismiss a report
    Dismiss {
        /// Report ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// Backend base URL
        #[arg(long, value_name = "URL")]
        pocketbase_url: Option<String>,
        /// Mirror favorite writes to the backend while signed in
        #[arg(long, value_name = "BOOL")]
        cloud_sync: Option<bool>,
        /// Local favorites database path
        #[arg(long, value_name = "PATH")]
        db_path: Option<String>,
    },
    /// Print the effective config
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
