use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] bazaar_core::Error),
    #[error(transparent)]
    Api(#[from] bazaar_core::pocketbase::ApiError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Bazaar ID cannot be empty")]
    EmptyBazaarId,
    #[error("Unknown food type '{0}'. Run `bazaar bazaars food-types` to list them.")]
    UnknownFoodType(String),
    #[error("Bazaar not found: {0}")]
    BazaarNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("You must be signed in to {0}. Run `bazaar auth login` first.")]
    SignInRequired(&'static str),
    #[error("{0}")]
    Rejected(String),
}

impl From<bazaar_core::auth::AuthError> for CliError {
    fn from(error: bazaar_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
