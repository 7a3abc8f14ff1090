//! Shared services used by the CLI and the favorites core.

mod database;

pub use database::DatabaseService;
