pub mod auth_cmd;
pub mod bazaars;
pub mod common;
pub mod completions;
pub mod config;
pub mod favorites;
pub mod reports;
