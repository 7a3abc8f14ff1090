//! bazaar-core - Core library for Bazaar
//!
//! This crate contains the shared models, the local favorites store, the
//! record API client and the business logic used by every Bazaar interface.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod favorites;
pub mod models;
pub mod pocketbase;
pub mod services;
pub mod util;

pub use error::{Error, Result};
pub use models::{Bazaar, FavoriteRecord, FoodType, OwnerScope};
