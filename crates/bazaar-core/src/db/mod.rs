//! Database layer for Bazaar

mod connection;
mod favorite_repository;
mod migrations;

pub use connection::Database;
pub use favorite_repository::{FavoriteRepository, LibSqlFavoriteRepository};
