//! Database layer for Basket

mod connection;
mod migrations;
mod repository;
mod settings_repository;

pub use connection::Database;
pub use repository::{LibSqlListRepository, ListRepository};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
