//! Service wrappers shared by clients

mod database;

pub use database::LibSqlListStore;
