pub mod auth_cmd;
pub mod category;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod item;
pub mod lists;
pub mod sync;
