//! REST backend for the user directory: a SQLite record store behind five
//! axum handlers under `/api/users`.

pub mod api;
pub mod config;
pub mod db;

pub use api::server::{AppState, StartupError, router, start_server};
pub use config::Config;
