//! Biblio book-lending server
//!
//! REST JSON API over PostgreSQL for a library's catalog, its readers and
//! librarians, and the loans that move copies off and back onto the shelf.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
