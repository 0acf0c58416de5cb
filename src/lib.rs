pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod player;
pub mod routes;
pub mod services;

pub use config::{Config, PipelineSettings};
pub use error::{AppError, AppResult};
pub use routes::{create_router, AppState};
