pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod intents;
pub mod models;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use auth::AccessGuard;
pub use config::{Settings, TrackerConfig};
pub use state::AppState;
pub use storage::{load_document, persist_document};
