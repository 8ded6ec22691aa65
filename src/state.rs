use crate::auth::AccessGuard;
use crate::config::TrackerConfig;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TrackerConfig>,
    pub guard: AccessGuard,
    pub data_path: PathBuf,
    // last writer wins; this only keeps file writes from interleaving
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: TrackerConfig, guard: AccessGuard, data_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            guard,
            data_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
