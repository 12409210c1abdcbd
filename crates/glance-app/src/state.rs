use std::path::PathBuf;
use std::sync::Arc;

use glance_config::Config;
use tokio::sync::RwLock;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    /// Where the settings profile was loaded from
    pub settings_path: PathBuf,
}

impl AppState {
    pub fn new(config: Config, settings_path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            settings_path,
        }
    }
}
