use std::env;
use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub snapshot_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = match env::var("SCHEDULING_API_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("SCHEDULING_API_PORT is not a valid port, using 3000");
                3000
            }),
            Err(_) => 3000,
        };

        let snapshot_path = env::var("SCHEDULING_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .ok();

        if snapshot_path.is_none() {
            warn!("SCHEDULING_SNAPSHOT_PATH not set, calendar state will not be persisted");
        }

        Self {
            port,
            snapshot_path,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.snapshot_path.is_some()
    }
}
