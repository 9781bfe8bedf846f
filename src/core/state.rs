// Application state (AppState)

use crate::core::config::Config;
use crate::ledger::ledger::Ledger;
use crate::metrics::collector::Metrics;
use crate::wal::wal::Wal;
use std::sync::Arc;

/// Shared application state
///
/// Cloned into every request handler. All fields are wrapped in Arc.
#[derive(Clone)]
pub struct AppState {
    /// Tables and their write path
    pub ledger: Arc<Ledger>,

    /// Counters served at /metrics
    pub metrics: Arc<Metrics>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, wal: Wal) -> Self {
        Self {
            ledger: Arc::new(Ledger::new(wal)),
            metrics: Arc::new(Metrics::new()),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    use crate::core::config::{
        AuthConfig, LoggingConfig, SeedConfig, ServerConfig, StorageConfig, VotingConfig,
    };

    Config {
        server: ServerConfig {
            port: Some(8080),
            unix_socket: None,
            num_threads: 2,
        },
        storage: StorageConfig::default(),
        auth: AuthConfig {
            shared_password: "eventpass".to_string(),
            allow_admin_signup: true,
        },
        voting: VotingConfig {
            max_additional_players: 5,
        },
        seed: SeedConfig {
            enabled: false,
            ..SeedConfig::default()
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            console: true,
        },
    }
}

/// State backed by a WAL in a fresh temp dir; keep the dir alive for the test
#[cfg(test)]
pub(crate) fn test_state() -> (Arc<AppState>, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let wal = Wal::new(temp_dir.path().join("test.wal")).unwrap();

    (Arc::new(AppState::new(test_config(), wal)), temp_dir)
}
