use crate::models::registration::MAX_ADDITIONAL_PLAYERS;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_wal_path")]
    pub wal_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Password every member shares to register and log in
    pub shared_password: String,
    /// Honor `isAdmin` on self-registration
    #[serde(default = "default_allow_admin_signup")]
    pub allow_admin_signup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    #[serde(default = "default_max_additional_players")]
    pub max_additional_players: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    #[serde(default = "default_sample_events")]
    pub sample_events: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_path: default_wal_path(),
        }
    }
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            max_additional_players: default_max_additional_players(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_seed_enabled(),
            admin_name: default_admin_name(),
            sample_events: default_sample_events(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_wal_path() -> PathBuf {
    PathBuf::from("rallyboard.wal")
}

fn default_allow_admin_signup() -> bool {
    true
}

fn default_max_additional_players() -> u32 {
    10
}

fn default_seed_enabled() -> bool {
    true
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

fn default_sample_events() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.storage.wal_path.as_os_str().is_empty() {
            bail!("wal_path must not be empty");
        }

        if self.auth.shared_password.is_empty() {
            bail!("shared_password must not be empty");
        }

        if self.voting.max_additional_players > MAX_ADDITIONAL_PLAYERS {
            bail!(
                "max_additional_players must be at most {}",
                MAX_ADDITIONAL_PLAYERS
            );
        }

        if self.seed.enabled && self.seed.admin_name.trim().is_empty() {
            bail!("admin_name must not be empty when seeding is enabled");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [auth]
        shared_password = "eventpass"

        [logging]
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml(MINIMAL).expect("Failed to parse config");

        assert_eq!(config.server.port, Some(8080));
        assert!(config.server.num_threads > 0);
        assert_eq!(config.storage.wal_path, PathBuf::from("rallyboard.wal"));
        assert!(config.auth.allow_admin_signup);
        assert_eq!(config.voting.max_additional_players, 10);
        assert!(config.seed.enabled);
        assert_eq!(config.seed.admin_name, "Admin");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_example_config_parses() {
        let path = PathBuf::from("config.example.toml");
        let config = Config::from_file(&path).expect("Failed to load config");

        assert_eq!(config.auth.shared_password, "eventpass");
        assert!(config.server.port.is_some());
    }

    #[test]
    fn test_requires_a_listener() {
        let toml = r#"
            [server]
            [auth]
            shared_password = "eventpass"
            [logging]
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("port or unix_socket"));
    }

    #[test]
    fn test_rejects_empty_shared_password() {
        let toml = r#"
            [server]
            port = 8080
            [auth]
            shared_password = ""
            [logging]
        "#;

        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_rejects_unbounded_guest_limit() {
        let toml = r#"
            [server]
            port = 8080
            [auth]
            shared_password = "eventpass"
            [voting]
            max_additional_players = 4294967295
            [logging]
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("max_additional_players"));
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let toml = r#"
            [server]
            port = 8080
            [auth]
            shared_password = "eventpass"
            [logging]
            format = "xml"
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("Invalid log format"));
    }
}
