use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "target/db/monotributo.db".to_string(),
        }
    }
}

/// Which backend serves the dashboard data
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// Local SQLite file from `[database]`
    #[default]
    Sqlite,
    /// Hosted backend-as-a-service with an auto-generated REST API
    Rest,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataSourceConfig {
    #[serde(default)]
    pub kind: DataSourceKind,
    /// Project URL of the hosted backend, e.g. "https://abc.supabase.co"
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Start of the observation window: older payments are never read
    pub epoch: NaiveDate,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/monotributo.db"

[data_source]
kind = "sqlite"

[server]
port = 3000

[dashboard]
epoch = "2024-01-01"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Make the loaded configuration available to request handlers
pub fn install(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration is already installed"))
}

/// Installed configuration, or defaults when nothing was installed (tests)
pub fn current() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.database.path, "target/db/monotributo.db");
        assert_eq!(config.data_source.kind, DataSourceKind::Sqlite);
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.dashboard.epoch,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_rest_section_and_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [data_source]
            kind = "rest"
            url = "https://demo.example.com"
            api_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.data_source.kind, DataSourceKind::Rest);
        assert_eq!(config.data_source.url.as_deref(), Some("https://demo.example.com"));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "target/db/monotributo.db");
    }
}
