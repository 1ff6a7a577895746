use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

const DEFAULT_PORT: &str = "3001";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: &str = "3306";
const DEFAULT_MAX_CONNECTIONS: &str = "10";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database: DatabaseConfig,
    pub max_connections: u32,
}

/// Where the todo and product tables live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    MySql {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
    /// Embedded single-file store, selected by `DATABASE_PATH`.
    Sqlite { path: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let host = env_map
            .get("HOST")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_HOST)
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "HOST".to_string(),
                    "must be an IP address".to_string(),
                )
            })?;

        let max_connections = env_map
            .get("DB_MAX_CONNECTIONS")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_MAX_CONNECTIONS)
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DB_MAX_CONNECTIONS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let database = parse_database_from_map(&env_map)?;

        Ok(Config {
            host,
            port,
            database,
            max_connections,
        })
    }
}

fn parse_database_from_map(
    env_map: &HashMap<String, String>,
) -> Result<DatabaseConfig, ConfigError> {
    if let Some(path) = env_map.get("DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
        return Ok(DatabaseConfig::Sqlite { path: path.clone() });
    }

    let host = env_map
        .get("DB_HOST")
        .cloned()
        .unwrap_or_else(|| DEFAULT_DB_HOST.to_string());

    let port = env_map
        .get("DB_PORT")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_DB_PORT)
        .parse::<u16>()
        .map_err(|_| {
            ConfigError::InvalidValue("DB_PORT".to_string(), "must be a valid u16".to_string())
        })?;

    let user = env_map
        .get("DB_USER")
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv("DB_USER".to_string()))?;

    let password = env_map.get("DB_PASSWORD").cloned().unwrap_or_default();

    let database = env_map
        .get("DB_NAME")
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv("DB_NAME".to_string()))?;

    Ok(DatabaseConfig::MySql {
        host,
        port,
        user,
        password,
        database,
    })
}
