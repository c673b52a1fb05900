// Expense Tracker - Configuration
// Layered settings: built-in defaults, then expense-tracker.toml in the working
// directory, then EXPENSE_* environment variables (EXPENSE_PORT, EXPENSE_DATABASE_PATH, ...)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_FILE: &str = "expense-tracker.toml";
pub const ENV_PREFIX: &str = "EXPENSE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Invalid(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// SQLite database file
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
    /// Default tracing filter when `EXPENSE_LOG` is unset
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from("expenses.db"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::figment().extract()?)
    }

    /// Load `.env` (if present) into the environment, then [`Settings::load`].
    ///
    /// Returns the `.env` path that was read, so the caller can log it once
    /// tracing is up.
    pub fn load_with_dotenv() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let dotenv_path = dotenvy::dotenv().ok();
        Ok((Self::load()?, dotenv_path))
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).only(&[
                "database_path",
                "host",
                "port",
                "cors_origin",
                "log_level",
            ]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
