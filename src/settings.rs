use std::env;

use thiserror::Error;

use crate::services::token_service::settings::TokenSettings;

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Required environment variable `{0}` is not set")]
    MissingVar(String),
    #[error("Environment variable `{0}` has invalid value `{1}`")]
    InvalidVar(String, String),
    #[error("Could not read settings file `{0}`: {1}")]
    InvalidFile(String, String),
}

const DEFAULT_PORT: u16 = 8000;
const TOKEN_SETTINGS_PATH: &str = "./token_settings.json";

///
/// Everything the server needs from its environment at start-up
///
#[derive(Clone)]
pub struct ServerSettings {
    pub database_url: String,
    pub cors_origin: String,
    pub port: u16,
    pub tokens: TokenSettings,
}

impl ServerSettings {
    ///
    /// Reads the settings from the process environment. Call `dotenvy::dotenv()`
    /// beforehand to pick up a `.env` file.
    ///
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PORT") {
            Ok(val) => val.parse::<u16>()
                .map_err(|_| SettingsError::InvalidVar("PORT".to_string(), val))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            database_url: required_var("DATABASE_URL")?,
            cors_origin: required_var("CORS_ORIGIN")?,
            port,
            tokens: TokenSettings::load(TOKEN_SETTINGS_PATH)?,
        })
    }
}

pub(crate) fn required_var(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(SettingsError::MissingVar(key.to_string())),
    }
}
