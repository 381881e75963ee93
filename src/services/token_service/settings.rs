use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::settings::{Result, SettingsError};

/// 24 hours
pub const ACCESS_TOKEN_LIFETIME_S: i64 = 24 * 60 * 60;
/// 7 days
pub const REFRESH_TOKEN_LIFETIME_S: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Deserialize)]
pub struct TokenSettings {
    #[serde(default)]
    pub access_token_secret: String,
    #[serde(default)]
    pub refresh_token_secret: String,
    #[serde(default = "default_access_lifetime")]
    pub access_token_lifetime_s: i64,
    #[serde(default = "default_refresh_lifetime")]
    pub refresh_token_lifetime_s: i64,
}

fn default_access_lifetime() -> i64 {
    ACCESS_TOKEN_LIFETIME_S
}

fn default_refresh_lifetime() -> i64 {
    REFRESH_TOKEN_LIFETIME_S
}

impl TokenSettings {
    ///
    /// Loads the token settings. Lifetimes are read from the optional JSON file
    /// at `path`, then overridden by `ACCESS_TOKEN_LIFETIME_S` /
    /// `REFRESH_TOKEN_LIFETIME_S`. Both secrets must be present in the environment.
    ///
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut settings: TokenSettings = match fs::read_to_string(path.as_ref()) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| SettingsError::InvalidFile(path.as_ref().display().to_string(), e.to_string()))?,
            Err(_) => TokenSettings {
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_lifetime_s: ACCESS_TOKEN_LIFETIME_S,
                refresh_token_lifetime_s: REFRESH_TOKEN_LIFETIME_S,
            },
        };

        settings.access_token_secret = crate::settings::required_var("ACCESS_TOKEN_SECRET")?;
        settings.refresh_token_secret = crate::settings::required_var("REFRESH_TOKEN_SECRET")?;

        if let Ok(val) = env::var("ACCESS_TOKEN_LIFETIME_S") {
            settings.access_token_lifetime_s = parse_lifetime("ACCESS_TOKEN_LIFETIME_S", &val)?;
        }
        if let Ok(val) = env::var("REFRESH_TOKEN_LIFETIME_S") {
            settings.refresh_token_lifetime_s = parse_lifetime("REFRESH_TOKEN_LIFETIME_S", &val)?;
        }

        Ok(settings)
    }
}

fn parse_lifetime(key: &str, val: &str) -> Result<i64> {
    val.parse::<i64>()
        .map_err(|_| SettingsError::InvalidVar(key.to_string(), val.to_string()))
}
