use std::env;

use anyhow::{Context, Result};

use crate::leave::HolidayCalendar;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,

    /// Days excluded from business-day counts
    pub holidays: HolidayCalendar,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let rate_protected_per_min = match lookup("RATE_PROTECTED_PER_MIN") {
            Some(v) => v
                .parse()
                .with_context(|| format!("RATE_PROTECTED_PER_MIN is not a number: {v}"))?,
            None => 1000,
        };

        let holidays = match lookup("HOLIDAYS") {
            Some(list) => HolidayCalendar::parse_list(&list).with_context(|| {
                format!("HOLIDAYS must be comma-separated YYYY-MM-DD dates: {list}")
            })?,
            None => HolidayCalendar::new(),
        };

        Ok(Self {
            server_addr: get("SERVER_ADDR")?,
            database_url: get("DATABASE_URL")?,
            jwt_secret: get("JWT_SECRET")?,
            rate_protected_per_min,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            holidays,
        })
    }
}
