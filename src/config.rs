use std::{env, fmt::Display, str::FromStr};

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::error::ApiError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cron_secret: Option<String>,
    pub cors_origin: Option<String>,
    pub notification_cron: String,
    pub deadline_cron: String,
    pub attendance_cron: String,
    pub timezone: Tz,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| ApiError::StartupError("DATABASE_URL must be set in .env".to_string()))?;

        Ok(Self {
            database_url,
            port: try_load(&lookup, "PORT", "8080")?,
            cron_secret: lookup("CRON_SECRET").filter(|s| !s.is_empty()),
            cors_origin: lookup("CORS_ORIGIN").filter(|s| !s.is_empty()),
            // tokio-cron-scheduler expressions carry a seconds field
            notification_cron: load_or(&lookup, "NOTIFICATION_CRON", "0 */2 * * * *"),
            deadline_cron: load_or(&lookup, "DEADLINE_CRON", "0 */15 * * * *"),
            attendance_cron: load_or(&lookup, "ATTENDANCE_CRON", "0 0 3 * * *"),
            timezone: try_load(&lookup, "TIMEZONE", "Europe/Berlin")?,
        })
    }
}

fn load_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ApiError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    load_or(lookup, key, default).parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        ApiError::StartupError(format!("Invalid {key} value: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/vt")])).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.notification_cron, "0 */2 * * * *");
        assert_eq!(config.deadline_cron, "0 */15 * * * *");
        assert_eq!(config.attendance_cron, "0 0 3 * * *");
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert!(config.cron_secret.is_none());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(AppConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/vt"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn empty_cron_secret_counts_as_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/vt"),
            ("CRON_SECRET", ""),
        ]))
        .unwrap();
        assert!(config.cron_secret.is_none());
    }
}
