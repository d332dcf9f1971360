use crate::engine::{GeoPoint, Geofence, OfficeHours};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

// default office reference point
const DEFAULT_OFFICE_LAT: f64 = 29.275748;
const DEFAULT_OFFICE_LON: f64 = 79.545030;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance
    pub office_hours: OfficeHours,
    pub geofence: Geofence,
    pub session_idle_secs: u64,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let office_hours = OfficeHours::new(
            parse_time(&lookup, "OFFICE_START", "09:00")?,
            parse_time(&lookup, "OFFICE_END", "18:00")?,
        )
        .context("OFFICE_START/OFFICE_END")?;

        let center = GeoPoint::new(
            parse_or(&lookup, "OFFICE_LAT", DEFAULT_OFFICE_LAT)?,
            parse_or(&lookup, "OFFICE_LON", DEFAULT_OFFICE_LON)?,
        )
        .context("OFFICE_LAT/OFFICE_LON")?;
        let geofence = Geofence::new(center, parse_or(&lookup, "GEOFENCE_RADIUS_M", 100.0)?)
            .context("GEOFENCE_RADIUS_M")?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parse_or(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parse_or(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parse_or(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: parse_or(&lookup, "RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: parse_or(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            office_hours,
            geofence,
            session_idle_secs: parse_or(&lookup, "SESSION_IDLE_SECS", 43_200)?,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn parse_time<F>(lookup: &F, key: &str, default: &str) -> Result<NaiveTime>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .with_context(|| format!("{key} has invalid time {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://localhost/attendance"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.access_token_ttl, 900);
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.office_hours.start(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.office_hours.end(), NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(config.geofence.radius_m(), 100.0);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn missing_required_is_an_error() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).err().unwrap();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("OFFICE_START", "08:30"),
            ("OFFICE_END", "17:15:00"),
            ("GEOFENCE_RADIUS_M", "45.5"),
            ("LOG_LEVEL", "info"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.office_hours.start(), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(config.office_hours.end(), NaiveTime::from_hms_opt(17, 15, 0).unwrap());
        assert_eq!(config.geofence.radius_m(), 45.5);
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ACCESS_TOKEN_TTL", "soon"));
        let err = Config::from_lookup(lookup_from(&pairs)).err().unwrap();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL"));
    }

    #[test]
    fn inverted_office_hours_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("OFFICE_START", "19:00"), ("OFFICE_END", "09:00")]);
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
