use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Duration;
use tracing::info;

use onair_api::Settings;
use onair_types::calendar::zone_from_minutes;

/// Placeholder admin tokens that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "change-me-to-a-random-string", "dev-admin-token"];

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub mail_relay_url: Option<String>,
    pub mail_relay_key: Option<String>,
    pub cleanup_interval_secs: u64,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_token = var("ONAIR_ADMIN_TOKEN").unwrap_or_default();
        if admin_token.is_empty() || PLACEHOLDER_SECRETS.contains(&admin_token.as_str()) {
            bail!("ONAIR_ADMIN_TOKEN is unset or still a placeholder");
        }

        let offset_minutes: i32 = load(&var, "ONAIR_UTC_OFFSET_MINUTES", "540")?;
        let zone = zone_from_minutes(offset_minutes)
            .with_context(|| format!("ONAIR_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let morning_cutoff_hour: u32 = load(&var, "ONAIR_MORNING_CUTOFF_HOUR", "18")?;
        if morning_cutoff_hour > 24 {
            bail!("ONAIR_MORNING_CUTOFF_HOUR must be 0-24, got {morning_cutoff_hour}");
        }

        let code_ttl_secs: i64 = load(&var, "ONAIR_CODE_TTL_SECS", "600")?;
        if code_ttl_secs <= 0 {
            bail!("ONAIR_CODE_TTL_SECS must be positive");
        }

        let cleanup_interval_secs: u64 = load(&var, "ONAIR_CLEANUP_INTERVAL_SECS", "3600")?;
        if cleanup_interval_secs == 0 {
            bail!("ONAIR_CLEANUP_INTERVAL_SECS must be positive");
        }

        let school_domain: String = load(&var, "ONAIR_SCHOOL_DOMAIN", "seoun.sen.ms.kr")?;
        let mail_from = var("ONAIR_MAIL_FROM").unwrap_or_else(|| format!("broadcast@{}", school_domain));

        let settings = Settings {
            zone,
            school_name: load(&var, "ONAIR_SCHOOL_NAME", "서운중학교")?,
            daily_song_limit: load(&var, "ONAIR_DAILY_SONG_LIMIT", "10")?,
            morning_cutoff_hour,
            code_ttl: Duration::seconds(code_ttl_secs),
            max_code_attempts: load(&var, "ONAIR_MAX_CODE_ATTEMPTS", "5")?,
            require_verification: load(&var, "ONAIR_REQUIRE_VERIFICATION", "false")?,
            expose_code: load(&var, "ONAIR_EXPOSE_CODE", "false")?,
            school_domain,
            mail_from,
            admin_token,
        };

        Ok(Self {
            host: load(&var, "ONAIR_HOST", "0.0.0.0")?,
            port: load(&var, "ONAIR_PORT", "3000")?,
            db_path: load::<String, _>(&var, "ONAIR_DB_PATH", "onair.db")?.into(),
            mail_relay_url: var("ONAIR_MAIL_RELAY_URL"),
            mail_relay_key: var("ONAIR_MAIL_RELAY_KEY"),
            cleanup_interval_secs,
            settings,
        })
    }
}

fn load<T, V>(var: &V, key: &str, default: &str) -> Result<T>
where
    V: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("ONAIR_ADMIN_TOKEN", "s3cret")]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("onair.db"));
        assert_eq!(cfg.settings.daily_song_limit, 10);
        assert_eq!(cfg.settings.zone.local_minus_utc(), 9 * 3600);
        assert_eq!(cfg.settings.mail_from, "broadcast@seoun.sen.ms.kr");
        assert_eq!(cfg.settings.school_name, "서운중학교");
        assert!(!cfg.settings.require_verification);
        assert!(cfg.mail_relay_url.is_none());
    }

    #[test]
    fn test_admin_token_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("ONAIR_ADMIN_TOKEN", "change-me")]).is_err());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let cfg = config(&[
            ("ONAIR_ADMIN_TOKEN", "s3cret"),
            ("ONAIR_UTC_OFFSET_MINUTES", "0"),
            ("ONAIR_REQUIRE_VERIFICATION", "true"),
            ("ONAIR_CODE_TTL_SECS", "120"),
        ])
        .unwrap();
        assert_eq!(cfg.settings.zone.local_minus_utc(), 0);
        assert!(cfg.settings.require_verification);
        assert_eq!(cfg.settings.code_ttl, Duration::seconds(120));

        assert!(config(&[("ONAIR_ADMIN_TOKEN", "s3cret"), ("ONAIR_PORT", "http")]).is_err());
        assert!(config(&[("ONAIR_ADMIN_TOKEN", "s3cret"), ("ONAIR_UTC_OFFSET_MINUTES", "100000")]).is_err());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        assert!(config(&[("ONAIR_ADMIN_TOKEN", "s3cret"), ("ONAIR_CLEANUP_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("ONAIR_ADMIN_TOKEN", "s3cret"), ("ONAIR_CODE_TTL_SECS", "0")]).is_err());
        let cfg = config(&[("ONAIR_ADMIN_TOKEN", "s3cret"), ("ONAIR_CLEANUP_INTERVAL_SECS", "60")]).unwrap();
        assert_eq!(cfg.cleanup_interval_secs, 60);
    }
}
