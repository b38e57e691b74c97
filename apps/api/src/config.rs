use anyhow::{Context, Result};

use crate::cadence::engine::{CadenceConfig, DEFAULT_FOLLOW_UP_DAYS, DEFAULT_MAX_FOLLOW_UPS};
use crate::outreach::drafter::FallbackPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub anthropic_api_key: String,
    pub llm_max_tokens: u32,
    pub port: u16,
    pub rust_log: String,
    pub cadence: CadenceConfig,
    pub fallback_policy: FallbackPolicy,
    /// Seconds between background cadence sweeps. 0 disables the scheduler.
    pub scheduler_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let cadence = cadence_from_vars(
            std::env::var("FOLLOW_UP_DAYS").ok().as_deref(),
            std::env::var("MAX_FOLLOW_UPS").ok().as_deref(),
        )?;

        let fallback_policy = match std::env::var("EMAIL_FALLBACK_POLICY") {
            Ok(raw) => raw
                .parse::<FallbackPolicy>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("EMAIL_FALLBACK_POLICY must be one of never, on_malformed, always")?,
            Err(_) => FallbackPolicy::default(),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_max_tokens: parse_env_or("LLM_MAX_TOKENS", 1000)?,
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cadence,
            fallback_policy,
            scheduler_interval_secs: parse_env_or("SCHEDULER_INTERVAL_SECS", 3600)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// Builds the cadence from the optional `FOLLOW_UP_DAYS` (comma-separated
/// offsets) and `MAX_FOLLOW_UPS` values.
pub fn cadence_from_vars(days: Option<&str>, max: Option<&str>) -> Result<CadenceConfig> {
    let follow_up_days = match days {
        Some(raw) => parse_follow_up_days(raw)?,
        None => DEFAULT_FOLLOW_UP_DAYS.to_vec(),
    };
    let max_follow_ups = match max {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("MAX_FOLLOW_UPS has an invalid value '{raw}'"))?,
        None => DEFAULT_MAX_FOLLOW_UPS.min(follow_up_days.len()),
    };
    Ok(CadenceConfig::new(follow_up_days, max_follow_ups)?)
}

fn parse_follow_up_days(raw: &str) -> Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("FOLLOW_UP_DAYS entry '{s}' is not a whole number of days"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_defaults() {
        let cadence = cadence_from_vars(None, None).unwrap();
        assert_eq!(cadence, CadenceConfig::default());
    }

    #[test]
    fn test_cadence_custom_days() {
        let cadence = cadence_from_vars(Some("1, 3, 7"), None).unwrap();
        assert_eq!(cadence.follow_up_days(), &[1, 3, 7]);
        assert_eq!(cadence.max_follow_ups(), 3);
    }

    #[test]
    fn test_cadence_custom_max() {
        let cadence = cadence_from_vars(None, Some("2")).unwrap();
        assert_eq!(cadence.max_follow_ups(), 2);
        assert_eq!(cadence.follow_up_days(), &[2, 5, 10, 15, 21]);
    }

    #[test]
    fn test_cadence_rejects_garbage() {
        assert!(cadence_from_vars(Some("2,five"), None).is_err());
        assert!(cadence_from_vars(None, Some("many")).is_err());
    }

    #[test]
    fn test_cadence_rejects_max_beyond_offsets() {
        assert!(cadence_from_vars(Some("2,5"), Some("3")).is_err());
    }

    #[test]
    fn test_cadence_rejects_offsets_past_limit() {
        assert!(cadence_from_vars(Some("1000000000"), None).is_err());
    }

    #[test]
    fn test_cadence_rejects_empty_days() {
        assert!(cadence_from_vars(Some(""), None).is_err());
    }
}
