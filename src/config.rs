//! Configuration from environment variables, with defaults for local runs.

use crate::logic::confirm::DEFAULT_CONFIRM_WINDOW_SECS;
use crate::logic::Seeding;
use chrono::TimeDelta;
use std::time::Duration;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(300)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the match-stats provider; imports fail without it.
    pub stats_api_url: Option<String>,
    pub stats_api_key: Option<String>,
    pub stats_cache_ttl: Duration,
    /// Chat webhook; without it notifications are only logged.
    pub notify_webhook_url: Option<String>,
    pub notify_channel: String,
    pub notify_role: Option<String>,
    pub confirm_window: TimeDelta,
    pub seeding: Seeding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            stats_api_url: None,
            stats_api_key: None,
            stats_cache_ttl: default_cache_ttl(),
            notify_webhook_url: None,
            notify_channel: "tournaments".to_string(),
            notify_role: None,
            confirm_window: TimeDelta::seconds(DEFAULT_CONFIRM_WINDOW_SECS),
            seeding: Seeding::Registration,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; unparsable numbers fall
    /// back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let parsed = |key: &str| {
            get(key).and_then(|value| match value.parse::<u64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    log::warn!("Ignoring {}={:?}: not a number", key, value);
                    None
                }
            })
        };
        let defaults = Self::default();

        let seeding = match get("BRACKET_SEEDING").map(|v| v.parse::<Seeding>()) {
            Some(Ok(seeding)) => seeding,
            Some(Err(e)) => {
                log::warn!("Ignoring BRACKET_SEEDING: {}", e);
                defaults.seeding
            }
            None => defaults.seeding,
        };

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parsed("PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            stats_api_url: get("STATS_API_URL"),
            stats_api_key: get("STATS_API_KEY"),
            stats_cache_ttl: parsed("STATS_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stats_cache_ttl),
            notify_webhook_url: get("NOTIFY_WEBHOOK_URL"),
            notify_channel: get("NOTIFY_CHANNEL").unwrap_or(defaults.notify_channel),
            notify_role: get("NOTIFY_ROLE"),
            confirm_window: parsed("CONFIRM_WINDOW_SECS")
                .and_then(|s| i64::try_from(s).ok())
                .map(TimeDelta::seconds)
                .unwrap_or(defaults.confirm_window),
            seeding,
        }
    }
}
