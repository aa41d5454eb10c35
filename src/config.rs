// src/config.rs
// Run configuration, built once at entry and passed to each stage as a value.
// There are no module-level globals; tests construct the struct directly.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::instruments::Metal;

pub const DEFAULT_SOURCE_BASE_URL: &str = "https://gold.tanaka.co.jp/commodity/souba";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;
pub const DEFAULT_STATE_DIR: &str = "state";

/// Ceiling (in yen) above which a table cell is assumed to be a price rather
/// than a day-over-day change. Tuned against observed page layouts; override
/// with `CHANGE_PLAUSIBLE_LIMIT` if the market ever moves harder than that.
pub const DEFAULT_PLAUSIBLE_CHANGE_LIMIT: i64 = 2000;

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub base_url: String,
    pub webhook_url: String,
    pub mention_user_id: Option<String>,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Forces the response charset instead of trusting the header/meta
    /// declaration (the source has lied about its encoding before).
    pub charset_override: Option<String>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub state_dir: PathBuf,
    pub once_per_day: bool,
    pub skip_weekends: bool,
    pub change_limit: i64,
}

impl WatchConfig {
    /// Build from environment variables. Call `dotenvy::dotenv()` first in
    /// binaries so a local `.env` is honored.
    ///
    /// `DISCORD_WEBHOOK_URL` is the only required variable; a run without it
    /// cannot report anything and aborts before touching the network.
    pub fn from_env() -> Result<Self> {
        let webhook_url = match std::env::var("DISCORD_WEBHOOK_URL") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => bail!("DISCORD_WEBHOOK_URL is not set"),
        };

        Ok(Self {
            base_url: env_or("PRICE_SOURCE_BASE_URL", DEFAULT_SOURCE_BASE_URL),
            webhook_url,
            mention_user_id: env_nonempty("MENTION_USER_ID"),
            timeout: Duration::from_secs(env_parsed("HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)),
            user_agent: env_nonempty("HTTP_USER_AGENT"),
            charset_override: env_nonempty("HTTP_CHARSET"),
            max_attempts: env_parsed("FETCH_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1),
            retry_delay: Duration::from_secs(env_parsed(
                "FETCH_RETRY_DELAY_SECS",
                DEFAULT_RETRY_DELAY_SECS,
            )),
            state_dir: PathBuf::from(env_or("STATE_DIR", DEFAULT_STATE_DIR)),
            once_per_day: env_flag("NOTIFY_ONCE_PER_DAY", true),
            skip_weekends: env_flag("SKIP_WEEKENDS", true),
            change_limit: env_parsed("CHANGE_PLAUSIBLE_LIMIT", DEFAULT_PLAUSIBLE_CHANGE_LIMIT),
        })
    }

    /// Source page URL for one instrument (each metal has its own daily page).
    pub fn page_url(&self, metal: Metal) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), metal.page_slug())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.trim(), "1" | "true" | "TRUE" | "yes"),
        Err(_) => default,
    }
}
