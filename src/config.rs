//! Runtime configuration from environment variables.

use std::env;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_AUTO_ADVANCE_MS: u64 = 10_000;
pub const DEFAULT_SESSION_IDLE_HOURS: u64 = 12;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Delay before switching to gameplay after a pick; `None` disables it.
    pub auto_advance: Option<Duration>,
    /// Sessions idle for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auto_advance: Some(Duration::from_millis(DEFAULT_AUTO_ADVANCE_MS)),
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_HOURS * 3600),
        }
    }
}

impl AppConfig {
    /// Read `HOST`, `PORT`, `AUTO_ADVANCE_MS` and `SESSION_IDLE_HOURS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let host = value("HOST").unwrap_or(defaults.host);
        let port = parse_or(value("PORT"), "PORT", defaults.port);
        let auto_advance_ms = parse_or(
            value("AUTO_ADVANCE_MS"),
            "AUTO_ADVANCE_MS",
            DEFAULT_AUTO_ADVANCE_MS,
        );
        let idle_hours = parse_or(
            value("SESSION_IDLE_HOURS"),
            "SESSION_IDLE_HOURS",
            DEFAULT_SESSION_IDLE_HOURS,
        );

        Self {
            host,
            port,
            auto_advance: (auto_advance_ms > 0).then(|| Duration::from_millis(auto_advance_ms)),
            session_idle_timeout: Duration::from_secs(idle_hours.saturating_mul(3600)),
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
    }
}
