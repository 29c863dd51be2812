// region:    --- Imports
use chrono::Duration as ChronoDuration;
use std::time::Duration;

// endregion: --- Imports

// region:    --- Config

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub sweep_interval: Duration,
    pub sweep_grace: Duration,
    /// Anti-snipe window; `None` disables deadline extension.
    pub anti_snipe_window: Option<ChronoDuration>,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let sweep_interval = Duration::from_secs(parse_var("SWEEP_INTERVAL_SECS", 1)?);
        let sweep_grace = Duration::from_secs(parse_var("SWEEP_GRACE_SECS", 5)?);

        // 0 or unset keeps anti-snipe off.
        let anti_snipe_secs: i64 = parse_var("ANTI_SNIPE_WINDOW_SECS", 0)?;
        let anti_snipe_window = if anti_snipe_secs > 0 {
            Some(ChronoDuration::seconds(anti_snipe_secs))
        } else {
            None
        };

        let broadcast_capacity: usize = parse_var("BROADCAST_CAPACITY", 256)?;
        if broadcast_capacity == 0 {
            // broadcast::channel panics on a zero capacity.
            return Err("BROADCAST_CAPACITY must be at least 1".to_string());
        }

        Ok(Self {
            database_url,
            bind_addr,
            sweep_interval,
            sweep_grace,
            anti_snipe_window,
            broadcast_capacity,
        })
    }
}

/// Parse an env var, falling back to a default when unset.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| format!("{} must be a number, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

// endregion: --- Config
