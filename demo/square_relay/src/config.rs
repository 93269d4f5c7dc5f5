use std::fs;
use std::path::Path;
use std::time::Duration;

use queuebus_core::BusConfig;

/// High-level configuration for the square relay demo
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Sleep between two drains of a queue
    pub poll_interval_ms: u64,
    /// How often the mainapp greets the gui
    pub greeting_interval_ms: u64,
    pub greeting: String,
    /// How often the gui asks the mainapp for squares
    pub square_interval_ms: u64,
    /// Numbers requested per round; they cycle through `0..square_batch`
    pub square_batch: u32,
    pub bus: BusConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: env_u64("RELAY_POLL_MS").unwrap_or(100),
            greeting_interval_ms: env_u64("RELAY_GREETING_MS").unwrap_or(1_500),
            greeting: std::env::var("RELAY_GREETING")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Hello from mainapp".to_string()),
            square_interval_ms: env_u64("RELAY_SQUARE_MS").unwrap_or(500),
            square_batch: std::env::var("RELAY_SQUARE_BATCH")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            bus: BusConfig::default(),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok())
}

impl RelayConfig {
    /// Load configuration from a TOML file (path via RELAY_CONFIG or ./square_relay.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "square_relay.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target = "square_relay", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::overlay_toml(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target = "square_relay", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target = "square_relay", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    fn overlay_toml(s: &str, base: Self) -> Result<Self, toml::de::Error> {
        Ok(toml::from_str::<RelayToml>(s)?.overlay(base))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn greeting_interval(&self) -> Duration {
        Duration::from_millis(self.greeting_interval_ms)
    }

    pub fn square_interval(&self) -> Duration {
        Duration::from_millis(self.square_interval_ms)
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RelayToml {
    pub poll_interval_ms: Option<u64>,
    pub greeting_interval_ms: Option<u64>,
    pub greeting: Option<String>,
    pub square_interval_ms: Option<u64>,
    pub square_batch: Option<u32>,
    pub bus: Option<BusConfig>,
}

impl RelayToml {
    fn overlay(self, mut base: RelayConfig) -> RelayConfig {
        if let Some(x) = self.poll_interval_ms {
            base.poll_interval_ms = x;
        }
        if let Some(x) = self.greeting_interval_ms {
            base.greeting_interval_ms = x;
        }
        if let Some(x) = self.greeting {
            base.greeting = x;
        }
        if let Some(x) = self.square_interval_ms {
            base.square_interval_ms = x;
        }
        if let Some(x) = self.square_batch {
            base.square_batch = x.max(1);
        }
        if let Some(x) = self.bus {
            base.bus = x;
        }
        base
    }
}
