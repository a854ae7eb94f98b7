use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string, e.g. `sqlite://sensor.db`.
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Whether the synthetic reading generator runs alongside the server.
    pub simulator_enabled: bool,
    pub simulator_sensor_id: String,
    /// Generator interval in seconds.
    pub simulator_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            simulator_enabled: parse_bool(&optional("SIMULATOR_ENABLED", "true"))
                .context("SIMULATOR_ENABLED must be a boolean")?,
            simulator_sensor_id: optional("SIMULATOR_SENSOR_ID", "SENSOR_001"),
            simulator_interval_secs: optional("SIMULATOR_INTERVAL_SECS", "10")
                .parse()
                .context("SIMULATOR_INTERVAL_SECS must be a positive integer")?,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow::anyhow!("not a boolean: {other:?}")),
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
